//! Vertex attribute arrays and draw calls.

use shadowgl_types::gl::*;

use super::domains::{self, enum_in};
use super::Ctx;
use crate::shadow::{Limit, VertexAttrib};

impl Ctx<'_> {
    /// `GL_INVALID_VALUE` unless `index` is below the driver's `GL_MAX_VERTEX_ATTRIBS`.
    fn attrib_index_ok(&mut self, index: GLuint) -> bool {
        let max = self.limit(Limit::MaxVertexAttribs);
        self.value_ok(i64::from(index) < i64::from(max))
    }

    pub(super) fn set_attrib_array(&mut self, index: GLuint, enabled: bool) {
        if !self.attrib_index_ok(index) {
            return;
        }
        let cached = self.state.vertex_attribs.get(index).map_or(false, |a| a.enabled);
        if cached == enabled {
            self.elide();
            return;
        }
        self.state.vertex_attribs.entry(index).enabled = enabled;
        self.forward(|d| {
            if enabled {
                d.enable_vertex_attrib_array(index)
            } else {
                d.disable_vertex_attrib_array(index)
            }
        });
    }

    pub(super) fn vertex_attrib_pointer(
        &mut self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: u64,
    ) {
        if !self.attrib_index_ok(index)
            || !self.value_ok((1..=4).contains(&size))
            || !self.check(enum_in(domains::ATTRIB_TYPES)(&ty))
            || !self.value_ok(stride >= 0)
        {
            return;
        }
        let Ok(pointer) = usize::try_from(offset) else {
            self.error(GL_INVALID_VALUE);
            return;
        };
        let buffer = self.state.bindings.array_buffer;
        let cached = self.state.vertex_attribs.get(index).copied().unwrap_or_default();
        let wanted = VertexAttrib {
            size,
            ty,
            normalized,
            stride,
            offset,
            buffer,
            ..cached
        };
        if wanted == cached {
            self.elide();
            return;
        }
        *self.state.vertex_attribs.entry(index) = wanted;
        self.forward(|d| d.vertex_attrib_pointer(index, size, ty, normalized, stride, pointer));
    }

    pub(super) fn draw_arrays(&mut self, mode: GLenum, first: GLint, count: GLsizei) {
        if !self.check(enum_in(domains::DRAW_MODES)(&mode)) || !self.value_ok(first >= 0 && count >= 0) {
            return;
        }
        self.forward_unverified(|d| d.draw_arrays(mode, first, count));
    }

    pub(super) fn draw_elements(&mut self, mode: GLenum, count: GLsizei, ty: GLenum, offset: u64) {
        if !self.check(enum_in(domains::DRAW_MODES)(&mode))
            || !self.value_ok(count >= 0)
            || !self.check(enum_in(domains::INDEX_TYPES)(&ty))
        {
            return;
        }
        let Ok(offset) = usize::try_from(offset) else {
            self.error(GL_INVALID_VALUE);
            return;
        };
        self.forward_unverified(|d| d.draw_elements(mode, count, ty, offset));
    }

    pub(super) fn clear(&mut self, mask: GLbitfield) {
        if !self.value_ok(mask & !domains::CLEAR_MASK == 0) {
            return;
        }
        self.forward_unverified(|d| d.clear(mask));
    }
}
