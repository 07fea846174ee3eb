//! State queries and the error-retrieval protocol.

use tracing::trace;

use shadowgl_types::gl::*;

use super::{Ctx, Engine};
use crate::driver::EntryPoint;
use crate::shadow::{Capabilities, Limit, ShadowState};

impl Engine {
    /// Read-and-clear of the current context's error.
    ///
    /// The cached error answers unless a forwarded call may have failed in the driver, in which
    /// case the driver is asked, both the flag and the cached error are cleared, and the
    /// driver's answer is returned as is.
    pub(super) fn get_error(&mut self) -> GLenum {
        let bound = self.driver.is_bound(EntryPoint::GetError);
        let Some(current) = self.current.as_mut() else {
            return GL_INVALID_OPERATION;
        };
        let state = current.shadow_mut();
        if !bound {
            return GL_INVALID_OPERATION;
        }
        let cached = state.take_error();
        if !state.need_get_error {
            return cached;
        }
        state.need_get_error = false;
        self.stats.inc_authoritative_error_queries();
        self.stats.inc_driver_calls();
        let reported = self.driver.get_error();
        trace!(cached, reported, "authoritative error query");
        reported
    }
}

impl Ctx<'_> {
    pub(super) fn get_integerv(&mut self, pname: GLenum) -> Vec<GLint> {
        if let Some(limit) = Limit::from_pname(pname) {
            return vec![self.limit(limit)];
        }
        if let Some(cap) = Capabilities::from_cap(pname) {
            self.elide();
            return vec![GLint::from(self.state.is_enabled(cap))];
        }
        if let Some(values) = cached_integers(self.state, pname) {
            self.elide();
            return values;
        }

        let count = match pname {
            GL_COMPRESSED_TEXTURE_FORMATS => self.forwarded_count(GL_NUM_COMPRESSED_TEXTURE_FORMATS),
            GL_SHADER_BINARY_FORMATS => self.forwarded_count(GL_NUM_SHADER_BINARY_FORMATS),
            _ => value_count(pname),
        };
        let mut values = vec![0; count];
        if count > 0 {
            self.forward_unverified(|d| d.get_integerv(pname, &mut values));
        }
        values
    }

    /// Length of a variable-size query, read from its companion `NUM_*` pname.
    fn forwarded_count(&mut self, num_pname: GLenum) -> usize {
        let mut count = [0];
        self.forward(|d| d.get_integerv(num_pname, &mut count));
        usize::try_from(count[0]).unwrap_or(0)
    }

    pub(super) fn is_enabled(&mut self, cap: GLenum) -> bool {
        match Capabilities::from_cap(cap) {
            Some(cap) => {
                self.elide();
                self.state.is_enabled(cap)
            }
            None => {
                self.error(GL_INVALID_ENUM);
                false
            }
        }
    }
}

/// Integer state the shadow can answer without the driver. Bindings report client names.
fn cached_integers(state: &ShadowState, pname: GLenum) -> Option<Vec<GLint>> {
    let bindings = &state.bindings;
    let [front, back] = &state.stencil;
    let int = |v: GLuint| v as GLint;
    let values = match pname {
        GL_ARRAY_BUFFER_BINDING => vec![int(bindings.array_buffer)],
        GL_ELEMENT_ARRAY_BUFFER_BINDING => vec![int(bindings.element_array_buffer)],
        GL_FRAMEBUFFER_BINDING => vec![int(bindings.framebuffer)],
        GL_RENDERBUFFER_BINDING => vec![int(bindings.renderbuffer)],
        GL_CURRENT_PROGRAM => vec![int(bindings.program)],
        GL_ACTIVE_TEXTURE => vec![int(bindings.active_texture)],
        GL_TEXTURE_BINDING_2D => vec![int(bindings.active_unit().texture_2d)],
        GL_TEXTURE_BINDING_CUBE_MAP => vec![int(bindings.active_unit().cube_map)],

        GL_BLEND_EQUATION_RGB => vec![int(state.blend.equation[0])],
        GL_BLEND_EQUATION_ALPHA => vec![int(state.blend.equation[1])],
        GL_BLEND_SRC_RGB => vec![int(state.blend.func[0])],
        GL_BLEND_DST_RGB => vec![int(state.blend.func[1])],
        GL_BLEND_SRC_ALPHA => vec![int(state.blend.func[2])],
        GL_BLEND_DST_ALPHA => vec![int(state.blend.func[3])],

        GL_CULL_FACE_MODE => vec![int(state.cull_face_mode)],
        GL_FRONT_FACE => vec![int(state.front_face)],
        GL_DEPTH_FUNC => vec![int(state.depth_func)],
        GL_DEPTH_WRITEMASK => vec![GLint::from(state.depth_writemask)],
        GL_COLOR_WRITEMASK => state.color_writemask.iter().map(|&m| GLint::from(m)).collect(),
        GL_GENERATE_MIPMAP_HINT => vec![int(state.generate_mipmap_hint)],
        GL_PACK_ALIGNMENT => vec![state.pack_alignment],
        GL_UNPACK_ALIGNMENT => vec![state.unpack_alignment],
        GL_VIEWPORT => state.viewport.to_vec(),
        GL_SCISSOR_BOX => state.scissor_box.to_vec(),
        GL_STENCIL_CLEAR_VALUE => vec![state.clear_stencil],

        GL_STENCIL_FUNC => vec![int(front.func.0)],
        GL_STENCIL_REF => vec![front.func.1],
        GL_STENCIL_VALUE_MASK => vec![int(front.func.2)],
        GL_STENCIL_FAIL => vec![int(front.op[0])],
        GL_STENCIL_PASS_DEPTH_FAIL => vec![int(front.op[1])],
        GL_STENCIL_PASS_DEPTH_PASS => vec![int(front.op[2])],
        GL_STENCIL_WRITEMASK => vec![int(front.writemask)],
        GL_STENCIL_BACK_FUNC => vec![int(back.func.0)],
        GL_STENCIL_BACK_REF => vec![back.func.1],
        GL_STENCIL_BACK_VALUE_MASK => vec![int(back.func.2)],
        GL_STENCIL_BACK_FAIL => vec![int(back.op[0])],
        GL_STENCIL_BACK_PASS_DEPTH_FAIL => vec![int(back.op[1])],
        GL_STENCIL_BACK_PASS_DEPTH_PASS => vec![int(back.op[2])],
        GL_STENCIL_BACK_WRITEMASK => vec![int(back.writemask)],
        _ => return None,
    };
    Some(values)
}

/// Number of integers the driver writes for a pname the shadow does not cache.
fn value_count(pname: GLenum) -> usize {
    match pname {
        GL_BLEND_COLOR | GL_COLOR_CLEAR_VALUE => 4,
        GL_DEPTH_RANGE | GL_MAX_VIEWPORT_DIMS | GL_ALIASED_POINT_SIZE_RANGE
        | GL_ALIASED_LINE_WIDTH_RANGE => 2,
        _ => 1,
    }
}
