//! Object binding, name allocation and data upload.
//!
//! Bindings are cached under client names. The driver name is looked up only when a call actually
//! reaches the driver; binding a client name that has no driver object yet creates one first.

use tracing::warn;

use shadowgl_types::gl::*;

use super::domains::{self, enum_in};
use super::Ctx;
use crate::driver::{Driver, EntryPoint};
use crate::names::ObjectClass;
use crate::shadow::{Limit, ShadowState};

/// Everything the generic gen/delete/bind paths need to know about one object class.
pub(super) struct ObjectKind {
    class: ObjectClass,
    gen_entry: EntryPoint,
    gen: fn(&dyn Driver, &mut [GLuint]),
    delete: fn(&dyn Driver, &[GLuint]),
    forget: fn(&mut ShadowState, GLuint),
}

pub(super) const BUFFERS: ObjectKind = ObjectKind {
    class: ObjectClass::Buffer,
    gen_entry: EntryPoint::GenBuffers,
    gen: |d, names| d.gen_buffers(names),
    delete: |d, names| d.delete_buffers(names),
    forget: ShadowState::forget_buffer,
};

pub(super) const TEXTURES: ObjectKind = ObjectKind {
    class: ObjectClass::Texture,
    gen_entry: EntryPoint::GenTextures,
    gen: |d, names| d.gen_textures(names),
    delete: |d, names| d.delete_textures(names),
    forget: ShadowState::forget_texture,
};

pub(super) const FRAMEBUFFERS: ObjectKind = ObjectKind {
    class: ObjectClass::Framebuffer,
    gen_entry: EntryPoint::GenFramebuffers,
    gen: |d, names| d.gen_framebuffers(names),
    delete: |d, names| d.delete_framebuffers(names),
    forget: ShadowState::forget_framebuffer,
};

pub(super) const RENDERBUFFERS: ObjectKind = ObjectKind {
    class: ObjectClass::Renderbuffer,
    gen_entry: EntryPoint::GenRenderbuffers,
    gen: |d, names| d.gen_renderbuffers(names),
    delete: |d, names| d.delete_renderbuffers(names),
    forget: ShadowState::forget_renderbuffer,
};

impl Ctx<'_> {
    /// Creates driver objects for freshly allocated client names and records the translation.
    pub(super) fn gen_names(&mut self, kind: ObjectKind, client: &[GLuint]) {
        if client.is_empty() {
            return;
        }
        let mut driver_names = vec![0; client.len()];
        self.forward(|d| (kind.gen)(d, &mut driver_names));
        self.names.insert_all(kind.class, client, &driver_names);
    }

    /// Takes the translations for `client`, drops cached bindings to them, and deletes the
    /// driver objects.
    pub(super) fn delete_names(&mut self, kind: ObjectKind, client: &[GLuint]) {
        if client.is_empty() {
            return;
        }
        let driver_names = self.names.take_all(kind.class, client);
        for &name in client.iter().filter(|&&n| n != 0) {
            (kind.forget)(self.state, name);
        }
        self.forward(|d| (kind.delete)(d, &driver_names));
    }

    /// Driver name behind `client`, creating the driver object if the client never generated
    /// one.
    fn driver_name(&mut self, kind: &ObjectKind, client: GLuint) -> GLuint {
        if let Some(name) = self.names.lookup(kind.class, client) {
            return name;
        }
        if !self.driver.is_bound(kind.gen_entry) {
            warn!(class = ?kind.class, client, "no translation and no way to create one");
            return client;
        }
        let mut fresh = [0];
        self.forward(|d| (kind.gen)(d, &mut fresh));
        self.names.insert(kind.class, client, fresh[0]);
        fresh[0]
    }

    /// Shared binder: cached-name redundancy check, translation, optimistic cache update.
    fn bind(
        &mut self,
        kind: &ObjectKind,
        name: GLuint,
        slot: fn(&mut ShadowState) -> &mut GLuint,
        call: impl FnOnce(&dyn Driver, GLuint),
    ) {
        if *slot(self.state) == name {
            self.elide();
            return;
        }
        let driver_name = self.driver_name(kind, name);
        // Cached before the driver has validated the name; a rejected bind is only visible
        // through the next authoritative error query.
        *slot(self.state) = name;
        self.forward_unverified(|d| call(d, driver_name));
    }

    pub(super) fn bind_buffer(&mut self, target: GLenum, buffer: GLuint) {
        let slot: fn(&mut ShadowState) -> &mut GLuint = match target {
            GL_ARRAY_BUFFER => |s| &mut s.bindings.array_buffer,
            GL_ELEMENT_ARRAY_BUFFER => |s| &mut s.bindings.element_array_buffer,
            _ => {
                self.error(GL_INVALID_ENUM);
                return;
            }
        };
        self.bind(&BUFFERS, buffer, slot, |d, name| d.bind_buffer(target, name));
    }

    pub(super) fn bind_texture(&mut self, target: GLenum, texture: GLuint) {
        let slot: fn(&mut ShadowState) -> &mut GLuint = match target {
            GL_TEXTURE_2D => |s| &mut s.bindings.active_unit_mut().texture_2d,
            GL_TEXTURE_CUBE_MAP => |s| &mut s.bindings.active_unit_mut().cube_map,
            _ => {
                self.error(GL_INVALID_ENUM);
                return;
            }
        };
        self.bind(&TEXTURES, texture, slot, |d, name| d.bind_texture(target, name));
    }

    pub(super) fn bind_framebuffer(&mut self, target: GLenum, framebuffer: GLuint) {
        if !self.enum_ok(target == GL_FRAMEBUFFER) {
            return;
        }
        self.bind(&FRAMEBUFFERS, framebuffer, |s| &mut s.bindings.framebuffer, |d, name| {
            d.bind_framebuffer(target, name)
        });
    }

    pub(super) fn bind_renderbuffer(&mut self, target: GLenum, renderbuffer: GLuint) {
        if !self.enum_ok(target == GL_RENDERBUFFER) {
            return;
        }
        self.bind(&RENDERBUFFERS, renderbuffer, |s| &mut s.bindings.renderbuffer, |d, name| {
            d.bind_renderbuffer(target, name)
        });
    }

    pub(super) fn buffer_data(&mut self, target: GLenum, data: Option<&[u8]>, size: i64, usage: GLenum) {
        if !self.check(enum_in(domains::BUFFER_TARGETS)(&target))
            || !self.value_ok(size >= 0)
            || !self.check(enum_in(domains::BUFFER_USAGES)(&usage))
            || !self.value_ok(data.map_or(true, |d| d.len() as i64 >= size))
        {
            return;
        }
        self.forward_unverified(|d| d.buffer_data(target, size as GLsizeiptr, data, usage));
    }

    pub(super) fn buffer_sub_data(&mut self, target: GLenum, offset: i64, data: &[u8]) {
        if !self.check(enum_in(domains::BUFFER_TARGETS)(&target)) || !self.value_ok(offset >= 0) {
            return;
        }
        self.forward_unverified(|d| d.buffer_sub_data(target, offset as GLintptr, data));
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn tex_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        [width, height]: [GLsizei; 2],
        border: GLint,
        format: GLenum,
        ty: GLenum,
        pixels: Option<&[u8]>,
    ) {
        if !self.check(enum_in(domains::TEXTURE_IMAGE_TARGETS)(&target))
            || !self.value_ok(level >= 0 && width >= 0 && height >= 0 && border == 0)
        {
            return;
        }
        let max = if target == GL_TEXTURE_2D {
            self.limit(Limit::MaxTextureSize)
        } else {
            self.limit(Limit::MaxCubeMapTextureSize)
        };
        if !self.value_ok(width <= max && height <= max) {
            return;
        }
        if !self.check(enum_in(domains::PIXEL_FORMATS)(&format))
            || !self.check(enum_in(domains::PIXEL_TYPES)(&ty))
        {
            return;
        }
        let Some(pixel) = domains::pixel_size(format, ty) else {
            self.error(GL_INVALID_OPERATION);
            return;
        };
        if let Some(pixels) = pixels {
            let alignment = self.state.unpack_alignment as usize;
            let needed = domains::image_size(pixel, width as usize, height as usize, alignment);
            if !self.value_ok(needed.is_some_and(|needed| pixels.len() >= needed)) {
                return;
            }
        }
        self.forward_unverified(|d| {
            d.tex_image_2d(target, level, internal_format, width, height, border, format, ty, pixels)
        });
    }

    pub(super) fn tex_parameteri(&mut self, target: GLenum, pname: GLenum, param: GLint) {
        if self.check(enum_in(domains::TEXTURE_TARGETS)(&target)) {
            self.forward_unverified(|d| d.tex_parameteri(target, pname, param));
        }
    }

    pub(super) fn generate_mipmap(&mut self, target: GLenum) {
        if self.check(enum_in(domains::TEXTURE_TARGETS)(&target)) {
            self.forward_unverified(|d| d.generate_mipmap(target));
        }
    }

    pub(super) fn check_framebuffer_status(&mut self, target: GLenum) -> GLenum {
        if !self.enum_ok(target == GL_FRAMEBUFFER) {
            return 0;
        }
        self.forward_unverified(|d| d.check_framebuffer_status(target))
    }
}
