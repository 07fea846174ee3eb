//! Shaders, programs and the per-program location cache.

use shadowgl_types::gl::*;

use super::domains::{self, enum_in};
use super::Ctx;
use crate::shadow::LocationKind;

impl Ctx<'_> {
    pub(super) fn create_shader(&mut self, kind: GLenum) -> GLuint {
        if !self.check(enum_in(domains::SHADER_KINDS)(&kind)) {
            return 0;
        }
        self.forward(|d| d.create_shader(kind))
    }

    pub(super) fn shader_source(&mut self, shader: GLuint, sources: &[String]) {
        self.forward_unverified(|d| d.shader_source(shader, sources));
    }

    pub(super) fn compile_shader(&mut self, shader: GLuint) {
        self.forward_unverified(|d| d.compile_shader(shader));
    }

    pub(super) fn create_program(&mut self) -> GLuint {
        self.forward(|d| d.create_program())
    }

    pub(super) fn attach_shader(&mut self, program: GLuint, shader: GLuint) {
        self.forward_unverified(|d| d.attach_shader(program, shader));
    }

    /// Relinking reassigns locations, so anything cached for `program` is dropped first.
    pub(super) fn link_program(&mut self, program: GLuint) {
        self.state.programs.invalidate(program);
        self.forward_unverified(|d| d.link_program(program));
    }

    pub(super) fn use_program(&mut self, program: GLuint) {
        if self.state.bindings.program == program {
            self.elide();
            return;
        }
        self.state.bindings.program = program;
        self.forward_unverified(|d| d.use_program(program));
    }

    pub(super) fn delete_program(&mut self, program: GLuint) {
        self.state.programs.invalidate(program);
        self.forward_unverified(|d| d.delete_program(program));
    }

    pub(super) fn attrib_location(&mut self, program: GLuint, name: &str) -> GLint {
        self.location(program, LocationKind::Attrib, name)
    }

    pub(super) fn uniform_location(&mut self, program: GLuint, name: &str) -> GLint {
        self.location(program, LocationKind::Uniform, name)
    }

    /// Cached location lookup. Only successful (non-negative) answers are remembered: a `-1`
    /// might come from an unlinked program that links later.
    fn location(&mut self, program: GLuint, kind: LocationKind, name: &str) -> GLint {
        if let Some(location) = self.state.programs.lookup(program, kind, name) {
            self.elide();
            return location;
        }
        let location = self.forward_unverified(|d| match kind {
            LocationKind::Attrib => d.get_attrib_location(program, name),
            LocationKind::Uniform => d.get_uniform_location(program, name),
        });
        if location >= 0 {
            self.state.programs.store(program, kind, name, location);
        }
        location
    }
}
