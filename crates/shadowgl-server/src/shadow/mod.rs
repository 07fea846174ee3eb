//! Per-context shadow of the GLES2 state the engine validates and elides against.
//!
//! Field representations mirror what the driver would report (floats stay floats, masks stay
//! full-width) so that redundancy checks can compare bit for bit.

mod attribs;
mod limits;
mod programs;

pub use attribs::{VertexAttrib, VertexAttribList, NUM_EMBEDDED_ATTRIBS};
pub use limits::{Limit, Limits};
pub use programs::{LocationKind, ProgramCache, ProgramLocations};

use bitflags::bitflags;

use shadowgl_types::gl::*;

/// Number of texture units the shadow tracks bindings for (`GL_TEXTURE0..=GL_TEXTURE31`).
pub const MAX_TEXTURE_UNITS: usize = 32;

bitflags! {
    /// The ES2 capabilities toggled by `glEnable`/`glDisable`.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct Capabilities: u16 {
        const BLEND = 1 << 0;
        const CULL_FACE = 1 << 1;
        const DEPTH_TEST = 1 << 2;
        const DITHER = 1 << 3;
        const POLYGON_OFFSET_FILL = 1 << 4;
        const SAMPLE_ALPHA_TO_COVERAGE = 1 << 5;
        const SAMPLE_COVERAGE = 1 << 6;
        const SCISSOR_TEST = 1 << 7;
        const STENCIL_TEST = 1 << 8;
    }
}

impl Capabilities {
    /// Maps a `glEnable` argument to its flag. `None` for anything outside the ES2 set.
    pub fn from_cap(cap: GLenum) -> Option<Self> {
        Some(match cap {
            GL_BLEND => Self::BLEND,
            GL_CULL_FACE => Self::CULL_FACE,
            GL_DEPTH_TEST => Self::DEPTH_TEST,
            GL_DITHER => Self::DITHER,
            GL_POLYGON_OFFSET_FILL => Self::POLYGON_OFFSET_FILL,
            GL_SAMPLE_ALPHA_TO_COVERAGE => Self::SAMPLE_ALPHA_TO_COVERAGE,
            GL_SAMPLE_COVERAGE => Self::SAMPLE_COVERAGE,
            GL_SCISSOR_TEST => Self::SCISSOR_TEST,
            GL_STENCIL_TEST => Self::STENCIL_TEST,
            _ => return None,
        })
    }
}

/// One face's stencil state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilFace {
    /// `(func, ref, value_mask)`.
    pub func: (GLenum, GLint, GLuint),
    /// `[sfail, dpfail, dppass]`.
    pub op: [GLenum; 3],
    pub writemask: GLuint,
}

impl Default for StencilFace {
    fn default() -> Self {
        Self {
            func: (GL_ALWAYS, 0, GLuint::MAX),
            op: [GL_KEEP; 3],
            writemask: GLuint::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendState {
    pub color: [GLfloat; 4],
    /// `[rgb, alpha]`.
    pub equation: [GLenum; 2],
    /// `[src_rgb, dst_rgb, src_alpha, dst_alpha]`.
    pub func: [GLenum; 4],
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            color: [0.0; 4],
            equation: [GL_FUNC_ADD; 2],
            func: [GL_ONE, GL_ZERO, GL_ONE, GL_ZERO],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureUnit {
    pub texture_2d: GLuint,
    pub cube_map: GLuint,
}

/// Bound object names. Buffer/texture/framebuffer/renderbuffer names are the client's, translated
/// only when a call reaches the driver. Programs use driver names directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bindings {
    pub array_buffer: GLuint,
    pub element_array_buffer: GLuint,
    pub framebuffer: GLuint,
    pub renderbuffer: GLuint,
    pub program: GLuint,
    pub active_texture: GLenum,
    pub texture_units: [TextureUnit; MAX_TEXTURE_UNITS],
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            array_buffer: 0,
            element_array_buffer: 0,
            framebuffer: 0,
            renderbuffer: 0,
            program: 0,
            active_texture: GL_TEXTURE0,
            texture_units: [TextureUnit::default(); MAX_TEXTURE_UNITS],
        }
    }
}

impl Bindings {
    pub fn active_unit(&self) -> &TextureUnit {
        &self.texture_units[self.active_unit_index()]
    }

    pub fn active_unit_mut(&mut self) -> &mut TextureUnit {
        let index = self.active_unit_index();
        &mut self.texture_units[index]
    }

    fn active_unit_index(&self) -> usize {
        (self.active_texture.wrapping_sub(GL_TEXTURE0) as usize).min(MAX_TEXTURE_UNITS - 1)
    }
}

#[derive(Debug)]
pub struct ShadowState {
    /// Most specific error recorded since the last error query.
    pub error: GLenum,
    /// A forwarded call may have raised an error only the driver knows about.
    pub need_get_error: bool,

    pub bindings: Bindings,
    pub capabilities: Capabilities,
    pub blend: BlendState,

    pub clear_color: [GLfloat; 4],
    pub clear_depth: GLfloat,
    pub clear_stencil: GLint,
    pub color_writemask: [bool; 4],

    pub cull_face_mode: GLenum,
    pub front_face: GLenum,
    pub depth_func: GLenum,
    pub depth_writemask: bool,
    pub depth_range: [GLfloat; 2],
    pub generate_mipmap_hint: GLenum,
    pub line_width: GLfloat,
    pub pack_alignment: GLint,
    pub unpack_alignment: GLint,
    pub polygon_offset: [GLfloat; 2],
    pub sample_coverage: (GLfloat, bool),
    pub scissor_box: [GLint; 4],
    pub viewport: [GLint; 4],

    /// `[front, back]`.
    pub stencil: [StencilFace; 2],

    pub vertex_attribs: VertexAttribList,
    pub limits: Limits,
    pub programs: ProgramCache,
}

impl Default for ShadowState {
    fn default() -> Self {
        Self {
            error: GL_NO_ERROR,
            need_get_error: false,
            bindings: Bindings::default(),
            capabilities: Capabilities::DITHER,
            blend: BlendState::default(),
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
            color_writemask: [true; 4],
            cull_face_mode: GL_BACK,
            front_face: GL_CCW,
            depth_func: GL_LESS,
            depth_writemask: true,
            depth_range: [0.0, 1.0],
            generate_mipmap_hint: GL_DONT_CARE,
            line_width: 1.0,
            pack_alignment: 4,
            unpack_alignment: 4,
            polygon_offset: [0.0, 0.0],
            sample_coverage: (1.0, false),
            scissor_box: [0; 4],
            viewport: [0; 4],
            stencil: [StencilFace::default(); 2],
            vertex_attribs: VertexAttribList::default(),
            limits: Limits::default(),
            programs: ProgramCache::default(),
        }
    }
}

impl ShadowState {
    pub fn new() -> Box<Self> {
        Box::default()
    }

    /// Stores `error` unless an earlier one is still pending; the first error wins until queried.
    /// Returns whether it was stored.
    pub fn set_error(&mut self, error: GLenum) -> bool {
        if self.error == GL_NO_ERROR {
            self.error = error;
            true
        } else {
            false
        }
    }

    /// Read-and-clear of the cached error.
    pub fn take_error(&mut self) -> GLenum {
        std::mem::replace(&mut self.error, GL_NO_ERROR)
    }

    pub fn is_enabled(&self, cap: Capabilities) -> bool {
        self.capabilities.contains(cap)
    }

    /// Drops every cached binding that refers to the deleted client `buffer`.
    pub fn forget_buffer(&mut self, buffer: GLuint) {
        if self.bindings.array_buffer == buffer {
            self.bindings.array_buffer = 0;
        }
        if self.bindings.element_array_buffer == buffer {
            self.bindings.element_array_buffer = 0;
        }
        self.vertex_attribs.unbind_buffer(buffer);
    }

    pub fn forget_texture(&mut self, texture: GLuint) {
        for unit in &mut self.bindings.texture_units {
            if unit.texture_2d == texture {
                unit.texture_2d = 0;
            }
            if unit.cube_map == texture {
                unit.cube_map = 0;
            }
        }
    }

    pub fn forget_framebuffer(&mut self, framebuffer: GLuint) {
        if self.bindings.framebuffer == framebuffer {
            self.bindings.framebuffer = 0;
        }
    }

    pub fn forget_renderbuffer(&mut self, renderbuffer: GLuint) {
        if self.bindings.renderbuffer == renderbuffer {
            self.bindings.renderbuffer = 0;
        }
    }
}
