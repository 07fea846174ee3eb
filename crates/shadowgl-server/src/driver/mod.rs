//! The driver binding: the real EGL/GLES2 implementation the server replays calls against.
//!
//! The engine never touches function pointers. It asks [`Driver::is_bound`] whether an entry point
//! resolved and only then calls the matching trait method; calling an unbound method is a no-op
//! that returns a zero value.

mod native;

pub use native::NativeDriver;

use shadowgl_types::egl::EGLint;
use shadowgl_types::gl::{
    GLbitfield, GLenum, GLfloat, GLint, GLintptr, GLsizei, GLsizeiptr, GLuint,
};
use shadowgl_types::{Config, Context, Display, NativeDisplay, NativeWindow, Surface};

/// Which library an entry point is resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Library {
    Egl,
    Gles,
}

macro_rules! entry_points {
    ($( $lib:ident { $( $name:ident => $symbol:literal, )* } )*) => {
        /// Every entry point the server can forward.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EntryPoint {
            $( $( $name, )* )*
        }

        impl EntryPoint {
            pub const ALL: &'static [EntryPoint] = &[$( $( EntryPoint::$name, )* )*];

            /// Primary symbol name exported by the native library.
            pub const fn symbol(self) -> &'static str {
                match self {
                    $( $( EntryPoint::$name => $symbol, )* )*
                }
            }

            pub const fn library(self) -> Library {
                match self {
                    $( $( EntryPoint::$name => Library::$lib, )* )*
                }
            }
        }
    };
}

entry_points! {
    Egl {
        EglGetDisplay => "eglGetDisplay",
        EglInitialize => "eglInitialize",
        EglTerminate => "eglTerminate",
        EglChooseConfig => "eglChooseConfig",
        EglCreateContext => "eglCreateContext",
        EglDestroyContext => "eglDestroyContext",
        EglCreateWindowSurface => "eglCreateWindowSurface",
        EglCreatePbufferSurface => "eglCreatePbufferSurface",
        EglDestroySurface => "eglDestroySurface",
        EglMakeCurrent => "eglMakeCurrent",
        EglReleaseThread => "eglReleaseThread",
        EglSwapBuffers => "eglSwapBuffers",
        EglGetError => "eglGetError",
        EglGetProcAddress => "eglGetProcAddress",
    }
    Gles {
        GetError => "glGetError",
        ActiveTexture => "glActiveTexture",
        AttachShader => "glAttachShader",
        BindBuffer => "glBindBuffer",
        BindFramebuffer => "glBindFramebuffer",
        BindRenderbuffer => "glBindRenderbuffer",
        BindTexture => "glBindTexture",
        BlendColor => "glBlendColor",
        BlendEquation => "glBlendEquation",
        BlendEquationSeparate => "glBlendEquationSeparate",
        BlendFunc => "glBlendFunc",
        BlendFuncSeparate => "glBlendFuncSeparate",
        BufferData => "glBufferData",
        BufferSubData => "glBufferSubData",
        CheckFramebufferStatus => "glCheckFramebufferStatus",
        Clear => "glClear",
        ClearColor => "glClearColor",
        ClearDepthf => "glClearDepthf",
        ClearStencil => "glClearStencil",
        ColorMask => "glColorMask",
        CompileShader => "glCompileShader",
        CreateProgram => "glCreateProgram",
        CreateShader => "glCreateShader",
        CullFace => "glCullFace",
        DeleteBuffers => "glDeleteBuffers",
        DeleteFramebuffers => "glDeleteFramebuffers",
        DeleteProgram => "glDeleteProgram",
        DeleteRenderbuffers => "glDeleteRenderbuffers",
        DeleteTextures => "glDeleteTextures",
        DepthFunc => "glDepthFunc",
        DepthMask => "glDepthMask",
        DepthRangef => "glDepthRangef",
        Disable => "glDisable",
        DisableVertexAttribArray => "glDisableVertexAttribArray",
        DrawArrays => "glDrawArrays",
        DrawElements => "glDrawElements",
        Enable => "glEnable",
        EnableVertexAttribArray => "glEnableVertexAttribArray",
        Finish => "glFinish",
        Flush => "glFlush",
        FrontFace => "glFrontFace",
        GenBuffers => "glGenBuffers",
        GenFramebuffers => "glGenFramebuffers",
        GenRenderbuffers => "glGenRenderbuffers",
        GenTextures => "glGenTextures",
        GenerateMipmap => "glGenerateMipmap",
        GetAttribLocation => "glGetAttribLocation",
        GetIntegerv => "glGetIntegerv",
        GetUniformLocation => "glGetUniformLocation",
        Hint => "glHint",
        IsEnabled => "glIsEnabled",
        LineWidth => "glLineWidth",
        LinkProgram => "glLinkProgram",
        PixelStorei => "glPixelStorei",
        PolygonOffset => "glPolygonOffset",
        SampleCoverage => "glSampleCoverage",
        Scissor => "glScissor",
        ShaderSource => "glShaderSource",
        StencilFuncSeparate => "glStencilFuncSeparate",
        StencilMaskSeparate => "glStencilMaskSeparate",
        StencilOpSeparate => "glStencilOpSeparate",
        TexImage2D => "glTexImage2D",
        TexParameteri => "glTexParameteri",
        UseProgram => "glUseProgram",
        VertexAttribPointer => "glVertexAttribPointer",
        Viewport => "glViewport",
    }
}

/// Alternate symbol suffixes tried, in order, when a GL symbol's primary name doesn't resolve.
pub const SYMBOL_SUFFIXES: [&str; 2] = ["ARB", "EXT"];

/// Candidate symbol names for `entry`: the primary name, then the vendor-suffixed variants for GL
/// entry points.
pub fn candidate_symbols(entry: EntryPoint) -> Vec<String> {
    let primary = entry.symbol();
    let mut names = vec![primary.to_string()];
    if entry.library() == Library::Gles {
        names.extend(SYMBOL_SUFFIXES.iter().map(|s| format!("{primary}{s}")));
    }
    names
}

/// The subset of EGL and GLES2 the server forwards.
///
/// Methods mirror the C entry points with Rust-shaped arguments: attribute lists are slices
/// without a terminator, name arrays are slices, and output arrays are `&mut` slices.
pub trait Driver: Send + Sync {
    fn is_bound(&self, entry: EntryPoint) -> bool;

    // EGL.
    fn get_display(&self, native: NativeDisplay) -> Display;
    /// `Some((major, minor))` on success.
    fn initialize(&self, display: Display) -> Option<(EGLint, EGLint)>;
    fn terminate(&self, display: Display) -> bool;
    fn choose_config(&self, display: Display, attribs: &[EGLint], max: EGLint) -> Option<Vec<Config>>;
    fn create_context(&self, display: Display, config: Config, share: Context, attribs: &[EGLint]) -> Context;
    fn destroy_context(&self, display: Display, context: Context) -> bool;
    fn create_window_surface(&self, display: Display, config: Config, window: NativeWindow, attribs: &[EGLint]) -> Surface;
    fn create_pbuffer_surface(&self, display: Display, config: Config, attribs: &[EGLint]) -> Surface;
    fn destroy_surface(&self, display: Display, surface: Surface) -> bool;
    fn make_current(&self, display: Display, draw: Surface, read: Surface, context: Context) -> bool;
    fn release_thread(&self) -> bool;
    fn swap_buffers(&self, display: Display, surface: Surface) -> bool;
    fn egl_get_error(&self) -> EGLint;

    // GLES2 state.
    fn get_error(&self) -> GLenum;
    fn active_texture(&self, texture: GLenum);
    fn blend_color(&self, r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat);
    fn blend_equation(&self, mode: GLenum);
    fn blend_equation_separate(&self, mode_rgb: GLenum, mode_alpha: GLenum);
    fn blend_func(&self, sfactor: GLenum, dfactor: GLenum);
    fn blend_func_separate(&self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum);
    fn clear_color(&self, r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat);
    fn clear_depthf(&self, depth: GLfloat);
    fn clear_stencil(&self, s: GLint);
    fn color_mask(&self, r: bool, g: bool, b: bool, a: bool);
    fn cull_face(&self, mode: GLenum);
    fn depth_func(&self, func: GLenum);
    fn depth_mask(&self, flag: bool);
    fn depth_rangef(&self, near: GLfloat, far: GLfloat);
    fn enable(&self, cap: GLenum);
    fn disable(&self, cap: GLenum);
    fn is_enabled(&self, cap: GLenum) -> bool;
    fn front_face(&self, mode: GLenum);
    fn hint(&self, target: GLenum, mode: GLenum);
    fn line_width(&self, width: GLfloat);
    fn pixel_storei(&self, pname: GLenum, param: GLint);
    fn polygon_offset(&self, factor: GLfloat, units: GLfloat);
    fn sample_coverage(&self, value: GLfloat, invert: bool);
    fn scissor(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn stencil_func_separate(&self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint);
    fn stencil_mask_separate(&self, face: GLenum, mask: GLuint);
    fn stencil_op_separate(&self, face: GLenum, fail: GLenum, zfail: GLenum, zpass: GLenum);
    fn get_integerv(&self, pname: GLenum, params: &mut [GLint]);

    // Objects.
    fn bind_buffer(&self, target: GLenum, buffer: GLuint);
    fn bind_texture(&self, target: GLenum, texture: GLuint);
    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint);
    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: GLuint);
    fn gen_buffers(&self, names: &mut [GLuint]);
    fn gen_textures(&self, names: &mut [GLuint]);
    fn gen_framebuffers(&self, names: &mut [GLuint]);
    fn gen_renderbuffers(&self, names: &mut [GLuint]);
    fn delete_buffers(&self, names: &[GLuint]);
    fn delete_textures(&self, names: &[GLuint]);
    fn delete_framebuffers(&self, names: &[GLuint]);
    fn delete_renderbuffers(&self, names: &[GLuint]);
    fn buffer_data(&self, target: GLenum, size: GLsizeiptr, data: Option<&[u8]>, usage: GLenum);
    fn buffer_sub_data(&self, target: GLenum, offset: GLintptr, data: &[u8]);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        ty: GLenum,
        pixels: Option<&[u8]>,
    );
    fn tex_parameteri(&self, target: GLenum, pname: GLenum, param: GLint);
    fn generate_mipmap(&self, target: GLenum);
    fn check_framebuffer_status(&self, target: GLenum) -> GLenum;

    // Shaders and programs.
    fn create_shader(&self, kind: GLenum) -> GLuint;
    fn shader_source(&self, shader: GLuint, sources: &[String]);
    fn compile_shader(&self, shader: GLuint);
    fn create_program(&self) -> GLuint;
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    fn link_program(&self, program: GLuint);
    fn use_program(&self, program: GLuint);
    fn delete_program(&self, program: GLuint);
    fn get_attrib_location(&self, program: GLuint, name: &str) -> GLint;
    fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint;

    // Vertex input and drawing.
    fn enable_vertex_attrib_array(&self, index: GLuint);
    fn disable_vertex_attrib_array(&self, index: GLuint);
    fn vertex_attrib_pointer(&self, index: GLuint, size: GLint, ty: GLenum, normalized: bool, stride: GLsizei, offset: usize);
    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei);
    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize);
    fn clear(&self, mask: GLbitfield);
    fn flush(&self);
    fn finish(&self);
}
