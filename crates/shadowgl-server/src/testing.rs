//! In-memory [`Driver`] for tests: records every call, hands out fresh handles and names, and
//! can be told to leave entry points unbound or to report driver-side errors.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::sync::Mutex;

use shadowgl_types::egl::{EGLint, EGL_SUCCESS};
use shadowgl_types::gl::*;
use shadowgl_types::{Config, Context, Display, NativeDisplay, NativeWindow, Surface};

use crate::driver::{Driver, EntryPoint};

/// Default first name handed out by the `gen_*` entry points. Far from the small names clients
/// allocate, so a missing translation shows up as a wrong name in the log.
pub const DRIVER_NAME_BASE: GLuint = 1000;

/// One forwarded call: the entry point and its arguments, debug-formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub entry: EntryPoint,
    pub args: String,
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<Call>,
    unbound: HashSet<EntryPoint>,
    integers: HashMap<GLenum, Vec<GLint>>,
    errors: VecDeque<GLenum>,
    next_name: GLuint,
    next_handle: u64,
    refuse_make_current: bool,
}

#[derive(Debug)]
pub struct RecordingDriver {
    inner: Mutex<Inner>,
}

impl Default for RecordingDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::with_name_base(DRIVER_NAME_BASE)
    }

    /// A driver whose `gen_*` entry points count up from `base`.
    pub fn with_name_base(base: GLuint) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_name: base,
                next_handle: 0x100,
                ..Inner::default()
            }),
        }
    }

    fn inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes `entry` report unbound; calls to it are then not recorded.
    pub fn unbind(&self, entry: EntryPoint) -> &Self {
        self.inner().unbound.insert(entry);
        self
    }

    /// Answer for `get_integerv(pname)`.
    pub fn set_integer(&self, pname: GLenum, values: &[GLint]) -> &Self {
        self.inner().integers.insert(pname, values.to_vec());
        self
    }

    /// Queues an error for the next driver `get_error`.
    pub fn push_error(&self, error: GLenum) -> &Self {
        self.inner().errors.push_back(error);
        self
    }

    pub fn refuse_make_current(&self, refuse: bool) -> &Self {
        self.inner().refuse_make_current = refuse;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner().calls.clone()
    }

    pub fn count(&self, entry: EntryPoint) -> usize {
        self.inner().calls.iter().filter(|c| c.entry == entry).count()
    }

    pub fn last(&self, entry: EntryPoint) -> Option<Call> {
        self.inner().calls.iter().rev().find(|c| c.entry == entry).cloned()
    }

    pub fn clear_calls(&self) {
        self.inner().calls.clear();
    }

    /// Logs the call if `entry` is bound. Returns whether it was.
    fn hit(&self, entry: EntryPoint, args: impl Debug) -> bool {
        let mut inner = self.inner();
        if inner.unbound.contains(&entry) {
            return false;
        }
        inner.calls.push(Call {
            entry,
            args: format!("{args:?}"),
        });
        true
    }

    fn handle(&self) -> u64 {
        let mut inner = self.inner();
        inner.next_handle += 1;
        inner.next_handle
    }

    fn gen(&self, entry: EntryPoint, names: &mut [GLuint]) {
        if !self.hit(entry, names.len()) {
            return;
        }
        let mut inner = self.inner();
        for name in names {
            *name = inner.next_name;
            inner.next_name += 1;
        }
    }
}

impl Driver for RecordingDriver {
    fn is_bound(&self, entry: EntryPoint) -> bool {
        !self.inner().unbound.contains(&entry)
    }

    fn get_display(&self, native: NativeDisplay) -> Display {
        if !self.hit(EntryPoint::EglGetDisplay, native) {
            return Display::NONE;
        }
        Display(native.raw() + 1)
    }

    fn initialize(&self, display: Display) -> Option<(EGLint, EGLint)> {
        self.hit(EntryPoint::EglInitialize, display).then_some((1, 4))
    }

    fn terminate(&self, display: Display) -> bool {
        self.hit(EntryPoint::EglTerminate, display)
    }

    fn choose_config(&self, display: Display, attribs: &[EGLint], max: EGLint) -> Option<Vec<Config>> {
        if !self.hit(EntryPoint::EglChooseConfig, (display, attribs, max)) {
            return None;
        }
        Some((1..=max.clamp(0, 2) as u64).map(Config).collect())
    }

    fn create_context(&self, display: Display, config: Config, share: Context, attribs: &[EGLint]) -> Context {
        if !self.hit(EntryPoint::EglCreateContext, (display, config, share, attribs)) {
            return Context::NONE;
        }
        Context(self.handle())
    }

    fn destroy_context(&self, display: Display, context: Context) -> bool {
        self.hit(EntryPoint::EglDestroyContext, (display, context))
    }

    fn create_window_surface(&self, display: Display, config: Config, window: NativeWindow, attribs: &[EGLint]) -> Surface {
        if !self.hit(EntryPoint::EglCreateWindowSurface, (display, config, window, attribs)) {
            return Surface::NONE;
        }
        Surface(self.handle())
    }

    fn create_pbuffer_surface(&self, display: Display, config: Config, attribs: &[EGLint]) -> Surface {
        if !self.hit(EntryPoint::EglCreatePbufferSurface, (display, config, attribs)) {
            return Surface::NONE;
        }
        Surface(self.handle())
    }

    fn destroy_surface(&self, display: Display, surface: Surface) -> bool {
        self.hit(EntryPoint::EglDestroySurface, (display, surface))
    }

    fn make_current(&self, display: Display, draw: Surface, read: Surface, context: Context) -> bool {
        self.hit(EntryPoint::EglMakeCurrent, (display, draw, read, context))
            && !self.inner().refuse_make_current
    }

    fn release_thread(&self) -> bool {
        self.hit(EntryPoint::EglReleaseThread, ())
    }

    fn swap_buffers(&self, display: Display, surface: Surface) -> bool {
        self.hit(EntryPoint::EglSwapBuffers, (display, surface))
    }

    fn egl_get_error(&self) -> EGLint {
        self.hit(EntryPoint::EglGetError, ());
        EGL_SUCCESS
    }

    fn get_error(&self) -> GLenum {
        if !self.hit(EntryPoint::GetError, ()) {
            return GL_INVALID_OPERATION;
        }
        self.inner().errors.pop_front().unwrap_or(GL_NO_ERROR)
    }

    fn active_texture(&self, texture: GLenum) {
        self.hit(EntryPoint::ActiveTexture, texture);
    }

    fn blend_color(&self, r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat) {
        self.hit(EntryPoint::BlendColor, (r, g, b, a));
    }

    fn blend_equation(&self, mode: GLenum) {
        self.hit(EntryPoint::BlendEquation, mode);
    }

    fn blend_equation_separate(&self, mode_rgb: GLenum, mode_alpha: GLenum) {
        self.hit(EntryPoint::BlendEquationSeparate, (mode_rgb, mode_alpha));
    }

    fn blend_func(&self, sfactor: GLenum, dfactor: GLenum) {
        self.hit(EntryPoint::BlendFunc, (sfactor, dfactor));
    }

    fn blend_func_separate(&self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum) {
        self.hit(EntryPoint::BlendFuncSeparate, (src_rgb, dst_rgb, src_alpha, dst_alpha));
    }

    fn clear_color(&self, r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat) {
        self.hit(EntryPoint::ClearColor, (r, g, b, a));
    }

    fn clear_depthf(&self, depth: GLfloat) {
        self.hit(EntryPoint::ClearDepthf, depth);
    }

    fn clear_stencil(&self, s: GLint) {
        self.hit(EntryPoint::ClearStencil, s);
    }

    fn color_mask(&self, r: bool, g: bool, b: bool, a: bool) {
        self.hit(EntryPoint::ColorMask, (r, g, b, a));
    }

    fn cull_face(&self, mode: GLenum) {
        self.hit(EntryPoint::CullFace, mode);
    }

    fn depth_func(&self, func: GLenum) {
        self.hit(EntryPoint::DepthFunc, func);
    }

    fn depth_mask(&self, flag: bool) {
        self.hit(EntryPoint::DepthMask, flag);
    }

    fn depth_rangef(&self, near: GLfloat, far: GLfloat) {
        self.hit(EntryPoint::DepthRangef, (near, far));
    }

    fn enable(&self, cap: GLenum) {
        self.hit(EntryPoint::Enable, cap);
    }

    fn disable(&self, cap: GLenum) {
        self.hit(EntryPoint::Disable, cap);
    }

    fn is_enabled(&self, cap: GLenum) -> bool {
        self.hit(EntryPoint::IsEnabled, cap);
        false
    }

    fn front_face(&self, mode: GLenum) {
        self.hit(EntryPoint::FrontFace, mode);
    }

    fn hint(&self, target: GLenum, mode: GLenum) {
        self.hit(EntryPoint::Hint, (target, mode));
    }

    fn line_width(&self, width: GLfloat) {
        self.hit(EntryPoint::LineWidth, width);
    }

    fn pixel_storei(&self, pname: GLenum, param: GLint) {
        self.hit(EntryPoint::PixelStorei, (pname, param));
    }

    fn polygon_offset(&self, factor: GLfloat, units: GLfloat) {
        self.hit(EntryPoint::PolygonOffset, (factor, units));
    }

    fn sample_coverage(&self, value: GLfloat, invert: bool) {
        self.hit(EntryPoint::SampleCoverage, (value, invert));
    }

    fn scissor(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.hit(EntryPoint::Scissor, (x, y, width, height));
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.hit(EntryPoint::Viewport, (x, y, width, height));
    }

    fn stencil_func_separate(&self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint) {
        self.hit(EntryPoint::StencilFuncSeparate, (face, func, reference, mask));
    }

    fn stencil_mask_separate(&self, face: GLenum, mask: GLuint) {
        self.hit(EntryPoint::StencilMaskSeparate, (face, mask));
    }

    fn stencil_op_separate(&self, face: GLenum, fail: GLenum, zfail: GLenum, zpass: GLenum) {
        self.hit(EntryPoint::StencilOpSeparate, (face, fail, zfail, zpass));
    }

    fn get_integerv(&self, pname: GLenum, params: &mut [GLint]) {
        if !self.hit(EntryPoint::GetIntegerv, pname) {
            return;
        }
        params.fill(0);
        if let Some(values) = self.inner().integers.get(&pname) {
            for (out, &v) in params.iter_mut().zip(values) {
                *out = v;
            }
        }
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        self.hit(EntryPoint::BindBuffer, (target, buffer));
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        self.hit(EntryPoint::BindTexture, (target, texture));
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint) {
        self.hit(EntryPoint::BindFramebuffer, (target, framebuffer));
    }

    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: GLuint) {
        self.hit(EntryPoint::BindRenderbuffer, (target, renderbuffer));
    }

    fn gen_buffers(&self, names: &mut [GLuint]) {
        self.gen(EntryPoint::GenBuffers, names);
    }

    fn gen_textures(&self, names: &mut [GLuint]) {
        self.gen(EntryPoint::GenTextures, names);
    }

    fn gen_framebuffers(&self, names: &mut [GLuint]) {
        self.gen(EntryPoint::GenFramebuffers, names);
    }

    fn gen_renderbuffers(&self, names: &mut [GLuint]) {
        self.gen(EntryPoint::GenRenderbuffers, names);
    }

    fn delete_buffers(&self, names: &[GLuint]) {
        self.hit(EntryPoint::DeleteBuffers, names);
    }

    fn delete_textures(&self, names: &[GLuint]) {
        self.hit(EntryPoint::DeleteTextures, names);
    }

    fn delete_framebuffers(&self, names: &[GLuint]) {
        self.hit(EntryPoint::DeleteFramebuffers, names);
    }

    fn delete_renderbuffers(&self, names: &[GLuint]) {
        self.hit(EntryPoint::DeleteRenderbuffers, names);
    }

    fn buffer_data(&self, target: GLenum, size: GLsizeiptr, data: Option<&[u8]>, usage: GLenum) {
        self.hit(EntryPoint::BufferData, (target, size, data.map(<[u8]>::len), usage));
    }

    fn buffer_sub_data(&self, target: GLenum, offset: GLintptr, data: &[u8]) {
        self.hit(EntryPoint::BufferSubData, (target, offset, data.len()));
    }

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
    ) {
        self.hit(
            EntryPoint::TexImage2D,
            (target, level, internal_format, width, height, border, format, ty, pixels.map(<[u8]>::len)),
        );
    }

    fn tex_parameteri(&self, target: GLenum, pname: GLenum, param: GLint) {
        self.hit(EntryPoint::TexParameteri, (target, pname, param));
    }

    fn generate_mipmap(&self, target: GLenum) {
        self.hit(EntryPoint::GenerateMipmap, target);
    }

    fn check_framebuffer_status(&self, target: GLenum) -> GLenum {
        if !self.hit(EntryPoint::CheckFramebufferStatus, target) {
            return 0;
        }
        GL_FRAMEBUFFER_COMPLETE
    }

    fn create_shader(&self, kind: GLenum) -> GLuint {
        if !self.hit(EntryPoint::CreateShader, kind) {
            return 0;
        }
        self.handle() as GLuint
    }

    fn shader_source(&self, shader: GLuint, sources: &[String]) {
        self.hit(EntryPoint::ShaderSource, (shader, sources));
    }

    fn compile_shader(&self, shader: GLuint) {
        self.hit(EntryPoint::CompileShader, shader);
    }

    fn create_program(&self) -> GLuint {
        if !self.hit(EntryPoint::CreateProgram, ()) {
            return 0;
        }
        self.handle() as GLuint
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        self.hit(EntryPoint::AttachShader, (program, shader));
    }

    fn link_program(&self, program: GLuint) {
        self.hit(EntryPoint::LinkProgram, program);
    }

    fn use_program(&self, program: GLuint) {
        self.hit(EntryPoint::UseProgram, program);
    }

    fn delete_program(&self, program: GLuint) {
        self.hit(EntryPoint::DeleteProgram, program);
    }

    /// Locations are the name's length, or `-1` for names starting with `gl_`.
    fn get_attrib_location(&self, program: GLuint, name: &str) -> GLint {
        if !self.hit(EntryPoint::GetAttribLocation, (program, name)) {
            return -1;
        }
        fake_location(name)
    }

    fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint {
        if !self.hit(EntryPoint::GetUniformLocation, (program, name)) {
            return -1;
        }
        fake_location(name)
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        self.hit(EntryPoint::EnableVertexAttribArray, index);
    }

    fn disable_vertex_attrib_array(&self, index: GLuint) {
        self.hit(EntryPoint::DisableVertexAttribArray, index);
    }

    fn vertex_attrib_pointer(&self, index: GLuint, size: GLint, ty: GLenum, normalized: bool, stride: GLsizei, offset: usize) {
        self.hit(EntryPoint::VertexAttribPointer, (index, size, ty, normalized, stride, offset));
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.hit(EntryPoint::DrawArrays, (mode, first, count));
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize) {
        self.hit(EntryPoint::DrawElements, (mode, count, ty, offset));
    }

    fn clear(&self, mask: GLbitfield) {
        self.hit(EntryPoint::Clear, mask);
    }

    fn flush(&self) {
        self.hit(EntryPoint::Flush, ());
    }

    fn finish(&self) {
        self.hit(EntryPoint::Finish, ());
    }
}

fn fake_location(name: &str) -> GLint {
    if name.starts_with("gl_") {
        -1
    } else {
        name.len() as GLint
    }
}
