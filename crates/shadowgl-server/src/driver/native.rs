//! Driver binding backed by the system EGL and GLES2 libraries.
//!
//! GL entry points are resolved through `eglGetProcAddress` first and then looked up directly in
//! the GLES library. Each lookup tries the primary name and then the `ARB`/`EXT` suffixed names;
//! an entry point that resolves under none of them stays unbound.

use std::ffi::{c_char, c_void, CString};
use std::path::Path;
use std::ptr;

use libloading::Library as DynLibrary;
use tracing::{debug, warn};

use shadowgl_types::egl::{EGLBoolean, EGLint, EGL_FALSE, EGL_NONE};
use shadowgl_types::gl::{
    GLbitfield, GLboolean, GLenum, GLfloat, GLint, GLintptr, GLsizei, GLsizeiptr, GLuint,
};
use shadowgl_types::{Config, Context, Display, NativeDisplay, NativeWindow, Surface};

use super::{candidate_symbols, Driver, EntryPoint, Library};
use crate::error::DriverLoadError;

type Handle = *mut c_void;
type GetProcAddress = unsafe extern "C" fn(*const c_char) -> *mut c_void;

macro_rules! dispatch_table {
    ($( $field:ident: $entry:ident = fn($($arg:ty),*) $(-> $ret:ty)?; )*) => {
        #[derive(Default)]
        struct DispatchTable {
            $( $field: Option<unsafe extern "C" fn($($arg),*) $(-> $ret)?>, )*
        }

        impl DispatchTable {
            fn resolve(resolver: &Resolver<'_>) -> Self {
                Self {
                    $( $field: resolver.resolve(EntryPoint::$entry), )*
                }
            }

            fn is_bound(&self, entry: EntryPoint) -> bool {
                match entry {
                    $( EntryPoint::$entry => self.$field.is_some(), )*
                }
            }
        }
    };
}

dispatch_table! {
    egl_get_display: EglGetDisplay = fn(Handle) -> Handle;
    egl_initialize: EglInitialize = fn(Handle, *mut EGLint, *mut EGLint) -> EGLBoolean;
    egl_terminate: EglTerminate = fn(Handle) -> EGLBoolean;
    egl_choose_config: EglChooseConfig = fn(Handle, *const EGLint, *mut Handle, EGLint, *mut EGLint) -> EGLBoolean;
    egl_create_context: EglCreateContext = fn(Handle, Handle, Handle, *const EGLint) -> Handle;
    egl_destroy_context: EglDestroyContext = fn(Handle, Handle) -> EGLBoolean;
    egl_create_window_surface: EglCreateWindowSurface = fn(Handle, Handle, usize, *const EGLint) -> Handle;
    egl_create_pbuffer_surface: EglCreatePbufferSurface = fn(Handle, Handle, *const EGLint) -> Handle;
    egl_destroy_surface: EglDestroySurface = fn(Handle, Handle) -> EGLBoolean;
    egl_make_current: EglMakeCurrent = fn(Handle, Handle, Handle, Handle) -> EGLBoolean;
    egl_release_thread: EglReleaseThread = fn() -> EGLBoolean;
    egl_swap_buffers: EglSwapBuffers = fn(Handle, Handle) -> EGLBoolean;
    egl_get_error: EglGetError = fn() -> EGLint;
    egl_get_proc_address: EglGetProcAddress = fn(*const c_char) -> *mut c_void;

    get_error: GetError = fn() -> GLenum;
    active_texture: ActiveTexture = fn(GLenum);
    attach_shader: AttachShader = fn(GLuint, GLuint);
    bind_buffer: BindBuffer = fn(GLenum, GLuint);
    bind_framebuffer: BindFramebuffer = fn(GLenum, GLuint);
    bind_renderbuffer: BindRenderbuffer = fn(GLenum, GLuint);
    bind_texture: BindTexture = fn(GLenum, GLuint);
    blend_color: BlendColor = fn(GLfloat, GLfloat, GLfloat, GLfloat);
    blend_equation: BlendEquation = fn(GLenum);
    blend_equation_separate: BlendEquationSeparate = fn(GLenum, GLenum);
    blend_func: BlendFunc = fn(GLenum, GLenum);
    blend_func_separate: BlendFuncSeparate = fn(GLenum, GLenum, GLenum, GLenum);
    buffer_data: BufferData = fn(GLenum, GLsizeiptr, *const c_void, GLenum);
    buffer_sub_data: BufferSubData = fn(GLenum, GLintptr, GLsizeiptr, *const c_void);
    check_framebuffer_status: CheckFramebufferStatus = fn(GLenum) -> GLenum;
    clear: Clear = fn(GLbitfield);
    clear_color: ClearColor = fn(GLfloat, GLfloat, GLfloat, GLfloat);
    clear_depthf: ClearDepthf = fn(GLfloat);
    clear_stencil: ClearStencil = fn(GLint);
    color_mask: ColorMask = fn(GLboolean, GLboolean, GLboolean, GLboolean);
    compile_shader: CompileShader = fn(GLuint);
    create_program: CreateProgram = fn() -> GLuint;
    create_shader: CreateShader = fn(GLenum) -> GLuint;
    cull_face: CullFace = fn(GLenum);
    delete_buffers: DeleteBuffers = fn(GLsizei, *const GLuint);
    delete_framebuffers: DeleteFramebuffers = fn(GLsizei, *const GLuint);
    delete_program: DeleteProgram = fn(GLuint);
    delete_renderbuffers: DeleteRenderbuffers = fn(GLsizei, *const GLuint);
    delete_textures: DeleteTextures = fn(GLsizei, *const GLuint);
    depth_func: DepthFunc = fn(GLenum);
    depth_mask: DepthMask = fn(GLboolean);
    depth_rangef: DepthRangef = fn(GLfloat, GLfloat);
    disable: Disable = fn(GLenum);
    disable_vertex_attrib_array: DisableVertexAttribArray = fn(GLuint);
    draw_arrays: DrawArrays = fn(GLenum, GLint, GLsizei);
    draw_elements: DrawElements = fn(GLenum, GLsizei, GLenum, *const c_void);
    enable: Enable = fn(GLenum);
    enable_vertex_attrib_array: EnableVertexAttribArray = fn(GLuint);
    finish: Finish = fn();
    flush: Flush = fn();
    front_face: FrontFace = fn(GLenum);
    gen_buffers: GenBuffers = fn(GLsizei, *mut GLuint);
    gen_framebuffers: GenFramebuffers = fn(GLsizei, *mut GLuint);
    gen_renderbuffers: GenRenderbuffers = fn(GLsizei, *mut GLuint);
    gen_textures: GenTextures = fn(GLsizei, *mut GLuint);
    generate_mipmap: GenerateMipmap = fn(GLenum);
    get_attrib_location: GetAttribLocation = fn(GLuint, *const c_char) -> GLint;
    get_integerv: GetIntegerv = fn(GLenum, *mut GLint);
    get_uniform_location: GetUniformLocation = fn(GLuint, *const c_char) -> GLint;
    hint: Hint = fn(GLenum, GLenum);
    is_enabled: IsEnabled = fn(GLenum) -> GLboolean;
    line_width: LineWidth = fn(GLfloat);
    link_program: LinkProgram = fn(GLuint);
    pixel_storei: PixelStorei = fn(GLenum, GLint);
    polygon_offset: PolygonOffset = fn(GLfloat, GLfloat);
    sample_coverage: SampleCoverage = fn(GLfloat, GLboolean);
    scissor: Scissor = fn(GLint, GLint, GLsizei, GLsizei);
    shader_source: ShaderSource = fn(GLuint, GLsizei, *const *const c_char, *const GLint);
    stencil_func_separate: StencilFuncSeparate = fn(GLenum, GLenum, GLint, GLuint);
    stencil_mask_separate: StencilMaskSeparate = fn(GLenum, GLuint);
    stencil_op_separate: StencilOpSeparate = fn(GLenum, GLenum, GLenum, GLenum);
    tex_image_2d: TexImage2D = fn(GLenum, GLint, GLint, GLsizei, GLsizei, GLint, GLenum, GLenum, *const c_void);
    tex_parameteri: TexParameteri = fn(GLenum, GLenum, GLint);
    use_program: UseProgram = fn(GLuint);
    vertex_attrib_pointer: VertexAttribPointer = fn(GLuint, GLint, GLenum, GLboolean, GLsizei, *const c_void);
    viewport: Viewport = fn(GLint, GLint, GLsizei, GLsizei);
}

/// Symbol lookup over the opened libraries.
struct Resolver<'a> {
    egl: &'a DynLibrary,
    gles: Option<&'a DynLibrary>,
    get_proc_address: Option<GetProcAddress>,
}

impl Resolver<'_> {
    /// `F` must be the `unsafe extern "C" fn` type matching `entry`'s C signature.
    fn resolve<F: Copy>(&self, entry: EntryPoint) -> Option<F> {
        debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<*mut c_void>());
        for name in candidate_symbols(entry) {
            let Ok(cname) = CString::new(name) else {
                continue;
            };

            if entry.library() == Library::Gles {
                if let Some(gpa) = self.get_proc_address {
                    // SAFETY: eglGetProcAddress takes a NUL-terminated name and returns either null
                    // or a function with the named entry point's signature.
                    let p = unsafe { gpa(cname.as_ptr()) };
                    if !p.is_null() {
                        return Some(unsafe { std::mem::transmute_copy::<*mut c_void, F>(&p) });
                    }
                }
            }

            let lib = match entry.library() {
                Library::Egl => Some(self.egl),
                Library::Gles => self.gles,
            };
            if let Some(lib) = lib {
                // SAFETY: the symbol is only ever called through `F`, the signature the C headers
                // declare for it.
                if let Ok(sym) = unsafe { lib.get::<F>(cname.as_bytes_with_nul()) } {
                    return Some(*sym);
                }
            }
        }
        None
    }
}

pub struct NativeDriver {
    table: DispatchTable,
    // Keep the libraries loaded for as long as the table's pointers may be called.
    _egl: DynLibrary,
    _gles: Option<DynLibrary>,
}

impl NativeDriver {
    /// Opens both libraries and resolves every entry point. Only a missing EGL library is an
    /// error; without the GLES library, GL entry points can still come from `eglGetProcAddress`.
    pub fn load(egl_path: &Path, gles_path: &Path) -> Result<Self, DriverLoadError> {
        // SAFETY: loading a system graphics library runs its initialisers, which is the point.
        let egl = unsafe { DynLibrary::new(egl_path) }.map_err(|source| DriverLoadError {
            path: egl_path.to_path_buf(),
            source,
        })?;
        let gles = match unsafe { DynLibrary::new(gles_path) } {
            Ok(lib) => Some(lib),
            Err(err) => {
                warn!(path = %gles_path.display(), error = %err, "GLES library unavailable");
                None
            }
        };

        let table = {
            let mut resolver = Resolver {
                egl: &egl,
                gles: gles.as_ref(),
                get_proc_address: None,
            };
            resolver.get_proc_address = resolver.resolve(EntryPoint::EglGetProcAddress);
            DispatchTable::resolve(&resolver)
        };

        let unbound: Vec<&str> = EntryPoint::ALL
            .iter()
            .filter(|e| !table.is_bound(**e))
            .map(|e| e.symbol())
            .collect();
        if unbound.is_empty() {
            debug!("all driver entry points resolved");
        } else {
            warn!(count = unbound.len(), symbols = ?unbound, "driver entry points left unbound");
        }

        Ok(Self {
            table,
            _egl: egl,
            _gles: gles,
        })
    }
}

fn to_handle(raw: u64) -> Handle {
    raw as usize as Handle
}

fn from_handle(h: Handle) -> u64 {
    h as usize as u64
}

fn gl_bool(v: bool) -> GLboolean {
    GLboolean::from(v)
}

fn egl_ok(v: EGLBoolean) -> bool {
    v != EGL_FALSE
}

/// Copies `attribs` and makes sure the list ends with `EGL_NONE`.
fn terminated(attribs: &[EGLint]) -> Vec<EGLint> {
    let mut list = attribs.to_vec();
    if list.len() % 2 == 1 && list.last() == Some(&EGL_NONE) {
        return list;
    }
    list.push(EGL_NONE);
    list
}

fn blob_ptr(data: Option<&[u8]>) -> *const c_void {
    data.map_or(ptr::null(), |d| d.as_ptr().cast())
}

/// Calls the resolved function, or evaluates to `$default` if the entry point is unbound.
macro_rules! forward {
    ($self:ident . $field:ident ( $($arg:expr),* $(,)? ) or $default:expr) => {
        match $self.table.$field {
            // SAFETY: the pointer was resolved for exactly this signature and the arguments
            // outlive the call.
            Some(f) => unsafe { f($($arg),*) },
            None => $default,
        }
    };
}

impl Driver for NativeDriver {
    fn is_bound(&self, entry: EntryPoint) -> bool {
        self.table.is_bound(entry)
    }

    fn get_display(&self, native: NativeDisplay) -> Display {
        Display(from_handle(forward!(self.egl_get_display(to_handle(native.0)) or ptr::null_mut())))
    }

    fn initialize(&self, display: Display) -> Option<(EGLint, EGLint)> {
        let (mut major, mut minor) = (0, 0);
        let ok = forward!(self.egl_initialize(to_handle(display.0), &mut major, &mut minor) or EGL_FALSE);
        egl_ok(ok).then_some((major, minor))
    }

    fn terminate(&self, display: Display) -> bool {
        egl_ok(forward!(self.egl_terminate(to_handle(display.0)) or EGL_FALSE))
    }

    fn choose_config(&self, display: Display, attribs: &[EGLint], max: EGLint) -> Option<Vec<Config>> {
        let attribs = terminated(attribs);
        let mut configs: Vec<Handle> = vec![ptr::null_mut(); max.max(0) as usize];
        let mut count: EGLint = 0;
        let ok = forward!(self.egl_choose_config(
            to_handle(display.0),
            attribs.as_ptr(),
            configs.as_mut_ptr(),
            configs.len() as EGLint,
            &mut count,
        ) or EGL_FALSE);
        if !egl_ok(ok) {
            return None;
        }
        configs.truncate(count.clamp(0, max.max(0)) as usize);
        Some(configs.into_iter().map(|c| Config(from_handle(c))).collect())
    }

    fn create_context(&self, display: Display, config: Config, share: Context, attribs: &[EGLint]) -> Context {
        let attribs = terminated(attribs);
        Context(from_handle(forward!(self.egl_create_context(
            to_handle(display.0),
            to_handle(config.0),
            to_handle(share.0),
            attribs.as_ptr(),
        ) or ptr::null_mut())))
    }

    fn destroy_context(&self, display: Display, context: Context) -> bool {
        egl_ok(forward!(self.egl_destroy_context(to_handle(display.0), to_handle(context.0)) or EGL_FALSE))
    }

    fn create_window_surface(&self, display: Display, config: Config, window: NativeWindow, attribs: &[EGLint]) -> Surface {
        let attribs = terminated(attribs);
        Surface(from_handle(forward!(self.egl_create_window_surface(
            to_handle(display.0),
            to_handle(config.0),
            window.0 as usize,
            attribs.as_ptr(),
        ) or ptr::null_mut())))
    }

    fn create_pbuffer_surface(&self, display: Display, config: Config, attribs: &[EGLint]) -> Surface {
        let attribs = terminated(attribs);
        Surface(from_handle(forward!(self.egl_create_pbuffer_surface(
            to_handle(display.0),
            to_handle(config.0),
            attribs.as_ptr(),
        ) or ptr::null_mut())))
    }

    fn destroy_surface(&self, display: Display, surface: Surface) -> bool {
        egl_ok(forward!(self.egl_destroy_surface(to_handle(display.0), to_handle(surface.0)) or EGL_FALSE))
    }

    fn make_current(&self, display: Display, draw: Surface, read: Surface, context: Context) -> bool {
        egl_ok(forward!(self.egl_make_current(
            to_handle(display.0),
            to_handle(draw.0),
            to_handle(read.0),
            to_handle(context.0),
        ) or EGL_FALSE))
    }

    fn release_thread(&self) -> bool {
        egl_ok(forward!(self.egl_release_thread() or EGL_FALSE))
    }

    fn swap_buffers(&self, display: Display, surface: Surface) -> bool {
        egl_ok(forward!(self.egl_swap_buffers(to_handle(display.0), to_handle(surface.0)) or EGL_FALSE))
    }

    fn egl_get_error(&self) -> EGLint {
        forward!(self.egl_get_error() or shadowgl_types::egl::EGL_NOT_INITIALIZED)
    }

    fn get_error(&self) -> GLenum {
        forward!(self.get_error() or shadowgl_types::gl::GL_INVALID_OPERATION)
    }

    fn active_texture(&self, texture: GLenum) {
        forward!(self.active_texture(texture) or ())
    }

    fn blend_color(&self, r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat) {
        forward!(self.blend_color(r, g, b, a) or ())
    }

    fn blend_equation(&self, mode: GLenum) {
        forward!(self.blend_equation(mode) or ())
    }

    fn blend_equation_separate(&self, mode_rgb: GLenum, mode_alpha: GLenum) {
        forward!(self.blend_equation_separate(mode_rgb, mode_alpha) or ())
    }

    fn blend_func(&self, sfactor: GLenum, dfactor: GLenum) {
        forward!(self.blend_func(sfactor, dfactor) or ())
    }

    fn blend_func_separate(&self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum) {
        forward!(self.blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha) or ())
    }

    fn clear_color(&self, r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat) {
        forward!(self.clear_color(r, g, b, a) or ())
    }

    fn clear_depthf(&self, depth: GLfloat) {
        forward!(self.clear_depthf(depth) or ())
    }

    fn clear_stencil(&self, s: GLint) {
        forward!(self.clear_stencil(s) or ())
    }

    fn color_mask(&self, r: bool, g: bool, b: bool, a: bool) {
        forward!(self.color_mask(gl_bool(r), gl_bool(g), gl_bool(b), gl_bool(a)) or ())
    }

    fn cull_face(&self, mode: GLenum) {
        forward!(self.cull_face(mode) or ())
    }

    fn depth_func(&self, func: GLenum) {
        forward!(self.depth_func(func) or ())
    }

    fn depth_mask(&self, flag: bool) {
        forward!(self.depth_mask(gl_bool(flag)) or ())
    }

    fn depth_rangef(&self, near: GLfloat, far: GLfloat) {
        forward!(self.depth_rangef(near, far) or ())
    }

    fn enable(&self, cap: GLenum) {
        forward!(self.enable(cap) or ())
    }

    fn disable(&self, cap: GLenum) {
        forward!(self.disable(cap) or ())
    }

    fn is_enabled(&self, cap: GLenum) -> bool {
        forward!(self.is_enabled(cap) or 0) != 0
    }

    fn front_face(&self, mode: GLenum) {
        forward!(self.front_face(mode) or ())
    }

    fn hint(&self, target: GLenum, mode: GLenum) {
        forward!(self.hint(target, mode) or ())
    }

    fn line_width(&self, width: GLfloat) {
        forward!(self.line_width(width) or ())
    }

    fn pixel_storei(&self, pname: GLenum, param: GLint) {
        forward!(self.pixel_storei(pname, param) or ())
    }

    fn polygon_offset(&self, factor: GLfloat, units: GLfloat) {
        forward!(self.polygon_offset(factor, units) or ())
    }

    fn sample_coverage(&self, value: GLfloat, invert: bool) {
        forward!(self.sample_coverage(value, gl_bool(invert)) or ())
    }

    fn scissor(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        forward!(self.scissor(x, y, width, height) or ())
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        forward!(self.viewport(x, y, width, height) or ())
    }

    fn stencil_func_separate(&self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint) {
        forward!(self.stencil_func_separate(face, func, reference, mask) or ())
    }

    fn stencil_mask_separate(&self, face: GLenum, mask: GLuint) {
        forward!(self.stencil_mask_separate(face, mask) or ())
    }

    fn stencil_op_separate(&self, face: GLenum, fail: GLenum, zfail: GLenum, zpass: GLenum) {
        forward!(self.stencil_op_separate(face, fail, zfail, zpass) or ())
    }

    fn get_integerv(&self, pname: GLenum, params: &mut [GLint]) {
        // Callers size `params` for `pname`; see `engine::query`.
        forward!(self.get_integerv(pname, params.as_mut_ptr()) or ())
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        forward!(self.bind_buffer(target, buffer) or ())
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        forward!(self.bind_texture(target, texture) or ())
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint) {
        forward!(self.bind_framebuffer(target, framebuffer) or ())
    }

    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: GLuint) {
        forward!(self.bind_renderbuffer(target, renderbuffer) or ())
    }

    fn gen_buffers(&self, names: &mut [GLuint]) {
        forward!(self.gen_buffers(names.len() as GLsizei, names.as_mut_ptr()) or ())
    }

    fn gen_textures(&self, names: &mut [GLuint]) {
        forward!(self.gen_textures(names.len() as GLsizei, names.as_mut_ptr()) or ())
    }

    fn gen_framebuffers(&self, names: &mut [GLuint]) {
        forward!(self.gen_framebuffers(names.len() as GLsizei, names.as_mut_ptr()) or ())
    }

    fn gen_renderbuffers(&self, names: &mut [GLuint]) {
        forward!(self.gen_renderbuffers(names.len() as GLsizei, names.as_mut_ptr()) or ())
    }

    fn delete_buffers(&self, names: &[GLuint]) {
        forward!(self.delete_buffers(names.len() as GLsizei, names.as_ptr()) or ())
    }

    fn delete_textures(&self, names: &[GLuint]) {
        forward!(self.delete_textures(names.len() as GLsizei, names.as_ptr()) or ())
    }

    fn delete_framebuffers(&self, names: &[GLuint]) {
        forward!(self.delete_framebuffers(names.len() as GLsizei, names.as_ptr()) or ())
    }

    fn delete_renderbuffers(&self, names: &[GLuint]) {
        forward!(self.delete_renderbuffers(names.len() as GLsizei, names.as_ptr()) or ())
    }

    fn buffer_data(&self, target: GLenum, size: GLsizeiptr, data: Option<&[u8]>, usage: GLenum) {
        let size = data.map_or(size, |d| size.min(d.len() as GLsizeiptr));
        forward!(self.buffer_data(target, size, blob_ptr(data), usage) or ())
    }

    fn buffer_sub_data(&self, target: GLenum, offset: GLintptr, data: &[u8]) {
        forward!(self.buffer_sub_data(target, offset, data.len() as GLsizeiptr, data.as_ptr().cast()) or ())
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
        forward!(self.tex_image_2d(
            target,
            level,
            internal_format,
            width,
            height,
            border,
            format,
            ty,
            blob_ptr(pixels),
        ) or ())
    }

    fn tex_parameteri(&self, target: GLenum, pname: GLenum, param: GLint) {
        forward!(self.tex_parameteri(target, pname, param) or ())
    }

    fn generate_mipmap(&self, target: GLenum) {
        forward!(self.generate_mipmap(target) or ())
    }

    fn check_framebuffer_status(&self, target: GLenum) -> GLenum {
        forward!(self.check_framebuffer_status(target) or 0)
    }

    fn create_shader(&self, kind: GLenum) -> GLuint {
        forward!(self.create_shader(kind) or 0)
    }

    fn shader_source(&self, shader: GLuint, sources: &[String]) {
        let ptrs: Vec<*const c_char> = sources.iter().map(|s| s.as_ptr().cast()).collect();
        let lens: Vec<GLint> = sources.iter().map(|s| s.len() as GLint).collect();
        forward!(self.shader_source(shader, ptrs.len() as GLsizei, ptrs.as_ptr(), lens.as_ptr()) or ())
    }

    fn compile_shader(&self, shader: GLuint) {
        forward!(self.compile_shader(shader) or ())
    }

    fn create_program(&self) -> GLuint {
        forward!(self.create_program() or 0)
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        forward!(self.attach_shader(program, shader) or ())
    }

    fn link_program(&self, program: GLuint) {
        forward!(self.link_program(program) or ())
    }

    fn use_program(&self, program: GLuint) {
        forward!(self.use_program(program) or ())
    }

    fn delete_program(&self, program: GLuint) {
        forward!(self.delete_program(program) or ())
    }

    fn get_attrib_location(&self, program: GLuint, name: &str) -> GLint {
        let Ok(name) = CString::new(name) else {
            return -1;
        };
        forward!(self.get_attrib_location(program, name.as_ptr()) or -1)
    }

    fn get_uniform_location(&self, program: GLuint, name: &str) -> GLint {
        let Ok(name) = CString::new(name) else {
            return -1;
        };
        forward!(self.get_uniform_location(program, name.as_ptr()) or -1)
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        forward!(self.enable_vertex_attrib_array(index) or ())
    }

    fn disable_vertex_attrib_array(&self, index: GLuint) {
        forward!(self.disable_vertex_attrib_array(index) or ())
    }

    fn vertex_attrib_pointer(&self, index: GLuint, size: GLint, ty: GLenum, normalized: bool, stride: GLsizei, offset: usize) {
        forward!(self.vertex_attrib_pointer(index, size, ty, gl_bool(normalized), stride, offset as *const c_void) or ())
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        forward!(self.draw_arrays(mode, first, count) or ())
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize) {
        forward!(self.draw_elements(mode, count, ty, offset as *const c_void) or ())
    }

    fn clear(&self, mask: GLbitfield) {
        forward!(self.clear(mask) or ())
    }

    fn flush(&self) {
        forward!(self.flush() or ())
    }

    fn finish(&self) {
        forward!(self.finish() or ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attrib_lists_get_a_terminator() {
        assert_eq!(terminated(&[]), vec![EGL_NONE]);
        assert_eq!(terminated(&[0x3057, 64]), vec![0x3057, 64, EGL_NONE]);
        assert_eq!(terminated(&[0x3057, 64, EGL_NONE]), vec![0x3057, 64, EGL_NONE]);
    }

    #[test]
    fn missing_egl_library_is_an_error() {
        let err = NativeDriver::load(
            Path::new("/nonexistent/libEGL-shadowgl-test.so"),
            Path::new("/nonexistent/libGLESv2-shadowgl-test.so"),
        )
        .err()
        .expect("load must fail");
        assert!(err.path.ends_with("libEGL-shadowgl-test.so"));
    }

    #[test]
    fn empty_table_binds_nothing() {
        let table = DispatchTable::default();
        assert!(EntryPoint::ALL.iter().all(|e| !table.is_bound(*e)));
    }
}
