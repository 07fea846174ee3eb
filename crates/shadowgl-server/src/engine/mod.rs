//! The validation and caching engine.
//!
//! Every GL command goes through the same gate before anything else happens:
//!
//! 1. the driver entry point must be bound, otherwise the current context (if any) records
//!    `GL_INVALID_OPERATION` and the call is dropped;
//! 2. the worker must have a current context, otherwise the call is dropped silently.
//!
//! Past the gate, setters compare against the shadow first (identical values are elided without
//! touching the error state), then check argument domains, then update the shadow and call the
//! driver. Calls whose outcome depends on driver-side object state set `need_get_error` so the
//! next error query is answered by the driver.

mod domains;
mod egl;
mod objects;
mod programs;
mod query;
mod state;
mod vertex;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::trace;

use shadowgl_ipc::{Command, ReplyValue};
use shadowgl_types::gl::{
    GLenum, GLint, GL_FRONT_AND_BACK, GL_INVALID_ENUM, GL_INVALID_OPERATION, GL_INVALID_VALUE,
};

use crate::driver::{Driver, EntryPoint};
use crate::names::NameTranslation;
use crate::registry::{ContextRegistry, Current};
use crate::shadow::{Limit, ShadowState};
use crate::stats::EngineStats;

use domains::BitEq;

/// One worker's view of the server: shared driver, registry and name table, plus the worker's own
/// current context.
///
/// Dropping an engine releases its current context back to the registry.
pub struct Engine {
    driver: Arc<dyn Driver>,
    registry: Arc<ContextRegistry>,
    names: Arc<NameTranslation>,
    stats: Arc<EngineStats>,
    current: Option<Current>,
}

/// A call that made it through the gate: the driver plus the current context's shadow.
pub(crate) struct Ctx<'a> {
    driver: &'a dyn Driver,
    names: &'a NameTranslation,
    stats: &'a EngineStats,
    state: &'a mut ShadowState,
}

impl Engine {
    pub fn new(
        driver: Arc<dyn Driver>,
        registry: Arc<ContextRegistry>,
        names: Arc<NameTranslation>,
        stats: Arc<EngineStats>,
    ) -> Self {
        Self {
            driver,
            registry,
            names,
            stats,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&Current> {
        self.current.as_ref()
    }

    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// The gate. `None` means the call must be dropped.
    fn enter(&mut self, entry: EntryPoint) -> Option<Ctx<'_>> {
        let bound = self.driver.is_bound(entry);
        let current = self.current.as_mut()?;
        let state = current.shadow_mut();
        if !bound {
            trace!(?entry, "entry point unbound");
            if state.set_error(GL_INVALID_OPERATION) {
                self.stats.inc_errors_recorded();
            }
            return None;
        }
        Some(Ctx {
            driver: &*self.driver,
            names: &self.names,
            stats: &self.stats,
            state,
        })
    }

    /// Runs `f` if the call passes the gate, otherwise returns `R::default()`.
    fn with<R: Default>(&mut self, entry: EntryPoint, f: impl FnOnce(&mut Ctx<'_>) -> R) -> R {
        match self.enter(entry) {
            Some(mut cx) => f(&mut cx),
            None => R::default(),
        }
    }

    /// Executes one decoded command. Returns the reply for commands that have one.
    ///
    /// The command is consumed: argument buffers it owns are dropped once the handler returns.
    pub fn execute(&mut self, cmd: Command) -> Option<ReplyValue> {
        use EntryPoint as E;

        let reply = match cmd {
            Command::Nop {} | Command::Shutdown {} => return None,

            Command::GetDisplay { native } => ReplyValue::Display(self.get_display(native)),
            Command::Initialize { display } => self.initialize(display),
            Command::Terminate { display } => ReplyValue::Bool(self.terminate(display)),
            Command::ChooseConfig { display, attribs, max } => {
                ReplyValue::Configs(self.choose_config(display, &attribs, max))
            }
            Command::CreateContext { display, config, share, attribs } => {
                ReplyValue::Context(self.create_context(display, config, share, &attribs))
            }
            Command::DestroyContext { display, context } => {
                ReplyValue::Bool(self.destroy_context(display, context))
            }
            Command::CreateWindowSurface { display, config, window, attribs } => {
                ReplyValue::Surface(self.create_window_surface(display, config, window, &attribs))
            }
            Command::CreatePbufferSurface { display, config, attribs } => {
                ReplyValue::Surface(self.create_pbuffer_surface(display, config, &attribs))
            }
            Command::DestroySurface { display, surface } => {
                ReplyValue::Bool(self.destroy_surface(display, surface))
            }
            Command::MakeCurrent { display, draw, read, context } => {
                ReplyValue::Bool(self.make_current(display, draw, read, context))
            }
            Command::ReleaseThread {} => ReplyValue::Bool(self.release_thread()),
            Command::SwapBuffers { display, surface } => {
                ReplyValue::Bool(self.swap_buffers(display, surface))
            }
            Command::EglGetError {} => ReplyValue::Int(self.egl_get_error()),

            Command::GetError {} => ReplyValue::Enum(self.get_error()),
            Command::ActiveTexture { texture } => {
                self.with(E::ActiveTexture, |cx| cx.active_texture(texture));
                return None;
            }
            Command::BlendColor { rgba } => {
                self.with(E::BlendColor, |cx| cx.blend_color(rgba));
                return None;
            }
            Command::BlendEquation { mode } => {
                self.with(E::BlendEquation, |cx| cx.blend_equation(mode));
                return None;
            }
            Command::BlendEquationSeparate { mode_rgb, mode_alpha } => {
                self.with(E::BlendEquationSeparate, |cx| {
                    cx.blend_equation_separate(mode_rgb, mode_alpha)
                });
                return None;
            }
            Command::BlendFunc { sfactor, dfactor } => {
                self.with(E::BlendFunc, |cx| cx.blend_func(sfactor, dfactor));
                return None;
            }
            Command::BlendFuncSeparate { src_rgb, dst_rgb, src_alpha, dst_alpha } => {
                self.with(E::BlendFuncSeparate, |cx| {
                    cx.blend_func_separate([src_rgb, dst_rgb, src_alpha, dst_alpha])
                });
                return None;
            }
            Command::ClearColor { rgba } => {
                self.with(E::ClearColor, |cx| cx.clear_color(rgba));
                return None;
            }
            Command::ClearDepthf { depth } => {
                self.with(E::ClearDepthf, |cx| cx.clear_depthf(depth));
                return None;
            }
            Command::ClearStencil { s } => {
                self.with(E::ClearStencil, |cx| cx.clear_stencil(s));
                return None;
            }
            Command::ColorMask { mask } => {
                self.with(E::ColorMask, |cx| cx.color_mask(mask));
                return None;
            }
            Command::CullFace { mode } => {
                self.with(E::CullFace, |cx| cx.cull_face(mode));
                return None;
            }
            Command::DepthFunc { func } => {
                self.with(E::DepthFunc, |cx| cx.depth_func(func));
                return None;
            }
            Command::DepthMask { flag } => {
                self.with(E::DepthMask, |cx| cx.depth_mask(flag));
                return None;
            }
            Command::DepthRangef { near, far } => {
                self.with(E::DepthRangef, |cx| cx.depth_rangef(near, far));
                return None;
            }
            Command::Enable { cap } => {
                self.with(E::Enable, |cx| cx.set_capability(cap, true));
                return None;
            }
            Command::Disable { cap } => {
                self.with(E::Disable, |cx| cx.set_capability(cap, false));
                return None;
            }
            Command::FrontFace { mode } => {
                self.with(E::FrontFace, |cx| cx.front_face(mode));
                return None;
            }
            Command::Hint { target, mode } => {
                self.with(E::Hint, |cx| cx.hint(target, mode));
                return None;
            }
            Command::LineWidth { width } => {
                self.with(E::LineWidth, |cx| cx.line_width(width));
                return None;
            }
            Command::PixelStorei { pname, param } => {
                self.with(E::PixelStorei, |cx| cx.pixel_storei(pname, param));
                return None;
            }
            Command::PolygonOffset { factor, units } => {
                self.with(E::PolygonOffset, |cx| cx.polygon_offset(factor, units));
                return None;
            }
            Command::SampleCoverage { value, invert } => {
                self.with(E::SampleCoverage, |cx| cx.sample_coverage(value, invert));
                return None;
            }
            Command::Scissor { x, y, width, height } => {
                self.with(E::Scissor, |cx| cx.scissor([x, y, width, height]));
                return None;
            }
            Command::Viewport { x, y, width, height } => {
                self.with(E::Viewport, |cx| cx.viewport([x, y, width, height]));
                return None;
            }
            Command::StencilFunc { func, reference, mask } => {
                self.with(E::StencilFuncSeparate, |cx| {
                    cx.stencil_func(GL_FRONT_AND_BACK, func, reference, mask)
                });
                return None;
            }
            Command::StencilFuncSeparate { face, func, reference, mask } => {
                self.with(E::StencilFuncSeparate, |cx| cx.stencil_func(face, func, reference, mask));
                return None;
            }
            Command::StencilMask { mask } => {
                self.with(E::StencilMaskSeparate, |cx| {
                    cx.stencil_mask(GL_FRONT_AND_BACK, mask)
                });
                return None;
            }
            Command::StencilMaskSeparate { face, mask } => {
                self.with(E::StencilMaskSeparate, |cx| cx.stencil_mask(face, mask));
                return None;
            }
            Command::StencilOp { fail, zfail, zpass } => {
                self.with(E::StencilOpSeparate, |cx| {
                    cx.stencil_op(GL_FRONT_AND_BACK, [fail, zfail, zpass])
                });
                return None;
            }
            Command::StencilOpSeparate { face, fail, zfail, zpass } => {
                self.with(E::StencilOpSeparate, |cx| cx.stencil_op(face, [fail, zfail, zpass]));
                return None;
            }

            Command::BindBuffer { target, buffer } => {
                self.with(E::BindBuffer, |cx| cx.bind_buffer(target, buffer));
                return None;
            }
            Command::BindTexture { target, texture } => {
                self.with(E::BindTexture, |cx| cx.bind_texture(target, texture));
                return None;
            }
            Command::BindFramebuffer { target, framebuffer } => {
                self.with(E::BindFramebuffer, |cx| cx.bind_framebuffer(target, framebuffer));
                return None;
            }
            Command::BindRenderbuffer { target, renderbuffer } => {
                self.with(E::BindRenderbuffer, |cx| cx.bind_renderbuffer(target, renderbuffer));
                return None;
            }
            Command::GenBuffers { names } => {
                self.with(E::GenBuffers, |cx| cx.gen_names(objects::BUFFERS, &names));
                return None;
            }
            Command::GenTextures { names } => {
                self.with(E::GenTextures, |cx| cx.gen_names(objects::TEXTURES, &names));
                return None;
            }
            Command::GenFramebuffers { names } => {
                self.with(E::GenFramebuffers, |cx| cx.gen_names(objects::FRAMEBUFFERS, &names));
                return None;
            }
            Command::GenRenderbuffers { names } => {
                self.with(E::GenRenderbuffers, |cx| cx.gen_names(objects::RENDERBUFFERS, &names));
                return None;
            }
            Command::DeleteBuffers { names } => {
                self.with(E::DeleteBuffers, |cx| cx.delete_names(objects::BUFFERS, &names));
                return None;
            }
            Command::DeleteTextures { names } => {
                self.with(E::DeleteTextures, |cx| cx.delete_names(objects::TEXTURES, &names));
                return None;
            }
            Command::DeleteFramebuffers { names } => {
                self.with(E::DeleteFramebuffers, |cx| {
                    cx.delete_names(objects::FRAMEBUFFERS, &names)
                });
                return None;
            }
            Command::DeleteRenderbuffers { names } => {
                self.with(E::DeleteRenderbuffers, |cx| {
                    cx.delete_names(objects::RENDERBUFFERS, &names)
                });
                return None;
            }
            Command::BufferData { target, data, size, usage } => {
                self.with(E::BufferData, |cx| cx.buffer_data(target, data.as_deref(), size, usage));
                return None;
            }
            Command::BufferSubData { target, offset, data } => {
                self.with(E::BufferSubData, |cx| cx.buffer_sub_data(target, offset, &data));
                return None;
            }
            Command::TexImage2D {
                target,
                level,
                internal_format,
                width,
                height,
                border,
                format,
                ty,
                pixels,
            } => {
                self.with(E::TexImage2D, |cx| {
                    cx.tex_image_2d(
                        target,
                        level,
                        internal_format,
                        [width, height],
                        border,
                        format,
                        ty,
                        pixels.as_deref(),
                    )
                });
                return None;
            }
            Command::TexParameteri { target, pname, param } => {
                self.with(E::TexParameteri, |cx| cx.tex_parameteri(target, pname, param));
                return None;
            }
            Command::GenerateMipmap { target } => {
                self.with(E::GenerateMipmap, |cx| cx.generate_mipmap(target));
                return None;
            }
            Command::CheckFramebufferStatus { target } => ReplyValue::Enum(
                self.with(E::CheckFramebufferStatus, |cx| cx.check_framebuffer_status(target)),
            ),

            Command::CreateShader { kind } => {
                ReplyValue::Uint(self.with(E::CreateShader, |cx| cx.create_shader(kind)))
            }
            Command::ShaderSource { shader, sources } => {
                self.with(E::ShaderSource, |cx| cx.shader_source(shader, &sources));
                return None;
            }
            Command::CompileShader { shader } => {
                self.with(E::CompileShader, |cx| cx.compile_shader(shader));
                return None;
            }
            Command::CreateProgram {} => {
                ReplyValue::Uint(self.with(E::CreateProgram, |cx| cx.create_program()))
            }
            Command::AttachShader { program, shader } => {
                self.with(E::AttachShader, |cx| cx.attach_shader(program, shader));
                return None;
            }
            Command::LinkProgram { program } => {
                self.with(E::LinkProgram, |cx| cx.link_program(program));
                return None;
            }
            Command::UseProgram { program } => {
                self.with(E::UseProgram, |cx| cx.use_program(program));
                return None;
            }
            Command::DeleteProgram { program } => {
                self.with(E::DeleteProgram, |cx| cx.delete_program(program));
                return None;
            }
            Command::GetAttribLocation { program, name } => ReplyValue::Int(
                self.enter(E::GetAttribLocation)
                    .map_or(-1, |mut cx| cx.attrib_location(program, &name)),
            ),
            Command::GetUniformLocation { program, name } => ReplyValue::Int(
                self.enter(E::GetUniformLocation)
                    .map_or(-1, |mut cx| cx.uniform_location(program, &name)),
            ),

            Command::EnableVertexAttribArray { index } => {
                self.with(E::EnableVertexAttribArray, |cx| cx.set_attrib_array(index, true));
                return None;
            }
            Command::DisableVertexAttribArray { index } => {
                self.with(E::DisableVertexAttribArray, |cx| cx.set_attrib_array(index, false));
                return None;
            }
            Command::VertexAttribPointer { index, size, ty, normalized, stride, offset } => {
                self.with(E::VertexAttribPointer, |cx| {
                    cx.vertex_attrib_pointer(index, size, ty, normalized, stride, offset)
                });
                return None;
            }
            Command::DrawArrays { mode, first, count } => {
                self.with(E::DrawArrays, |cx| cx.draw_arrays(mode, first, count));
                return None;
            }
            Command::DrawElements { mode, count, ty, offset } => {
                self.with(E::DrawElements, |cx| cx.draw_elements(mode, count, ty, offset));
                return None;
            }
            Command::Clear { mask } => {
                self.with(E::Clear, |cx| cx.clear(mask));
                return None;
            }
            Command::Flush {} => {
                self.with(E::Flush, |cx| cx.forward_unverified(|d| d.flush()));
                return None;
            }
            Command::Finish {} => {
                self.with(E::Finish, |cx| cx.forward_unverified(|d| d.finish()));
                return None;
            }

            Command::GetIntegerv { pname } => {
                ReplyValue::Ints(self.with(E::GetIntegerv, |cx| cx.get_integerv(pname)))
            }
            Command::IsEnabled { cap } => {
                ReplyValue::Bool(self.with(E::IsEnabled, |cx| cx.is_enabled(cap)))
            }
        };
        Some(reply)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.release_current();
    }
}

impl<'a> Ctx<'a> {
    /// Records `error` on the current context unless one is already pending.
    fn error(&mut self, error: GLenum) {
        if self.state.set_error(error) {
            self.stats.inc_errors_recorded();
        }
    }

    /// Records the error returned by a domain check. Returns whether the check passed.
    fn check(&mut self, verdict: Option<GLenum>) -> bool {
        match verdict {
            Some(error) => {
                self.error(error);
                false
            }
            None => true,
        }
    }

    fn enum_ok(&mut self, ok: bool) -> bool {
        self.check((!ok).then_some(GL_INVALID_ENUM))
    }

    fn value_ok(&mut self, ok: bool) -> bool {
        self.check((!ok).then_some(GL_INVALID_VALUE))
    }

    fn elide(&self) {
        self.stats.inc_calls_elided();
    }

    fn forward<R>(&mut self, call: impl FnOnce(&dyn Driver) -> R) -> R {
        self.stats.inc_driver_calls();
        call(self.driver)
    }

    /// Forwards a call whose failure only the driver can detect.
    fn forward_unverified<R>(&mut self, call: impl FnOnce(&dyn Driver) -> R) -> R {
        self.state.need_get_error = true;
        self.forward(call)
    }

    /// The generic cached setter: redundancy check, domain check, shadow update, driver call.
    fn set_cached<T: BitEq + Copy>(
        &mut self,
        value: T,
        field: fn(&mut ShadowState) -> &mut T,
        domain: impl FnOnce(&T) -> Option<GLenum>,
        call: impl FnOnce(&dyn Driver, T),
    ) {
        if field(self.state).bit_eq(&value) {
            self.elide();
            return;
        }
        if !self.check(domain(&value)) {
            return;
        }
        *field(self.state) = value;
        self.forward(|d| call(d, value));
    }

    /// Driver limit, queried on first use and cached for the context's lifetime.
    fn limit(&mut self, limit: Limit) -> GLint {
        if let Some(value) = self.state.limits.cached(limit) {
            return value;
        }
        if !self.driver.is_bound(EntryPoint::GetIntegerv) {
            return limit.minimum();
        }
        let mut value = [limit.minimum()];
        self.forward(|d| d.get_integerv(limit.pname(), &mut value));
        trace!(?limit, value = value[0], "queried driver limit");
        self.state.limits.record(limit, value[0])
    }
}
