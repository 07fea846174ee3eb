//! EGL lifecycle entry points. The driver call always comes first; the registry only hears about
//! transitions the driver accepted.

use tracing::{debug, warn};

use shadowgl_ipc::ReplyValue;
use shadowgl_types::egl::{EGLint, EGL_NOT_INITIALIZED};
use shadowgl_types::{Config, Context, Display, NativeDisplay, NativeWindow, Surface};

use super::Engine;
use crate::driver::EntryPoint;

impl Engine {
    /// Whether `entry` is bound. EGL calls on an unbound entry point simply fail.
    fn egl_bound(&self, entry: EntryPoint) -> bool {
        let bound = self.driver.is_bound(entry);
        if !bound {
            warn!(?entry, "EGL entry point unbound");
        } else {
            self.stats.inc_driver_calls();
        }
        bound
    }

    pub(super) fn get_display(&mut self, native: NativeDisplay) -> Display {
        if !self.egl_bound(EntryPoint::EglGetDisplay) {
            return Display::NONE;
        }
        self.driver.get_display(native)
    }

    pub(super) fn initialize(&mut self, display: Display) -> ReplyValue {
        let result = if self.egl_bound(EntryPoint::EglInitialize) {
            self.driver.initialize(display)
        } else {
            None
        };
        match result {
            Some((major, minor)) => {
                self.registry.initialize(display);
                ReplyValue::Initialized { ok: true, major, minor }
            }
            None => ReplyValue::Initialized {
                ok: false,
                major: 0,
                minor: 0,
            },
        }
    }

    pub(super) fn terminate(&mut self, display: Display) -> bool {
        if !self.egl_bound(EntryPoint::EglTerminate) || !self.driver.terminate(display) {
            return false;
        }
        let reaped = self.registry.terminate(display, self.current.as_ref());
        let dpy = display.raw();
        debug!(display = dpy, reaped, "display terminated");
        true
    }

    pub(super) fn choose_config(&mut self, display: Display, attribs: &[EGLint], max: EGLint) -> Vec<Config> {
        if !self.egl_bound(EntryPoint::EglChooseConfig) {
            return Vec::new();
        }
        self.driver
            .choose_config(display, attribs, max)
            .unwrap_or_default()
    }

    pub(super) fn create_context(
        &mut self,
        display: Display,
        config: Config,
        share: Context,
        attribs: &[EGLint],
    ) -> Context {
        if !self.egl_bound(EntryPoint::EglCreateContext) {
            return Context::NONE;
        }
        self.driver.create_context(display, config, share, attribs)
    }

    pub(super) fn destroy_context(&mut self, display: Display, context: Context) -> bool {
        if !self.egl_bound(EntryPoint::EglDestroyContext)
            || !self.driver.destroy_context(display, context)
        {
            return false;
        }
        self.registry.destroy_context(display, context);
        true
    }

    pub(super) fn create_window_surface(
        &mut self,
        display: Display,
        config: Config,
        window: NativeWindow,
        attribs: &[EGLint],
    ) -> Surface {
        if !self.egl_bound(EntryPoint::EglCreateWindowSurface) {
            return Surface::NONE;
        }
        self.driver.create_window_surface(display, config, window, attribs)
    }

    pub(super) fn create_pbuffer_surface(&mut self, display: Display, config: Config, attribs: &[EGLint]) -> Surface {
        if !self.egl_bound(EntryPoint::EglCreatePbufferSurface) {
            return Surface::NONE;
        }
        self.driver.create_pbuffer_surface(display, config, attribs)
    }

    pub(super) fn destroy_surface(&mut self, display: Display, surface: Surface) -> bool {
        if !self.egl_bound(EntryPoint::EglDestroySurface)
            || !self.driver.destroy_surface(display, surface)
        {
            return false;
        }
        self.registry.destroy_surface(display, surface);
        true
    }

    pub(super) fn make_current(&mut self, display: Display, draw: Surface, read: Surface, context: Context) -> bool {
        if !self.driver.is_bound(EntryPoint::EglMakeCurrent) {
            warn!("eglMakeCurrent unbound");
            return false;
        }
        if self
            .current
            .as_ref()
            .is_some_and(|c| c.matches(display, draw, read, context))
        {
            self.stats.inc_calls_elided();
            return true;
        }

        self.stats.inc_driver_calls();
        if !self.driver.make_current(display, draw, read, context) {
            return false;
        }
        match self
            .registry
            .make_current(display, draw, read, context, &mut self.current)
        {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "registry rejected make-current; dropping current context");
                self.release_current();
                false
            }
        }
    }

    pub(super) fn release_thread(&mut self) -> bool {
        if !self.egl_bound(EntryPoint::EglReleaseThread) || !self.driver.release_thread() {
            return false;
        }
        self.release_current();
        true
    }

    pub(super) fn swap_buffers(&mut self, display: Display, surface: Surface) -> bool {
        self.egl_bound(EntryPoint::EglSwapBuffers) && self.driver.swap_buffers(display, surface)
    }

    pub(super) fn egl_get_error(&mut self) -> EGLint {
        if !self.egl_bound(EntryPoint::EglGetError) {
            return EGL_NOT_INITIALIZED;
        }
        self.driver.egl_get_error()
    }

    pub(super) fn release_current(&mut self) {
        if let Some(current) = self.current.take() {
            self.registry.release(current);
        }
    }
}
