//! Shared vocabulary for the shadowgl client/server split.
//!
//! - [`handles`]: opaque EGL handle newtypes. Equality is the only operation the server relies on.
//! - [`gl`]: the GLES2 scalar types and enumerants the server validates against.
//! - [`egl`]: the EGL enumerants used by the lifecycle entry points.

pub mod egl;
pub mod gl;
pub mod handles;

pub use handles::{Config, Context, Display, NativeDisplay, NativeWindow, Surface};
