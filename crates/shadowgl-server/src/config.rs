use std::path::PathBuf;

use shadowgl_ipc::{ConfigError, RingConfig};

/// Path override for the extended-context (EGL) library.
pub(crate) const LIBEGL_PATH_ENV: &str = "SHADOWGL_LIBEGL_PATH";
/// Path override for the core graphics (GLES2) library.
pub(crate) const LIBGLES_PATH_ENV: &str = "SHADOWGL_LIBGLES_PATH";

const DEFAULT_LIBEGL: &str = "libEGL.so";
const DEFAULT_LIBGLES: &str = "libGLESv2.so";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub egl_library: PathBuf,
    pub gles_library: PathBuf,
    /// Parameters for the rings of every channel this server accepts.
    pub ring: RingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            egl_library: PathBuf::from(DEFAULT_LIBEGL),
            gles_library: PathBuf::from(DEFAULT_LIBGLES),
            ring: RingConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            egl_library: path_from_env(LIBEGL_PATH_ENV, DEFAULT_LIBEGL),
            gles_library: path_from_env(LIBGLES_PATH_ENV, DEFAULT_LIBGLES),
            ring: RingConfig::from_env()?,
        })
    }
}

fn path_from_env(var: &str, default: &str) -> PathBuf {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => PathBuf::from(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_name_the_system_libraries() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.egl_library, PathBuf::from("libEGL.so"));
        assert_eq!(cfg.gles_library, PathBuf::from("libGLESv2.so"));
    }

    #[test]
    fn unset_override_uses_default() {
        assert_eq!(
            path_from_env("SHADOWGL_TEST_SURELY_UNSET_PATH", "libfoo.so"),
            PathBuf::from("libfoo.so")
        );
    }
}
