//! Server half of shadowgl: replays decoded GLES2/EGL commands against a native driver while
//! answering as much as possible from per-context shadow state.
//!
//! - [`driver`]: the driver binding ([`Driver`] trait, native `libloading` loader)
//! - [`registry`]: process-wide context registry and the lifecycle state machine
//! - [`shadow`]: cached per-context GL state
//! - [`engine`]: validation, redundancy elision and the error-retrieval protocol
//! - [`dispatch`]: the per-channel run loop
//!
//! One [`Server`] is shared by every dispatch thread; each thread owns its own [`Engine`].

pub mod config;
pub mod dispatch;
pub mod driver;
pub mod engine;
pub mod error;
pub mod names;
pub mod registry;
pub mod shadow;
pub mod stats;
mod sync;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use std::sync::Arc;

pub use config::ServerConfig;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use driver::{Driver, EntryPoint, NativeDriver};
pub use engine::Engine;
pub use error::{DispatchError, DriverLoadError, RegistryError};
pub use names::{NameMap, NameTranslation, ObjectClass};
pub use registry::{ContextHandle, ContextRegistry, ContextSnapshot, Current, DestroyFlags};
pub use shadow::ShadowState;
pub use stats::{EngineStats, EngineStatsSnapshot};

/// State shared by every dispatch thread of one server process.
#[derive(Clone)]
pub struct Server {
    driver: Arc<dyn Driver>,
    registry: Arc<ContextRegistry>,
    names: Arc<NameTranslation>,
    stats: Arc<EngineStats>,
}

impl Server {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            registry: Arc::new(ContextRegistry::new()),
            names: Arc::new(NameTranslation::new()),
            stats: Arc::new(EngineStats::default()),
        }
    }

    /// Opens the native driver libraries named by `config`.
    pub fn load(config: &ServerConfig) -> Result<Self, DriverLoadError> {
        let driver = NativeDriver::load(&config.egl_library, &config.gles_library)?;
        Ok(Self::new(Arc::new(driver)))
    }

    /// A fresh per-thread engine. Each dispatch thread needs its own.
    pub fn engine(&self) -> Engine {
        Engine::new(
            self.driver.clone(),
            self.registry.clone(),
            self.names.clone(),
            self.stats.clone(),
        )
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    pub fn names(&self) -> &NameTranslation {
        &self.names
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }
}
