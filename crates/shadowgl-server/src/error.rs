use std::path::PathBuf;

use thiserror::Error;

use shadowgl_ipc::{DecodeError, TransportError};

/// A driver library could not be opened.
#[derive(Debug, Error)]
#[error("failed to load driver library {path}: {source}")]
pub struct DriverLoadError {
    pub path: PathBuf,
    #[source]
    pub source: libloading::Error,
}

/// Lifecycle transitions the registry refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The handle's slot was reaped (and possibly reused) since the handle was issued.
    #[error("stale context handle (slot {index}, generation {generation})")]
    StaleHandle { index: u32, generation: u32 },

    /// Another worker already has this (display, context) current.
    #[error("context {context:#x} on display {display:#x} is current on another thread")]
    ContextBusy { display: u64, context: u64 },
}

/// Conditions that stop a dispatch loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A header whose size can't be trusted; the stream can't be resynchronised.
    #[error("corrupt record header: {0}")]
    CorruptRecord(#[source] DecodeError),

    /// The reply ring rejected a reply.
    #[error("failed to post reply: {0}")]
    Reply(#[from] TransportError),
}
