use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::protocol::DecodeError;

/// Setup failures for a [`crate::MirroredRing`]. None of them are retryable; a ring that failed to
/// construct must not be used.
#[derive(Debug, Error)]
pub enum RingError {
    #[error("failed to create ring backing file in {dir}: {source}")]
    BackingFile {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to size ring backing file to {len} bytes: {source}")]
    Truncate {
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error("failed to reserve {len} bytes of address space: {source}")]
    Reserve {
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error("failed to map ring image {image} at offset {offset:#x}: {source}")]
    Map {
        image: usize,
        offset: usize,
        #[source]
        source: io::Error,
    },

    #[error("ring capacity {0} bytes is not representable in a record header")]
    CapacityTooLarge(usize),
}

/// Failures while moving records over a channel.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("record of {len} bytes does not fit in a ring of {capacity} bytes")]
    TooLarge { len: usize, capacity: usize },

    #[error("malformed record: {0}")]
    Decode(#[from] DecodeError),

    #[error("expected reply for token {expected}, got token {got}")]
    UnexpectedReply { expected: u32, got: u32 },
}

/// An environment variable was set but could not be parsed.
#[derive(Debug, Error)]
#[error("invalid value {value:?} for {var}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}
