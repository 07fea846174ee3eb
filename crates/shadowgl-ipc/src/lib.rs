//! Client → server command transport.
//!
//! - [`ring`]: the mirrored (double-mapped) SPSC byte ring and its producer/consumer halves
//! - [`transport`]: busy-poll vs mutex+condvar waiting, selected once per ring
//! - [`protocol`]: the command/reply record wire format
//! - [`channel`]: a command ring plus a reply ring, packaged as client and server ends

pub mod channel;
pub mod config;
pub mod error;
pub mod layout;
pub mod protocol;
pub mod ring;
pub mod transport;

pub use channel::{channel, ClientEnd, ServerEnd};
pub use config::RingConfig;
pub use error::{ConfigError, RingError, TransportError};
pub use protocol::{Command, DecodeError, Opcode, RecordHeader, ReplyValue};
pub use ring::{Consumer, MirroredRing, Producer, PushError};
pub use transport::TransportMode;
