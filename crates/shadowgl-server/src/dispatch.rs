//! The per-channel run loop: decode a command record, execute it, post the reply, acknowledge.

use tracing::{debug, error, trace, warn};

use shadowgl_ipc::layout::HEADER_BYTES;
use shadowgl_ipc::protocol::decode_command;
use shadowgl_ipc::{Command, DecodeError, RecordHeader, ServerEnd};

use crate::engine::Engine;
use crate::error::DispatchError;

/// Why a dispatch loop returned normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The client sent the shutdown command.
    Shutdown,
}

/// Owns one channel's server end and the engine that executes its commands.
pub struct Dispatcher {
    server_end: ServerEnd,
    engine: Engine,
}

impl Dispatcher {
    pub fn new(server_end: ServerEnd, engine: Engine) -> Self {
        Self { server_end, engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn into_engine(self) -> Engine {
        self.engine
    }

    /// Handles records until the client shuts the channel down.
    ///
    /// In busy-poll mode an empty ring is re-checked after the ring's poll interval; in blocking
    /// mode the consumer sleeps on the ring's condition variable.
    pub fn run(&mut self) -> Result<DispatchOutcome, DispatchError> {
        loop {
            match self.step() {
                Ok(Some(outcome)) => {
                    debug!(?outcome, "dispatch loop finished");
                    return Ok(outcome);
                }
                Ok(None) => {}
                Err(err) => {
                    error!(error = %err, "dispatch loop stopped");
                    return Err(err);
                }
            }
        }
    }

    /// Waits for and handles exactly one record.
    pub fn step(&mut self) -> Result<Option<DispatchOutcome>, DispatchError> {
        let capacity = self.server_end.command_ring().capacity();
        let hdr = RecordHeader::parse(self.wait_for(HEADER_BYTES)).map_err(DispatchError::CorruptRecord)?;
        if hdr.len() > capacity {
            return Err(DispatchError::CorruptRecord(DecodeError::BadSize { size: hdr.size }));
        }
        let (size, token) = (hdr.len(), hdr.token);

        let cmd = match decode_command(self.wait_for(size)) {
            Ok((_, cmd)) => Some(cmd),
            Err(err) => {
                // The header was sound, so the stream stays in sync; only this record is lost.
                warn!(error = %err, size, token, "skipping undecodable command record");
                None
            }
        };

        let mut outcome = None;
        if let Some(cmd) = cmd {
            trace!(token, opcode = ?cmd.opcode(), "dispatching");
            if matches!(cmd, Command::Shutdown {}) {
                outcome = Some(DispatchOutcome::Shutdown);
            }
            if let Some(reply) = self.engine.execute(cmd) {
                self.server_end.post_reply(token, &reply)?;
            }
        }

        self.engine.stats().inc_records_dispatched();
        let commands = self.server_end.commands();
        commands.commit_read(size);
        commands.acknowledge(token);
        Ok(outcome)
    }

    /// The readable region once at least `min` bytes are committed.
    fn wait_for(&mut self, min: usize) -> &[u8] {
        let interval = self.server_end.command_ring().poll_interval();
        // Probe, then re-borrow: the region can't be returned from inside the loop.
        while self.server_end.commands().wait_readable(min).is_none() {
            std::thread::sleep(interval);
        }
        self.server_end.commands().wait_readable(min).unwrap_or_default()
    }
}
