//! A client↔server channel: one ring for commands, one for replies.

use crate::config::RingConfig;
use crate::error::{RingError, TransportError};
use crate::layout::{HEADER_BYTES, NO_TOKEN};
use crate::protocol::{
    decode_reply, encode_command_into, encode_reply_into, Command, DecodeError, RecordHeader,
    ReplyValue,
};
use crate::ring::{Consumer, MirroredRing, Producer, PushError};

/// Creates both rings of a channel with the same configuration.
pub fn channel(config: &RingConfig) -> Result<(ClientEnd, ServerEnd), RingError> {
    let (cmd_tx, cmd_rx) = MirroredRing::create(config)?;
    let (reply_tx, reply_rx) = MirroredRing::create(config)?;
    Ok((
        ClientEnd {
            commands: cmd_tx,
            replies: reply_rx,
            next_token: NO_TOKEN,
            scratch: Vec::new(),
        },
        ServerEnd {
            commands: cmd_rx,
            replies: reply_tx,
            scratch: Vec::new(),
        },
    ))
}

/// Producer side of the command stream.
pub struct ClientEnd {
    commands: Producer,
    replies: Consumer,
    next_token: u32,
    scratch: Vec<u8>,
}

impl ClientEnd {
    pub fn command_ring(&self) -> &MirroredRing {
        self.commands.ring()
    }

    /// Encodes `cmd` into the command ring and returns its token.
    pub fn send(&mut self, cmd: &Command) -> Result<u32, TransportError> {
        let token = self.allocate_token();
        self.scratch.clear();
        encode_command_into(token, cmd, &mut self.scratch);
        match self.commands.push(&self.scratch) {
            Ok(()) => Ok(token),
            Err(PushError::TooLarge | PushError::Full) => Err(TransportError::TooLarge {
                len: self.scratch.len(),
                capacity: self.commands.ring().capacity(),
            }),
        }
    }

    /// Sends a command that returns a value and waits for its reply.
    pub fn call(&mut self, cmd: &Command) -> Result<ReplyValue, TransportError> {
        debug_assert!(cmd.expects_reply(), "{:?} has no reply", cmd.opcode());
        let token = self.send(cmd)?;
        let (hdr, value) = read_record(&mut self.replies, decode_reply)?;
        if hdr.token != token {
            return Err(TransportError::UnexpectedReply {
                expected: token,
                got: hdr.token,
            });
        }
        Ok(value)
    }

    /// Waits until the server has finished handling the record carrying `token`.
    pub fn wait_for_token(&self, token: u32) {
        let ring = self.commands.ring();
        while !token_reached(ring.last_token(), token) {
            std::thread::sleep(ring.poll_interval());
        }
    }

    /// Round-trips a no-op so every previously sent command has been handled.
    pub fn sync(&mut self) -> Result<(), TransportError> {
        let token = self.send(&Command::Nop {})?;
        self.wait_for_token(token);
        Ok(())
    }

    /// Stops the server loop and waits for it to acknowledge.
    pub fn shutdown(mut self) -> Result<(), TransportError> {
        let token = self.send(&Command::Shutdown {})?;
        self.wait_for_token(token);
        Ok(())
    }

    fn allocate_token(&mut self) -> u32 {
        self.next_token = self.next_token.wrapping_add(1);
        if self.next_token == NO_TOKEN {
            self.next_token = 1;
        }
        self.next_token
    }
}

/// Consumer side of the command stream, owned by a dispatch loop.
pub struct ServerEnd {
    commands: Consumer,
    replies: Producer,
    scratch: Vec<u8>,
}

impl ServerEnd {
    pub fn commands(&mut self) -> &mut Consumer {
        &mut self.commands
    }

    pub fn command_ring(&self) -> &MirroredRing {
        self.commands.ring()
    }

    pub fn post_reply(&mut self, token: u32, value: &ReplyValue) -> Result<(), TransportError> {
        self.scratch.clear();
        encode_reply_into(token, value, &mut self.scratch);
        self.replies
            .push(&self.scratch)
            .map_err(|_| TransportError::TooLarge {
                len: self.scratch.len(),
                capacity: self.replies.ring().capacity(),
            })
    }
}

/// Tokens wrap; `last` has reached `token` when it is at most half the space ahead.
fn token_reached(last: u32, token: u32) -> bool {
    (last.wrapping_sub(token) as i32) >= 0
}

/// Reads one whole record, waiting for its header and then its full size. The record is released
/// even if its payload fails to decode.
fn read_record<T>(
    consumer: &mut Consumer,
    decode: fn(&[u8]) -> Result<(RecordHeader, T), DecodeError>,
) -> Result<(RecordHeader, T), TransportError> {
    let interval = consumer.ring().poll_interval();
    let size = loop {
        if let Some(region) = consumer.wait_readable(HEADER_BYTES) {
            break RecordHeader::parse(region)?.len();
        }
        std::thread::sleep(interval);
    };
    let decoded = loop {
        if let Some(region) = consumer.wait_readable(size) {
            break decode(region);
        }
        std::thread::sleep(interval);
    };
    consumer.commit_read(size);
    Ok(decoded?)
}
