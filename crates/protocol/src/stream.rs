//! Byte-at-a-time reassembly of host frames.
//!
//! The UART delivers an unframed byte stream. [`CommandAssembler`] buffers
//! bytes until a known magic heads the buffer and the whole frame for that
//! magic has arrived. While the head is not a known magic, one byte is
//! discarded per push, so a stream joined mid-frame recovers on the next
//! magic.

use heapless::Vec;

use crate::command::{frame_len, MAX_COMMAND_LEN};
use crate::{Command, ProtocolError, MAGIC_LEN};

/// Incremental host frame decoder.
#[derive(Debug, Default)]
pub struct CommandAssembler {
    buf: Vec<u8, MAX_COMMAND_LEN>,
    discarded: u32,
}

impl CommandAssembler {
    /// Create an empty assembler.
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            discarded: 0,
        }
    }

    /// Feed one received byte.
    ///
    /// Returns `Some` when a complete frame has been consumed, carrying the
    /// decoded command or the reason it was rejected. The buffer is empty
    /// again afterwards either way.
    pub fn push(&mut self, byte: u8) -> Option<Result<Command, ProtocolError>> {
        if self.buf.push(byte).is_err() {
            // Unreachable while every known frame fits; restart cleanly anyway.
            self.buf.clear();
            return None;
        }

        let expected = frame_len(self.buf.get(..MAGIC_LEN)?);
        match expected {
            None => {
                self.buf.remove(0);
                self.discarded = self.discarded.saturating_add(1);
                None
            }
            Some(len) if self.buf.len() < len => None,
            Some(_) => {
                let result = Command::decode(&self.buf);
                self.buf.clear();
                Some(result)
            }
        }
    }

    /// Bytes buffered towards the next frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Bytes thrown away while searching for a magic.
    pub fn discarded(&self) -> u32 {
        self.discarded
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}
