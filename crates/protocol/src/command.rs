//! Host → device commands
//!
//! `VCMD` (16 bytes): magic, one action byte per channel, CRC-32/MPEG-2 over
//! bytes 0..12. `CALB` (4 bytes): magic only, no CRC.

use heapless::Vec;

use crate::crc::crc32_mpeg2;
use crate::{
    read_u32_le, ProtocolError, AUTO_MAGIC, CALIBRATE_MAGIC, CHANNELS, CRC_LEN, MAGIC_LEN,
    VALVE_COMMAND_MAGIC,
};

/// Size of a `VCMD` frame.
pub const VALVE_COMMAND_LEN: usize = MAGIC_LEN + CHANNELS + CRC_LEN;
/// Size of a `CALB` frame.
pub const CALIBRATE_LEN: usize = MAGIC_LEN;
/// Size of an `AUTO` frame: magic, 4 × u8, 2 × f32 thresholds, CRC.
pub const AUTO_LEN: usize = MAGIC_LEN + 4 + 8 + CRC_LEN;
/// Largest host frame.
pub const MAX_COMMAND_LEN: usize = AUTO_LEN;

const _: () = assert!(MAX_COMMAND_LEN >= VALVE_COMMAND_LEN && MAX_COMMAND_LEN >= CALIBRATE_LEN);

/// What to do with one valve channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ChannelAction {
    /// Leave the channel as it is.
    #[default]
    Nop = 0,
    /// Command the valve on.
    Set = 1,
    /// Command the valve off.
    Reset = 2,
    /// Invert the commanded state.
    Toggle = 3,
}

impl TryFrom<u8> for ChannelAction {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(Self::Nop),
            1 => Ok(Self::Set),
            2 => Ok(Self::Reset),
            3 => Ok(Self::Toggle),
            other => Err(ProtocolError::BadAction(other)),
        }
    }
}

impl From<ChannelAction> for u8 {
    fn from(action: ChannelAction) -> Self {
        action as u8
    }
}

/// Frame length for a known host magic, `None` for anything else.
pub fn frame_len(magic: &[u8]) -> Option<usize> {
    if magic == VALVE_COMMAND_MAGIC {
        Some(VALVE_COMMAND_LEN)
    } else if magic == CALIBRATE_MAGIC {
        Some(CALIBRATE_LEN)
    } else if magic == AUTO_MAGIC {
        Some(AUTO_LEN)
    } else {
        None
    }
}

/// A decoded host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Per-channel valve actions.
    SetValves([ChannelAction; CHANNELS]),
    /// Re-zero every pressure channel.
    Calibrate,
}

impl Command {
    /// Serialise into the wire layout.
    #[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)] // Safety: constant offsets within VALVE_COMMAND_LEN
    pub fn encode(&self) -> Vec<u8, MAX_COMMAND_LEN> {
        let mut out = Vec::new();
        match self {
            Self::SetValves(actions) => {
                let mut frame = [0u8; VALVE_COMMAND_LEN];
                frame[..MAGIC_LEN].copy_from_slice(&VALVE_COMMAND_MAGIC);
                for (slot, action) in frame[MAGIC_LEN..MAGIC_LEN + CHANNELS]
                    .iter_mut()
                    .zip(actions)
                {
                    *slot = u8::from(*action);
                }
                let crc_at = MAGIC_LEN + CHANNELS;
                let crc = crc32_mpeg2(&frame[..crc_at]);
                frame[crc_at..].copy_from_slice(&crc.to_le_bytes());
                let pushed = out.extend_from_slice(&frame);
                debug_assert!(pushed.is_ok());
            }
            Self::Calibrate => {
                let pushed = out.extend_from_slice(&CALIBRATE_MAGIC);
                debug_assert!(pushed.is_ok());
            }
        }
        out
    }

    /// Parse one complete host frame.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: unknown magic, short buffer, CRC
    /// mismatch, or an action byte outside `0..=3`. `AUTO` frames decode to
    /// [`ProtocolError::Unsupported`].
    #[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)] // Safety: buf.len() >= len >= CRC_LEN + MAGIC_LEN checked above
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        let magic = buf.get(..MAGIC_LEN).ok_or(ProtocolError::Truncated)?;
        let len = frame_len(magic).ok_or(ProtocolError::BadMagic)?;
        if buf.len() < len {
            return Err(ProtocolError::Truncated);
        }

        if magic == CALIBRATE_MAGIC {
            return Ok(Self::Calibrate);
        }

        let crc_at = len - CRC_LEN;
        let stored = read_u32_le(buf, crc_at).ok_or(ProtocolError::Truncated)?;
        if stored != crc32_mpeg2(&buf[..crc_at]) {
            return Err(ProtocolError::BadCrc);
        }
        if magic == AUTO_MAGIC {
            return Err(ProtocolError::Unsupported);
        }

        let mut actions = [ChannelAction::Nop; CHANNELS];
        for (action, &byte) in actions.iter_mut().zip(&buf[MAGIC_LEN..crc_at]) {
            *action = ChannelAction::try_from(byte)?;
        }
        Ok(Self::SetValves(actions))
    }
}
