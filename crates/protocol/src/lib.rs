//! Host link wire format.
//!
//! Fixed-layout little-endian frames exchanged with the monitoring host over
//! the UART (115200 8N1). Every frame starts with a 4-byte ASCII magic.
//!
//! | Direction     | Magic  | Size | Content                                   |
//! |---------------|--------|------|-------------------------------------------|
//! | device → host | `PRZL` | 44   | 8 × f32 kPa, valve state bits, CRC        |
//! | device → host | `ACK!` | 4    | command applied / tare finished           |
//! | host → device | `VCMD` | 16   | 8 × [`ChannelAction`], CRC                |
//! | host → device | `CALB` | 4    | tare request                              |
//! | host → device | `AUTO` | 20   | threshold control, rejected (unsupported) |
//!
//! Checksums are CRC-32/MPEG-2 over everything before the CRC field, see
//! [`crc::crc32_mpeg2`].

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod command;
pub mod crc;
pub mod stream;
pub mod telemetry;

pub use command::{ChannelAction, Command};
pub use stream::CommandAssembler;
pub use telemetry::TelemetryFrame;

/// Number of channels carried by every frame.
pub const CHANNELS: usize = 8;

/// Length of every frame magic.
pub const MAGIC_LEN: usize = 4;

/// Length of the trailing CRC field.
pub const CRC_LEN: usize = 4;

/// Telemetry frame magic.
pub const TELEMETRY_MAGIC: [u8; MAGIC_LEN] = *b"PRZL";
/// Acknowledgement magic (sent alone, no payload).
pub const ACK_MAGIC: [u8; MAGIC_LEN] = *b"ACK!";
/// Valve command magic.
pub const VALVE_COMMAND_MAGIC: [u8; MAGIC_LEN] = *b"VCMD";
/// Tare request magic (sent alone, no payload).
pub const CALIBRATE_MAGIC: [u8; MAGIC_LEN] = *b"CALB";
/// Threshold ("auto") valve control magic. Recognised only to stay in sync.
pub const AUTO_MAGIC: [u8; MAGIC_LEN] = *b"AUTO";

/// Errors produced while decoding a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// Frame does not start with the expected magic.
    BadMagic,
    /// CRC field does not match the frame contents.
    BadCrc,
    /// Action byte outside `0..=3`.
    BadAction(u8),
    /// Fewer bytes than the frame layout requires.
    Truncated,
    /// Well-formed frame of a kind this firmware does not implement.
    Unsupported,
}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BadMagic => write!(f, "unknown frame magic"),
            Self::BadCrc => write!(f, "frame CRC mismatch"),
            Self::BadAction(byte) => write!(f, "invalid channel action {byte}"),
            Self::Truncated => write!(f, "frame truncated"),
            Self::Unsupported => write!(f, "frame type not supported"),
        }
    }
}

/// Read a little-endian `u32` at `offset`, if the slice is long enough.
pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let bytes: [u8; 4] = buf.get(offset..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}
