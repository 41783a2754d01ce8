//! Telemetry frame (`PRZL`)
//!
//! ```text
//! offset  size  field
//!      0     4  magic "PRZL"
//!      4    32  pressure[0..8], f32 LE, kPa
//!     36     1  valve state bits, bit c = channel c commanded on
//!     37     3  reserved, zero
//!     40     4  CRC-32/MPEG-2 over bytes 0..40, LE
//! ```

use crate::crc::crc32_mpeg2;
use crate::{read_u32_le, ProtocolError, CHANNELS, MAGIC_LEN, TELEMETRY_MAGIC};

const PRESSURE_OFFSET: usize = MAGIC_LEN;
const VALVE_OFFSET: usize = PRESSURE_OFFSET + CHANNELS * 4;
const CRC_OFFSET: usize = VALVE_OFFSET + 4;

/// One telemetry sample sent after every acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryFrame {
    /// Channel pressures in kPa.
    pub pressures_kpa: [f32; CHANNELS],
    /// Commanded valve states, bit `c` for channel `c`.
    pub valve_bits: u8,
}

impl TelemetryFrame {
    /// Encoded size in bytes.
    pub const SIZE: usize = CRC_OFFSET + 4;

    /// Serialise into the wire layout, CRC included.
    #[allow(clippy::indexing_slicing)] // Safety: all offsets are constants below SIZE
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..MAGIC_LEN].copy_from_slice(&TELEMETRY_MAGIC);
        for (slot, kpa) in out[PRESSURE_OFFSET..VALVE_OFFSET]
            .chunks_exact_mut(4)
            .zip(self.pressures_kpa)
        {
            slot.copy_from_slice(&kpa.to_le_bytes());
        }
        out[VALVE_OFFSET] = self.valve_bits;
        let crc = crc32_mpeg2(&out[..CRC_OFFSET]);
        out[CRC_OFFSET..].copy_from_slice(&crc.to_le_bytes());
        out
    }

    /// Parse a frame, checking magic and CRC. Trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] if `buf` is shorter than [`Self::SIZE`],
    /// [`ProtocolError::BadMagic`] or [`ProtocolError::BadCrc`] otherwise.
    #[allow(clippy::indexing_slicing)] // Safety: frame.len() == SIZE; offsets are constants below SIZE
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        let frame = buf.get(..Self::SIZE).ok_or(ProtocolError::Truncated)?;
        if frame[..MAGIC_LEN] != TELEMETRY_MAGIC {
            return Err(ProtocolError::BadMagic);
        }
        let stored = read_u32_le(frame, CRC_OFFSET).ok_or(ProtocolError::Truncated)?;
        if stored != crc32_mpeg2(&frame[..CRC_OFFSET]) {
            return Err(ProtocolError::BadCrc);
        }

        let mut pressures_kpa = [0.0f32; CHANNELS];
        for (value, offset) in pressures_kpa
            .iter_mut()
            .zip((PRESSURE_OFFSET..VALVE_OFFSET).step_by(4))
        {
            let bits = read_u32_le(frame, offset).ok_or(ProtocolError::Truncated)?;
            *value = f32::from_bits(bits);
        }

        Ok(Self {
            pressures_kpa,
            valve_bits: frame[VALVE_OFFSET],
        })
    }
}
