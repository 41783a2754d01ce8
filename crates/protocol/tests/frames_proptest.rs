//! Property-based tests for the host link frames.

#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::arithmetic_side_effects)]

use proptest::prelude::*;
use protocol::crc::crc32_mpeg2;
use protocol::{ChannelAction, Command, CommandAssembler, ProtocolError, TelemetryFrame};

fn action() -> impl Strategy<Value = ChannelAction> {
    (0u8..=3).prop_map(|b| ChannelAction::try_from(b).unwrap())
}

proptest! {
    /// Telemetry survives the wire unchanged for any finite pressures.
    #[test]
    fn telemetry_decodes_what_was_encoded(
        pressures in proptest::array::uniform8(-1.0e6f32..1.0e6f32),
        bits in 0u8..=255u8,
    ) {
        let frame = TelemetryFrame { pressures_kpa: pressures, valve_bits: bits };
        let decoded = TelemetryFrame::decode(&frame.encode()).unwrap();
        prop_assert_eq!(decoded, frame);
    }

    /// Flipping any single bit of a telemetry frame is detected.
    #[test]
    fn telemetry_single_bit_flip_detected(byte in 4usize..44, bit in 0u8..8) {
        let mut bytes = TelemetryFrame::default().encode();
        bytes[byte] ^= 1 << bit;
        prop_assert_eq!(TelemetryFrame::decode(&bytes), Err(ProtocolError::BadCrc));
    }

    /// A noise prefix without magic characters is skipped and the following
    /// command still decodes.
    #[test]
    fn assembler_recovers_after_noise(
        noise in proptest::collection::vec(0u8..b'!', 0..64),
        actions in proptest::array::uniform8(action()),
    ) {
        let command = Command::SetValves(actions);
        let mut asm = CommandAssembler::new();
        let mut results = Vec::new();
        for &b in noise.iter().chain(command.encode().iter()) {
            if let Some(result) = asm.push(b) {
                results.push(result);
            }
        }
        prop_assert_eq!(results, vec![Ok(command)]);
        prop_assert_eq!(asm.discarded() as usize, noise.len());
    }

    /// The CRC of a message followed by its big-endian CRC is zero.
    #[test]
    fn crc_residue_is_zero(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut framed = data.clone();
        framed.extend_from_slice(&crc32_mpeg2(&data).to_be_bytes());
        prop_assert_eq!(crc32_mpeg2(&framed), 0);
    }
}
