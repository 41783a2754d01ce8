//! CRC-32/MPEG-2
//!
//! Polynomial 0x04C11DB7, init 0xFFFFFFFF, MSB first (no reflection), no
//! final XOR. Same result as the STM32 CRC peripheral fed byte-wise and as
//! `crcmod.Crc(0x104C11DB7, initCrc=0xFFFFFFFF, rev=False)` on the host.

const POLY: u32 = 0x04C1_1DB7;
const INIT: u32 = 0xFFFF_FFFF;

/// Compute the CRC-32/MPEG-2 of `bytes`.
#[allow(clippy::arithmetic_side_effects)] // CRC register shifts, the top bit is dropped
pub fn crc32_mpeg2(bytes: &[u8]) -> u32 {
    let mut crc = INIT;
    for &b in bytes {
        crc ^= u32::from(b) << 24;
        for _ in 0..8 {
            if crc & 0x8000_0000 != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value() {
        assert_eq!(crc32_mpeg2(b"123456789"), 0x0376_E6E7);
    }

    #[test]
    fn empty_input_is_init() {
        assert_eq!(crc32_mpeg2(&[]), 0xFFFF_FFFF);
    }

    #[test]
    fn single_bit_flip_changes_crc() {
        let a = crc32_mpeg2(b"PRZL\x00\x00\x00\x00");
        let b = crc32_mpeg2(b"PRZL\x00\x00\x00\x01");
        assert_ne!(a, b);
    }
}
