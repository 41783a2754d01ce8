//! Property tests for sign extension and pressure conversion.
// Integration test file: unwrap/arithmetic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]

use firmware::sensing::{counts_to_kpa, sign_extend_24};
use firmware::Gain;
use proptest::prelude::*;

fn any_gain() -> impl Strategy<Value = Gain> {
    prop_oneof![Just(Gain::A128), Just(Gain::B32), Just(Gain::A64)]
}

proptest! {
    #[test]
    fn sign_bit_subtracts_two_pow_24(raw in 0u32..0x0100_0000) {
        let expected = if raw & 0x80_0000 != 0 {
            raw as i32 - 0x0100_0000
        } else {
            raw as i32
        };
        prop_assert_eq!(sign_extend_24(raw), expected);
    }

    #[test]
    fn upper_byte_is_ignored(raw in any::<u32>()) {
        prop_assert_eq!(sign_extend_24(raw), sign_extend_24(raw & 0x00FF_FFFF));
    }

    #[test]
    fn result_stays_in_24_bit_range(raw in any::<u32>()) {
        let value = sign_extend_24(raw);
        prop_assert!((-0x80_0000..0x80_0000).contains(&value));
    }

    #[test]
    fn conversion_is_odd_and_monotone(
        a in -0x80_0000i32..0x80_0000,
        b in -0x80_0000i32..0x80_0000,
        gain in any_gain(),
    ) {
        prop_assert_eq!(counts_to_kpa(-a, gain), -counts_to_kpa(a, gain));
        if a <= b {
            prop_assert!(counts_to_kpa(a, gain) <= counts_to_kpa(b, gain));
        }
    }

    #[test]
    fn lower_gain_reads_higher_pressure(counts in 1i32..0x80_0000) {
        let a128 = counts_to_kpa(counts, Gain::A128);
        let a64 = counts_to_kpa(counts, Gain::A64);
        let b32 = counts_to_kpa(counts, Gain::B32);
        prop_assert!(a128 < a64);
        prop_assert!(a64 < b32);
    }
}
