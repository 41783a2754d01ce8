//! Raw count handling and physical-unit conversion.
//!
//! The conversion is the rig's uncalibrated estimate: the amplifier input
//! voltage is reconstructed from the counts, then scaled by the sensor's
//! nominal 70 mV span per 100 kPa.

use platform::config::{EXCITATION_VOLTS, RATED_EXCITATION_VOLTS};

use super::Gain;

/// Counts at positive full scale (2^23).
pub const FULL_SCALE_COUNTS: f32 = 8_388_608.0;

/// Sensor output span, in volts, at [`SENSOR_SPAN_KPA`].
pub const SENSOR_SPAN_VOLTS: f32 = 0.070;

/// Pressure producing [`SENSOR_SPAN_VOLTS`].
pub const SENSOR_SPAN_KPA: f32 = 100.0;

const SIGN_BIT: u32 = 0x0080_0000;
const DATA_MASK: u32 = 0x00FF_FFFF;

/// Interpret the low 24 bits of `raw` as two's complement.
#[inline]
pub const fn sign_extend_24(raw: u32) -> i32 {
    let raw = raw & DATA_MASK;
    if raw & SIGN_BIT != 0 {
        (raw | !DATA_MASK) as i32
    } else {
        raw as i32
    }
}

/// Differential input voltage at full scale for `gain`.
///
/// The amplifier's ±20/40/80 mV ranges are specified at 5 V excitation and
/// scale with the actual AVDD.
pub fn full_scale_volts(gain: Gain) -> f32 {
    let rated = match gain {
        Gain::B32 => 0.080,
        Gain::A64 => 0.040,
        Gain::A128 => 0.020,
    };
    EXCITATION_VOLTS / RATED_EXCITATION_VOLTS * rated
}

/// Convert calibrated counts to kPa.
pub fn counts_to_kpa(counts: i32, gain: Gain) -> f32 {
    let input_volts = counts as f32 / FULL_SCALE_COUNTS * full_scale_volts(gain);
    input_volts * SENSOR_SPAN_KPA / SENSOR_SPAN_VOLTS
}
