//! Pressure acquisition
//!
//! Eight HX711 load-cell amplifiers share one clock line (PD_SCK) and present
//! their data lines on eight bits of one GPIO port. Every clock pulse shifts
//! one bit out of all eight converters at once, so a single port read per
//! pulse captures the same bit position on every channel.
//!
//! - [`Hx711Array`] - clocking, sampling, offsets, tare
//! - [`conversion`] - sign extension and counts → kPa
//! - [`Gain`] - amplifier input/gain selection, latched by the trailing pulses

pub mod conversion;
mod hx711_array;

pub use conversion::{counts_to_kpa, full_scale_volts, sign_extend_24};
pub use hx711_array::Hx711Array;

/// Data bits shifted out by every conversion.
pub const DATA_BITS: u8 = 24;

/// Amplifier input channel and gain for the next conversion.
///
/// The amplifier latches the selection from the number of clock pulses that
/// follow the 24 data bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// Input A, gain 128 (±20 mV full scale at 5 V excitation).
    #[default]
    A128,
    /// Input B, gain 32 (±80 mV).
    B32,
    /// Input A, gain 64 (±40 mV).
    A64,
}

impl Gain {
    /// Total clock pulses per conversion for this gain.
    pub const fn pulse_count(self) -> u8 {
        match self {
            Self::A128 => 25,
            Self::B32 => 26,
            Self::A64 => 27,
        }
    }

    /// Pulses after the data bits that select this gain.
    pub const fn trailing_pulses(self) -> u8 {
        self.pulse_count().saturating_sub(DATA_BITS)
    }
}

/// Errors returned by the acquisition driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionError<E> {
    /// The clock pin or the data port reported an error.
    Pin(E),
    /// Channel 0 did not signal "data ready" within the allowed time.
    Timeout,
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug> std::error::Error for AcquisitionError<E> {}

impl<E: core::fmt::Debug> core::fmt::Display for AcquisitionError<E> {
    #[allow(clippy::use_debug)] // pin error types only guarantee Debug
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "sensor bus pin error: {e:?}"),
            Self::Timeout => write!(f, "sensor not ready before timeout"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_counts_per_gain() {
        assert_eq!(Gain::A128.pulse_count(), 25);
        assert_eq!(Gain::B32.pulse_count(), 26);
        assert_eq!(Gain::A64.pulse_count(), 27);
    }

    #[test]
    fn trailing_pulses_per_gain() {
        assert_eq!(Gain::A128.trailing_pulses(), 1);
        assert_eq!(Gain::B32.trailing_pulses(), 2);
        assert_eq!(Gain::A64.trailing_pulses(), 3);
    }

    #[test]
    fn error_display() {
        let e: AcquisitionError<()> = AcquisitionError::Timeout;
        assert_eq!(e.to_string(), "sensor not ready before timeout");
        let e = AcquisitionError::Pin(7u8);
        assert_eq!(e.to_string(), "sensor bus pin error: 7");
    }
}
