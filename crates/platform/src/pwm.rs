//! Valve PWM abstraction
//!
//! The valve coils are driven from eight PWM compare registers spread over
//! two timers (four channels each). Duty values are 16-bit, full scale
//! [`DUTY_FULL`]; implementations rescale to their timer's reload value.
//!
//! [`DutyCycleBank`] adapts any eight `embedded_hal::pwm::SetDutyCycle`
//! outputs to the batch interface.

use embedded_hal::pwm::SetDutyCycle;

use crate::CHANNEL_COUNT;

/// Duty value that switches a coil fully off.
pub const DUTY_OFF: u16 = 0;

/// Duty value that drives a coil continuously.
pub const DUTY_FULL: u16 = u16::MAX;

/// Eight PWM outputs updated as one batch.
pub trait PwmBank {
    /// Error type
    type Error: core::fmt::Debug;

    /// Start PWM generation on every channel.
    fn enable_all(&mut self) -> Result<(), Self::Error>;

    /// Write all eight duty values. Index `c` drives channel `c`.
    fn apply(&mut self, duties: &[u16; CHANNEL_COUNT]) -> Result<(), Self::Error>;
}

/// Scale a 16-bit duty to a timer whose full-on compare value is `max_duty`.
#[inline]
#[must_use]
#[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
pub const fn scale_duty(duty: u16, max_duty: u16) -> u16 {
    // duty * max_duty <= 0xFFFF * 0xFFFF fits in u32; result <= max_duty.
    ((duty as u32 * max_duty as u32) / DUTY_FULL as u32) as u16
}

/// Eight independent [`SetDutyCycle`] outputs driven as one [`PwmBank`].
#[derive(Debug)]
pub struct DutyCycleBank<P> {
    outputs: [P; CHANNEL_COUNT],
}

impl<P: SetDutyCycle> DutyCycleBank<P> {
    /// Wrap eight outputs; index `c` drives valve `c`.
    pub fn new(outputs: [P; CHANNEL_COUNT]) -> Self {
        Self { outputs }
    }

    /// Give the outputs back.
    pub fn release(self) -> [P; CHANNEL_COUNT] {
        self.outputs
    }
}

impl<P: SetDutyCycle> PwmBank for DutyCycleBank<P> {
    type Error = P::Error;

    /// `SetDutyCycle` outputs are always generating; start them all off.
    fn enable_all(&mut self) -> Result<(), Self::Error> {
        for output in &mut self.outputs {
            output.set_duty_cycle_fully_off()?;
        }
        Ok(())
    }

    fn apply(&mut self, duties: &[u16; CHANNEL_COUNT]) -> Result<(), Self::Error> {
        for (output, &duty) in self.outputs.iter_mut().zip(duties) {
            let max = output.max_duty_cycle();
            output.set_duty_cycle(scale_duty(duty, max))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[derive(Debug, Default)]
    struct FakeOutput {
        duty: u16,
        writes: u32,
    }

    impl embedded_hal::pwm::ErrorType for FakeOutput {
        type Error = Infallible;
    }

    impl SetDutyCycle for FakeOutput {
        fn max_duty_cycle(&self) -> u16 {
            7_199
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.duty = duty;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn duty_cycle_bank_scales_each_output() {
        let mut bank = DutyCycleBank::new(core::array::from_fn(|_| FakeOutput::default()));
        bank.enable_all().unwrap();
        bank.apply(&[DUTY_FULL, DUTY_OFF, 0, 0, 0, 0, 0, DUTY_FULL]).unwrap();
        let outputs = bank.release();
        assert_eq!(outputs[0].duty, 7_199);
        assert_eq!(outputs[1].duty, 0);
        assert_eq!(outputs[7].duty, 7_199);
        assert!(outputs.iter().all(|o| o.writes == 2));
    }

    #[test]
    fn scale_duty_maps_endpoints() {
        assert_eq!(scale_duty(DUTY_OFF, 7_199), 0);
        assert_eq!(scale_duty(DUTY_FULL, 7_199), 7_199);
        assert_eq!(scale_duty(DUTY_FULL, u16::MAX), u16::MAX);
    }

    #[test]
    fn scale_duty_identity_on_16_bit_timer() {
        assert_eq!(scale_duty(32_768, u16::MAX), 32_768);
    }

    #[test]
    fn scale_duty_half_scale_on_short_timer() {
        let half = scale_duty(32_768, 7_199);
        assert!((3_599..=3_600).contains(&half), "got {half}");
    }
}
