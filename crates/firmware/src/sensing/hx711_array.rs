use critical_section::CriticalSection;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use platform::config::ZERO_SAMPLES;
use platform::{Channel, ParallelPort, CHANNEL_COUNT};

use super::{counts_to_kpa, sign_extend_24, AcquisitionError, Gain, DATA_BITS};

/// Eight HX711 amplifiers clocked together.
///
/// Holds the gain, the per-channel calibration offsets and the latest
/// calibrated counts. Every successful read replaces all eight counts at once;
/// a failed read leaves the previous counts in place.
///
/// Only channel 0's data line is watched for "data ready". The converters share
/// a clock and an oscillator, so the other seven are assumed to be ready at the
/// same time.
#[derive(Debug)]
pub struct Hx711Array<C, P> {
    clock: C,
    port: P,
    gain: Gain,
    offsets: [i32; CHANNEL_COUNT],
    counts: [i32; CHANNEL_COUNT],
}

impl<C, P, E> Hx711Array<C, P>
where
    C: OutputPin<Error = E>,
    P: ParallelPort<Error = E>,
{
    /// Take ownership of the bus, clear all offsets and run one conversion.
    ///
    /// The first conversion is clocked with the trailing pulses for `gain`,
    /// which programs every amplifier for the conversions that follow. Blocks
    /// until channel 0 is ready.
    pub fn new(clock: C, port: P, gain: Gain) -> Result<Self, AcquisitionError<E>> {
        let mut array = Self {
            clock,
            port,
            gain,
            offsets: [0; CHANNEL_COUNT],
            counts: [0; CHANNEL_COUNT],
        };
        array.read()?;
        Ok(array)
    }

    /// Whether channel 0 currently signals a finished conversion (line low).
    pub fn is_ready(&mut self) -> Result<bool, AcquisitionError<E>> {
        let snapshot = self.port.read_port().map_err(AcquisitionError::Pin)?;
        Ok(!Channel::FIRST.line(snapshot))
    }

    /// Wait for a conversion and clock it in.
    ///
    /// The wait is unbounded: with channel 0 disconnected this never returns.
    /// Use [`read_with_timeout`](Self::read_with_timeout) where that matters.
    pub fn read(&mut self) -> Result<(), AcquisitionError<E>> {
        while !self.is_ready()? {}
        self.clock_in()
    }

    /// [`read`](Self::read) with an upper bound on the wait.
    ///
    /// Polls the ready line once per microsecond. On timeout the clock line is
    /// never touched and the previous counts are kept.
    pub fn read_with_timeout<D: DelayNs>(
        &mut self,
        delay: &mut D,
        timeout_us: u32,
    ) -> Result<(), AcquisitionError<E>> {
        let mut waited_us: u32 = 0;
        while !self.is_ready()? {
            if waited_us >= timeout_us {
                #[cfg(feature = "defmt")]
                defmt::warn!("sensor bus not ready after {=u32} us", timeout_us);
                return Err(AcquisitionError::Timeout);
            }
            delay.delay_us(1);
            waited_us = waited_us.saturating_add(1);
        }
        self.clock_in()
    }

    /// Tare: average [`ZERO_SAMPLES`] reads and subtract the result from the
    /// offsets, so the current load reads as zero afterwards.
    pub fn zero(&mut self) -> Result<(), AcquisitionError<E>> {
        self.zero_with(Self::read)
    }

    /// [`zero`](Self::zero) with every read bounded by `timeout_us`.
    ///
    /// If any read times out the offsets are left unchanged.
    pub fn zero_with_timeout<D: DelayNs>(
        &mut self,
        delay: &mut D,
        timeout_us: u32,
    ) -> Result<(), AcquisitionError<E>> {
        self.zero_with(|array| array.read_with_timeout(delay, timeout_us))
    }

    fn zero_with<F>(&mut self, mut read: F) -> Result<(), AcquisitionError<E>>
    where
        F: FnMut(&mut Self) -> Result<(), AcquisitionError<E>>,
    {
        let mut sums = [0i64; CHANNEL_COUNT];
        for _ in 0..ZERO_SAMPLES {
            read(self)?;
            for (sum, &count) in sums.iter_mut().zip(&self.counts) {
                *sum = sum.saturating_add(i64::from(count));
            }
        }
        for (offset, sum) in self.offsets.iter_mut().zip(sums) {
            // Truncates toward zero; |average| < 2^31 since every sample is an i32.
            #[allow(clippy::arithmetic_side_effects)] // ZERO_SAMPLES is a non-zero constant
            let average = sum / i64::from(ZERO_SAMPLES);
            *offset = offset.wrapping_sub(average as i32);
        }
        #[cfg(feature = "defmt")]
        defmt::info!("sensor offsets: {=[i32]}", self.offsets.as_slice());
        Ok(())
    }

    /// Clock out one conversion and commit all eight counts.
    fn clock_in(&mut self) -> Result<(), AcquisitionError<E>> {
        // A clock-high phase longer than 60 µs powers the amplifiers down,
        // so the whole pulse train runs with interrupts masked.
        let raw =
            critical_section::with(|cs| self.shift_frame(cs)).map_err(AcquisitionError::Pin)?;

        for ((count, offset), bits) in self.counts.iter_mut().zip(&self.offsets).zip(raw) {
            *count = sign_extend_24(bits).wrapping_add(*offset);
        }
        #[cfg(feature = "defmt")]
        defmt::trace!("sensor counts: {=[i32]}", self.counts.as_slice());
        Ok(())
    }

    #[allow(clippy::arithmetic_side_effects)] // shift of a 24-bit accumulator, cannot overflow
    fn shift_frame(&mut self, _cs: CriticalSection) -> Result<[u32; CHANNEL_COUNT], E> {
        let mut raw = [0u32; CHANNEL_COUNT];
        for _ in 0..DATA_BITS {
            self.pulse()?;
            let snapshot = self.port.read_port()?;
            for (bits, channel) in raw.iter_mut().zip(Channel::ALL) {
                *bits = (*bits << 1) | u32::from(channel.line(snapshot));
            }
        }
        for _ in 0..self.gain.trailing_pulses() {
            self.pulse()?;
        }
        Ok(raw)
    }

    fn pulse(&mut self) -> Result<(), E> {
        self.clock.set_high()?;
        self.clock.set_low()
    }
}

impl<C, P> Hx711Array<C, P> {
    /// Gain selected at construction.
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Calibrated counts from the last read.
    pub fn counts(&self) -> [i32; CHANNEL_COUNT] {
        self.counts
    }

    /// Current calibration offsets.
    pub fn offsets(&self) -> [i32; CHANNEL_COUNT] {
        self.offsets
    }

    /// Pressure on `channel` from the last read, in kPa.
    ///
    /// Before any read has completed this is 0.
    #[allow(clippy::indexing_slicing)] // Safety: Channel::index() < CHANNEL_COUNT
    pub fn kpa(&self, channel: Channel) -> f32 {
        counts_to_kpa(self.counts[channel.index()], self.gain)
    }

    /// Pressures on all channels, in channel order.
    pub fn kpa_all(&self) -> [f32; CHANNEL_COUNT] {
        self.counts.map(|count| counts_to_kpa(count, self.gain))
    }

    /// Give back the clock pin and the data port.
    pub fn release(self) -> (C, P) {
        (self.clock, self.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use platform::mocks::{encode_24, SimulatedSensorBus};

    #[test]
    fn new_clocks_one_frame_with_gain_pulses() {
        let bus = SimulatedSensorBus::new();
        let array = Hx711Array::new(bus.clock(), bus.port(), Gain::B32).unwrap();
        assert_eq!(bus.frame_pulse_counts(), vec![26]);
        assert_eq!(array.counts(), [0; CHANNEL_COUNT]);
        assert_eq!(array.offsets(), [0; CHANNEL_COUNT]);
    }

    #[test]
    fn read_commits_every_channel() {
        let values = [1, -1, 0x7F_FFFF, -0x80_0000, 12_345, -54_321, 0, 42];
        let bus = SimulatedSensorBus::with_constant(values);
        let mut array = Hx711Array::new(bus.clock(), bus.port(), Gain::A128).unwrap();
        array.read().unwrap();
        assert_eq!(array.counts(), values);
    }

    #[test]
    fn port_is_sampled_with_clock_low() {
        let bus = SimulatedSensorBus::with_constant([3; CHANNEL_COUNT]);
        let mut array = Hx711Array::new(bus.clock(), bus.port(), Gain::A64).unwrap();
        array.read().unwrap();
        assert_eq!(bus.reads_while_clock_high(), 0);
        assert!(!bus.clock_is_high());
    }

    #[test]
    fn busy_wait_ends_when_channel_zero_ready() {
        let bus = SimulatedSensorBus::with_constant([5; CHANNEL_COUNT]);
        bus.hold_busy(100);
        let array = Hx711Array::new(bus.clock(), bus.port(), Gain::A128).unwrap();
        assert_eq!(array.counts()[0], 5);
    }

    #[test]
    fn kpa_before_first_read_is_zero() {
        let bus = SimulatedSensorBus::new();
        let array = Hx711Array {
            clock: bus.clock(),
            port: bus.port(),
            gain: Gain::A128,
            offsets: [0; CHANNEL_COUNT],
            counts: [0; CHANNEL_COUNT],
        };
        assert_eq!(array.kpa_all(), [0.0; CHANNEL_COUNT]);
        assert_eq!(bus.total_pulses(), 0);
    }

    #[test]
    fn offsets_apply_with_wrapping_add() {
        let bus = SimulatedSensorBus::new();
        let mut raw = [0; CHANNEL_COUNT];
        raw[2] = encode_24(100);
        bus.push_conversion(raw);
        let mut array = Hx711Array::new(bus.clock(), bus.port(), Gain::A128).unwrap();
        array.offsets[2] = i32::MAX;
        bus.push_conversion(raw);
        array.read().unwrap();
        assert_eq!(array.counts()[2], 100i32.wrapping_add(i32::MAX));
    }

    #[test]
    fn release_returns_bus_handles() {
        let bus = SimulatedSensorBus::new();
        let array = Hx711Array::new(bus.clock(), bus.port(), Gain::A128).unwrap();
        let (_clock, _port) = array.release();
    }

    /// Clock that fails every edge, paired with a port sharing its error type.
    struct FailingClock;
    struct ReadyPort;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct LineFault;

    impl embedded_hal::digital::Error for LineFault {
        fn kind(&self) -> embedded_hal::digital::ErrorKind {
            embedded_hal::digital::ErrorKind::Other
        }
    }

    impl embedded_hal::digital::ErrorType for FailingClock {
        type Error = LineFault;
    }

    impl OutputPin for FailingClock {
        fn set_high(&mut self) -> Result<(), LineFault> {
            Err(LineFault)
        }
        fn set_low(&mut self) -> Result<(), LineFault> {
            Ok(())
        }
    }

    impl ParallelPort for ReadyPort {
        type Error = LineFault;
        fn read_port(&mut self) -> Result<u8, LineFault> {
            Ok(0)
        }
    }

    #[test]
    fn clock_errors_propagate() {
        let result = Hx711Array::new(FailingClock, ReadyPort, Gain::A128);
        assert!(matches!(result, Err(AcquisitionError::Pin(LineFault))));
    }
}
