//! Host-side simulations of the platform capabilities
//!
//! [`SimulatedSensorBus`] models eight HX711-style amplifiers sharing one
//! clock line: it hands out a clock pin and a data port that see the same
//! bus state, shifts each channel's conversion out MSB first on the clock
//! pulses, and records how many pulses every frame received.
//!
//! [`MockPwmBank`] records every batch of duties written to it.

#![cfg(any(test, feature = "std"))]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use core::convert::Infallible;

use crate::{ParallelPort, PwmBank, CHANNEL_COUNT};

/// One 24-bit conversion result per channel, as shifted out on the wire.
pub type Conversion = [u32; CHANNEL_COUNT];

/// Data bits clocked out per conversion.
const DATA_BITS: u32 = 24;

/// Mask a signed reading down to the 24-bit two's-complement wire pattern.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn encode_24(value: i32) -> u32 {
    (value as u32) & 0x00FF_FFFF
}

#[derive(Debug, Default)]
struct BusState {
    pending: VecDeque<Conversion>,
    current: Conversion,
    clock_high: bool,
    pulses: u32,
    total_pulses: u32,
    closed_frames: Vec<u32>,
    busy_polls: u32,
    stalled: bool,
    reads_while_high: u32,
}

#[allow(clippy::arithmetic_side_effects)] // Simulation counters; a test never clocks 2^32 pulses
impl BusState {
    fn rising_edge(&mut self) {
        if self.pulses == 0 {
            if let Some(next) = self.pending.pop_front() {
                self.current = next;
            }
        }
        self.pulses += 1;
        self.total_pulses += 1;
    }

    fn snapshot(&mut self) -> u8 {
        if self.clock_high {
            self.reads_while_high += 1;
        }
        if self.pulses > DATA_BITS {
            self.closed_frames.push(self.pulses);
            self.pulses = 0;
        }
        if self.pulses == 0 {
            // Between frames: DOUT low means a conversion is waiting.
            if self.stalled {
                return 0xFF;
            }
            if self.busy_polls > 0 {
                self.busy_polls -= 1;
                return 0xFF;
            }
            return 0x00;
        }
        let shift = DATA_BITS - self.pulses;
        self.current
            .iter()
            .enumerate()
            .filter(|(_, value)| (*value >> shift) & 1 == 1)
            .fold(0u8, |acc, (c, _)| acc | (1 << c))
    }
}

/// Eight simulated amplifiers on a shared clock line.
///
/// Without queued conversions the bus keeps repeating the last one, which
/// models a constant physical load.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSensorBus {
    state: Rc<RefCell<BusState>>,
}

impl SimulatedSensorBus {
    /// Create a bus where every channel reads zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus that reports the same signed values on every conversion.
    pub fn with_constant(values: [i32; CHANNEL_COUNT]) -> Self {
        let bus = Self::new();
        bus.set_constant(values);
        bus
    }

    /// Clock pin driven by the driver under test.
    pub fn clock(&self) -> SimulatedClock {
        SimulatedClock {
            state: Rc::clone(&self.state),
        }
    }

    /// Data port read by the driver under test.
    pub fn port(&self) -> SimulatedPort {
        SimulatedPort {
            state: Rc::clone(&self.state),
        }
    }

    /// Replace the load on every channel; drops any queued conversions.
    pub fn set_constant(&self, values: [i32; CHANNEL_COUNT]) {
        let mut state = self.state.borrow_mut();
        state.pending.clear();
        state.current = values.map(encode_24);
    }

    /// Queue raw 24-bit patterns for the next conversion.
    pub fn push_conversion(&self, raw: Conversion) {
        self.state.borrow_mut().pending.push_back(raw);
    }

    /// Report "not ready" for the next `polls` reads of the ready line.
    pub fn hold_busy(&self, polls: u32) {
        self.state.borrow_mut().busy_polls = polls;
    }

    /// Keep the ready line high forever (disconnected channel 0).
    pub fn stall(&self, stalled: bool) {
        self.state.borrow_mut().stalled = stalled;
    }

    /// Pulse count of every frame so far, including an unfinished last one.
    pub fn frame_pulse_counts(&self) -> Vec<u32> {
        let state = self.state.borrow();
        let mut frames = state.closed_frames.clone();
        if state.pulses > 0 {
            frames.push(state.pulses);
        }
        frames
    }

    /// Total rising edges seen on the clock line.
    pub fn total_pulses(&self) -> u32 {
        self.state.borrow().total_pulses
    }

    /// Port reads taken while the clock was high (protocol violations).
    pub fn reads_while_clock_high(&self) -> u32 {
        self.state.borrow().reads_while_high
    }

    /// Current clock line level.
    pub fn clock_is_high(&self) -> bool {
        self.state.borrow().clock_high
    }
}

/// Clock line handle of a [`SimulatedSensorBus`].
#[derive(Debug)]
pub struct SimulatedClock {
    state: Rc<RefCell<BusState>>,
}

impl embedded_hal::digital::ErrorType for SimulatedClock {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for SimulatedClock {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if !state.clock_high {
            state.clock_high = true;
            state.rising_edge();
        }
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().clock_high = false;
        Ok(())
    }
}

/// Data port handle of a [`SimulatedSensorBus`].
#[derive(Debug)]
pub struct SimulatedPort {
    state: Rc<RefCell<BusState>>,
}

impl ParallelPort for SimulatedPort {
    type Error = Infallible;

    fn read_port(&mut self) -> Result<u8, Self::Error> {
        Ok(self.state.borrow_mut().snapshot())
    }
}

/// Mock PWM bank: records all calls for test assertions.
#[derive(Debug, Default)]
pub struct MockPwmBank {
    enabled: bool,
    duties: [u16; CHANNEL_COUNT],
    history: Vec<[u16; CHANNEL_COUNT]>,
}

impl MockPwmBank {
    /// Create a disabled bank with all duties at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`PwmBank::enable_all`] has been called.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Duties from the most recent batch.
    pub fn duties(&self) -> [u16; CHANNEL_COUNT] {
        self.duties
    }

    /// Every batch written, oldest first.
    pub fn history(&self) -> &[[u16; CHANNEL_COUNT]] {
        &self.history
    }

    /// Number of batches written.
    pub fn write_count(&self) -> usize {
        self.history.len()
    }
}

impl PwmBank for MockPwmBank {
    type Error = Infallible;

    fn enable_all(&mut self) -> Result<(), Self::Error> {
        self.enabled = true;
        Ok(())
    }

    fn apply(&mut self, duties: &[u16; CHANNEL_COUNT]) -> Result<(), Self::Error> {
        self.duties = *duties;
        self.history.push(*duties);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use embedded_hal::digital::OutputPin;

    fn pulse(clock: &mut SimulatedClock) {
        clock.set_high().unwrap();
        clock.set_low().unwrap();
    }

    #[test]
    fn idle_bus_reports_ready() {
        let bus = SimulatedSensorBus::new();
        assert_eq!(bus.port().read_port().unwrap(), 0x00);
    }

    #[test]
    fn busy_polls_then_ready() {
        let bus = SimulatedSensorBus::new();
        bus.hold_busy(2);
        let mut port = bus.port();
        assert_eq!(port.read_port().unwrap(), 0xFF);
        assert_eq!(port.read_port().unwrap(), 0xFF);
        assert_eq!(port.read_port().unwrap(), 0x00);
    }

    #[test]
    fn shifts_msb_first() {
        let bus = SimulatedSensorBus::new();
        let mut raw = [0u32; CHANNEL_COUNT];
        raw[1] = 0x80_0001;
        bus.push_conversion(raw);
        let (mut clock, mut port) = (bus.clock(), bus.port());

        pulse(&mut clock);
        assert_eq!(port.read_port().unwrap(), 0b0000_0010);
        for _ in 0..22 {
            pulse(&mut clock);
            assert_eq!(port.read_port().unwrap(), 0);
        }
        pulse(&mut clock);
        assert_eq!(port.read_port().unwrap(), 0b0000_0010);
    }

    #[test]
    fn frames_close_on_next_ready_poll() {
        let bus = SimulatedSensorBus::new();
        let (mut clock, mut port) = (bus.clock(), bus.port());
        for _ in 0..25 {
            pulse(&mut clock);
        }
        assert_eq!(bus.frame_pulse_counts(), vec![25]);
        port.read_port().unwrap();
        for _ in 0..27 {
            pulse(&mut clock);
        }
        assert_eq!(bus.frame_pulse_counts(), vec![25, 27]);
        assert_eq!(bus.total_pulses(), 52);
    }

    #[test]
    fn repeated_set_high_is_one_edge() {
        let bus = SimulatedSensorBus::new();
        let mut clock = bus.clock();
        clock.set_high().unwrap();
        clock.set_high().unwrap();
        assert_eq!(bus.total_pulses(), 1);
        assert!(bus.clock_is_high());
    }

    #[test]
    fn encode_24_masks_sign() {
        assert_eq!(encode_24(-1), 0xFF_FFFF);
        assert_eq!(encode_24(1), 1);
        assert_eq!(encode_24(-8_388_608), 0x80_0000);
    }

    #[test]
    fn mock_pwm_records_batches() {
        let mut pwm = MockPwmBank::new();
        assert!(!pwm.is_enabled());
        pwm.enable_all().unwrap();
        pwm.apply(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert!(pwm.is_enabled());
        assert_eq!(pwm.duties(), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(pwm.write_count(), 1);
    }
}
