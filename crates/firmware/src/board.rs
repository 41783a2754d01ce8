//! STM32F103C8 board wiring
//!
//! | Signal        | Pin(s)             | Peripheral          |
//! |---------------|--------------------|---------------------|
//! | DOUT0..DOUT7  | PB8..PB15          | GPIOB inputs        |
//! | PD_SCK        | PA9                | GPIO output         |
//! | valve 0..3    | PA0, PA1, PA2, PA3 | TIM2 CH1..CH4       |
//! | valve 4..7    | PA6, PA7, PB0, PB1 | TIM3 CH1..CH4       |
//! | host TX / RX  | PB6 / PB7          | USART1 (AFIO remap) |
//!
//! TIM4 is taken by the embassy time driver.

use core::convert::Infallible;

use embassy_stm32::gpio::{AnyPin, Input};
use embassy_stm32::peripherals::{TIM2, TIM3};
use embassy_stm32::timer::simple_pwm::SimplePwm;
use embassy_stm32::timer::Channel as TimerChannel;
use platform::pwm::scale_duty;
use platform::{ParallelPort, PwmBank, CHANNEL_COUNT};

/// First GPIOB line carrying a sensor data output (DOUT0 = PB8).
pub const DOUT_SHIFT: u32 = 8;

const TIMER_CHANNELS: [TimerChannel; 4] = [
    TimerChannel::Ch1,
    TimerChannel::Ch2,
    TimerChannel::Ch3,
    TimerChannel::Ch4,
];

/// The eight sensor data lines on PB8..PB15.
///
/// The pins are held as configured inputs; sampling reads the whole GPIOB
/// input register in one access so all eight lines come from the same instant.
pub struct SensorPort {
    _lines: [Input<'static, AnyPin>; CHANNEL_COUNT],
}

impl SensorPort {
    /// Take the eight configured input pins, DOUT0 first.
    pub fn new(lines: [Input<'static, AnyPin>; CHANNEL_COUNT]) -> Self {
        Self { _lines: lines }
    }
}

impl ParallelPort for SensorPort {
    type Error = Infallible;

    fn read_port(&mut self) -> Result<u8, Self::Error> {
        let idr = embassy_stm32::pac::GPIOB.idr().read().0;
        Ok((idr >> DOUT_SHIFT) as u8)
    }
}

/// Valve PWM outputs on TIM2 (valves 0-3) and TIM3 (valves 4-7).
pub struct ValvePwm {
    tim2: SimplePwm<'static, TIM2>,
    tim3: SimplePwm<'static, TIM3>,
}

impl ValvePwm {
    /// Combine the two configured timers.
    pub fn new(tim2: SimplePwm<'static, TIM2>, tim3: SimplePwm<'static, TIM3>) -> Self {
        Self { tim2, tim3 }
    }
}

impl PwmBank for ValvePwm {
    type Error = Infallible;

    fn enable_all(&mut self) -> Result<(), Self::Error> {
        for channel in TIMER_CHANNELS {
            self.tim2.enable(channel);
            self.tim3.enable(channel);
        }
        Ok(())
    }

    fn apply(&mut self, duties: &[u16; CHANNEL_COUNT]) -> Result<(), Self::Error> {
        let (first, second) = duties.split_at(TIMER_CHANNELS.len());

        let max = self.tim2.get_max_duty();
        for (&channel, &duty) in TIMER_CHANNELS.iter().zip(first) {
            self.tim2.set_duty(channel, scale_duty(duty, max));
        }

        let max = self.tim3.get_max_duty();
        for (&channel, &duty) in TIMER_CHANNELS.iter().zip(second) {
            self.tim3.set_duty(channel, scale_duty(duty, max));
        }
        Ok(())
    }
}
