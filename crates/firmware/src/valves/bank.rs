use platform::{Channel, PwmBank, CHANNEL_COUNT, DUTY_OFF};

use super::{ValveCommands, ValvePhase, HIT_TICKS};

/// Eight valves driven from one PWM bank.
///
/// Keeps a per-channel on-time counter that [`tick`](Self::tick) advances once
/// per period. The counter saturates at [`HIT_TICKS`]: once a valve is holding
/// there is nothing more to count.
#[derive(Debug)]
pub struct ValveBank<B> {
    pwm: B,
    elapsed: [u16; CHANNEL_COUNT],
    phases: [ValvePhase; CHANNEL_COUNT],
    initialized: bool,
}

impl<B: PwmBank> ValveBank<B> {
    /// Wrap a PWM bank. Nothing is written until [`init`](Self::init).
    pub const fn new(pwm: B) -> Self {
        Self {
            pwm,
            elapsed: [0; CHANNEL_COUNT],
            phases: [ValvePhase::Off; CHANNEL_COUNT],
            initialized: false,
        }
    }

    /// Reset every counter, program all duties to off and start the PWM
    /// outputs.
    pub fn init(&mut self) -> Result<(), B::Error> {
        self.elapsed = [0; CHANNEL_COUNT];
        self.phases = [ValvePhase::Off; CHANNEL_COUNT];
        self.pwm.apply(&[DUTY_OFF; CHANNEL_COUNT])?;
        self.pwm.enable_all()?;
        self.initialized = true;
        #[cfg(feature = "defmt")]
        defmt::info!("valve bank enabled, {=u16} ms hit", HIT_TICKS);
        Ok(())
    }

    /// Advance one period.
    ///
    /// The phase for this period comes from the on-time accumulated before it,
    /// so a newly commanded valve gets exactly [`HIT_TICKS`] periods of full
    /// drive. Commanded valves then count up towards [`HIT_TICKS`]; released
    /// valves reset to zero in the same tick. All eight duties are written as
    /// one batch. Before [`init`](Self::init) this does nothing.
    pub fn tick(&mut self, commands: &ValveCommands) -> Result<(), B::Error> {
        if !self.initialized {
            return Ok(());
        }
        let commanded = commands.snapshot();
        for ((elapsed, phase), on) in self
            .elapsed
            .iter_mut()
            .zip(self.phases.iter_mut())
            .zip(commanded)
        {
            *phase = ValvePhase::from_state(on, *elapsed);
            *elapsed = if on {
                elapsed.saturating_add(1).min(HIT_TICKS)
            } else {
                0
            };
        }
        let duties = self.duties();
        self.pwm.apply(&duties)
    }

    /// Whether [`init`](Self::init) has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Phase `channel` was driven in by the last tick.
    #[allow(clippy::indexing_slicing)] // Safety: Channel::index() < CHANNEL_COUNT
    pub fn phase(&self, channel: Channel) -> ValvePhase {
        self.phases[channel.index()]
    }

    /// On-time of `channel` in ticks, saturated at [`HIT_TICKS`].
    #[allow(clippy::indexing_slicing)] // Safety: Channel::index() < CHANNEL_COUNT
    pub fn elapsed_ticks(&self, channel: Channel) -> u16 {
        self.elapsed[channel.index()]
    }

    /// Duties written by the last tick.
    pub fn duties(&self) -> [u16; CHANNEL_COUNT] {
        self.phases.map(ValvePhase::duty)
    }

    /// The underlying PWM bank.
    pub fn pwm(&self) -> &B {
        &self.pwm
    }

    /// Give back the PWM bank.
    pub fn release(self) -> B {
        self.pwm
    }
}
