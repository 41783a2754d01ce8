//! Hit/hold valve actuation
//!
//! Each solenoid is pulled in at full duty for [`HIT_TICKS`] ticks, then held
//! at [`HOLD_DUTY`] for as long as it stays commanded. Dropping the command
//! switches the coil off on the next tick.
//!
//! ```text
//!            commanded                 elapsed == HIT_TICKS
//!   Off ───────────────▶ Hitting ───────────────────────────▶ Holding
//!    ▲                      │                                    │
//!    └──────────────────────┴──────── command cleared ◀──────────┘
//! ```

mod bank;
mod commands;

pub use bank::ValveBank;
pub use commands::ValveCommands;

use platform::{DUTY_FULL, DUTY_OFF};

/// Ticks at full duty after a valve is commanded on (1 tick = 1 ms).
pub const HIT_TICKS: u16 = 10;

/// Duty while pulling the armature in.
pub const HIT_DUTY: u16 = DUTY_FULL;

/// Duty while holding the armature (half scale).
pub const HOLD_DUTY: u16 = 0x8000;

/// Drive phase of one valve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValvePhase {
    /// Not commanded; coil off.
    Off,
    /// Commanded for fewer than [`HIT_TICKS`] ticks; full duty.
    Hitting,
    /// Commanded for [`HIT_TICKS`] ticks or more; hold duty.
    Holding,
}

impl ValvePhase {
    /// Phase of a valve given its command and elapsed on-time.
    pub const fn from_state(commanded: bool, elapsed_ticks: u16) -> Self {
        if !commanded {
            Self::Off
        } else if elapsed_ticks < HIT_TICKS {
            Self::Hitting
        } else {
            Self::Holding
        }
    }

    /// PWM duty for this phase.
    pub const fn duty(self) -> u16 {
        match self {
            Self::Off => DUTY_OFF,
            Self::Hitting => HIT_DUTY,
            Self::Holding => HOLD_DUTY,
        }
    }
}
