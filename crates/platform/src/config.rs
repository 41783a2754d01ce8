//! Board configuration and constants
//!
//! Everything here is fixed at compile time. The firmware has no persistent
//! settings; changing the rig means changing these values and reflashing.

/// The application name
pub const APP_NAME: &str = "Pneumatic Rig Controller";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── Valve timing ─────────────────────────────────────────────────────────────

/// Rate of the valve tick, in Hz. One tick = 1 ms.
pub const VALVE_TICK_HZ: u32 = 1_000;

/// Valve PWM carrier frequency, in Hz.
pub const VALVE_PWM_HZ: u32 = 1_000;

// ── Sensor front-end ─────────────────────────────────────────────────────────

/// Measured excitation (AVDD) of the load-cell amplifiers, in volts.
pub const EXCITATION_VOLTS: f32 = 4.299;

/// Excitation at which the amplifier's full-scale input range is specified.
pub const RATED_EXCITATION_VOLTS: f32 = 5.0;

/// Number of reads averaged by a tare.
pub const ZERO_SAMPLES: u32 = 64;

/// Upper bound for one conversion when waiting with a timeout, in µs.
///
/// The amplifiers run at 10 SPS (100 ms per conversion) with RATE tied low;
/// this allows one and a half periods.
pub const READY_TIMEOUT_US: u32 = 150_000;

// ── Host link ────────────────────────────────────────────────────────────────

/// UART baud rate of the host link.
pub const HOST_BAUD_RATE: u32 = 115_200;

/// Startup banner
pub const fn banner() -> &'static str {
    "Pneumatic Rig Controller - 8ch HX711 / 8 valve"
}
