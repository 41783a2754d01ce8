//! Hardware Abstraction Layer (HAL) for the pneumatic rig controller
//!
//! This crate provides the trait-based capabilities the control code is written
//! against, so the acquisition and valve logic can be developed and tested
//! without the rig attached.
//!
//! # Architecture Layers
//!
//! ```text
//! Firmware binary (embassy-stm32 wiring, executors)
//!         ↓
//! Control layer (firmware::sensing, firmware::valves, firmware::link)
//!         ↓
//! Platform HAL (this crate - capabilities + board constants)
//!         ↓
//! Hardware Layer (Embassy HAL + PAC)
//! ```
//!
//! # Capabilities
//!
//! - [`ParallelPort`] - the 8 sensor data lines, read as one snapshot
//! - [`PwmBank`] - the 8 valve PWM compare registers
//! - the sensor clock line is a plain [`embedded_hal::digital::OutputPin`]
//!
//! # Features
//!
//! - `std`: host simulations in [`mocks`] and `std::error::Error` impls
//! - `defmt`: `defmt::Format` derives on all public types
//!
//! # Example
//!
//! ```
//! use platform::{Channel, ParallelPort};
//!
//! fn channel_zero_ready<P: ParallelPort>(port: &mut P) -> Result<bool, P::Error> {
//!     let snapshot = port.read_port()?;
//!     Ok(!Channel::FIRST.line(snapshot))
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)]
#![allow(clippy::doc_markdown)] // register and pin names in doc comments
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod channel;
pub mod config;
pub mod gpio;
pub mod pwm;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use channel::{Channel, OutOfRangeError, CHANNEL_COUNT};
pub use gpio::ParallelPort;
pub use pwm::{DutyCycleBank, PwmBank, DUTY_FULL, DUTY_OFF};
