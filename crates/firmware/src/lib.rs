//! Pneumatic Rig Controller Firmware
//!
//! Eight-channel pressure acquisition and eight-valve hit/hold actuation for an
//! STM32F103 controller board.
//!
//! # Architecture
//!
//! ```text
//! Firmware binary (main.rs, board) - executors, pins, timers, UART
//!         ↓
//! Control layer - sensing (HX711 array), valves (hit/hold bank), link
//!         ↓
//! Platform HAL (platform crate) + wire format (protocol crate)
//!         ↓
//! Embassy HAL (embassy-stm32)
//! ```
//!
//! The sensing and valve layers never see each other; the binary calls
//! acquisition from the thread-mode loop and ticks the valves from a 1 kHz
//! high-priority task.
//!
//! # Features
//!
//! - `hardware` - Build for the STM32F103C8 target (embassy, defmt, probe-rs)
//! - `std` - Host simulations and `std::error::Error` impls
//! - `defmt` - `defmt::Format` derives and log calls
//!
//! # Examples
//!
//! ```bash
//! cargo build --release --target thumbv7m-none-eabi --features hardware
//! cargo test -p firmware
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![warn(clippy::dbg_macro)]
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod link;
pub mod sensing;
pub mod valves;

#[cfg(feature = "hardware")]
pub mod board;

// Re-export key types
pub use link::LinkFlags;
pub use sensing::{AcquisitionError, Gain, Hx711Array};
pub use valves::{ValveBank, ValveCommands, ValvePhase};

pub use platform::Channel;
pub use protocol::ChannelAction;
