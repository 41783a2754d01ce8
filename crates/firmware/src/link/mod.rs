//! Host link glue
//!
//! The command receiver and the acquisition loop run in different contexts.
//! Valve commands go straight into [`ValveCommands`]; a tare has to run on the
//! acquisition side, so it is handed over through [`LinkFlags`] together with
//! the acknowledgement the host waits for.
//!
//! ```text
//! UART RX ─▶ CommandAssembler ─▶ dispatch ─┬─▶ ValveCommands (VCMD)
//!                                          └─▶ LinkFlags::request_tare (CALB)
//!
//! acquisition loop: read ─▶ service_tare ─▶ telemetry ─▶ UART TX (+ ACK!)
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use platform::{ParallelPort, CHANNEL_COUNT};
use protocol::{Command, ProtocolError, TelemetryFrame};

use crate::sensing::{AcquisitionError, Hx711Array};
use crate::valves::ValveCommands;

/// One-shot requests from the command receiver to the acquisition loop.
///
/// Each flag is consumed with a swap, so a request raised twice before the
/// loop gets to it is served once.
#[derive(Debug, Default)]
pub struct LinkFlags {
    tare_requested: AtomicBool,
    ack_pending: AtomicBool,
}

impl LinkFlags {
    /// No requests pending.
    pub const fn new() -> Self {
        Self {
            tare_requested: AtomicBool::new(false),
            ack_pending: AtomicBool::new(false),
        }
    }

    /// Ask the acquisition loop to re-zero all channels.
    pub fn request_tare(&self) {
        self.tare_requested.store(true, Ordering::Release);
    }

    /// Consume a pending tare request.
    pub fn take_tare_request(&self) -> bool {
        self.tare_requested.swap(false, Ordering::Acquire)
    }

    /// Ask for an `ACK!` to be sent after the next telemetry frame.
    pub fn queue_ack(&self) {
        self.ack_pending.store(true, Ordering::Release);
    }

    /// Consume a pending acknowledgement.
    pub fn take_ack(&self) -> bool {
        self.ack_pending.swap(false, Ordering::Acquire)
    }
}

/// What [`dispatch`] did with a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// Valve actions applied; acknowledgement queued.
    Applied,
    /// Tare handed to the acquisition loop; it acknowledges when done.
    TareRequested,
    /// Frame rejected; no acknowledgement.
    Rejected(ProtocolError),
}

/// Act on one frame from the [`protocol::CommandAssembler`].
pub fn dispatch(
    frame: Result<Command, ProtocolError>,
    valves: &ValveCommands,
    flags: &LinkFlags,
) -> Dispatch {
    match frame {
        Ok(Command::SetValves(actions)) => {
            valves.apply(&actions);
            flags.queue_ack();
            #[cfg(feature = "defmt")]
            defmt::debug!("valves now {=u8:b}", valves.state_bits());
            Dispatch::Applied
        }
        Ok(Command::Calibrate) => {
            flags.request_tare();
            Dispatch::TareRequested
        }
        Err(error) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("host frame rejected: {}", error);
            Dispatch::Rejected(error)
        }
    }
}

/// Run a requested tare, if any, and queue its acknowledgement.
///
/// Every read of the tare is bounded by `timeout_us`, so a stalled bus ends
/// the tare with [`AcquisitionError::Timeout`] and the loop keeps serving
/// acknowledgements. Returns whether a tare ran. A failed tare keeps the old
/// offsets, consumes the request and is not acknowledged.
pub fn service_tare<C, P, E, D>(
    array: &mut Hx711Array<C, P>,
    flags: &LinkFlags,
    delay: &mut D,
    timeout_us: u32,
) -> Result<bool, AcquisitionError<E>>
where
    C: OutputPin<Error = E>,
    P: ParallelPort<Error = E>,
    D: DelayNs,
{
    if !flags.take_tare_request() {
        return Ok(false);
    }
    array.zero_with_timeout(delay, timeout_us)?;
    flags.queue_ack();
    Ok(true)
}

/// Telemetry frame for the current pressures and valve commands.
pub fn telemetry(pressures_kpa: [f32; CHANNEL_COUNT], valves: &ValveCommands) -> TelemetryFrame {
    TelemetryFrame {
        pressures_kpa,
        valve_bits: valves.state_bits(),
    }
}
