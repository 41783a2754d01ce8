//! Parallel digital input abstraction
//!
//! The eight sensor data lines are wired to one GPIO port so that a single
//! register read captures all of them on the same instant. Reading the pins
//! one by one would skew the channels against each other by several
//! instructions per bit, so the capability is a whole-port snapshot rather
//! than eight `InputPin`s.

/// Eight input lines sampled together.
///
/// Bit `c` of the snapshot is the level of the line for channel `c`
/// (1 = high). Implementations must read every line in one access.
pub trait ParallelPort {
    /// Error type
    type Error: core::fmt::Debug;

    /// Read all eight lines at once.
    fn read_port(&mut self) -> Result<u8, Self::Error>;
}

impl<P: ParallelPort + ?Sized> ParallelPort for &mut P {
    type Error = P::Error;

    fn read_port(&mut self) -> Result<u8, Self::Error> {
        P::read_port(self)
    }
}
