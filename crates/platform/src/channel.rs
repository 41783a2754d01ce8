//! Channel newtype shared by the sensor array and the valve bank.
//!
//! Both subsystems have exactly [`CHANNEL_COUNT`] channels. A [`Channel`] can
//! only hold `0..CHANNEL_COUNT`, so per-channel lookups never go out of range.
//! The same index refers to different physical devices in each subsystem:
//! channel 3 is transducer 3 on the sensor bus and valve 3 on the PWM bank.

/// Number of sensor channels and valve channels on the rig.
pub const CHANNEL_COUNT: usize = 8;

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

impl core::fmt::Display for OutOfRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "value {} outside {}..={}",
            self.value, self.min, self.max
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OutOfRangeError {}

// ── Channel ──────────────────────────────────────────────────────────────────

/// Index of one of the eight sensor/valve channels.
///
/// Wraps a `u8` with the invariant `value < CHANNEL_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Channel(u8);

impl Channel {
    /// Channel 0. Its data line doubles as the sensor bus "data ready" signal.
    pub const FIRST: Self = Self(0);

    /// Every channel, in index order.
    pub const ALL: [Self; CHANNEL_COUNT] = [
        Self(0),
        Self(1),
        Self(2),
        Self(3),
        Self(4),
        Self(5),
        Self(6),
        Self(7),
    ];

    /// Create a `Channel`, returning an error if `index >= CHANNEL_COUNT`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `index > 7`.
    pub fn try_new(index: u8) -> Result<Self, OutOfRangeError> {
        if usize::from(index) >= CHANNEL_COUNT {
            Err(OutOfRangeError {
                value: u32::from(index),
                min: 0,
                max: 7,
            })
        } else {
            Ok(Self(index))
        }
    }

    /// Zero-based channel index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Bit mask selecting this channel in an 8-line port snapshot.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // self.0 < 8 by construction
    pub const fn mask(self) -> u8 {
        1 << self.0
    }

    /// Level of this channel's line in a port snapshot (`true` = high).
    #[must_use]
    pub const fn line(self, snapshot: u8) -> bool {
        snapshot & self.mask() != 0
    }
}

impl TryFrom<u8> for Channel {
    type Error = OutOfRangeError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::try_new(index)
    }
}

impl From<Channel> for usize {
    fn from(channel: Channel) -> Self {
        channel.index()
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ch{}", self.0)
    }
}
