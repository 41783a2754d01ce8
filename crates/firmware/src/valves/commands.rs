use core::sync::atomic::{AtomicBool, Ordering};

use platform::{Channel, CHANNEL_COUNT};
use protocol::ChannelAction;

/// Commanded on/off state of every valve.
///
/// Written by the command receiver, read by the valve tick. Each channel is one
/// atomic flag, so a reader sees either the old or the new value of a channel,
/// never a mix. Updates to different channels are not ordered with each other.
#[derive(Debug)]
pub struct ValveCommands {
    lines: [AtomicBool; CHANNEL_COUNT],
}

impl Default for ValveCommands {
    fn default() -> Self {
        Self::new()
    }
}

impl ValveCommands {
    /// All valves off.
    pub const fn new() -> Self {
        Self {
            lines: [
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
            ],
        }
    }

    #[allow(clippy::indexing_slicing)] // Safety: Channel::index() < CHANNEL_COUNT
    fn line(&self, channel: Channel) -> &AtomicBool {
        &self.lines[channel.index()]
    }

    /// Command `channel` on.
    pub fn set(&self, channel: Channel) {
        self.line(channel).store(true, Ordering::Relaxed);
    }

    /// Command `channel` off.
    pub fn clear(&self, channel: Channel) {
        self.line(channel).store(false, Ordering::Relaxed);
    }

    /// Invert the command for `channel`.
    pub fn toggle(&self, channel: Channel) {
        self.line(channel).fetch_xor(true, Ordering::Relaxed);
    }

    /// Command every valve off.
    pub fn clear_all(&self) {
        for line in &self.lines {
            line.store(false, Ordering::Relaxed);
        }
    }

    /// Whether `channel` is commanded on.
    pub fn is_commanded(&self, channel: Channel) -> bool {
        self.line(channel).load(Ordering::Relaxed)
    }

    /// Every channel's command, in channel order.
    pub fn snapshot(&self) -> [bool; CHANNEL_COUNT] {
        Channel::ALL.map(|channel| self.is_commanded(channel))
    }

    /// Commands packed into a byte, bit `c` for channel `c`.
    pub fn state_bits(&self) -> u8 {
        Channel::ALL
            .iter()
            .filter(|channel| self.is_commanded(**channel))
            .fold(0, |bits, channel| bits | channel.mask())
    }

    /// Apply one host action per channel.
    pub fn apply(&self, actions: &[ChannelAction; CHANNEL_COUNT]) {
        for (channel, action) in Channel::ALL.into_iter().zip(actions) {
            match action {
                ChannelAction::Nop => {}
                ChannelAction::Set => self.set(channel),
                ChannelAction::Reset => self.clear(channel),
                ChannelAction::Toggle => self.toggle(channel),
            }
        }
    }
}
