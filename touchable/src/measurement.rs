//! The charge/measure primitive and the pin to channel mapping.

use crate::Error;

/// Marks a pin with no sensing channel in a [`ChannelMap`] table
pub const NO_CHANNEL: u8 = 255;

/// Opaque identifier of a physical sensing channel. Its meaning belongs to the
/// [`ChargeMeasurement`] implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(pub u8);

/// One physical charge/measure cycle on a sensing channel.
///
/// Only one cycle may be in flight per channel. The caller guarantees this by
/// issuing calls strictly in sequence.
pub trait ChargeMeasurement {
    /// Start a charge/measure cycle on `channel`
    fn begin_charge(&mut self, channel: ChannelId);

    /// Returns true while the cycle is still accumulating
    fn scan_in_progress(&mut self, channel: ChannelId) -> bool;

    /// Raw magnitude of the last cycle. Only meaningful once the scan is no longer
    /// in progress; after an early exit the value is hardware defined, usually zero.
    fn read_raw(&mut self, channel: ChannelId) -> u16;

    /// Free-running microsecond counter, wrapping at `u32::MAX`
    fn now(&mut self) -> u32;

    /// Returns false for a channel this hardware cannot drive. Checked when a pin
    /// is bound, so no cycle is ever started on such a channel.
    fn supports(&self, _channel: ChannelId) -> bool {
        true
    }
}

impl<T: ChargeMeasurement + ?Sized> ChargeMeasurement for &mut T {
    fn begin_charge(&mut self, channel: ChannelId) {
        (**self).begin_charge(channel)
    }

    fn scan_in_progress(&mut self, channel: ChannelId) -> bool {
        (**self).scan_in_progress(channel)
    }

    fn read_raw(&mut self, channel: ChannelId) -> u16 {
        (**self).read_raw(channel)
    }

    fn now(&mut self) -> u32 {
        (**self).now()
    }

    fn supports(&self, channel: ChannelId) -> bool {
        (**self).supports(channel)
    }
}

/// Static mapping from logical pin number to physical channel.
///
/// Entry `n` holds the channel of pin `n`, or [`NO_CHANNEL`].
#[derive(Clone, Copy, Debug)]
pub struct ChannelMap {
    table: &'static [u8],
}

impl ChannelMap {
    pub const fn new(table: &'static [u8]) -> Self {
        Self { table }
    }

    /// Resolve a pin, failing for pins past the end of the table or without a channel
    pub fn lookup(&self, pin: u8) -> Result<ChannelId, Error> {
        match self.table.get(pin as usize) {
            Some(&ch) if ch != NO_CHANNEL => Ok(ChannelId(ch)),
            _ => Err(Error::UnmappedChannel(pin)),
        }
    }

    /// Iterate over the pins that have a channel
    pub fn touch_pins(&self) -> impl Iterator<Item = (u8, ChannelId)> + '_ {
        self.table
            .iter()
            .enumerate()
            .filter(|&(_, &ch)| ch != NO_CHANNEL)
            .map(|(pin, &ch)| (pin as u8, ChannelId(ch)))
    }
}
