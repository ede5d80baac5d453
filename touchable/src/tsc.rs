//! Charge measurement on the STM32 Touch Sensing Controller.
//!
//! The controller is the same across several STM32 families. Creating a [`Tsc`]
//! takes the TSC registers directly instead of accepting a PAC peripheral, since
//! there is no way to make sure this crate and the application use the same PAC
//! version. Don't touch the TSC registers anywhere else while it is in use.
//!
//! Channel ids are `group << 4 | io`, see [`channel`]. One io per group is wired
//! to the sampling capacitor, set in [`Config::sample_ios`]. Build the pin map
//! from these ids; the Kinetis tables in [`crate::board`] use a different
//! numbering and every pin in them is rejected when bound.

#[cfg(feature = "stm32f0x1")]
use stm32f0::stm32f0x1 as pac;
#[cfg(feature = "stm32f303")]
use stm32f3::stm32f303 as pac;

use crate::measurement::{ChannelId, ChargeMeasurement};
use crate::timing::MicrosClock;

/// Groups with a count register
pub const GROUPS: usize = 6;
/// Io lines per group
pub const IOS: u8 = 4;

/// Channel id of io `io` (1 to 4) in group `group` (1 to 6)
pub const fn channel(group: u8, io: u8) -> ChannelId {
    assert!(group > 0 && group as usize <= GROUPS);
    assert!(io > 0 && io <= IOS);
    ChannelId((group << 4) | io)
}

fn split(channel: ChannelId) -> Option<(usize, u8)> {
    let group = (channel.0 >> 4) as usize;
    let io = channel.0 & 0xf;
    if group == 0 || group > GROUPS || io == 0 || io > IOS {
        None
    } else {
        Some((group, io))
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ClockPrescaler {
    Hclk = 0b000,
    HclkDiv2 = 0b001,
    HclkDiv4 = 0b010,
    HclkDiv8 = 0b011,
    HclkDiv16 = 0b100,
    HclkDiv32 = 0b101,
    HclkDiv64 = 0b110,
    HclkDiv128 = 0b111,
}

/// Charge transfers after which an acquisition gives up
#[derive(Clone, Copy, Debug)]
pub enum MaxCount {
    U255 = 0b000,
    U511 = 0b001,
    U1023 = 0b010,
    U2047 = 0b011,
    U4095 = 0b100,
    U8191 = 0b101,
    U16383 = 0b110,
}

impl MaxCount {
    pub fn to_count(&self) -> u16 {
        (256u16 << (*self as u8)) - 1
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub clock_prescale: ClockPrescaler,
    pub max_count: MaxCount,
    /// Charge transfer high time in TSC clock cycles, 1 to 16
    pub pulse_high: u8,
    /// Charge transfer low time in TSC clock cycles, 1 to 16
    pub pulse_low: u8,
    /// Io of each group wired to its sampling capacitor, 1 to 4, or 0 if the group is unused
    pub sample_ios: [u8; GROUPS],
}

impl Config {
    /// Defaults with no groups in use
    pub const fn new() -> Self {
        Self {
            clock_prescale: ClockPrescaler::HclkDiv16,
            max_count: MaxCount::U8191,
            pulse_high: 2,
            pulse_low: 2,
            sample_ios: [0; GROUPS],
        }
    }

    /// Use io `io` of `group` as that group's sampling capacitor
    pub const fn sample(mut self, group: u8, io: u8) -> Self {
        assert!(group > 0 && group as usize <= GROUPS);
        assert!(io > 0 && io <= IOS);
        self.sample_ios[group as usize - 1] = io;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Group and io of `channel` if its group has a sampling capacitor on another io
fn drivable(sample_ios: &[u8; GROUPS], channel: ChannelId) -> Option<(usize, u8)> {
    let (group, io) = split(channel)?;
    let sample = sample_ios[group - 1];
    if sample == 0 || sample == io {
        None
    } else {
        Some((group, io))
    }
}

fn pulse_bits(cycles: u8) -> u8 {
    cycles.clamp(1, 16) - 1
}

pub struct Tsc<C> {
    tsc: &'static pac::tsc::RegisterBlock,
    clock: C,
    max_count: u16,
    sample_ios: [u8; GROUPS],
    started: bool,
}

impl<C: MicrosClock> Tsc<C> {
    /// Enable and configure the controller. `clock` times the charge cycles.
    pub fn new(config: Config, clock: C) -> Self {
        // Enable the TSC periph clock
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.ahbenr.modify(|_, w| w.tscen().set_bit());
        rcc.ahbrstr.modify(|_, w| w.tscrst().set_bit());
        rcc.ahbrstr.modify(|_, w| w.tscrst().clear_bit());

        let tsc = unsafe { &*pac::TSC::ptr() };
        tsc.cr.write(|w| unsafe {
            w.ctph().bits(pulse_bits(config.pulse_high))
            .ctpl().bits(pulse_bits(config.pulse_low))
            .sse().set_bit()
            .ssd().bits(16)
            .pgpsc().bits(config.clock_prescale as u8)
            .mcv().bits(config.max_count as u8)
            .tsce().set_bit()
        });

        Self {
            tsc,
            clock,
            max_count: config.max_count.to_count(),
            sample_ios: config.sample_ios,
            started: false,
        }
    }

    /// Poll flags to see if acquisition has completed, normally or at max count
    fn is_finished(&self) -> bool {
        let isr = self.tsc.isr.read();
        isr.eoaf().bit_is_set() || isr.mcef().bit_is_set()
    }

    fn clear_flags(&mut self) {
        self.tsc.icr.write(|w| {
            w.eoaic().set_bit() // end-of-acquisition
            .mceic().set_bit() // max-count-error
        });
    }

    /// Count of the last acquisition on `group` (1 to 6), or max count + 1 if it
    /// never reached the charge threshold
    fn read_group(&self, group: usize) -> u16 {
        let group_status = self.tsc.iogcsr.read().bits() >> 16;

        if group_status & (1 << (group - 1)) == 0 {
            self.max_count + 1
        } else {
            match group {
                1 => self.tsc.iog1cr.read().cnt().bits(),
                2 => self.tsc.iog2cr.read().cnt().bits(),
                3 => self.tsc.iog3cr.read().cnt().bits(),
                4 => self.tsc.iog4cr.read().cnt().bits(),
                5 => self.tsc.iog5cr.read().cnt().bits(),
                _ => self.tsc.iog6cr.read().cnt().bits(),
            }
        }
    }
}

impl<C: MicrosClock> ChargeMeasurement for Tsc<C> {
    fn begin_charge(&mut self, channel: ChannelId) {
        self.started = false;
        let (group, io) = match drivable(&self.sample_ios, channel) {
            Some(gi) => gi,
            None => {
                warn!("tsc: {:?} cannot be driven, no acquisition started", channel);
                return;
            }
        };
        let sample = self.sample_ios[group - 1];

        let shift = (group - 1) * IOS as usize;
        self.tsc.iogcsr.write(|w| unsafe { w.bits(1 << (group - 1)) });
        self.tsc.ioscr.write(|w| unsafe { w.bits(1 << (shift + sample as usize - 1)) });
        self.tsc.ioccr.write(|w| unsafe { w.bits(1 << (shift + io as usize - 1)) });

        self.clear_flags();
        self.tsc.cr.modify(|_, w| w.iodef().clear_bit());
        self.tsc.cr.modify(|_, w| w.start().set_bit());
        self.started = true;
    }

    /// An acquisition that was never started never completes
    fn scan_in_progress(&mut self, _channel: ChannelId) -> bool {
        !self.started || !self.is_finished()
    }

    fn read_raw(&mut self, channel: ChannelId) -> u16 {
        match split(channel) {
            Some((group, _)) if self.started && self.is_finished() => self.read_group(group),
            _ => 0,
        }
    }

    fn now(&mut self) -> u32 {
        self.clock.now()
    }

    fn supports(&self, channel: ChannelId) -> bool {
        drivable(&self.sample_ios, channel).is_some()
    }
}
