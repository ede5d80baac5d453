use crate::measurement::ChannelId;
use crate::{valid_factor, Error, Lifecycle, DEFAULT_SENSITIVITY_FACTOR};

/// Result of a single charge/measure cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Raw count read from the channel, zero if the cycle ended at the deadline
    pub magnitude: u16,
    /// Time from starting the cycle until it completed or hit the deadline, in microseconds
    pub duration: u32,
    /// The duration reached the detection deadline
    pub touched: bool,
}

/// What the sensor is attached to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelBinding {
    Unbound,
    /// A pin was requested but it has no sensing channel
    Unmapped(u8),
    Bound { pin: u8, channel: ChannelId },
}

impl ChannelBinding {
    pub fn pin(&self) -> Option<u8> {
        match *self {
            ChannelBinding::Unbound => None,
            ChannelBinding::Unmapped(pin) => Some(pin),
            ChannelBinding::Bound { pin, .. } => Some(pin),
        }
    }

    /// The channel to measure, or the reason there is none
    pub fn channel(&self) -> Result<ChannelId, Error> {
        match *self {
            ChannelBinding::Unbound => Err(Error::NoChannel),
            ChannelBinding::Unmapped(pin) => Err(Error::UnmappedChannel(pin)),
            ChannelBinding::Bound { channel, .. } => Ok(channel),
        }
    }
}

/// Calibration and measurement state of one sensing channel.
///
/// Only the calibration and detection engines change it. Everything else reads
/// it through the accessors.
#[derive(Clone, Copy, Debug)]
pub struct SensorState {
    pub(crate) binding: ChannelBinding,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) sensitivity_factor: f32,
    pub(crate) baseline_duration: u32,
    pub(crate) baseline_magnitude: u16,
    pub(crate) detection_deadline: u32,
    pub(crate) last: Measurement,
    pub(crate) touched_confirmed: bool,
}

impl SensorState {
    pub const fn new(sensitivity_factor: f32) -> Self {
        Self {
            binding: ChannelBinding::Unbound,
            lifecycle: Lifecycle::Uninitialized,
            sensitivity_factor,
            baseline_duration: 0,
            baseline_magnitude: 0,
            detection_deadline: 0,
            last: Measurement { magnitude: 0, duration: 0, touched: false },
            touched_confirmed: false,
        }
    }

    pub fn binding(&self) -> ChannelBinding {
        self.binding
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    pub fn sensitivity_factor(&self) -> f32 {
        self.sensitivity_factor
    }

    /// Untouched charge time in microseconds, if calibrated
    pub fn baseline_duration(&self) -> Option<u32> {
        self.is_ready().then_some(self.baseline_duration)
    }

    /// Raw count read at the end of the baseline cycle, if calibrated
    pub fn baseline_magnitude(&self) -> Option<u16> {
        self.is_ready().then_some(self.baseline_magnitude)
    }

    /// Charge time in microseconds at or beyond which a cycle counts as touched, if calibrated
    pub fn detection_deadline(&self) -> Option<u32> {
        self.is_ready().then_some(self.detection_deadline)
    }

    pub fn last_measurement(&self) -> Measurement {
        self.last
    }

    /// The debounced verdict of the last touch query
    pub fn touched_confirmed(&self) -> bool {
        self.touched_confirmed
    }

    /// Attach to a new channel. Any previous calibration is void.
    pub(crate) fn rebind(&mut self, binding: ChannelBinding) {
        self.binding = binding;
        self.invalidate();
    }

    pub(crate) fn invalidate(&mut self) {
        self.lifecycle = Lifecycle::Uninitialized;
        self.touched_confirmed = false;
    }

    /// Store a fresh baseline and derive the deadline from it
    pub(crate) fn set_baseline(&mut self, duration: u32, magnitude: u16) {
        self.baseline_duration = duration;
        self.baseline_magnitude = magnitude;
        self.detection_deadline = scale_deadline(duration, self.sensitivity_factor);
        self.touched_confirmed = false;
        self.lifecycle = Lifecycle::Ready;
    }

    /// Change the factor, keeping the existing baseline.
    ///
    /// A rejected factor leaves the state untouched.
    pub(crate) fn set_sensitivity_factor(&mut self, factor: f32) -> Result<(), Error> {
        if !valid_factor(factor) {
            return Err(Error::InvalidSensitivityFactor);
        }
        self.sensitivity_factor = factor;
        self.detection_deadline = scale_deadline(self.baseline_duration, factor);
        Ok(())
    }
}

impl Default for SensorState {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY_FACTOR)
    }
}

/// `baseline * factor`, rounded to the nearest microsecond, at least 1 and
/// saturating at `u32::MAX`
pub fn scale_deadline(baseline: u32, factor: f32) -> u32 {
    // f32 would lose whole microseconds above 2^24
    let deadline = (baseline as f64 * factor as f64 + 0.5) as u32;
    // A zero deadline would read every cycle as touched
    deadline.max(1)
}
