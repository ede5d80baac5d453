//! Calibrated, debounced touch detection for a single capacitive sensing channel.
//!
//! A channel is calibrated once while untouched to get its baseline charge time.
//! The baseline multiplied by a sensitivity factor gives a detection deadline, and
//! every later measurement ends as soon as the charge completes or the deadline
//! passes, whichever comes first. A measurement that runs into the deadline is a
//! raw touch, and two raw touches in a row make a confirmed touch.
//!
//! The hardware is reached only through the [`ChargeMeasurement`] trait.

#![allow(dead_code)]
#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate log;

pub mod board;
pub mod calibration;
pub mod detection;
pub mod diag;
pub mod error;
pub mod measurement;
pub mod pin;
pub mod state;
pub mod timing;
#[cfg(any(feature = "stm32f0x1", feature = "stm32f303"))]
pub mod tsc;

#[cfg(test)]
pub mod sim;

pub use error::Error;
pub use measurement::{ChannelId, ChannelMap, ChargeMeasurement};
pub use pin::TouchablePin;
pub use state::{ChannelBinding, Measurement, SensorState};

/// Lifecycle of a sensor instance
///
/// There is no touched/untouched state here: touch is derived fresh on every query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lifecycle {
    Uninitialized,
    Calibrating,
    Ready,
}

/// Configuration for a touch sensor
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    /// Multiplier applied to the untouched baseline duration to get the detection deadline.
    /// Smaller values detect a touch sooner but give more false positives.
    pub sensitivity_factor: f32,
    /// Upper bound in microseconds on any wait for a charge cycle to fully complete.
    /// Also the largest baseline accepted as plausible.
    pub calibration_timeout_us: u32,
}

impl SensorConfig {
    const fn default() -> Self {
        Self {
            sensitivity_factor: DEFAULT_SENSITIVITY_FACTOR,
            calibration_timeout_us: 100_000,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        DEFAULT_SENSOR_CONFIG
    }
}

pub const DEFAULT_SENSITIVITY_FACTOR: f32 = 1.3;
pub const DEFAULT_SENSOR_CONFIG: SensorConfig = SensorConfig::default();

/// Returns true if `factor` can be used as a sensitivity factor
pub fn valid_factor(factor: f32) -> bool {
    factor.is_finite() && factor > 0.0
}
