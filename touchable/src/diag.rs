//! Diagnostics for tuning a touch pin by hand.
//!
//! A report compares a fresh early-exit reading and a full-completion reading
//! against the baseline, which is how a sensitivity factor is usually chosen.

use core::fmt::{self, Write};

use crate::calibration::read_to_completion;
use crate::detection::measure_once;
use crate::measurement::ChargeMeasurement;
use crate::state::{Measurement, SensorState};
use crate::{Error, Lifecycle, SensorConfig};

/// Enough room for a full report
pub const REPORT_CAPACITY: usize = 384;

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Report {
    pub pin: Option<u8>,
    pub lifecycle: Lifecycle,
    pub sensitivity_factor: f32,
    pub baseline_duration: u32,
    pub baseline_magnitude: u16,
    pub detection_deadline: u32,
    /// Early-exit reading taken for the report
    pub measurement: Measurement,
    /// Full-completion reading taken right after it
    pub full_duration: u32,
    pub full_magnitude: u16,
}

impl Report {
    /// Reading duration relative to the baseline
    pub fn duration_ratio(&self) -> f32 {
        ratio(self.measurement.duration, self.baseline_duration)
    }

    /// Reading magnitude relative to the baseline magnitude
    pub fn magnitude_ratio(&self) -> f32 {
        ratio(self.measurement.magnitude as u32, self.baseline_magnitude as u32)
    }

    /// Format into a fixed-capacity string for consoles without an allocator
    pub fn render<const N: usize>(&self) -> Result<heapless::String<N>, fmt::Error> {
        let mut out = heapless::String::new();
        write!(out, "{}", self)?;
        Ok(out)
    }
}

fn ratio(value: u32, base: u32) -> f32 {
    if base == 0 {
        0.0
    } else {
        value as f32 / base as f32
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pin {
            Some(pin) => write!(f, "pin {}", pin)?,
            None => f.write_str("no pin")?,
        }
        writeln!(f, " ({:?}, factor {:.2})", self.lifecycle, self.sensitivity_factor)?;

        let m = &self.measurement;
        if m.touched {
            writeln!(f, "  {} us TOUCHED", m.duration)?;
        } else {
            writeln!(f, "  {} us untouched, raw {}", m.duration, m.magnitude)?;
            writeln!(
                f,
                "  raw {} / base {} = {:.3}",
                m.magnitude,
                self.baseline_magnitude,
                self.magnitude_ratio()
            )?;
        }
        writeln!(
            f,
            "  {} us / base {} us = {:.3}, deadline {} us",
            m.duration,
            self.baseline_duration,
            self.duration_ratio(),
            self.detection_deadline
        )?;
        writeln!(f, "  full read: raw {} in {} us", self.full_magnitude, self.full_duration)
    }
}

/// Take a reading and a full-completion reading and report both against the baseline.
///
/// Records the reading as the last measurement but leaves the debounced verdict alone.
pub fn report<M: ChargeMeasurement>(
    state: &mut SensorState,
    sensor: &mut M,
    config: &SensorConfig,
) -> Result<Report, Error> {
    let measurement = measure_once(state, sensor)?;
    let channel = state.binding.channel()?;
    let (full_duration, full_magnitude) = read_to_completion(sensor, channel, config.calibration_timeout_us)?;

    let report = Report {
        pin: state.binding.pin(),
        lifecycle: state.lifecycle,
        sensitivity_factor: state.sensitivity_factor,
        baseline_duration: state.baseline_duration,
        baseline_magnitude: state.baseline_magnitude,
        detection_deadline: state.detection_deadline,
        measurement,
        full_duration,
        full_magnitude,
    };
    info!("{}", report);
    Ok(report)
}
