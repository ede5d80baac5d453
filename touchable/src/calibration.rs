//! Baseline capture.
//!
//! The first charge cycle on a freshly configured channel returns far too
//! quickly, so calibration runs one cycle and throws it away before capturing
//! the real baseline. The cause is unknown (residual charge is one guess); the
//! extra cycle is simply required.

use crate::measurement::{ChannelId, ChargeMeasurement};
use crate::state::SensorState;
use crate::{timing, Error, Lifecycle, SensorConfig};

/// Run one cycle on `channel` to full completion.
///
/// Returns the elapsed time and raw magnitude, or [`Error::MeasurementTimeout`]
/// if the scan is still running after `timeout_us`.
pub fn read_to_completion<M: ChargeMeasurement>(
    sensor: &mut M,
    channel: ChannelId,
    timeout_us: u32,
) -> Result<(u32, u16), Error> {
    let start = sensor.now();
    sensor.begin_charge(channel);
    while sensor.scan_in_progress(channel) {
        if timing::reached(start, sensor.now(), timeout_us) {
            error!("touch channel {:?}: no completion after {} us", channel, timeout_us);
            return Err(Error::MeasurementTimeout);
        }
    }
    let magnitude = sensor.read_raw(channel);
    Ok((timing::elapsed(start, sensor.now()), magnitude))
}

/// Capture the untouched baseline of the bound channel and derive the detection deadline.
///
/// The channel must not be touched while this runs. On success the sensor is
/// ready and the baseline duration is returned. On any failure the sensor is left
/// uninitialized; retrying is up to the caller.
pub fn calibrate<M: ChargeMeasurement>(
    state: &mut SensorState,
    sensor: &mut M,
    config: &SensorConfig,
) -> Result<u32, Error> {
    let channel = state.binding.channel()?;

    state.invalidate();
    state.lifecycle = Lifecycle::Calibrating;

    match capture(sensor, channel, config.calibration_timeout_us) {
        Ok((duration, magnitude)) => {
            state.set_baseline(duration, magnitude);
            debug!(
                "touch channel {:?} calibrated: baseline {} us (raw {}), deadline {} us",
                channel, duration, magnitude, state.detection_deadline
            );
            Ok(duration)
        }
        Err(e) => {
            state.lifecycle = Lifecycle::Uninitialized;
            Err(e)
        }
    }
}

fn capture<M: ChargeMeasurement>(sensor: &mut M, channel: ChannelId, timeout_us: u32) -> Result<(u32, u16), Error> {
    let (discarded, _) = read_to_completion(sensor, channel, timeout_us)?;
    trace!("touch channel {:?}: discarded first cycle of {} us", channel, discarded);

    let (duration, magnitude) = read_to_completion(sensor, channel, timeout_us)?;

    // A zero or oversized interval means the clock wrapped or jumped mid cycle
    if duration == 0 || duration > timeout_us {
        warn!("touch channel {:?}: implausible baseline of {} us", channel, duration);
        return Err(Error::CalibrationRollover);
    }
    Ok((duration, magnitude))
}
