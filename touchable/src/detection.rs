//! Touch detection with an early-exit deadline and two-read debounce.
//!
//! A touched channel charges slower, so a cycle does not have to run to
//! completion: once it has taken as long as the detection deadline the answer
//! is already known and the wait ends.

use crate::measurement::ChargeMeasurement;
use crate::state::{Measurement, SensorState};
use crate::{timing, Error};

/// Run one raw measurement cycle and record it as the last measurement.
///
/// Waits until the cycle completes or the detection deadline passes, whichever
/// comes first. Reaching the deadline means touched. The debounced verdict is not
/// changed.
pub fn measure_once<M: ChargeMeasurement>(state: &mut SensorState, sensor: &mut M) -> Result<Measurement, Error> {
    let channel = state.binding.channel()?;
    if !state.is_ready() {
        return Err(Error::NotCalibrated);
    }
    let deadline = state.detection_deadline;

    let start = sensor.now();
    if timing::straddles_rollover(start, deadline) {
        warn!("touch channel {:?}: deadline window crosses clock rollover at {}", channel, start);
    }

    sensor.begin_charge(channel);
    while sensor.scan_in_progress(channel) && !timing::reached(start, sensor.now(), deadline) {}

    let magnitude = sensor.read_raw(channel);
    let duration = timing::elapsed(start, sensor.now());
    let measurement = Measurement {
        magnitude,
        duration,
        touched: duration >= deadline,
    };
    trace!("touch channel {:?}: {} us >= {} us? raw {}", channel, duration, deadline, magnitude);

    state.last = measurement;
    Ok(measurement)
}

/// Debounced touch query.
///
/// An untouched first read answers immediately. A touched first read is only
/// confirmed by a second touched read right after it. Errors are returned, never
/// reported as untouched.
pub fn is_touched<M: ChargeMeasurement>(state: &mut SensorState, sensor: &mut M) -> Result<bool, Error> {
    let confirmed = match confirm(state, sensor) {
        Ok(confirmed) => confirmed,
        Err(e) => {
            state.touched_confirmed = false;
            return Err(e);
        }
    };
    state.touched_confirmed = confirmed;
    Ok(confirmed)
}

fn confirm<M: ChargeMeasurement>(state: &mut SensorState, sensor: &mut M) -> Result<bool, Error> {
    if !measure_once(state, sensor)?.touched {
        return Ok(false);
    }
    Ok(measure_once(state, sensor)?.touched)
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::measurement::ChannelId;
    use crate::sim::SimChannel;
    use crate::state::ChannelBinding;
    use crate::Lifecycle;

    const CH: ChannelId = ChannelId(4);

    /// Sensor calibrated to a 1000 us baseline, deadline 1300 us
    fn ready_state() -> SensorState {
        let mut state = SensorState::default();
        state.rebind(ChannelBinding::Bound { pin: 3, channel: CH });
        state.set_baseline(1000, 800);
        state
    }

    #[test]
    fn test_measure_untouched() {
        let mut state = ready_state();
        let mut sim = SimChannel::new(0, 1250, 812);

        let m = measure_once(&mut state, &mut sim).unwrap();
        assert_eq!(m, Measurement { magnitude: 812, duration: 1250, touched: false });
        assert_eq!(state.last_measurement(), m);
    }

    #[test]
    fn test_measure_early_exit() {
        let mut state = ready_state();
        let mut sim = SimChannel::new(0, 50_000, 2000);

        let m = measure_once(&mut state, &mut sim).unwrap();
        assert_eq!(m.duration, 1300, "Cycle was not cut short at the deadline");
        assert!(m.touched);
        assert_eq!(m.magnitude, 0);
        assert_eq!(sim.time(), 1300);
    }

    #[test]
    fn test_measure_completes_at_deadline() {
        let mut state = ready_state();
        let mut sim = SimChannel::new(0, 1300, 900);

        let m = measure_once(&mut state, &mut sim).unwrap();
        assert!(m.touched);
        assert_eq!(m.duration, 1300);
    }

    #[test]
    fn test_measure_across_rollover() {
        let mut state = ready_state();

        let mut sim = SimChannel::new(u32::MAX - 600, 1250, 812);
        let m = measure_once(&mut state, &mut sim).unwrap();
        assert_eq!(m.duration, 1250);
        assert!(!m.touched);

        let mut sim = SimChannel::new(u32::MAX - 600, 50_000, 0);
        let m = measure_once(&mut state, &mut sim).unwrap();
        assert_eq!(m.duration, 1300);
        assert!(m.touched);
        assert_eq!(sim.time(), 699);
    }

    #[test]
    fn test_measure_requires_calibration() {
        let mut sim = SimChannel::new(0, 1000, 800);

        let mut state = SensorState::default();
        assert_eq!(measure_once(&mut state, &mut sim), Err(Error::NoChannel));

        state.rebind(ChannelBinding::Bound { pin: 3, channel: CH });
        assert_eq!(state.lifecycle(), Lifecycle::Uninitialized);
        assert_eq!(measure_once(&mut state, &mut sim), Err(Error::NotCalibrated));
        assert_eq!(is_touched(&mut state, &mut sim), Err(Error::NotCalibrated));

        state.rebind(ChannelBinding::Unmapped(2));
        assert_eq!(is_touched(&mut state, &mut sim), Err(Error::UnmappedChannel(2)));
        assert_eq!(sim.cycles(), 0);
    }

    #[test]
    fn test_idle_is_one_cycle() {
        let mut state = ready_state();
        let mut sim = SimChannel::new(0, 1000, 800);

        for n in 1..=10 {
            assert_eq!(is_touched(&mut state, &mut sim), Ok(false));
            assert_eq!(sim.cycles(), n);
        }
    }

    #[test]
    fn test_touch_confirmed_by_two_reads() {
        let mut state = ready_state();
        let mut sim = SimChannel::new(0, 50_000, 0);

        assert_eq!(is_touched(&mut state, &mut sim), Ok(true));
        assert!(state.touched_confirmed());
        assert_eq!(sim.cycles(), 2);
    }

    #[test]
    fn test_single_spike_suppressed() {
        let mut state = ready_state();
        let mut sim = SimChannel::new(0, 1000, 800).then(50_000, 0);

        assert_eq!(is_touched(&mut state, &mut sim), Ok(false));
        assert!(!state.touched_confirmed());
        // The spike took a second read to rule out
        assert_eq!(sim.cycles(), 2);
        assert!(!state.last_measurement().touched);
    }

    #[test]
    fn test_alternating_reads_never_confirm() {
        let mut state = ready_state();
        let mut sim = SimChannel::new(0, 1000, 800);
        for _ in 0..20 {
            sim.push(50_000, 0);
            sim.push(1000, 800);
        }

        let mut raw = std::vec::Vec::new();
        for _ in 0..20 {
            let confirmed = is_touched(&mut state, &mut sim).unwrap();
            assert!(!confirmed);
            raw.push(state.last_measurement().touched);
        }
        // Each query saw a touched read followed by an untouched one
        assert_eq!(sim.cycles(), 40);
        assert!(raw.iter().all(|t| !t));
    }

    #[test]
    fn test_confirm_requires_consecutive_reads() {
        let mut state = ready_state();
        let mut sim = SimChannel::new(0, 1000, 800)
            .then(50_000, 0)
            .then(1000, 800)
            .then(1000, 800)
            .then(50_000, 0)
            .then(50_000, 0);

        assert_eq!(is_touched(&mut state, &mut sim), Ok(false));
        assert_eq!(is_touched(&mut state, &mut sim), Ok(false));
        assert_eq!(is_touched(&mut state, &mut sim), Ok(true));
        assert_eq!(sim.cycles(), 5);
        // Back to idle
        assert_eq!(is_touched(&mut state, &mut sim), Ok(false));
        assert!(!state.touched_confirmed());
    }

    #[test]
    fn test_rebind_clears_verdict() {
        let mut state = ready_state();
        let mut sim = SimChannel::new(0, 50_000, 0);
        assert_eq!(is_touched(&mut state, &mut sim), Ok(true));

        state.rebind(ChannelBinding::Unmapped(7));
        assert_eq!(is_touched(&mut state, &mut sim), Err(Error::UnmappedChannel(7)));
        assert!(!state.touched_confirmed());
    }

    #[test]
    fn test_scenario() {
        let mut state = SensorState::default();
        state.rebind(ChannelBinding::Bound { pin: 0, channel: CH });
        let mut sim = SimChannel::new(0, 1000, 800);
        crate::calibration::calibrate(&mut state, &mut sim, &crate::DEFAULT_SENSOR_CONFIG).unwrap();
        assert_eq!(state.baseline_duration(), Some(1000));
        assert_eq!(state.detection_deadline(), Some(1300));

        sim.push(1250, 810);
        let m = measure_once(&mut state, &mut sim).unwrap();
        assert_eq!(m.duration, 1250);
        assert!(!m.touched);

        sim.push(1800, 0);
        sim.push(1900, 0);
        assert_eq!(is_touched(&mut state, &mut sim), Ok(true));
        assert_eq!(state.last_measurement().duration, 1300);
    }
}
