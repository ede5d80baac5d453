use crate::diag::{self, Report};
use crate::measurement::{ChannelMap, ChargeMeasurement};
use crate::state::{ChannelBinding, Measurement, SensorState};
use crate::{calibration, detection, valid_factor, Error, Lifecycle, SensorConfig, DEFAULT_SENSOR_CONFIG};

/// A capacitive touch pin.
///
/// Owns the measurement hardware for its channel, so measurements can never
/// overlap. The pin must be untouched whenever it is (re)calibrated, which
/// includes construction with a pin number.
pub struct TouchablePin<M> {
    sensor: M,
    pins: ChannelMap,
    config: SensorConfig,
    state: SensorState,
}

impl<M: ChargeMeasurement> TouchablePin<M> {
    /// Create a sensor with default settings and no pin. Call [`Self::set_channel`] before use.
    pub fn new(sensor: M, pins: ChannelMap) -> Self {
        Self::with_config(sensor, pins, DEFAULT_SENSOR_CONFIG)
    }

    /// Create a sensor with no pin. An unusable sensitivity factor is replaced by the default.
    pub fn with_config(sensor: M, pins: ChannelMap, config: SensorConfig) -> Self {
        let mut config = config;
        if !valid_factor(config.sensitivity_factor) {
            warn!("ignoring sensitivity factor {}", config.sensitivity_factor);
            config.sensitivity_factor = DEFAULT_SENSOR_CONFIG.sensitivity_factor;
        }
        Self {
            sensor,
            pins,
            config,
            state: SensorState::new(config.sensitivity_factor),
        }
    }

    /// Create a sensor on `pin` and calibrate it.
    ///
    /// Failures are logged and leave the sensor uninitialized; check
    /// [`Self::lifecycle`] and retry with [`Self::calibrate`] or [`Self::set_channel`].
    pub fn with_pin(sensor: M, pins: ChannelMap, pin: u8) -> Self {
        let mut touch = Self::new(sensor, pins);
        touch.bind(pin);
        touch
    }

    /// Like [`Self::with_pin`], with a sensitivity factor. An invalid factor is
    /// ignored and the default used.
    pub fn with_pin_and_factor(sensor: M, pins: ChannelMap, pin: u8, factor: f32) -> Self {
        let config = SensorConfig {
            sensitivity_factor: factor,
            ..DEFAULT_SENSOR_CONFIG
        };
        let mut touch = Self::with_config(sensor, pins, config);
        touch.bind(pin);
        touch
    }

    fn bind(&mut self, pin: u8) {
        if let Err(e) = self.set_channel(pin) {
            warn!("touch pin {} not ready: {}", pin, e);
        }
    }

    /// Move the sensor to `pin` and calibrate it there.
    ///
    /// A pin without a sensing channel, or whose channel the hardware cannot
    /// drive, is rejected, and every measurement fails with the same error until
    /// a valid pin is set.
    pub fn set_channel(&mut self, pin: u8) -> Result<u32, Error> {
        let channel = match self.pins.lookup(pin) {
            Ok(channel) if self.sensor.supports(channel) => channel,
            Ok(channel) => {
                warn!("touch pin {}: {:?} cannot be driven by this hardware", pin, channel);
                self.state.rebind(ChannelBinding::Unmapped(pin));
                return Err(Error::UnmappedChannel(pin));
            }
            Err(e) => {
                self.state.rebind(ChannelBinding::Unmapped(pin));
                return Err(e);
            }
        };
        self.state.rebind(ChannelBinding::Bound { pin, channel });
        self.calibrate()
    }

    /// Capture a new untouched baseline. Returns the baseline duration in microseconds.
    pub fn calibrate(&mut self) -> Result<u32, Error> {
        calibration::calibrate(&mut self.state, &mut self.sensor, &self.config)
    }

    /// Change the sensitivity factor. The deadline is recomputed from the current
    /// baseline, without measuring again.
    pub fn set_sensitivity_factor(&mut self, factor: f32) -> Result<(), Error> {
        self.state.set_sensitivity_factor(factor)?;
        self.config.sensitivity_factor = factor;
        Ok(())
    }

    /// Debounced touch state: true only after two touched readings in a row
    pub fn is_touched(&mut self) -> Result<bool, Error> {
        detection::is_touched(&mut self.state, &mut self.sensor)
    }

    /// Take a single reading without debouncing
    pub fn raw_measurement(&mut self) -> Result<Measurement, Error> {
        detection::measure_once(&mut self.state, &mut self.sensor)
    }

    /// Measure and describe the pin for tuning. Does not change the debounced state.
    pub fn report(&mut self) -> Result<Report, Error> {
        diag::report(&mut self.state, &mut self.sensor, &self.config)
    }

    pub fn state(&self) -> &SensorState {
        &self.state
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lifecycle()
    }

    pub fn pin(&self) -> Option<u8> {
        self.state.binding().pin()
    }

    pub fn sensitivity_factor(&self) -> f32 {
        self.state.sensitivity_factor()
    }

    pub fn baseline_duration(&self) -> Option<u32> {
        self.state.baseline_duration()
    }

    pub fn detection_deadline(&self) -> Option<u32> {
        self.state.detection_deadline()
    }

    pub fn last_measurement(&self) -> Measurement {
        self.state.last_measurement()
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn sensor(&self) -> &M {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut M {
        &mut self.sensor
    }

    /// Give back the measurement hardware
    pub fn release(self) -> M {
        self.sensor
    }
}
