use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No pin has been assigned to the sensor yet
    NoChannel,
    /// The logical pin has no physical sensing channel
    UnmappedChannel(u8),
    /// Sensitivity factor was zero, negative or not finite
    InvalidSensitivityFactor,
    /// The baseline capture produced an implausible duration, most likely because
    /// the clock wrapped or jumped during the cycle. Calibrate again.
    CalibrationRollover,
    /// A measurement was requested before a successful calibration
    NotCalibrated,
    /// The hardware never signalled completion of a charge cycle
    MeasurementTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoChannel => f.write_str("no touch pin assigned"),
            Error::UnmappedChannel(pin) => write!(f, "pin {} has no touch channel", pin),
            Error::InvalidSensitivityFactor => f.write_str("sensitivity factor must be positive"),
            Error::CalibrationRollover => f.write_str("implausible baseline duration, clock rollover during calibration"),
            Error::NotCalibrated => f.write_str("sensor is not calibrated"),
            Error::MeasurementTimeout => f.write_str("charge cycle did not complete"),
        }
    }
}
