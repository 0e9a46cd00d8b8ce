//! Calibration, timing and wiring for a single tank controller.
//!
//! The constants in this module are the values the controller was calibrated with. They are only
//! used as defaults: everything that consumes configuration takes a [`Config`] (or one of its
//! parts) so that individual units can be recalibrated without rebuilding.

use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Distance from the ultrasonic sensor to the water surface when the tank is full, in cm.
pub const DIST_FULL: f32 = 5.0;

/// Distance from the ultrasonic sensor to the water surface when the tank is empty, in cm.
pub const DIST_EMPTY: f32 = 17.0;

/// Raw current sensor ADC value separating water load from air (dry) running.
///
/// Measured at roughly 3337 pumping water and 3378 running dry; readings below the threshold
/// mean the pump is moving water.
pub const AMP_SYSTEM_THRESHOLD: u16 = 3300;

/// Minimum time between two sensor polls.
pub const SENSOR_READ_DELAY: Duration = Duration::from_millis(400);

/// Longest time to wait for any phase of an ultrasonic echo before giving up.
///
/// A wet or occluded transducer may never produce an echo, this keeps the poll loop moving.
pub const ULTRASONIC_TIMEOUT: Duration = Duration::from_micros(30_000);

/// Baud rate of the diagnostic serial port.
pub const SERIAL_BAUD: u32 = 115_200;

/// Speed of sound at roughly 20°C, in cm per microsecond.
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.0343;

const _: () = assert!(DIST_FULL < DIST_EMPTY);
const _: () = assert!(DIST_FULL > 0.0);
const _: () = assert!(AMP_SYSTEM_THRESHOLD < 4096);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum ConfigError {
    #[error("Full distance ({full} cm) must be less than empty distance ({empty} cm)")]
    InvertedDistances { full: f32, empty: f32 },

    #[error("Calibration distances must be finite and positive")]
    InvalidDistance,

    #[error("Ultrasonic timeout must be non-zero")]
    ZeroUltrasonicTimeout,

    #[error("Empty distance ({empty} cm) is beyond the {max} cm the sensor can measure within its timeout")]
    UnreachableEmptyDistance { empty: f32, max: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct Calibration {
    /// Distance reading at 100% fill, in cm.
    pub dist_full_cm: f32,

    /// Distance reading at 0% fill, in cm.
    pub dist_empty_cm: f32,

    /// See [`AMP_SYSTEM_THRESHOLD`].
    pub amp_system_threshold: u16,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            dist_full_cm: DIST_FULL,
            dist_empty_cm: DIST_EMPTY,
            amp_system_threshold: AMP_SYSTEM_THRESHOLD,
        }
    }
}

impl Calibration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = |d: f32| d.is_finite() && d > 0.0;

        if !valid(self.dist_full_cm) || !valid(self.dist_empty_cm) {
            return Err(ConfigError::InvalidDistance);
        }

        if self.dist_full_cm >= self.dist_empty_cm {
            return Err(ConfigError::InvertedDistances {
                full: self.dist_full_cm,
                empty: self.dist_empty_cm,
            });
        }

        Ok(())
    }

    /// Validates the calibration, the timing, and that an empty tank is within sensor range.
    pub fn validate_with(&self, timing: &Timing) -> Result<(), ConfigError> {
        self.validate()?;
        timing.validate()?;

        let max = timing.max_distance_cm();
        if self.dist_empty_cm > max {
            return Err(ConfigError::UnreachableEmptyDistance {
                empty: self.dist_empty_cm,
                max,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub sensor_read_delay: Duration,
    pub ultrasonic_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            sensor_read_delay: SENSOR_READ_DELAY,
            ultrasonic_timeout: ULTRASONIC_TIMEOUT,
        }
    }
}

impl Timing {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ultrasonic_timeout.is_zero() {
            Err(ConfigError::ZeroUltrasonicTimeout)
        } else {
            Ok(())
        }
    }

    /// Ultrasonic timeout in whole microseconds, saturating at `u32::MAX`.
    pub fn ultrasonic_timeout_us(&self) -> u32 {
        u32::try_from(self.ultrasonic_timeout.as_micros()).unwrap_or(u32::MAX)
    }

    /// The furthest distance an echo can report before the timeout expires, in cm.
    pub fn max_distance_cm(&self) -> f32 {
        echo_width_to_cm(self.ultrasonic_timeout_us())
    }
}

/// Converts the width of an ultrasonic echo pulse to the one way distance it represents.
pub fn echo_width_to_cm(width_us: u32) -> f32 {
    width_us as f32 * SPEED_OF_SOUND_CM_PER_US / 2.0
}

/// GPIO assignments on the controller board.
///
/// Only board bring-up needs these, the evaluator never looks at them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct Pins {
    /// Ultrasonic sensor trigger.
    pub trig: u8,
    /// Ultrasonic sensor echo.
    pub echo: u8,

    /// L298N motor driver inputs.
    pub motor_in1: u8,
    pub motor_in2: u8,

    pub vibration: u8,
    /// ACS712 analog output.
    pub current: u8,
    /// HX710B data line.
    pub air_out: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            trig: 5,
            echo: 18,
            motor_in1: 26,
            motor_in2: 27,
            vibration: 25,
            current: 34,
            air_out: 35,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub calibration: Calibration,
    pub timing: Timing,
    pub pins: Pins,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calibration.validate_with(&self.timing)
    }
}
