//! Maps a single poll of raw sensor values to the state of the tank and pump.
//!
//! The evaluator holds nothing but its calibration, so it can be shared between any number of
//! callers without locking.

use crate::{
    config::{Calibration, ConfigError, Timing},
    debug,
    types::{DistanceReading, Fault, MotorLoad, SensorError, SensorReading, TankStatus},
    warn,
};
use enumset::EnumSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdEvaluator {
    calibration: Calibration,

    /// Largest distance the ultrasonic sensor can report before its timeout, in cm.
    max_distance_cm: f32,
}

impl ThresholdEvaluator {
    pub fn new(calibration: Calibration, timing: &Timing) -> Result<Self, ConfigError> {
        calibration.validate_with(timing)?;

        Ok(Self {
            calibration,
            max_distance_cm: timing.max_distance_cm(),
        })
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn evaluate(&self, reading: &SensorReading) -> TankStatus {
        let mut faults = EnumSet::new();

        let fill_percent = match self.valid_distance(&reading.distance) {
            Ok(distance) => Some(self.fill_percent(distance)),
            Err(fault) => {
                faults |= fault;
                None
            }
        };

        let motor_load = self.motor_load(reading.current_adc);
        if motor_load == MotorLoad::Air {
            debug!(
                "Current {} is at or above threshold {}, pump is running dry",
                reading.current_adc, self.calibration.amp_system_threshold
            );
            faults |= Fault::DryRun;
        }

        if reading.vibration_active {
            warn!("Vibration sensor is active");
            faults |= Fault::Vibration;
        }

        TankStatus {
            fill_percent,
            motor_load,
            motor_running: motor_load == MotorLoad::Water,
            sensor_fault: faults.iter().any(|f| f.is_sensor_fault()),
            faults,
        }
    }

    /// Fill level in percent for a distance reading in cm, clamped to `0..=100`.
    ///
    /// The sensor looks down at the water, so a shorter distance means a fuller tank.
    pub fn fill_percent(&self, distance_cm: f32) -> f32 {
        let empty = self.calibration.dist_empty_cm;
        let full = self.calibration.dist_full_cm;

        (100.0 * (empty - distance_cm) / (empty - full)).clamp(0.0, 100.0)
    }

    pub fn motor_load(&self, current_adc: u16) -> MotorLoad {
        if current_adc < self.calibration.amp_system_threshold {
            MotorLoad::Water
        } else {
            MotorLoad::Air
        }
    }

    fn valid_distance(&self, reading: &DistanceReading) -> Result<f32, Fault> {
        match reading {
            Ok(distance) => {
                if distance.is_finite() && *distance > 0.0 && *distance <= self.max_distance_cm {
                    Ok(*distance)
                } else {
                    warn!(
                        "Distance {} cm is outside the sensor range of 0 to {} cm",
                        distance, self.max_distance_cm
                    );
                    Err(Fault::DistanceInvalid)
                }
            }
            Err(SensorError::Timeout) => {
                warn!("Distance sensor timed out");
                Err(Fault::DistanceTimeout)
            }
            Err(SensorError::Hardware) => {
                warn!("Distance sensor could not be read");
                Err(Fault::DistanceInvalid)
            }
        }
    }
}

impl Default for ThresholdEvaluator {
    fn default() -> Self {
        let timing = Timing::default();
        Self {
            calibration: Calibration::default(),
            max_distance_cm: timing.max_distance_cm(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn reading(distance: DistanceReading, current_adc: u16, vibration_active: bool) -> SensorReading {
        SensorReading {
            distance,
            current_adc,
            vibration_active,
        }
    }

    #[test]
    fn fill_at_calibration_points() {
        let e = ThresholdEvaluator::default();
        assert_eq!(e.fill_percent(5.0), 100.0);
        assert_eq!(e.fill_percent(17.0), 0.0);
    }

    #[test]
    fn fill_halfway() {
        let e = ThresholdEvaluator::default();
        let status = e.evaluate(&reading(Ok(11.0), 3100, false));
        assert_eq!(status.fill_percent, Some(50.0));
    }

    #[test]
    fn fill_decreases_with_distance() {
        let e = ThresholdEvaluator::default();
        let mut last = e.fill_percent(5.0);
        let mut d = 5.0;
        while d <= 17.0 {
            let fill = e.fill_percent(d);
            assert!(fill <= last, "fill rose from {last} to {fill} at {d} cm");
            assert!((0.0..=100.0).contains(&fill));
            last = fill;
            d += 0.25;
        }
    }

    #[test]
    fn fill_clamped_outside_calibration() {
        let e = ThresholdEvaluator::default();

        let status = e.evaluate(&reading(Ok(2.0), 3100, false));
        assert_eq!(status.fill_percent, Some(100.0));
        assert!(!status.sensor_fault);

        let status = e.evaluate(&reading(Ok(40.0), 3100, false));
        assert_eq!(status.fill_percent, Some(0.0));
        assert!(!status.sensor_fault);
    }

    #[test]
    fn full_tank_water_load() {
        let e = ThresholdEvaluator::default();
        let status = e.evaluate(&reading(Ok(5.0), 3100, false));
        assert_eq!(
            status,
            TankStatus {
                fill_percent: Some(100.0),
                motor_load: MotorLoad::Water,
                motor_running: true,
                sensor_fault: false,
                faults: EnumSet::empty(),
            }
        );
    }

    #[test]
    fn current_threshold_boundary() {
        let e = ThresholdEvaluator::default();

        let status = e.evaluate(&reading(Ok(11.0), 3299, false));
        assert!(status.motor_running);
        assert_eq!(status.motor_load, MotorLoad::Water);
        assert!(!status.faults.contains(Fault::DryRun));

        let status = e.evaluate(&reading(Ok(11.0), 3300, false));
        assert!(!status.motor_running);
        assert_eq!(status.motor_load, MotorLoad::Air);
        assert!(status.faults.contains(Fault::DryRun));
    }

    #[test]
    fn dry_run_is_not_a_sensor_fault() {
        let e = ThresholdEvaluator::default();
        let status = e.evaluate(&reading(Ok(11.0), 3378, false));
        assert!(!status.sensor_fault);
        assert_eq!(status.faults, Fault::DryRun);
        assert_eq!(status.fill_percent, Some(50.0));
    }

    #[test]
    fn timeout_is_unknown_fill() {
        let e = ThresholdEvaluator::default();
        let status = e.evaluate(&reading(Err(SensorError::Timeout), 3100, false));
        assert!(status.sensor_fault);
        assert_eq!(status.fill_percent, None);
        assert_eq!(status.faults, Fault::DistanceTimeout);
        assert!(status.motor_running);
    }

    #[test]
    fn hardware_error_is_unknown_fill() {
        let e = ThresholdEvaluator::default();
        let status = e.evaluate(&reading(Err(SensorError::Hardware), 3100, false));
        assert!(status.sensor_fault);
        assert_eq!(status.fill_percent, None);
        assert_eq!(status.faults, Fault::DistanceInvalid);
    }

    #[test]
    fn invalid_distances() {
        let e = ThresholdEvaluator::default();
        for d in [f32::NAN, f32::INFINITY, 0.0, -3.0, 600.0] {
            let status = e.evaluate(&reading(Ok(d), 3100, false));
            assert!(status.sensor_fault, "{d} should be a fault");
            assert_eq!(status.fill_percent, None);
            assert!(status.faults.contains(Fault::DistanceInvalid));
        }
    }

    #[test]
    fn max_range_is_valid() {
        let e = ThresholdEvaluator::default();
        let status = e.evaluate(&reading(Ok(514.0), 3100, false));
        assert!(!status.sensor_fault);
        assert_eq!(status.fill_percent, Some(0.0));
    }

    #[test]
    fn max_range_edge() {
        let e = ThresholdEvaluator::default();
        let max = Timing::default().max_distance_cm();

        let status = e.evaluate(&reading(Ok(max), 3100, false));
        assert!(!status.sensor_fault);
        assert_eq!(status.fill_percent, Some(0.0));

        let status = e.evaluate(&reading(Ok(max + 0.01), 3100, false));
        assert!(status.sensor_fault);
        assert_eq!(status.fill_percent, None);
        assert_eq!(status.faults, Fault::DistanceInvalid);
    }

    #[test]
    fn vibration_is_sensor_fault() {
        let e = ThresholdEvaluator::default();
        let status = e.evaluate(&reading(Ok(11.0), 3100, true));
        assert!(status.sensor_fault);
        assert_eq!(status.faults, Fault::Vibration);
        assert_eq!(status.fill_percent, Some(50.0));
    }

    #[test]
    fn all_faults() {
        let e = ThresholdEvaluator::default();
        let status = e.evaluate(&reading(Err(SensorError::Timeout), 4000, true));
        assert_eq!(
            status.faults,
            Fault::DistanceTimeout | Fault::Vibration | Fault::DryRun
        );
        assert!(status.sensor_fault);
        assert!(!status.motor_running);
    }

    #[test]
    fn custom_calibration() {
        let calibration = Calibration {
            dist_full_cm: 10.0,
            dist_empty_cm: 110.0,
            amp_system_threshold: 2000,
        };
        let e = ThresholdEvaluator::new(calibration, &Timing::default()).unwrap();
        assert_eq!(e.fill_percent(60.0), 50.0);
        assert_eq!(e.motor_load(1999), MotorLoad::Water);
        assert_eq!(e.motor_load(2000), MotorLoad::Air);
    }

    #[test]
    fn rejects_invalid_calibration() {
        let calibration = Calibration {
            dist_full_cm: 20.0,
            ..Default::default()
        };
        assert!(ThresholdEvaluator::new(calibration, &Timing::default()).is_err());
    }

    #[test]
    fn rejects_empty_distance_out_of_range() {
        let timing = Timing {
            ultrasonic_timeout: core::time::Duration::from_micros(500),
            ..Default::default()
        };
        assert!(matches!(
            ThresholdEvaluator::new(Calibration::default(), &timing),
            Err(ConfigError::UnreachableEmptyDistance { .. })
        ));
    }

    #[test]
    fn default_matches_new_with_defaults() {
        let e = ThresholdEvaluator::new(Calibration::default(), &Timing::default()).unwrap();
        assert_eq!(e, ThresholdEvaluator::default());
    }

    #[test]
    fn shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ThresholdEvaluator>();
    }
}
