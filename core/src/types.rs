use crate::monitor::Changed;
use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, IntoEnumIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum SensorError {
    #[error("Sensor did not respond before the timeout")]
    Timeout,

    #[error("Sensor hardware access failed")]
    Hardware,
}

/// Distance from the ultrasonic transducer to the water surface in cm, or the reason there is
/// no distance.
pub type DistanceReading = Result<f32, SensorError>;

/// One poll worth of raw sensor values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct SensorReading {
    pub distance: DistanceReading,
    pub current_adc: u16,
    pub vibration_active: bool,
}

/// Electrical load on the pump motor, inferred from current draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum MotorLoad {
    /// Pumping against water.
    Water,
    /// Little or no load, the pump is running dry.
    Air,
}

#[derive(Debug, EnumSetType, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
#[enumset(serialize_repr = "u8")]
pub enum Fault {
    DistanceTimeout,
    DistanceInvalid,
    Vibration,
    DryRun,
}

impl Fault {
    pub fn is_sensor_fault(&self) -> bool {
        matches!(
            self,
            Self::DistanceTimeout | Self::DistanceInvalid | Self::Vibration
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankStatus {
    /// Fill level in percent, `None` when the distance sensor could not be trusted.
    pub fill_percent: Option<f32>,

    pub motor_load: MotorLoad,
    pub motor_running: bool,

    pub sensor_fault: bool,
    pub faults: EnumSet<Fault>,
}

#[cfg(feature = "no-std")]
impl defmt::Format for TankStatus {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        defmt::write!(
            fmt,
            "TankStatus(fill = {}, load = {}, running = {}, sensor_fault = {}, faults = [",
            self.fill_percent,
            self.motor_load,
            self.motor_running,
            self.sensor_fault
        );
        for (i, fault) in self.faults.iter().enumerate() {
            defmt::write!(fmt, "{}", fault);
            if i < self.faults.len() - 1 {
                defmt::write!(fmt, ", ");
            }
        }
        defmt::write!(fmt, "])");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum Severity {
    Normal,
    Information,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, EnumCount)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum MonitorKind {
    DistanceSensorFault,
    VibrationDetected,
    PumpDryRun,
}

/// Severity of every [`MonitorKind`], indexed by kind.
///
/// Starts with everything [`Severity::Critical`] so nothing looks healthy before the first poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct Monitors([Severity; MonitorKind::COUNT]);

impl Default for Monitors {
    fn default() -> Self {
        Self([Severity::Critical; MonitorKind::COUNT])
    }
}

impl Monitors {
    pub fn get(&self, kind: MonitorKind) -> Severity {
        self.0[kind as usize]
    }

    pub fn set(&mut self, kind: MonitorKind, severity: Severity) -> Changed {
        let slot = &mut self.0[kind as usize];
        if *slot == severity {
            Changed::No
        } else {
            *slot = severity;
            Changed::Yes
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (MonitorKind, Severity)> + '_ {
        MonitorKind::iter().zip(self.0.iter().copied())
    }

    /// The worst severity of any monitor.
    pub fn severity(&self) -> Severity {
        self.0.iter().copied().max().unwrap_or(Severity::Normal)
    }
}
