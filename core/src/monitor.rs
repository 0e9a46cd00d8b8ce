use crate::{
    debug, info,
    types::{Fault, MonitorKind, Monitors, Severity, TankStatus},
};
use core::ops::BitOr;

/// Whether an update altered anything worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
#[must_use]
pub enum Changed {
    Yes,
    No,
}

impl BitOr for Changed {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        if self == Self::Yes || rhs == Self::Yes {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// Tracks monitor severities across successive polls so that only changes need reporting.
///
/// Severities follow the most recent status exactly, there is no hysteresis.
#[derive(Debug, Default, Clone)]
pub struct TankMonitor {
    monitors: Monitors,
    last_known_fill: Option<f32>,
}

impl TankMonitor {
    pub fn monitors(&self) -> &Monitors {
        &self.monitors
    }

    /// Fill level from the most recent status that had one.
    pub fn last_known_fill(&self) -> Option<f32> {
        self.last_known_fill
    }

    pub fn update(&mut self, status: &TankStatus) -> Changed {
        if let Some(fill) = status.fill_percent {
            self.last_known_fill = Some(fill);
        }

        let distance = severity_if(
            status.faults.contains(Fault::DistanceTimeout)
                || status.faults.contains(Fault::DistanceInvalid),
            Severity::Warning,
        );
        let vibration = severity_if(status.faults.contains(Fault::Vibration), Severity::Warning);
        let dry_run = severity_if(status.faults.contains(Fault::DryRun), Severity::Critical);

        let changed = self.set(MonitorKind::DistanceSensorFault, distance)
            | self.set(MonitorKind::VibrationDetected, vibration)
            | self.set(MonitorKind::PumpDryRun, dry_run);

        if changed == Changed::Yes {
            info!("Monitors changed: {:?}", self.monitors);
        }

        changed
    }

    fn set(&mut self, kind: MonitorKind, severity: Severity) -> Changed {
        let changed = self.monitors.set(kind, severity);
        if changed == Changed::Yes {
            debug!("Monitor {:?} -> {:?}", kind, severity);
        }
        changed
    }
}

fn severity_if(active: bool, severity: Severity) -> Severity {
    if active {
        severity
    } else {
        Severity::Normal
    }
}
