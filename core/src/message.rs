use crate::{
    config::Calibration,
    types::{Monitors, SensorReading, TankStatus},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct Message {
    pub millis_since_boot: u64,
    pub payload: Payload,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum Payload {
    Lifecycle(Lifecycle),
    /// Raw values from one sensor poll.
    Observation(SensorReading),
    /// The controller's own evaluation of its latest observation.
    Status(TankStatus),
    MonitorsChanged(Monitors),
}

/// Controller lifecycle events.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub enum Lifecycle {
    Boot(ControllerInfo),
    Heartbeat(ControllerInfo),
    Panic(PanicReport),
}

pub type RevisionString = crate::String<20>;

/// What a controller was built from and how it is calibrated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct ControllerInfo {
    /// `None` when the revision did not fit.
    pub git_revision: Option<RevisionString>,
    pub calibration: Calibration,
}

impl ControllerInfo {
    #[allow(clippy::unnecessary_fallible_conversions)]
    pub fn new(git_revision: &str, calibration: Calibration) -> Self {
        Self {
            git_revision: git_revision.try_into().ok(),
            calibration,
        }
    }
}

/// Where a controller panicked, sent from its panic handler before it resets.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
pub struct PanicReport {
    /// Source file, `None` when unknown or too long to send.
    pub file: Option<crate::String<32>>,
    pub line: u32,
}

impl PanicReport {
    #[allow(clippy::unnecessary_fallible_conversions)]
    pub fn new(file: &str, line: u32) -> Self {
        Self {
            file: file.try_into().ok(),
            line,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn controller_info_keeps_revision() {
        let info = ControllerInfo::new("v0.1.0-3-gdeadbee", Calibration::default());
        assert_eq!(info.git_revision.as_deref(), Some("v0.1.0-3-gdeadbee"));
        assert_eq!(info.calibration, Calibration::default());
    }

    #[test]
    fn panic_report_location() {
        let report = PanicReport::new("core/src/acquisition/poller.rs", 57);
        assert_eq!(report.file.as_deref(), Some("core/src/acquisition/poller.rs"));
        assert_eq!(report.line, 57);
    }
}
