use tank_monitor_core::types::{MotorLoad, TankStatus};

/// One line, human readable description of a status.
pub(crate) fn summary(status: &TankStatus) -> String {
    let fill = match status.fill_percent {
        Some(fill) => format!("{fill:.1}%"),
        None => "unknown".to_string(),
    };

    let pump = match status.motor_load {
        MotorLoad::Water => "water load",
        MotorLoad::Air => "running dry",
    };

    let faults = if status.faults.is_empty() {
        "none".to_string()
    } else {
        status
            .faults
            .iter()
            .map(|f| format!("{f:?}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!("fill: {fill}, pump: {pump}, faults: {faults}")
}
