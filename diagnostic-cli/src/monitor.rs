use crate::{report::summary, Runner};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::{
    io::{ErrorKind, Read},
    time::Duration,
};
use tank_monitor_core::{
    config::{Config, SERIAL_BAUD},
    evaluator::ThresholdEvaluator,
    message::{ControllerInfo, Lifecycle, Message, Payload},
    monitor::{Changed, TankMonitor},
    serial::FrameAccumulator,
    types::{Severity, TankStatus},
};
use tracing::{debug, error, info, warn};

#[derive(Parser)]
pub(super) struct Cli {
    /// Serial port
    #[arg(short, long)]
    port: String,

    /// Serial baud rate
    #[arg(short, long, default_value_t = SERIAL_BAUD)]
    baud: u32,

    /// How received messages are logged, at info level
    #[arg(short, long, value_enum, default_value = "debug-pretty")]
    format: PrintFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum PrintFormat {
    Debug,
    DebugPretty,
}

impl PrintFormat {
    fn render(self, msg: &Message) -> String {
        match self {
            PrintFormat::Debug => format!("{msg:?}"),
            PrintFormat::DebugPretty => format!("\n{msg:#?}"),
        }
    }
}

impl Runner for Cli {
    fn run(&self, config: &Config) -> anyhow::Result<()> {
        let mut session = Session::new(config, self.format)?;

        let port = serialport::new(&self.port, self.baud)
            .timeout(Duration::from_millis(10))
            .open()
            .with_context(|| format!("Failed to open port {}", self.port))?;

        info!("Listening on {} at {} baud", self.port, self.baud);

        let mut frames = FrameAccumulator::default();

        for b in port.bytes() {
            let b = match b {
                Ok(b) => b,
                Err(e) if e.kind() == ErrorKind::TimedOut => continue,
                Err(e) => return Err(e).context("Failed to read from port"),
            };

            match frames.push(b) {
                Some(Ok(msg)) => {
                    session.handle(&msg);
                }
                Some(Err(e)) => {
                    warn!("Dropped frame: {}", e);
                }
                None => {}
            }
        }

        Ok(())
    }
}

/// Evaluates the readings a controller reports, cross checking them against its own verdicts.
struct Session {
    evaluator: ThresholdEvaluator,
    monitor: TankMonitor,
    format: PrintFormat,
    last_host_status: Option<TankStatus>,
}

impl Session {
    fn new(config: &Config, format: PrintFormat) -> anyhow::Result<Self> {
        Ok(Self {
            evaluator: ThresholdEvaluator::new(config.calibration, &config.timing)?,
            monitor: TankMonitor::default(),
            format,
            last_host_status: None,
        })
    }

    /// Handles one message, returning the host side status when the message was an observation.
    fn handle(&mut self, msg: &Message) -> Option<TankStatus> {
        self.print(msg);

        match &msg.payload {
            Payload::Lifecycle(Lifecycle::Boot(info)) => {
                info!("Controller booted");
                check_firmware_version(info);
                self.check_calibration(info);
                None
            }
            Payload::Lifecycle(Lifecycle::Heartbeat(info)) => {
                check_firmware_version(info);
                None
            }
            Payload::Lifecycle(Lifecycle::Panic(report)) => {
                error!(
                    "Controller panicked at {}:{}",
                    report.file.as_deref().unwrap_or("<unknown>"),
                    report.line
                );
                None
            }
            Payload::Observation(reading) => {
                let status = self.evaluator.evaluate(reading);
                info!("{}", summary(&status));

                if self.monitor.update(&status) == Changed::Yes {
                    info!(
                        "Host monitors changed, overall severity {:?}",
                        self.monitor.monitors().severity()
                    );
                }

                if status.fill_percent.is_none() {
                    if let Some(fill) = self.monitor.last_known_fill() {
                        info!("Last known fill: {:.1}%", fill);
                    }
                }

                self.last_host_status = Some(status.clone());
                Some(status)
            }
            Payload::Status(status) => {
                match &self.last_host_status {
                    Some(ours) if ours.faults != status.faults => {
                        warn!(
                            "Controller reports faults {:?}, host evaluation gives {:?}, check calibration",
                            status.faults, ours.faults
                        );
                    }
                    _ => {}
                }
                None
            }
            Payload::MonitorsChanged(monitors) => {
                info!(
                    "Controller monitors changed, overall severity {:?}",
                    monitors.severity()
                );
                for (kind, severity) in monitors.iter().filter(|(_, s)| *s != Severity::Normal) {
                    info!("  {:?}: {:?}", kind, severity);
                }
                None
            }
        }
    }

    /// Returns true when the controller is calibrated the same as this session.
    fn check_calibration(&self, info: &ControllerInfo) -> bool {
        let ours = self.evaluator.calibration();
        if info.calibration != *ours {
            warn!(
                "Controller calibration {:?} differs from host calibration {:?}, statuses may disagree",
                info.calibration, ours
            );
            false
        } else {
            true
        }
    }

    fn print(&self, msg: &Message) {
        info!("Received: {}", self.format.render(msg));
    }
}

/// Returns true when the controller runs the same revision as this tool.
fn check_firmware_version(info: &ControllerInfo) -> bool {
    let our_version = git_version::git_version!(fallback = "unknown");
    let Some(their_version) = info.git_revision.as_deref() else {
        warn!("Controller did not report its Git revision");
        return false;
    };

    debug!("Host Git revision: {}", our_version);
    debug!("Device Git revision: {}", their_version);

    if our_version != their_version {
        warn!("Git revisions do not match between host and device, this program may not read data correctly from the device!");
        false
    } else {
        true
    }
}
