mod evaluate;
mod monitor;
mod report;

use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use tank_monitor_core::config::{
    Calibration, Config, Timing, AMP_SYSTEM_THRESHOLD, DIST_EMPTY, DIST_FULL, SENSOR_READ_DELAY,
    ULTRASONIC_TIMEOUT,
};

/// Tool to inspect and evaluate water tank monitor readings.
#[derive(Parser)]
struct Cli {
    #[command(flatten)]
    calibration: CalibrationArgs,

    #[command(subcommand)]
    command: Command,
}

/// Calibration used for evaluation on the host, defaults are the controller's build time values.
#[derive(Args)]
struct CalibrationArgs {
    /// Distance reading at 100% fill, in cm
    #[arg(long, global = true, default_value_t = DIST_FULL)]
    dist_full: f32,

    /// Distance reading at 0% fill, in cm
    #[arg(long, global = true, default_value_t = DIST_EMPTY)]
    dist_empty: f32,

    /// Current sensor ADC value at and above which the pump is running dry
    #[arg(long, global = true, default_value_t = AMP_SYSTEM_THRESHOLD)]
    amp_threshold: u16,

    /// Ultrasonic echo timeout in microseconds
    #[arg(long, global = true, default_value_t = ULTRASONIC_TIMEOUT.as_micros() as u64)]
    ultrasonic_timeout_us: u64,

    /// Minimum time between sensor polls in milliseconds
    #[arg(long, global = true, default_value_t = SENSOR_READ_DELAY.as_millis() as u64)]
    sensor_read_delay_ms: u64,
}

impl CalibrationArgs {
    fn config(&self) -> anyhow::Result<Config> {
        let config = Config {
            calibration: Calibration {
                dist_full_cm: self.dist_full,
                dist_empty_cm: self.dist_empty,
                amp_system_threshold: self.amp_threshold,
            },
            timing: Timing {
                sensor_read_delay: Duration::from_millis(self.sensor_read_delay_ms),
                ultrasonic_timeout: Duration::from_micros(self.ultrasonic_timeout_us),
            },
            ..Default::default()
        };

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Receive and evaluate messages from a controller
    Monitor(monitor::Cli),

    /// Evaluate a single reading
    Evaluate(evaluate::Cli),
}

trait Runner {
    fn run(&self, config: &Config) -> anyhow::Result<()>;
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = cli.calibration.config()?;

    match &cli.command {
        Command::Monitor(cmd) => cmd.run(&config),
        Command::Evaluate(cmd) => cmd.run(&config),
    }
}
