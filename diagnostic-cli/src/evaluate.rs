use crate::{report::summary, Runner};
use clap::Parser;
use tank_monitor_core::{
    config::Config,
    evaluator::ThresholdEvaluator,
    types::{SensorError, SensorReading},
};

#[derive(Parser)]
pub(super) struct Cli {
    /// Distance from the sensor to the water surface in cm
    #[arg(
        long,
        required_unless_present = "timeout",
        conflicts_with = "timeout",
        allow_negative_numbers = true
    )]
    distance: Option<f32>,

    /// Evaluate as if the distance measurement timed out
    #[arg(long)]
    timeout: bool,

    /// Raw current sensor ADC value
    #[arg(long)]
    current: u16,

    /// Evaluate with the vibration sensor active
    #[arg(long)]
    vibration: bool,
}

impl Cli {
    fn reading(&self) -> SensorReading {
        SensorReading {
            distance: match self.distance {
                Some(distance) if !self.timeout => Ok(distance),
                _ => Err(SensorError::Timeout),
            },
            current_adc: self.current,
            vibration_active: self.vibration,
        }
    }
}

impl Runner for Cli {
    fn run(&self, config: &Config) -> anyhow::Result<()> {
        let evaluator = ThresholdEvaluator::new(config.calibration, &config.timing)?;
        let status = evaluator.evaluate(&self.reading());

        println!("{}", summary(&status));
        println!("{status:#?}");

        Ok(())
    }
}
