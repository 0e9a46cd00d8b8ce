use super::Monotonic;
use crate::{
    config::{echo_width_to_cm, Timing},
    debug,
    types::{DistanceReading, SensorError},
    warn,
};
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

/// Length of the trigger pulse the HC-SR04 needs to start a measurement.
const TRIGGER_PULSE_US: u32 = 10;

/// Pause between samples of the echo line.
const SAMPLE_PERIOD_US: u32 = 1;

/// HC-SR04 style trigger/echo ultrasonic distance sensor.
///
/// The echo is timed against `clock`, the delay only paces sampling.
pub struct Ultrasonic<TRIG, ECHO, CLOCK> {
    trig: TRIG,
    echo: ECHO,
    clock: CLOCK,
    timeout_us: u64,
}

impl<TRIG: OutputPin, ECHO: InputPin, CLOCK: Monotonic> Ultrasonic<TRIG, ECHO, CLOCK> {
    pub fn new(trig: TRIG, echo: ECHO, clock: CLOCK, timing: &Timing) -> Self {
        Self {
            trig,
            echo,
            clock,
            timeout_us: u64::from(timing.ultrasonic_timeout_us()),
        }
    }

    /// Takes one distance measurement in cm.
    ///
    /// Waiting for the echo to start and waiting for it to end are each bounded by the
    /// ultrasonic timeout, a missing or stuck echo gives [`SensorError::Timeout`].
    pub fn measure<D: DelayNs>(&mut self, delay: &mut D) -> DistanceReading {
        self.trigger(delay).map_err(|_| SensorError::Hardware)?;

        let triggered_at = self.clock.now_us();

        let rise_at = self.wait_for_echo(delay, true, triggered_at).inspect_err(|_| {
            warn!("No echo within {} us", self.timeout_us);
        })?;

        let fall_at = self.wait_for_echo(delay, false, rise_at).inspect_err(|_| {
            warn!("Echo did not end within {} us", self.timeout_us);
        })?;

        let width_us = u32::try_from(fall_at.saturating_sub(rise_at)).unwrap_or(u32::MAX);
        let distance = echo_width_to_cm(width_us);
        debug!("Echo width {} us, distance {} cm", width_us, distance);

        Ok(distance)
    }

    pub fn release(self) -> (TRIG, ECHO, CLOCK) {
        (self.trig, self.echo, self.clock)
    }

    fn trigger<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), TRIG::Error> {
        self.trig.set_low()?;
        delay.delay_us(2);
        self.trig.set_high()?;
        delay.delay_us(TRIGGER_PULSE_US);
        self.trig.set_low()
    }

    /// Waits for the echo line to reach `high`, returning the clock reading when it did.
    ///
    /// Gives up once the clock shows the timeout has passed since `since`.
    fn wait_for_echo<D: DelayNs>(
        &mut self,
        delay: &mut D,
        high: bool,
        since: u64,
    ) -> Result<u64, SensorError> {
        loop {
            let level = self.echo.is_high().map_err(|_| SensorError::Hardware)?;
            let now = self.clock.now_us();

            if level == high {
                return Ok(now);
            }

            if now.saturating_sub(since) >= self.timeout_us {
                return Err(SensorError::Timeout);
            }

            delay.delay_us(SAMPLE_PERIOD_US);
        }
    }
}
