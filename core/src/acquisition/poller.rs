use super::{CurrentSensor, Monotonic, Ultrasonic};
use crate::{
    config::Timing,
    types::{SensorError, SensorReading},
};
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

/// Reads every sensor once per poll, never polling faster than the configured read delay.
pub struct Poller<TRIG, ECHO, CLOCK, CURRENT, VIBRATION, D> {
    ultrasonic: Ultrasonic<TRIG, ECHO, CLOCK>,
    current: CURRENT,
    vibration: VIBRATION,
    delay: D,

    read_delay_ms: u32,
    polled: bool,
}

impl<TRIG, ECHO, CLOCK, CURRENT, VIBRATION, D> Poller<TRIG, ECHO, CLOCK, CURRENT, VIBRATION, D>
where
    TRIG: OutputPin,
    ECHO: InputPin,
    CLOCK: Monotonic,
    CURRENT: CurrentSensor,
    VIBRATION: InputPin,
    D: DelayNs,
{
    pub fn new(
        ultrasonic: Ultrasonic<TRIG, ECHO, CLOCK>,
        current: CURRENT,
        vibration: VIBRATION,
        delay: D,
        timing: &Timing,
    ) -> Self {
        Self {
            ultrasonic,
            current,
            vibration,
            delay,
            read_delay_ms: u32::try_from(timing.sensor_read_delay.as_millis()).unwrap_or(u32::MAX),
            polled: false,
        }
    }

    /// Takes the next reading, waiting out the read delay first unless this is the first poll.
    ///
    /// A failed distance measurement is part of the returned reading. Failing to read the
    /// current or vibration sensors fails the whole poll.
    pub fn poll(&mut self) -> Result<SensorReading, SensorError> {
        if self.polled {
            self.delay.delay_ms(self.read_delay_ms);
        }
        self.polled = true;

        let distance = self.ultrasonic.measure(&mut self.delay);
        let current_adc = self.current.read_raw()?;
        let vibration_active = self
            .vibration
            .is_high()
            .map_err(|_| SensorError::Hardware)?;

        Ok(SensorReading {
            distance,
            current_adc,
            vibration_active,
        })
    }
}
