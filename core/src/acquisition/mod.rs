//! Reading the tank sensors through `embedded-hal` traits.
//!
//! Nothing here depends on a particular board, the firmware hands over its pin and delay drivers.

mod poller;
mod ultrasonic;

pub use self::{poller::Poller, ultrasonic::Ultrasonic};

use crate::types::SensorError;

/// Source of raw current sensor samples.
///
/// `embedded-hal` has no ADC abstraction, so boards implement this for whatever drives their
/// analog input.
pub trait CurrentSensor {
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

impl<F: FnMut() -> Result<u16, SensorError>> CurrentSensor for F {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        self()
    }
}

/// Free running microsecond counter used to time echo pulses.
///
/// Must not go backwards. On embassy based boards this is `Instant::now().as_micros()`.
pub trait Monotonic {
    fn now_us(&mut self) -> u64;
}

impl<F: FnMut() -> u64> Monotonic for F {
    fn now_us(&mut self) -> u64 {
        self()
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Pins and delays driven by a shared simulated clock.

    use core::convert::Infallible;
    use embedded_hal::{
        delay::DelayNs,
        digital::{ErrorType, InputPin, OutputPin},
    };
    use std::{cell::Cell, rc::Rc};

    #[derive(Clone, Default)]
    pub(crate) struct Clock(Rc<Cell<u64>>);

    impl Clock {
        pub(crate) fn now_us(&self) -> u64 {
            self.0.get() / 1_000
        }

        pub(crate) fn monotonic(&self) -> impl FnMut() -> u64 {
            let clock = self.clone();
            move || clock.now_us()
        }

        fn advance_ns(&self, ns: u64) {
            self.0.set(self.0.get() + ns);
        }
    }

    pub(crate) struct Delay(pub(crate) Clock);

    impl DelayNs for Delay {
        fn delay_ns(&mut self, ns: u32) {
            self.0.advance_ns(u64::from(ns));
        }
    }

    #[derive(Default)]
    pub(crate) struct Trigger {
        pub(crate) pulses: usize,
        high: bool,
    }

    impl ErrorType for Trigger {
        type Error = Infallible;
    }

    impl OutputPin for Trigger {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            if self.high {
                self.pulses += 1;
            }
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    /// Echo line that is high between two points in time, in microseconds.
    ///
    /// Each read takes `read_cost_us` of simulated time, as a GPIO read on a real MCU does.
    pub(crate) struct Echo {
        pub(crate) clock: Clock,
        pub(crate) rise_us: Option<u64>,
        pub(crate) fall_us: Option<u64>,
        pub(crate) read_cost_us: u64,
    }

    impl ErrorType for Echo {
        type Error = Infallible;
    }

    impl InputPin for Echo {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            let now = self.clock.now_us();
            self.clock.advance_ns(self.read_cost_us * 1_000);
            let risen = self.rise_us.is_some_and(|t| now >= t);
            let fallen = self.fall_us.is_some_and(|t| now >= t);
            Ok(risen && !fallen)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|h| !h)
        }
    }

    pub(crate) struct Level(pub(crate) bool);

    impl ErrorType for Level {
        type Error = Infallible;
    }

    impl InputPin for Level {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0)
        }
    }

    pub(crate) struct Broken;

    impl ErrorType for Broken {
        type Error = embedded_hal::digital::ErrorKind;
    }

    impl InputPin for Broken {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }
    }
}
