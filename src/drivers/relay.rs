//! Fan relay driver.
//!
//! The relay module on the fan supply is active-low: driving the input
//! low closes the contact.  This driver only switches the pin; when to
//! switch is decided in [`control::relay`](crate::control::relay).

use embedded_hal::digital::OutputPin;
use log::{info, warn};

pub struct Relay<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> Relay<P> {
    /// Take the pin and open the relay.
    pub fn new(pin: P) -> Result<Self, P::Error> {
        let mut relay = Self { pin, on: false };
        relay.pin.set_high()?;
        Ok(relay)
    }

    /// Switch the fan.  Repeating the current state still drives the pin.
    pub fn set(&mut self, on: bool) -> Result<(), P::Error> {
        if on {
            self.pin.set_low()?;
        } else {
            self.pin.set_high()?;
        }
        if on != self.on {
            info!("Relay: fan {}", if on { "ON" } else { "OFF" });
        }
        self.on = on;
        Ok(())
    }

    /// Open the relay, logging instead of failing.
    pub fn force_off(&mut self) {
        if let Err(e) = self.set(false) {
            warn!("Relay: force off failed: {:?}", e);
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Default)]
    struct Pin {
        high: Option<bool>,
        writes: usize,
    }

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = Some(false);
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = Some(true);
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn starts_open() {
        let relay = Relay::new(Pin::default()).unwrap();
        assert!(!relay.is_on());
        assert_eq!(relay.pin.high, Some(true));
    }

    #[test]
    fn active_low() {
        let mut relay = Relay::new(Pin::default()).unwrap();
        relay.set(true).unwrap();
        assert_eq!(relay.pin.high, Some(false));
        assert!(relay.is_on());
        relay.force_off();
        assert_eq!(relay.pin.high, Some(true));
        assert!(!relay.is_on());
    }

    #[test]
    fn repeated_state_rewrites_the_pin() {
        let mut relay = Relay::new(Pin::default()).unwrap();
        relay.set(false).unwrap();
        relay.set(false).unwrap();
        assert_eq!(relay.pin.writes, 3);
    }
}
