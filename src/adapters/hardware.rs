//! Hardware adapter: bridges the drivers to the domain port traits.
//!
//! Owns both humidity sensors, the LCD, the fan relay and the status LED,
//! exposing them through [`SensorPort`], [`ActuatorPort`] and
//! [`DisplayPort`].  Peripheral errors below this line are logged and
//! swallowed; the ports are infallible except for sensor reads, which
//! the domain classifies.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{ActuatorPort, DisplayPort, Rgb, SensorPort};
use crate::drivers::lcd::Lcd1602;
use crate::drivers::relay::Relay;
use crate::drivers::status_led::StatusLed;
use crate::error::SensorError;
use crate::sensors::{HumiditySensor, RawReading, SensorId};

/// Concrete adapter that combines all hardware behind port traits.
///
/// `B` is the delay used for indicator blinks.
pub struct HardwareAdapter<S, I, D, P, C, B> {
    sensors: [S; 2],
    lcd: Lcd1602<I, D>,
    relay: Relay<P>,
    led: StatusLed<C>,
    blink_delay: B,
}

impl<S, I, D, P, C, B> HardwareAdapter<S, I, D, P, C, B>
where
    S: HumiditySensor,
    I: I2c,
    D: DelayNs,
    P: OutputPin,
    C: SetDutyCycle,
    B: DelayNs,
{
    /// `sensors` is indexed by [`SensorId`]: indoor first.
    pub fn new(
        sensors: [S; 2],
        lcd: Lcd1602<I, D>,
        relay: Relay<P>,
        led: StatusLed<C>,
        blink_delay: B,
    ) -> Self {
        Self {
            sensors,
            lcd,
            relay,
            led,
            blink_delay,
        }
    }

    pub fn relay_on(&self) -> bool {
        self.relay.is_on()
    }

    pub fn indicator(&self) -> Rgb {
        self.led.current_colour()
    }
}

// ── SensorPort ────────────────────────────────────────────────

impl<S, I, D, P, C, B> SensorPort for HardwareAdapter<S, I, D, P, C, B>
where
    S: HumiditySensor,
{
    fn read(&mut self, sensor: SensorId) -> Result<RawReading, SensorError> {
        self.sensors[sensor.index()].read()
    }
}

// ── ActuatorPort ──────────────────────────────────────────────

impl<S, I, D, P, C, B> ActuatorPort for HardwareAdapter<S, I, D, P, C, B>
where
    P: OutputPin,
    C: SetDutyCycle,
    B: DelayNs,
{
    fn set_relay(&mut self, on: bool) {
        if on {
            if let Err(e) = self.relay.set(true) {
                warn!("Relay: switch on failed: {:?}", e);
            }
        } else {
            self.relay.force_off();
        }
    }

    fn set_indicator(&mut self, colour: Rgb) {
        if let Err(e) = self.led.set_colour(colour) {
            warn!("LED: set colour failed: {:?}", e);
        }
    }

    fn blink_indicator(&mut self, colour: Rgb, duration_ms: u32, count: u8) {
        if let Err(e) = self
            .led
            .blink(colour, duration_ms, count, &mut self.blink_delay)
        {
            warn!("LED: blink failed: {:?}", e);
        }
    }
}

// ── DisplayPort ───────────────────────────────────────────────

impl<S, I, D, P, C, B> DisplayPort for HardwareAdapter<S, I, D, P, C, B>
where
    I: I2c,
    D: DelayNs,
{
    fn clear(&mut self) {
        if let Err(e) = self.lcd.clear() {
            warn!("LCD: clear failed: {:?}", e);
        }
    }

    fn move_cursor(&mut self, col: u8, row: u8) {
        if let Err(e) = self.lcd.move_to(col, row) {
            warn!("LCD: move failed: {:?}", e);
        }
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.lcd.putstr(text) {
            warn!("LCD: write failed: {:?}", e);
        }
    }
}
