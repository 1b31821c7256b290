//! RGB status LED driver.
//!
//! Three PWM channels drive a common-cathode RGB LED.  Colours are 8-bit
//! per channel; a channel at 255 is fully on.

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::Rgb;

pub struct StatusLed<C> {
    red: C,
    green: C,
    blue: C,
    current: Rgb,
}

impl<C: SetDutyCycle> StatusLed<C> {
    pub fn new(red: C, green: C, blue: C) -> Result<Self, C::Error> {
        let mut led = Self {
            red,
            green,
            blue,
            current: (0, 0, 0),
        };
        led.off()?;
        Ok(led)
    }

    /// Set the steady colour.
    pub fn set_colour(&mut self, colour: Rgb) -> Result<(), C::Error> {
        self.write(colour)?;
        self.current = colour;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), C::Error> {
        self.set_colour((0, 0, 0))
    }

    /// Flash `colour` `count` times, then return to the steady colour.
    pub fn blink(
        &mut self,
        colour: Rgb,
        duration_ms: u32,
        count: u8,
        delay: &mut impl DelayNs,
    ) -> Result<(), C::Error> {
        for _ in 0..count {
            self.write(colour)?;
            delay.delay_ms(duration_ms);
            self.write((0, 0, 0))?;
            delay.delay_ms(duration_ms);
        }
        self.write(self.current)
    }

    pub fn current_colour(&self) -> Rgb {
        self.current
    }

    fn write(&mut self, (r, g, b): Rgb) -> Result<(), C::Error> {
        self.red.set_duty_cycle_fraction(u16::from(r), 255)?;
        self.green.set_duty_cycle_fraction(u16::from(g), 255)?;
        self.blue.set_duty_cycle_fraction(u16::from(b), 255)
    }
}
