//! DHT22 / AM2302 single-wire humidity and temperature sensor.
//!
//! The data line is open-drain with an external pull-up.  A read is:
//!
//! ```text
//! host:   ‾‾‾|____ ≥1ms ____|‾‾ release
//! sensor:                       |__80µs__|‾‾80µs‾‾|  40 × bit
//! bit:    |__50µs__|‾‾ 26µs = 0 / 70µs = 1 ‾‾|
//! ```
//!
//! `embedded-hal` has no input-capture abstraction, so pulse widths are
//! measured by polling in 1 µs steps.  A bit is `1` when its high phase
//! outlasts the low phase in front of it, which keeps the decision
//! independent of the polling overhead on the target.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use super::{HumiditySensor, RawReading};
use crate::error::SensorError;

/// Host start pulse.
const START_LOW_US: u32 = 1_100;
/// Longest level the protocol ever holds is 80 µs.
const LEVEL_TIMEOUT_US: u32 = 100;
const FRAME_BITS: usize = 40;

/// DHT22 driver over an open-drain pin.
pub struct Dht22<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Takes ownership of the data pin.  The line is released (high).
    pub fn new(mut pin: P, delay: D) -> Result<Self, SensorError> {
        pin.set_high().map_err(|_| SensorError::Bus)?;
        Ok(Self { pin, delay })
    }

    /// Run one full transfer and decode it.
    pub fn measure(&mut self) -> Result<RawReading, SensorError> {
        let frame = self.read_frame()?;
        decode_frame(&frame)
    }

    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        self.pin.set_low().map_err(|_| SensorError::Bus)?;
        self.delay.delay_us(START_LOW_US);
        self.pin.set_high().map_err(|_| SensorError::Bus)?;

        // Response: sensor pulls low, then high, then low for the first bit.
        self.wait_for(false).map_err(|_| SensorError::NoResponse)?;
        self.wait_for(true).map_err(|_| SensorError::NoResponse)?;
        self.wait_for(false).map_err(|_| SensorError::NoResponse)?;

        let mut frame = [0u8; 5];
        for bit in 0..FRAME_BITS {
            let low = self.wait_for(true)?;
            let high = self.wait_for(false)?;
            if high > low {
                frame[bit / 8] |= 1 << (7 - bit % 8);
            }
        }
        Ok(frame)
    }

    /// Poll until the line reads `level`.  Returns the microseconds spent
    /// on the opposite level.
    fn wait_for(&mut self, level: bool) -> Result<u32, SensorError> {
        let mut elapsed = 0;
        while self.pin.is_high().map_err(|_| SensorError::Bus)? != level {
            if elapsed >= LEVEL_TIMEOUT_US {
                return Err(SensorError::Timeout);
            }
            self.delay.delay_us(1);
            elapsed += 1;
        }
        Ok(elapsed)
    }
}

impl<P, D> HumiditySensor for Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read(&mut self) -> Result<RawReading, SensorError> {
        self.measure()
    }
}

/// Validate and decode a 5-byte DHT22 frame.
///
/// Bytes 0–1: humidity × 10, bytes 2–3: temperature × 10 with bit 15 as the
/// sign, byte 4: low byte of the sum of bytes 0–3.
pub fn decode_frame(frame: &[u8; 5]) -> Result<RawReading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::ChecksumMismatch);
    }

    let humidity = u16::from_be_bytes([frame[0], frame[1]]) as f32 / 10.0;
    let magnitude = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]) as f32 / 10.0;
    let temperature = if frame[2] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    };

    Ok(RawReading {
        temperature_c: temperature,
        humidity_pct: humidity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    /// Plays back one line level per `is_high()` call; the last level
    /// repeats forever.
    struct ScriptedPin {
        levels: Vec<bool>,
        pos: usize,
    }

    impl embedded_hal::digital::ErrorType for ScriptedPin {
        type Error = Infallible;
    }

    impl InputPin for ScriptedPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            let level = self.levels[self.pos.min(self.levels.len() - 1)];
            self.pos += 1;
            Ok(level)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|h| !h)
        }
    }

    impl OutputPin for ScriptedPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn push(levels: &mut Vec<bool>, level: bool, n: usize) {
        levels.extend(core::iter::repeat_n(level, n));
    }

    /// Line waveform of a sensor answering with `frame`, one sample per µs
    /// (scaled down by 10).
    fn waveform(frame: &[u8; 5]) -> Vec<bool> {
        let mut levels = Vec::new();
        push(&mut levels, true, 3);
        push(&mut levels, false, 8);
        push(&mut levels, true, 8);
        for bit in 0..FRAME_BITS {
            let one = frame[bit / 8] & (1 << (7 - bit % 8)) != 0;
            push(&mut levels, false, 5);
            push(&mut levels, true, if one { 7 } else { 3 });
        }
        push(&mut levels, false, 5);
        push(&mut levels, true, 1);
        levels
    }

    fn sensor(levels: Vec<bool>) -> Dht22<ScriptedPin, NoDelay> {
        Dht22::new(ScriptedPin { levels, pos: 0 }, NoDelay).unwrap()
    }

    #[test]
    fn decodes_positive_frame() {
        let r = decode_frame(&[0x02, 0x8C, 0x01, 0x5F, 0xEE]).unwrap();
        assert!((r.humidity_pct - 65.2).abs() < 1e-4);
        assert!((r.temperature_c - 35.1).abs() < 1e-4);
    }

    #[test]
    fn decodes_negative_temperature() {
        let r = decode_frame(&[0x01, 0x90, 0x80, 0x65, 0x76]).unwrap();
        assert!((r.humidity_pct - 40.0).abs() < 1e-4);
        assert!((r.temperature_c + 10.1).abs() < 1e-4);
    }

    #[test]
    fn rejects_bad_checksum() {
        assert_eq!(
            decode_frame(&[0x02, 0x8C, 0x01, 0x5F, 0xEF]),
            Err(SensorError::ChecksumMismatch)
        );
    }

    #[test]
    fn reads_frame_off_the_wire() {
        let frame = [0x02, 0x8C, 0x01, 0x5F, 0xEE];
        let mut dht = sensor(waveform(&frame));
        let r = dht.measure().unwrap();
        assert!((r.humidity_pct - 65.2).abs() < 1e-4);
        assert!((r.temperature_c - 35.1).abs() < 1e-4);
    }

    #[test]
    fn silent_line_is_no_response() {
        let mut dht = sensor(vec![true]);
        assert_eq!(dht.measure(), Err(SensorError::NoResponse));
    }

    #[test]
    fn line_stuck_mid_frame_times_out() {
        let frame = [0x02, 0x8C, 0x01, 0x5F, 0xEE];
        let mut levels = waveform(&frame);
        levels.truncate(60);
        levels.push(false);
        let mut dht = sensor(levels);
        assert_eq!(dht.measure(), Err(SensorError::Timeout));
    }
}
