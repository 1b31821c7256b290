//! Sensor subsystem: the two humidity/temperature sensors and the
//! [`SensorReader`] that turns raw driver output into validated readings.
//!
//! The reader applies each sensor's fixed calibration offset and then
//! range-checks the corrected values.  Only corrected values are ever
//! stored; a reading outside the plausible range is kept but marked
//! invalid.

pub mod dht22;

use log::{debug, warn};

use crate::app::ports::SensorPort;
use crate::config::{Calibration, SystemConfig};
use crate::error::SensorError;

/// Plausible relative humidity (%), inclusive.
pub const HUMIDITY_RANGE: core::ops::RangeInclusive<f32> = 1.0..=100.0;
/// Plausible temperature (°C), inclusive.
pub const TEMPERATURE_RANGE: core::ops::RangeInclusive<f32> = -40.0..=80.0;

/// Sensor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorId {
    /// Sensor 1, inside the ventilated room.
    Indoor = 0,
    /// Sensor 2, outside air.
    Outdoor = 1,
}

impl SensorId {
    pub const ALL: [SensorId; 2] = [Self::Indoor, Self::Outdoor];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// 1-based number used on the display and in the data log.
    pub const fn number(self) -> u8 {
        self as u8 + 1
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Indoor => "indoor",
            Self::Outdoor => "outdoor",
        }
    }
}

/// Uncorrected driver output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Calibrated reading of one sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Corrected temperature (°C).
    pub temperature: f32,
    /// Corrected relative humidity (%).
    pub humidity: f32,
    /// `false` when acquisition failed or a value is out of range.
    pub valid: bool,
}

impl Default for SensorReading {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            valid: false,
        }
    }
}

impl SensorReading {
    /// Apply `cal` to `raw` and range-check the result.
    pub fn calibrated(raw: RawReading, cal: Calibration) -> Self {
        let temperature = raw.temperature_c + cal.temperature_offset;
        let humidity = raw.humidity_pct + cal.humidity_offset;
        Self {
            temperature,
            humidity,
            valid: HUMIDITY_RANGE.contains(&humidity) && TEMPERATURE_RANGE.contains(&temperature),
        }
    }
}

/// Per-sensor outcome of one measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStatus {
    Ok,
    /// Read succeeded but the corrected values are implausible.
    OutOfRange,
    /// The driver call itself failed.
    ReadFailed(SensorError),
}

/// Result of [`SensorReader::measure`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureReport {
    pub readings: [SensorReading; 2],
    pub status: [SensorStatus; 2],
}

impl MeasureReport {
    pub fn reading(&self, id: SensorId) -> &SensorReading {
        &self.readings[id.index()]
    }

    pub fn status(&self, id: SensorId) -> SensorStatus {
        self.status[id.index()]
    }

    /// Any sensor invalid this cycle.
    pub fn fault(&self) -> bool {
        !self.all_ok()
    }

    /// Any driver call failed this cycle.
    pub fn acquisition_failed(&self) -> bool {
        self.status
            .iter()
            .any(|s| matches!(s, SensorStatus::ReadFailed(_)))
    }

    pub fn all_ok(&self) -> bool {
        self.status.iter().all(|s| *s == SensorStatus::Ok)
    }
}

/// Driver-level contract for a single humidity/temperature sensor.
pub trait HumiditySensor {
    fn read(&mut self) -> Result<RawReading, SensorError>;
}

/// Reads both sensors and applies calibration.
pub struct SensorReader {
    calibration: [Calibration; 2],
}

impl SensorReader {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            calibration: [
                config.calibration(SensorId::Indoor),
                config.calibration(SensorId::Outdoor),
            ],
        }
    }

    /// One measurement cycle.  Both sensors are always read, even when the
    /// first one fails, so the report carries the status of each.
    pub fn measure(&self, port: &mut impl SensorPort) -> MeasureReport {
        let mut report = MeasureReport {
            readings: [SensorReading::default(); 2],
            status: [SensorStatus::Ok; 2],
        };

        for id in SensorId::ALL {
            let idx = id.index();
            match port.read(id) {
                Ok(raw) => {
                    let reading = SensorReading::calibrated(raw, self.calibration[idx]);
                    if !reading.valid {
                        warn!(
                            "Sensor {} ({}): out of range t={:.1}°C h={:.1}%",
                            id.number(),
                            id.label(),
                            reading.temperature,
                            reading.humidity
                        );
                        report.status[idx] = SensorStatus::OutOfRange;
                    } else {
                        debug!(
                            "Sensor {}: t={:.1}°C h={:.1}%",
                            id.number(),
                            reading.temperature,
                            reading.humidity
                        );
                    }
                    report.readings[idx] = reading;
                }
                Err(e) => {
                    warn!("Sensor {} ({}): read failed: {}", id.number(), id.label(), e);
                    report.status[idx] = SensorStatus::ReadFailed(e);
                }
            }
        }

        report
    }
}
