//! System configuration parameters
//!
//! All tunable parameters for the ventilation controller.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Fixed correction applied to one sensor's raw output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Added to the raw temperature (°C).
    pub temperature_offset: f32,
    /// Added to the raw relative humidity (%).
    pub humidity_offset: f32,
}

impl Calibration {
    /// No correction.
    pub const NONE: Self = Self {
        temperature_offset: 0.0,
        humidity_offset: 0.0,
    };
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Sensors ---
    /// Correction for the indoor sensor (sensor 1).
    pub indoor: Calibration,
    /// Correction for the outdoor sensor (sensor 2).
    pub outdoor: Calibration,

    // --- Relay decision ---
    /// Minimum dew point difference (K) at which the fan may run.
    pub switch_min: f32,
    /// Distance between switch-on and switch-off points (K).
    pub hysteresis: f32,
    /// Minimum indoor temperature (°C) for ventilation.
    pub indoor_temp_min: f32,
    /// Minimum outdoor temperature (°C) for ventilation.
    pub outdoor_temp_min: f32,

    // --- Timing ---
    /// Measurement trigger interval (milliseconds)
    pub measure_interval_ms: u32,
    /// Display/decide trigger interval (milliseconds)
    pub display_interval_ms: u32,
    /// Data log trigger interval (milliseconds)
    pub log_interval_ms: u32,
    /// How long a status screen stays up before a restart (milliseconds)
    pub status_hold_ms: u32,
    /// Settle delay between the restart message and the restart (milliseconds)
    pub restart_settle_ms: u32,
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,

    // --- Data log ---
    /// Flush once the buffer holds more records than this.
    pub log_flush_threshold: usize,
    /// Directory the log file lives in.
    pub storage_base_path: String,
    /// Log file name inside `storage_base_path`.
    pub log_file: String,
    /// Local time offset applied to log timestamps (minutes east of UTC).
    pub utc_offset_minutes: i16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Sensors
            indoor: Calibration {
                temperature_offset: -2.0,
                humidity_offset: 0.0,
            },
            outdoor: Calibration {
                temperature_offset: -1.0,
                humidity_offset: -1.0,
            },

            // Relay decision
            switch_min: 5.0,
            hysteresis: 1.0,
            indoor_temp_min: 10.0,
            outdoor_temp_min: -10.0,

            // Timing
            measure_interval_ms: 10_000, // 0.1 Hz
            display_interval_ms: 5_000,  // 0.2 Hz, pages alternate
            log_interval_ms: 600_000,    // 10 min
            status_hold_ms: 1_000,
            restart_settle_ms: 3_000,
            watchdog_timeout_ms: 30_000,

            // Data log
            log_flush_threshold: 144, // one day at 10-minute intervals
            storage_base_path: String::from("/storage"),
            log_file: String::from(crate::datalog::LOG_FILE_NAME),
            utc_offset_minutes: 60,
        }
    }
}

impl SystemConfig {
    /// Calibration for the given sensor slot.
    pub fn calibration(&self, sensor: crate::sensors::SensorId) -> Calibration {
        match sensor {
            crate::sensors::SensorId::Indoor => self.indoor,
            crate::sensors::SensorId::Outdoor => self.outdoor,
        }
    }

    /// Full path of the CSV data log.
    pub fn log_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.storage_base_path).join(&self.log_file)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for cal in [self.indoor, self.outdoor] {
            if !(-10.0..=10.0).contains(&cal.temperature_offset) {
                return Err(ConfigError::ValidationFailed(
                    "temperature_offset must be -10.0–10.0",
                ));
            }
            if !(-20.0..=20.0).contains(&cal.humidity_offset) {
                return Err(ConfigError::ValidationFailed(
                    "humidity_offset must be -20.0–20.0",
                ));
            }
        }
        if !(0.0..=30.0).contains(&self.switch_min) {
            return Err(ConfigError::ValidationFailed("switch_min must be 0.0–30.0"));
        }
        if !(0.0..=10.0).contains(&self.hysteresis) {
            return Err(ConfigError::ValidationFailed("hysteresis must be 0.0–10.0"));
        }
        if !(-40.0..=40.0).contains(&self.indoor_temp_min)
            || !(-40.0..=40.0).contains(&self.outdoor_temp_min)
        {
            return Err(ConfigError::ValidationFailed(
                "temperature minimums must be -40.0–40.0",
            ));
        }
        if self.measure_interval_ms == 0
            || self.display_interval_ms == 0
            || self.log_interval_ms == 0
        {
            return Err(ConfigError::ValidationFailed(
                "trigger intervals must be non-zero",
            ));
        }
        if self.watchdog_timeout_ms <= self.measure_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must exceed measure_interval_ms",
            ));
        }
        if self.log_flush_threshold == 0 {
            return Err(ConfigError::ValidationFailed(
                "log_flush_threshold must be non-zero",
            ));
        }
        if self.log_file.is_empty() {
            return Err(ConfigError::ValidationFailed("log_file must not be empty"));
        }
        Ok(())
    }
}
