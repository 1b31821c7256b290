//! Port traits: the hexagonal boundary between the controller and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (sensors, relay, display, storage, clock, restart)
//! implement these traits.  The [`Controller`](super::service::Controller)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use time::OffsetDateTime;

use crate::config::SystemConfig;
use crate::error::SensorError;
use crate::events::Event;
use crate::sensors::{RawReading, SensorId};

/// RGB colour, each channel 0–255.
pub type Rgb = (u8, u8, u8);

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the two humidity/temperature sensors.
pub trait SensorPort {
    /// Read one sensor.  Returns uncorrected values; calibration is the
    /// domain's job.
    fn read(&mut self, sensor: SensorId) -> Result<RawReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Fan relay and status indicator.
pub trait ActuatorPort {
    /// Switch the fan relay (`true` = venting).  Idempotent.
    fn set_relay(&mut self, on: bool);

    /// Set the indicator's steady colour.
    fn set_indicator(&mut self, colour: Rgb);

    /// Flash the indicator `count` times, `duration_ms` on and off, then
    /// return to the steady colour.
    fn blink_indicator(&mut self, colour: Rgb, duration_ms: u32, count: u8);
}

// ───────────────────────────────────────────────────────────────
// Display port
// ───────────────────────────────────────────────────────────────

/// 16×2 character display.
pub trait DisplayPort {
    fn clear(&mut self);

    /// Move the cursor to `col` (0–15) on `row` (0–1).
    fn move_cursor(&mut self, col: u8, row: u8);

    /// Write text at the cursor.  Characters past the end of the row are
    /// dropped.
    fn write(&mut self, text: &str);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Log storage port
// ───────────────────────────────────────────────────────────────

/// Append-only text file holding the CSV data log.
pub trait LogStoragePort {
    /// Whether the log file already exists.
    fn exists(&self) -> bool;

    /// Append `text` to the end of the file, creating it if needed.
    fn append(&mut self, text: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Clock and system ports
// ───────────────────────────────────────────────────────────────

/// Local wall-clock time for log timestamps.
pub trait ClockPort {
    fn now(&self) -> OffsetDateTime;
}

/// Blocking delays and the process restart.
pub trait SystemPort {
    fn delay_ms(&mut self, ms: u32);

    /// Re-initialise the whole controller.  On the device this does not
    /// return; test doubles record the call and return.
    fn restart(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Trigger delegate (decouples the scheduler from the event queue)
// ───────────────────────────────────────────────────────────────

/// Callback the [`Scheduler`](crate::scheduler::Scheduler) invokes when a
/// trigger fires.
///
/// The timer driver implements this by forwarding to
/// [`EventQueue::push`](crate::events::EventQueue::push); the scheduler
/// itself knows nothing about queues or interrupt contexts.  Implementations
/// run in the trigger context and must not allocate or block.
pub trait TriggerDelegate {
    fn on_trigger(&mut self, event: Event);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`LogStoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The storage partition could not be mounted.
    NotMounted,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotMounted => write!(f, "storage not mounted"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for StorageError {}
