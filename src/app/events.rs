//! Outbound application events.
//!
//! The [`Controller`](super::service::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::fsm::StateId;
use crate::sensors::{SensorId, SensorReading, SensorStatus};

/// Why the controller is re-initialising.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    /// A sensor driver call failed.
    SensorAcquisition,
    /// The data log could not be written.
    Storage,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller has started (carries initial state).
    Started(StateId),

    /// The sensor-health FSM transitioned.
    StateChanged { from: StateId, to: StateId },

    /// First healthy measurement after startup.
    SensorsOk,

    /// A sensor was invalid this cycle.
    SensorFault {
        sensor: SensorId,
        status: SensorStatus,
    },

    /// The fan relay switched.
    RelayChanged { on: bool, delta: f32 },

    /// Readings and dew points after a relay decision.
    Readings(TelemetryData),

    /// The data log buffer was written to storage.
    LogFlushed { records: usize },

    /// The restart sequence is about to re-initialise the controller.
    Restarting(RestartReason),
}

/// Snapshot emitted once per decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub indoor: SensorReading,
    pub outdoor: SensorReading,
    pub dew_point_indoor: f32,
    pub dew_point_outdoor: f32,
    pub fan_on: bool,
}

impl TelemetryData {
    pub fn delta(&self) -> f32 {
        self.dew_point_indoor - self.dew_point_outdoor
    }
}
