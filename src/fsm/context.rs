//! Shared mutable context threaded through every FSM handler.
//!
//! Handlers read the latest [`MeasureReport`] and write [`HealthCommands`]
//! that the controller applies after the tick.

use crate::sensors::{MeasureReport, SensorReading, SensorStatus};

/// Outputs written by state handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthCommands {
    /// Relay decisions may run on the current readings.
    pub decisions_enabled: bool,
    /// The controller must run the restart sequence.
    pub restart_requested: bool,
}

pub struct FsmContext {
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Total measurement cycles evaluated.
    pub total_ticks: u64,

    /// Latest measurement.  Written before each tick.
    pub report: MeasureReport,

    pub commands: HealthCommands,

    /// Set once, on the first healthy cycle after startup.
    announce_ok: bool,
}

impl FsmContext {
    pub fn new() -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            report: MeasureReport {
                readings: [SensorReading::default(); 2],
                status: [SensorStatus::Ok; 2],
            },
            commands: HealthCommands::default(),
            announce_ok: false,
        }
    }

    pub(crate) fn set_announce_ok(&mut self) {
        self.announce_ok = true;
    }

    /// Consume the one-time "sensors ok" flag.
    pub fn take_announce_ok(&mut self) -> bool {
        core::mem::take(&mut self.announce_ok)
    }
}

impl Default for FsmContext {
    fn default() -> Self {
        Self::new()
    }
}
