//! Application core: pure domain logic, zero I/O.
//!
//! The [`Controller`](service::Controller) runs the measure, display and
//! log tasks, drives the sensor-health FSM and the relay decision, and
//! feeds the data log.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod events;
pub mod ports;
pub mod presenter;
pub mod service;
