//! Dew-point ventilation controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod datalog;
pub mod error;
pub mod events;
pub mod fsm;
pub mod scheduler;
pub mod sensors;

// Concrete hardware and storage; generic over embedded-hal so they build
// and test on the host too.
pub mod adapters;
pub mod drivers;

#[cfg(target_os = "espidf")]
mod esp_link_shims;
