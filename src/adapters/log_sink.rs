//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production).  Each line starts with a
//! fixed tag so the console output can be grepped.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::sensors::SensorReading;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

fn readout(r: &SensorReading, dew_point: f32) -> impl core::fmt::Display + '_ {
    struct Readout<'a>(&'a SensorReading, f32);
    impl core::fmt::Display for Readout<'_> {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            write!(
                f,
                "{:.1}\u{00b0}C|{:.1}%|{:.1}\u{00b0}C",
                self.0.temperature, self.0.humidity, self.1
            )
        }
    }
    Readout(r, dew_point)
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Readings(t) => {
                info!(
                    "TELEM | S1: {} | S2: {} | delta={:.1} | fan={}",
                    readout(&t.indoor, t.dew_point_indoor),
                    readout(&t.outdoor, t.dew_point_outdoor),
                    t.delta(),
                    on_off(t.fan_on),
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::SensorsOk => {
                info!("SENSOR | all ok");
            }
            AppEvent::SensorFault { sensor, status } => {
                warn!("SENSOR | {} ({}) {:?}", sensor.number(), sensor.label(), status);
            }
            AppEvent::RelayChanged { on, delta } => {
                info!("RELAY | fan={} delta={:.1}", on_off(*on), delta);
            }
            AppEvent::LogFlushed { records } => {
                info!("LOG | flushed records={}", records);
            }
            AppEvent::Restarting(reason) => {
                warn!("RESTART | reason={:?}", reason);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
        }
    }
}
