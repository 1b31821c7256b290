//! Mock adapters for integration tests.
//!
//! Each mock records what the controller asked of it so tests can assert
//! on the full history without touching real peripherals.

use dewvent::app::events::AppEvent;
use dewvent::app::ports::{
    ActuatorPort, ClockPort, DisplayPort, EventSink, LogStoragePort, Rgb, SensorPort,
    StorageError, SystemPort,
};
use dewvent::error::SensorError;
use dewvent::sensors::{RawReading, SensorId};
use time::OffsetDateTime;
use time::macros::datetime;

const COLUMNS: usize = 16;

// ── MockHardware ──────────────────────────────────────────────

/// Scripted sensors, recorded actuators and a simulated 16×2 display.
pub struct MockHardware {
    /// What each sensor returns on the next read, indexed by `SensorId`.
    pub sensors: [Result<RawReading, SensorError>; 2],
    pub relay: bool,
    pub relay_writes: Vec<bool>,
    pub indicator: Rgb,
    pub blinks: Vec<(Rgb, u32, u8)>,
    pub clears: usize,
    rows: [[char; COLUMNS]; 2],
    cursor: (usize, usize),
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(indoor: (f32, f32), outdoor: (f32, f32)) -> Self {
        Self {
            sensors: [Ok(raw(indoor)), Ok(raw(outdoor))],
            relay: false,
            relay_writes: Vec::new(),
            indicator: (0, 0, 0),
            blinks: Vec::new(),
            clears: 0,
            rows: [[' '; COLUMNS]; 2],
            cursor: (0, 0),
        }
    }

    pub fn set_reading(&mut self, id: SensorId, temperature_c: f32, humidity_pct: f32) {
        self.sensors[id.index()] = Ok(raw((temperature_c, humidity_pct)));
    }

    pub fn fail(&mut self, id: SensorId, error: SensorError) {
        self.sensors[id.index()] = Err(error);
    }

    /// Text on `row` with trailing blanks removed.
    pub fn line(&self, row: usize) -> String {
        self.rows[row].iter().collect::<String>().trim_end().to_string()
    }
}

fn raw((temperature_c, humidity_pct): (f32, f32)) -> RawReading {
    RawReading {
        temperature_c,
        humidity_pct,
    }
}

impl SensorPort for MockHardware {
    fn read(&mut self, sensor: SensorId) -> Result<RawReading, SensorError> {
        self.sensors[sensor.index()]
    }
}

impl ActuatorPort for MockHardware {
    fn set_relay(&mut self, on: bool) {
        self.relay = on;
        self.relay_writes.push(on);
    }

    fn set_indicator(&mut self, colour: Rgb) {
        self.indicator = colour;
    }

    fn blink_indicator(&mut self, colour: Rgb, duration_ms: u32, count: u8) {
        self.blinks.push((colour, duration_ms, count));
    }
}

impl DisplayPort for MockHardware {
    fn clear(&mut self) {
        self.rows = [[' '; COLUMNS]; 2];
        self.cursor = (0, 0);
        self.clears += 1;
    }

    fn move_cursor(&mut self, col: u8, row: u8) {
        self.cursor = (usize::from(col), usize::from(row));
    }

    fn write(&mut self, text: &str) {
        let (mut col, row) = self.cursor;
        for c in text.chars() {
            if col >= COLUMNS {
                break;
            }
            self.rows[row][col] = c;
            col += 1;
        }
        self.cursor = (col, row);
    }
}

// ── MockStore ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockStore {
    pub contents: String,
    pub created: bool,
    pub appends: usize,
    /// When set, every append fails with this error.
    pub fail_with: Option<StorageError>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn lines(&self) -> Vec<&str> {
        self.contents.lines().collect()
    }
}

impl LogStoragePort for MockStore {
    fn exists(&self) -> bool {
        self.created
    }

    fn append(&mut self, text: &str) -> Result<(), StorageError> {
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        self.created = true;
        self.appends += 1;
        self.contents.push_str(text);
        Ok(())
    }
}

// ── FixedClock ────────────────────────────────────────────────

pub struct FixedClock(pub OffsetDateTime);

impl Default for FixedClock {
    fn default() -> Self {
        Self(datetime!(2024-03-05 14:07:09 +1))
    }
}

impl ClockPort for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

// ── MockSystem ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockSystem {
    pub delays: Vec<u32>,
    pub restarts: u32,
}

impl SystemPort for MockSystem {
    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }

    fn restart(&mut self) {
        self.restarts += 1;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
