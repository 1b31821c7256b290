//! Fixed-format status screens for the 16×2 character display.
//!
//! Every screen is two `heapless::String`s; nothing here allocates.
//!
//! ```text
//!  0123456789ABCDEF
//!  xxx°C|xx%|xx.x°C     readings page, one row per sensor
//!  Fan ON
//!  Delta DP: xx.x°C     ventilation page
//! ```

use core::fmt::Write as _;

use heapless::String;

use super::ports::DisplayPort;
use crate::control::dewpoint::dew_point;
use crate::sensors::{MeasureReport, SensorId, SensorReading, SensorStatus};

/// Display width in characters.
pub const COLUMNS: usize = 16;
/// Display height in rows.
pub const ROWS: usize = 2;

/// Byte capacity of one row.  `°` is two bytes in UTF-8.
pub type Line = String<32>;

/// One full display frame.  Empty lines leave the row blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    pub lines: [Line; ROWS],
}

/// Page shown on the next display tick while monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Readings,
    Ventilation,
}

impl Page {
    pub fn next(self) -> Self {
        match self {
            Self::Readings => Self::Ventilation,
            Self::Ventilation => Self::Readings,
        }
    }
}

impl Screen {
    fn from_lines(top: &str, bottom: &str) -> Self {
        let mut screen = Self::default();
        // Fixed texts always fit.
        let _ = screen.lines[0].push_str(top);
        let _ = screen.lines[1].push_str(bottom);
        screen
    }

    /// Shown while the sensors warm up after power-on.
    pub fn testing_sensors() -> Self {
        Self::from_lines("Testing sensors", "")
    }

    /// Per-sensor status after a measurement.
    ///
    /// Faulty sensors always get a line; healthy ones only on the first
    /// run.  Returns `None` when there is nothing to say.
    pub fn sensor_status(report: &MeasureReport, first_run: bool) -> Option<Self> {
        if report.all_ok() && !first_run {
            return None;
        }
        let mut screen = Self::default();
        for id in SensorId::ALL {
            let line = &mut screen.lines[id.index()];
            let _ = match report.status(id) {
                SensorStatus::Ok if first_run => write!(line, "Sensor {} ok", id.number()),
                SensorStatus::Ok => Ok(()),
                SensorStatus::OutOfRange | SensorStatus::ReadFailed(_) => {
                    write!(line, "Sensor {} fault", id.number())
                }
            };
        }
        Some(screen)
    }

    /// Temperature, humidity and dew point of both sensors.
    pub fn readings(indoor: &SensorReading, outdoor: &SensorReading) -> Self {
        let mut screen = Self::default();
        for (line, r) in screen.lines.iter_mut().zip([indoor, outdoor]) {
            let _ = write!(
                line,
                "{:3}°C|{:2}%|{:4.1}°C",
                r.temperature.round() as i32,
                r.humidity.round() as i32,
                dew_point(r.temperature, r.humidity)
            );
        }
        screen
    }

    /// Relay state and dew point difference.
    pub fn ventilation(fan_on: bool, delta: f32) -> Self {
        let mut screen = Self::from_lines(if fan_on { "Fan ON" } else { "Fan OFF" }, "");
        let _ = write!(screen.lines[1], "Delta DP:{:4.1}°C", delta);
        screen
    }

    /// Last screen before the restart.
    pub fn restarting() -> Self {
        Self::from_lines("Restarting CPU..", "")
    }

    pub fn line(&self, row: usize) -> &str {
        self.lines[row].as_str()
    }
}

/// Clear the display and draw `screen`.
pub fn render(display: &mut impl DisplayPort, screen: &Screen) {
    display.clear();
    for (row, line) in screen.lines.iter().enumerate() {
        if !line.is_empty() {
            display.move_cursor(0, row as u8);
            display.write(line);
        }
    }
}
