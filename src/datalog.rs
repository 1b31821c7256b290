//! Buffered CSV data log.
//!
//! Records accumulate in memory and are written to the log file in one
//! batch, either when the buffer grows past its threshold or on a forced
//! flush.  The hand-off is a swap: under the lock the filled buffer is
//! replaced by an empty one, and the file write happens after the lock is
//! released.  Producers are only ever blocked for the swap, never for I/O.
//!
//! File format:
//!
//! ```text
//! Date,t1,h1,tp1,t2,h2,tp2,fan
//! 18.10.2026 14:30:00,22.30,40.50,8.24,7.60,39.30,-5.35,True
//! ```

use core::cell::RefCell;
use core::fmt::Write as _;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{info, warn};
use time::OffsetDateTime;

use crate::app::ports::{LogStoragePort, StorageError};
use crate::control::dewpoint::dew_point;
use crate::sensors::SensorReading;

/// Default log file name.
pub const LOG_FILE_NAME: &str = "taupunkt.csv";

/// First line of a new log file.
pub const CSV_HEADER: &str = "Date,t1,h1,tp1,t2,h2,tp2,fan";

/// Default flush threshold: one day at 10-minute intervals.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 144;

/// One row of the data log.  Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    pub timestamp: OffsetDateTime,
    pub t1: f32,
    pub h1: f32,
    pub dp1: f32,
    pub t2: f32,
    pub h2: f32,
    pub dp2: f32,
    pub fan_on: bool,
}

impl LogRecord {
    /// Build a record from two valid readings; dew points are derived here.
    pub fn from_readings(
        timestamp: OffsetDateTime,
        indoor: &SensorReading,
        outdoor: &SensorReading,
        fan_on: bool,
    ) -> Self {
        Self {
            timestamp,
            t1: indoor.temperature,
            h1: indoor.humidity,
            dp1: dew_point(indoor.temperature, indoor.humidity),
            t2: outdoor.temperature,
            h2: outdoor.humidity,
            dp2: dew_point(outdoor.temperature, outdoor.humidity),
            fan_on,
        }
    }

    /// Append this record as one CSV line (with trailing newline).
    pub fn write_csv(&self, out: &mut String) {
        let ts = self.timestamp;
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{:02}.{:02}.{:04} {:02}:{:02}:{:02},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{}",
            ts.day(),
            u8::from(ts.month()),
            ts.year(),
            ts.hour(),
            ts.minute(),
            ts.second(),
            self.t1,
            self.h1,
            self.dp1,
            self.t2,
            self.h2,
            self.dp2,
            if self.fan_on { "True" } else { "False" },
        );
    }

    pub fn to_csv_line(&self) -> String {
        let mut line = String::with_capacity(64);
        self.write_csv(&mut line);
        line
    }
}

/// In-memory record buffer shared between the log task and the flusher.
pub struct LogBuffer {
    records: Mutex<CriticalSectionRawMutex, RefCell<Vec<LogRecord>>>,
    threshold: usize,
}

impl LogBuffer {
    pub fn new(threshold: usize) -> Self {
        Self {
            records: Mutex::new(RefCell::new(Vec::with_capacity(threshold + 1))),
            threshold,
        }
    }

    /// Add a record to the tail.
    pub fn append(&self, record: LogRecord) {
        self.records.lock(|cell| cell.borrow_mut().push(record));
    }

    pub fn len(&self) -> usize {
        self.records.lock(|cell| cell.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Swap the buffer out for an empty one and return its contents.
    pub fn take(&self) -> Vec<LogRecord> {
        self.records
            .lock(|cell| core::mem::take(&mut *cell.borrow_mut()))
    }

    /// Flush to `store` if `force` is set or the buffer holds more than
    /// `threshold` records.
    ///
    /// Returns `Ok(Some(n))` with the number of records written, or
    /// `Ok(None)` if no flush was due.  On a write error the batch is put
    /// back in front of anything appended meanwhile, so nothing is lost.
    pub fn maybe_flush(
        &self,
        force: bool,
        store: &mut impl LogStoragePort,
    ) -> Result<Option<usize>, StorageError> {
        let batch = self.records.lock(|cell| {
            let mut records = cell.borrow_mut();
            (force || records.len() > self.threshold).then(|| core::mem::take(&mut *records))
        });

        let Some(batch) = batch else {
            return Ok(None);
        };
        if batch.is_empty() {
            return Ok(Some(0));
        }

        let mut text = String::with_capacity((batch.len() + 1) * 64);
        if !store.exists() {
            text.push_str(CSV_HEADER);
            text.push('\n');
        }
        for record in &batch {
            record.write_csv(&mut text);
        }

        match store.append(&text) {
            Ok(()) => {
                info!("Datalog: flushed {} records", batch.len());
                Ok(Some(batch.len()))
            }
            Err(e) => {
                warn!("Datalog: flush of {} records failed: {}", batch.len(), e);
                self.restore(batch);
                Err(e)
            }
        }
    }

    fn restore(&self, mut batch: Vec<LogRecord>) {
        self.records.lock(|cell| {
            let mut records = cell.borrow_mut();
            batch.append(&mut records);
            *records = batch;
        });
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_THRESHOLD)
    }
}
