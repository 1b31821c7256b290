//! Wall-clock adapter.
//!
//! Implements [`ClockPort`] from the system clock (`gettimeofday` via std
//! on ESP-IDF) shifted by a fixed UTC offset.  There is no network time:
//! on the device the clock counts from whatever the RTC holds.

use ::time::{OffsetDateTime, UtcOffset};
use log::warn;

use crate::app::ports::ClockPort;

/// Timestamps before this are treated as an unset clock.
const EPOCH_2020: i64 = 1_577_836_800;

pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    /// `offset_minutes` east of UTC.  Out-of-range offsets fall back to UTC.
    pub fn new(offset_minutes: i16) -> Self {
        let offset = UtcOffset::from_whole_seconds(i32::from(offset_minutes) * 60).unwrap_or_else(
            |_| {
                warn!("SystemClock: invalid UTC offset {}min, using UTC", offset_minutes);
                UtcOffset::UTC
            },
        );
        Self { offset }
    }

    /// Whether the clock looks like it has been set.
    pub fn is_set(&self) -> bool {
        OffsetDateTime::now_utc().unix_timestamp() >= EPOCH_2020
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_offset() {
        let clock = SystemClock::new(60);
        assert_eq!(clock.now().offset().whole_minutes(), 60);
    }

    #[test]
    fn invalid_offset_falls_back_to_utc() {
        assert_eq!(SystemClock::new(i16::MAX).offset(), UtcOffset::UTC);
    }

    #[test]
    fn host_clock_is_set() {
        assert!(SystemClock::new(0).is_set());
    }
}
