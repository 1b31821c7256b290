//! Fuzz target: `dht22::decode_frame`
//!
//! Arbitrary 5-byte frames must never panic.  A frame that passes the
//! checksum must decode to finite values inside the sensor's encodable
//! range, and flipping the checksum byte must always be rejected.
//!
//! cargo fuzz run fuzz_dht22_frame

#![no_main]

use dewvent::error::SensorError;
use dewvent::sensors::dht22::decode_frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = <[u8; 5]>::try_from(data) else {
        return;
    };

    if let Ok(raw) = decode_frame(&frame) {
        assert!(raw.humidity_pct.is_finite() && raw.temperature_c.is_finite());
        assert!((0.0..=6553.5).contains(&raw.humidity_pct));
        assert!(raw.temperature_c.abs() <= 3276.7);

        let mut corrupt = frame;
        corrupt[4] = corrupt[4].wrapping_add(1);
        assert_eq!(decode_frame(&corrupt), Err(SensorError::ChecksumMismatch));
    }
});
