//! Fuzz target: stored config blob
//!
//! Feeds arbitrary bytes to the postcard decoder the NVS adapter uses and
//! checks that anything that decodes and validates survives a re-encode.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use dewvent::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = postcard::from_bytes::<SystemConfig>(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }

    let bytes = postcard::to_allocvec(&cfg).expect("valid config must encode");
    let again: SystemConfig = postcard::from_bytes(&bytes).expect("re-decode");
    assert_eq!(again.log_file, cfg.log_file);
    assert_eq!(again.log_flush_threshold, cfg.log_flush_threshold);
});
