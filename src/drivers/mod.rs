//! Peripheral drivers and timer plumbing.
//!
//! The drivers are generic over `embedded-hal` traits so they can be
//! exercised on the host with mock pins and buses.

pub mod hw_timer;
pub mod lcd;
pub mod relay;
pub mod status_led;
pub mod watchdog;
