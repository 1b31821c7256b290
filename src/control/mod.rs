//! Pure control laws: dew point model and the relay hysteresis decision.

pub mod dewpoint;
pub mod relay;
