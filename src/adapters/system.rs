//! Blocking delays and process restart.

use log::warn;

use crate::app::ports::SystemPort;

/// Exit status used on the host so a supervisor re-launches the process
/// (`EX_TEMPFAIL`).
#[cfg(not(target_os = "espidf"))]
pub const RESTART_EXIT_CODE: i32 = 75;

#[derive(Default)]
pub struct EspSystem;

impl EspSystem {
    pub fn new() -> Self {
        Self
    }
}

impl SystemPort for EspSystem {
    fn delay_ms(&mut self, ms: u32) {
        #[cfg(target_os = "espidf")]
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(ms);

        #[cfg(not(target_os = "espidf"))]
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }

    fn restart(&mut self) {
        warn!("System: restarting");

        #[cfg(target_os = "espidf")]
        // SAFETY: esp_restart does not return.
        unsafe {
            esp_idf_svc::sys::esp_restart();
        }

        #[cfg(not(target_os = "espidf"))]
        std::process::exit(RESTART_EXIT_CODE);
    }
}
