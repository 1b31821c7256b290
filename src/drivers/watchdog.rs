//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the device if the main loop stops draining events for longer
//! than the configured timeout.  The main loop calls [`Watchdog::feed`]
//! after every drained batch.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            // SAFETY: plain FFI calls with a config that outlives them; a
            // null task handle subscribes the current task.
            let subscribed = unsafe {
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!("Watchdog: reconfigure returned {} (already configured?)", ret);
                }
                let ret = esp_task_wdt_add(core::ptr::null_mut());
                if ret != ESP_OK {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }
                ret == ESP_OK
            };
            if subscribed {
                info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
            }
            Self {
                timeout_ms,
                subscribed,
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): no-op ({}ms)", timeout_ms);
            Self { timeout_ms }
        }
    }

    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: the task subscribed in `new`.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}
