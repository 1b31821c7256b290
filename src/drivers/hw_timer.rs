//! Periodic trigger timers.
//!
//! One periodic timer per [`Trigger`](crate::scheduler::Trigger).  A timer
//! callback does nothing but push its event id into the lock-free queue;
//! the task itself runs later on the main loop.
//!
//! On ESP-IDF each trigger is an `esp_timer` dispatched from the timer
//! task.  The event id travels in the callback's `arg` pointer, so no
//! state is shared with the callback.  On simulation targets a background
//! thread ticks a [`Scheduler`] every [`SIM_TICK_MS`].

use crate::error::{Error, Result};
use crate::scheduler::Scheduler;

#[cfg(target_os = "espidf")]
use crate::events::{Event, push_event};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(not(target_os = "espidf"))]
use crate::app::ports::TriggerDelegate;
#[cfg(not(target_os = "espidf"))]
use crate::events::{Event, EventQueue, PushResult};

use log::info;

/// Simulation tick resolution.
#[cfg(not(target_os = "espidf"))]
pub const SIM_TICK_MS: u32 = 10;

// ── ESP-IDF ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const TIMER_NAMES: [&core::ffi::CStr; Event::COUNT] = [c"measure", c"display", c"log"];

#[cfg(target_os = "espidf")]
unsafe extern "C" fn trigger_cb(arg: *mut core::ffi::c_void) {
    if let Some(event) = Event::from_u8(arg as usize as u8) {
        push_event(event);
    }
}

/// The running trigger set.  Dropping it stops every trigger.
#[cfg(target_os = "espidf")]
pub struct TriggerTimers {
    handles: [esp_timer_handle_t; Event::COUNT],
}

#[cfg(target_os = "espidf")]
impl TriggerTimers {
    /// Create and start one periodic timer per trigger.
    pub fn start(mut scheduler: Scheduler) -> Result<Self> {
        scheduler.start();
        let mut timers = Self {
            handles: [core::ptr::null_mut(); Event::COUNT],
        };

        for trigger in scheduler.triggers() {
            let idx = trigger.event.index();
            let args = esp_timer_create_args_t {
                callback: Some(trigger_cb),
                arg: trigger.event as u8 as usize as *mut core::ffi::c_void,
                dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
                name: TIMER_NAMES[idx].as_ptr(),
                skip_unhandled_events: false,
            };

            // SAFETY: `args` outlives the call; the handle slot is owned by
            // `timers`, whose Drop deletes whatever was created on failure.
            let ret = unsafe { esp_timer_create(&args, &mut timers.handles[idx]) };
            if ret != ESP_OK {
                log::error!("hw_timer: {} create failed (rc={})", trigger.event.name(), ret);
                return Err(Error::Init("trigger timer create"));
            }

            let period_us = u64::from(trigger.interval_ms) * 1_000;
            // SAFETY: handle was just created successfully.
            let ret = unsafe { esp_timer_start_periodic(timers.handles[idx], period_us) };
            if ret != ESP_OK {
                log::error!("hw_timer: {} start failed (rc={})", trigger.event.name(), ret);
                return Err(Error::Init("trigger timer start"));
            }
        }

        info!("hw_timer: {} triggers started", Event::COUNT);
        Ok(timers)
    }

    /// Administrative stop: tear down all triggers.  Idempotent.
    pub fn stop(&mut self) {
        for handle in &mut self.handles {
            if handle.is_null() {
                continue;
            }
            // SAFETY: non-null handles were created by `start` and are
            // nulled here, so each is stopped and deleted exactly once.
            // Stopping an already-stopped timer only returns an error code.
            unsafe {
                esp_timer_stop(*handle);
                esp_timer_delete(*handle);
            }
            *handle = core::ptr::null_mut();
        }
        info!("hw_timer: triggers stopped");
    }
}

#[cfg(target_os = "espidf")]
impl Drop for TriggerTimers {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Simulation ────────────────────────────────────────────────

/// Pushes fired triggers into a queue.
#[cfg(not(target_os = "espidf"))]
struct QueueDelegate<const N: usize> {
    queue: &'static EventQueue<N>,
}

#[cfg(not(target_os = "espidf"))]
impl<const N: usize> TriggerDelegate for QueueDelegate<N> {
    fn on_trigger(&mut self, event: Event) {
        if self.queue.push(event) == PushResult::Dropped {
            log::warn!("hw_timer(sim): queue full, {} dropped", event.name());
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub struct TriggerTimers {
    stop: std::sync::Arc<std::sync::atomic::AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(not(target_os = "espidf"))]
impl TriggerTimers {
    /// Start the triggers against the global queue.
    pub fn start(scheduler: Scheduler) -> Result<Self> {
        Self::start_on(scheduler, crate::events::global())
    }

    /// Start the triggers against `queue`.
    pub fn start_on<const N: usize>(
        mut scheduler: Scheduler,
        queue: &'static EventQueue<N>,
    ) -> Result<Self> {
        use std::sync::atomic::Ordering;

        let stop = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let stop_flag = std::sync::Arc::clone(&stop);
        scheduler.start();

        let thread = std::thread::Builder::new()
            .name("triggers".into())
            .spawn(move || {
                let mut delegate = QueueDelegate { queue };
                let tick = std::time::Duration::from_millis(u64::from(SIM_TICK_MS));
                while !stop_flag.load(Ordering::Acquire) {
                    std::thread::sleep(tick);
                    scheduler.tick(SIM_TICK_MS, &mut delegate);
                }
                scheduler.stop();
            })
            .map_err(|_| Error::Init("trigger thread spawn"))?;

        info!("hw_timer(sim): triggers started ({}ms resolution)", SIM_TICK_MS);
        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Administrative stop: the trigger thread exits and is joined, so no
    /// event is pushed after this returns.
    pub fn stop(&mut self) {
        self.stop.store(true, std::sync::atomic::Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
            info!("hw_timer(sim): triggers stopped");
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Drop for TriggerTimers {
    fn drop(&mut self) {
        self.stop();
    }
}
