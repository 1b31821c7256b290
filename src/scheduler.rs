//! Periodic trigger set.
//!
//! Three independent periodic triggers, one per deferred task.  The
//! scheduler notifies a [`TriggerDelegate`] when a trigger fires; the timer
//! driver implements the delegate by pushing into the event queue, so the
//! scheduler itself knows nothing about queues or interrupt contexts.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Trigger Set                              │
//! │                                                              │
//! │   ┌───────────┐      ┌───────────┐      ┌───────────┐        │
//! │   │ measure   │      │ display   │      │ log       │        │
//! │   │ every 10s │      │ every 5s  │      │ every 10m │        │
//! │   └─────┬─────┘      └─────┬─────┘      └─────┬─────┘        │
//! │         ▼                  ▼                  ▼              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              TriggerDelegate                           │  │
//! │  │       (timer context pushes into Event Queue)          │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! On ESP-IDF each trigger maps onto its own hardware `esp_timer` and only
//! the interval table is consulted.  On the host the timer driver ticks the
//! scheduler from a background thread.

use log::info;

use crate::app::ports::TriggerDelegate;
use crate::config::SystemConfig;
use crate::events::Event;

/// One periodic trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    /// The task this trigger defers.
    pub event: Event,
    /// Period in milliseconds.
    pub interval_ms: u32,
}

/// Internal bookkeeping for a live trigger.
#[derive(Debug, Clone, Copy)]
struct TriggerEntry {
    trigger: Trigger,
    /// Milliseconds since the last fire.
    elapsed_ms: u32,
    /// Fires since start.
    fires: u32,
}

/// The trigger engine.
pub struct Scheduler {
    entries: [TriggerEntry; Event::COUNT],
    running: bool,
}

impl Scheduler {
    /// Build the trigger set from explicit intervals (ms), indexed by event.
    pub fn new(measure_ms: u32, display_ms: u32, log_ms: u32) -> Self {
        let entry = |event, interval_ms: u32| TriggerEntry {
            trigger: Trigger {
                event,
                interval_ms: interval_ms.max(1),
            },
            elapsed_ms: 0,
            fires: 0,
        };
        Self {
            entries: [
                entry(Event::MeasureTick, measure_ms),
                entry(Event::DisplayTick, display_ms),
                entry(Event::LogTick, log_ms),
            ],
            running: false,
        }
    }

    /// Build the trigger set from the configured intervals.
    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(
            config.measure_interval_ms,
            config.display_interval_ms,
            config.log_interval_ms,
        )
    }

    /// Arm all triggers.  Elapsed time restarts from zero.
    pub fn start(&mut self) {
        for entry in &mut self.entries {
            entry.elapsed_ms = 0;
        }
        self.running = true;
        info!(
            "Scheduler: started (measure={}ms display={}ms log={}ms)",
            self.entries[0].trigger.interval_ms,
            self.entries[1].trigger.interval_ms,
            self.entries[2].trigger.interval_ms
        );
    }

    /// Administrative stop: disarm all three triggers.
    pub fn stop(&mut self) {
        if self.running {
            info!("Scheduler: stopped");
        }
        self.running = false;
    }

    /// Whether the triggers are armed.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The configured triggers, in event order.
    pub fn triggers(&self) -> impl Iterator<Item = Trigger> + '_ {
        self.entries.iter().map(|e| e.trigger)
    }

    /// Fires of `event`'s trigger since start.
    pub fn fires(&self, event: Event) -> u32 {
        self.entries[event.index()].fires
    }

    /// Advance every trigger by `delta_ms`.
    ///
    /// A trigger fires at most once per call; if more than one period
    /// elapsed (overrun), the missed periods collapse into that single fire.
    pub fn tick(&mut self, delta_ms: u32, delegate: &mut dyn TriggerDelegate) {
        if !self.running {
            return;
        }

        for entry in &mut self.entries {
            entry.elapsed_ms = entry.elapsed_ms.saturating_add(delta_ms);
            let interval = entry.trigger.interval_ms;
            if entry.elapsed_ms >= interval {
                entry.elapsed_ms %= interval;
                entry.fires = entry.fires.wrapping_add(1);
                delegate.on_trigger(entry.trigger.event);
            }
        }
    }
}
