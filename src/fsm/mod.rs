//! Function-pointer finite state machine engine for sensor health.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  StateTable                                                │
//! │  ┌────────────┬───────────┬──────────┬──────────────────┐  │
//! │  │ StateId    │ on_enter  │ on_exit  │ on_update        │  │
//! │  ├────────────┼───────────┼──────────┼──────────────────┤  │
//! │  │ Starting   │ fn(ctx)   │ -        │ fn(ctx)->Option<>│  │
//! │  │ Monitoring │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<>│  │
//! │  │ Degraded   │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<>│  │
//! │  │ Restarting │ fn(ctx)   │ -        │ fn(ctx)->Option<>│  │
//! │  └────────────┴───────────┴──────────┴──────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The controller ticks the engine once per measurement, after writing the
//! fresh [`MeasureReport`](crate::sensors::MeasureReport) into the context.
//! If `on_update` returns `Some(next)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Sensor-health states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// No measurement evaluated yet.
    Starting = 0,
    /// Both sensors valid; relay decisions enabled.
    Monitoring = 1,
    /// A reading is out of range; relay held off.
    Degraded = 2,
    /// Acquisition failed; the restart sequence runs.  Terminal.
    Restarting = 3,
}

impl StateId {
    pub const COUNT: usize = 4;

    /// Convert an index back to `StateId`.  Out-of-range indices assert in
    /// debug builds and map to `Degraded` (relay off, no restart) in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Starting,
            1 => Self::Monitoring,
            2 => Self::Degraded,
            3 => Self::Restarting,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Degraded
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// `on_enter` / `on_exit` action.
pub type StateActionFn = fn(&mut FsmContext);

/// Per-tick update.  Returns `Some(next)` to transition.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

/// One row in the state table.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
    tick_count: u64,
    state_entry_tick: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter`.  Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Evaluate the current state against the context.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Jump to `next` regardless of what `on_update` would return.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::context::FsmContext;
    use super::*;
    use crate::error::SensorError;
    use crate::sensors::{MeasureReport, SensorReading, SensorStatus};
    use proptest::prelude::*;

    fn arb_status() -> impl Strategy<Value = SensorStatus> {
        prop_oneof![
            4 => Just(SensorStatus::Ok),
            2 => Just(SensorStatus::OutOfRange),
            1 => Just(SensorStatus::ReadFailed(SensorError::Timeout)),
        ]
    }

    proptest! {
        #[test]
        fn decisions_only_enabled_when_monitoring(
            cycles in proptest::collection::vec((arb_status(), arb_status()), 1..60)
        ) {
            let mut fsm = Fsm::new(states::build_state_table(), StateId::Starting);
            let mut ctx = FsmContext::new();
            fsm.start(&mut ctx);

            let mut failed = false;
            for (a, b) in cycles {
                let reading = SensorReading { temperature: 20.0, humidity: 50.0, valid: true };
                ctx.report = MeasureReport { readings: [reading; 2], status: [a, b] };
                fsm.tick(&mut ctx);
                failed |= ctx.report.acquisition_failed();

                let state = fsm.current_state();
                prop_assert_eq!(ctx.commands.decisions_enabled, state == StateId::Monitoring);
                prop_assert_eq!(state == StateId::Restarting, failed);
            }
        }
    }
}
