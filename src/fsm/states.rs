//! Concrete state handler functions and table builder.
//!
//! ```text
//!  STARTING ──[ok]──────────▶ MONITORING ◀──[ok]── DEGRADED
//!     │                          │                    ▲
//!     └──[out of range]──────────┴──[out of range]────┘
//!
//!  Any state ──[acquisition failed]──▶ RESTARTING (terminal)
//! ```

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use log::{info, warn};

/// Build the state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::Starting,
            name: "Starting",
            on_enter: Some(hold_relay),
            on_exit: None,
            on_update: starting_update,
        },
        StateDescriptor {
            id: StateId::Monitoring,
            name: "Monitoring",
            on_enter: Some(monitoring_enter),
            on_exit: Some(monitoring_exit),
            on_update: monitoring_update,
        },
        StateDescriptor {
            id: StateId::Degraded,
            name: "Degraded",
            on_enter: Some(degraded_enter),
            on_exit: Some(degraded_exit),
            on_update: degraded_update,
        },
        StateDescriptor {
            id: StateId::Restarting,
            name: "Restarting",
            on_enter: Some(restarting_enter),
            on_exit: None,
            on_update: restarting_update,
        },
    ]
}

/// Acquisition failure beats everything.
fn classify(ctx: &FsmContext) -> StateId {
    if ctx.report.acquisition_failed() {
        StateId::Restarting
    } else if ctx.report.fault() {
        StateId::Degraded
    } else {
        StateId::Monitoring
    }
}

fn hold_relay(ctx: &mut FsmContext) {
    ctx.commands.decisions_enabled = false;
}

// ── STARTING ─────────────────────────────────────────────────

fn starting_update(ctx: &mut FsmContext) -> Option<StateId> {
    let next = classify(ctx);
    if next == StateId::Monitoring {
        ctx.set_announce_ok();
    }
    Some(next)
}

// ── MONITORING ───────────────────────────────────────────────

fn monitoring_enter(ctx: &mut FsmContext) {
    ctx.commands.decisions_enabled = true;
    info!("MONITORING: both sensors valid, relay decisions enabled");
}

fn monitoring_exit(ctx: &mut FsmContext) {
    ctx.commands.decisions_enabled = false;
}

fn monitoring_update(ctx: &mut FsmContext) -> Option<StateId> {
    match classify(ctx) {
        StateId::Monitoring => None,
        next => Some(next),
    }
}

// ── DEGRADED ─────────────────────────────────────────────────

fn degraded_enter(ctx: &mut FsmContext) {
    hold_relay(ctx);
    warn!("DEGRADED: implausible reading, relay held off");
}

fn degraded_exit(ctx: &mut FsmContext) {
    info!("DEGRADED: cleared after {} cycles", ctx.ticks_in_state);
}

fn degraded_update(ctx: &mut FsmContext) -> Option<StateId> {
    match classify(ctx) {
        StateId::Degraded => None,
        next => Some(next),
    }
}

// ── RESTARTING ───────────────────────────────────────────────

fn restarting_enter(ctx: &mut FsmContext) {
    hold_relay(ctx);
    ctx.commands.restart_requested = true;
    warn!("RESTARTING: controller will re-initialise");
}

fn restarting_update(_ctx: &mut FsmContext) -> Option<StateId> {
    None
}
