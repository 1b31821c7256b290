//! Integration tests for the Controller → FSM → relay → data log pipeline.
//!
//! Every test drives the controller one task at a time, the way the main
//! loop does after draining the event queue.

use super::mock_hw::{FixedClock, MockHardware, MockStore, MockSystem, RecordingSink};

use dewvent::app::events::{AppEvent, RestartReason};
use dewvent::app::ports::StorageError;
use dewvent::app::service::{COLOUR_CLOSED, COLOUR_FAULT, COLOUR_MEASURE, COLOUR_VENTING};
use dewvent::app::service::{Controller, Flow};
use dewvent::config::{Calibration, SystemConfig};
use dewvent::datalog::CSV_HEADER;
use dewvent::error::SensorError;
use dewvent::events::Event;
use dewvent::fsm::StateId;
use dewvent::sensors::{SensorId, SensorStatus};

/// Indoor 22.3 °C / 40.5 %, outdoor 7.6 °C / 39.3 %: Δ ≈ 13.6 K.
const INDOOR: (f32, f32) = (22.3, 40.5);
const OUTDOOR: (f32, f32) = (7.6, 39.3);

struct Rig {
    controller: Controller,
    hw: MockHardware,
    store: MockStore,
    clock: FixedClock,
    sys: MockSystem,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: SystemConfig) -> Self {
        let mut rig = Self {
            controller: Controller::new(config),
            hw: MockHardware::new(INDOOR, OUTDOOR),
            store: MockStore::default(),
            clock: FixedClock::default(),
            sys: MockSystem::default(),
            sink: RecordingSink::default(),
        };
        rig.controller.start(&mut rig.hw, &mut rig.sink);
        rig
    }

    /// Calibration off, so the mock readings reach the core unchanged.
    fn uncalibrated() -> Self {
        Self::new(SystemConfig {
            indoor: Calibration::NONE,
            outdoor: Calibration::NONE,
            ..SystemConfig::default()
        })
    }

    fn run(&mut self, event: Event) -> Flow {
        self.controller.handle(
            event,
            &mut self.hw,
            &mut self.store,
            &self.clock,
            &mut self.sys,
            &mut self.sink,
        )
    }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_puts_outputs_in_safe_state() {
    let rig = Rig::uncalibrated();
    assert_eq!(rig.controller.state(), StateId::Starting);
    assert!(!rig.hw.relay);
    assert_eq!(rig.hw.indicator, COLOUR_CLOSED);
    assert_eq!(rig.hw.line(0), "Testing sensors");
    assert_eq!(rig.sink.events, [AppEvent::Started(StateId::Starting)]);
}

#[test]
fn first_healthy_measurement_is_announced_once() {
    let mut rig = Rig::uncalibrated();

    assert_eq!(rig.run(Event::MeasureTick), Flow::Continue);
    assert_eq!(rig.controller.state(), StateId::Monitoring);
    assert_eq!(rig.hw.line(0), "Sensor 1 ok");
    assert_eq!(rig.hw.line(1), "Sensor 2 ok");
    assert_eq!(rig.hw.blinks, [(COLOUR_MEASURE, 50, 1)]);

    rig.run(Event::MeasureTick);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::SensorsOk), 1);
    assert_eq!(rig.hw.blinks.len(), 2);
}

// ── Relay decision ────────────────────────────────────────────

#[test]
fn reference_readings_switch_the_fan_on() {
    let mut rig = Rig::uncalibrated();
    rig.run(Event::MeasureTick);
    rig.run(Event::DisplayTick);

    assert!(rig.controller.relay_on());
    assert!(rig.hw.relay);
    assert_eq!(rig.hw.indicator, COLOUR_VENTING);
    assert_eq!(rig.hw.line(0), " 22°C|41%| 8.2°C");
    assert_eq!(rig.hw.line(1), "  8°C|39%|-5.3°C");

    let decision = rig.controller.last_decision().unwrap();
    assert!((decision.delta - 13.59).abs() < 0.05);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::RelayChanged { on: true, .. })),
        1
    );
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::Readings(_))), 1);
}

#[test]
fn display_pages_alternate() {
    let mut rig = Rig::uncalibrated();
    rig.run(Event::MeasureTick);

    rig.run(Event::DisplayTick);
    assert_eq!(rig.hw.line(0), " 22°C|41%| 8.2°C");

    rig.run(Event::DisplayTick);
    assert_eq!(rig.hw.line(0), "Fan ON");
    assert_eq!(rig.hw.line(1), "Delta DP:13.6°C");

    rig.run(Event::DisplayTick);
    assert_eq!(rig.hw.line(0), " 22°C|41%| 8.2°C");
}

#[test]
fn cold_room_keeps_the_fan_off() {
    let mut rig = Rig::uncalibrated();
    rig.hw.set_reading(SensorId::Indoor, 9.5, 90.0);
    rig.run(Event::MeasureTick);
    rig.run(Event::DisplayTick);

    assert!(!rig.hw.relay);
    assert_eq!(rig.hw.indicator, COLOUR_CLOSED);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::RelayChanged { .. })),
        0
    );
}

#[test]
fn display_before_first_measurement_decides_nothing() {
    let mut rig = Rig::uncalibrated();
    rig.run(Event::DisplayTick);
    assert!(rig.controller.last_decision().is_none());
    assert!(rig.hw.relay_writes.iter().all(|on| !on));
}

// ── Sensor faults ─────────────────────────────────────────────

#[test]
fn acquisition_failure_restarts_exactly_once() {
    let mut rig = Rig::uncalibrated();
    rig.hw.fail(SensorId::Indoor, SensorError::Timeout);
    rig.hw.fail(SensorId::Outdoor, SensorError::NoResponse);

    let flow = rig.run(Event::MeasureTick);
    assert_eq!(flow, Flow::Restart(RestartReason::SensorAcquisition));
    assert_eq!(rig.controller.state(), StateId::Restarting);
    assert_eq!(rig.sys.restarts, 1);
    assert!(!rig.hw.relay);
    assert_eq!(rig.hw.indicator, COLOUR_FAULT);
    assert_eq!(rig.hw.line(0), "Restarting CPU..");

    let config = rig.controller.config().clone();
    assert_eq!(rig.sys.delays, [config.status_hold_ms, config.restart_settle_ms]);

    // Both sensors are reported before the restart.
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::SensorFault { .. })),
        2
    );
    assert_eq!(
        rig.sink.count(|e| *e
            == AppEvent::Restarting(RestartReason::SensorAcquisition)),
        1
    );

    // Nothing runs after the restart sequence.
    for event in Event::ALL {
        assert_eq!(
            rig.run(event),
            Flow::Restart(RestartReason::SensorAcquisition)
        );
    }
    assert_eq!(rig.sys.restarts, 1);
    assert_eq!(rig.controller.tasks_run(Event::MeasureTick), 1);
}

#[test]
fn fault_while_venting_forces_relay_off() {
    let mut rig = Rig::uncalibrated();
    rig.run(Event::MeasureTick);
    rig.run(Event::DisplayTick);
    assert!(rig.hw.relay);

    rig.hw.fail(SensorId::Outdoor, SensorError::ChecksumMismatch);
    rig.run(Event::MeasureTick);

    assert!(!rig.hw.relay);
    assert!(!rig.controller.relay_on());
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::SensorFault {
                sensor: SensorId::Outdoor,
                status: SensorStatus::ReadFailed(SensorError::ChecksumMismatch),
            })
    );
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::RelayChanged { on: false, .. })),
        1
    );
    assert_eq!(rig.sys.restarts, 1);
}

#[test]
fn out_of_range_degrades_then_recovers() {
    let mut rig = Rig::uncalibrated();
    rig.hw.set_reading(SensorId::Outdoor, 7.6, 101.0);

    assert_eq!(rig.run(Event::MeasureTick), Flow::Continue);
    assert_eq!(rig.controller.state(), StateId::Degraded);
    assert!(!rig.controller.last_report().reading(SensorId::Outdoor).valid);
    assert_eq!(rig.hw.line(1), "Sensor 2 fault");
    assert_eq!(rig.hw.indicator, COLOUR_FAULT);

    rig.run(Event::DisplayTick);
    assert!(!rig.hw.relay);
    assert!(rig.controller.last_decision().is_none());
    assert_eq!(rig.hw.line(1), "Sensor 2 fault");

    rig.hw.set_reading(SensorId::Outdoor, OUTDOOR.0, OUTDOOR.1);
    rig.run(Event::MeasureTick);
    assert_eq!(rig.controller.state(), StateId::Monitoring);
    rig.run(Event::DisplayTick);
    assert!(rig.hw.relay);

    assert_eq!(rig.sys.restarts, 0);
    assert!(rig.sink.events.contains(&AppEvent::StateChanged {
        from: StateId::Degraded,
        to: StateId::Monitoring,
    }));
}

#[test]
fn calibration_can_push_a_reading_out_of_range() {
    // Default outdoor offset is -1 %; 1.5 % raw becomes 0.5 %.
    let mut rig = Rig::new(SystemConfig::default());
    rig.hw.set_reading(SensorId::Outdoor, 5.0, 1.5);
    rig.run(Event::MeasureTick);
    assert_eq!(
        rig.controller.last_report().status(SensorId::Outdoor),
        SensorStatus::OutOfRange
    );
}

// ── Data log ──────────────────────────────────────────────────

#[test]
fn log_waits_for_valid_readings() {
    let mut rig = Rig::uncalibrated();
    rig.run(Event::LogTick);
    assert!(rig.controller.log_buffer().is_empty());
}

#[test]
fn log_flushes_once_past_threshold() {
    let mut rig = Rig::uncalibrated();
    rig.run(Event::MeasureTick);
    rig.run(Event::DisplayTick);

    let threshold = rig.controller.config().log_flush_threshold;
    for _ in 0..threshold {
        rig.run(Event::LogTick);
    }
    assert_eq!(rig.store.appends, 0);
    assert_eq!(rig.controller.log_buffer().len(), threshold);

    rig.run(Event::LogTick);
    assert_eq!(rig.store.appends, 1);
    assert!(rig.controller.log_buffer().is_empty());
    assert_eq!(
        rig.sink.count(|e| *e
            == AppEvent::LogFlushed {
                records: threshold + 1
            }),
        1
    );

    let lines = rig.store.lines();
    assert_eq!(lines.len(), threshold + 2);
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(
        lines[1],
        "05.03.2024 14:07:09,22.30,40.50,8.24,7.60,39.30,-5.35,True"
    );
    assert_eq!(lines.iter().filter(|l| **l == CSV_HEADER).count(), 1);
}

#[test]
fn storage_failure_restarts_without_losing_records() {
    let mut rig = Rig::new(SystemConfig {
        indoor: Calibration::NONE,
        outdoor: Calibration::NONE,
        log_flush_threshold: 2,
        ..SystemConfig::default()
    });
    rig.store.fail_with = Some(StorageError::Full);
    rig.run(Event::MeasureTick);

    assert_eq!(rig.run(Event::LogTick), Flow::Continue);
    assert_eq!(rig.run(Event::LogTick), Flow::Continue);
    assert_eq!(
        rig.run(Event::LogTick),
        Flow::Restart(RestartReason::Storage)
    );

    assert_eq!(rig.sys.restarts, 1);
    assert_eq!(rig.controller.restart_reason(), Some(RestartReason::Storage));
    assert_eq!(rig.controller.log_buffer().len(), 3);
    assert_eq!(rig.store.appends, 0);
    assert!(!rig.hw.relay);
}

#[test]
fn restart_flushes_pending_records() {
    let mut rig = Rig::uncalibrated();
    rig.run(Event::MeasureTick);
    rig.run(Event::LogTick);
    rig.run(Event::LogTick);

    rig.hw.fail(SensorId::Indoor, SensorError::Bus);
    rig.run(Event::MeasureTick);

    assert_eq!(rig.store.lines().len(), 3);
    assert!(rig.controller.log_buffer().is_empty());
}

#[test]
fn shutdown_flushes_and_opens_relay() {
    let mut rig = Rig::uncalibrated();
    rig.run(Event::MeasureTick);
    rig.run(Event::DisplayTick);
    rig.run(Event::LogTick);
    assert!(rig.hw.relay);

    rig.controller
        .shutdown(&mut rig.hw, &mut rig.store, &mut rig.sink);

    assert!(!rig.hw.relay);
    assert_eq!(rig.store.lines().len(), 2);
    assert!(rig.controller.log_buffer().is_empty());
}
