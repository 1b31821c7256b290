//! End-to-end: simulated timer triggers → global event queue → controller.

use std::time::{Duration, Instant};

use super::mock_hw::{FixedClock, MockHardware, MockStore, MockSystem, RecordingSink};

use dewvent::app::service::Controller;
use dewvent::config::{Calibration, SystemConfig};
use dewvent::drivers::hw_timer::TriggerTimers;
use dewvent::events::{self, Event};
use dewvent::fsm::StateId;
use dewvent::scheduler::Scheduler;

#[test]
fn triggers_drive_every_task_through_the_queue() {
    let config = SystemConfig {
        indoor: Calibration::NONE,
        outdoor: Calibration::NONE,
        ..SystemConfig::default()
    };
    let mut controller = Controller::new(config);
    let mut hw = MockHardware::new((22.3, 40.5), (7.6, 39.3));
    let mut store = MockStore::default();
    let clock = FixedClock::default();
    let mut sys = MockSystem::default();
    let mut sink = RecordingSink::default();
    controller.start(&mut hw, &mut sink);

    let mut triggers = TriggerTimers::start(Scheduler::new(20, 30, 50)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while Event::ALL.iter().any(|e| controller.tasks_run(*e) < 2) {
        assert!(Instant::now() < deadline, "triggers stalled");
        events::wait_for_event();
        events::drain_events(|event| {
            controller.handle(event, &mut hw, &mut store, &clock, &mut sys, &mut sink);
        });
    }
    triggers.stop();

    assert_eq!(controller.state(), StateId::Monitoring);
    assert!(hw.relay);
    assert!(!controller.log_buffer().is_empty());
    assert_eq!(sys.restarts, 0);
}
