//! Controller: the hexagonal core.
//!
//! [`Controller`] owns every piece of process-wide mutable state: the
//! latest readings (inside the FSM context), the relay state, the log
//! buffer and the display page.  Each deferred task runs through
//! [`Controller::handle`] to completion; all I/O flows through port traits
//! passed in at the call site.
//!
//! ```text
//!   SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                  │        Controller        │
//! ActuatorPort ◀── │ Reader · FSM · Relay     │ ──▶ LogStoragePort
//!  DisplayPort ◀── │ LogBuffer · Presenter    │ ──▶ SystemPort
//!                  └──────────────────────────┘
//! ```

use log::{debug, error, info, warn};

use crate::config::SystemConfig;
use crate::control::relay::{Decision, RelayController, Thresholds};
use crate::datalog::{LogBuffer, LogRecord};
use crate::events::Event;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::sensors::{MeasureReport, SensorId, SensorReader, SensorStatus};

use super::events::{AppEvent, RestartReason, TelemetryData};
use super::ports::{
    ActuatorPort, ClockPort, DisplayPort, EventSink, LogStoragePort, Rgb, SensorPort, SystemPort,
};
use super::presenter::{self, Page, Screen};

/// Indicator: relay on.
pub const COLOUR_VENTING: Rgb = (0, 40, 0);
/// Indicator: relay off.
pub const COLOUR_CLOSED: Rgb = (0, 0, 40);
/// Indicator: sensor fault or restart.
pub const COLOUR_FAULT: Rgb = (40, 0, 0);
/// Short flash after every good measurement.
pub const COLOUR_MEASURE: Rgb = (40, 40, 40);
const MEASURE_BLINK_MS: u32 = 50;

/// What the main loop should do after a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The restart sequence ran.  On the device `SystemPort::restart` never
    /// returns, so only host builds observe this.
    Restart(RestartReason),
}

pub struct Controller {
    config: SystemConfig,
    reader: SensorReader,
    relay: RelayController,
    log: LogBuffer,
    fsm: Fsm,
    ctx: FsmContext,
    page: Page,
    restart: Option<RestartReason>,
    tasks_run: [u32; Event::COUNT],
}

impl Controller {
    /// Build the controller.  Does not touch hardware; call
    /// [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            reader: SensorReader::new(&config),
            relay: RelayController::new(Thresholds::from(&config)),
            log: LogBuffer::new(config.log_flush_threshold),
            fsm: Fsm::new(build_state_table(), StateId::Starting),
            ctx: FsmContext::new(),
            page: Page::default(),
            restart: None,
            tasks_run: [0; Event::COUNT],
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put the outputs in their safe state and show the startup screen.
    pub fn start(&mut self, hw: &mut (impl ActuatorPort + DisplayPort), sink: &mut impl EventSink) {
        hw.set_relay(false);
        hw.set_indicator(COLOUR_CLOSED);
        presenter::render(hw, &Screen::testing_sensors());
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("Controller started in {:?}", self.fsm.current_state());
    }

    /// Administrative stop: relay off and a forced flush.  The caller tears
    /// down the triggers first.
    pub fn shutdown(
        &mut self,
        hw: &mut impl ActuatorPort,
        store: &mut impl LogStoragePort,
        sink: &mut impl EventSink,
    ) {
        self.fail_safe(hw, sink);
        self.flush(true, store, sink);
        info!("Controller stopped");
    }

    // ── Task dispatch ─────────────────────────────────────────

    /// Run the task associated with `event` to completion.
    ///
    /// Once the restart sequence has run, every later event is ignored.
    pub fn handle(
        &mut self,
        event: Event,
        hw: &mut (impl SensorPort + ActuatorPort + DisplayPort),
        store: &mut impl LogStoragePort,
        clock: &impl ClockPort,
        sys: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> Flow {
        if let Some(reason) = self.restart {
            debug!("Controller: ignoring {} after restart", event.name());
            return Flow::Restart(reason);
        }
        self.tasks_run[event.index()] = self.tasks_run[event.index()].wrapping_add(1);

        match event {
            Event::MeasureTick => self.measure(hw, store, sys, sink),
            Event::DisplayTick => {
                self.display(hw, sink);
                Flow::Continue
            }
            Event::LogTick => self.log(hw, store, clock, sys, sink),
        }
    }

    // ── Tasks ─────────────────────────────────────────────────

    /// Read both sensors, update sensor health, handle faults.
    fn measure(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort + DisplayPort),
        store: &mut impl LogStoragePort,
        sys: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> Flow {
        let report = self.reader.measure(hw);
        self.ctx.report = report;

        let prev = self.fsm.current_state();
        self.fsm.tick(&mut self.ctx);
        let state = self.fsm.current_state();
        if state != prev {
            sink.emit(&AppEvent::StateChanged {
                from: prev,
                to: state,
            });
        }

        if report.fault() {
            self.fail_safe(hw, sink);
            hw.set_indicator(COLOUR_FAULT);
            self.emit_faults(&report, sink);
            if let Some(screen) = Screen::sensor_status(&report, false) {
                presenter::render(hw, &screen);
            }
        } else {
            if self.ctx.take_announce_ok() {
                sink.emit(&AppEvent::SensorsOk);
                if let Some(screen) = Screen::sensor_status(&report, true) {
                    presenter::render(hw, &screen);
                }
            }
            hw.blink_indicator(COLOUR_MEASURE, MEASURE_BLINK_MS, 1);
        }

        if self.ctx.commands.restart_requested {
            return self.restart_sequence(RestartReason::SensorAcquisition, hw, store, sys, sink);
        }
        Flow::Continue
    }

    /// Decide the relay and refresh the display.
    fn display(&mut self, hw: &mut (impl ActuatorPort + DisplayPort), sink: &mut impl EventSink) {
        match self.fsm.current_state() {
            StateId::Monitoring if self.ctx.commands.decisions_enabled => {
                let decision = self.decide(hw, sink);
                let [indoor, outdoor] = self.ctx.report.readings;
                let screen = match self.page {
                    Page::Readings => Screen::readings(&indoor, &outdoor),
                    Page::Ventilation => Screen::ventilation(decision.fan_on, decision.delta),
                };
                presenter::render(hw, &screen);
                self.page = self.page.next();
            }
            StateId::Degraded => {
                if let Some(screen) = Screen::sensor_status(&self.ctx.report, false) {
                    presenter::render(hw, &screen);
                }
            }
            _ => {}
        }
    }

    /// Append a data-log record and flush when due.
    fn log(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort + DisplayPort),
        store: &mut impl LogStoragePort,
        clock: &impl ClockPort,
        sys: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> Flow {
        if self.fsm.current_state() != StateId::Monitoring {
            debug!("Datalog: no valid readings, record skipped");
            return Flow::Continue;
        }

        let [indoor, outdoor] = self.ctx.report.readings;
        self.log.append(LogRecord::from_readings(
            clock.now(),
            &indoor,
            &outdoor,
            self.relay.is_on(),
        ));

        if self.flush(false, store, sink) {
            Flow::Continue
        } else {
            self.restart_sequence(RestartReason::Storage, hw, store, sys, sink)
        }
    }

    // ── Helpers ───────────────────────────────────────────────

    fn decide(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) -> Decision {
        let was_on = self.relay.is_on();
        let [indoor, outdoor] = self.ctx.report.readings;
        let decision = self.relay.decide(&indoor, &outdoor);

        hw.set_relay(decision.fan_on);
        hw.set_indicator(if decision.fan_on {
            COLOUR_VENTING
        } else {
            COLOUR_CLOSED
        });

        if decision.fan_on != was_on {
            sink.emit(&AppEvent::RelayChanged {
                on: decision.fan_on,
                delta: decision.delta,
            });
        }
        sink.emit(&AppEvent::Readings(TelemetryData {
            indoor,
            outdoor,
            dew_point_indoor: decision.dew_point_indoor,
            dew_point_outdoor: decision.dew_point_outdoor,
            fan_on: decision.fan_on,
        }));
        decision
    }

    /// Relay off, no matter what.
    fn fail_safe(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        let delta = self.relay.last_decision().map_or(0.0, |d| d.delta);
        if self.relay.force_off() {
            warn!("Relay: forced OFF");
            sink.emit(&AppEvent::RelayChanged { on: false, delta });
        }
        hw.set_relay(false);
    }

    fn emit_faults(&self, report: &MeasureReport, sink: &mut impl EventSink) {
        for id in SensorId::ALL {
            let status = report.status(id);
            if status != SensorStatus::Ok {
                sink.emit(&AppEvent::SensorFault { sensor: id, status });
            }
        }
    }

    /// Returns `false` if the store rejected the write.
    fn flush(&self, force: bool, store: &mut impl LogStoragePort, sink: &mut impl EventSink) -> bool {
        match self.log.maybe_flush(force, store) {
            Ok(Some(0) | None) => true,
            Ok(Some(records)) => {
                sink.emit(&AppEvent::LogFlushed { records });
                true
            }
            Err(e) => {
                error!("Datalog: write failed: {}", e);
                false
            }
        }
    }

    /// Fail-safe, show why, flush what we can, re-initialise.  Runs once.
    fn restart_sequence(
        &mut self,
        reason: RestartReason,
        hw: &mut (impl ActuatorPort + DisplayPort),
        store: &mut impl LogStoragePort,
        sys: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> Flow {
        if let Some(pending) = self.restart {
            return Flow::Restart(pending);
        }
        self.restart = Some(reason);
        warn!("Controller: restart sequence ({:?})", reason);

        self.fsm.force_transition(StateId::Restarting, &mut self.ctx);
        self.fail_safe(hw, sink);
        hw.set_indicator(COLOUR_FAULT);

        // Leave the fault screen up long enough to read.
        sys.delay_ms(self.config.status_hold_ms);

        if reason != RestartReason::Storage {
            self.flush(true, store, sink);
        }

        presenter::render(hw, &Screen::restarting());
        sink.emit(&AppEvent::Restarting(reason));
        sys.delay_ms(self.config.restart_settle_ms);
        sys.restart();
        Flow::Restart(reason)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn relay_on(&self) -> bool {
        self.relay.is_on()
    }

    pub fn last_report(&self) -> &MeasureReport {
        &self.ctx.report
    }

    pub fn last_decision(&self) -> Option<Decision> {
        self.relay.last_decision()
    }

    pub fn log_buffer(&self) -> &LogBuffer {
        &self.log
    }

    /// Whether the restart sequence has run.
    pub fn restart_reason(&self) -> Option<RestartReason> {
        self.restart
    }

    /// Tasks run for `event` since start.
    pub fn tasks_run(&self, event: Event) -> u32 {
        self.tasks_run[event.index()]
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}
