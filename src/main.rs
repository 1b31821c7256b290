//! DewVent firmware: main entry point.
//!
//! Hexagonal architecture with timer-driven deferred execution.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter         LogEventSink   NvsAdapter             │
//! │  (Sensor+Actuator+LCD)   (EventSink)    (ConfigPort)           │
//! │  CsvFileStore            SystemClock    EspSystem              │
//! │  (LogStoragePort)        (ClockPort)    (SystemPort)           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Controller (pure logic)                   │    │
//! │  │  SensorReader · FSM · RelayController · LogBuffer      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TriggerTimers (esp_timer) ──push──▶ EventQueue ──▶ main loop  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wiring (ESP32 DevKit)
//!
//! | Signal            | GPIO |
//! |-------------------|------|
//! | DHT22 indoor      | 4    |
//! | DHT22 outdoor     | 16   |
//! | Fan relay (act. low) | 17 |
//! | LCD I²C SDA       | 21   |
//! | LCD I²C SCL       | 22   |
//! | Status LED R/G/B  | 25 / 26 / 27 |
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use log::info;

use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::gpio::{IOPin, PinDriver};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, config::TimerConfig};
use esp_idf_svc::hal::prelude::*;

use dewvent::adapters::csv_store::{self, CsvFileStore};
use dewvent::adapters::hardware::HardwareAdapter;
use dewvent::adapters::log_sink::LogEventSink;
use dewvent::adapters::nvs::NvsAdapter;
use dewvent::adapters::system::EspSystem;
use dewvent::adapters::time::SystemClock;
use dewvent::app::ports::SystemPort;
use dewvent::app::service::Controller;
use dewvent::drivers::hw_timer::TriggerTimers;
use dewvent::drivers::lcd::{self, Lcd1602};
use dewvent::drivers::relay::Relay;
use dewvent::drivers::status_led::StatusLed;
use dewvent::drivers::watchdog::Watchdog;
use dewvent::error::Error;
use dewvent::events::{self, Event};
use dewvent::scheduler::Scheduler;
use dewvent::sensors::dht22::Dht22;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("DewVent v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config from NVS (or defaults) ──────────────────────
    let config = match NvsAdapter::new() {
        Ok(nvs) => nvs.load_or_default(),
        Err(e) => {
            log::warn!("NVS init failed ({}), running with defaults", e);
            Default::default()
        }
    };
    info!("Config: {:?}", config);

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    let indoor = Dht22::new(PinDriver::input_output_od(pins.gpio4.downgrade())?, Ets)
        .map_err(Error::from)?;
    let outdoor = Dht22::new(PinDriver::input_output_od(pins.gpio16.downgrade())?, Ets)
        .map_err(Error::from)?;

    let i2c = I2cDriver::new(
        peripherals.i2c0,
        pins.gpio21,
        pins.gpio22,
        &I2cConfig::new().baudrate(100.kHz().into()),
    )?;
    let display = Lcd1602::new(i2c, Ets, lcd::DEFAULT_ADDRESS)
        .map_err(|e| anyhow!("LCD init: {:?}", e))?;

    let relay = Relay::new(PinDriver::output(pins.gpio17)?)
        .map_err(|e| anyhow!("relay init: {:?}", e))?;

    let ledc_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::new().frequency(5.kHz().into()),
    )?;
    let led = StatusLed::new(
        LedcDriver::new(peripherals.ledc.channel0, &ledc_timer, pins.gpio25)?,
        LedcDriver::new(peripherals.ledc.channel1, &ledc_timer, pins.gpio26)?,
        LedcDriver::new(peripherals.ledc.channel2, &ledc_timer, pins.gpio27)?,
    )
    .map_err(|e| anyhow!("status LED init: {:?}", e))?;

    let mut hw = HardwareAdapter::new([indoor, outdoor], display, relay, led, FreeRtos);

    // ── 4. Storage, clock, system ─────────────────────────────
    csv_store::mount(&config.storage_base_path).map_err(Error::from)?;
    let mut store = CsvFileStore::new(config.log_path());
    let clock = SystemClock::new(config.utc_offset_minutes);
    if !clock.is_set() {
        log::warn!("Clock not set, log timestamps start at the epoch");
    }
    let mut sys = EspSystem::new();
    let mut sink = LogEventSink::new();
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);

    // ── 5. Controller ─────────────────────────────────────────
    let mut controller = Controller::new(config.clone());
    controller.start(&mut hw, &mut sink);

    // Sensors need a moment after power-on; the first measurement runs
    // before the triggers so the display is never empty.
    sys.delay_ms(config.status_hold_ms);
    controller.handle(
        Event::MeasureTick,
        &mut hw,
        &mut store,
        &clock,
        &mut sys,
        &mut sink,
    );

    let _triggers = TriggerTimers::start(Scheduler::from_config(&config))?;
    info!("System ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    loop {
        events::wait_for_event();
        events::drain_events(|event| {
            controller.handle(event, &mut hw, &mut store, &clock, &mut sys, &mut sink);
        });
        watchdog.feed();
    }
}
