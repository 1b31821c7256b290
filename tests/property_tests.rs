//! Property tests for the dew point model, the relay decision and the
//! deferred-execution queue.
//!
//! Runs on host only; proptest is not available for ESP32 targets.

#![cfg(not(target_os = "espidf"))]

use std::collections::VecDeque;

use dewvent::config::Calibration;
use dewvent::control::dewpoint::dew_point;
use dewvent::control::relay::{Thresholds, decide};
use dewvent::events::{Event, EventQueue, PushResult};
use dewvent::sensors::{RawReading, SensorReading};
use proptest::prelude::*;

fn reading(temperature: f32, humidity: f32) -> SensorReading {
    SensorReading {
        temperature,
        humidity,
        valid: true,
    }
}

// ── Dew point ─────────────────────────────────────────────────

proptest! {
    /// Saturated air condenses at its own temperature.
    #[test]
    fn saturation_dew_point_equals_temperature(t in 0.0f32..60.0) {
        prop_assert!((dew_point(t, 100.0) - t).abs() < 0.1);
    }

    #[test]
    fn dew_point_non_decreasing_in_humidity(
        t in -40.0f32..80.0,
        r1 in 1.0f32..100.0,
        r2 in 1.0f32..100.0,
    ) {
        let (lo, hi) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };
        prop_assert!(dew_point(t, lo) <= dew_point(t, hi) + 1e-3);
    }

    #[test]
    fn dew_point_never_exceeds_temperature(t in -40.0f32..80.0, r in 1.0f32..100.0) {
        prop_assert!(dew_point(t, r) <= t + 0.1);
    }
}

// ── Relay decision ────────────────────────────────────────────

proptest! {
    /// Inside the band the relay holds; outside it the band edge decides,
    /// unless a temperature floor forces it off.
    #[test]
    fn hysteresis_and_floors(
        t1 in -40.0f32..80.0, h1 in 1.0f32..100.0,
        t2 in -40.0f32..80.0, h2 in 1.0f32..100.0,
        prior: bool,
    ) {
        let th = Thresholds::default();
        let d = decide(&reading(t1, h1), &reading(t2, h2), prior, &th);

        let expected = if t1 < th.indoor_temp_min || t2 < th.outdoor_temp_min {
            false
        } else if d.delta > th.switch_min + th.hysteresis {
            true
        } else if d.delta < th.switch_min {
            false
        } else {
            prior
        };
        prop_assert_eq!(d.fan_on, expected);
    }

    #[test]
    fn floors_always_override(
        t1 in -40.0f32..9.99, h1 in 1.0f32..100.0,
        t2 in -40.0f32..80.0, h2 in 1.0f32..100.0,
        prior: bool,
    ) {
        let d = decide(&reading(t1, h1), &reading(t2, h2), prior, &Thresholds::default());
        prop_assert!(!d.fan_on);
    }
}

// ── Sensor validation ─────────────────────────────────────────

proptest! {
    #[test]
    fn validity_matches_plausible_ranges(t in -60.0f32..100.0, h in -10.0f32..120.0) {
        let r = SensorReading::calibrated(
            RawReading { temperature_c: t, humidity_pct: h },
            Calibration::NONE,
        );
        let plausible = (1.0..=100.0).contains(&h) && (-40.0..=80.0).contains(&t);
        prop_assert_eq!(r.valid, plausible);
    }
}

#[test]
fn boundary_readings() {
    let raw = |t, h| RawReading {
        temperature_c: t,
        humidity_pct: h,
    };
    assert!(!SensorReading::calibrated(raw(20.0, 101.0), Calibration::NONE).valid);
    assert!(!SensorReading::calibrated(raw(-41.0, 50.0), Calibration::NONE).valid);
    assert!(SensorReading::calibrated(raw(-40.0, 1.0), Calibration::NONE).valid);
}

// ── Event queue ───────────────────────────────────────────────

proptest! {
    /// FIFO with per-event coalescing: a push of an event that is still
    /// pending is absorbed, everything else comes out in push order.
    #[test]
    fn queue_is_fifo_with_coalescing(ops in proptest::collection::vec(0u8..4, 0..64)) {
        let queue: EventQueue<4> = EventQueue::new();
        let mut model: VecDeque<Event> = VecDeque::new();

        for op in ops {
            match Event::from_u8(op) {
                Some(event) => {
                    let result = queue.push(event);
                    if model.contains(&event) {
                        prop_assert_eq!(result, PushResult::Coalesced);
                    } else {
                        prop_assert_eq!(result, PushResult::Queued);
                        model.push_back(event);
                    }
                }
                None => prop_assert_eq!(queue.pop(), model.pop_front()),
            }
            prop_assert_eq!(queue.len(), model.len());
        }
        prop_assert_eq!(queue.dropped(), 0);
    }
}
