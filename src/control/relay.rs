//! Relay hysteresis controller.
//!
//! Decides whether venting lowers indoor humidity.  The rules run in a fixed
//! order and later rules override earlier ones:
//!
//! 1. `Δ > switch_min + hysteresis` → on
//! 2. `Δ < switch_min`              → off
//! 3. `t_indoor  < indoor_temp_min`  → off
//! 4. `t_outdoor < outdoor_temp_min` → off
//!
//! where `Δ = dp_indoor − dp_outdoor`.  The candidate starts at the prior
//! relay state, so inside the band `[switch_min, switch_min + hysteresis]`
//! the relay holds whatever it was doing.

use log::info;

use crate::config::SystemConfig;
use crate::control::dewpoint::dew_point;
use crate::sensors::SensorReading;

/// Switching thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Minimum dew point difference for venting (K).
    pub switch_min: f32,
    /// Width of the dead band above `switch_min` (K).
    pub hysteresis: f32,
    /// Indoor temperature floor (°C).
    pub indoor_temp_min: f32,
    /// Outdoor temperature floor (°C).
    pub outdoor_temp_min: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            switch_min: 5.0,
            hysteresis: 1.0,
            indoor_temp_min: 10.0,
            outdoor_temp_min: -10.0,
        }
    }
}

impl From<&SystemConfig> for Thresholds {
    fn from(c: &SystemConfig) -> Self {
        Self {
            switch_min: c.switch_min,
            hysteresis: c.hysteresis,
            indoor_temp_min: c.indoor_temp_min,
            outdoor_temp_min: c.outdoor_temp_min,
        }
    }
}

/// Which rule settled the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    /// Rule 1: Δ above the switch-on point.
    DeltaAboveBand,
    /// Rule 2: Δ below the switch-off point.
    DeltaBelowBand,
    /// Neither rule 1 nor 2 fired; prior state held.
    WithinBand,
    /// Rule 3: indoor too cold.
    IndoorTooCold,
    /// Rule 4: outdoor too cold.
    OutdoorTooCold,
}

/// Result of one decision step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub dew_point_indoor: f32,
    pub dew_point_outdoor: f32,
    /// `dew_point_indoor − dew_point_outdoor`.
    pub delta: f32,
    pub fan_on: bool,
    pub reason: DecisionReason,
}

/// Pure decision function.
///
/// Both readings must be valid; invalid readings are kept away from here by
/// the fault path.
pub fn decide(
    indoor: &SensorReading,
    outdoor: &SensorReading,
    prior: bool,
    th: &Thresholds,
) -> Decision {
    debug_assert!(indoor.valid && outdoor.valid, "decide() called with invalid reading");

    let dp1 = dew_point(indoor.temperature, indoor.humidity);
    let dp2 = dew_point(outdoor.temperature, outdoor.humidity);
    let delta = dp1 - dp2;

    let mut fan_on = prior;
    let mut reason = DecisionReason::WithinBand;

    if delta > th.switch_min + th.hysteresis {
        fan_on = true;
        reason = DecisionReason::DeltaAboveBand;
    }
    if delta < th.switch_min {
        fan_on = false;
        reason = DecisionReason::DeltaBelowBand;
    }
    if indoor.temperature < th.indoor_temp_min {
        fan_on = false;
        reason = DecisionReason::IndoorTooCold;
    }
    if outdoor.temperature < th.outdoor_temp_min {
        fan_on = false;
        reason = DecisionReason::OutdoorTooCold;
    }

    Decision {
        dew_point_indoor: dp1,
        dew_point_outdoor: dp2,
        delta,
        fan_on,
        reason,
    }
}

/// Owns the relay state.  The state only changes inside [`decide`](Self::decide)
/// or through the fail-safe [`force_off`](Self::force_off).
pub struct RelayController {
    thresholds: Thresholds,
    on: bool,
    last: Option<Decision>,
}

impl RelayController {
    /// Starts with the relay off.
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            on: false,
            last: None,
        }
    }

    /// Run the decision step against the current state and persist the result.
    pub fn decide(&mut self, indoor: &SensorReading, outdoor: &SensorReading) -> Decision {
        let d = decide(indoor, outdoor, self.on, &self.thresholds);
        if d.fan_on != self.on {
            info!(
                "Relay: {} (Δ={:.1}K, {:?})",
                if d.fan_on { "ON" } else { "OFF" },
                d.delta,
                d.reason
            );
        }
        self.on = d.fan_on;
        self.last = Some(d);
        d
    }

    /// Fail-safe: no ventilation.  Returns `true` if the relay was on.
    pub fn force_off(&mut self) -> bool {
        let was_on = self.on;
        self.on = false;
        was_on
    }

    /// Current relay state (`true` = venting).
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// The most recent decision, if any.
    pub fn last_decision(&self) -> Option<Decision> {
        self.last
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}
