//! Dew point model (Magnus-form approximation).
//!
//! Saturation vapour pressure over water (t ≥ 0 °C) or ice (t < 0 °C):
//!
//! ```text
//! sdd = 6.1078 · 10^(a·t / (b + t))
//! dd  = sdd · r / 100
//! v   = log10(dd / 6.1078)
//! td  = b·v / (a − v)
//! ```

/// Saturation vapour pressure at 0 °C (hPa).
const E0_HPA: f32 = 6.1078;

/// Magnus coefficients `(a, b)` over water.
const MAGNUS_WATER: (f32, f32) = (7.5, 237.3);
/// Magnus coefficients `(a, b)` over ice.
const MAGNUS_ICE: (f32, f32) = (7.6, 240.7);

/// Dew point (°C) for air at `t` °C and `r` % relative humidity.
///
/// Total for `r > 0`.  Callers must not pass `r <= 0`; validated sensor
/// readings never carry humidity below 1 %.
pub fn dew_point(t: f32, r: f32) -> f32 {
    debug_assert!(r > 0.0, "dew point undefined for r <= 0 (got {r})");

    let (a, b) = if t >= 0.0 { MAGNUS_WATER } else { MAGNUS_ICE };

    let sdd = E0_HPA * 10f32.powf(a * t / (b + t));
    let dd = sdd * (r / 100.0);
    let v = (dd / E0_HPA).log10();

    b * v / (a - v)
}
