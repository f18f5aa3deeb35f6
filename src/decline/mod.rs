//! Decline-curve fitting and extrapolation
//!
//! Three entry paths:
//! - `oil` — time-paced forecasts fit to an oil well's post-peak history
//! - `gas` — volume-paced forecasts fit to a gas well's rate-vs-cumulative
//!   history, stepped forward one average month of produced volume at a time
//! - `manual` — parameter-driven forecasts with no history at all
//!
//! All three share the modified-hyperbolic structure: a hyperbolic segment up
//! to a switch point (fixed time, or the time where the local decline falls
//! below a threshold), then an exponential continuation whose decline is
//! taken from the last two hyperbolic points.

pub mod gas;
pub mod manual;
pub mod oil;

pub use manual::{manual_decline, ManualDeclineInputs};

use crate::config::EngineConfig;
use crate::types::{DeclineModel, ForecastConfig, SwitchMethod, WellForecastState};

/// Fit and extrapolate an oil well's decline, writing `t_forecast` and
/// `qo_forecast` into the state.
pub fn oil_decline(state: &mut WellForecastState, cfg: &ForecastConfig, engine: &EngineConfig) {
    // A pure hyperbolic never switches, so the switch method is irrelevant
    if cfg.switch_method == SwitchMethod::ByTime || cfg.model == DeclineModel::Hyperbolic {
        oil::decline_by_time(state, cfg.model, cfg.switch_value, cfg.horizon_years, engine);
    } else {
        oil::decline_by_rate(state, cfg.model, cfg.switch_value, cfg.horizon_years, engine);
    }
}

/// Fit and extrapolate a gas well's decline, writing `t_forecast`,
/// `qg_forecast` and `cum_gas_forecast` into the state.
///
/// Gas wells always switch by time; the threshold variant only exists for
/// time-paced forecasts.
pub fn gas_decline(state: &mut WellForecastState, cfg: &ForecastConfig, engine: &EngineConfig) {
    gas::decline_by_time(state, cfg.model, cfg.switch_value, cfg.horizon_years, engine);
}

/// Normalization scale with a guard against degenerate reference values: a
/// zero or non-finite scale would poison the whole normalized fit, so it
/// collapses to the identity.
pub(crate) fn norm_scale(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 1.0 }
}

/// Exponential continuation decline from the last two points of a segment,
/// `di = −Δq / (q_last · Δx)`. `x` is time for oil and cumulative for gas.
pub(crate) fn tail_decline(x_prev: f64, x_last: f64, q_prev: f64, q_last: f64) -> f64 {
    let d = -(q_last - q_prev) / (q_last * (x_last - x_prev));
    if d.is_finite() { d } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norm_scale_guards_degenerate_values() {
        assert!((norm_scale(120.0) - 120.0).abs() < f64::EPSILON);
        assert!((norm_scale(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((norm_scale(-3.0) - 1.0).abs() < f64::EPSILON);
        assert!((norm_scale(f64::NAN) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tail_decline_positive_for_declining_segment() {
        let d = tail_decline(100.0, 130.44, 50.0, 48.0);
        assert!(d > 0.0);
    }

    #[test]
    fn tail_decline_zero_for_degenerate_segment() {
        assert_eq!(tail_decline(100.0, 100.0, 50.0, 48.0), 0.0);
        assert_eq!(tail_decline(100.0, 130.44, 50.0, 0.0), 0.0);
    }
}
