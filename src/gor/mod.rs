//! Gas-oil ratio forecasting and companion-fluid derivation
//!
//! The GOR curve spans history followed by forecast (the split is recorded in
//! `WellForecastState::gor_history_len`), so the companion fluid can be
//! derived for the forecast span alone:
//! - oil wells: `qg = qo · GOR / 1000`
//! - gas wells: `qo = qg / GOR · 1000`
//!
//! Policy selection for gas wells follows the reservoir-fluid tag: dry gas
//! gets an effectively-infinite constant, wet gas a constant fit to history,
//! and oil-associated gas the dewpoint-transition model.

pub mod gas;
pub mod manual;
pub mod oil;

use crate::config::EngineConfig;
use crate::types::{Fluid, WellForecastState};

/// Forecast the GOR curve for the primary fluid's decline.
pub fn gor_forecast(state: &mut WellForecastState, fluid: Fluid, engine: &EngineConfig) {
    match fluid {
        Fluid::Oil => oil::gor_forecast_oil(state, engine),
        Fluid::Gas => gas::gor_forecast_gas(state, engine),
    }
}

/// Derive the gas rate forecast from the oil forecast and the GOR curve.
///
/// With an empty GOR curve the gas forecast is zeroed rather than left stale.
pub fn derive_gas_rate(state: &mut WellForecastState) {
    if state.gor_forecast.is_empty() {
        state.qg_forecast = vec![0.0; state.t_forecast.len()];
        return;
    }
    let tail = state.gor_forecast_tail();
    state.qg_forecast = state
        .qo_forecast
        .iter()
        .zip(tail.iter())
        .map(|(&qo, &gor)| qo * gor / 1000.0)
        .collect();
}

/// Derive the oil rate forecast from the gas forecast and the GOR curve.
///
/// Division by a zero or missing GOR yields zero oil, not a NaN that would
/// poison the cumulative integration downstream.
pub fn derive_oil_rate(state: &mut WellForecastState) {
    if state.gor_forecast.is_empty() {
        state.qo_forecast = vec![0.0; state.t_forecast.len()];
        return;
    }
    let tail = state.gor_forecast_tail();
    state.qo_forecast = state
        .qg_forecast
        .iter()
        .zip(tail.iter())
        .map(|(&qg, &gor)| {
            let qo = qg / gor * 1000.0;
            if qo.is_finite() { qo } else { 0.0 }
        })
        .collect();
}

/// Historical GOR series with zero readings treated as missing. The first
/// sample is kept as-is; a zero there is a genuine pre-production reading.
pub(crate) fn gor_history_masked(state: &WellForecastState) -> Vec<f64> {
    let mut gor = state.history.gor_values();
    for v in gor.iter_mut().skip(1) {
        if *v == 0.0 {
            *v = f64::NAN;
        }
    }
    gor
}

/// Mean with values beyond `sigma` standard deviations of the mean dropped,
/// NaN-aware on both passes.
pub(crate) fn trimmed_mean(data: &[f64], sigma: f64) -> f64 {
    let (mean, std) = nan_mean_std(data);
    if !mean.is_finite() || !std.is_finite() {
        return f64::NAN;
    }
    let lower = sigma.mul_add(-std, mean);
    let upper = sigma.mul_add(std, mean);
    let kept: Vec<f64> = data
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v >= lower && *v <= upper)
        .collect();
    nan_mean_std(&kept).0
}

/// NaN-aware mean over finite values only.
pub(crate) fn nan_mean(data: &[f64]) -> f64 {
    nan_mean_std(data).0
}

fn nan_mean_std(data: &[f64]) -> (f64, f64) {
    let finite: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    #[allow(clippy::cast_precision_loss)]
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let var = finite.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}
