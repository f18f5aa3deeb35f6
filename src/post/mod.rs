//! Forecast post-processing
//!
//! Everything that runs after the decline and GOR stages: cumulative
//! integration, rescaling through the last observed rate, horizon/economic
//! trimming, historical-curve normalization, and the sparse reporting mask.

pub mod serialize;

pub use serialize::SerializedForecast;

use crate::config::EngineConfig;
use crate::models::{interp, DAYS_PER_YEAR};
use crate::types::{Fluid, NormalizationMethod, NormalizationState, WellForecastState};

/// Integrate the rate forecast into a cumulative forecast for `fluid`,
/// continuing from the last historical cumulative.
///
/// Left-rectangle rule on the forecast grid: each step contributes
/// `Δt · q_right`. The first forecast point carries the historical cumulative
/// unchanged.
pub fn integrate_cumulative(state: &mut WellForecastState, fluid: Fluid) {
    let q = state.rates(fluid);
    if q.is_empty() {
        match fluid {
            Fluid::Oil => state.cum_oil_forecast = Vec::new(),
            Fluid::Gas => state.cum_gas_forecast = Vec::new(),
        }
        return;
    }

    let mut cum = Vec::with_capacity(q.len());
    let mut acc = state.history.last_cumulative(fluid).unwrap_or(0.0);
    cum.push(acc);
    for i in 1..q.len() {
        acc += (state.t_forecast[i] - state.t_forecast[i - 1]) * q[i];
        cum.push(acc);
    }

    match fluid {
        Fluid::Oil => state.cum_oil_forecast = cum,
        Fluid::Gas => state.cum_gas_forecast = cum,
    }
}

/// Rescale the forecast so it passes through the last observed rate.
///
/// Oil: multiply the whole rate curve by the ratio at the last historical
/// time. Gas: rescale from the last historical cumulative onward, rebuild the
/// implied step times from the volume balance, and interpolate back onto the
/// original evenly-spaced grid.
pub fn apply_rate_offset(state: &mut WellForecastState, fluid: Fluid) {
    if state.t_forecast.is_empty() {
        return;
    }

    match fluid {
        Fluid::Oil => {
            let Some(last_t) = state.history.last_time() else {
                return;
            };
            let Some(last_q) = state.history.last_rate(Fluid::Oil) else {
                return;
            };

            // The forecast grid replays the history times, so the match is
            // exact up to integer truncation
            #[allow(clippy::cast_possible_truncation)]
            let pos = state
                .t_forecast
                .iter()
                .position(|&t| t as i64 == last_t as i64);
            let Some(pos) = pos else {
                return;
            };

            let anchor = state.qo_forecast[pos];
            if anchor <= 0.0 || !anchor.is_finite() {
                return;
            }
            let factor = last_q / anchor;
            for q in &mut state.qo_forecast {
                *q *= factor;
            }
        }
        Fluid::Gas => {
            let Some(last_q) = state.history.last_rate(Fluid::Gas) else {
                return;
            };
            let Some(last_cum) = state.history.last_cumulative(Fluid::Gas) else {
                return;
            };
            let last_cum = (last_cum * 100.0).round() / 100.0;

            let Some(offset) = state.cum_gas_forecast.iter().position(|&c| c >= last_cum) else {
                return;
            };
            let anchor = state.qg_forecast[offset];
            if anchor <= 0.0 || !anchor.is_finite() {
                return;
            }

            let factor = last_q / anchor;
            let mut q_scaled = state.qg_forecast.clone();
            for q in &mut q_scaled[offset..] {
                *q *= factor;
            }

            // Rebuild the times each volume step now takes at the rescaled
            // rates, then interpolate back onto the even monthly grid
            let mut t_implied = state.t_forecast.clone();
            for i in offset..t_implied.len() - 1 {
                t_implied[i + 1] = t_implied[i]
                    + (state.cum_gas_forecast[i + 1] - state.cum_gas_forecast[i]) / q_scaled[i + 1];
            }

            let t_tail = &state.t_forecast[offset..];
            let ti_tail = &t_implied[offset..];
            let q_tail = &q_scaled[offset..];
            let cum_tail = &state.cum_gas_forecast[offset..];

            let new_q: Vec<f64> = t_tail.iter().map(|&t| interp(t, ti_tail, q_tail)).collect();
            let new_cum: Vec<f64> = t_tail.iter().map(|&t| interp(t, ti_tail, cum_tail)).collect();

            state.qg_forecast[offset..].copy_from_slice(&new_q);
            state.cum_gas_forecast[offset..].copy_from_slice(&new_cum);
        }
    }
}

/// Trim the forecast to the window between the end of history and the
/// horizon, and zero rates below the economic limit.
///
/// For gas, the cumulative is held constant from the first zeroed rate
/// onward (at the last valid forecast cumulative, falling back to the last
/// historical one).
pub fn trim_curve(state: &mut WellForecastState, horizon_years: f64, rate_limit: f64, fluid: Fluid) {
    if state.t_forecast.is_empty() {
        return;
    }

    let end_days = (horizon_years * DAYS_PER_YEAR).round();
    let last_hist_t = state.history.last_time().unwrap_or(f64::NEG_INFINITY);

    let keep: Vec<bool> = state
        .t_forecast
        .iter()
        .map(|&t| last_hist_t <= t && t < end_days)
        .collect();

    let filter = |v: &[f64]| -> Vec<f64> {
        v.iter()
            .zip(keep.iter())
            .filter_map(|(&x, &k)| k.then_some(x))
            .collect()
    };

    state.t_forecast = filter(&state.t_forecast);
    match fluid {
        Fluid::Oil => {
            state.qo_forecast = filter(&state.qo_forecast);
            zero_below_limit(&mut state.qo_forecast, rate_limit);
        }
        Fluid::Gas => {
            state.qg_forecast = filter(&state.qg_forecast);
            state.cum_gas_forecast = filter(&state.cum_gas_forecast);

            let first_zeroed = state.qg_forecast.iter().position(|&q| q < rate_limit);
            zero_below_limit(&mut state.qg_forecast, rate_limit);

            if let Some(pos) = first_zeroed {
                let hold = if pos > 0 {
                    state.cum_gas_forecast[pos - 1]
                } else {
                    state.history.last_cumulative(Fluid::Gas).unwrap_or(0.0)
                };
                for (c, &q) in state.cum_gas_forecast.iter_mut().zip(state.qg_forecast.iter()) {
                    if q == 0.0 {
                        *c = hold;
                    }
                }
            }
        }
    }
}

fn zero_below_limit(rates: &mut [f64], limit: f64) {
    for q in rates.iter_mut() {
        if *q < limit {
            *q = 0.0;
        }
    }
}

/// Normalize the historical rates to a reference completion size before any
/// fitting, rebuilding the historical cumulatives from the scaled rates.
///
/// Wells whose attribute is missing or implausibly small are left untouched;
/// the normalization state records whether scaling happened.
pub fn normalize_history(
    state: &mut WellForecastState,
    method: NormalizationMethod,
    norm_value: f64,
    engine: &EngineConfig,
) {
    let (attr, threshold) = match method {
        NormalizationMethod::FracStages => (
            state.history.frac_stages,
            engine.normalization.min_frac_stages,
        ),
        NormalizationMethod::LateralLength => (
            state.history.lateral_length,
            engine.normalization.min_lateral_length,
        ),
    };

    if !attr.is_finite() || attr <= threshold {
        state.normalization = NormalizationState {
            enabled: false,
            method: Some(method),
            value: None,
        };
        return;
    }

    let factor = norm_value / attr;
    for s in &mut state.history.samples {
        s.qo *= factor;
        s.qg *= factor;
    }

    // Rebuild cumulatives from the scaled rates: the first sample contributes
    // its full time-on-production, later ones a left-rectangle step
    let times = state.history.times();
    for fluid in [Fluid::Oil, Fluid::Gas] {
        let rates = state.history.rates(fluid);
        let mut acc = times[0] * rates[0];
        for (i, s) in state.history.samples.iter_mut().enumerate() {
            if i > 0 {
                acc += (times[i] - times[i - 1]) * rates[i];
            }
            match fluid {
                Fluid::Oil => s.cum_oil = acc,
                Fluid::Gas => s.cum_gas = acc,
            }
        }
    }

    state.normalization = NormalizationState {
        enabled: true,
        method: Some(method),
        value: Some(norm_value),
    };
}

/// Sparse reporting mask over the forecast: one point per elapsed year plus
/// the first point, both rate peaks, and the last point before 180 days.
pub fn compression_mask(state: &WellForecastState) -> Vec<bool> {
    let t = &state.t_forecast;
    if t.is_empty() {
        return Vec::new();
    }

    #[allow(clippy::cast_possible_truncation)]
    let year_of = |v: f64| (v / 365.0) as i64;
    let mut mask: Vec<bool> = t
        .windows(2)
        .map(|w| year_of(w[1]) - year_of(w[0]) == 1)
        .collect();
    mask.push(true);
    mask[0] = true;

    let peak_of = |rates: &[f64]| {
        rates
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    };
    if let Some(i) = peak_of(&state.qo_forecast) {
        mask[i] = true;
    }
    if let Some(i) = peak_of(&state.qg_forecast) {
        mask[i] = true;
    }

    if let Some(i) = t.iter().rposition(|&v| v < 180.0) {
        mask[i] = true;
    }

    mask
}
