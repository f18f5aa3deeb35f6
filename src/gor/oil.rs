//! GOR forecasting for oil wells
//!
//! Bubble-point model: constant initial GOR while the reservoir stays above
//! bubble point, then an S-curve rise (modified SPE-197096-MS form) toward
//! five times the initial GOR, tapered to zero at the end of the forecast.
//! The bubble-point cumulative comes from a completion-based regression when
//! the lateral length is known, and an EUR-based one otherwise.

use tracing::warn;

use crate::config::EngineConfig;
use crate::fitting::{fit_model, FitOptions};
use crate::gor::{gor_history_masked, nan_mean};
use crate::models::gor_time_curve;
use crate::types::{Fluid, GorParams, WellForecastState};

/// Bubble-point cumulative regression coefficients (lateral length, peak oil
/// rate).
const NP_PB_LATERAL_COEF: f64 = 13.769_464_05;
const NP_PB_PEAK_COEF: f64 = 85.106_110_85;

/// EUR-based fallback when the lateral length is unknown:
/// `Np_Pb = (−0.0027·qo_peak + 0.6183) · EUR`, floored at zero.
const NP_PB_EUR_SLOPE: f64 = -0.0027;
const NP_PB_EUR_INTERCEPT: f64 = 0.6183;

/// Evaluation cap for the curvature fit.
const CURVATURE_FIT_MAX_EVALS: usize = 2000;

pub fn gor_forecast_oil(state: &mut WellForecastState, engine: &EngineConfig) {
    if state.t_forecast.is_empty() {
        state.gor_forecast = Vec::new();
        state.gor_history_len = 0;
        state.gor_params = GorParams::default();
        return;
    }

    let hist_len = state.history.len();
    let t_hist = state.history.times();
    let cum_hist = state.history.cumulatives(Fluid::Oil);
    let gor_hist = gor_history_masked(state);

    let last_t = state.t_forecast[state.t_forecast.len() - 1];
    let eur = state.cum_oil_forecast[state.cum_oil_forecast.len() - 1];
    let np_pb = bubble_point_cumulative(state.history.lateral_length, state.history.qo_peak, eur);

    let history_past_pb = cum_hist.iter().any(|&c| c > np_pb);

    let (gor_until_pb, gor_after_pb, gor_i, a) = if history_past_pb {
        // Bubble point inside history: fit the curvature on the post-Pb tail
        let pb_pos = cum_hist.partition_point(|&c| c <= np_pb);

        // Initial GOR from the first two thirds of the pre-Pb span, skipping
        // the first two (flowback-contaminated) samples
        let start = 2.min(gor_hist.len());
        let end = (pb_pos * 2 / 3).clamp(start, gor_hist.len());
        let mut gor_i = nan_mean(&gor_hist[start..end]);
        if !gor_i.is_finite() {
            gor_i = nan_mean(&gor_hist[start..]);
        }

        let t_fit: Vec<f64> = t_hist[pb_pos..].iter().map(|&t| t - t_hist[pb_pos]).collect();
        let y_fit: Vec<f64> = gor_hist[pb_pos..].to_vec();

        let a = fit_model(
            |t, p| gor_time_curve(t, p[0], gor_i, gor_i * 5.0, last_t),
            &t_fit,
            &y_fit,
            &[0.0],
            &[engine.gor.curvature_max],
            &FitOptions {
                max_evals: CURVATURE_FIT_MAX_EVALS,
                seed: Some(vec![0.001]),
                sigma: None,
            },
        )
        .map_or_else(
            || {
                warn!(well = %state.history.well_name, "bubble-point curvature fit failed, using fallback");
                engine.gor.fallback_curvature
            },
            |p| p[0],
        );

        let times_after: Vec<f64> = t_hist[pb_pos..]
            .iter()
            .chain(state.t_forecast.iter())
            .copied()
            .collect();
        let t0 = times_after[0];
        let after: Vec<f64> = times_after
            .iter()
            .map(|&t| gor_time_curve(t - t0, a, gor_i, gor_i * 5.0, last_t))
            .collect();

        (vec![gor_i; pb_pos], after, gor_i, a)
    } else {
        // Bubble point reached only inside the forecast
        let pb_pos = state.cum_oil_forecast.partition_point(|&c| c <= np_pb);

        let gor_i = nan_mean(&gor_hist[2.min(gor_hist.len())..]);
        let a = engine.gor.fallback_curvature;

        let after: Vec<f64> = if pb_pos < state.t_forecast.len() {
            let t0 = state.t_forecast[pb_pos];
            state.t_forecast[pb_pos..]
                .iter()
                .map(|&t| gor_time_curve(t - t0, a, gor_i, gor_i * 5.0, last_t))
                .collect()
        } else {
            Vec::new()
        };

        (vec![gor_i; hist_len + pb_pos], after, gor_i, a)
    };

    state.gor_forecast = gor_until_pb.into_iter().chain(gor_after_pb).collect();
    state.gor_history_len = hist_len;
    state.gor_params = GorParams {
        gor_i: Some(gor_i),
        a: Some(a),
        gor_max: None,
    };
}

/// Cumulative oil at bubble point.
fn bubble_point_cumulative(lateral_length: f64, qo_peak: f64, eur: f64) -> f64 {
    if lateral_length.is_finite() && lateral_length != 0.0 {
        NP_PB_PEAK_COEF.mul_add(qo_peak, NP_PB_LATERAL_COEF * lateral_length)
    } else {
        let np_pb = NP_PB_EUR_SLOPE.mul_add(qo_peak, NP_PB_EUR_INTERCEPT) * eur;
        np_pb.max(0.0)
    }
}
