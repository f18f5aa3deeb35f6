//! Time-paced oil decline forecasting
//!
//! History before the peak oil rate is treated as ramp-up and discarded; the
//! fit runs on the post-peak samples, normalized by the peak time and rate so
//! the optimizer works near unity. The forecast grid is the post-peak history
//! times followed by average-month steps out to the horizon.

use tracing::warn;

use crate::config::EngineConfig;
use crate::decline::{norm_scale, tail_decline};
use crate::fitting::{fit_model, FitOptions};
use crate::models::{arange, exponential, hyperbolic, DAYS_PER_YEAR, MONTH_DAYS};
use crate::types::{DeclineModel, Fluid, ForecastParams, WellForecastState};

/// Forecast oil rate with the switch at a fixed time-since-start.
///
/// `exp_start_t` is ignored for a pure hyperbolic, which runs to the horizon.
/// With one usable post-peak point or less (or a negative switch time) the
/// forecast is left empty.
pub fn decline_by_time(
    state: &mut WellForecastState,
    model: DeclineModel,
    exp_start_t: f64,
    horizon_years: f64,
    engine: &EngineConfig,
) {
    let peak = state.history.peak_index(Fluid::Oil);
    let t_hist: Vec<f64> = state.history.times()[peak..].to_vec();
    let q_hist: Vec<f64> = state.history.rates(Fluid::Oil)[peak..].to_vec();

    let end_days = (horizon_years * DAYS_PER_YEAR).round();
    let exp_start = if model == DeclineModel::Hyperbolic {
        end_days
    } else {
        exp_start_t
    };

    if t_hist.len() <= 1 || exp_start < 0.0 {
        state.clear_forecast(model);
        return;
    }

    let ti = t_hist[0];
    let qi_obs = q_hist[0];

    // Split post-peak history at the switch time
    let split = t_hist.partition_point(|&t| t < exp_start);
    let (t_hyp_hist, t_exp_hist) = t_hist.split_at(split);
    let (q_hyp_hist, q_exp_hist) = q_hist.split_at(split);

    if t_hyp_hist.is_empty() {
        // Switch before the peak leaves nothing to fit the hyperbolic on
        state.clear_forecast(model);
        return;
    }

    // ----------------------------------------
    // Hyperbolic section
    // ----------------------------------------
    let t_scale = norm_scale(ti);
    let q_scale = norm_scale(qi_obs);

    let t_aux: Vec<f64> = t_hyp_hist.iter().map(|&t| t - ti).collect();
    let t_norm: Vec<f64> = t_aux.iter().map(|&t| t / t_scale).collect();
    let q_norm: Vec<f64> = q_hyp_hist.iter().map(|&q| q / q_scale).collect();

    // Forecast grid: history times, then monthly steps to the switch
    let last_aux = t_aux[t_aux.len() - 1];
    let mut t_fore_hyp = t_aux;
    t_fore_hyp.extend(arange(last_aux + MONTH_DAYS, exp_start - ti, MONTH_DAYS));

    let opts = FitOptions::with_max_evals(engine.fitting.max_evals);
    let Some(p) = fit_model(
        |t, p| hyperbolic(t, p[0], p[1], p[2]),
        &t_norm,
        &q_norm,
        &[0.0, 0.0, 0.0],
        &[f64::INFINITY, f64::INFINITY, engine.fitting.b_max],
        &opts,
    ) else {
        warn!(well = %state.history.well_name, "oil decline fit had no valid samples");
        state.clear_forecast(model);
        return;
    };

    let (qi, di, b) = (p[0] * q_scale, p[1] / t_scale, p[2]);
    let q_fore_hyp: Vec<f64> = t_fore_hyp.iter().map(|&t| hyperbolic(t, qi, di, b)).collect();

    if model == DeclineModel::Hyperbolic {
        state.t_forecast = t_fore_hyp.iter().map(|&t| t + ti).collect();
        state.qo_forecast = q_fore_hyp;
        state.params = ForecastParams {
            b: Some(b),
            d_hyp: Some(di),
            d_exp: None,
            model: Some(model.tag()),
        };
        return;
    }

    // ----------------------------------------
    // Exponential section
    // ----------------------------------------
    let (t_fore_exp, q_fore_exp, di_exp) = if q_fore_hyp.len() > 1 {
        let last_q = q_fore_hyp[q_fore_hyp.len() - 1];
        let last_t = t_fore_hyp[t_fore_hyp.len() - 1];
        let di_exp = tail_decline(
            t_fore_hyp[t_fore_hyp.len() - 2],
            last_t,
            q_fore_hyp[q_fore_hyp.len() - 2],
            last_q,
        );

        let mut t_fore: Vec<f64> = t_exp_hist.iter().map(|&t| t - ti).collect();
        t_fore.extend(arange(last_t + MONTH_DAYS, end_days - ti, MONTH_DAYS));
        let q_fore: Vec<f64> = t_fore
            .iter()
            .map(|&t| exponential(t - last_t, last_q, di_exp))
            .collect();
        (t_fore, q_fore, Some(di_exp))
    } else if t_exp_hist.is_empty() {
        (Vec::new(), Vec::new(), None)
    } else {
        // Single hyperbolic point: fit the exponential on the post-switch
        // history directly
        let first_exp_t = t_exp_hist[0];
        let t_aux: Vec<f64> = t_exp_hist.iter().map(|&t| t - first_exp_t).collect();
        let t_norm: Vec<f64> = t_aux.iter().map(|&t| t / t_scale).collect();
        let q_norm: Vec<f64> = q_exp_hist.iter().map(|&q| q / q_scale).collect();

        let Some(p) = fit_model(
            |t, p| exponential(t, p[0], p[1]),
            &t_norm,
            &q_norm,
            &[0.0, 0.0],
            &[f64::INFINITY, f64::INFINITY],
            &opts,
        ) else {
            warn!(well = %state.history.well_name, "oil tail fit had no valid samples");
            state.clear_forecast(model);
            return;
        };
        let (qi_exp, di_exp) = (p[0] * q_scale, p[1] / t_scale);

        let last_aux = t_aux[t_aux.len() - 1];
        let grid = arange(last_aux, end_days - t_aux[0], MONTH_DAYS);
        let q_fore: Vec<f64> = grid.iter().map(|&t| exponential(t, qi_exp, di_exp)).collect();
        let t_fore: Vec<f64> = grid.iter().map(|&t| t + first_exp_t - ti).collect();
        (t_fore, q_fore, Some(di_exp))
    };

    state.t_forecast = t_fore_hyp
        .iter()
        .chain(t_fore_exp.iter())
        .map(|&t| t + ti)
        .collect();
    state.qo_forecast = q_fore_hyp.into_iter().chain(q_fore_exp).collect();
    state.params = ForecastParams {
        b: Some(b),
        d_hyp: Some(di),
        d_exp: di_exp,
        model: Some(model.tag()),
    };
}

/// Forecast oil rate with the switch where the local decline first falls
/// below `exp_start_d` percent per year.
///
/// A full-horizon hyperbolic probe is run first; its point-to-point
/// annualized decline locates the switch time, and the forecast is then rerun
/// by time.
pub fn decline_by_rate(
    state: &mut WellForecastState,
    model: DeclineModel,
    exp_start_d: f64,
    horizon_years: f64,
    engine: &EngineConfig,
) {
    let threshold = if exp_start_d.is_finite() && exp_start_d > 0.0 {
        exp_start_d
    } else {
        1.0
    };

    let mut probe = state.clone();
    decline_by_time(&mut probe, DeclineModel::Hyperbolic, 0.0, horizon_years, engine);

    if probe.t_forecast.len() < 2 {
        state.clear_forecast(model);
        return;
    }

    let tlim = switch_time_from_probe(&probe.t_forecast, &probe.qo_forecast, threshold);
    decline_by_time(state, model, tlim, horizon_years, engine);
}

/// Time where the probe's annualized point decline first drops below the
/// threshold (percent/year). Falls back to the second point when it never
/// does.
fn switch_time_from_probe(t: &[f64], q: &[f64], threshold_pct: f64) -> f64 {
    let mut pos = 0usize;
    for i in 1..t.len() {
        let d = (q[i] - q[i - 1]) / (t[i] - t[i - 1]) / (-q[i]) * 365.0;
        if d < threshold_pct / 100.0 {
            pos = i;
            break;
        }
    }
    if pos == 0 {
        pos = 1;
    }
    t[pos]
}
