//! Volume-paced gas decline forecasting
//!
//! Gas wells decline against cumulative produced volume, not time: the fit
//! runs on rate vs cumulative, and the forecast is stepped forward one
//! average month at a time by solving for the cumulative that makes the
//! implied step duration equal one month. Times stay evenly spaced by
//! construction; cumulatives are whatever the model says they must be.

use tracing::warn;

use crate::config::{EngineConfig, FittingConfig};
use crate::decline::{norm_scale, tail_decline};
use crate::fitting::{fit_model, solve_secant, FitOptions};
use crate::models::{exponential, hyperbolic, DAYS_PER_YEAR, MONTH_DAYS};
use crate::types::{DeclineModel, Fluid, ForecastParams, WellForecastState};

/// Forecast gas rate and cumulative with the switch at a fixed
/// time-since-start.
pub fn decline_by_time(
    state: &mut WellForecastState,
    model: DeclineModel,
    exp_start_t: f64,
    horizon_years: f64,
    engine: &EngineConfig,
) {
    let peak = state.history.peak_index(Fluid::Gas);
    let t_hist: Vec<f64> = state.history.times()[peak..].to_vec();
    let q_hist: Vec<f64> = state.history.rates(Fluid::Gas)[peak..].to_vec();
    let cum_hist: Vec<f64> = state.history.cumulatives(Fluid::Gas)[peak..].to_vec();

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

    let cumi = cum_hist[0];
    let qi_obs = q_hist[0];

    // Split post-peak history at the switch time
    let split = t_hist.partition_point(|&t| t < exp_start);
    let (q_hyp_hist, q_exp_hist) = q_hist.split_at(split);
    let (cum_hyp_hist, cum_exp_hist) = cum_hist.split_at(split);

    if cum_hyp_hist.is_empty() {
        state.clear_forecast(model);
        return;
    }

    // ----------------------------------------
    // Hyperbolic section
    // ----------------------------------------
    let cum_scale = norm_scale(cumi);
    let q_scale = norm_scale(qi_obs);

    let cum_norm: Vec<f64> = cum_hyp_hist.iter().map(|&c| (c - cumi) / cum_scale).collect();
    let q_norm: Vec<f64> = q_hyp_hist.iter().map(|&q| q / q_scale).collect();

    let opts = FitOptions::with_max_evals(engine.fitting.max_evals);
    let Some(p) = fit_model(
        |c, p| hyperbolic(c, p[0], p[1], p[2]),
        &cum_norm,
        &q_norm,
        &[0.0, 0.0, 0.0],
        &[f64::INFINITY, f64::INFINITY, engine.fitting.b_max],
        &opts,
    ) else {
        warn!(well = %state.history.well_name, "gas decline fit had no valid samples");
        state.clear_forecast(model);
        return;
    };

    let (qi, di, b) = (p[0] * q_scale, p[1] / cum_scale, p[2]);

    // Step the volume forecast monthly out to the switch
    let last_t = t_hist[t_hist.len() - 1];
    let last_cum = cum_hist[cum_hist.len() - 1];
    let (t_fore_hyp, cum_fore_hyp) = step_cumulatives(
        last_t,
        last_cum,
        exp_start,
        |c| hyperbolic(c - cumi, qi, di, b),
        &engine.fitting,
    );
    let q_fore_hyp: Vec<f64> = cum_fore_hyp
        .iter()
        .map(|&c| hyperbolic(c - cumi, qi, di, b))
        .collect();

    if model == DeclineModel::Hyperbolic {
        state.t_forecast = t_fore_hyp;
        state.qg_forecast = q_fore_hyp;
        state.cum_gas_forecast = cum_fore_hyp;
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
    let (t_fore_exp, cum_fore_exp, q_fore_exp, di_exp) = if q_fore_hyp.len() > 1 {
        let last_q_hyp = q_fore_hyp[q_fore_hyp.len() - 1];
        let last_cum_hyp = cum_fore_hyp[cum_fore_hyp.len() - 1];
        let last_t_hyp = t_fore_hyp[t_fore_hyp.len() - 1];
        let di_exp = tail_decline(
            cum_fore_hyp[cum_fore_hyp.len() - 2],
            last_cum_hyp,
            q_fore_hyp[q_fore_hyp.len() - 2],
            last_q_hyp,
        );

        let (t_fore, cum_fore) = step_cumulatives(
            last_t_hyp,
            last_cum_hyp,
            end_days,
            |c| exponential(c - last_cum_hyp, last_q_hyp, di_exp),
            &engine.fitting,
        );
        let q_fore: Vec<f64> = cum_fore
            .iter()
            .map(|&c| exponential(c - last_cum_hyp, last_q_hyp, di_exp))
            .collect();
        (t_fore, cum_fore, q_fore, Some(di_exp))
    } else if cum_exp_hist.is_empty() {
        (Vec::new(), Vec::new(), Vec::new(), None)
    } else {
        // Single hyperbolic point: fit the exponential tail on the
        // post-switch history directly
        let cum_norm: Vec<f64> = cum_exp_hist.iter().map(|&c| c / cum_scale).collect();
        let q_norm: Vec<f64> = q_exp_hist.iter().map(|&q| q / q_scale).collect();

        let Some(p) = fit_model(
            |c, p| exponential(c, p[0], p[1]),
            &cum_norm,
            &q_norm,
            &[0.0, 0.0],
            &[f64::INFINITY, f64::INFINITY],
            &opts,
        ) else {
            warn!(well = %state.history.well_name, "gas tail fit had no valid samples");
            state.clear_forecast(model);
            return;
        };
        let (qi_exp, di_exp) = (p[0] * q_scale, p[1] / cum_scale);

        let (t_fore, cum_fore) = step_cumulatives(
            last_t,
            last_cum,
            end_days,
            |c| exponential(c - cumi, qi_exp, di_exp),
            &engine.fitting,
        );
        let q_fore: Vec<f64> = cum_fore
            .iter()
            .map(|&c| exponential(c - cumi, qi_exp, di_exp))
            .collect();
        (t_fore, cum_fore, q_fore, Some(di_exp))
    };

    // Concatenate, dropping the duplicated switch point
    let keep = t_fore_hyp.len().saturating_sub(1);
    state.t_forecast = t_fore_hyp[..keep].iter().chain(t_fore_exp.iter()).copied().collect();
    state.qg_forecast = q_fore_hyp[..keep].iter().chain(q_fore_exp.iter()).copied().collect();
    state.cum_gas_forecast = cum_fore_hyp[..keep]
        .iter()
        .chain(cum_fore_exp.iter())
        .copied()
        .collect();
    state.params = ForecastParams {
        b: Some(b),
        d_hyp: Some(di),
        d_exp: di_exp,
        model: Some(model.tag()),
    };
}

/// March time forward one average month per step, solving for the cumulative
/// that makes the produced-volume increment consistent with `rate(cum)`.
///
/// Each step solves `MONTH_DAYS = (cum − cum_prev) / rate(cum)` with a secant
/// iteration seeded at the previous cumulative. Cumulatives are rounded to
/// two decimals at the end, matching the downstream reporting precision.
fn step_cumulatives(
    last_t: f64,
    last_cum: f64,
    final_time: f64,
    rate: impl Fn(f64) -> f64,
    fitting: &FittingConfig,
) -> (Vec<f64>, Vec<f64>) {
    let mut t = vec![last_t];
    let mut cum = vec![last_cum];

    while t[t.len() - 1] + MONTH_DAYS < final_time {
        let cum_prev = cum[cum.len() - 1];
        let next = solve_secant(
            |c| MONTH_DAYS - (c - cum_prev) / rate(c),
            cum_prev,
            fitting.secant_tol,
            fitting.secant_max_iter,
        );
        cum.push(next);
        t.push(t[t.len() - 1] + MONTH_DAYS);
    }

    for c in &mut cum {
        *c = (*c * 100.0).round() / 100.0;
    }
    (t, cum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FluidTag, WellHistory, WellSample};

    fn gas_history(points: &[(f64, f64, f64)]) -> WellHistory {
        WellHistory {
            well_name: "G-1".into(),
            field: "FORTIN DE PIEDRA".into(),
            lateral_length: 2800.0,
            frac_stages: 47.0,
            fluid_tag: FluidTag::WetGas,
            start_date: None,
            qo_peak: f64::NAN,
            samples: points
                .iter()
                .map(|&(t, qg, cum_gas)| WellSample {
                    t,
                    qo: 0.0,
                    qg,
                    cum_oil: 0.0,
                    cum_gas,
                    gor: 50_000.0,
                    qw: 0.0,
                })
                .collect(),
        }
    }

    #[test]
    fn stepper_advances_time_by_one_month() {
        let fitting = FittingConfig::default();
        let (t, cum) = step_cumulatives(100.0, 5000.0, 400.0, |_| 150.0, &fitting);

        assert!(t.len() > 2);
        for w in t.windows(2) {
            assert!((w[1] - w[0] - MONTH_DAYS).abs() < 1e-9);
        }
        // Constant rate: each volume step is rate × month
        for w in cum.windows(2) {
            assert!((w[1] - w[0] - 150.0 * MONTH_DAYS).abs() < 1.0, "step = {}", w[1] - w[0]);
        }
    }

    #[test]
    fn stepper_stops_before_final_time() {
        let fitting = FittingConfig::default();
        let (t, _) = step_cumulatives(0.0, 0.0, 365.0, |_| 100.0, &fitting);
        assert!(t.iter().all(|&v| v < 365.0));
        assert!(t[t.len() - 1] + MONTH_DAYS >= 365.0);
    }

    #[test]
    fn flat_rate_history_does_not_diverge() {
        // A near-flat declining gas well: the secant step equation stays
        // well behaved and times remain evenly spaced
        let points: Vec<(f64, f64, f64)> = (0..8)
            .map(|i| {
                let t = f64::from(i) * 30.44;
                let q = 200.0 - f64::from(i) * 2.0;
                (t, q, 200.0 * t)
            })
            .collect();
        let mut state = WellForecastState::new(gas_history(&points));

        decline_by_time(&mut state, DeclineModel::Hyperbolic, 0.0, 3.0, &EngineConfig::default());

        assert!(!state.t_forecast.is_empty());
        assert!(state.t_forecast.iter().all(|t| t.is_finite()));
        assert!(state.qg_forecast.iter().all(|q| q.is_finite()));
        for w in state.t_forecast.windows(2) {
            assert!((w[1] - w[0] - MONTH_DAYS).abs() < 1e-9);
        }
        // Cumulative never decreases
        for w in state.cum_gas_forecast.windows(2) {
            assert!(w[1] >= w[0] - 1e-6);
        }
    }

    #[test]
    fn modified_hyperbolic_gas_concatenates_without_duplicate_switch_point() {
        let points: Vec<(f64, f64, f64)> = (0..10)
            .map(|i| {
                let t = f64::from(i) * 30.44;
                let q = hyperbolic(t, 300.0, 0.004, 0.8);
                (t, q, 290.0 * t)
            })
            .collect();
        let mut state = WellForecastState::new(gas_history(&points));

        decline_by_time(&mut state, DeclineModel::ModifiedHyperbolic, 600.0, 5.0, &EngineConfig::default());

        assert!(!state.t_forecast.is_empty());
        assert_eq!(state.t_forecast.len(), state.qg_forecast.len());
        assert_eq!(state.t_forecast.len(), state.cum_gas_forecast.len());

        // Strictly increasing times — the switch point is not duplicated
        for w in state.t_forecast.windows(2) {
            assert!(w[1] > w[0]);
        }
        assert_eq!(state.params.model, Some("HM"));
    }

    #[test]
    fn single_sample_leaves_forecast_empty() {
        let mut state = WellForecastState::new(gas_history(&[(0.0, 200.0, 0.0)]));
        decline_by_time(&mut state, DeclineModel::Hyperbolic, 0.0, 5.0, &EngineConfig::default());
        assert!(state.t_forecast.is_empty());
        assert!(state.cum_gas_forecast.is_empty());
    }
}
