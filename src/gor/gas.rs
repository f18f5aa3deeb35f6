//! GOR forecasting for gas wells
//!
//! Three policies keyed on the reservoir-fluid tag:
//! - dry gas: constant, effectively-infinite GOR
//! - wet gas: constant GOR from the outlier-trimmed historical mean
//! - oil-associated: constant initial GOR until the dewpoint (a per-field
//!   Gp/EUR fraction), then a reciprocal-quadratic transition fit to the
//!   post-dewpoint history, reshaped so the tail lands on a terminal GOR
//!   anchored to the last observation.

use tracing::warn;

use crate::config::EngineConfig;
use crate::fitting::{fit_model, FitOptions};
use crate::gor::{gor_history_masked, nan_mean, trimmed_mean};
use crate::models::reciprocal_quadratic;
use crate::types::{Fluid, FluidTag, GorParams, WellForecastState};

pub fn gor_forecast_gas(state: &mut WellForecastState, engine: &EngineConfig) {
    if state.t_forecast.is_empty() {
        state.gor_forecast = Vec::new();
        state.gor_history_len = 0;
        state.gor_params = GorParams::default();
        return;
    }

    let hist_len = state.history.len();

    if state.history.fluid_tag == FluidTag::DryGas {
        state.gor_forecast = vec![engine.gor.dry_gas_gor; hist_len + state.t_forecast.len()];
        state.gor_history_len = hist_len;
        state.gor_params = GorParams::default();
        return;
    }

    let gor_hist = gor_history_masked(state);

    if state.history.fluid_tag == FluidTag::WetGas {
        let gor_i = if gor_hist.len() > 2 {
            trimmed_mean(&gor_hist[2..], engine.gor.outlier_sigma)
        } else {
            engine.gor.dry_gas_gor
        };
        state.gor_forecast = vec![gor_i; hist_len + state.t_forecast.len()];
        state.gor_history_len = hist_len;
        state.gor_params = GorParams {
            gor_i: Some(gor_i),
            a: None,
            gor_max: Some(gor_i),
        };
        return;
    }

    dewpoint_transition(state, &gor_hist, engine);
}

/// Oil-associated gas: flat GOR until the dewpoint, reciprocal-quadratic
/// transition afterwards.
fn dewpoint_transition(state: &mut WellForecastState, gor_hist: &[f64], engine: &EngineConfig) {
    let hist_len = state.history.len();
    let cum_hist = state.history.cumulatives(Fluid::Gas);
    let eur = state.cum_gas_forecast[state.cum_gas_forecast.len() - 1];
    let threshold = engine.gor.dewpoint_threshold(&state.history.field);

    let history_past_dew = cum_hist.iter().any(|&c| c / eur > threshold);

    let (gor_until_dew, mut gor_after_dew, gor_i) = if history_past_dew {
        // Dewpoint position inside history: one past the last sample still at
        // or below the threshold
        let dew_pos = cum_hist.partition_point(|&c| c / eur <= threshold);

        let mut gor_i = trimmed_mean(&gor_hist[1..dew_pos.max(1)], engine.gor.outlier_sigma);
        if !gor_i.is_finite() {
            gor_i = gor_hist[0];
        }
        gor_i = gor_i.min(engine.gor.gor_cap);

        // Fit the transition on the post-dewpoint history, GOR scaled down by
        // 1000 to keep the coefficients near the optimizer's comfort zone
        let x_fit: Vec<f64> = cum_hist[dew_pos..].iter().map(|&c| c / eur).collect();
        let y_fit: Vec<f64> = gor_hist[dew_pos..].iter().map(|&g| g / 1000.0).collect();

        let coeffs = fit_model(
            |x, p| reciprocal_quadratic(x, p[0], p[1], p[2]),
            &x_fit,
            &y_fit,
            &[0.0, f64::NEG_INFINITY, 0.0],
            &[f64::INFINITY, 0.0, f64::INFINITY],
            &FitOptions::with_max_evals(engine.fitting.max_evals),
        )
        .map_or_else(
            || {
                warn!(well = %state.history.well_name, "dewpoint transition fit failed, using fallback coefficients");
                engine.gor.fallback_recip_quad
            },
            |p| (p[0] / 1000.0, p[1] / 1000.0, p[2] / 1000.0),
        );

        let x_after: Vec<f64> = cum_hist[dew_pos..]
            .iter()
            .chain(state.cum_gas_forecast.iter())
            .map(|&c| c / eur)
            .collect();
        let after: Vec<f64> = x_after
            .iter()
            .map(|&x| reciprocal_quadratic(x, coeffs.0, coeffs.1, coeffs.2))
            .collect();

        (vec![gor_i; dew_pos], after, gor_i)
    } else {
        // Dewpoint reached only inside the forecast; no post-dewpoint history
        // to fit, so the fallback coefficients shape the transition
        let dew_pos = state
            .cum_gas_forecast
            .partition_point(|&c| c / eur <= threshold);

        let mut gor_i = nan_mean(&gor_hist[1.min(gor_hist.len())..]);
        if !gor_i.is_finite() {
            gor_i = gor_hist.first().copied().unwrap_or(0.0);
        }
        gor_i = gor_i.min(engine.gor.gor_cap);

        let coeffs = engine.gor.fallback_recip_quad;
        let after: Vec<f64> = state.cum_gas_forecast[dew_pos..]
            .iter()
            .map(|&c| reciprocal_quadratic(c / eur, coeffs.0, coeffs.1, coeffs.2))
            .collect();

        (vec![gor_i; hist_len + dew_pos], after, gor_i)
    };

    for g in &mut gor_after_dew {
        if *g < 0.0 {
            *g = 0.0;
        }
    }
    reshape_tail(gor_hist, &mut gor_after_dew, gor_i);

    state.gor_forecast = gor_until_dew.into_iter().chain(gor_after_dew).collect();
    state.gor_history_len = hist_len;
    let gor_max = state
        .gor_forecast
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    state.gor_params = GorParams {
        gor_i: Some(gor_i),
        a: None,
        gor_max: Some(gor_max),
    };
}

/// Rescale the transition past its peak so the curve decays onto a terminal
/// GOR: the last observation when it sits below the initial GOR, otherwise
/// the midpoint of the two.
fn reshape_tail(gor_hist: &[f64], gor_after_dew: &mut [f64], gor_i: f64) {
    if gor_after_dew.is_empty() {
        return;
    }

    let max_pos = gor_after_dew
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map_or(0, |(i, _)| i);

    let last_obs = gor_hist
        .iter()
        .rev()
        .copied()
        .find(|v| v.is_finite())
        .unwrap_or(gor_i);
    let gor_terminal = if last_obs < gor_i {
        last_obs
    } else {
        0.5 * (gor_i + last_obs)
    };

    let peak = gor_after_dew[max_pos];
    let last = gor_after_dew[gor_after_dew.len() - 1];
    let shrink_range = peak - gor_terminal;
    let span = peak - last;

    if span.abs() < f64::EPSILON {
        for g in &mut gor_after_dew[max_pos..] {
            *g = gor_terminal;
        }
        return;
    }

    for g in &mut gor_after_dew[max_pos..] {
        let normalized = (*g - last) / span;
        *g = shrink_range.mul_add(normalized, gor_terminal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{WellHistory, WellSample};

    fn gas_state(tag: FluidTag, gor: &[f64], cum_gas: &[f64]) -> WellForecastState {
        let samples = gor
            .iter()
            .zip(cum_gas.iter())
            .enumerate()
            .map(|(i, (&g, &c))| WellSample {
                t: i as f64 * 30.44,
                qo: 0.0,
                qg: 200.0,
                cum_oil: 0.0,
                cum_gas: c,
                gor: g,
                qw: 0.0,
            })
            .collect();
        let mut state = WellForecastState::new(WellHistory {
            well_name: "G".into(),
            field: "LA CALERA".into(),
            lateral_length: f64::NAN,
            frac_stages: f64::NAN,
            fluid_tag: tag,
            start_date: None,
            qo_peak: f64::NAN,
            samples,
        });
        // Forecast continuing where the history left off
        let last_t = (gor.len() - 1) as f64 * 30.44;
        let last_cum = cum_gas.last().copied().unwrap_or(0.0);
        state.t_forecast = (1..=40).map(|i| 30.44f64.mul_add(f64::from(i), last_t)).collect();
        state.cum_gas_forecast = (1..=40)
            .map(|i| 5000.0f64.mul_add(f64::from(i), last_cum))
            .collect();
        state.qg_forecast = vec![180.0; 40];
        state
    }

    #[test]
    fn empty_forecast_leaves_gor_empty() {
        let mut s = gas_state(FluidTag::WetGas, &[900.0, 950.0], &[0.0, 6000.0]);
        s.t_forecast.clear();
        s.cum_gas_forecast.clear();
        gor_forecast_gas(&mut s, &EngineConfig::default());
        assert!(s.gor_forecast.is_empty());
        assert_eq!(s.gor_params.gor_i, None);
    }

    #[test]
    fn dry_gas_gets_constant_infinite_gor() {
        let mut s = gas_state(FluidTag::DryGas, &[0.0, 0.0, 0.0], &[0.0, 6000.0, 12_000.0]);
        gor_forecast_gas(&mut s, &EngineConfig::default());

        assert_eq!(s.gor_forecast.len(), 3 + 40);
        assert!(s.gor_forecast.iter().all(|&g| (g - 1.0e6).abs() < f64::EPSILON));
        assert_eq!(s.gor_history_len, 3);
    }

    #[test]
    fn wet_gas_uses_trimmed_historical_mean() {
        let gor = [0.0, 800.0, 1000.0, 1010.0, 990.0, 1005.0, 995.0, 80_000.0];
        let cum: Vec<f64> = (0..8).map(|i| f64::from(i) * 6000.0).collect();
        let mut s = gas_state(FluidTag::WetGas, &gor, &cum);
        gor_forecast_gas(&mut s, &EngineConfig::default());

        let gor_i = s.gor_params.gor_i.unwrap();
        assert!((gor_i - 1000.0).abs() < 15.0, "gor_i = {gor_i}");
        assert!(s.gor_forecast.iter().all(|&g| (g - gor_i).abs() < f64::EPSILON));
        assert_eq!(s.gor_forecast.len(), 8 + 40);
    }

    #[test]
    fn dewpoint_only_in_forecast_keeps_flat_gor_until_threshold() {
        // History cumulative is a tiny share of EUR; transition happens in
        // the forecast span with fallback coefficients
        let gor = [0.0, 900.0, 910.0, 905.0];
        let cum = [0.0, 500.0, 1000.0, 1500.0];
        let mut s = gas_state(FluidTag::OilAssociated, &gor, &cum);
        let engine = EngineConfig::default();
        gor_forecast_gas(&mut s, &engine);

        assert_eq!(s.gor_forecast.len(), 4 + 40);
        assert_eq!(s.gor_history_len, 4);

        let gor_i = s.gor_params.gor_i.unwrap();
        assert!((gor_i - nan_mean(&[900.0, 910.0, 905.0])).abs() < 1e-9);

        // Flat until the dewpoint
        let eur = s.cum_gas_forecast[39];
        let threshold = engine.gor.dewpoint_threshold("LA CALERA");
        let dew_pos = s.cum_gas_forecast.partition_point(|&c| c / eur <= threshold);
        for &g in &s.gor_forecast[..4 + dew_pos] {
            assert!((g - gor_i).abs() < f64::EPSILON);
        }
        assert!(s.gor_forecast.iter().all(|&g| g >= 0.0));
    }

    #[test]
    fn initial_gor_is_capped() {
        let gor = [0.0, 40_000.0, 41_000.0, 39_000.0];
        let cum = [0.0, 500.0, 1000.0, 1500.0];
        let mut s = gas_state(FluidTag::OilAssociated, &gor, &cum);
        let engine = EngineConfig::default();
        gor_forecast_gas(&mut s, &engine);

        assert!(s.gor_params.gor_i.unwrap() <= engine.gor.gor_cap);
    }
}
