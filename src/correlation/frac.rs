//! Completion-design (frac) correlation
//!
//! Predicts peak rate, one-year cumulative and EUR from frac stage count and
//! lateral length, then fits a modified-hyperbolic cumulative through three
//! anchors: the linear ramp-up cumulative at peak, the one-year cumulative
//! and the EUR at the horizon. The peak-rate regression switches from an
//! exponential completion model to an asymptotic simulation-derived curve at
//! high stage counts, where adding stages stops paying off linearly.

use crate::config::EngineConfig;
use crate::fitting::{fit_or_default, FitOptions};
use crate::models::{cum_modified_hyperbolic, linspace, modified_hyperbolic};
use crate::types::{
    CorrelationCurve, CorrelationFluid, CorrelationForecast, FracInputs, RangeWarning,
};

/// Forecast horizon, days (25 years). The EUR anchor sits here.
const HORIZON_DAYS: f64 = 9132.0;

const GRID_POINTS: usize = 200;

/// Stage count where the peak-rate regression switches to the asymptotic
/// simulation curve.
const STAGE_COUNT_SWITCH: f64 = 43.0;

/// Percentile shrink factors applied as divisors to (peak rate, EUR, one-year
/// cumulative).
const P50_DIVISORS: [f64; 3] = [1.0, 1.0, 1.0];
const P90_DIVISORS: [f64; 3] = [1.0 + 0.169, 1.0 + 0.3064, 1.0 + 0.219];
const P10_DIVISORS: [f64; 3] = [1.0 - 0.155, 1.0 - 0.239, 1.0 - 0.166];

/// Completion envelope the regressions were calibrated on.
const FRAC_STAGES_RANGE: (f64, f64) = (20.0, 60.0);
const LATERAL_RANGE: (f64, f64) = (500.0, 5083.0);

/// P90/P50/P10 oil type curves from completion design alone.
pub fn frac_correlation(inputs: &FracInputs, engine: &EngineConfig) -> CorrelationForecast {
    let warnings = [
        RangeWarning::check(
            "frac_stages",
            inputs.frac_stages,
            FRAC_STAGES_RANGE.0,
            FRAC_STAGES_RANGE.1,
        ),
        RangeWarning::check(
            "lateral_length",
            inputs.lateral_length,
            LATERAL_RANGE.0,
            LATERAL_RANGE.1,
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    CorrelationForecast {
        fluid: CorrelationFluid::Oil,
        p90: percentile_curve(inputs, &P90_DIVISORS, engine),
        p50: percentile_curve(inputs, &P50_DIVISORS, engine),
        p10: percentile_curve(inputs, &P10_DIVISORS, engine),
        warnings,
    }
}

/// Peak oil rate, m3/d.
fn peak_rate(frac_stages: f64, lateral_length: f64) -> f64 {
    if frac_stages < STAGE_COUNT_SWITCH {
        (0.038_631f64.mul_add(frac_stages, 0.000_103 * lateral_length) + 3.682_385).exp()
    } else {
        0.5639f64.mul_add(frac_stages.ln(), 5.4708).exp() / 6.29
    }
}

/// Estimated ultimate recovery at the horizon, m3.
fn estimated_ultimate_recovery(frac_stages: f64, lateral_length: f64) -> f64 {
    (0.025_625f64.mul_add(frac_stages, 0.000_235 * lateral_length) + 10.4018).exp()
}

/// Cumulative at one year, m3.
fn one_year_cumulative(frac_stages: f64, lateral_length: f64) -> f64 {
    (1.025_619f64.mul_add(frac_stages.ln(), -0.0805 * lateral_length.ln()) + 7.533_349).exp()
}

fn percentile_curve(
    inputs: &FracInputs,
    divisors: &[f64; 3],
    engine: &EngineConfig,
) -> CorrelationCurve {
    let q_max = peak_rate(inputs.frac_stages, inputs.lateral_length) / divisors[0];
    let eur = estimated_ultimate_recovery(inputs.frac_stages, inputs.lateral_length) / divisors[1];
    let np_1yr = one_year_cumulative(inputs.frac_stages, inputs.lateral_length) / divisors[2];

    // Linear ramp to peak, truncated to whole cubic meters
    let np_peak = (inputs.t_peak * q_max / 2.0).trunc();

    let t_anchor = [0.0, 365.0, HORIZON_DAYS];
    let cum_anchor = [np_peak, np_1yr, eur];

    let outcome = fit_or_default(
        |t, p| cum_modified_hyperbolic(t, p[0], p[1], p[2]),
        &t_anchor,
        &cum_anchor,
        &[q_max * 0.97, 0.0, 0.4],
        &[q_max * 1.03, 1.0, 1.3],
        &FitOptions {
            max_evals: engine.fitting.correlation_max_evals,
            seed: Some(vec![q_max, 0.005, 0.9]),
            sigma: None,
        },
        &[q_max, 0.005, 0.9],
        "completion correlation anchors",
    );
    let p = outcome.params();
    let (qi, di, b) = (p[0], p[1], p[2]);

    // Ramp from zero to the fitted qi at peak time, then the decline grid
    let grid = linspace(0.0, HORIZON_DAYS, GRID_POINTS);
    let mut t = vec![0.0, inputs.t_peak];
    let mut rate = vec![0.0, qi];
    let mut cum = vec![0.0, np_peak];
    for &g in &grid {
        t.push(g + inputs.t_peak);
        rate.push(modified_hyperbolic(g, qi, di, b, 0.0));
        cum.push(cum_modified_hyperbolic(g, qi, di, b) + np_peak);
    }

    CorrelationCurve {
        q_max,
        eur,
        np_1yr,
        t,
        cum,
        rate,
        params: (qi, di, b),
    }
}
