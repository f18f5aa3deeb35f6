//! Geology (map) correlation
//!
//! Predicts the anchors from map attributes. The peak-rate surface is a
//! bivariate cubic in stage density (frac stages / TOC) and net maturity
//! (thickness / Ro), one surface per fluid window. For oil the surface is
//! blended with the asymptotic simulation curve: past the stage count where
//! the two intersect, the simulation curve takes over. Zone multipliers
//! adjust the anchors for kitchen and organic-rich targets, and the P90/P10
//! band is a symmetric percent margin around the best estimate.

use crate::config::EngineConfig;
use crate::fitting::{fit_or_default, FitOptions};
use crate::models::{cum_modified_hyperbolic, linspace, modified_hyperbolic};
use crate::types::{
    CorrelationCurve, CorrelationFluid, CorrelationForecast, MapInputs, TargetZone,
};

use super::{fluid_from_ro, map_range_warnings};

/// Forecast horizon, days (35 years).
const HORIZON_DAYS: f64 = 35.0 * 365.0;

const GRID_POINTS: usize = 250;

/// EUR anchor time for the gas fits, days (25 years).
const GAS_EUR_ANCHOR_DAYS: f64 = 25.0 * 365.0;
const GAS_LOW_RATE_EUR_ANCHOR_DAYS: f64 = 25.0 * 365.25;

/// Gas peak rate below which the three-anchor low-rate fit is used.
const GAS_LOW_RATE_THRESHOLD: f64 = 10.0;

/// Anchors shared by the percentile fits: peak rate, cumulative at 180 days,
/// cumulative at one year, EUR.
#[derive(Debug, Clone, Copy)]
struct Anchors {
    qi: f64,
    np_180: f64,
    np_1yr: f64,
    eur: f64,
}

/// P90/P50/P10 type curves from map attributes, fluid window chosen by Ro.
pub fn map_correlation(inputs: &MapInputs, engine: &EngineConfig) -> CorrelationForecast {
    let fluid = fluid_from_ro(inputs.ro);

    let mut p50 = match fluid {
        CorrelationFluid::Oil => oil_anchors(inputs),
        CorrelationFluid::Gas => gas_anchors(inputs),
    };
    apply_zone(&mut p50, inputs.zone);

    let p90 = with_margin(p50, -inputs.uncertainty_pct);
    let p10 = with_margin(p50, inputs.uncertainty_pct);

    CorrelationForecast {
        fluid,
        p90: percentile_curve(p90, inputs.t_peak, fluid, engine),
        p50: percentile_curve(p50, inputs.t_peak, fluid, engine),
        p10: percentile_curve(p10, inputs.t_peak, fluid, engine),
        warnings: map_range_warnings(inputs, fluid),
    }
}

// ============================================================================
// Anchor regressions
// ============================================================================

/// Oil peak-rate surface in stage density `x` and net maturity `y`.
fn oil_rate_surface(x: f64, y: f64) -> f64 {
    -6.882_648 + 26.248_586 * x - 2.229_511 * y - 12.719_978 * x.powi(2)
        + 0.003_212 * y.powi(2)
        + 0.604_173 * x.powi(3)
        + 0.000_023 * y.powi(3)
        + 1.176_622 * x * y
        - 0.002_563 * x.powi(2) * y
        - 0.003_845 * y.powi(2) * x
}

/// Gas peak-rate surface.
fn gas_rate_surface(x: f64, y: f64) -> f64 {
    302.918_687 - 133.212_931 * x + 1.874_151 * y + 0.348_858 * x.powi(2) - 0.061 * y.powi(2)
        + 0.010_730 * x.powi(3)
        + 0.000_217 * y.powi(3)
        + 2.644_869 * x * y
        - 0.021_607 * x.powi(2) * y
        - 0.008_116 * y.powi(2) * x
}

/// Asymptotic simulation-derived peak rate, stage count only.
fn simulation_rate(frac_stages: f64) -> f64 {
    0.5639f64.mul_add(frac_stages.ln(), 5.4708).exp() / 6.29
}

/// Oil peak rate: map surface at low stage counts, simulation curve past the
/// intersection. The intersection cannot be solved in closed form, so it is
/// located by scanning candidate stage counts.
fn blended_oil_rate(inputs: &MapInputs) -> f64 {
    let y = inputs.thickness / inputs.ro;

    let mut best_diff = f64::INFINITY;
    let mut crossover = f64::INFINITY;
    for f in linspace(35.0, 65.0, 31) {
        let sim = simulation_rate(f);
        let diff = ((oil_rate_surface(f / inputs.toc, y) - sim) / sim).abs();
        if diff < best_diff {
            best_diff = diff;
            crossover = f;
        }
    }

    if inputs.frac_stages < crossover {
        oil_rate_surface(inputs.frac_stages / inputs.toc, y)
    } else {
        simulation_rate(inputs.frac_stages)
    }
}

fn oil_anchors(inputs: &MapInputs) -> Anchors {
    let qi = blended_oil_rate(inputs);
    Anchors {
        qi,
        np_180: 128.11f64.mul_add(qi, -157.91),
        np_1yr: 189.19f64.mul_add(qi, 4164.72),
        eur: (0.025_625f64.mul_add(inputs.frac_stages, 0.000_235 * inputs.lateral_length)
            + 10.4018)
            .exp(),
    }
}

fn gas_anchors(inputs: &MapInputs) -> Anchors {
    let qi = gas_rate_surface(
        inputs.frac_stages / inputs.toc,
        inputs.thickness / inputs.ro,
    );

    // EUR surface in log-normalized stage count and lateral length
    let stages_norm =
        (inputs.frac_stages.ln() - 5f64.ln()) / (63f64.ln() - 5f64.ln());
    let lateral_norm =
        (inputs.lateral_length.ln() - 500f64.ln()) / (5083f64.ln() - 500f64.ln());
    let eur = (0.522_371f64.mul_add(stages_norm, 1.614_969_54 * lateral_norm) + 11.632_59).exp();

    Anchors {
        qi,
        np_180: 128.11f64.mul_add(qi, -157.91),
        np_1yr: 265.794_254_61f64.mul_add(qi, -7_871.270_169_80),
        eur,
    }
}

fn apply_zone(a: &mut Anchors, zone: TargetZone) {
    match zone {
        TargetZone::Average => {}
        TargetZone::Kitchen => {
            a.qi *= 1.14;
            a.np_180 *= 1.18;
            a.np_1yr *= 1.1;
            a.eur *= 1.21;
        }
        TargetZone::OrganicRich => {
            a.qi *= 0.87;
            a.np_180 *= 0.84;
            a.np_1yr *= 0.8;
            a.eur *= 1.3;
        }
    }
}

/// Shift all anchors by a signed percent margin.
fn with_margin(a: Anchors, pct: f64) -> Anchors {
    let scale = 1.0 + pct / 100.0;
    Anchors {
        qi: a.qi * scale,
        np_180: a.np_180 * scale,
        np_1yr: a.np_1yr * scale,
        eur: a.eur * scale,
    }
}

// ============================================================================
// Curve generation
// ============================================================================

fn percentile_curve(
    a: Anchors,
    t_peak: f64,
    fluid: CorrelationFluid,
    engine: &EngineConfig,
) -> CorrelationCurve {
    let np_peak = a.qi * t_peak / 2.0;

    // Anchor layout and bounds differ per fluid. The oil fit pins the peak
    // anchor loosely (sigma 5) and the mid-life cumulatives tightly; the gas
    // fits are unweighted.
    let (t_anchor, cum_anchor, lower, upper, seed, sigma): (
        Vec<f64>,
        Vec<f64>,
        Vec<f64>,
        Vec<f64>,
        Vec<f64>,
        Option<Vec<f64>>,
    ) = match fluid {
        CorrelationFluid::Oil => (
            vec![t_peak, 180.0, 365.0, HORIZON_DAYS],
            vec![np_peak, a.np_180, a.np_1yr, a.eur],
            vec![a.qi * 0.99, 0.001, 0.4],
            vec![a.qi * 1.01, 10.0, 1.3],
            vec![a.qi, 0.005, 0.9],
            Some(vec![5.0, 0.1, 0.1, 1.0]),
        ),
        CorrelationFluid::Gas if a.qi > GAS_LOW_RATE_THRESHOLD => (
            vec![t_peak, 180.0, 365.0, GAS_EUR_ANCHOR_DAYS],
            vec![np_peak, a.np_180, a.np_1yr, a.eur],
            vec![a.qi * 0.95, 0.0, 0.4],
            vec![a.qi * 1.05, 1.1, 1.5],
            vec![a.qi, 0.005, 0.9],
            None,
        ),
        CorrelationFluid::Gas => (
            vec![t_peak, 365.0, GAS_LOW_RATE_EUR_ANCHOR_DAYS],
            vec![np_peak, a.np_1yr, a.eur],
            vec![10.0, 0.0, 0.4],
            vec![20.0, 1.1, 1.3],
            vec![15.0, 0.005, 0.9],
            None,
        ),
    };

    let outcome = fit_or_default(
        |t, p| cum_modified_hyperbolic(t, p[0], p[1], p[2]),
        &t_anchor,
        &cum_anchor,
        &lower,
        &upper,
        &FitOptions {
            max_evals: engine.fitting.correlation_max_evals,
            seed: Some(seed.clone()),
            sigma,
        },
        &seed,
        "map correlation anchors",
    );
    let p = outcome.params();
    let (qi, di, b) = (p[0], p[1], p[2]);

    // Decline grid from the peak, with a single zero point prepended as the
    // ramp origin
    let grid = linspace(t_peak, HORIZON_DAYS, GRID_POINTS);
    let mut t = vec![0.0];
    let mut rate = vec![0.0];
    let mut cum = vec![0.0];
    for &g in &grid {
        t.push(g);
        rate.push(modified_hyperbolic(g, qi, di, b, t_peak));
        cum.push(cum_modified_hyperbolic(g, qi, di, b));
    }

    CorrelationCurve {
        q_max: a.qi,
        eur: a.eur,
        np_1yr: a.np_1yr,
        t,
        cum,
        rate,
        params: (qi, di, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oil_inputs() -> MapInputs {
        MapInputs {
            toc: 4.2,
            ro: 1.1,
            thickness: 150.0,
            frac_stages: 40.0,
            lateral_length: 2500.0,
            zone: TargetZone::Average,
            t_peak: 90.0,
            uncertainty_pct: 15.0,
        }
    }

    fn gas_inputs() -> MapInputs {
        MapInputs {
            toc: 4.5,
            ro: 1.5,
            thickness: 200.0,
            frac_stages: 40.0,
            lateral_length: 2500.0,
            zone: TargetZone::Average,
            t_peak: 90.0,
            uncertainty_pct: 15.0,
        }
    }

    #[test]
    fn fluid_window_follows_maturity() {
        let engine = EngineConfig::default();
        assert_eq!(
            map_correlation(&oil_inputs(), &engine).fluid,
            CorrelationFluid::Oil
        );
        assert_eq!(
            map_correlation(&gas_inputs(), &engine).fluid,
            CorrelationFluid::Gas
        );
    }

    #[test]
    fn percentile_band_is_symmetric_around_p50() {
        let fc = map_correlation(&oil_inputs(), &EngineConfig::default());
        assert!((fc.p10.q_max - fc.p50.q_max * 1.15).abs() < 1e-9);
        assert!((fc.p90.q_max - fc.p50.q_max * 0.85).abs() < 1e-9);
        assert!(fc.p10.eur > fc.p50.eur);
        assert!(fc.p90.eur < fc.p50.eur);
    }

    #[test]
    fn curves_have_a_zero_origin_then_the_peak_grid() {
        let fc = map_correlation(&oil_inputs(), &EngineConfig::default());
        let c = &fc.p50;
        assert_eq!(c.t.len(), GRID_POINTS + 1);
        assert_eq!(c.rate.len(), c.t.len());
        assert_eq!(c.cum.len(), c.t.len());
        assert!((c.t[0]).abs() < f64::EPSILON);
        assert!((c.rate[0]).abs() < f64::EPSILON);
        assert!((c.t[1] - 90.0).abs() < f64::EPSILON);
        // First grid rate is the fitted qi (hyperbolic at the peak)
        assert!((c.rate[1] - c.params.0).abs() < 1e-9);
    }

    #[test]
    fn kitchen_zone_scales_anchors_up() {
        let mut inputs = oil_inputs();
        let base = map_correlation(&inputs, &EngineConfig::default());
        inputs.zone = TargetZone::Kitchen;
        let kitchen = map_correlation(&inputs, &EngineConfig::default());

        assert!((kitchen.p50.q_max - base.p50.q_max * 1.14).abs() < 1e-9);
        assert!((kitchen.p50.eur - base.p50.eur * 1.21).abs() < 1e-9);
    }

    #[test]
    fn gas_fit_respects_its_bounds() {
        let fc = map_correlation(&gas_inputs(), &EngineConfig::default());
        let (qi, di, b) = fc.p50.params;
        assert!(qi > 0.0, "qi = {qi}");
        assert!((0.0..=1.1).contains(&di), "di = {di}");
        assert!((0.4..=1.5).contains(&b), "b = {b}");
    }

    #[test]
    fn oil_blend_switches_to_the_simulation_curve() {
        // At high stage counts the blended rate equals the simulation curve
        let mut inputs = oil_inputs();
        inputs.frac_stages = 64.0;
        let qi = blended_oil_rate(&inputs);
        assert!((qi - simulation_rate(64.0)).abs() < 1e-9);
    }

    #[test]
    fn cumulative_is_monotone() {
        let fc = map_correlation(&oil_inputs(), &EngineConfig::default());
        for w in fc.p50.cum.windows(2) {
            assert!(w[1] >= w[0] - 1e-6);
        }
    }
}
