//! Decline model library — pure rate/cumulative functions
//!
//! All decline shapes used by the forecasting pipeline and the two
//! correlation models:
//! - Hyperbolic and exponential rate decline
//! - Closed-form hyperbolic cumulative
//! - Modified-hyperbolic rate/cumulative (hyperbolic-to-exponential switch)
//! - Reciprocal-quadratic GOR shape (GOR vs Gp/EUR)
//! - Time-domain GOR S-curve (SPE-197096-MS form)
//!
//! Every function is a pure scalar `f64` calculation; callers map them over
//! time or cumulative grids.

/// Average month length in days. All evenly-paced forecast grids step by this.
pub const MONTH_DAYS: f64 = 30.44;

/// Days per year used when annualizing decline rates for display.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Fixed hyperbolic-to-exponential switch time (days) embedded in both
/// correlation cumulative models. Kept as an exact numerical-parity constant.
pub const CORRELATION_SWITCH_DAYS: f64 = 2432.0;

/// Lag (days) applied when computing the local decline at the correlation
/// switch time: `d_switch = di / (1 + b·di·(2432 − 20))`.
const SWITCH_DECLINE_LAG_DAYS: f64 = 20.0;

// ============================================================================
// Rate decline
// ============================================================================

/// Hyperbolic decline rate
///
/// Formula: `q(t) = qi / (1 + b·di·t)^(1/b)`
///
/// The `b → 0` limit is the exponential form, which is returned directly for
/// very small `b` to avoid the `1/b` blow-up.
pub fn hyperbolic(t: f64, qi: f64, di: f64, b: f64) -> f64 {
    if b.abs() < 1e-9 {
        return exponential(t, qi, di);
    }

    let base = 1.0 + b * di * t;
    if base <= 0.0 {
        // Hyperbolic curve is undefined past 1 + b·di·t = 0
        return 0.0;
    }

    qi / base.powf(1.0 / b)
}

/// Exponential decline rate
///
/// Formula: `q(t) = qi · e^(−di·t)`
pub fn exponential(t: f64, qi: f64, di: f64) -> f64 {
    qi * (-di * t).exp()
}

// ============================================================================
// Cumulative production
// ============================================================================

/// Closed-form hyperbolic cumulative
///
/// Formula: `Q(t) = (qi^b / (di·(1−b))) · (qi^(1−b) − q(t)^(1−b))`
///
/// Degenerate cases:
/// - `di = 0`: no decline, cumulative is linear `qi·t`
/// - `b = 1` (harmonic): `Q(t) = qi/di · ln(1 + di·t)`
pub fn cum_hyperbolic(t: f64, qi: f64, di: f64, b: f64) -> f64 {
    if di <= 0.0 {
        return qi * t;
    }

    if (1.0 - b).abs() < 1e-9 {
        return qi / di * (1.0 + di * t).ln();
    }

    let q = hyperbolic(t, qi, di, b);
    (qi.powf(b) / (di * (1.0 - b))) * (qi.powf(1.0 - b) - q.powf(1.0 - b))
}

/// Modified-hyperbolic cumulative used by both correlation forecasters
///
/// Hyperbolic until [`CORRELATION_SWITCH_DAYS`], then an exponential
/// continuation anchored at the switch-time cumulative:
///
/// `Q(t) = Q_sw + q_sw · (1 − e^(−d_sw·(t − t_sw))) / d_sw`
///
/// where `q_sw` is the hyperbolic rate at the switch and
/// `d_sw = di / (1 + b·di·(t_sw − 20))`. The curve is continuous at the
/// switch time.
pub fn cum_modified_hyperbolic(t: f64, qi: f64, di: f64, b: f64) -> f64 {
    let t_sw = CORRELATION_SWITCH_DAYS;

    if t < t_sw {
        return cum_hyperbolic(t, qi, di, b);
    }

    let cum_sw = cum_hyperbolic(t_sw, qi, di, b);
    let q_sw = hyperbolic(t_sw, qi, di, b);
    let d_sw = switch_decline(di, b);

    if d_sw <= 0.0 {
        // No decline past the switch: constant-rate continuation
        return cum_sw + q_sw * (t - t_sw);
    }

    cum_sw + q_sw * (1.0 - (-d_sw * (t - t_sw)).exp()) / d_sw
}

/// Modified-hyperbolic rate, with the hyperbolic segment shifted by `t_peak`
///
/// Used by the correlation forecasters to generate rate curves from the
/// parameters fit on the cumulative model. The exponential continuation past
/// [`CORRELATION_SWITCH_DAYS`] decays from the unshifted switch-time rate.
pub fn modified_hyperbolic(t: f64, qi: f64, di: f64, b: f64, t_peak: f64) -> f64 {
    let t_sw = CORRELATION_SWITCH_DAYS;

    if t < t_sw {
        return hyperbolic(t - t_peak, qi, di, b);
    }

    let q_sw = hyperbolic(t_sw, qi, di, b);
    let d_sw = switch_decline(di, b);
    q_sw * (-d_sw * (t - t_sw)).exp()
}

/// Local decline rate at the correlation switch time.
fn switch_decline(di: f64, b: f64) -> f64 {
    di / (1.0 + b * di * (CORRELATION_SWITCH_DAYS - SWITCH_DECLINE_LAG_DAYS))
}

// ============================================================================
// GOR shapes
// ============================================================================

/// Reciprocal-quadratic GOR shape
///
/// Formula: `f(x) = x / (a + b·x + c·x²)`
///
/// Fit to `GOR/1000` vs `Gp/EUR` past the dewpoint for gas wells.
pub fn reciprocal_quadratic(x: f64, a: f64, b: f64, c: f64) -> f64 {
    let denom = a + b * x + c * x * x;
    let v = x / denom;
    if v.is_finite() { v } else { 0.0 }
}

/// Time-domain GOR S-curve with terminal taper
///
/// Modified SPE-197096-MS form:
/// `GOR(t) = GORf · (GORi/GORf)^(e^(−a·t)) · (last_t − t) / last_t`
///
/// `a` controls the curvature slope at the inflection. Non-finite results
/// (e.g. `GORf = 0`) collapse to zero.
pub fn gor_time_curve(t: f64, a: f64, gor_i: f64, gor_f: f64, last_t: f64) -> f64 {
    let v = gor_f * (gor_i / gor_f).powf((-a * t).exp()) * (last_t - t) / last_t;
    if v.is_finite() { v } else { 0.0 }
}

/// Time-domain GOR S-curve without the terminal taper
///
/// Shape function for the manual GOR method; the result is rescaled onto the
/// caller's breakpoints afterwards.
pub fn gor_shape(t: f64, a: f64, gor_i: f64, gor_f: f64) -> f64 {
    let v = gor_f * (gor_i / gor_f).powf((-a * t).exp());
    if v.is_finite() { v } else { 0.0 }
}

// ============================================================================
// Evaluation grids
// ============================================================================

/// Half-open arithmetic grid `[start, stop)` with the given step.
///
/// Empty when `stop <= start` or the step is non-positive.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut i = 0u64;
    loop {
        // Multiply instead of accumulating to keep long grids drift-free
        #[allow(clippy::cast_precision_loss)]
        let v = step.mul_add(i as f64, start);
        if v >= stop {
            break;
        }
        out.push(v);
        i += 1;
    }
    out
}

/// Closed uniform grid with `n` points from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            #[allow(clippy::cast_precision_loss)]
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let v = step.mul_add(i as f64, start);
                    v
                })
                .collect()
        }
    }
}

/// Piecewise-linear interpolation of `x` onto the sample points `(xp, fp)`.
///
/// `xp` must be increasing. Values outside the sample range clamp to the edge
/// values, matching the usual one-dimensional interpolation convention.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    if xp.is_empty() {
        return 0.0;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if let (Some(&last_x), Some(&last_f)) = (xp.last(), fp.last()) {
        if x >= last_x {
            return last_f;
        }
    }
    // Binary search for the bracketing segment
    let hi = xp.partition_point(|&v| v < x);
    let lo = hi - 1;
    let span = xp[hi] - xp[lo];
    if span <= 0.0 {
        return fp[lo];
    }
    fp[lo] + (fp[hi] - fp[lo]) * (x - xp[lo]) / span
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyperbolic_starts_at_qi() {
        for &b in &[0.2, 0.5, 0.9, 1.0] {
            assert!((hyperbolic(0.0, 100.0, 0.01, b) - 100.0).abs() < 1e-12);
        }
    }

    #[test]
    fn hyperbolic_is_monotonically_non_increasing() {
        let mut prev = f64::INFINITY;
        for i in 0..200 {
            let q = hyperbolic(f64::from(i) * 30.44, 100.0, 0.005, 0.8);
            assert!(q <= prev, "rate increased at step {i}");
            prev = q;
        }
    }

    #[test]
    fn hyperbolic_small_b_matches_exponential() {
        let t = 500.0;
        let hyp = hyperbolic(t, 80.0, 0.002, 1e-12);
        let exp = exponential(t, 80.0, 0.002);
        assert!((hyp - exp).abs() < 1e-6);
    }

    #[test]
    fn cum_hyperbolic_zero_time_is_zero() {
        assert!(cum_hyperbolic(0.0, 100.0, 0.01, 0.8).abs() < 1e-9);
    }

    #[test]
    fn cum_hyperbolic_harmonic_limit() {
        // b → 1 should converge to the harmonic closed form
        let near = cum_hyperbolic(1000.0, 100.0, 0.01, 1.0 - 1e-10);
        let harmonic = 100.0 / 0.01 * (1.0f64 + 0.01 * 1000.0).ln();
        assert!((near - harmonic).abs() / harmonic < 1e-4);
    }

    #[test]
    fn cum_modified_hyperbolic_continuous_at_switch() {
        let (qi, di, b) = (150.0, 0.008, 0.9);
        let before = cum_modified_hyperbolic(CORRELATION_SWITCH_DAYS - 1e-6, qi, di, b);
        let after = cum_modified_hyperbolic(CORRELATION_SWITCH_DAYS + 1e-6, qi, di, b);
        assert!(
            (before - after).abs() < 1e-3,
            "cumulative discontinuity at switch: {before} vs {after}"
        );
    }

    #[test]
    fn cum_modified_hyperbolic_monotonic() {
        let mut prev = -1.0;
        for i in 0..400 {
            let q = cum_modified_hyperbolic(f64::from(i) * 30.44, 150.0, 0.008, 0.9);
            assert!(q >= prev);
            prev = q;
        }
    }

    #[test]
    fn reciprocal_quadratic_zero_denominator_is_zero() {
        assert_eq!(reciprocal_quadratic(1.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn gor_time_curve_starts_near_gor_i() {
        // At t = 0 the exponent is 1 so the curve passes through GORi
        let v = gor_time_curve(0.0, 0.002, 800.0, 4000.0, 10_000.0);
        assert!((v - 800.0).abs() < 1e-9);
    }

    #[test]
    fn gor_time_curve_tapers_to_zero_at_last_t() {
        let v = gor_time_curve(10_000.0, 0.002, 800.0, 4000.0, 10_000.0);
        assert!(v.abs() < 1e-9);
    }

    #[test]
    fn gor_shape_zero_final_collapses_to_zero() {
        assert_eq!(gor_shape(100.0, 0.002, 800.0, 0.0), 0.0);
    }

    #[test]
    fn arange_excludes_stop() {
        let g = arange(0.0, 91.32, 30.44);
        assert_eq!(g.len(), 3);
        assert!((g[2] - 60.88).abs() < 1e-9);
    }

    #[test]
    fn arange_empty_when_stop_not_beyond_start() {
        assert!(arange(100.0, 100.0, 30.44).is_empty());
        assert!(arange(100.0, 50.0, 30.44).is_empty());
    }

    #[test]
    fn linspace_hits_both_endpoints() {
        let g = linspace(0.0, 9132.0, 200);
        assert_eq!(g.len(), 200);
        assert!(g[0].abs() < 1e-12);
        assert!((g[199] - 9132.0).abs() < 1e-9);
    }

    #[test]
    fn interp_clamps_and_interpolates() {
        let xp = [0.0, 10.0, 20.0];
        let fp = [0.0, 100.0, 50.0];
        assert!((interp(-5.0, &xp, &fp) - 0.0).abs() < 1e-12);
        assert!((interp(5.0, &xp, &fp) - 50.0).abs() < 1e-12);
        assert!((interp(15.0, &xp, &fp) - 75.0).abs() < 1e-12);
        assert!((interp(25.0, &xp, &fp) - 50.0).abs() < 1e-12);
    }
}
