//! Curve fitting and root finding
//!
//! Wraps the two numerical workhorses of the engine:
//! - Bounded nonlinear least squares ([`fit_model`], [`fit_or_default`]) used
//!   to fit decline and GOR models to normalized history
//! - A derivative-free secant root finder ([`solve_secant`]) used by the gas
//!   forecaster's cumulative stepping
//!
//! Both are synchronous, bounded-iteration routines: they may be slow on a
//! pathological well but never loop indefinitely.

mod least_squares;
mod root_finding;

pub use least_squares::{fit_model, FitOptions};
pub use root_finding::solve_secant;

use tracing::warn;

/// Outcome of a curve fit that carries a "never fail the forecast" policy.
///
/// When the data cannot support a fit, callers substitute literature-default
/// parameters instead of propagating an error. The `Fallback` variant keeps
/// that substitution observable.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    /// Parameters obtained from the optimizer.
    Fitted(Vec<f64>),
    /// Default parameters substituted after a failed or degenerate fit.
    Fallback {
        params: Vec<f64>,
        reason: &'static str,
    },
}

impl FitOutcome {
    /// The parameter vector, regardless of how it was obtained.
    pub fn params(&self) -> &[f64] {
        match self {
            Self::Fitted(p) | Self::Fallback { params: p, .. } => p,
        }
    }

    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Fit `model` to the data, substituting `defaults` when the fit is
/// impossible (no valid samples) or produces non-finite parameters.
pub fn fit_or_default<F>(
    model: F,
    xs: &[f64],
    ys: &[f64],
    lower: &[f64],
    upper: &[f64],
    opts: &FitOptions,
    defaults: &[f64],
    reason: &'static str,
) -> FitOutcome
where
    F: Fn(f64, &[f64]) -> f64,
{
    match fit_model(model, xs, ys, lower, upper, opts) {
        Some(params) if params.iter().all(|p| p.is_finite()) => FitOutcome::Fitted(params),
        _ => {
            warn!(reason, "curve fit fell back to default parameters");
            FitOutcome::Fallback {
                params: defaults.to_vec(),
                reason,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_used_when_no_valid_samples() {
        let xs = [f64::NAN, f64::NAN];
        let ys = [f64::NAN, f64::NAN];
        let outcome = fit_or_default(
            |x, p| p[0] * x,
            &xs,
            &ys,
            &[0.0],
            &[f64::INFINITY],
            &FitOptions::default(),
            &[2.5],
            "no valid samples",
        );
        assert!(outcome.is_fallback());
        assert_eq!(outcome.params(), &[2.5]);
    }

    #[test]
    fn fitted_when_data_is_clean() {
        let xs: Vec<f64> = (0..20).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x).collect();
        let outcome = fit_or_default(
            |x, p| p[0] * x,
            &xs,
            &ys,
            &[0.0],
            &[f64::INFINITY],
            &FitOptions::default(),
            &[1.0],
            "unused",
        );
        assert!(!outcome.is_fallback());
        assert!((outcome.params()[0] - 3.0).abs() < 1e-6);
    }
}
