//! Single-variable root finding for the gas cumulative stepper
//!
//! The gas forecaster paces its forecast by volume: each step solves for the
//! next cumulative satisfying the model's rate-vs-cumulative relationship.
//! A derivative-free secant iteration is enough — the step equation is close
//! to linear near the solution, and a loose tolerance (0.1 on the cumulative)
//! matches the 2-decimal rounding applied downstream.

/// Find a root of `f` starting from `x0` using the secant method.
///
/// Never panics and never loops unbounded: after `max_iter` iterations (or on
/// a degenerate/flat secant) the best iterate so far is returned. Callers
/// treat the result as best-effort.
pub fn solve_secant<F>(f: F, x0: f64, tol: f64, max_iter: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    // Second starting point: small relative perturbation of x0
    let eps = 1e-4;
    let mut p0 = x0;
    let mut p1 = x0 * (1.0 + eps);
    p1 += if p1 >= 0.0 { eps } else { -eps };

    let mut f0 = f(p0);
    if !f0.is_finite() {
        return x0;
    }

    for _ in 0..max_iter {
        let f1 = f(p1);
        if !f1.is_finite() {
            return p0;
        }
        if (f1 - f0).abs() < 1e-300 {
            // Flat secant: no further progress possible
            return 0.5 * (p0 + p1);
        }

        let p2 = p1 - f1 * (p1 - p0) / (f1 - f0);
        if !p2.is_finite() {
            return p1;
        }
        if (p2 - p1).abs() < tol {
            return p2;
        }

        p0 = p1;
        f0 = f1;
        p1 = p2;
    }

    p1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_linear_root() {
        // f(x) = 30.44 − (x − 100)/50  →  root at 100 + 30.44·50
        let root = solve_secant(|x| 30.44 - (x - 100.0) / 50.0, 100.0, 0.1, 100);
        assert!((root - (100.0 + 30.44 * 50.0)).abs() < 0.1);
    }

    #[test]
    fn finds_nonlinear_root() {
        let root = solve_secant(|x| x * x - 2.0, 1.0, 1e-8, 100);
        assert!((root - std::f64::consts::SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn flat_function_returns_midpoint_not_panic() {
        let root = solve_secant(|_| 30.44, 500.0, 0.1, 100);
        assert!(root.is_finite());
    }

    #[test]
    fn iteration_cap_is_respected() {
        // Oscillating function with no nearby root still terminates
        let root = solve_secant(|x| (x * 1000.0).sin() + 2.0, 0.0, 1e-12, 100);
        assert!(root.is_finite());
    }
}
