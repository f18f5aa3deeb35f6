//! Bounded nonlinear least squares
//!
//! Levenberg–Marquardt with a numerically estimated Jacobian and parameter
//! clamping to box bounds. The decline and GOR fits have at most four
//! parameters, so the normal equations are solved directly with Gaussian
//! elimination.
//!
//! Inputs are expected pre-normalized (divided by their own reference scale)
//! to keep the optimization well conditioned; invalid (NaN) samples are
//! masked out before fitting.

/// Options for a single fit.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Function-evaluation cap. The optimizer stops and returns its best
    /// parameters when the cap is reached.
    pub max_evals: usize,
    /// Initial parameter guess. When absent, each parameter starts at 1.0
    /// clamped into its bounds (midpoint when both bounds are finite and
    /// 1.0 is infeasible).
    pub seed: Option<Vec<f64>>,
    /// Per-point sigmas: residuals are divided by these, so a smaller sigma
    /// weighs its point more heavily.
    pub sigma: Option<Vec<f64>>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_evals: 5000,
            seed: None,
            sigma: None,
        }
    }
}

impl FitOptions {
    pub fn with_max_evals(max_evals: usize) -> Self {
        Self {
            max_evals,
            ..Self::default()
        }
    }
}

/// Fit `model(x, params)` to `(xs, ys)` under box bounds.
///
/// Returns `None` only when no valid (finite) sample pairs remain after
/// masking; any other difficulty resolves to the best parameters found within
/// the evaluation cap. The result always satisfies the bounds.
pub fn fit_model<F>(
    model: F,
    xs: &[f64],
    ys: &[f64],
    lower: &[f64],
    upper: &[f64],
    opts: &FitOptions,
) -> Option<Vec<f64>>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let n = lower.len();
    debug_assert_eq!(n, upper.len());

    // Mask invalid samples
    let mut data: Vec<(f64, f64, f64)> = Vec::with_capacity(xs.len());
    for (i, (&x, &y)) in xs.iter().zip(ys.iter()).enumerate() {
        if x.is_finite() && y.is_finite() {
            let w = opts
                .sigma
                .as_ref()
                .and_then(|s| s.get(i))
                .map_or(1.0, |&s| if s > 0.0 { 1.0 / s } else { 1.0 });
            data.push((x, y, w));
        }
    }
    if data.is_empty() {
        return None;
    }

    let mut p = match &opts.seed {
        Some(seed) => clamp_params(seed.clone(), lower, upper),
        None => default_seed(lower, upper),
    };

    let residuals = |p: &[f64]| -> Vec<f64> {
        data.iter()
            .map(|&(x, y, w)| {
                let r = (model(x, p) - y) * w;
                if r.is_finite() { r } else { 1e150 }
            })
            .collect()
    };

    let mut evals = 0usize;
    let mut r = residuals(&p);
    evals += 1;
    let mut cost = sum_sq(&r);
    let mut lambda = 1e-3;

    while evals < opts.max_evals {
        // Numerical Jacobian (forward differences, flipped at the bounds)
        let mut jac = vec![vec![0.0; n]; data.len()];
        for j in 0..n {
            let h = 1e-7 * p[j].abs().max(1e-7);
            let mut pj = p.clone();
            let sign = if p[j] + h > upper[j] { -1.0 } else { 1.0 };
            pj[j] += sign * h;
            let rj = residuals(&pj);
            evals += 1;
            for (i, row) in jac.iter_mut().enumerate() {
                row[j] = (rj[i] - r[i]) / (sign * h);
            }
        }

        // Normal equations: (JᵀJ + λ·diag(JᵀJ)) δ = −Jᵀr
        let mut jtj = vec![vec![0.0; n]; n];
        let mut jtr = vec![0.0; n];
        for (i, row) in jac.iter().enumerate() {
            for a in 0..n {
                jtr[a] += row[a] * r[i];
                for b in a..n {
                    jtj[a][b] += row[a] * row[b];
                }
            }
        }
        for a in 0..n {
            for b in 0..a {
                jtj[a][b] = jtj[b][a];
            }
        }

        let mut improved = false;
        while evals < opts.max_evals {
            let mut a_mat = jtj.clone();
            for (j, row) in a_mat.iter_mut().enumerate() {
                row[j] += lambda * jtj[j][j].max(1e-12);
            }
            let rhs: Vec<f64> = jtr.iter().map(|v| -v).collect();

            let Some(delta) = solve_linear(a_mat, rhs) else {
                lambda *= 10.0;
                if lambda > 1e12 {
                    return Some(p);
                }
                continue;
            };

            let trial = clamp_params(
                p.iter().zip(&delta).map(|(a, d)| a + d).collect(),
                lower,
                upper,
            );
            let r_trial = residuals(&trial);
            evals += 1;
            let cost_trial = sum_sq(&r_trial);

            if cost_trial < cost {
                let step: f64 = trial
                    .iter()
                    .zip(&p)
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0, f64::max);
                let converged = cost - cost_trial < 1e-12 * cost.max(1e-12) || step < 1e-12;
                p = trial;
                r = r_trial;
                cost = cost_trial;
                lambda = (lambda / 10.0).max(1e-12);
                improved = true;
                if converged {
                    return Some(p);
                }
                break;
            }

            lambda *= 10.0;
            if lambda > 1e12 {
                return Some(p);
            }
        }

        if !improved || cost < 1e-30 {
            break;
        }
    }

    Some(p)
}

fn default_seed(lower: &[f64], upper: &[f64]) -> Vec<f64> {
    lower
        .iter()
        .zip(upper.iter())
        .map(|(&lo, &hi)| {
            if (lo..=hi).contains(&1.0) {
                1.0
            } else if lo.is_finite() && hi.is_finite() {
                0.5 * (lo + hi)
            } else if lo.is_finite() {
                lo
            } else {
                hi
            }
        })
        .collect()
}

fn clamp_params(mut p: Vec<f64>, lower: &[f64], upper: &[f64]) -> Vec<f64> {
    for (j, v) in p.iter_mut().enumerate() {
        *v = v.clamp(lower[j], upper[j]);
        if !v.is_finite() {
            *v = lower[j].max(0.0);
        }
    }
    p
}

fn sum_sq(r: &[f64]) -> f64 {
    r.iter().map(|v| v * v).sum()
}

/// Gaussian elimination with partial pivoting. Returns `None` on a singular
/// system (the caller bumps λ and retries).
fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for col in (row + 1)..n {
            acc -= a[row][col] * x[col];
        }
        x[row] = acc / a[row][row];
        if !x[row].is_finite() {
            return None;
        }
    }
    Some(x)
}
