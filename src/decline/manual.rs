//! Parameter-driven manual decline forecasting
//!
//! No history involved: the caller supplies peak rate/time and the decline
//! parameters directly. The forecast gets a linear ramp-up from zero to the
//! peak prepended, so manual curves start at first production like the
//! history-based ones do.

use crate::models::{arange, exponential, hyperbolic, interp, DAYS_PER_YEAR, MONTH_DAYS};
use crate::types::{DeclineModel, ForecastParams, SwitchMethod};

/// Annualization base for the manual decline input. The manual surface has
/// always taken percent per 365-day year, unlike the display annualization.
const MANUAL_YEAR_DAYS: f64 = 365.0;

/// Caller-supplied decline description.
#[derive(Debug, Clone, Copy)]
pub struct ManualDeclineInputs {
    /// Peak rate.
    pub qi: f64,
    /// Time of peak rate, days.
    pub ti: f64,
    /// Hyperbolic exponent.
    pub b: f64,
    /// Initial decline, percent per year.
    pub d_pct_per_year: f64,
}

/// Build a manual forecast, returning `(t, q, params)`.
///
/// The switch value is a time (days) or a decline threshold (percent/year)
/// depending on `switch_method`; it is ignored for a pure hyperbolic.
pub fn manual_decline(
    model: DeclineModel,
    switch_method: SwitchMethod,
    switch_value: f64,
    horizon_years: f64,
    inputs: &ManualDeclineInputs,
) -> (Vec<f64>, Vec<f64>, ForecastParams) {
    let (t_fore, q_fore, params) =
        if switch_method == SwitchMethod::ByTime || model == DeclineModel::Hyperbolic {
            decline_by_time(model, switch_value, horizon_years, inputs)
        } else {
            decline_by_rate(model, switch_value, horizon_years, inputs)
        };

    // Prepend the ramp-up from zero to the peak
    let t_ramp = arange(0.0, inputs.ti, MONTH_DAYS);
    let q_ramp: Vec<f64> = t_ramp
        .iter()
        .map(|&t| interp(t, &[0.0, inputs.ti], &[0.0, inputs.qi]))
        .collect();

    let t: Vec<f64> = t_ramp.into_iter().chain(t_fore).collect();
    let q: Vec<f64> = q_ramp.into_iter().chain(q_fore).collect();
    (t, q, params)
}

fn decline_by_time(
    model: DeclineModel,
    exp_start_t: f64,
    horizon_years: f64,
    inputs: &ManualDeclineInputs,
) -> (Vec<f64>, Vec<f64>, ForecastParams) {
    let di = inputs.d_pct_per_year / 100.0 / MANUAL_YEAR_DAYS;
    let end_days = (horizon_years * DAYS_PER_YEAR).round();
    let exp_start = if model == DeclineModel::Hyperbolic {
        end_days
    } else {
        exp_start_t
    };

    if end_days < inputs.ti {
        return (
            Vec::new(),
            Vec::new(),
            ForecastParams {
                model: Some(model.tag()),
                ..ForecastParams::default()
            },
        );
    }

    // ----------------------------------------
    // Hyperbolic section
    // ----------------------------------------
    let t_fore_hyp = arange(0.0, exp_start - inputs.ti, MONTH_DAYS);
    let q_fore_hyp: Vec<f64> = t_fore_hyp
        .iter()
        .map(|&t| hyperbolic(t, inputs.qi, di, inputs.b))
        .collect();

    if model == DeclineModel::Hyperbolic {
        let t: Vec<f64> = t_fore_hyp.iter().map(|&t| t + inputs.ti).collect();
        return (
            t,
            q_fore_hyp,
            ForecastParams {
                b: Some(inputs.b),
                d_hyp: Some(di),
                d_exp: None,
                model: Some(model.tag()),
            },
        );
    }

    // ----------------------------------------
    // Exponential section
    // ----------------------------------------
    let (t_fore_exp, q_fore_exp, di_exp) = if q_fore_hyp.len() > 1 {
        let last_q = q_fore_hyp[q_fore_hyp.len() - 1];
        let last_t = t_fore_hyp[t_fore_hyp.len() - 1];
        let di_exp = super::tail_decline(
            t_fore_hyp[t_fore_hyp.len() - 2],
            last_t,
            q_fore_hyp[q_fore_hyp.len() - 2],
            last_q,
        );

        let t_fore = arange(last_t + MONTH_DAYS, end_days - inputs.ti, MONTH_DAYS);
        let q_fore: Vec<f64> = t_fore
            .iter()
            .map(|&t| exponential(t - last_t, last_q, di_exp))
            .collect();
        (t_fore, q_fore, Some(di_exp))
    } else {
        (Vec::new(), Vec::new(), None)
    };

    let t: Vec<f64> = t_fore_hyp
        .iter()
        .chain(t_fore_exp.iter())
        .map(|&t| t + inputs.ti)
        .collect();
    let q: Vec<f64> = q_fore_hyp.into_iter().chain(q_fore_exp).collect();
    (
        t,
        q,
        ForecastParams {
            b: Some(inputs.b),
            d_hyp: Some(di),
            d_exp: di_exp,
            model: Some(model.tag()),
        },
    )
}

fn decline_by_rate(
    model: DeclineModel,
    exp_start_d: f64,
    horizon_years: f64,
    inputs: &ManualDeclineInputs,
) -> (Vec<f64>, Vec<f64>, ForecastParams) {
    let threshold = if exp_start_d.is_finite() && exp_start_d > 0.0 {
        exp_start_d
    } else {
        1.0
    };

    let (t_probe, q_probe, _) =
        decline_by_time(DeclineModel::Hyperbolic, 0.0, horizon_years, inputs);
    if t_probe.len() < 2 {
        return (
            Vec::new(),
            Vec::new(),
            ForecastParams {
                model: Some(model.tag()),
                ..ForecastParams::default()
            },
        );
    }

    let mut pos = 0usize;
    for i in 1..t_probe.len() {
        let d = (q_probe[i] - q_probe[i - 1]) / (t_probe[i] - t_probe[i - 1]) / (-q_probe[i])
            * MANUAL_YEAR_DAYS;
        if d < threshold / 100.0 {
            pos = i;
            break;
        }
    }
    if pos == 0 {
        pos = 1;
    }

    decline_by_time(model, t_probe[pos], horizon_years, inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> ManualDeclineInputs {
        ManualDeclineInputs {
            qi: 400.0,
            ti: 90.0,
            b: 0.9,
            d_pct_per_year: 70.0,
        }
    }

    #[test]
    fn ramp_rises_linearly_to_peak() {
        let (t, q, _) = manual_decline(
            DeclineModel::Hyperbolic,
            SwitchMethod::ByTime,
            0.0,
            5.0,
            &inputs(),
        );

        assert!((t[0] - 0.0).abs() < 1e-12);
        assert!((q[0] - 0.0).abs() < 1e-12);

        // Inside the ramp the rate is proportional to time
        let ramp_len = (90.0 / MONTH_DAYS).ceil() as usize;
        for i in 0..ramp_len {
            let expected = 400.0 * t[i] / 90.0;
            assert!((q[i] - expected).abs() < 1e-9, "ramp point {i}");
        }

        // Peak value right after the ramp
        assert!((t[ramp_len] - 90.0).abs() < 1e-9);
        assert!((q[ramp_len] - 400.0).abs() < 1e-9);
    }

    #[test]
    fn horizon_before_peak_yields_only_ramp() {
        let mut inp = inputs();
        inp.ti = 800.0;
        let (t, q, params) = manual_decline(
            DeclineModel::ModifiedHyperbolic,
            SwitchMethod::ByTime,
            2432.0,
            1.0,
            &inp,
        );
        // end_days = 365 < ti, so only the ramp remains
        assert_eq!(t.len(), q.len());
        assert!(t.iter().all(|&v| v < 800.0));
        assert_eq!(params.b, None);
    }

    #[test]
    fn modified_hyperbolic_has_exponential_tail() {
        let (t, q, params) = manual_decline(
            DeclineModel::ModifiedHyperbolic,
            SwitchMethod::ByTime,
            400.0,
            10.0,
            &inputs(),
        );

        assert!(!t.is_empty());
        assert!(params.d_exp.is_some());
        // Declining past the peak
        let peak_idx = q
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        for w in q[peak_idx..].windows(2) {
            assert!(w[1] <= w[0] + 1e-9);
        }
    }

    #[test]
    fn by_rate_switch_matches_threshold() {
        let (t, _, params) = manual_decline(
            DeclineModel::ModifiedHyperbolic,
            SwitchMethod::ByDeclineRate,
            20.0,
            10.0,
            &inputs(),
        );
        assert!(!t.is_empty());
        assert!(params.d_exp.is_some());
        assert_eq!(params.model, Some("HM"));
    }
}
