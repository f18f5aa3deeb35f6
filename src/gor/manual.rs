//! Manual GOR forecasting from caller-supplied breakpoints
//!
//! The S-curve shape is generated over the full time span, then remapped so
//! its endpoints land exactly on the requested breakpoints: initial GOR at
//! the bubble-point cumulative, maximum GOR at its cumulative, and a linear
//! taper down to the final GOR. Inconsistent breakpoints degrade to a flat
//! curve at the initial GOR rather than failing.

use crate::models::{gor_shape, interp};
use crate::types::{Fluid, GorBreakpoints, GorParams, WellForecastState};

pub fn gor_manual_forecast(state: &mut WellForecastState, fluid: Fluid, bp: &GorBreakpoints) {
    let cum_hist = state.history.cumulatives(fluid);
    let hist_len = state.history.len();

    if state.t_forecast.is_empty() {
        state.gor_forecast = vec![bp.gor_i; hist_len];
        state.gor_history_len = hist_len;
        state.gor_params = GorParams::default();
        return;
    }

    // Manual decline wells carry no history; everything else gets the curve
    // over history plus forecast
    let (t_aux, cum_aux, history_points) = if state.history.is_empty() {
        (
            state.t_forecast.clone(),
            state.cumulatives(fluid).to_vec(),
            0,
        )
    } else {
        let t: Vec<f64> = state
            .history
            .times()
            .into_iter()
            .chain(state.t_forecast.iter().copied())
            .collect();
        let cum: Vec<f64> = cum_hist
            .iter()
            .chain(state.cumulatives(fluid).iter())
            .copied()
            .collect();
        (t, cum, hist_len)
    };

    let mut gor_aux = vec![bp.gor_i; cum_aux.len()];
    let last_cum = cum_aux[cum_aux.len() - 1];

    // Breakpoints must be ordered and reachable
    if bp.np_gor_max < bp.np_pb || bp.gor_max < bp.gor_i || last_cum < bp.np_pb {
        state.gor_forecast = gor_aux;
        state.gor_history_len = history_points;
        state.gor_params = GorParams::default();
        return;
    }

    // S-curve over the raw time grid, then rescaled onto the breakpoint box
    let shape: Vec<f64> = t_aux
        .iter()
        .map(|&t| gor_shape(t, bp.a, bp.gor_i, bp.gor_max))
        .collect();
    let (shape_min, shape_max) = min_max(&shape);
    let (cum_min, cum_max) = min_max(&cum_aux);

    let gor1: Vec<f64> = shape
        .iter()
        .map(|&g| scale_to_range(g, shape_min, shape_max, bp.gor_i, bp.gor_max))
        .collect();
    let cum1: Vec<f64> = cum_aux
        .iter()
        .map(|&c| scale_to_range(c, cum_min, cum_max, bp.np_pb, bp.np_gor_max))
        .collect();

    // Rising limb: bubble point to GOR max
    let mut max_value = bp.gor_max;
    for (g, &c) in gor_aux.iter_mut().zip(cum_aux.iter()) {
        if c > bp.np_pb && c <= bp.np_gor_max {
            *g = interp(c, &cum1, &gor1);
            max_value = *g;
        }
    }

    // Linear taper: GOR max down to the final GOR, then flat
    for (g, &c) in gor_aux.iter_mut().zip(cum_aux.iter()) {
        if c > bp.np_gor_max && c < bp.np_gor_f {
            *g = interp(
                c,
                &[bp.np_gor_max, bp.np_gor_f],
                &[max_value, bp.gor_f],
            );
        } else if c >= bp.np_gor_f {
            *g = bp.gor_f;
        }
    }

    state.gor_forecast = gor_aux;
    state.gor_history_len = history_points;
    state.gor_params = GorParams {
        gor_i: Some(bp.gor_i),
        a: Some(bp.a),
        gor_max: Some(bp.gor_max),
    };
}

fn scale_to_range(value: f64, minv: f64, maxv: f64, target_min: f64, target_max: f64) -> f64 {
    let span = maxv - minv;
    if span.abs() < f64::EPSILON {
        return target_min;
    }
    (value - minv) / span * (target_max - target_min) + target_min
}

fn min_max(data: &[f64]) -> (f64, f64) {
    data.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}
