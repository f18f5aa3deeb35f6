//! Forecast serialization
//!
//! Flat, JSON-friendly view of a finished forecast. Decline parameters are
//! reported as fixed-point strings with the literal `"None"` for absent
//! values, and the decline rates are annualized percentages.

use serde::{Deserialize, Serialize};

use crate::post::compression_mask;
use crate::types::{NormalizationState, WellForecastState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedForecast {
    pub well_name: String,
    pub field: String,

    pub t_forecast: Vec<f64>,
    pub qo_forecast: Vec<f64>,
    pub qg_forecast: Vec<f64>,
    pub cum_oil_forecast: Vec<f64>,
    pub cum_gas_forecast: Vec<f64>,
    pub gor_forecast: Vec<f64>,

    /// Hyperbolic exponent, 4 decimals or "None".
    pub b: String,
    /// Hyperbolic decline, percent per year, 4 decimals or "None".
    pub d_hyp: String,
    /// Exponential continuation decline, percent per year, 4 decimals or
    /// "None".
    pub d_exp: String,
    pub dca_model: Option<String>,

    pub gor_i: Option<f64>,
    pub gor_a: Option<f64>,
    pub gor_max: Option<f64>,

    pub normalization: NormalizationState,
    pub history_len: usize,
    pub forecast_len: usize,
}

impl SerializedForecast {
    /// Full-resolution serialization of a forecast state.
    pub fn from_state(state: &WellForecastState) -> Self {
        Self {
            well_name: state.history.well_name.clone(),
            field: state.history.field.clone(),
            t_forecast: state.t_forecast.clone(),
            qo_forecast: state.qo_forecast.clone(),
            qg_forecast: state.qg_forecast.clone(),
            cum_oil_forecast: state.cum_oil_forecast.clone(),
            cum_gas_forecast: state.cum_gas_forecast.clone(),
            gor_forecast: state.gor_forecast.clone(),
            b: state.params.b_string(),
            d_hyp: state.params.d_hyp_string(),
            d_exp: state.params.d_exp_string(),
            dca_model: state.params.model.map(str::to_string),
            gor_i: state.gor_params.gor_i,
            gor_a: state.gor_params.a,
            gor_max: state.gor_params.gor_max,
            normalization: state.normalization,
            history_len: state.history_len(),
            forecast_len: state.forecast_len(),
        }
    }

    /// Compressed serialization: forecast arrays reduced to the sparse
    /// reporting mask (yearly cadence plus landmark points).
    pub fn from_state_compressed(state: &WellForecastState) -> Self {
        let mask = compression_mask(state);
        let pick = |v: &[f64]| -> Vec<f64> {
            v.iter()
                .zip(mask.iter())
                .filter_map(|(&x, &k)| k.then_some(x))
                .collect()
        };

        let mut out = Self::from_state(state);
        out.t_forecast = pick(&state.t_forecast);
        out.qo_forecast = pick(&state.qo_forecast);
        out.qg_forecast = pick(&state.qg_forecast);
        out.cum_oil_forecast = pick(&state.cum_oil_forecast);
        out.cum_gas_forecast = pick(&state.cum_gas_forecast);
        out.forecast_len = out.t_forecast.len();
        out
    }
}
