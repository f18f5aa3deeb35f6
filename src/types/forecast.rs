//! Forecast state, decline parameters, and the forecast configuration surface
//!
//! `WellForecastState` is the explicit replacement for the loosely-keyed
//! per-well mapping the pipeline stages used to mutate in place: one instance
//! per well, exclusively owned by the forecast call that created it, with
//! typed optional fields for everything a stage may or may not have produced.

use serde::{Deserialize, Serialize};

use crate::models::DAYS_PER_YEAR;
use crate::types::well::{Fluid, WellHistory};

/// Fitted decline parameters.
///
/// `b = 1` is exponential-equivalent; `b ∈ (0, 1)` hyperbolic. Upper bound on
/// `b` is 1.2 for history fits and up to 1.3–1.5 for the correlation fits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeclineParameters {
    /// Initial (theoretical) rate, > 0.
    pub qi: f64,
    /// Decline rate, 1/day, ≥ 0.
    pub di: f64,
    /// Hyperbolic exponent.
    pub b: f64,
}

/// Decline model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclineModel {
    /// Pure hyperbolic over the whole horizon ("HYP").
    Hyperbolic,
    /// Hyperbolic with an exponential continuation past a switch point ("HM").
    ModifiedHyperbolic,
}

impl DeclineModel {
    /// Serialized model tag.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Hyperbolic => "HYP",
            Self::ModifiedHyperbolic => "HM",
        }
    }
}

/// How the hyperbolic-to-exponential switch point is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchMethod {
    /// Switch at a fixed time-since-start (days); the switch value is the time.
    ByTime,
    /// Switch where the annualized instantaneous decline of a full-horizon
    /// hyperbolic probe first drops below the switch value (percent/year).
    ByDeclineRate,
}

/// Manual GOR breakpoints (all cumulatives in the primary fluid's units).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GorBreakpoints {
    pub gor_i: f64,
    /// Cumulative at bubble/dew point.
    pub np_pb: f64,
    pub gor_max: f64,
    pub np_gor_max: f64,
    pub gor_f: f64,
    pub np_gor_f: f64,
    /// Curvature parameter of the S-curve segment.
    pub a: f64,
}

/// GOR forecasting policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum GorMethod {
    /// Regression-based: dewpoint/bubble-point thresholds estimated from
    /// history and attributes.
    Auto,
    /// Explicit caller-supplied breakpoints.
    Manual(GorBreakpoints),
}

/// Historical-curve normalization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    FracStages,
    LateralLength,
}

/// Normalization applied to a well's forecast context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationState {
    pub enabled: bool,
    pub method: Option<NormalizationMethod>,
    pub value: Option<f64>,
}

impl Default for NormalizationState {
    fn default() -> Self {
        Self {
            enabled: false,
            method: None,
            value: None,
        }
    }
}

/// Caller-facing configuration for one forecast invocation (values, not UI
/// widgets).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Which fluid the decline model is fit to; the companion fluid is
    /// derived through the GOR curve.
    pub primary_fluid: Fluid,
    pub model: DeclineModel,
    pub switch_method: SwitchMethod,
    /// Switch time (days) or decline threshold (%/yr) depending on method.
    pub switch_value: f64,
    /// Forecast horizon in years.
    pub horizon_years: f64,
    /// Economic rate limit; forecast rates below it are zeroed.
    pub rate_limit: f64,
    /// Rescale the forecast through the last observed rate.
    pub fix_last_rate: bool,
    pub gor: GorMethod,
    /// Optional history normalization applied before fitting.
    #[serde(default)]
    pub normalization: Option<(NormalizationMethod, f64)>,
}

/// Fitted-parameter summary attached to a forecast, serialized as fixed-point
/// strings ("None" when absent).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastParams {
    pub b: Option<f64>,
    /// Hyperbolic decline, 1/day.
    pub d_hyp: Option<f64>,
    /// Exponential continuation decline, 1/day.
    pub d_exp: Option<f64>,
    /// Model tag ("HYP"/"HM").
    #[serde(skip_deserializing)]
    pub model: Option<&'static str>,
}

impl ForecastParams {
    /// `b` to 4 decimals, or the literal "None".
    pub fn b_string(&self) -> String {
        match self.b {
            Some(b) if b != 0.0 => format!("{b:.4}"),
            _ => "None".to_string(),
        }
    }

    /// Annualized percentage form of a decline rate (×365.25×100) to 4
    /// decimals, or "None".
    fn decline_string(d: Option<f64>) -> String {
        match d {
            Some(d) if d != 0.0 => format!("{:.4}", d * DAYS_PER_YEAR * 100.0),
            _ => "None".to_string(),
        }
    }

    pub fn d_hyp_string(&self) -> String {
        Self::decline_string(self.d_hyp)
    }

    pub fn d_exp_string(&self) -> String {
        Self::decline_string(self.d_exp)
    }
}

/// GOR fit summary (initial level and curvature or max, per policy).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GorParams {
    pub gor_i: Option<f64>,
    pub a: Option<f64>,
    pub gor_max: Option<f64>,
}

/// Per-well, per-invocation forecast state.
///
/// Created fresh by each forecast call; re-invocation with different
/// configuration replaces it entirely. The `gor_history_len` field records
/// how many leading points of `gor_forecast` cover the historical samples, so
/// companion-fluid derivation slices by a named offset instead of an inferred
/// one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellForecastState {
    pub history: WellHistory,
    pub normalization: NormalizationState,

    pub t_forecast: Vec<f64>,
    pub qo_forecast: Vec<f64>,
    pub qg_forecast: Vec<f64>,
    pub cum_oil_forecast: Vec<f64>,
    pub cum_gas_forecast: Vec<f64>,
    /// GOR over history followed by forecast (see `gor_history_len`).
    pub gor_forecast: Vec<f64>,
    /// Leading points of `gor_forecast` that correspond to history.
    pub gor_history_len: usize,

    pub params: ForecastParams,
    pub gor_params: GorParams,
}

impl WellForecastState {
    pub fn new(history: WellHistory) -> Self {
        Self {
            history,
            normalization: NormalizationState::default(),
            t_forecast: Vec::new(),
            qo_forecast: Vec::new(),
            qg_forecast: Vec::new(),
            cum_oil_forecast: Vec::new(),
            cum_gas_forecast: Vec::new(),
            gor_forecast: Vec::new(),
            gor_history_len: 0,
            params: ForecastParams::default(),
            gor_params: GorParams::default(),
        }
    }

    /// Number of usable history points.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Number of forecast points.
    pub fn forecast_len(&self) -> usize {
        self.t_forecast.len()
    }

    /// Forecast-aligned slice of the GOR curve.
    pub fn gor_forecast_tail(&self) -> &[f64] {
        if self.gor_history_len <= self.gor_forecast.len() {
            &self.gor_forecast[self.gor_history_len..]
        } else {
            &[]
        }
    }

    pub fn rates(&self, fluid: Fluid) -> &[f64] {
        match fluid {
            Fluid::Oil => &self.qo_forecast,
            Fluid::Gas => &self.qg_forecast,
        }
    }

    pub fn cumulatives(&self, fluid: Fluid) -> &[f64] {
        match fluid {
            Fluid::Oil => &self.cum_oil_forecast,
            Fluid::Gas => &self.cum_gas_forecast,
        }
    }

    /// Reset forecast arrays and parameters to the empty sentinel state used
    /// for insufficient-data wells.
    pub fn clear_forecast(&mut self, model: DeclineModel) {
        self.t_forecast.clear();
        self.qo_forecast.clear();
        self.qg_forecast.clear();
        self.cum_oil_forecast.clear();
        self.cum_gas_forecast.clear();
        self.gor_forecast.clear();
        self.gor_history_len = 0;
        self.params = ForecastParams {
            model: Some(model.tag()),
            ..ForecastParams::default()
        };
        self.gor_params = GorParams::default();
    }
}
