//! Inputs and outputs of the history-free correlation forecasters

use serde::{Deserialize, Serialize};

/// Fluid window selected from thermal maturity by the map correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationFluid {
    Oil,
    Gas,
}

/// Geological zone multiplier set for the map correlation's oil window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetZone {
    Average,
    Kitchen,
    OrganicRich,
}

/// Inputs to the completion-design (frac) correlation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FracInputs {
    pub frac_stages: f64,
    /// Lateral length, meters.
    pub lateral_length: f64,
    /// Days from start to peak rate.
    pub t_peak: f64,
}

/// Inputs to the geology (map) correlation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MapInputs {
    /// Total organic carbon, percent.
    pub toc: f64,
    /// Vitrinite reflectance.
    pub ro: f64,
    /// Target-interval thickness, meters.
    pub thickness: f64,
    pub frac_stages: f64,
    pub lateral_length: f64,
    pub zone: TargetZone,
    /// Days from start to peak rate.
    pub t_peak: f64,
    /// Half-width of the P90/P10 band around the best estimate, percent.
    pub uncertainty_pct: f64,
}

/// One percentile's forecast curve plus the anchors it was fit through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationCurve {
    /// Peak rate used as the hyperbolic qi anchor.
    pub q_max: f64,
    /// Terminal cumulative (EUR).
    pub eur: f64,
    /// Cumulative at one year.
    pub np_1yr: f64,
    pub t: Vec<f64>,
    pub cum: Vec<f64>,
    pub rate: Vec<f64>,
    /// Fitted (qi, di, b).
    pub params: (f64, f64, f64),
}

/// P90/P50/P10 triplet produced by either correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationForecast {
    pub fluid: CorrelationFluid,
    pub p90: CorrelationCurve,
    pub p50: CorrelationCurve,
    pub p10: CorrelationCurve,
    /// Inputs outside the calibration envelope, flagged but not rejected.
    pub warnings: Vec<RangeWarning>,
}

/// An input outside the range the correlation was calibrated on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeWarning {
    #[serde(skip_deserializing)]
    pub parameter: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl RangeWarning {
    pub fn check(parameter: &'static str, value: f64, min: f64, max: f64) -> Option<Self> {
        if value.is_finite() && (value < min || value > max) {
            Some(Self {
                parameter,
                value,
                min,
                max,
            })
        } else {
            None
        }
    }
}
