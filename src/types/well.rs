//! Per-well production history and static attributes
//!
//! Constructed by the external data layer and treated as immutable input by
//! the forecasters, except for the normalization policy which rescales rates
//! before any fitting occurs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Forecastable fluid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fluid {
    Oil,
    Gas,
}

/// Reservoir-fluid classification tag carried by the data layer.
///
/// Drives the gas-well GOR policy: dry gas forecasts an effectively-infinite
/// GOR, wet gas a constant one, and oil-associated gas the full
/// dewpoint-transition model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluidTag {
    DryGas,
    WetGas,
    OilAssociated,
}

/// One historical production sample. Missing measurements are NaN and are
/// masked out during fitting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WellSample {
    /// Time since start of production, days.
    pub t: f64,
    /// Oil rate.
    pub qo: f64,
    /// Gas rate.
    pub qg: f64,
    /// Cumulative oil (Np).
    pub cum_oil: f64,
    /// Cumulative gas (Gp).
    pub cum_gas: f64,
    /// Gas-oil ratio.
    pub gor: f64,
    /// Water rate.
    pub qw: f64,
}

/// Ordered production history plus constant per-well attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellHistory {
    pub well_name: String,
    /// Field name, used by the per-field dewpoint lookup.
    pub field: String,
    /// Lateral length in meters. NaN when unknown.
    #[serde(default = "nan")]
    pub lateral_length: f64,
    /// Fracture-stage count. NaN when unknown.
    #[serde(default = "nan")]
    pub frac_stages: f64,
    pub fluid_tag: FluidTag,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Historical peak oil rate, used by the bubble-point correlation.
    #[serde(default = "nan")]
    pub qo_peak: f64,
    pub samples: Vec<WellSample>,
}

fn nan() -> f64 {
    f64::NAN
}

impl WellHistory {
    /// Sort by time and collapse duplicate timestamps, keeping the last
    /// sample for each. Called once at construction; the forecasters assume
    /// strictly increasing times afterwards.
    pub fn sort_and_dedup(&mut self) {
        self.samples.sort_by(|a, b| {
            a.t.partial_cmp(&b.t)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.qo.partial_cmp(&b.qo).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| a.qg.partial_cmp(&b.qg).unwrap_or(std::cmp::Ordering::Equal))
        });
        // Keep the last sample per timestamp
        let mut deduped: Vec<WellSample> = Vec::with_capacity(self.samples.len());
        for s in self.samples.drain(..) {
            match deduped.last() {
                Some(last) if last.t == s.t => {
                    if let Some(slot) = deduped.last_mut() {
                        *slot = s;
                    }
                }
                _ => deduped.push(s),
            }
        }
        self.samples = deduped;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.t).collect()
    }

    pub fn rates(&self, fluid: Fluid) -> Vec<f64> {
        match fluid {
            Fluid::Oil => self.samples.iter().map(|s| s.qo).collect(),
            Fluid::Gas => self.samples.iter().map(|s| s.qg).collect(),
        }
    }

    pub fn cumulatives(&self, fluid: Fluid) -> Vec<f64> {
        match fluid {
            Fluid::Oil => self.samples.iter().map(|s| s.cum_oil).collect(),
            Fluid::Gas => self.samples.iter().map(|s| s.cum_gas).collect(),
        }
    }

    pub fn gor_values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.gor).collect()
    }

    pub fn last_time(&self) -> Option<f64> {
        self.samples.last().map(|s| s.t)
    }

    pub fn last_rate(&self, fluid: Fluid) -> Option<f64> {
        self.samples.last().map(|s| match fluid {
            Fluid::Oil => s.qo,
            Fluid::Gas => s.qg,
        })
    }

    pub fn last_cumulative(&self, fluid: Fluid) -> Option<f64> {
        self.samples.last().map(|s| match fluid {
            Fluid::Oil => s.cum_oil,
            Fluid::Gas => s.cum_gas,
        })
    }

    /// Index of the historical peak rate for `fluid`. Production before the
    /// peak is assumed still ramping and is discarded before decline fitting.
    pub fn peak_index(&self, fluid: Fluid) -> usize {
        let mut best = 0usize;
        let mut best_rate = f64::NEG_INFINITY;
        for (i, s) in self.samples.iter().enumerate() {
            let q = match fluid {
                Fluid::Oil => s.qo,
                Fluid::Gas => s.qg,
            };
            if q.is_finite() && q > best_rate {
                best_rate = q;
                best = i;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, qo: f64) -> WellSample {
        WellSample {
            t,
            qo,
            qg: qo * 1.2,
            cum_oil: 0.0,
            cum_gas: 0.0,
            gor: 1200.0,
            qw: 0.0,
        }
    }

    fn history(samples: Vec<WellSample>) -> WellHistory {
        WellHistory {
            well_name: "W-1".into(),
            field: "LA CALERA".into(),
            lateral_length: 2500.0,
            frac_stages: 40.0,
            fluid_tag: FluidTag::OilAssociated,
            start_date: None,
            qo_peak: 100.0,
            samples,
        }
    }

    #[test]
    fn dedup_keeps_last_sample_per_timestamp() {
        let mut h = history(vec![sample(0.0, 10.0), sample(30.0, 20.0), sample(30.0, 25.0)]);
        h.sort_and_dedup();
        assert_eq!(h.len(), 2);
        assert!((h.samples[1].qo - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sort_orders_by_time() {
        let mut h = history(vec![sample(60.0, 5.0), sample(0.0, 10.0), sample(30.0, 20.0)]);
        h.sort_and_dedup();
        let times = h.times();
        assert_eq!(times, vec![0.0, 30.0, 60.0]);
    }

    #[test]
    fn peak_index_skips_nan_rates() {
        let mut h = history(vec![sample(0.0, 10.0), sample(30.0, f64::NAN), sample(60.0, 50.0)]);
        h.sort_and_dedup();
        assert_eq!(h.peak_index(Fluid::Oil), 2);
    }
}
