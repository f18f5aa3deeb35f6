//! History-free correlation forecasting
//!
//! Type-curve generators for wells with no production history. Two flavors
//! share one recipe: predict a peak rate and cumulative anchors from
//! regressions, fit a modified-hyperbolic cumulative through the anchors,
//! then evaluate rate and cumulative on a fixed grid with a linear ramp up
//! to the peak.
//!
//! - [`frac_correlation`]: driven by completion design (frac stage count and
//!   lateral length), oil window only, with fixed P90/P10 shrink factors.
//! - [`map_correlation`]: driven by geology (TOC, vitrinite reflectance,
//!   interval thickness) plus completion design, with the fluid window
//!   selected from thermal maturity and a caller-chosen uncertainty band.

mod frac;
mod map;

pub use frac::frac_correlation;
pub use map::map_correlation;

use crate::types::{CorrelationFluid, MapInputs, RangeWarning};

/// Vitrinite reflectance above which the target is in the gas window
/// (Dow / Jarvie maturity classification).
const RO_GAS_THRESHOLD: f64 = 1.35;

/// Fluid window from thermal maturity.
pub const fn fluid_from_ro(ro: f64) -> CorrelationFluid {
    if ro < RO_GAS_THRESHOLD {
        CorrelationFluid::Oil
    } else {
        CorrelationFluid::Gas
    }
}

/// Peak-rate GOR estimate from vitrinite reflectance, scf/bbl.
///
/// Cubic in Ro on the log scale; rises from tens of scf/bbl in the early oil
/// window to several thousand past the condensate boundary.
pub fn peak_gor_from_ro(ro: f64) -> f64 {
    let log_gor = 8.9232 * ro.powi(3) - 24.207 * ro.powi(2) + 22.773 * ro - 5.5395;
    10f64.powf(log_gor)
}

/// Calibration envelopes for the map correlation inputs, per fluid window.
/// Out-of-range inputs are flagged, never rejected.
fn map_range_warnings(inputs: &MapInputs, fluid: CorrelationFluid) -> Vec<RangeWarning> {
    let (toc, ro, thickness, fracs) = match fluid {
        CorrelationFluid::Oil => ((3.75, 5.0), (0.9, 1.3), (100.0, 220.0), (20.0, 60.0)),
        CorrelationFluid::Gas => ((3.75, 5.75), (1.4, 1.6), (150.0, 280.0), (10.0, 60.0)),
    };

    [
        RangeWarning::check("toc", inputs.toc, toc.0, toc.1),
        RangeWarning::check("ro", inputs.ro, ro.0, ro.1),
        RangeWarning::check("thickness", inputs.thickness, thickness.0, thickness.1),
        RangeWarning::check("frac_stages", inputs.frac_stages, fracs.0, fracs.1),
    ]
    .into_iter()
    .flatten()
    .collect()
}
