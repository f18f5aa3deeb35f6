//! Decline-curve and correlation forecasting for unconventional wells
//!
//! Fits decline models to historical rate/cumulative series, forecasts the
//! gas-oil ratio, derives the companion fluid and applies post-processing
//! policies (normalization, rate offset, horizon/economic-limit trim). Wells
//! without history get P90/P50/P10 type curves from two empirical
//! correlations instead.
//!
//! ## Architecture
//!
//! - **Decline**: time-paced oil and volume-paced gas forecasters plus a
//!   parameter-driven manual path, all modified-hyperbolic
//! - **GOR**: fluid-tag-driven gas models, bubble-point oil model, manual
//!   breakpoint curves
//! - **Post-processing**: cumulative integration, last-rate offset, trim,
//!   completion normalization, storage compression
//! - **Correlation**: completion-design and map-attribute type-curve
//!   generators for wells with no history
//!
//! The engine is stateless and synchronous. [`run_forecast`] drives the whole
//! pipeline for one well; [`forecast_wells`] fans a batch across a rayon
//! thread pool.

pub mod config;
pub mod correlation;
pub mod decline;
pub mod fitting;
pub mod gor;
pub mod models;
pub mod post;
pub mod types;

pub use config::{ConfigError, EngineConfig};
pub use correlation::{fluid_from_ro, frac_correlation, map_correlation};
pub use decline::{manual_decline, ManualDeclineInputs};
pub use post::SerializedForecast;
pub use types::{
    CorrelationFluid, CorrelationForecast, DeclineModel, Fluid, ForecastConfig, FracInputs,
    GorMethod, MapInputs, SwitchMethod, WellForecastState, WellHistory,
};

use rayon::prelude::*;
use tracing::{debug, info};

/// Run the full forecasting pipeline for one well.
///
/// Stage order depends on the primary fluid. Oil forecasts are time-paced, so
/// the cumulative is integrated from rates before the GOR stage needs it; gas
/// forecasts are volume-paced and carry their cumulative out of the decline
/// stage directly.
pub fn run_forecast(
    history: WellHistory,
    cfg: &ForecastConfig,
    engine: &EngineConfig,
) -> WellForecastState {
    let mut history = history;
    history.sort_and_dedup();
    let mut state = WellForecastState::new(history);

    if let Some((method, value)) = cfg.normalization {
        post::normalize_history(&mut state, method, value, engine);
    }

    match cfg.primary_fluid {
        Fluid::Oil => {
            decline::oil_decline(&mut state, cfg, engine);
            if cfg.fix_last_rate {
                post::apply_rate_offset(&mut state, Fluid::Oil);
            }
            post::trim_curve(&mut state, cfg.horizon_years, cfg.rate_limit, Fluid::Oil);
            post::integrate_cumulative(&mut state, Fluid::Oil);

            match &cfg.gor {
                GorMethod::Auto => gor::gor_forecast(&mut state, Fluid::Oil, engine),
                GorMethod::Manual(bp) => gor::manual::gor_manual_forecast(&mut state, Fluid::Oil, bp),
            }
            gor::derive_gas_rate(&mut state);
            post::integrate_cumulative(&mut state, Fluid::Gas);
        }
        Fluid::Gas => {
            decline::gas_decline(&mut state, cfg, engine);
            if cfg.fix_last_rate {
                post::apply_rate_offset(&mut state, Fluid::Gas);
            }
            post::trim_curve(&mut state, cfg.horizon_years, cfg.rate_limit, Fluid::Gas);

            match &cfg.gor {
                GorMethod::Auto => gor::gor_forecast(&mut state, Fluid::Gas, engine),
                GorMethod::Manual(bp) => gor::manual::gor_manual_forecast(&mut state, Fluid::Gas, bp),
            }
            gor::derive_oil_rate(&mut state);
            post::integrate_cumulative(&mut state, Fluid::Oil);
        }
    }

    debug!(
        well = %state.history.well_name,
        points = state.forecast_len(),
        model = state.params.model.unwrap_or("None"),
        "forecast complete"
    );
    state
}

/// Forecast a batch of wells in parallel.
///
/// Each well runs the full pipeline independently; a well with unusable
/// history comes back with empty forecast arrays rather than failing the
/// batch.
pub fn forecast_wells(
    histories: Vec<WellHistory>,
    cfg: &ForecastConfig,
    engine: &EngineConfig,
) -> Vec<WellForecastState> {
    info!(wells = histories.len(), "starting batch forecast");
    histories
        .into_par_iter()
        .map(|h| run_forecast(h, cfg, engine))
        .collect()
}
