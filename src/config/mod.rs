//! Engine Configuration Module
//!
//! Tunable numerics for the forecasting engine loaded from TOML, replacing
//! hardcoded thresholds with operator-tunable values. The config is built
//! once at startup and passed by reference into the forecasters — nothing in
//! the engine reads global state.
//!
//! ## Loading Order
//!
//! 1. `PRODCAST_CONFIG` environment variable (path to TOML file)
//! 2. `engine_config.toml` in the current working directory
//! 3. Built-in defaults (matching original hardcoded values)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Configuration load/validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error ({0}): {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("config parse error ({0}): {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the forecasting engine.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$PRODCAST_CONFIG` env var
/// 2. `./engine_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fit caps and bounds
    #[serde(default)]
    pub fitting: FittingConfig,

    /// GOR model constants and per-field dewpoint table
    #[serde(default)]
    pub gor: GorConfig,

    /// Normalization plausibility thresholds
    #[serde(default)]
    pub normalization: NormalizationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fitting: FittingConfig::default(),
            gor: GorConfig::default(),
            normalization: NormalizationConfig::default(),
        }
    }
}

/// Decline/GOR fit tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FittingConfig {
    /// Function-evaluation cap for history decline fits.
    pub max_evals: usize,
    /// Function-evaluation cap for the correlation anchor fits.
    pub correlation_max_evals: usize,
    /// Upper bound on the hyperbolic exponent for history fits.
    pub b_max: f64,
    /// Secant tolerance on cumulative for the gas volume stepper.
    pub secant_tol: f64,
    /// Secant iteration cap.
    pub secant_max_iter: usize,
}

impl Default for FittingConfig {
    fn default() -> Self {
        Self {
            max_evals: 5000,
            correlation_max_evals: 300,
            b_max: 1.2,
            secant_tol: 0.1,
            secant_max_iter: 100,
        }
    }
}

/// GOR forecasting constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GorConfig {
    /// GOR reported for dry-gas wells.
    pub dry_gas_gor: f64,
    /// Outlier trim width (standard deviations) for the initial-GOR estimate.
    pub outlier_sigma: f64,
    /// Hard cap applied to the forecast GOR curve.
    pub gor_cap: f64,
    /// Curvature used when the bubble-point S-curve fit fails.
    pub fallback_curvature: f64,
    /// Upper bound on the S-curve curvature parameter.
    pub curvature_max: f64,
    /// Coefficients used when the dewpoint reciprocal-quadratic fit fails
    /// (a, b, c).
    pub fallback_recip_quad: (f64, f64, f64),
    /// Gp/EUR dewpoint-transition threshold per field.
    pub dewpoint_by_field: HashMap<String, f64>,
    /// Threshold for fields absent from the table.
    pub dewpoint_default: f64,
}

impl Default for GorConfig {
    fn default() -> Self {
        let mut dewpoint_by_field = HashMap::new();
        dewpoint_by_field.insert("RINCON LA CENIZA".to_string(), 0.074_747_547);
        dewpoint_by_field.insert("LA CALERA".to_string(), 0.095_730_339);
        dewpoint_by_field.insert("LA RIBERA BLOQUE I".to_string(), 0.069_230_787);
        dewpoint_by_field.insert("FORTIN DE PIEDRA".to_string(), 0.01);
        dewpoint_by_field.insert("AGUADA DE LA ARENA".to_string(), 0.185_075_339);
        Self {
            dry_gas_gor: 1.0e6,
            outlier_sigma: 1.25,
            gor_cap: 15_000.0,
            fallback_curvature: 0.002,
            curvature_max: 0.003,
            fallback_recip_quad: (2.46e-5, -4.63e-5, 3.11e-4),
            dewpoint_by_field,
            dewpoint_default: 0.18,
        }
    }
}

impl GorConfig {
    /// Gp/EUR threshold for a field, falling back to the default for fields
    /// not in the table.
    pub fn dewpoint_threshold(&self, field: &str) -> f64 {
        self.dewpoint_by_field
            .get(field)
            .copied()
            .unwrap_or(self.dewpoint_default)
    }
}

/// Plausibility thresholds deciding whether per-well attributes are usable
/// for normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Minimum believable fracture-stage count.
    pub min_frac_stages: f64,
    /// Minimum believable lateral length, meters.
    pub min_lateral_length: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            min_frac_stages: 10.0,
            min_lateral_length: 100.0,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl EngineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$PRODCAST_CONFIG` environment variable
    /// 2. `./engine_config.toml` in the current working directory
    /// 3. Built-in defaults (original hardcoded values)
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("PRODCAST_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded engine config from PRODCAST_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from PRODCAST_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "PRODCAST_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("engine_config.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded engine config from ./engine_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./engine_config.toml, using defaults");
                }
            }
        }

        info!("No engine_config.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make the forecasters misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.fitting.max_evals == 0 {
            errors.push("fitting.max_evals must be > 0".to_string());
        }
        if self.fitting.b_max <= 0.0 {
            errors.push("fitting.b_max must be > 0".to_string());
        }
        if self.fitting.secant_tol <= 0.0 {
            errors.push("fitting.secant_tol must be > 0".to_string());
        }
        if self.gor.outlier_sigma <= 0.0 {
            errors.push("gor.outlier_sigma must be > 0".to_string());
        }
        if self.gor.gor_cap <= 0.0 {
            errors.push("gor.gor_cap must be > 0".to_string());
        }
        if !(0.0..=self.gor.curvature_max).contains(&self.gor.fallback_curvature) {
            errors.push(format!(
                "gor.fallback_curvature must be within [0, {}]",
                self.gor.curvature_max
            ));
        }
        for (field, threshold) in &self.gor.dewpoint_by_field {
            if !(0.0..=1.0).contains(threshold) {
                errors.push(format!(
                    "gor.dewpoint_by_field[{field}] must be a Gp/EUR fraction in [0, 1]"
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.gor.dewpoint_default) {
            errors.push("gor.dewpoint_default must be a Gp/EUR fraction in [0, 1]".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_pass_validation() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn dewpoint_lookup_falls_back_to_default() {
        let gor = GorConfig::default();
        assert!((gor.dewpoint_threshold("LA CALERA") - 0.095_730_339).abs() < 1e-12);
        assert!((gor.dewpoint_threshold("UNKNOWN FIELD") - 0.18).abs() < 1e-12);
    }

    #[test]
    fn partial_toml_fills_remaining_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[fitting]\nmax_evals = 1000").unwrap();
        let config = EngineConfig::load_from_file(f.path()).unwrap();
        assert_eq!(config.fitting.max_evals, 1000);
        assert!((config.gor.dry_gas_gor - 1.0e6).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[gor]\ngor_cap = -1.0").unwrap();
        let err = EngineConfig::load_from_file(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
