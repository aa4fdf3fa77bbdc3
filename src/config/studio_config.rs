//! Studio configuration types, loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV_VAR: &str = "STUDIO_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "studio_config.toml";

/// Root configuration for the analysis core.
///
/// Load with `StudioConfig::load()` which searches:
/// 1. `$STUDIO_CONFIG` env var
/// 2. `./studio_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Statistical test selection guards
    #[serde(default)]
    pub statistics: StatisticsConfig,

    /// Random-forest importance model
    #[serde(default)]
    pub importance: ImportanceConfig,

    /// Driver ranking weights
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Plan execution engine
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Session workflow
    #[serde(default)]
    pub session: SessionConfig,
}

impl StudioConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded studio config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded studio config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No studio config found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Studio config saved");
        Ok(())
    }

    /// Validate all sections for internal consistency.
    ///
    /// Every violation is collected before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let s = &self.statistics;
        if s.min_paired_samples < 2 {
            errors.push(format!(
                "statistics.min_paired_samples ({}) must be at least 2",
                s.min_paired_samples
            ));
        }
        if s.min_group_size < 2 {
            errors.push(format!(
                "statistics.min_group_size ({}) must be at least 2",
                s.min_group_size
            ));
        }
        if s.classification_cardinality < 2 {
            errors.push(format!(
                "statistics.classification_cardinality ({}) must be at least 2",
                s.classification_cardinality
            ));
        }

        let imp = &self.importance;
        if imp.n_trees == 0 {
            errors.push("importance.n_trees must be > 0".to_string());
        }
        if imp.max_depth == 0 {
            errors.push("importance.max_depth must be > 0".to_string());
        }
        if imp.min_samples_split < 2 {
            errors.push(format!(
                "importance.min_samples_split ({}) must be at least 2",
                imp.min_samples_split
            ));
        }

        let r = &self.ranking;
        let weights = [
            ("significance_weight", r.significance_weight),
            ("effect_size_weight", r.effect_size_weight),
            ("correlation_weight", r.correlation_weight),
            ("importance_weight", r.importance_weight),
        ];
        for (name, w) in weights {
            if !(w.is_finite() && w >= 0.0) {
                errors.push(format!("ranking.{name} ({w}) must be non-negative"));
            }
        }
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > 1e-6 {
            errors.push(format!("ranking weights must sum to 1.0, got {sum:.6}"));
        }
        if !(0.0..=1.0).contains(&r.null_p_value_significance) {
            errors.push(format!(
                "ranking.null_p_value_significance ({}) must be within [0, 1]",
                r.null_p_value_significance
            ));
        }

        let e = &self.execution;
        if !(e.test_fraction > 0.0 && e.test_fraction < 1.0) {
            errors.push(format!(
                "execution.test_fraction ({}) must be within (0, 1)",
                e.test_fraction
            ));
        }
        if e.groupby_limit == 0 {
            errors.push("execution.groupby_limit must be > 0".to_string());
        }
        if e.logistic_max_iter == 0 {
            errors.push("execution.logistic_max_iter must be > 0".to_string());
        }
        if e.logistic_learning_rate <= 0.0 {
            errors.push(format!(
                "execution.logistic_learning_rate ({}) must be positive",
                e.logistic_learning_rate
            ));
        }
        if e.logistic_l2 < 0.0 {
            errors.push(format!(
                "execution.logistic_l2 ({}) must be non-negative",
                e.logistic_l2
            ));
        }

        if self.session.max_target_candidates == 0 {
            errors.push("session.max_target_candidates must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Minimum paired non-missing observations before any test runs.
    #[serde(default = "default_min_paired_samples")]
    pub min_paired_samples: usize,

    /// Minimum members for a comparison group.
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,

    /// Numeric targets with at most this many distinct values are classification targets.
    #[serde(default = "default_classification_cardinality")]
    pub classification_cardinality: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            min_paired_samples: default_min_paired_samples(),
            min_group_size: default_min_group_size(),
            classification_cardinality: default_classification_cardinality(),
        }
    }
}

fn default_min_paired_samples() -> usize { 12 }
fn default_min_group_size() -> usize { 3 }
fn default_classification_cardinality() -> usize { 10 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceConfig {
    /// Complete rows required before a forest is fitted.
    #[serde(default = "default_importance_min_rows")]
    pub min_rows: usize,

    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    #[serde(default = "default_forest_seed")]
    pub seed: u64,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
}

impl Default for ImportanceConfig {
    fn default() -> Self {
        Self {
            min_rows: default_importance_min_rows(),
            n_trees: default_n_trees(),
            seed: default_forest_seed(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
        }
    }
}

fn default_importance_min_rows() -> usize { 20 }
fn default_n_trees() -> usize { 120 }
fn default_forest_seed() -> u64 { 42 }
fn default_max_depth() -> usize { 12 }
fn default_min_samples_split() -> usize { 2 }

/// Weights of the four driver-score components. Must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_significance_weight")]
    pub significance_weight: f64,

    #[serde(default = "default_effect_size_weight")]
    pub effect_size_weight: f64,

    #[serde(default = "default_correlation_weight")]
    pub correlation_weight: f64,

    #[serde(default = "default_importance_weight")]
    pub importance_weight: f64,

    /// Significance credited when a feature has no p-value.
    #[serde(default = "default_null_p_value_significance")]
    pub null_p_value_significance: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            significance_weight: default_significance_weight(),
            effect_size_weight: default_effect_size_weight(),
            correlation_weight: default_correlation_weight(),
            importance_weight: default_importance_weight(),
            null_p_value_significance: default_null_p_value_significance(),
        }
    }
}

fn default_significance_weight() -> f64 { 0.35 }
fn default_effect_size_weight() -> f64 { 0.25 }
fn default_correlation_weight() -> f64 { 0.20 }
fn default_importance_weight() -> f64 { 0.20 }
fn default_null_p_value_significance() -> f64 { 0.4 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Held-out share for TRAIN_MODEL.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    #[serde(default = "default_split_seed")]
    pub split_seed: u64,

    #[serde(default = "default_classification_cardinality")]
    pub classification_cardinality: usize,

    /// Groups kept in a GROUPBY result.
    #[serde(default = "default_groupby_limit")]
    pub groupby_limit: usize,

    #[serde(default = "default_logistic_max_iter")]
    pub logistic_max_iter: usize,

    #[serde(default = "default_logistic_learning_rate")]
    pub logistic_learning_rate: f64,

    /// Inverse regularization strength, matching the usual `C` parameter.
    #[serde(default = "default_logistic_l2")]
    pub logistic_l2: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
            split_seed: default_split_seed(),
            classification_cardinality: default_classification_cardinality(),
            groupby_limit: default_groupby_limit(),
            logistic_max_iter: default_logistic_max_iter(),
            logistic_learning_rate: default_logistic_learning_rate(),
            logistic_l2: default_logistic_l2(),
        }
    }
}

fn default_test_fraction() -> f64 { 0.2 }
fn default_split_seed() -> u64 { 42 }
fn default_groupby_limit() -> usize { 20 }
fn default_logistic_max_iter() -> usize { 1000 }
fn default_logistic_learning_rate() -> f64 { 0.1 }
fn default_logistic_l2() -> f64 { 1.0 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Suggested target columns surfaced when intent parsing is ambiguous.
    #[serde(default = "default_max_target_candidates")]
    pub max_target_candidates: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_target_candidates: default_max_target_candidates(),
        }
    }
}

fn default_max_target_candidates() -> usize { 8 }

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(StudioConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let cfg = StudioConfig::default();
        assert_eq!(cfg.statistics.min_paired_samples, 12);
        assert_eq!(cfg.importance.n_trees, 120);
        assert_eq!(cfg.importance.seed, 42);
        assert!((cfg.ranking.significance_weight - 0.35).abs() < 1e-12);
        assert_eq!(cfg.execution.groupby_limit, 20);
        assert_eq!(cfg.session.max_target_candidates, 8);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: StudioConfig = toml::from_str("[importance]\nn_trees = 10\n").unwrap();
        assert_eq!(cfg.importance.n_trees, 10);
        assert_eq!(cfg.importance.min_rows, 20);
        assert_eq!(cfg.statistics.min_group_size, 3);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut cfg = StudioConfig::default();
        cfg.ranking.significance_weight = 0.9;
        cfg.execution.test_fraction = 1.5;
        cfg.importance.n_trees = 0;
        match cfg.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_toml_round_trip_preserves_values() {
        let mut cfg = StudioConfig::default();
        cfg.execution.split_seed = 7;
        let text = cfg.to_toml().unwrap();
        let back: StudioConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
