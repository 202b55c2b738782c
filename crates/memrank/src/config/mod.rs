use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{RankError, Result};
use crate::graph::boost::{MAX_HOPS, MAX_SEED_RESULTS, SEED_FRACTION};

/// Tolerance used when checking that a weight table sums to 1.0
const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

/// Main configuration structure for memrank
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Composite scoring configuration
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Folder aggregation configuration
    #[serde(default)]
    pub folder: FolderConfig,
    /// Causal graph boost configuration
    #[serde(default)]
    pub causal_boost: CausalBoostConfig,
    /// Feature flags, keyed by flag name
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
}

impl Config {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| RankError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            RankError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from an explicit path, or from the first default location that exists.
    ///
    /// Falls back to built-in defaults when no file is found.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        for path in default_config_paths() {
            if path.exists() {
                return Self::load(&path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Check weight tables and numeric ranges
    pub fn validate(&self) -> Result<()> {
        self.scoring.weights.validate()?;
        self.folder.weights.validate()?;

        if !self.scoring.decay_rate.is_finite() || self.scoring.decay_rate <= 0.0 {
            return Err(RankError::Config(format!(
                "scoring.decay_rate must be a positive number, got {}",
                self.scoring.decay_rate
            )));
        }
        if self.folder.max_activity_items == 0 {
            return Err(RankError::Config(
                "folder.max_activity_items must be at least 1".to_string(),
            ));
        }
        check_unit_range(
            "folder.default_validation_score",
            self.folder.default_validation_score,
        )?;

        let boost = &self.causal_boost;
        if !boost.seed_fraction.is_finite() || boost.seed_fraction <= 0.0 || boost.seed_fraction > 1.0
        {
            return Err(RankError::Config(format!(
                "causal_boost.seed_fraction must be in (0, 1], got {}",
                boost.seed_fraction
            )));
        }
        if boost.max_seed_results == 0 {
            return Err(RankError::Config(
                "causal_boost.max_seed_results must be at least 1".to_string(),
            ));
        }
        if boost.max_hops == 0 || boost.max_hops > MAX_HOPS {
            return Err(RankError::Config(format!(
                "causal_boost.max_hops must be between 1 and {MAX_HOPS}, got {}",
                boost.max_hops
            )));
        }

        Ok(())
    }
}

/// Default config file search order
pub fn default_config_paths() -> Vec<PathBuf> {
    [
        dirs::home_dir().map(|h| h.join(".memrank").join("config.toml")),
        dirs::config_dir().map(|c| c.join("memrank").join("config.toml")),
        Some(PathBuf::from("memrank.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn check_unit_range(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(RankError::Config(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

/// Composite scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Factor weights (must sum to 1.0)
    #[serde(default)]
    pub weights: CompositeWeights,
    /// Recency decay rate per day
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,
    /// Give `deprecated` items a tier boost of 0.0 instead of the 0.5 fallback
    #[serde(default)]
    pub strict_deprecated_boost: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: CompositeWeights::default(),
            decay_rate: default_decay_rate(),
            strict_deprecated_boost: false,
        }
    }
}

fn default_decay_rate() -> f64 {
    0.10
}

/// Per-factor weights of the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeWeights {
    #[serde(default = "default_similarity_weight")]
    pub similarity: f64,
    #[serde(default = "default_importance_weight")]
    pub importance: f64,
    #[serde(default = "default_recency_weight")]
    pub recency: f64,
    #[serde(default = "default_popularity_weight")]
    pub popularity: f64,
    #[serde(default = "default_tier_boost_weight")]
    pub tier_boost: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            similarity: default_similarity_weight(),
            importance: default_importance_weight(),
            recency: default_recency_weight(),
            popularity: default_popularity_weight(),
            tier_boost: default_tier_boost_weight(),
        }
    }
}

impl CompositeWeights {
    pub fn sum(&self) -> f64 {
        self.similarity + self.importance + self.recency + self.popularity + self.tier_boost
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("scoring.weights.similarity", self.similarity),
            ("scoring.weights.importance", self.importance),
            ("scoring.weights.recency", self.recency),
            ("scoring.weights.popularity", self.popularity),
            ("scoring.weights.tier_boost", self.tier_boost),
        ] {
            check_unit_range(name, value)?;
        }
        check_weight_sum("scoring.weights", self.sum())
    }
}

fn default_similarity_weight() -> f64 {
    0.35
}

fn default_importance_weight() -> f64 {
    0.25
}

fn default_recency_weight() -> f64 {
    0.20
}

fn default_popularity_weight() -> f64 {
    0.10
}

fn default_tier_boost_weight() -> f64 {
    0.10
}

fn check_weight_sum(name: &str, sum: f64) -> Result<()> {
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(RankError::Config(format!(
            "{name} must sum to 1.0, got {sum:.4}"
        )));
    }
    Ok(())
}

/// Folder aggregation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderConfig {
    /// Signal weights (must sum to 1.0)
    #[serde(default)]
    pub weights: FolderWeights,
    /// Item count at which the activity signal saturates
    #[serde(default = "default_max_activity_items")]
    pub max_activity_items: usize,
    /// Validation signal used until real feedback tracking exists
    #[serde(default = "default_validation_score")]
    pub default_validation_score: f64,
    /// Include archived folders in folder rankings
    #[serde(default)]
    pub include_archived: bool,
    /// Extra case-insensitive regex patterns for folders to skip
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            weights: FolderWeights::default(),
            max_activity_items: default_max_activity_items(),
            default_validation_score: default_validation_score(),
            include_archived: false,
            exclude_patterns: Vec::new(),
        }
    }
}

fn default_max_activity_items() -> usize {
    5
}

fn default_validation_score() -> f64 {
    0.5
}

/// Per-signal weights of the folder score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FolderWeights {
    #[serde(default = "default_folder_recency_weight")]
    pub recency: f64,
    #[serde(default = "default_folder_importance_weight")]
    pub importance: f64,
    #[serde(default = "default_folder_activity_weight")]
    pub activity: f64,
    #[serde(default = "default_folder_validation_weight")]
    pub validation: f64,
}

impl Default for FolderWeights {
    fn default() -> Self {
        Self {
            recency: default_folder_recency_weight(),
            importance: default_folder_importance_weight(),
            activity: default_folder_activity_weight(),
            validation: default_folder_validation_weight(),
        }
    }
}

impl FolderWeights {
    pub fn sum(&self) -> f64 {
        self.recency + self.importance + self.activity + self.validation
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("folder.weights.recency", self.recency),
            ("folder.weights.importance", self.importance),
            ("folder.weights.activity", self.activity),
            ("folder.weights.validation", self.validation),
        ] {
            check_unit_range(name, value)?;
        }
        check_weight_sum("folder.weights", self.sum())
    }
}

fn default_folder_recency_weight() -> f64 {
    0.40
}

fn default_folder_importance_weight() -> f64 {
    0.30
}

fn default_folder_activity_weight() -> f64 {
    0.20
}

fn default_folder_validation_weight() -> f64 {
    0.10
}

/// Causal graph boost configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CausalBoostConfig {
    /// Fraction of the ranked list used as traversal seeds
    #[serde(default = "default_seed_fraction")]
    pub seed_fraction: f64,
    /// Absolute cap on the number of seeds
    #[serde(default = "default_max_seed_results")]
    pub max_seed_results: usize,
    /// Traversal depth (1..=MAX_HOPS)
    #[serde(default = "default_max_hops")]
    pub max_hops: u32,
}

impl Default for CausalBoostConfig {
    fn default() -> Self {
        Self {
            seed_fraction: default_seed_fraction(),
            max_seed_results: default_max_seed_results(),
            max_hops: default_max_hops(),
        }
    }
}

fn default_seed_fraction() -> f64 {
    SEED_FRACTION
}

fn default_max_seed_results() -> usize {
    MAX_SEED_RESULTS
}

fn default_max_hops() -> u32 {
    MAX_HOPS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.scoring.weights.similarity, 0.35);
        assert_eq!(config.scoring.weights.importance, 0.25);
        assert_eq!(config.scoring.weights.recency, 0.20);
        assert_eq!(config.scoring.weights.popularity, 0.10);
        assert_eq!(config.scoring.weights.tier_boost, 0.10);
        assert_eq!(config.scoring.decay_rate, 0.10);
        assert!(!config.scoring.strict_deprecated_boost);
        assert_eq!(config.folder.max_activity_items, 5);
        assert_eq!(config.folder.default_validation_score, 0.5);
        assert!(!config.folder.include_archived);
        assert_eq!(config.causal_boost.max_hops, 2);
        assert_eq!(config.causal_boost.max_seed_results, 5);
        assert!(config.features.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((CompositeWeights::default().sum() - 1.0).abs() < 1e-9);
        assert!((FolderWeights::default().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[scoring]
decay_rate = 0.2
strict_deprecated_boost = true

[scoring.weights]
similarity = 0.5
importance = 0.2
recency = 0.1
popularity = 0.1
tier_boost = 0.1

[folder]
max_activity_items = 10
include_archived = true
exclude_patterns = ["^drafts/"]

[causal_boost]
seed_fraction = 0.5
max_seed_results = 3
max_hops = 1

[features]
causal_boost = false
"#;

        let config = Config::from_toml_str(toml_str).expect("Failed to parse TOML");

        assert_eq!(config.scoring.decay_rate, 0.2);
        assert!(config.scoring.strict_deprecated_boost);
        assert_eq!(config.scoring.weights.similarity, 0.5);
        assert_eq!(config.folder.max_activity_items, 10);
        assert!(config.folder.include_archived);
        assert_eq!(config.folder.exclude_patterns, vec!["^drafts/".to_string()]);
        assert_eq!(config.causal_boost.seed_fraction, 0.5);
        assert_eq!(config.causal_boost.max_seed_results, 3);
        assert_eq!(config.causal_boost.max_hops, 1);
        assert_eq!(config.features.get("causal_boost"), Some(&false));
    }

    #[test]
    fn test_toml_partial_deserialization() {
        let toml_str = r#"
[folder]
include_archived = true
"#;

        let config = Config::from_toml_str(toml_str).expect("Failed to parse partial TOML");

        assert!(config.folder.include_archived);
        assert_eq!(config.folder.weights, FolderWeights::default());
        assert_eq!(config.scoring.weights, CompositeWeights::default());
        assert_eq!(config.causal_boost.max_hops, 2);
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let toml_str = r#"
[scoring.weights]
similarity = 0.9
"#;

        let err = Config::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("scoring.weights must sum to 1.0"));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut config = Config::default();
        config.causal_boost.max_hops = 3;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scoring.decay_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.causal_boost.seed_fraction = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.folder.default_validation_score = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scoring]\ndecay_rate = 0.05\n").unwrap();

        let config = Config::discover(Some(&path)).expect("config should load");
        assert_eq!(config.scoring.decay_rate, 0.05);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Config::load(Path::new("/nonexistent/memrank.toml")).unwrap_err();
        assert!(matches!(err, RankError::Config(_)));
    }
}
