//! Folder-level aggregation
//!
//! Rolls a folder's items up into one score so callers can rank folders
//! ("resume recent work"). Recency dominates, then importance, activity and
//! an externally supplied validation signal. Archive-like paths are damped
//! by a multiplier after the weighted sum.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::config::{FolderConfig, FolderWeights};
use crate::memory::tier::ImportanceTier;
use crate::memory::types::MemoryItem;
use crate::scoring::recency::{DECAY_RATE, recency_score_at};

/// Folder name used for items without a folder path
pub const UNKNOWN_FOLDER: &str = "unknown";

/// Kind of non-production path detected by [`archive_kind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    Archive,
    Scratch,
    Test,
    Prototype,
}

impl ArchiveKind {
    /// Score multiplier applied to folders of this kind
    pub fn multiplier(self) -> f64 {
        match self {
            ArchiveKind::Archive => 0.1,
            ArchiveKind::Scratch | ArchiveKind::Test | ArchiveKind::Prototype => 0.2,
        }
    }
}

// Checked in order; the first match wins.
const ARCHIVE_PATTERNS: [(&str, ArchiveKind); 5] = [
    ("z_archive/", ArchiveKind::Archive),
    ("/scratch/", ArchiveKind::Scratch),
    ("/test-", ArchiveKind::Test),
    ("-test/", ArchiveKind::Test),
    ("/prototype/", ArchiveKind::Prototype),
];

/// Classify a folder path (case-insensitive)
pub fn archive_kind(folder_path: &str) -> Option<ArchiveKind> {
    if folder_path.is_empty() {
        return None;
    }
    let lowered = folder_path.to_lowercase();
    ARCHIVE_PATTERNS
        .iter()
        .find(|(pattern, _)| lowered.contains(pattern))
        .map(|(_, kind)| *kind)
}

pub fn is_archived(folder_path: &str) -> bool {
    archive_kind(folder_path).is_some()
}

/// 0.1 for `z_archive/`, 0.2 for scratch/test/prototype paths, 1.0 otherwise
pub fn archive_multiplier(folder_path: &str) -> f64 {
    archive_kind(folder_path).map_or(1.0, ArchiveKind::multiplier)
}

/// Leaf folder name for display, suffixed with ` (archived)` when archived
pub fn simplify_path(folder_path: &str) -> String {
    if folder_path.is_empty() {
        return UNKNOWN_FOLDER.to_string();
    }

    let leaf = folder_path
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(UNKNOWN_FOLDER);

    if is_archived(folder_path) {
        format!("{leaf} (archived)")
    } else {
        leaf.to_string()
    }
}

/// Tier with the highest folder-importance weight among the items
pub fn find_top_tier(items: &[MemoryItem]) -> ImportanceTier {
    items
        .iter()
        .map(|item| item.importance_tier)
        .min_by(|a, b| b.folder_weight().total_cmp(&a.folder_weight()))
        .unwrap_or_default()
}

/// Most recent parseable activity timestamp, or the wall clock if none
pub fn find_last_activity(items: &[MemoryItem]) -> DateTime<Utc> {
    find_last_activity_at(items, Utc::now())
}

pub fn find_last_activity_at(items: &[MemoryItem], now: DateTime<Utc>) -> DateTime<Utc> {
    items
        .iter()
        .filter_map(MemoryItem::last_touched)
        .max()
        .unwrap_or(now)
}

/// Source of the validation signal for a folder
pub trait Validator: Send + Sync {
    /// Validation score in [0, 1]
    fn validation_score(&self, folder_path: &str, items: &[MemoryItem]) -> f64;
}

/// Validator returning the same score for every folder
#[derive(Debug, Clone, Copy)]
pub struct ConstantValidator(pub f64);

impl Default for ConstantValidator {
    fn default() -> Self {
        Self(0.5)
    }
}

impl Validator for ConstantValidator {
    fn validation_score(&self, _folder_path: &str, _items: &[MemoryItem]) -> f64 {
        self.0
    }
}

/// Aggregated score for one folder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderScore {
    pub folder_path: String,
    /// Weighted sum after the archive multiplier
    pub score: f64,
    pub recency_score: f64,
    pub importance_score: f64,
    pub activity_score: f64,
    pub validation_score: f64,
}

impl FolderScore {
    fn empty(folder_path: &str) -> Self {
        Self {
            folder_path: folder_path.to_string(),
            score: 0.0,
            recency_score: 0.0,
            importance_score: 0.0,
            activity_score: 0.0,
            validation_score: 0.0,
        }
    }
}

/// One row of a folder ranking
#[derive(Debug, Clone, Serialize)]
pub struct FolderSummary {
    #[serde(flatten)]
    pub score: FolderScore,
    pub simplified: String,
    pub count: usize,
    pub last_activity: DateTime<Utc>,
    pub is_archived: bool,
    pub top_tier: ImportanceTier,
}

/// Options for [`FolderAggregator::compute_folder_scores`]
#[derive(Debug, Clone, Default)]
pub struct FolderScoreOptions {
    pub include_archived: bool,
    /// Case-insensitive regex patterns; invalid ones are logged and ignored
    pub exclude_patterns: Vec<String>,
    pub limit: Option<usize>,
}

impl From<&FolderConfig> for FolderScoreOptions {
    fn from(config: &FolderConfig) -> Self {
        Self {
            include_archived: config.include_archived,
            exclude_patterns: config.exclude_patterns.clone(),
            limit: None,
        }
    }
}

/// Computes folder scores with configurable weights
pub struct FolderAggregator<V: Validator = ConstantValidator> {
    weights: FolderWeights,
    max_activity_items: usize,
    decay_rate: f64,
    validator: V,
}

impl Default for FolderAggregator {
    fn default() -> Self {
        Self {
            weights: FolderWeights::default(),
            max_activity_items: 5,
            decay_rate: DECAY_RATE,
            validator: ConstantValidator::default(),
        }
    }
}

impl FolderAggregator {
    /// Build from folder config and the recency decay rate
    pub fn from_config(config: &FolderConfig, decay_rate: f64) -> Self {
        Self {
            weights: config.weights,
            max_activity_items: config.max_activity_items.max(1),
            decay_rate,
            validator: ConstantValidator(config.default_validation_score),
        }
    }
}

impl<V: Validator> FolderAggregator<V> {
    /// Swap in a different validation source
    pub fn with_validator<W: Validator>(self, validator: W) -> FolderAggregator<W> {
        FolderAggregator {
            weights: self.weights,
            max_activity_items: self.max_activity_items,
            decay_rate: self.decay_rate,
            validator,
        }
    }

    pub fn score(&self, folder_path: &str, items: &[MemoryItem]) -> FolderScore {
        self.score_at(folder_path, items, Utc::now())
    }

    pub fn score_at(
        &self,
        folder_path: &str,
        items: &[MemoryItem],
        now: DateTime<Utc>,
    ) -> FolderScore {
        if items.is_empty() {
            return FolderScore::empty(folder_path);
        }

        let recency_score = items
            .iter()
            .map(|item| {
                recency_score_at(
                    item.last_touched(),
                    item.importance_tier,
                    self.decay_rate,
                    now,
                )
            })
            .fold(0.0, f64::max);

        let importance_score = items
            .iter()
            .map(|item| item.importance_tier.folder_weight())
            .sum::<f64>()
            / items.len() as f64;

        let activity_score = (items.len() as f64 / self.max_activity_items as f64).min(1.0);

        let validation_score = sanitize_unit(self.validator.validation_score(folder_path, items));

        let raw = self.weights.recency * recency_score
            + self.weights.importance * importance_score
            + self.weights.activity * activity_score
            + self.weights.validation * validation_score;

        FolderScore {
            folder_path: folder_path.to_string(),
            score: raw * archive_multiplier(folder_path),
            recency_score,
            importance_score,
            activity_score,
            validation_score,
        }
    }

    /// Group items by folder and rank the folders by score, highest first
    pub fn compute_folder_scores(
        &self,
        items: &[MemoryItem],
        options: &FolderScoreOptions,
    ) -> Vec<FolderSummary> {
        self.compute_folder_scores_at(items, options, Utc::now())
    }

    pub fn compute_folder_scores_at(
        &self,
        items: &[MemoryItem],
        options: &FolderScoreOptions,
        now: DateTime<Utc>,
    ) -> Vec<FolderSummary> {
        if items.is_empty() {
            return Vec::new();
        }

        let excludes = compile_exclude_patterns(&options.exclude_patterns);

        let mut folders: BTreeMap<&str, Vec<MemoryItem>> = BTreeMap::new();
        for item in items {
            let folder = if item.folder_path.is_empty() {
                UNKNOWN_FOLDER
            } else {
                item.folder_path.as_str()
            };
            folders.entry(folder).or_default().push(item.clone());
        }

        let mut summaries: Vec<FolderSummary> = folders
            .into_iter()
            .filter(|(folder, _)| options.include_archived || !is_archived(folder))
            .filter(|(folder, _)| !excludes.iter().any(|re| re.is_match(folder)))
            .map(|(folder, folder_items)| FolderSummary {
                score: self.score_at(folder, &folder_items, now),
                simplified: simplify_path(folder),
                count: folder_items.len(),
                last_activity: find_last_activity_at(&folder_items, now),
                is_archived: is_archived(folder),
                top_tier: find_top_tier(&folder_items),
            })
            .collect();

        summaries.sort_by(|a, b| b.score.score.total_cmp(&a.score.score));

        if let Some(limit) = options.limit.filter(|limit| *limit > 0) {
            summaries.truncate(limit);
        }

        tracing::debug!(folders = summaries.len(), "Computed folder scores");
        summaries
    }
}

/// Score a folder with the default weights and validator
pub fn score_folder(folder_path: &str, items: &[MemoryItem]) -> FolderScore {
    FolderAggregator::default().score(folder_path, items)
}

fn sanitize_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn compile_exclude_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!("Invalid exclude pattern '{}': {}", pattern, e);
                    None
                }
            }
        })
        .collect()
}
