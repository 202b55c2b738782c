//! Importance tier policy
//!
//! Tiers form a closed set. Each tier carries three independently tuned
//! weight tables consumed by different parts of the ranking engine:
//! folder aggregation, composite tier boost, and the search multiplier.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tier boost used by the composite scorer when a tier has no table entry.
pub const DEFAULT_TIER_BOOST: f64 = 0.5;

/// Importance classification of a memory item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImportanceTier {
    /// Core rules and constraints, never decays
    Constitutional,
    /// Never expires, surfaces first
    Critical,
    /// High priority
    Important,
    /// Standard memory
    #[default]
    Normal,
    /// Session-scoped, expires after a week
    Temporary,
    /// Hidden from search results
    Deprecated,
}

impl ImportanceTier {
    /// All tiers, highest importance first
    pub const ALL: [ImportanceTier; 6] = [
        ImportanceTier::Constitutional,
        ImportanceTier::Critical,
        ImportanceTier::Important,
        ImportanceTier::Normal,
        ImportanceTier::Temporary,
        ImportanceTier::Deprecated,
    ];

    /// Canonical lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            ImportanceTier::Constitutional => "constitutional",
            ImportanceTier::Critical => "critical",
            ImportanceTier::Important => "important",
            ImportanceTier::Normal => "normal",
            ImportanceTier::Temporary => "temporary",
            ImportanceTier::Deprecated => "deprecated",
        }
    }

    /// Normalize arbitrary input to a tier.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Empty or unrecognized input yields [`ImportanceTier::Normal`].
    pub fn normalize(raw: &str) -> ImportanceTier {
        let lowered = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == lowered)
            .unwrap_or_default()
    }

    /// Normalize an optional tier name, treating `None` as empty input
    pub fn normalize_opt(raw: Option<&str>) -> ImportanceTier {
        raw.map(Self::normalize).unwrap_or_default()
    }

    /// Strict membership check against the canonical names (no normalization)
    pub fn is_valid(raw: &str) -> bool {
        Self::ALL.iter().any(|tier| tier.as_str() == raw)
    }

    /// Weight used when averaging folder importance
    pub fn folder_weight(self) -> f64 {
        match self {
            ImportanceTier::Constitutional => 1.0,
            ImportanceTier::Critical => 0.8,
            ImportanceTier::Important => 0.6,
            ImportanceTier::Normal => 0.4,
            ImportanceTier::Temporary => 0.2,
            ImportanceTier::Deprecated => 0.0,
        }
    }

    /// Composite scorer tier boost.
    ///
    /// `Deprecated` has no entry of its own and falls back to
    /// [`DEFAULT_TIER_BOOST`]; see [`ImportanceTier::strict_tier_boost`].
    pub fn tier_boost(self) -> f64 {
        match self {
            ImportanceTier::Constitutional | ImportanceTier::Critical => 1.0,
            ImportanceTier::Important => 0.8,
            ImportanceTier::Normal => 0.5,
            ImportanceTier::Temporary => 0.3,
            ImportanceTier::Deprecated => DEFAULT_TIER_BOOST,
        }
    }

    /// Tier boost with `Deprecated` mapped to 0.0
    pub fn strict_tier_boost(self) -> f64 {
        match self {
            ImportanceTier::Deprecated => 0.0,
            other => other.tier_boost(),
        }
    }

    /// Multiplier applied by search consumers
    pub fn search_multiplier(self) -> f64 {
        match self {
            ImportanceTier::Constitutional | ImportanceTier::Critical => 1.0,
            ImportanceTier::Important => 0.8,
            ImportanceTier::Normal => 0.5,
            ImportanceTier::Temporary => 0.3,
            ImportanceTier::Deprecated => 0.1,
        }
    }

    /// Whether age-based decay applies to this tier in lifecycle policies
    pub fn allows_decay(self) -> bool {
        matches!(self, ImportanceTier::Normal | ImportanceTier::Temporary)
    }

    /// Days after creation when the item auto-expires, if ever
    pub fn auto_expire_days(self) -> Option<u32> {
        match self {
            ImportanceTier::Temporary => Some(7),
            _ => None,
        }
    }

    pub fn is_excluded_from_search(self) -> bool {
        self == ImportanceTier::Deprecated
    }

    pub fn always_surface(self) -> bool {
        self == ImportanceTier::Constitutional
    }

    /// Order two tiers for a descending sort by search multiplier
    pub fn compare(self, other: ImportanceTier) -> Ordering {
        other.search_multiplier().total_cmp(&self.search_multiplier())
    }

    /// All tiers sorted by importance, highest first
    pub fn by_importance() -> Vec<ImportanceTier> {
        let mut tiers = Self::ALL.to_vec();
        tiers.sort_by(|a, b| a.compare(*b));
        tiers
    }
}

impl fmt::Display for ImportanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ImportanceTier {
    fn from(raw: &str) -> Self {
        ImportanceTier::normalize(raw)
    }
}

impl Serialize for ImportanceTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Lenient on purpose: stored rows carry free-form tier strings.
impl<'de> Deserialize<'de> for ImportanceTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(ImportanceTier::normalize_opt(raw.as_deref()))
    }
}
