//! Memory item types consumed by the ranking engine
//!
//! Items are produced by an external save/access-tracking subsystem and are
//! read-only here. Deserialization is lenient: rows coming out of storage
//! carry loosely typed timestamps and tiers, and a malformed field must
//! degrade to a neutral value instead of rejecting the row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::memory::tier::ImportanceTier;

/// Importance weight assumed when an item carries none
pub const DEFAULT_IMPORTANCE_WEIGHT: f64 = 0.5;

/// A single memory item as seen by the ranking engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Stable identifier
    pub id: i64,
    /// Optional display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Folder the item was saved under
    #[serde(default, alias = "spec_folder")]
    pub folder_path: String,
    /// Importance tier (unknown values normalize to `normal`)
    #[serde(default)]
    pub importance_tier: ImportanceTier,
    /// Explicit importance weight in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance_weight: Option<f64>,
    /// Creation time; `None` when absent or unparsable
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time; `None` when absent or unparsable
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Number of recorded accesses (may be negative in corrupt rows)
    #[serde(default, deserialize_with = "null_as_zero")]
    pub access_count: i64,
    /// Vector similarity on the 0-100 scale used by the search layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// Reciprocal-rank-fusion score from hybrid search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrf_score: Option<f64>,
}

impl MemoryItem {
    /// Create an item with neutral defaults
    pub fn new(id: i64, folder_path: impl Into<String>) -> Self {
        Self {
            id,
            title: None,
            folder_path: folder_path.into(),
            importance_tier: ImportanceTier::Normal,
            importance_weight: None,
            created_at: None,
            updated_at: None,
            access_count: 0,
            similarity: None,
            rrf_score: None,
        }
    }

    pub fn with_tier(mut self, tier: ImportanceTier) -> Self {
        self.importance_tier = tier;
        self
    }

    pub fn with_importance_weight(mut self, weight: f64) -> Self {
        self.importance_weight = Some(weight);
        self
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_access_count(mut self, count: i64) -> Self {
        self.access_count = count;
        self
    }

    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = Some(similarity);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Most recent known activity: `updated_at`, falling back to `created_at`
    pub fn last_touched(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }

    /// Importance weight clamped to [0, 1], defaulting to 0.5
    pub fn importance_weight_or_default(&self) -> f64 {
        match self.importance_weight {
            Some(w) if w.is_finite() => w.clamp(0.0, 1.0),
            _ => DEFAULT_IMPORTANCE_WEIGHT,
        }
    }
}

/// Parse the timestamp formats found in stored rows.
///
/// Accepts RFC 3339, SQLite's `YYYY-MM-DD HH:MM:SS` (taken as UTC), naive ISO
/// datetimes, and bare dates. Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Convert epoch milliseconds, rejecting non-finite values
pub fn timestamp_from_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(f64),
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    // Anything that is neither text nor a number degrades to `None`.
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = raw
        .and_then(|value| serde_json::from_value::<RawTimestamp>(value).ok())
        .and_then(|raw| match raw {
            RawTimestamp::Text(text) => parse_timestamp(&text),
            RawTimestamp::Millis(millis) => timestamp_from_millis(millis),
        });
    Ok(parsed)
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}
