//! Per-item and per-folder scoring models

pub mod composite;
pub mod folder;
pub mod popularity;
pub mod recency;

pub use composite::{
    CompositeScorer, FactorDetail, ScoreBreakdown, ScoredItem, apply_composite_scoring,
    score_composite,
};
pub use folder::{
    ConstantValidator, FolderAggregator, FolderScore, FolderScoreOptions, FolderSummary,
    Validator, archive_multiplier, is_archived, score_folder, simplify_path,
};
pub use popularity::popularity_score;
pub use recency::{DECAY_RATE, recency_score, recency_score_at};
