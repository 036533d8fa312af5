//! Configuration errors.
//!
//! Malformed *source* input never produces an error: the classifier and the
//! detectors degrade gracefully. The only failures the library reports are
//! rubric and configuration mistakes, which are caught when a
//! [`Validator`](crate::engine::Validator) is built rather than while scoring.

use std::path::PathBuf;

use crate::rubric::{ArtifactKind, Category};

/// A rubric or configuration file that cannot be used for scoring.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{kind} rubric has an empty budget table")]
    EmptyBudgetTable { kind: ArtifactKind },

    #[error("{kind} rubric lists category '{category}' more than once")]
    DuplicateCategory {
        kind: ArtifactKind,
        category: Category,
    },

    #[error("{kind} rubric gives category '{category}' a budget of 0 points")]
    ZeroBudget {
        kind: ArtifactKind,
        category: Category,
    },

    #[error("{kind} rubric gives category '{category}' {points} points (max {max})", max = crate::rubric::MAX_CATEGORY_POINTS)]
    BudgetTooLarge {
        kind: ArtifactKind,
        category: Category,
        points: u32,
    },

    #[error("unknown category '{name}' in {kind} budget table")]
    UnknownCategory { kind: ArtifactKind, name: String },

    #[error("detector '{detector}' scores category '{category}', which the {kind} rubric does not budget")]
    CategoryNotInRubric {
        kind: ArtifactKind,
        detector: &'static str,
        category: Category,
    },

    #[error("rating scale has no tiers")]
    EmptyRatingScale,

    #[error("rating scale tiers must have strictly descending cutoffs ending at 0%")]
    UnorderedRatingScale,

    #[error("penalty override for unknown check '{0}'")]
    UnknownCheck(String),

    #[error("unknown detector '{0}' in [detectors] disabled")]
    UnknownDetector(String),

    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
