//! Rubrics: budget tables and rating scales.
//!
//! A [`Rubric`] is pure data. It names the artifact kind it scores, the
//! maximum points of each [`Category`], the [`RatingScale`] that turns a
//! percentage into a label, and any [`Penalties`] overrides. One generic
//! engine serves every rubric; nothing about a rubric is hard-coded at a
//! call site.
//!
//! | Kind | Categories | Max | Scale |
//! |------|-----------|-----|-------|
//! | [`ArtifactKind::Apex`] | 8 | 150 | 5 stars at 90/75/60/45% |
//! | [`ArtifactKind::Flow`] | 6 | 110 | 5 stars at 90/75/60/45% |
//! | [`ArtifactKind::Data`] | 7 | 130 | 4-tier status at 90/70/60% |

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::detectors::Penalties;
use crate::error::ConfigError;

/// The kind of artifact a rubric scores.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Apex classes and triggers (`.cls`, `.trigger`).
    Apex,
    /// Flow definitions (`.flow-meta.xml`, `.flow`, or structured JSON metadata).
    Flow,
    /// Data-operation payloads (`soql_query` / `sobject_dml` tool calls).
    Data,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Apex, ArtifactKind::Flow, ArtifactKind::Data];

    pub fn key(self) -> &'static str {
        match self {
            ArtifactKind::Apex => "apex",
            ArtifactKind::Flow => "flow",
            ArtifactKind::Data => "data",
        }
    }

    /// Guesses the artifact kind from a file name.
    ///
    /// `.json` files are treated as data-operation payloads.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use oxidized_sf_audit::rubric::ArtifactKind;
    ///
    /// assert_eq!(ArtifactKind::from_path(Path::new("src/AccountService.cls")), Some(ArtifactKind::Apex));
    /// assert_eq!(ArtifactKind::from_path(Path::new("Lead_Router.flow-meta.xml")), Some(ArtifactKind::Flow));
    /// assert_eq!(ArtifactKind::from_path(Path::new("package.xml")), None);
    /// ```
    pub fn from_path(path: &Path) -> Option<ArtifactKind> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".cls") || name.ends_with(".trigger") {
            Some(ArtifactKind::Apex)
        } else if name.ends_with(".flow-meta.xml") || name.ends_with(".flow") {
            Some(ArtifactKind::Flow)
        } else if name.ends_with(".json") {
            Some(ArtifactKind::Data)
        } else {
            None
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::Apex => "Apex",
            ArtifactKind::Flow => "Flow",
            ArtifactKind::Data => "Data",
        })
    }
}

/// Every scoring dimension of every rubric.
///
/// Detectors name their category with this enum, so a detector can never
/// score a dimension that does not exist. Whether the *active* rubric budgets
/// that dimension is checked when a validator is built.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Bulkification,
    Security,
    Testing,
    Architecture,
    CleanCode,
    ErrorHandling,
    Performance,
    Documentation,
    QueryEfficiency,
    BulkSafety,
    DataIntegrity,
    SecurityFls,
    TestPatterns,
    CleanupIsolation,
    DesignNaming,
    LogicStructure,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::Bulkification,
        Category::Security,
        Category::Testing,
        Category::Architecture,
        Category::CleanCode,
        Category::ErrorHandling,
        Category::Performance,
        Category::Documentation,
        Category::QueryEfficiency,
        Category::BulkSafety,
        Category::DataIntegrity,
        Category::SecurityFls,
        Category::TestPatterns,
        Category::CleanupIsolation,
        Category::DesignNaming,
        Category::LogicStructure,
    ];

    /// The snake_case key used in configuration files and JSON output.
    pub fn key(self) -> &'static str {
        match self {
            Category::Bulkification => "bulkification",
            Category::Security => "security",
            Category::Testing => "testing",
            Category::Architecture => "architecture",
            Category::CleanCode => "clean_code",
            Category::ErrorHandling => "error_handling",
            Category::Performance => "performance",
            Category::Documentation => "documentation",
            Category::QueryEfficiency => "query_efficiency",
            Category::BulkSafety => "bulk_safety",
            Category::DataIntegrity => "data_integrity",
            Category::SecurityFls => "security_fls",
            Category::TestPatterns => "test_patterns",
            Category::CleanupIsolation => "cleanup_isolation",
            Category::DesignNaming => "design_naming",
            Category::LogicStructure => "logic_structure",
        }
    }

    /// Human-readable title.
    pub fn title(self) -> &'static str {
        match self {
            Category::Bulkification => "Bulkification",
            Category::Security => "Security",
            Category::Testing => "Testing",
            Category::Architecture => "Architecture",
            Category::CleanCode => "Clean Code",
            Category::ErrorHandling => "Error Handling",
            Category::Performance => "Performance",
            Category::Documentation => "Documentation",
            Category::QueryEfficiency => "Query Efficiency",
            Category::BulkSafety => "Bulk Safety",
            Category::DataIntegrity => "Data Integrity",
            Category::SecurityFls => "Security & FLS",
            Category::TestPatterns => "Test Patterns",
            Category::CleanupIsolation => "Cleanup & Isolation",
            Category::DesignNaming => "Design & Naming",
            Category::LogicStructure => "Logic & Structure",
        }
    }

    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Maximum points one category can contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CategoryBudget {
    pub category: Category,
    pub max_points: u32,
}

impl CategoryBudget {
    pub const fn new(category: Category, max_points: u32) -> Self {
        CategoryBudget {
            category,
            max_points,
        }
    }
}

const APEX_BUDGETS: &[CategoryBudget] = &[
    CategoryBudget::new(Category::Bulkification, 25),
    CategoryBudget::new(Category::Security, 25),
    CategoryBudget::new(Category::Testing, 25),
    CategoryBudget::new(Category::Architecture, 20),
    CategoryBudget::new(Category::CleanCode, 20),
    CategoryBudget::new(Category::ErrorHandling, 15),
    CategoryBudget::new(Category::Performance, 10),
    CategoryBudget::new(Category::Documentation, 10),
];

const FLOW_BUDGETS: &[CategoryBudget] = &[
    CategoryBudget::new(Category::DesignNaming, 20),
    CategoryBudget::new(Category::LogicStructure, 20),
    CategoryBudget::new(Category::Architecture, 15),
    CategoryBudget::new(Category::Performance, 20),
    CategoryBudget::new(Category::ErrorHandling, 20),
    CategoryBudget::new(Category::Security, 15),
];

const DATA_BUDGETS: &[CategoryBudget] = &[
    CategoryBudget::new(Category::QueryEfficiency, 25),
    CategoryBudget::new(Category::BulkSafety, 25),
    CategoryBudget::new(Category::DataIntegrity, 20),
    CategoryBudget::new(Category::SecurityFls, 20),
    CategoryBudget::new(Category::TestPatterns, 15),
    CategoryBudget::new(Category::CleanupIsolation, 15),
    CategoryBudget::new(Category::Documentation, 10),
];

/// The label a report earns.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rating {
    pub label: String,
    /// Star count for star scales; `None` for status scales.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u8>,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stars {
            Some(stars) => write!(f, "{} ({stars}/5)", self.label),
            None => f.write_str(&self.label),
        }
    }
}

/// One step of a [`RatingScale`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RatingTier {
    /// Inclusive lower bound, in whole percent of the maximum score.
    pub min_percent: u32,
    pub label: String,
    #[serde(default)]
    pub stars: Option<u8>,
}

impl RatingTier {
    fn new(min_percent: u32, label: &str, stars: Option<u8>) -> Self {
        RatingTier {
            min_percent,
            label: label.to_string(),
            stars,
        }
    }
}

/// A step function from score percentage to [`Rating`].
///
/// Tiers are ordered by strictly descending cutoff and the last tier's cutoff
/// is `0`, so every score maps to exactly one tier.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RatingScale {
    tiers: Vec<RatingTier>,
}

impl RatingScale {
    pub fn new(tiers: Vec<RatingTier>) -> Result<Self, ConfigError> {
        let last = tiers.last().ok_or(ConfigError::EmptyRatingScale)?;
        let descending = tiers
            .windows(2)
            .all(|w| w[0].min_percent > w[1].min_percent);
        if !descending || last.min_percent != 0 {
            return Err(ConfigError::UnorderedRatingScale);
        }
        Ok(RatingScale { tiers })
    }

    /// Five-star scale with cutoffs at 90, 75, 60 and 45 percent.
    pub fn stars() -> Self {
        RatingScale {
            tiers: vec![
                RatingTier::new(90, "Excellent", Some(5)),
                RatingTier::new(75, "Very Good", Some(4)),
                RatingTier::new(60, "Good", Some(3)),
                RatingTier::new(45, "Needs Work", Some(2)),
                RatingTier::new(0, "Critical Issues", Some(1)),
            ],
        }
    }

    /// Four-tier pass/block scale with cutoffs at 90, 70 and 60 percent.
    pub fn deployment_status() -> Self {
        RatingScale {
            tiers: vec![
                RatingTier::new(90, "PASSED", None),
                RatingTier::new(70, "PASSED — review recommended", None),
                RatingTier::new(60, "PASSED — address warnings", None),
                RatingTier::new(0, "BLOCKED — fix critical issues before executing", None),
            ],
        }
    }

    pub fn tiers(&self) -> &[RatingTier] {
        &self.tiers
    }

    /// Rates `score` out of `max_score`.
    ///
    /// Comparison is done in integer arithmetic (`score * 100 >= cutoff * max`)
    /// so boundary scores are rated identically on every platform.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxidized_sf_audit::rubric::RatingScale;
    ///
    /// let scale = RatingScale::stars();
    /// assert_eq!(scale.rate(135, 150).stars, Some(5));
    /// assert_eq!(scale.rate(134, 150).stars, Some(4));
    /// ```
    pub fn rate(&self, score: u32, max_score: u32) -> Rating {
        let score = u64::from(score) * 100;
        let max = u64::from(max_score);
        let tier = self
            .tiers
            .iter()
            .find(|t| max > 0 && score >= u64::from(t.min_percent) * max)
            .or_else(|| self.tiers.last());
        match tier {
            Some(t) => Rating {
                label: t.label.clone(),
                stars: t.stars,
            },
            None => Rating {
                label: String::new(),
                stars: None,
            },
        }
    }
}

/// Upper bound on a single category budget. Keeps score totals and
/// percentage math well inside `u32`.
pub const MAX_CATEGORY_POINTS: u32 = 1000;

/// Everything the engine needs to score one artifact kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rubric {
    pub kind: ArtifactKind,
    pub budgets: Vec<CategoryBudget>,
    pub scale: RatingScale,
    pub penalties: Penalties,
}

impl Rubric {
    /// 150-point Apex rubric.
    pub fn apex() -> Self {
        Rubric {
            kind: ArtifactKind::Apex,
            budgets: APEX_BUDGETS.to_vec(),
            scale: RatingScale::stars(),
            penalties: Penalties::default(),
        }
    }

    /// 110-point Flow rubric.
    pub fn flow() -> Self {
        Rubric {
            kind: ArtifactKind::Flow,
            budgets: FLOW_BUDGETS.to_vec(),
            scale: RatingScale::stars(),
            penalties: Penalties::default(),
        }
    }

    /// 130-point data-operation rubric.
    pub fn data() -> Self {
        Rubric {
            kind: ArtifactKind::Data,
            budgets: DATA_BUDGETS.to_vec(),
            scale: RatingScale::deployment_status(),
            penalties: Penalties::default(),
        }
    }

    pub fn for_kind(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Apex => Rubric::apex(),
            ArtifactKind::Flow => Rubric::flow(),
            ArtifactKind::Data => Rubric::data(),
        }
    }

    pub fn max_score(&self) -> u32 {
        self.budgets.iter().map(|b| b.max_points).sum()
    }

    pub fn budget(&self, category: Category) -> Option<u32> {
        self.budgets
            .iter()
            .find(|b| b.category == category)
            .map(|b| b.max_points)
    }

    /// Replaces (or adds) the budget of `category`.
    pub fn set_budget(&mut self, category: Category, max_points: u32) {
        match self.budgets.iter_mut().find(|b| b.category == category) {
            Some(b) => b.max_points = max_points,
            None => self.budgets.push(CategoryBudget::new(category, max_points)),
        }
    }

    /// Checks the budget table is non-empty, duplicate-free and that every
    /// category budget lies in `1..=MAX_CATEGORY_POINTS`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budgets.is_empty() {
            return Err(ConfigError::EmptyBudgetTable { kind: self.kind });
        }
        let mut seen = HashSet::new();
        for b in &self.budgets {
            if !seen.insert(b.category) {
                return Err(ConfigError::DuplicateCategory {
                    kind: self.kind,
                    category: b.category,
                });
            }
            if b.max_points == 0 {
                return Err(ConfigError::ZeroBudget {
                    kind: self.kind,
                    category: b.category,
                });
            }
            if b.max_points > MAX_CATEGORY_POINTS {
                return Err(ConfigError::BudgetTooLarge {
                    kind: self.kind,
                    category: b.category,
                    points: b.max_points,
                });
            }
        }
        Ok(())
    }
}
