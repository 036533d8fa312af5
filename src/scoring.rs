//! Scoring aggregator.
//!
//! A [`Scorecard`] starts every category at its full budget and only ever
//! lowers it, clamping at zero. The final [`ValidationReport`] is built once
//! from the clamped scores and the accumulated issues.

use crate::issue::{sort_by_severity, Issue, Severity};
use crate::rubric::{ArtifactKind, Category, CategoryBudget, Rating, RatingScale};

/// Running score of one category.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub max_points: u32,
    pub current: u32,
}

/// Per-run table of category scores.
#[derive(Debug, Clone)]
pub struct Scorecard {
    scores: Vec<CategoryScore>,
}

impl Scorecard {
    pub fn new(budgets: &[CategoryBudget]) -> Self {
        Scorecard {
            scores: budgets
                .iter()
                .map(|b| CategoryScore {
                    category: b.category,
                    max_points: b.max_points,
                    current: b.max_points,
                })
                .collect(),
        }
    }

    /// Lowers `category` by `points`, never below zero.
    ///
    /// Returns the points actually removed. Deducting from a category the
    /// table does not contain removes nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxidized_sf_audit::rubric::{Category, CategoryBudget};
    /// use oxidized_sf_audit::scoring::Scorecard;
    ///
    /// let mut card = Scorecard::new(&[CategoryBudget::new(Category::Performance, 10)]);
    /// assert_eq!(card.deduct(Category::Performance, 15), 10);
    /// assert_eq!(card.current(Category::Performance), Some(0));
    /// ```
    pub fn deduct(&mut self, category: Category, points: u32) -> u32 {
        match self.scores.iter_mut().find(|s| s.category == category) {
            Some(score) => {
                let removed = points.min(score.current);
                score.current -= removed;
                removed
            }
            None => 0,
        }
    }

    pub fn current(&self, category: Category) -> Option<u32> {
        self.scores
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.current)
    }

    pub fn total(&self) -> u32 {
        self.scores.iter().map(|s| s.current).sum()
    }

    pub fn max_total(&self) -> u32 {
        self.scores.iter().map(|s| s.max_points).sum()
    }

    /// Consumes the scorecard and produces the final report.
    pub fn into_report(
        self,
        kind: ArtifactKind,
        scale: &RatingScale,
        issues: Vec<Issue>,
    ) -> ValidationReport {
        let total_score = self.total();
        let max_score = self.max_total();
        ValidationReport {
            kind,
            total_score,
            max_score,
            rating: scale.rate(total_score, max_score),
            categories: self.scores,
            issues,
        }
    }
}

/// Result of one validation run.
///
/// `categories` follows the rubric's table order; `issues` are in encounter
/// order (detector registration order, then top-to-bottom within a detector).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValidationReport {
    pub kind: ArtifactKind,
    pub total_score: u32,
    pub max_score: u32,
    pub rating: Rating,
    pub categories: Vec<CategoryScore>,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    /// Score as a whole-number percentage of the maximum, rounded down.
    pub fn percent(&self) -> u32 {
        if self.max_score == 0 {
            return 100;
        }
        let percent = u64::from(self.total_score) * 100 / u64::from(self.max_score);
        u32::try_from(percent).unwrap_or(u32::MAX)
    }

    pub fn category(&self, category: Category) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// `true` when any issue is CRITICAL or HIGH.
    pub fn has_blocking(&self) -> bool {
        self.issues.iter().any(|i| i.severity.is_blocking())
    }

    /// Issues in presentation order (stable by severity rank).
    pub fn sorted_issues(&self) -> Vec<Issue> {
        let mut issues = self.issues.clone();
        sort_by_severity(&mut issues);
        issues
    }
}
