//! The validation engine.
//!
//! One generic engine scores every artifact kind. It owns a validated
//! [`Rubric`] and the detectors registered for that rubric's kind; a run
//! pre-processes the text once, hands the shared [`Source`] to every
//! detector in registration order and applies each issue's deduction to the
//! detector's category as soon as the detector returns.

use std::borrow::Cow;

use tracing::debug;

use crate::detectors::{self, find_check, Detector};
use crate::error::ConfigError;
use crate::flow;
use crate::rubric::{ArtifactKind, Rubric};
use crate::scoring::{Scorecard, ValidationReport};
use crate::source::Source;

/// A rubric plus the detectors that score against it.
///
/// Construction validates the configuration; scoring itself cannot fail.
pub struct Validator {
    rubric: Rubric,
    detectors: Vec<Box<dyn Detector>>,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("rubric", &self.rubric)
            .field(
                "detectors",
                &self.detectors.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Validator {
    /// Builds a validator with the default detectors for `rubric.kind`.
    pub fn new(rubric: Rubric) -> Result<Self, ConfigError> {
        let detectors = detectors::detectors_for(rubric.kind);
        Validator::with_detectors(rubric, detectors)
    }

    /// Builds a validator with an explicit detector list.
    ///
    /// Fails when the budget table is malformed, when a detector scores a
    /// category the rubric does not budget, or when a penalty override names
    /// an unknown check.
    pub fn with_detectors(
        rubric: Rubric,
        detectors: Vec<Box<dyn Detector>>,
    ) -> Result<Self, ConfigError> {
        rubric.validate()?;

        for detector in &detectors {
            if rubric.budget(detector.category()).is_none() {
                return Err(ConfigError::CategoryNotInRubric {
                    kind: rubric.kind,
                    detector: detector.name(),
                    category: detector.category(),
                });
            }
        }

        if let Some(unknown) = rubric
            .penalties
            .check_ids()
            .find(|id| find_check(id).is_none())
        {
            return Err(ConfigError::UnknownCheck(unknown.to_string()));
        }

        Ok(Validator { rubric, detectors })
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn detectors(&self) -> &[Box<dyn Detector>] {
        &self.detectors
    }

    /// Scores one text buffer.
    ///
    /// Empty or whitespace-only input yields a full-score report with no
    /// issues. Flow input given as structured JSON metadata is converted to
    /// XML first.
    pub fn validate(&self, text: &str) -> ValidationReport {
        let mut card = Scorecard::new(&self.rubric.budgets);
        let mut issues = Vec::new();

        if text.trim().is_empty() {
            debug!(kind = %self.rubric.kind, "empty input");
            return card.into_report(self.rubric.kind, &self.rubric.scale, issues);
        }

        let text = match self.rubric.kind {
            ArtifactKind::Flow => flow::normalize_input(text),
            ArtifactKind::Apex | ArtifactKind::Data => Cow::Borrowed(text),
        };
        let source = Source::new(&text);

        for detector in &self.detectors {
            let found = detector.detect(&source, &self.rubric.penalties);
            let category = detector.category();
            for issue in &found {
                card.deduct(category, issue.points);
            }
            debug!(
                detector = detector.name(),
                issues = found.len(),
                remaining = card.current(category).unwrap_or(0),
                "detector finished"
            );
            issues.extend(found);
        }

        card.into_report(self.rubric.kind, &self.rubric.scale, issues)
    }
}

/// Scores `text` against `rubric` with the default detectors.
///
/// This is the single entry point for callers that score one buffer at a
/// time; build a [`Validator`] once to score many.
///
/// # Examples
///
/// ```
/// use oxidized_sf_audit::engine::validate;
/// use oxidized_sf_audit::rubric::{Category, Rubric};
///
/// let src = r#"public with sharing class Sync {
///     /** Pushes accounts. */
///     public void run(List<Account> accs) {
///         for (Account a : accs) {
///             update a;
///         }
///     }
/// }"#;
/// let report = validate(src, &Rubric::apex()).unwrap();
/// assert_eq!(report.issues.len(), 1);
/// assert_eq!(report.issues[0].rule_id, "apex/dml-in-loop");
/// assert_eq!(report.issues[0].line, 5);
/// assert_eq!(report.category(Category::Bulkification).unwrap().current, 15);
/// assert_eq!(report.total_score, 140);
/// ```
pub fn validate(text: &str, rubric: &Rubric) -> Result<ValidationReport, ConfigError> {
    Ok(Validator::new(rubric.clone())?.validate(text))
}
