//! Pluggable rule detectors.
//!
//! Every detector implements the [`Detector`] trait and scores exactly one
//! [`Category`]. Detectors are grouped by artifact kind:
//!
//! - [`apex`]: bulkification, sharing and injection, naming, error handling,
//!   documentation.
//! - [`flow`]: description, loop bodies, fault paths.
//! - [`data`]: data-operation payload checks.
//!
//! Use [`detectors_for`] to obtain the default detectors of one kind and
//! [`all_rules`] to list every check they define.

pub mod apex;
pub mod data;
pub mod flow;

use std::collections::BTreeMap;

use crate::issue::{Issue, Severity};
use crate::rubric::{ArtifactKind, Category};
use crate::source::Source;

/// Static metadata of one check a detector can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Check {
    /// Unique rule identifier (e.g., `"apex/soql-in-loop"`).
    pub id: &'static str,
    pub severity: Severity,
    pub category: Category,
    /// Default deduction per occurrence; see [`Penalties`].
    pub points: u32,
    /// Short description of what the check looks for.
    pub message: &'static str,
    /// Guidance on how to fix a violation. Becomes the issue's `fix` hint.
    pub remediation: &'static str,
}

impl Check {
    /// Builds an issue for this check at `line` (`0` for non-line issues).
    pub fn issue(&self, penalties: &Penalties, line: usize, message: impl Into<String>) -> Issue {
        Issue {
            rule_id: self.id.to_string(),
            severity: self.severity,
            category: self.category,
            message: message.into(),
            line,
            points: penalties.points(self),
            fix: (!self.remediation.is_empty()).then(|| self.remediation.to_string()),
            source: None,
        }
    }
}

/// Per-check deduction overrides.
///
/// Deduction magnitudes are configuration data. Checks not listed here
/// deduct their [`Check::points`] default.
///
/// # Examples
///
/// ```
/// use oxidized_sf_audit::detectors::{find_check, Penalties};
///
/// let check = find_check("apex/soql-in-loop").unwrap();
/// let mut penalties = Penalties::default();
/// assert_eq!(penalties.points(check), 10);
/// penalties.set("apex/soql-in-loop", 25);
/// assert_eq!(penalties.points(check), 25);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Penalties(BTreeMap<String, u32>);

impl Penalties {
    pub fn set(&mut self, check_id: impl Into<String>, points: u32) {
        self.0.insert(check_id.into(), points);
    }

    pub fn points(&self, check: &Check) -> u32 {
        self.0.get(check.id).copied().unwrap_or(check.points)
    }

    pub fn check_ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A pluggable rule detector.
///
/// Implementers **must** be [`Send`] + [`Sync`] because
/// [`audit::run_audit`](crate::audit::run_audit) validates files in parallel
/// via [rayon].
///
/// A detector is pure: the same [`Source`] and [`Penalties`] always produce
/// the same issues in the same order. Detectors never see each other's
/// results; the engine applies each issue's deduction to the detector's
/// [`category`](Detector::category).
pub trait Detector: Send + Sync {
    /// Unique identifier (e.g., `"apex/bulkification"`), used by
    /// `[detectors] disabled` in the config file.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// The one category this detector deducts from.
    fn category(&self) -> Category;

    /// Every check this detector can raise.
    fn checks(&self) -> &'static [Check];

    /// Scans `source` and returns issues in top-to-bottom order.
    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue>;
}

/// Returns the default detectors for `kind`, in registration order.
///
/// Registration order is the order issues appear in a report.
pub fn detectors_for(kind: ArtifactKind) -> Vec<Box<dyn Detector>> {
    match kind {
        ArtifactKind::Apex => apex::detectors(),
        ArtifactKind::Flow => flow::detectors(),
        ArtifactKind::Data => data::detectors(),
    }
}

/// Every registered detector of every kind.
pub fn all_detectors() -> Vec<(ArtifactKind, Box<dyn Detector>)> {
    ArtifactKind::ALL
        .into_iter()
        .flat_map(|kind| detectors_for(kind).into_iter().map(move |d| (kind, d)))
        .collect()
}

/// Metadata for a single check.
///
/// Returned by [`all_rules`] and used by the `list-rules` and `explain`
/// CLI commands.
#[derive(Debug, Clone, Copy)]
pub struct RuleInfo {
    pub kind: ArtifactKind,
    /// Detector that raises this check.
    pub detector: &'static str,
    pub check: &'static Check,
}

/// Aggregates [`RuleInfo`] from every detector.
pub fn all_rules() -> Vec<RuleInfo> {
    all_detectors()
        .into_iter()
        .flat_map(|(kind, detector)| {
            let name = detector.name();
            detector.checks().iter().map(move |check| RuleInfo {
                kind,
                detector: name,
                check,
            })
        })
        .collect()
}

/// Looks up a check by id across every detector.
pub fn find_check(id: &str) -> Option<&'static Check> {
    all_rules()
        .into_iter()
        .map(|r| r.check)
        .find(|c| c.id == id)
}

/// Trims a source line for display, truncating long lines at a char boundary.
pub(crate) fn snippet(line: &str) -> String {
    let line = line.trim();
    if line.chars().count() > 120 {
        let cut = line
            .char_indices()
            .nth(117)
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        format!("{}...", &line[..cut])
    } else {
        line.to_string()
    }
}
