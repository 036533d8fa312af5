use std::fmt;

use crate::issue::Severity;
use crate::scoring::ValidationReport;

/// What a caller should do with a scored artifact.
///
/// Variants are ordered from best to worst, so `max()` over several
/// verdicts yields the overall outcome.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    /// No blocking issues, but the score is below the threshold.
    Warning,
    Blocked,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => write!(f, "passed"),
            Verdict::Warning => write!(f, "warning"),
            Verdict::Blocked => write!(f, "blocked"),
        }
    }
}

/// `true` when `severity` blocks under the given strictness.
///
/// CRITICAL and HIGH always block; strict mode adds MODERATE and WARNING.
pub fn is_blocking(severity: Severity, strict: bool) -> bool {
    severity.is_blocking() || (strict && matches!(severity, Severity::Moderate | Severity::Warning))
}

/// Derives the verdict for `report`.
///
/// # Examples
///
/// ```
/// use oxidized_sf_audit::engine::validate;
/// use oxidized_sf_audit::policy::{verdict, Verdict};
/// use oxidized_sf_audit::rubric::Rubric;
///
/// let report = validate("", &Rubric::apex()).unwrap();
/// assert_eq!(verdict(&report, 67, false), Verdict::Passed);
/// ```
pub fn verdict(report: &ValidationReport, threshold_pct: u32, strict: bool) -> Verdict {
    if report.issues.iter().any(|i| is_blocking(i.severity, strict)) {
        Verdict::Blocked
    } else if u64::from(report.total_score) * 100
        < u64::from(threshold_pct) * u64::from(report.max_score)
    {
        Verdict::Warning
    } else {
        Verdict::Passed
    }
}
