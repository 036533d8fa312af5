use std::fmt;

use crate::rubric::Category;

/// Issue severity, most severe first.
///
/// `Moderate` and `Warning` share a [rank](Severity::rank): the Apex and Flow
/// rubrics use `WARNING` where older data rubrics used `MODERATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Moderate,
    Warning,
    Low,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Critical,
        Severity::High,
        Severity::Moderate,
        Severity::Warning,
        Severity::Low,
        Severity::Info,
    ];

    /// Presentation rank: lower sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Moderate | Severity::Warning => 2,
            Severity::Low => 3,
            Severity::Info => 4,
        }
    }

    /// `true` for severities that block a deployment outright.
    pub fn is_blocking(self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Moderate => "MODERATE",
            Severity::Warning => "WARNING",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rubric violation.
///
/// `line` is 1-based; `0` marks issues that are not tied to a source line
/// (data-operation payloads, whole-document Flow checks).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Issue {
    pub rule_id: String,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub line: usize,
    /// Points deducted from `category` when this issue was raised.
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Stable sort by [`Severity::rank`]; issues of equal rank keep encounter order.
///
/// # Examples
///
/// ```
/// use oxidized_sf_audit::issue::{sort_by_severity, Issue, Severity};
/// use oxidized_sf_audit::rubric::Category;
///
/// let issue = |severity, line| Issue {
///     rule_id: "demo".into(),
///     severity,
///     category: Category::Documentation,
///     message: String::new(),
///     line,
///     points: 0,
///     fix: None,
///     source: None,
/// };
/// let mut issues = vec![issue(Severity::Info, 1), issue(Severity::Critical, 2), issue(Severity::Info, 3)];
/// sort_by_severity(&mut issues);
/// let lines: Vec<_> = issues.iter().map(|i| i.line).collect();
/// assert_eq!(lines, [2, 1, 3]);
/// ```
pub fn sort_by_severity(issues: &mut [Issue]) {
    issues.sort_by_key(|i| i.severity.rank());
}
