//! JSON output formatter.
//!
//! Produces a pretty-printed JSON document with a severity summary and the
//! full report of every validated file. Issues keep encounter order.

use crate::audit::{AuditSummary, FileError, FileReport};
use crate::issue::Severity;
use crate::policy::Verdict;

#[derive(serde::Serialize)]
struct JsonOutput<'a> {
    generated_at: &'a str,
    status: Verdict,
    strict: bool,
    passed: bool,
    summary: Summary,
    files: &'a [FileReport],
    errors: &'a [FileError],
}

#[derive(serde::Serialize)]
struct Summary {
    files: usize,
    issues: usize,
    critical: usize,
    high: usize,
    moderate: usize,
    warning: usize,
    low: usize,
    info: usize,
    errors: usize,
}

/// Formats an [`AuditSummary`] as pretty-printed JSON.
///
/// # Panics
///
/// Panics if the summary cannot be serialized (should not happen with valid data).
pub fn format(summary: &AuditSummary) -> String {
    let output = JsonOutput {
        generated_at: &summary.generated_at,
        status: summary.status,
        strict: summary.strict,
        passed: summary.passed,
        summary: Summary {
            files: summary.files.len(),
            issues: summary.issue_count(),
            critical: summary.count_by_severity(Severity::Critical),
            high: summary.count_by_severity(Severity::High),
            moderate: summary.count_by_severity(Severity::Moderate),
            warning: summary.count_by_severity(Severity::Warning),
            low: summary.count_by_severity(Severity::Low),
            info: summary.count_by_severity(Severity::Info),
            errors: summary.errors.len(),
        },
        files: &summary.files,
        errors: &summary.errors,
    };

    serde_json::to_string_pretty(&output).expect("JSON serialization failed")
}
