//! Human-readable colored text formatter.
//!
//! Produces a terminal-friendly report with ANSI color codes: one section
//! per file with its score, category breakdown and issues (most severe
//! first), followed by unreadable paths and a one-line summary.

use colored::Colorize;

use crate::audit::{AuditSummary, FileReport};
use crate::issue::Severity;
use crate::policy::Verdict;

/// Formats an [`AuditSummary`] as human-readable, ANSI-colored text.
pub fn format(summary: &AuditSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{}\n",
        "  Salesforce Artifact Audit  ".bold().on_blue().white()
    ));
    out.push_str(&format!("  Timestamp: {}\n\n", summary.generated_at));

    for file in &summary.files {
        format_file(&mut out, file);
    }

    if !summary.errors.is_empty() {
        out.push_str(&format!(
            "{} ({} skipped)\n",
            "Errors".bold().underline(),
            summary.errors.len()
        ));
        for error in &summary.errors {
            out.push_str(&format!(
                "  [SKIP] {}  {}\n",
                error.file.display(),
                error.message.dimmed()
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Result: {}  |  {} files, {} critical, {} high, {} warnings, {} info\n",
        verdict_label(summary.status),
        summary.files.len(),
        summary.count_by_severity(Severity::Critical),
        summary.count_by_severity(Severity::High),
        summary.count_by_severity(Severity::Moderate) + summary.count_by_severity(Severity::Warning),
        summary.count_by_severity(Severity::Low) + summary.count_by_severity(Severity::Info),
    ));

    out
}

fn format_file(out: &mut String, file: &FileReport) {
    let report = &file.report;
    out.push_str(&format!(
        "[{}] {}  {}\n",
        verdict_label(file.verdict),
        file.file.display().to_string().bold(),
        format!("({})", report.kind).dimmed(),
    ));
    out.push_str(&format!(
        "  Score: {}/{} ({}%)  {}\n",
        report.total_score,
        report.max_score,
        report.percent(),
        report.rating.to_string().bold()
    ));

    for score in &report.categories {
        let points = format!("{:>3}/{:<3}", score.current, score.max_points);
        let points = if score.current == score.max_points {
            points.green().to_string()
        } else if score.current == 0 {
            points.red().to_string()
        } else {
            points.yellow().to_string()
        };
        out.push_str(&format!(
            "    {:<24} {points}\n",
            score.category.title()
        ));
    }

    let issues = report.sorted_issues();
    if !issues.is_empty() {
        out.push('\n');
    }
    for issue in &issues {
        out.push_str(&format!(
            "  [{}] {:<28} {}\n",
            severity_label(issue.severity),
            issue.rule_id.dimmed(),
            issue.message,
        ));
        if issue.line > 0 {
            out.push_str(&format!(
                "         {}\n",
                format!("{}:{}", file.file.display(), issue.line).dimmed()
            ));
        }
        if let Some(ref snippet) = issue.source {
            out.push_str(&format!("         > {}\n", snippet.dimmed()));
        }
        if let Some(ref fix) = issue.fix {
            out.push_str(&format!("         fix: {}\n", fix.dimmed()));
        }
    }
    out.push('\n');
}

fn verdict_label(verdict: Verdict) -> String {
    match verdict {
        Verdict::Passed => "PASSED".green().bold().to_string(),
        Verdict::Warning => "WARNING".yellow().bold().to_string(),
        Verdict::Blocked => "BLOCKED".red().bold().to_string(),
    }
}

/// Fixed-width colored severity tag.
pub fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Critical => "CRITICAL".red().bold().to_string(),
        Severity::High => "    HIGH".red().to_string(),
        Severity::Moderate => "MODERATE".yellow().bold().to_string(),
        Severity::Warning => " WARNING".yellow().to_string(),
        Severity::Low => "     LOW".blue().to_string(),
        Severity::Info => "    INFO".blue().to_string(),
    }
}
