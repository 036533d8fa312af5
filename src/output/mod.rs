//! Rendering of [`AuditSummary`] values.
//!
//! Every format carries the same information: one entry per validated file
//! with its artifact kind, score, rating, per-category points and verdict,
//! plus paths that were skipped and the worst verdict over the whole run.
//!
//! | Format | Module | Issue order | Consumer |
//! |--------|--------|-------------|----------|
//! | [`Pretty`](OutputFormat::Pretty) | [`pretty`] | most severe first | terminal |
//! | [`Json`](OutputFormat::Json)     | [`json`]   | as detected       | scripts, dashboards |
//! | [`Sarif`](OutputFormat::Sarif)   | [`sarif`]  | as detected       | code-scanning upload |
//!
//! Issues without a line (Flow-level and data-operation findings) get no
//! region in SARIF and no `line` suffix in pretty output.

pub mod json;
pub mod pretty;
pub mod sarif;

use crate::audit::AuditSummary;

/// Output format selected with `--format`.
#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored text with per-category scores.
    Pretty,
    /// Machine-readable JSON.
    Json,
    /// [SARIF 2.1.0](https://sarifweb.azurewebsites.net/) for CI/CD tool integration.
    Sarif,
}

/// Formats an [`AuditSummary`] in the requested [`OutputFormat`].
///
/// # Examples
///
/// ```rust,no_run
/// use oxidized_sf_audit::output::{format_summary, OutputFormat};
/// # use oxidized_sf_audit::audit::AuditSummary;
/// # fn example(summary: &AuditSummary) {
/// let json = format_summary(summary, &OutputFormat::Json);
/// println!("{json}");
/// # }
/// ```
pub fn format_summary(summary: &AuditSummary, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Pretty => pretty::format(summary),
        OutputFormat::Json => json::format(summary),
        OutputFormat::Sarif => sarif::format(summary),
    }
}
