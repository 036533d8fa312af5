//! Audit orchestration.
//!
//! [`run_audit`] is the entry point for validating many files at once. It
//! collects artifacts from the given paths, builds one
//! [`Validator`](crate::engine::Validator) per artifact kind from the
//! configuration, scores every file in parallel via [rayon] and produces an
//! [`AuditSummary`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::engine::Validator;
use crate::error::ConfigError;
use crate::issue::Severity;
use crate::policy::{self, Verdict};
use crate::rubric::ArtifactKind;
use crate::scoring::ValidationReport;

/// A file selected for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

/// Validation result for one file.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub verdict: Verdict,
    #[serde(flatten)]
    pub report: ValidationReport,
}

/// A path that could not be validated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileError {
    pub file: PathBuf,
    pub message: String,
}

#[derive(Debug, serde::Serialize)]
pub struct AuditSummary {
    pub generated_at: String,
    pub strict: bool,
    /// Worst verdict over all files; `passed` when nothing was validated.
    pub status: Verdict,
    pub files: Vec<FileReport>,
    pub errors: Vec<FileError>,
    pub passed: bool,
}

impl AuditSummary {
    pub fn from_results(files: Vec<FileReport>, errors: Vec<FileError>, strict: bool) -> Self {
        let status = files
            .iter()
            .map(|f| f.verdict)
            .max()
            .unwrap_or(Verdict::Passed);
        AuditSummary {
            generated_at: chrono::Utc::now().to_rfc3339(),
            strict,
            status,
            passed: status != Verdict::Blocked,
            files,
            errors,
        }
    }

    pub fn issue_count(&self) -> usize {
        self.files.iter().map(|f| f.report.issues.len()).sum()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.files
            .iter()
            .map(|f| f.report.count_by_severity(severity))
            .sum()
    }
}

/// Expands `paths` into the artifacts to validate.
///
/// Directories are walked recursively and contribute Apex and Flow files
/// (or, with a `kind` override, files of that kind only). Explicit files
/// are always taken; their kind comes from `kind` or their extension.
/// Paths that do not exist or whose kind cannot be guessed are returned as
/// errors.
pub fn collect_artifacts(
    paths: &[PathBuf],
    kind: Option<ArtifactKind>,
) -> (Vec<Artifact>, Vec<FileError>) {
    let mut artifacts = Vec::new();
    let mut errors = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let guessed = ArtifactKind::from_path(entry.path());
                let wanted = match kind {
                    Some(k) => guessed == Some(k),
                    None => matches!(guessed, Some(ArtifactKind::Apex | ArtifactKind::Flow)),
                };
                if let (true, Some(k)) = (wanted, guessed) {
                    artifacts.push(Artifact {
                        path: entry.into_path(),
                        kind: k,
                    });
                }
            }
        } else if path.is_file() {
            match kind.or_else(|| ArtifactKind::from_path(path)) {
                Some(k) => artifacts.push(Artifact {
                    path: path.clone(),
                    kind: k,
                }),
                None => errors.push(FileError {
                    file: path.clone(),
                    message: "cannot determine artifact kind (use --kind)".to_string(),
                }),
            }
        } else {
            errors.push(FileError {
                file: path.clone(),
                message: "no such file or directory".to_string(),
            });
        }
    }

    (artifacts, errors)
}

/// Validates every artifact under `paths`.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the configuration cannot produce a
/// validator for one of the artifact kinds found. Unreadable files are not
/// errors; they are listed in [`AuditSummary::errors`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::PathBuf;
/// use oxidized_sf_audit::{audit, config::Config};
///
/// let config = Config::load(None).unwrap();
/// let summary = audit::run_audit(&[PathBuf::from("force-app")], None, &config).unwrap();
///
/// std::process::exit(if summary.passed { 0 } else { 1 });
/// ```
pub fn run_audit(
    paths: &[PathBuf],
    kind: Option<ArtifactKind>,
    config: &Config,
) -> Result<AuditSummary, ConfigError> {
    let (artifacts, mut errors) = collect_artifacts(paths, kind);
    debug!(files = artifacts.len(), "artifacts collected");

    let mut validators = BTreeMap::new();
    for artifact in &artifacts {
        if !validators.contains_key(&artifact.kind) {
            validators.insert(artifact.kind, config.validator(artifact.kind)?);
        }
    }

    let results: Vec<Result<FileReport, FileError>> = artifacts
        .par_iter()
        .map(|artifact| {
            let validator = &validators[&artifact.kind];
            validate_file(&artifact.path, validator, config)
        })
        .collect();

    let mut files = Vec::new();
    for result in results {
        match result {
            Ok(file) => files.push(file),
            Err(e) => errors.push(e),
        }
    }

    Ok(AuditSummary::from_results(files, errors, config.strict.enabled))
}

fn validate_file(path: &Path, validator: &Validator, config: &Config) -> Result<FileReport, FileError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        warn!(file = %path.display(), error = %e, "skipping unreadable file");
        FileError {
            file: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    let kind = validator.rubric().kind;
    let report = validator.validate(&text);
    let verdict = policy::verdict(&report, config.threshold(kind), config.strict.enabled);
    Ok(FileReport {
        file: path.to_path_buf(),
        verdict,
        report,
    })
}
