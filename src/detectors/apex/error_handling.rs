use std::sync::LazyLock;

use regex::Regex;

use crate::detectors::{snippet, Check, Detector, Penalties};
use crate::issue::{Issue, Severity};
use crate::rubric::Category;
use crate::source::Source;

static RE_EMPTY_CATCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcatch\s*\([^)]*\)\s*\{\s*\}").unwrap());

// `catch (...) {` with nothing after the brace.
static RE_CATCH_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcatch\s*\([^)]*\)\s*\{\s*$").unwrap());

const EMPTY_CATCH: Check = Check {
    id: "apex/empty-catch",
    severity: Severity::Warning,
    category: Category::ErrorHandling,
    points: 5,
    message: "Empty catch block",
    remediation: "Log the exception or handle it appropriately",
};

static CHECKS: &[Check] = &[EMPTY_CATCH];

pub struct ErrorHandlingDetector;

impl Detector for ErrorHandlingDetector {
    fn name(&self) -> &'static str {
        "apex/error-handling"
    }

    fn description(&self) -> &'static str {
        "Exceptions caught and silently ignored"
    }

    fn category(&self) -> Category {
        Category::ErrorHandling
    }

    fn checks(&self) -> &'static [Check] {
        CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let lines: Vec<_> = source
            .code_lines()
            .map(|(line, _)| line)
            .filter(|line| !line.is_blank())
            .collect();
        let mut issues = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let code = line.code.as_str();
            let empty = RE_EMPTY_CATCH.is_match(code)
                || (RE_CATCH_OPEN.is_match(code)
                    && lines
                        .get(idx + 1)
                        .is_some_and(|next| next.code.trim() == "}"));
            if empty {
                let mut issue = EMPTY_CATCH.issue(
                    penalties,
                    line.number,
                    "Empty catch block - exceptions are silently swallowed",
                );
                issue.source = Some(snippet(line.raw));
                issues.push(issue);
            }
        }

        issues
    }
}
