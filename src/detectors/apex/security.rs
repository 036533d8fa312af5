use std::sync::LazyLock;

use regex::Regex;

use super::RE_CLASS_DECL;
use crate::detectors::{snippet, Check, Detector, Penalties};
use crate::issue::{Issue, Severity};
use crate::rubric::Category;
use crate::source::Source;

static RE_SHARING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:with\s+sharing|without\s+sharing|inherited\s+sharing)\b").unwrap()
});

static RE_WITHOUT_SHARING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bwithout\s+sharing\b").unwrap());

static RE_DYNAMIC_SOQL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bDatabase\s*\.\s*query\s*\(").unwrap());

static RE_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bescapeSingleQuotes\b").unwrap());

const MISSING_SHARING: Check = Check {
    id: "apex/missing-sharing",
    severity: Severity::Warning,
    category: Category::Security,
    points: 5,
    message: "Outer class has no explicit sharing declaration",
    remediation: "Add \"with sharing\" (recommended) or \"inherited sharing\" to class declaration",
};

const WITHOUT_SHARING: Check = Check {
    id: "apex/without-sharing",
    severity: Severity::Warning,
    category: Category::Security,
    points: 5,
    message: "Outer class runs without sharing",
    remediation: "Use \"with sharing\" by default, \"inherited sharing\" for utilities",
};

const INNER_WITHOUT_SHARING: Check = Check {
    id: "apex/inner-without-sharing",
    severity: Severity::Warning,
    category: Category::Security,
    points: 5,
    message: "Inner class explicitly opts into without sharing",
    remediation: "Inner classes inherit sharing from the outer class by default",
};

const SOQL_INJECTION: Check = Check {
    id: "apex/soql-injection",
    severity: Severity::Warning,
    category: Category::Security,
    points: 5,
    message: "Dynamic SOQL without evident escaping",
    remediation: "Use String.escapeSingleQuotes() or bind variables",
};

static CHECKS: &[Check] = &[
    MISSING_SHARING,
    WITHOUT_SHARING,
    INNER_WITHOUT_SHARING,
    SOQL_INJECTION,
];

pub struct SecurityDetector;

impl Detector for SecurityDetector {
    fn name(&self) -> &'static str {
        "apex/security"
    }

    fn description(&self) -> &'static str {
        "Sharing declarations and dynamic SOQL injection"
    }

    fn category(&self) -> Category {
        Category::Security
    }

    fn checks(&self) -> &'static [Check] {
        CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let mut issues = Vec::new();
        let escapes_input = RE_ESCAPE.is_match(source.text);
        let mut seen_outer = false;

        for (line, _) in source.code_lines() {
            let code = line.code.as_str();

            if RE_CLASS_DECL.is_match(code) {
                let has_sharing = RE_SHARING.is_match(code);
                let is_without = RE_WITHOUT_SHARING.is_match(code);
                let check = if !seen_outer {
                    seen_outer = true;
                    if !has_sharing {
                        Some((MISSING_SHARING, "Class missing explicit sharing declaration"))
                    } else if is_without {
                        Some((
                            WITHOUT_SHARING,
                            "Class uses \"without sharing\" - ensure this is intentional",
                        ))
                    } else {
                        None
                    }
                } else if is_without {
                    Some((
                        INNER_WITHOUT_SHARING,
                        "Inner class uses \"without sharing\" - ensure this is intentional",
                    ))
                } else {
                    None
                };

                if let Some((check, message)) = check {
                    let mut issue = check.issue(penalties, line.number, message);
                    issue.source = Some(snippet(line.raw));
                    issues.push(issue);
                }
            }

            if !escapes_input && RE_DYNAMIC_SOQL.is_match(code) {
                let mut issue = SOQL_INJECTION.issue(
                    penalties,
                    line.number,
                    "Dynamic SOQL without evident escape - potential injection risk",
                );
                issue.source = Some(snippet(line.raw));
                issues.push(issue);
            }
        }

        issues
    }
}
