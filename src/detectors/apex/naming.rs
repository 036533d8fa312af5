use std::collections::HashSet;

use super::{RE_CLASS_DECL, RE_METHOD_DECL};
use crate::detectors::{snippet, Check, Detector, Penalties};
use crate::issue::{Issue, Severity};
use crate::rubric::Category;
use crate::source::Source;

const CLASS_NAMING: Check = Check {
    id: "apex/class-naming",
    severity: Severity::Info,
    category: Category::CleanCode,
    points: 2,
    message: "Class name is not PascalCase",
    remediation: "Start class names with an upper-case letter (AccountService)",
};

const METHOD_NAMING: Check = Check {
    id: "apex/method-naming",
    severity: Severity::Info,
    category: Category::CleanCode,
    points: 2,
    message: "Method name is not camelCase",
    remediation: "Start method names with a lower-case letter (getAccounts)",
};

static CHECKS: &[Check] = &[CLASS_NAMING, METHOD_NAMING];

fn starts_upper(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

pub struct NamingDetector;

impl Detector for NamingDetector {
    fn name(&self) -> &'static str {
        "apex/naming"
    }

    fn description(&self) -> &'static str {
        "Class and method naming conventions"
    }

    fn category(&self) -> Category {
        Category::CleanCode
    }

    fn checks(&self) -> &'static [Check] {
        CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        // Constructors share their class's name.
        let class_names: HashSet<String> = source
            .code_lines()
            .filter_map(|(line, _)| RE_CLASS_DECL.captures(&line.code))
            .map(|caps| caps[1].to_lowercase())
            .collect();

        let mut issues = Vec::new();

        for (line, _) in source.code_lines() {
            let code = line.code.as_str();

            if let Some(caps) = RE_CLASS_DECL.captures(code) {
                let name = &caps[1];
                if !starts_upper(name) {
                    let mut issue = CLASS_NAMING.issue(
                        penalties,
                        line.number,
                        format!("Class name \"{name}\" should be PascalCase"),
                    );
                    issue.source = Some(snippet(line.raw));
                    issues.push(issue);
                }
                continue;
            }

            if let Some(caps) = RE_METHOD_DECL.captures(code) {
                let name = &caps[2];
                if starts_upper(name) && !class_names.contains(&name.to_lowercase()) {
                    let mut issue = METHOD_NAMING.issue(
                        penalties,
                        line.number,
                        format!("Method name \"{name}\" should be camelCase"),
                    );
                    issue.source = Some(snippet(line.raw));
                    issues.push(issue);
                }
            }
        }

        issues
    }
}
