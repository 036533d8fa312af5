use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::detectors::{snippet, Check, Detector, Penalties};
use crate::issue::{Issue, Severity};
use crate::rubric::Category;
use crate::source::Source;

static RE_SOQL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\[\s*SELECT\s+").unwrap());

// `for (Account a : [SELECT ...])`: the query is the iterable and runs once.
static RE_FOREACH_SOQL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfor\s*\([^:]+:\s*\[").unwrap());

// Matches on the verb, so `insert as user acc;` is caught like `insert acc;`.
static RE_DML: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:insert|update|delete|upsert|undelete)\s+[\w\[(]|\bDatabase\s*\.\s*(?:insert|update|delete|upsert|undelete)\w*\s*\(",
    )
    .unwrap()
});

const SOQL_IN_LOOP: Check = Check {
    id: "apex/soql-in-loop",
    severity: Severity::Critical,
    category: Category::Bulkification,
    points: 10,
    message: "SOQL query inside a loop",
    remediation: "Move SOQL before loop, query all needed records, filter in loop",
};

const DML_IN_LOOP: Check = Check {
    id: "apex/dml-in-loop",
    severity: Severity::Critical,
    category: Category::Bulkification,
    points: 10,
    message: "DML statement inside a loop",
    remediation: "Collect records in loop, perform single DML after loop",
};

static CHECKS: &[Check] = &[SOQL_IN_LOOP, DML_IN_LOOP];

pub struct BulkificationDetector;

impl Detector for BulkificationDetector {
    fn name(&self) -> &'static str {
        "apex/bulkification"
    }

    fn description(&self) -> &'static str {
        "SOQL and DML executed once per loop iteration"
    }

    fn category(&self) -> Category {
        Category::Bulkification
    }

    fn checks(&self) -> &'static [Check] {
        CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let mut issues = Vec::new();

        for (line, ctx) in source.code_lines() {
            if !ctx.in_loop {
                continue;
            }
            let code = line.code.as_str();

            if RE_SOQL.is_match(code) && !RE_FOREACH_SOQL.is_match(code) {
                trace!(line = line.number, header = ctx.loop_start_line, "soql in loop");
                let mut issue = SOQL_IN_LOOP.issue(
                    penalties,
                    line.number,
                    format!(
                        "SOQL query inside loop (loop started line {})",
                        ctx.loop_start_line
                    ),
                );
                issue.source = Some(snippet(line.raw));
                issues.push(issue);
            }

            if RE_DML.is_match(code) {
                trace!(line = line.number, header = ctx.loop_start_line, "dml in loop");
                let mut issue = DML_IN_LOOP.issue(
                    penalties,
                    line.number,
                    format!(
                        "DML inside loop (loop started line {})",
                        ctx.loop_start_line
                    ),
                );
                issue.source = Some(snippet(line.raw));
                issues.push(issue);
            }
        }

        issues
    }
}
