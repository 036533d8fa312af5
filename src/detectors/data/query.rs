use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{Payload, Tool};
use crate::detectors::{Check, Detector, Penalties};
use crate::issue::{Issue, Severity};
use crate::rubric::Category;
use crate::source::Source;

/// Largest `limit` that stays clear of the query-rows governor limit.
const MAX_LIMIT: f64 = 50_000.0;

static RE_HARDCODED_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'[a-zA-Z0-9]{15}'|'[a-zA-Z0-9]{18}'").unwrap());

static RE_INDEXED_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:Id|Name|OwnerId|CreatedDate|LastModifiedDate|SystemModstamp|RecordTypeId)\b",
    )
    .unwrap()
});

static RE_DOUBLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"=\s*"[^"]*""#).unwrap());

const NO_WHERE_CLAUSE: Check = Check {
    id: "data/no-where-clause",
    severity: Severity::Warning,
    category: Category::QueryEfficiency,
    points: 5,
    message: "Query has no whereClause",
    remediation: "Add a whereClause to filter results and improve selectivity",
};

const HARDCODED_ID: Check = Check {
    id: "data/hardcoded-id",
    severity: Severity::Warning,
    category: Category::QueryEfficiency,
    points: 5,
    message: "Hardcoded record Id in whereClause",
    remediation: "Use dynamic references instead of hardcoded record IDs",
};

const UNINDEXED_FILTER: Check = Check {
    id: "data/unindexed-filter",
    severity: Severity::Warning,
    category: Category::QueryEfficiency,
    points: 3,
    message: "whereClause does not reference an indexed field",
    remediation: "Filter on an indexed field for better query performance",
};

const DOUBLE_EQUALS: Check = Check {
    id: "data/double-equals",
    severity: Severity::Warning,
    category: Category::QueryEfficiency,
    points: 5,
    message: "'==' operator in whereClause",
    remediation: "SOQL compares with a single '='",
};

const DOUBLE_QUOTED_STRING: Check = Check {
    id: "data/double-quoted-string",
    severity: Severity::Warning,
    category: Category::QueryEfficiency,
    points: 2,
    message: "Double-quoted string literal in whereClause",
    remediation: "SOQL string literals use single quotes",
};

const UNBALANCED_PARENS: Check = Check {
    id: "data/unbalanced-parens",
    severity: Severity::Warning,
    category: Category::QueryEfficiency,
    points: 5,
    message: "Unbalanced parentheses in whereClause",
    remediation: "Match every '(' with a ')'",
};

const NO_LIMIT: Check = Check {
    id: "data/no-limit",
    severity: Severity::Warning,
    category: Category::QueryEfficiency,
    points: 3,
    message: "Query has no limit",
    remediation: "Add a limit to prevent unexpected large result sets",
};

const EXCESSIVE_LIMIT: Check = Check {
    id: "data/excessive-limit",
    severity: Severity::Warning,
    category: Category::QueryEfficiency,
    points: 5,
    message: "Query limit above 50,000 rows",
    remediation: "Lower the limit or page through results",
};

const NO_FIELDS: Check = Check {
    id: "data/no-fields",
    severity: Severity::Warning,
    category: Category::QueryEfficiency,
    points: 2,
    message: "Query selects no explicit fields",
    remediation: "Specify only the fields you need for better performance",
};

static CHECKS: &[Check] = &[
    NO_WHERE_CLAUSE,
    HARDCODED_ID,
    UNINDEXED_FILTER,
    DOUBLE_EQUALS,
    DOUBLE_QUOTED_STRING,
    UNBALANCED_PARENS,
    NO_LIMIT,
    EXCESSIVE_LIMIT,
    NO_FIELDS,
];

pub struct QueryEfficiencyDetector;

impl Detector for QueryEfficiencyDetector {
    fn name(&self) -> &'static str {
        "data/query"
    }

    fn description(&self) -> &'static str {
        "soql_query selectivity, limits and whereClause syntax"
    }

    fn category(&self) -> Category {
        Category::QueryEfficiency
    }

    fn checks(&self) -> &'static [Check] {
        CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let Some((Tool::SoqlQuery, payload)) = Payload::supported(source) else {
            return Vec::new();
        };
        let mut issues = Vec::new();

        match payload.param_str("whereClause") {
            None => issues.push(NO_WHERE_CLAUSE.issue(
                penalties,
                0,
                "No whereClause - query will scan all records",
            )),
            Some(clause) => {
                if RE_HARDCODED_ID.is_match(clause) {
                    issues.push(HARDCODED_ID.issue(
                        penalties,
                        0,
                        "Hardcoded Salesforce IDs in whereClause",
                    ));
                }
                if !RE_INDEXED_FIELD.is_match(clause) {
                    issues.push(UNINDEXED_FILTER.issue(
                        penalties,
                        0,
                        "whereClause does not reference indexed fields (Id, Name, CreatedDate, OwnerId, RecordTypeId, etc.)",
                    ));
                }
                if clause.contains("==") {
                    issues.push(DOUBLE_EQUALS.issue(
                        penalties,
                        0,
                        "Invalid '==' operator in whereClause - SOQL uses '='",
                    ));
                }
                if RE_DOUBLE_QUOTED.is_match(clause) {
                    issues.push(DOUBLE_QUOTED_STRING.issue(
                        penalties,
                        0,
                        "Double-quoted string in whereClause - SOQL uses single quotes",
                    ));
                }
                if clause.matches('(').count() != clause.matches(')').count() {
                    issues.push(UNBALANCED_PARENS.issue(
                        penalties,
                        0,
                        "Unbalanced parentheses in whereClause",
                    ));
                }
            }
        }

        match payload.param("limit") {
            None => issues.push(NO_LIMIT.issue(
                penalties,
                0,
                "No limit specified - large result sets may cause issues",
            )),
            Some(limit) => {
                if let Some(n) = limit.as_f64().filter(|n| *n > MAX_LIMIT) {
                    issues.push(EXCESSIVE_LIMIT.issue(
                        penalties,
                        0,
                        format!("Excessive limit ({n}) - may exceed governor limits"),
                    ));
                }
            }
        }

        let no_fields = match payload.param("fields") {
            None => true,
            Some(Value::Array(fields)) => fields.is_empty(),
            Some(_) => false,
        };
        if no_fields {
            issues.push(NO_FIELDS.issue(
                penalties,
                0,
                "No fields specified - selecting all fields",
            ));
        }

        issues
    }
}
