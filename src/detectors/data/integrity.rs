use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{is_truthy, Payload, Tool};
use crate::detectors::{Check, Detector, Penalties};
use crate::issue::{Issue, Severity};
use crate::rubric::Category;
use crate::source::Source;

static RE_SOBJECT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(?:__c|__mdt|__e|__b|__x)?$").unwrap()
});

const INVALID_PAYLOAD: Check = Check {
    id: "data/invalid-payload",
    severity: Severity::High,
    category: Category::DataIntegrity,
    points: 10,
    message: "Payload is not a JSON object",
    remediation: "Send {\"tool\": ..., \"params\": {...}, \"context\": {...}}",
};

const UNKNOWN_TOOL: Check = Check {
    id: "data/unknown-tool",
    severity: Severity::High,
    category: Category::DataIntegrity,
    points: 10,
    message: "Tool is not a data operation",
    remediation: "Use soql_query or sobject_dml",
};

const MISSING_SOBJECT: Check = Check {
    id: "data/missing-sobject",
    severity: Severity::High,
    category: Category::DataIntegrity,
    points: 10,
    message: "Missing required 'sObject' parameter",
    remediation: "Name the target object in params.sObject",
};

const INVALID_SOBJECT_NAME: Check = Check {
    id: "data/invalid-sobject-name",
    severity: Severity::Warning,
    category: Category::DataIntegrity,
    points: 2,
    message: "sObject name does not look like an API name",
    remediation: "Use the API name (Account, Invoice__c, Setting__mdt)",
};

const MISSING_SF_USER: Check = Check {
    id: "data/missing-sf-user",
    severity: Severity::Warning,
    category: Category::DataIntegrity,
    points: 5,
    message: "Missing 'sf_user' parameter",
    remediation: "Set params.sf_user to choose the org connection explicitly",
};

const MISSING_RECORD_ID: Check = Check {
    id: "data/missing-record-id",
    severity: Severity::High,
    category: Category::DataIntegrity,
    points: 10,
    message: "Update/delete records without an 'Id' field",
    remediation: "Include the record Id in every record to update or delete",
};

const MISSING_EXTERNAL_ID_VALUE: Check = Check {
    id: "data/missing-external-id-value",
    severity: Severity::Warning,
    category: Category::DataIntegrity,
    points: 5,
    message: "Upsert records without the external ID field",
    remediation: "Populate the externalIdField on every upserted record",
};

const INCONSISTENT_FIELDS: Check = Check {
    id: "data/inconsistent-fields",
    severity: Severity::Warning,
    category: Category::DataIntegrity,
    points: 3,
    message: "Inserted records have different field sets",
    remediation: "Give every record the same fields",
};

static INTEGRITY_CHECKS: &[Check] = &[
    INVALID_PAYLOAD,
    UNKNOWN_TOOL,
    MISSING_SOBJECT,
    INVALID_SOBJECT_NAME,
    MISSING_SF_USER,
    MISSING_RECORD_ID,
    MISSING_EXTERNAL_ID_VALUE,
    INCONSISTENT_FIELDS,
];

const NO_CONTEXT: Check = Check {
    id: "data/no-context",
    severity: Severity::Warning,
    category: Category::Documentation,
    points: 5,
    message: "No context provided",
    remediation: "Add a context object with purpose and cleanup_planned",
};

const NO_PURPOSE: Check = Check {
    id: "data/no-purpose",
    severity: Severity::Warning,
    category: Category::Documentation,
    points: 5,
    message: "No operation purpose documented",
    remediation: "Add context.purpose to explain why this operation is being run",
};

static DOCUMENTATION_CHECKS: &[Check] = &[NO_CONTEXT, NO_PURPOSE];

pub struct IntegrityDetector;

impl Detector for IntegrityDetector {
    fn name(&self) -> &'static str {
        "data/integrity"
    }

    fn description(&self) -> &'static str {
        "Payload shape, target object, connection and record identity"
    }

    fn category(&self) -> Category {
        Category::DataIntegrity
    }

    fn checks(&self) -> &'static [Check] {
        INTEGRITY_CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let Some(payload) = Payload::from_source(source) else {
            return vec![INVALID_PAYLOAD.issue(
                penalties,
                0,
                "Payload is not a JSON object with tool, params and context",
            )];
        };
        let Some(tool) = Tool::from_name(payload.tool_name()) else {
            return vec![UNKNOWN_TOOL.issue(
                penalties,
                0,
                format!(
                    "Unknown tool: '{}'. Expected one of: {}",
                    payload.tool_name(),
                    Tool::NAMES.join(", ")
                ),
            )];
        };

        let mut issues = Vec::new();

        match payload.param("sObject") {
            sobject if !is_truthy(sobject) => {
                issues.push(MISSING_SOBJECT.issue(
                    penalties,
                    0,
                    "Missing required 'sObject' parameter",
                ));
            }
            Some(Value::String(name)) if !RE_SOBJECT_NAME.is_match(name) => {
                issues.push(INVALID_SOBJECT_NAME.issue(
                    penalties,
                    0,
                    format!("sObject name '{name}' doesn't match expected pattern"),
                ));
            }
            _ => {}
        }

        if !is_truthy(payload.param("sf_user")) {
            issues.push(MISSING_SF_USER.issue(
                penalties,
                0,
                "Missing 'sf_user' parameter - required for org connection",
            ));
        }

        if tool == Tool::SobjectDml && payload.records().is_some() {
            let operation = payload.operation();

            if matches!(operation, "update" | "delete") {
                let missing = payload
                    .record_objects()
                    .filter(|r| !r.contains_key("Id"))
                    .count();
                if missing > 0 {
                    issues.push(MISSING_RECORD_ID.issue(
                        penalties,
                        0,
                        format!("{missing} record(s) missing 'Id' field for {operation} operation"),
                    ));
                }
            }

            if operation == "upsert" {
                if let Some(field) = payload.param_str("externalIdField") {
                    let missing = payload
                        .record_objects()
                        .filter(|r| !r.contains_key(field))
                        .count();
                    if missing > 0 {
                        issues.push(MISSING_EXTERNAL_ID_VALUE.issue(
                            penalties,
                            0,
                            format!("{missing} record(s) missing external ID field '{field}'"),
                        ));
                    }
                }
            }

            if operation == "insert" && payload.records().is_some_and(|r| r.len() >= 2) {
                let field_sets: BTreeSet<Vec<&str>> = payload
                    .record_objects()
                    .map(|r| {
                        let mut keys: Vec<&str> = r.keys().map(String::as_str).collect();
                        keys.sort_unstable();
                        keys
                    })
                    .collect();
                if field_sets.len() > 1 {
                    issues.push(INCONSISTENT_FIELDS.issue(
                        penalties,
                        0,
                        "Inconsistent field names across records - some records have different fields",
                    ));
                }
            }
        }

        issues
    }
}

pub struct DocumentationDetector;

impl Detector for DocumentationDetector {
    fn name(&self) -> &'static str {
        "data/documentation"
    }

    fn description(&self) -> &'static str {
        "Purpose and context of the operation"
    }

    fn category(&self) -> Category {
        Category::Documentation
    }

    fn checks(&self) -> &'static [Check] {
        DOCUMENTATION_CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let Some((_, payload)) = Payload::supported(source) else {
            return Vec::new();
        };

        match payload.context() {
            None => vec![
                NO_CONTEXT.issue(
                    penalties,
                    0,
                    "No context provided - add purpose and cleanup plan",
                ),
                NO_PURPOSE.issue(penalties, 0, "No operation purpose documented"),
            ],
            Some(context) if !is_truthy(context.get("purpose")) => vec![NO_PURPOSE.issue(
                penalties,
                0,
                "No operation purpose documented in context",
            )],
            Some(_) => Vec::new(),
        }
    }
}
