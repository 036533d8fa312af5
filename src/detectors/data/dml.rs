use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{is_truthy, Payload, Tool, VALID_DML_OPERATIONS};
use crate::detectors::{Check, Detector, Penalties};
use crate::issue::{Issue, Severity};
use crate::rubric::Category;
use crate::source::Source;

/// Records per transaction above which an operation risks governor limits.
const MAX_RECORDS: usize = 10_000;

/// Smallest insert that crosses the 200-record trigger batch boundary.
const BULK_TEST_SIZE: usize = 201;

static RE_SSN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());

static RE_CREDIT_CARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b").unwrap());

static RE_PERSONAL_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[A-Za-z0-9._%+-]+@(?:gmail|yahoo|hotmail|outlook|aol)\.(?:com|net|org)\b")
        .unwrap()
});

static RE_CLEANUP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:test|tmp|seed|demo|sample)").unwrap());

const INVALID_OPERATION: Check = Check {
    id: "data/invalid-operation",
    severity: Severity::High,
    category: Category::BulkSafety,
    points: 10,
    message: "DML operation is not insert, update, delete or upsert",
    remediation: "Set params.operation to insert, update, delete or upsert",
};

const EMPTY_RECORDS: Check = Check {
    id: "data/empty-records",
    severity: Severity::High,
    category: Category::BulkSafety,
    points: 10,
    message: "Empty or missing records array",
    remediation: "Pass the records to write in params.records",
};

const TOO_MANY_RECORDS: Check = Check {
    id: "data/too-many-records",
    severity: Severity::Warning,
    category: Category::BulkSafety,
    points: 5,
    message: "More than 10,000 records in one operation",
    remediation: "Break into batches of 200 records for large operations",
};

const UPSERT_MISSING_EXTERNAL_ID: Check = Check {
    id: "data/upsert-missing-external-id",
    severity: Severity::High,
    category: Category::BulkSafety,
    points: 10,
    message: "Upsert without externalIdField",
    remediation: "Name the external ID field in params.externalIdField",
};

static BULK_CHECKS: &[Check] = &[
    INVALID_OPERATION,
    EMPTY_RECORDS,
    TOO_MANY_RECORDS,
    UPSERT_MISSING_EXTERNAL_ID,
];

const PII_SSN: Check = Check {
    id: "data/pii-ssn",
    severity: Severity::High,
    category: Category::SecurityFls,
    points: 10,
    message: "SSN pattern in record values",
    remediation: "Remove SSN data - use synthetic test data instead",
};

const PII_CREDIT_CARD: Check = Check {
    id: "data/pii-credit-card",
    severity: Severity::High,
    category: Category::SecurityFls,
    points: 10,
    message: "Credit card pattern in record values",
    remediation: "Remove Credit card data - use synthetic test data instead",
};

const PII_PERSONAL_EMAIL: Check = Check {
    id: "data/pii-personal-email",
    severity: Severity::Warning,
    category: Category::SecurityFls,
    points: 5,
    message: "Personal email address in record values",
    remediation: "Remove Personal email data - use synthetic test data instead",
};

static PII_CHECKS: &[Check] = &[PII_SSN, PII_CREDIT_CARD, PII_PERSONAL_EMAIL];

struct PiiPattern {
    label: &'static str,
    regex: &'static LazyLock<Regex>,
    check: &'static Check,
}

// Checked in order; a value counts towards the first pattern it matches.
static PII_PATTERNS: &[PiiPattern] = &[
    PiiPattern {
        label: "SSN",
        regex: &RE_SSN,
        check: &PII_SSN,
    },
    PiiPattern {
        label: "Credit card",
        regex: &RE_CREDIT_CARD,
        check: &PII_CREDIT_CARD,
    },
    PiiPattern {
        label: "Personal email",
        regex: &RE_PERSONAL_EMAIL,
        check: &PII_PERSONAL_EMAIL,
    },
];

const SMALL_BATCH: Check = Check {
    id: "data/small-batch",
    severity: Severity::Warning,
    category: Category::TestPatterns,
    points: 5,
    message: "Test insert does not cross the 200-record batch boundary",
    remediation: "Insert 201+ records to exercise bulk trigger paths",
};

const IDENTICAL_RECORDS: Check = Check {
    id: "data/identical-records",
    severity: Severity::Warning,
    category: Category::TestPatterns,
    points: 3,
    message: "All records have identical field values",
    remediation: "Vary field values (e.g., mix of Industries, Types, Ratings) for better test coverage",
};

const IDENTICAL_NAMES: Check = Check {
    id: "data/identical-names",
    severity: Severity::Warning,
    category: Category::TestPatterns,
    points: 2,
    message: "All records have the same Name",
    remediation: "Give each record a distinct Name",
};

static TEST_CHECKS: &[Check] = &[SMALL_BATCH, IDENTICAL_RECORDS, IDENTICAL_NAMES];

const NO_CLEANUP_NAME: Check = Check {
    id: "data/no-cleanup-name",
    severity: Severity::Warning,
    category: Category::CleanupIsolation,
    points: 5,
    message: "No record uses a cleanup-friendly Name",
    remediation: "Prefix record Names with 'Test' so they can be queried and deleted later",
};

const NO_CLEANUP_PLAN: Check = Check {
    id: "data/no-cleanup-plan",
    severity: Severity::Warning,
    category: Category::CleanupIsolation,
    points: 5,
    message: "No cleanup plan in context",
    remediation: "Set context.cleanup_planned = true and plan a DELETE query after testing",
};

static CLEANUP_CHECKS: &[Check] = &[NO_CLEANUP_NAME, NO_CLEANUP_PLAN];

pub struct BulkSafetyDetector;

impl Detector for BulkSafetyDetector {
    fn name(&self) -> &'static str {
        "data/bulk"
    }

    fn description(&self) -> &'static str {
        "sobject_dml operation, record count and upsert key"
    }

    fn category(&self) -> Category {
        Category::BulkSafety
    }

    fn checks(&self) -> &'static [Check] {
        BULK_CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let Some((Tool::SobjectDml, payload)) = Payload::supported(source) else {
            return Vec::new();
        };
        let mut issues = Vec::new();
        let operation = payload.operation();

        if !VALID_DML_OPERATIONS.contains(&operation) {
            issues.push(INVALID_OPERATION.issue(
                penalties,
                0,
                format!(
                    "Invalid operation: '{operation}'. Expected one of: {}",
                    VALID_DML_OPERATIONS.join(", ")
                ),
            ));
        }

        match payload.records() {
            None => issues.push(EMPTY_RECORDS.issue(
                penalties,
                0,
                "Empty or missing records array",
            )),
            Some(records) if records.len() > MAX_RECORDS => issues.push(TOO_MANY_RECORDS.issue(
                penalties,
                0,
                format!(
                    "Record count ({}) exceeds 10,000 - may hit governor limits in a single transaction",
                    records.len()
                ),
            )),
            Some(_) => {}
        }

        if operation == "upsert" && payload.param_str("externalIdField").is_none() {
            issues.push(UPSERT_MISSING_EXTERNAL_ID.issue(
                penalties,
                0,
                "Upsert operation requires externalIdField parameter",
            ));
        }

        issues
    }
}

pub struct PiiDetector;

impl Detector for PiiDetector {
    fn name(&self) -> &'static str {
        "data/pii"
    }

    fn description(&self) -> &'static str {
        "Personal data in record values"
    }

    fn category(&self) -> Category {
        Category::SecurityFls
    }

    fn checks(&self) -> &'static [Check] {
        PII_CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let Some((Tool::SobjectDml, payload)) = Payload::supported(source) else {
            return Vec::new();
        };

        let mut found: Vec<Vec<String>> = vec![Vec::new(); PII_PATTERNS.len()];
        let records = payload.records().unwrap_or_default();
        for (idx, record) in records.iter().enumerate() {
            let Some(record) = record.as_object() else {
                continue;
            };
            for (field, value) in record {
                let Some(value) = value.as_str() else {
                    continue;
                };
                if let Some(p) = PII_PATTERNS.iter().position(|p| p.regex.is_match(value)) {
                    found[p].push(format!("record {idx}, field '{field}'"));
                }
            }
        }

        PII_PATTERNS
            .iter()
            .zip(found)
            .filter_map(|(pattern, locations)| {
                let first = locations.first()?;
                let extra = match locations.len() {
                    1 => String::new(),
                    n => format!(" (and {} more)", n - 1),
                };
                Some(pattern.check.issue(
                    penalties,
                    0,
                    format!("{} pattern detected in {first}{extra}", pattern.label),
                ))
            })
            .collect()
    }
}

pub struct TestPatternsDetector;

impl Detector for TestPatternsDetector {
    fn name(&self) -> &'static str {
        "data/test-patterns"
    }

    fn description(&self) -> &'static str {
        "Volume and variety of inserted test data"
    }

    fn category(&self) -> Category {
        Category::TestPatterns
    }

    fn checks(&self) -> &'static [Check] {
        TEST_CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let Some((Tool::SobjectDml, payload)) = Payload::supported(source) else {
            return Vec::new();
        };
        if payload.operation() != "insert" {
            return Vec::new();
        }
        let Some(records) = payload.records() else {
            return Vec::new();
        };
        let mut issues = Vec::new();

        if records.len() < BULK_TEST_SIZE {
            issues.push(SMALL_BATCH.issue(
                penalties,
                0,
                format!(
                    "Only {} records - consider 201+ to cross the 200-record batch boundary",
                    records.len()
                ),
            ));
        }

        if records.len() >= 2 {
            // Names and ids are expected to differ; compare everything else.
            let value_sets: BTreeSet<Vec<(&str, String)>> = payload
                .record_objects()
                .map(|r| {
                    let mut values: Vec<(&str, String)> = r
                        .iter()
                        .filter(|(k, _)| !matches!(k.as_str(), "Id" | "Name" | "name"))
                        .map(|(k, v)| (k.as_str(), v.to_string()))
                        .collect();
                    values.sort();
                    values
                })
                .collect();
            if value_sets.len() == 1 {
                issues.push(IDENTICAL_RECORDS.issue(
                    penalties,
                    0,
                    "All records have identical field values - add variety for realistic testing",
                ));
            }
        }

        let names: Vec<&Value> = payload
            .record_objects()
            .filter_map(|r| r.get("Name"))
            .collect();
        if names.len() > 1 && names.iter().all(|n| *n == names[0]) {
            issues.push(IDENTICAL_NAMES.issue(
                penalties,
                0,
                "All records have the same Name value",
            ));
        }

        issues
    }
}

pub struct CleanupDetector;

impl Detector for CleanupDetector {
    fn name(&self) -> &'static str {
        "data/cleanup"
    }

    fn description(&self) -> &'static str {
        "Created records can be found and removed afterwards"
    }

    fn category(&self) -> Category {
        Category::CleanupIsolation
    }

    fn checks(&self) -> &'static [Check] {
        CLEANUP_CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let Some((Tool::SobjectDml, payload)) = Payload::supported(source) else {
            return Vec::new();
        };
        if !matches!(payload.operation(), "insert" | "upsert") {
            return Vec::new();
        }
        let mut issues = Vec::new();

        if payload.records().is_some() {
            let has_cleanup_name = payload.record_objects().any(|r| {
                r.get("Name")
                    .and_then(Value::as_str)
                    .is_some_and(|name| RE_CLEANUP_NAME.is_match(name))
            });
            if !has_cleanup_name {
                issues.push(NO_CLEANUP_NAME.issue(
                    penalties,
                    0,
                    "No records use a cleanup-friendly Name pattern (e.g., 'Test ...', 'Tmp ...', 'Demo ...')",
                ));
            }
        }

        let planned = payload
            .context()
            .is_some_and(|c| is_truthy(c.get("cleanup_planned")));
        if !planned {
            issues.push(NO_CLEANUP_PLAN.issue(
                penalties,
                0,
                "No cleanup plan indicated in context",
            ));
        }

        issues
    }
}
