use oxidized_sf_audit::engine::validate;
use oxidized_sf_audit::issue::{Issue, Severity};
use oxidized_sf_audit::rubric::{Category, Rubric};
use oxidized_sf_audit::scoring::ValidationReport;
use serde_json::json;

fn score(payload: &str) -> ValidationReport {
    validate(payload, &Rubric::data()).expect("built-in rubric is valid")
}

fn score_json(payload: serde_json::Value) -> ValidationReport {
    score(&payload.to_string())
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(std::path::Path::new("tests/fixtures/data").join(name))
        .expect("fixture exists")
}

fn rule_ids(report: &ValidationReport) -> Vec<&str> {
    report.issues.iter().map(|i| i.rule_id.as_str()).collect()
}

fn with_rule<'a>(report: &'a ValidationReport, rule_id: &str) -> Vec<&'a Issue> {
    report.issues.iter().filter(|i| i.rule_id == rule_id).collect()
}

#[test]
fn clean_query_passes() {
    let report = score(&fixture("query_accounts.json"));
    assert!(report.issues.is_empty(), "got {:?}", report.issues);
    assert_eq!(report.total_score, 130);
    assert_eq!(report.rating.label, "PASSED");
    assert_eq!(report.rating.stars, None);
}

#[test]
fn insert_with_pii_is_flagged() {
    let report = score(&fixture("insert_contacts.json"));
    assert_eq!(
        rule_ids(&report),
        vec![
            "data/no-context",
            "data/no-purpose",
            "data/pii-ssn",
            "data/small-batch",
            "data/no-cleanup-name",
            "data/no-cleanup-plan",
        ]
    );

    let ssn = with_rule(&report, "data/pii-ssn");
    assert_eq!(
        ssn[0].message,
        "SSN pattern detected in record 0, field 'SSN__c' (and 1 more)"
    );
    assert_eq!(ssn[0].severity, Severity::High);
    assert!(report.has_blocking());

    assert_eq!(report.total_score, 95);
    assert_eq!(report.percent(), 73);
    assert_eq!(report.rating.label, "PASSED — review recommended");
}

#[test]
fn unparsable_payload_costs_one_deduction() {
    let report = score("this is not json");
    assert_eq!(rule_ids(&report), vec!["data/invalid-payload"]);
    assert_eq!(report.total_score, 120);
    assert_eq!(report.category(Category::DataIntegrity).unwrap().current, 10);
}

#[test]
fn json_array_is_not_a_payload() {
    let report = score("[1, 2, 3]");
    assert_eq!(rule_ids(&report), vec!["data/invalid-payload"]);
}

#[test]
fn unknown_tool_is_reported_alone() {
    let report = score_json(json!({"tool": "apex_execute", "params": {}}));
    assert_eq!(rule_ids(&report), vec!["data/unknown-tool"]);
    assert_eq!(
        report.issues[0].message,
        "Unknown tool: 'apex_execute'. Expected one of: soql_query, sobject_dml"
    );
}

#[test]
fn query_without_where_or_limit() {
    let report = score_json(json!({
        "tool": "soql_query",
        "params": {"sObject": "Account", "sf_user": "u", "fields": ["Id"]},
        "context": {"purpose": "spot check"}
    }));
    assert_eq!(rule_ids(&report), vec!["data/no-where-clause", "data/no-limit"]);
    assert_eq!(report.category(Category::QueryEfficiency).unwrap().current, 17);
}

#[test]
fn broken_where_clause_syntax() {
    let report = score_json(json!({
        "tool": "soql_query",
        "params": {
            "sObject": "Account",
            "sf_user": "u",
            "whereClause": "Status__c == \"Open\" AND (Id = '001000000000001AAA'",
            "limit": 60000
        },
        "context": {"purpose": "debugging"}
    }));
    assert_eq!(
        rule_ids(&report),
        vec![
            "data/hardcoded-id",
            "data/double-equals",
            "data/double-quoted-string",
            "data/unbalanced-parens",
            "data/excessive-limit",
            "data/no-fields",
        ]
    );
    let limit = with_rule(&report, "data/excessive-limit");
    assert!(limit[0].message.starts_with("Excessive limit (60000)"));
    assert_eq!(report.category(Category::QueryEfficiency).unwrap().current, 1);
}

#[test]
fn unindexed_filter_is_a_warning() {
    let report = score_json(json!({
        "tool": "soql_query",
        "params": {
            "sObject": "Account",
            "sf_user": "u",
            "fields": ["Id"],
            "whereClause": "Industry = 'Tech'",
            "limit": 10
        },
        "context": {"purpose": "report"}
    }));
    assert_eq!(rule_ids(&report), vec!["data/unindexed-filter"]);
    assert_eq!(report.issues[0].severity, Severity::Warning);
}

#[test]
fn missing_and_malformed_target_object() {
    let missing = score_json(json!({
        "tool": "soql_query",
        "params": {"fields": ["Id"], "whereClause": "Id != null", "limit": 1},
        "context": {"purpose": "p"}
    }));
    assert_eq!(
        rule_ids(&missing),
        vec!["data/missing-sobject", "data/missing-sf-user"]
    );

    let malformed = score_json(json!({
        "tool": "soql_query",
        "params": {"sObject": "Bad Name", "sf_user": "u", "fields": ["Id"], "whereClause": "Id != null", "limit": 1},
        "context": {"purpose": "p"}
    }));
    let issues = with_rule(&malformed, "data/invalid-sobject-name");
    assert_eq!(issues.len(), 1);
    assert_eq!(
        issues[0].message,
        "sObject name 'Bad Name' doesn't match expected pattern"
    );
}

#[test]
fn custom_object_names_are_valid() {
    for name in ["Invoice__c", "Setting__mdt", "Order_Event__e"] {
        let report = score_json(json!({
            "tool": "soql_query",
            "params": {"sObject": name, "sf_user": "u", "fields": ["Id"], "whereClause": "Id != null", "limit": 1},
            "context": {"purpose": "p"}
        }));
        assert!(report.issues.is_empty(), "{name}: {:?}", report.issues);
    }
}

#[test]
fn update_records_need_ids() {
    let report = score_json(json!({
        "tool": "sobject_dml",
        "params": {
            "sObject": "Account",
            "sf_user": "u",
            "operation": "update",
            "records": [{"Name": "x"}, {"Id": "001", "Name": "y"}]
        },
        "context": {"purpose": "rename"}
    }));
    assert_eq!(rule_ids(&report), vec!["data/missing-record-id"]);
    assert_eq!(
        report.issues[0].message,
        "1 record(s) missing 'Id' field for update operation"
    );
}

#[test]
fn upsert_needs_external_id_field() {
    let without = score_json(json!({
        "tool": "sobject_dml",
        "params": {
            "sObject": "Account",
            "sf_user": "u",
            "operation": "upsert",
            "records": [{"Name": "Test A"}]
        },
        "context": {"purpose": "sync", "cleanup_planned": true}
    }));
    assert_eq!(rule_ids(&without), vec!["data/upsert-missing-external-id"]);

    let partial = score_json(json!({
        "tool": "sobject_dml",
        "params": {
            "sObject": "Account",
            "sf_user": "u",
            "operation": "upsert",
            "externalIdField": "Ext__c",
            "records": [{"Name": "Test A", "Ext__c": "A"}, {"Name": "Test B"}]
        },
        "context": {"purpose": "sync", "cleanup_planned": true}
    }));
    assert_eq!(rule_ids(&partial), vec!["data/missing-external-id-value"]);
    assert_eq!(
        partial.issues[0].message,
        "1 record(s) missing external ID field 'Ext__c'"
    );
}

#[test]
fn invalid_operation_and_empty_records() {
    let report = score_json(json!({
        "tool": "sobject_dml",
        "params": {"sObject": "Account", "sf_user": "u", "operation": "merge", "records": []},
        "context": {"purpose": "p"}
    }));
    assert_eq!(
        rule_ids(&report),
        vec!["data/invalid-operation", "data/empty-records"]
    );
    assert_eq!(
        report.issues[0].message,
        "Invalid operation: 'merge'. Expected one of: insert, update, delete, upsert"
    );
    assert_eq!(report.category(Category::BulkSafety).unwrap().current, 5);
}

#[test]
fn too_many_records_in_one_call() {
    let records: Vec<_> = (0..10_001).map(|i| json!({"Id": format!("a{i}")})).collect();
    let report = score_json(json!({
        "tool": "sobject_dml",
        "params": {"sObject": "Account", "sf_user": "u", "operation": "delete", "records": records},
        "context": {"purpose": "purge"}
    }));
    let issues = with_rule(&report, "data/too-many-records");
    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.starts_with("Record count (10001)"));
}

#[test]
fn each_pii_kind_is_reported_once() {
    let report = score_json(json!({
        "tool": "sobject_dml",
        "params": {
            "sObject": "Contact",
            "sf_user": "u",
            "operation": "update",
            "records": [
                {"Id": "1", "Card__c": "4111 1111 1111 1111"},
                {"Id": "2", "Email": "jane.doe@gmail.com"},
                {"Id": "3", "Email": "ops@example.com"}
            ]
        },
        "context": {"purpose": "fix"}
    }));
    assert_eq!(
        rule_ids(&report),
        vec!["data/pii-credit-card", "data/pii-personal-email"]
    );
    assert_eq!(
        report.issues[0].message,
        "Credit card pattern detected in record 0, field 'Card__c'"
    );
    assert_eq!(report.issues[1].severity, Severity::Warning);
    assert_eq!(report.category(Category::SecurityFls).unwrap().current, 5);
}

#[test]
fn identical_test_records() {
    let report = score_json(json!({
        "tool": "sobject_dml",
        "params": {
            "sObject": "Account",
            "sf_user": "u",
            "operation": "insert",
            "records": [
                {"Name": "Test A", "Industry": "Tech"},
                {"Name": "Test A", "Industry": "Tech"}
            ]
        },
        "context": {"purpose": "seed", "cleanup_planned": true}
    }));
    assert_eq!(
        rule_ids(&report),
        vec![
            "data/small-batch",
            "data/identical-records",
            "data/identical-names",
        ]
    );
    assert_eq!(report.category(Category::TestPatterns).unwrap().current, 5);
}

#[test]
fn inconsistent_insert_fields() {
    let report = score_json(json!({
        "tool": "sobject_dml",
        "params": {
            "sObject": "Account",
            "sf_user": "u",
            "operation": "insert",
            "records": [
                {"Name": "Test A", "Industry": "Tech"},
                {"Name": "Test B", "Rating": "Hot"}
            ]
        },
        "context": {"purpose": "seed", "cleanup_planned": true}
    }));
    assert_eq!(
        rule_ids(&report),
        vec!["data/inconsistent-fields", "data/small-batch"]
    );
}

#[test]
fn bulk_test_insert_scores_full_marks() {
    let records: Vec<_> = (0..201)
        .map(|i| json!({"Name": format!("Test Account {i}"), "NumberOfEmployees": i}))
        .collect();
    let report = score_json(json!({
        "tool": "sobject_dml",
        "params": {"sObject": "Account", "sf_user": "u", "operation": "insert", "records": records},
        "context": {"purpose": "bulk trigger test", "cleanup_planned": true}
    }));
    assert!(report.issues.is_empty(), "got {:?}", report.issues);
    assert_eq!(report.total_score, 130);
}

#[test]
fn penalty_overrides_change_deductions() {
    let mut rubric = Rubric::data();
    rubric.penalties.set("data/pii-ssn", 20);
    let report = validate(&fixture("insert_contacts.json"), &rubric).unwrap();
    assert_eq!(with_rule(&report, "data/pii-ssn")[0].points, 20);
    assert_eq!(report.category(Category::SecurityFls).unwrap().current, 0);
    assert_eq!(report.total_score, 85);
}
