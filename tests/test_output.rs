use std::path::PathBuf;

use oxidized_sf_audit::audit::{self, AuditSummary};
use oxidized_sf_audit::config::Config;
use oxidized_sf_audit::output;
use oxidized_sf_audit::output::OutputFormat;
use oxidized_sf_audit::policy::Verdict;
use oxidized_sf_audit::rubric::ArtifactKind;

fn summary_for(paths: &[&str], kind: Option<ArtifactKind>) -> AuditSummary {
    let paths: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
    audit::run_audit(&paths, kind, &Config::default()).expect("default config is valid")
}

fn dirty_summary() -> AuditSummary {
    summary_for(&["tests/fixtures/apex/LeadProcessor.cls"], None)
}

fn clean_summary() -> AuditSummary {
    summary_for(
        &[
            "tests/fixtures/apex/AccountService.cls",
            "tests/fixtures/flow/Opportunity_Follow_Up.flow-meta.xml",
        ],
        None,
    )
}

#[test]
fn directories_collect_apex_and_flow_only() {
    let summary = summary_for(&["tests/fixtures"], None);
    let files: Vec<String> = summary
        .files
        .iter()
        .map(|f| f.file.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        files,
        vec![
            "AccountService.cls",
            "LeadProcessor.cls",
            "Contact_Sync.flow-meta.xml",
            "Opportunity_Follow_Up.flow-meta.xml",
        ]
    );
    assert!(summary.errors.is_empty());
    assert_eq!(summary.status, Verdict::Blocked);
    assert!(!summary.passed);
}

#[test]
fn kind_override_selects_data_payloads() {
    let summary = summary_for(&["tests/fixtures"], Some(ArtifactKind::Data));
    assert_eq!(summary.files.len(), 2);
    assert!(summary
        .files
        .iter()
        .all(|f| f.report.kind == ArtifactKind::Data));
}

#[test]
fn missing_and_unknown_paths_become_errors() {
    let summary = summary_for(&["tests/fixtures/does-not-exist.cls", "Cargo.toml"], None);
    assert!(summary.files.is_empty());
    let messages: Vec<&str> = summary.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "no such file or directory",
            "cannot determine artifact kind (use --kind)",
        ]
    );
    assert!(summary.passed, "nothing validated means nothing blocked");
}

#[test]
fn json_output_is_valid() {
    let summary = dirty_summary();
    let json = output::format_summary(&summary, &OutputFormat::Json);

    let parsed: serde_json::Value = serde_json::from_str(&json).expect("JSON should be valid");
    assert!(parsed["generated_at"].is_string());
    assert_eq!(parsed["status"], "blocked");
    assert!(!parsed["passed"].as_bool().unwrap());
    assert_eq!(parsed["summary"]["files"], 1);
    assert_eq!(parsed["summary"]["issues"], 8);
    assert_eq!(parsed["summary"]["critical"], 2);
    assert_eq!(parsed["summary"]["warning"], 4);
    assert_eq!(parsed["summary"]["info"], 2);

    let file = &parsed["files"][0];
    assert_eq!(file["verdict"], "blocked");
    assert_eq!(file["kind"], "apex");
    assert_eq!(file["total_score"], 106);
    assert_eq!(file["max_score"], 150);
    assert_eq!(file["rating"]["label"], "Good");
    assert_eq!(file["rating"]["stars"], 3);
    assert_eq!(file["issues"][0]["rule_id"], "apex/soql-in-loop");
    assert_eq!(file["issues"][0]["line"], 4);
}

#[test]
fn json_clean_files_pass() {
    let summary = clean_summary();
    let json = output::format_summary(&summary, &OutputFormat::Json);

    let parsed: serde_json::Value = serde_json::from_str(&json).expect("JSON should be valid");
    assert!(parsed["passed"].as_bool().unwrap());
    assert_eq!(parsed["status"], "passed");
    assert_eq!(parsed["summary"]["issues"], 0);
    assert!(parsed["errors"].as_array().unwrap().is_empty());
}

#[test]
fn sarif_output_is_valid() {
    let summary = dirty_summary();
    let sarif = output::format_summary(&summary, &OutputFormat::Sarif);

    let parsed: serde_json::Value =
        serde_json::from_str(&sarif).expect("SARIF JSON should be valid");
    assert_eq!(parsed["version"], "2.1.0");
    assert_eq!(parsed["runs"][0]["tool"]["driver"]["name"], "oxidized-sf-audit");

    let results = parsed["runs"][0]["results"].as_array().unwrap();
    assert_eq!(results.len(), 8);
    assert_eq!(results[0]["ruleId"], "apex/soql-in-loop");
    assert_eq!(results[0]["level"], "error");
    assert_eq!(
        results[0]["locations"][0]["physicalLocation"]["region"]["startLine"],
        4
    );

    let rules = parsed["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap();
    assert_eq!(rules.len(), 8, "one descriptor per distinct rule");
    assert!(rules.iter().all(|r| r["help"]["text"].is_string()));
}

#[test]
fn sarif_omits_region_for_whole_document_issues() {
    let summary = summary_for(&["tests/fixtures/flow/Contact_Sync.flow-meta.xml"], None);
    let sarif = output::format_summary(&summary, &OutputFormat::Sarif);
    let parsed: serde_json::Value = serde_json::from_str(&sarif).unwrap();
    let first = &parsed["runs"][0]["results"][0];
    assert_eq!(first["ruleId"], "flow/missing-description");
    assert_eq!(first["level"], "note");
    assert!(first["locations"][0]["physicalLocation"]["region"].is_null());
}

#[test]
fn pretty_output_contains_issues() {
    let summary = dirty_summary();
    let pretty = output::format_summary(&summary, &OutputFormat::Pretty);

    assert!(pretty.contains("Salesforce Artifact Audit"));
    assert!(pretty.contains("LeadProcessor.cls"));
    assert!(pretty.contains("BLOCKED"));
    assert!(pretty.contains("Score: 106/150 (70%)"));
    assert!(pretty.contains("Bulkification"));
    assert!(pretty.contains("SOQL query inside loop (loop started line 3)"));
    assert!(pretty.contains("fix: "));
}

#[test]
fn pretty_output_lists_most_severe_first() {
    let summary = dirty_summary();
    let pretty = output::format_summary(&summary, &OutputFormat::Pretty);
    let critical = pretty.find("apex/dml-in-loop").unwrap();
    let warning = pretty.find("apex/missing-sharing").unwrap();
    let info = pretty.find("apex/method-naming").unwrap();
    assert!(critical < warning && warning < info);
}

#[test]
fn pretty_output_clean_passes() {
    let summary = clean_summary();
    let pretty = output::format_summary(&summary, &OutputFormat::Pretty);

    assert!(pretty.contains("AccountService.cls"));
    assert!(pretty.contains("PASSED"));
    assert!(pretty.contains("Score: 150/150 (100%)"));
    assert!(pretty.contains("Score: 110/110 (100%)"));
}

#[test]
fn pretty_output_reports_skipped_paths() {
    let summary = summary_for(
        &["tests/fixtures/apex/AccountService.cls", "tests/fixtures/nope"],
        None,
    );
    let pretty = output::format_summary(&summary, &OutputFormat::Pretty);
    assert!(pretty.contains("[SKIP]"));
    assert!(pretty.contains("no such file or directory"));
}
