use oxidized_sf_audit::engine::validate;
use oxidized_sf_audit::issue::Severity;
use oxidized_sf_audit::policy::{is_blocking, verdict, Verdict};
use oxidized_sf_audit::rubric::Rubric;

#[test]
fn blocking_severities() {
    assert!(is_blocking(Severity::Critical, false));
    assert!(is_blocking(Severity::High, false));
    assert!(!is_blocking(Severity::Moderate, false));
    assert!(!is_blocking(Severity::Warning, false));
    assert!(is_blocking(Severity::Moderate, true));
    assert!(is_blocking(Severity::Warning, true));
    assert!(!is_blocking(Severity::Low, true));
    assert!(!is_blocking(Severity::Info, true));
}

#[test]
fn critical_issue_blocks_regardless_of_score() {
    let src = std::fs::read_to_string("tests/fixtures/apex/LeadProcessor.cls").unwrap();
    let report = validate(&src, &Rubric::apex()).unwrap();
    assert_eq!(verdict(&report, 0, false), Verdict::Blocked);
}

#[test]
fn warnings_block_only_in_strict_mode() {
    let report = validate("public class Plain {\n}", &Rubric::apex()).unwrap();
    assert_eq!(verdict(&report, 67, false), Verdict::Passed);
    assert_eq!(verdict(&report, 67, true), Verdict::Blocked);
}

#[test]
fn info_issues_never_block() {
    let report = validate("public with sharing class lower {\n}", &Rubric::apex()).unwrap();
    assert_eq!(report.total_score, 148);
    assert_eq!(verdict(&report, 67, true), Verdict::Passed);
}

#[test]
fn threshold_boundary_is_inclusive() {
    let report = validate("public with sharing class lower {\n}", &Rubric::apex()).unwrap();
    // 148 * 100 / 150 = 98.67%
    assert_eq!(verdict(&report, 98, false), Verdict::Passed);
    assert_eq!(verdict(&report, 99, false), Verdict::Warning);
}

#[test]
fn verdicts_order_from_best_to_worst() {
    let worst = [Verdict::Warning, Verdict::Passed, Verdict::Blocked]
        .into_iter()
        .max();
    assert_eq!(worst, Some(Verdict::Blocked));
    assert!(Verdict::Passed < Verdict::Warning);
    assert_eq!(Verdict::Warning.to_string(), "warning");
}
