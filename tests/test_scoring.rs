use std::collections::HashSet;

use oxidized_sf_audit::detectors::{self, all_rules, Check, Detector, Penalties};
use oxidized_sf_audit::engine::Validator;
use oxidized_sf_audit::error::ConfigError;
use oxidized_sf_audit::issue::{sort_by_severity, Issue, Severity};
use oxidized_sf_audit::rubric::{
    ArtifactKind, Category, CategoryBudget, RatingScale, RatingTier, Rubric,
};
use oxidized_sf_audit::scoring::Scorecard;
use oxidized_sf_audit::source::Source;

const TODO_MARKER: Check = Check {
    id: "apex/todo-marker",
    severity: Severity::Low,
    category: Category::CleanCode,
    points: 4,
    message: "TODO left in code",
    remediation: "",
};

static TODO_CHECKS: &[Check] = &[TODO_MARKER];

/// Flags every line holding a TODO comment.
struct TodoDetector;

impl Detector for TodoDetector {
    fn name(&self) -> &'static str {
        "test/todo"
    }

    fn description(&self) -> &'static str {
        "TODO markers"
    }

    fn category(&self) -> Category {
        Category::CleanCode
    }

    fn checks(&self) -> &'static [Check] {
        TODO_CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        source
            .lines
            .iter()
            .filter(|l| l.raw.contains("TODO"))
            .map(|l| TODO_MARKER.issue(penalties, l.number, "TODO left in code"))
            .collect()
    }
}

#[test]
fn built_in_rubric_totals() {
    assert_eq!(Rubric::apex().max_score(), 150);
    assert_eq!(Rubric::flow().max_score(), 110);
    assert_eq!(Rubric::data().max_score(), 130);
    for kind in ArtifactKind::ALL {
        Rubric::for_kind(kind).validate().unwrap();
        Validator::new(Rubric::for_kind(kind)).unwrap();
    }
}

#[test]
fn empty_budget_table_is_rejected() {
    let mut rubric = Rubric::apex();
    rubric.budgets.clear();
    assert!(matches!(
        rubric.validate(),
        Err(ConfigError::EmptyBudgetTable {
            kind: ArtifactKind::Apex
        })
    ));
}

#[test]
fn duplicate_category_is_rejected() {
    let mut rubric = Rubric::flow();
    rubric
        .budgets
        .push(CategoryBudget::new(Category::Performance, 5));
    let err = rubric.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::DuplicateCategory {
            category: Category::Performance,
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "Flow rubric lists category 'performance' more than once"
    );
}

#[test]
fn zero_budget_is_rejected() {
    let mut rubric = Rubric::data();
    rubric.set_budget(Category::TestPatterns, 0);
    assert!(matches!(
        Validator::new(rubric),
        Err(ConfigError::ZeroBudget {
            category: Category::TestPatterns,
            ..
        })
    ));
}

#[test]
fn detector_must_score_a_budgeted_category() {
    let err = Validator::with_detectors(
        Rubric::apex(),
        detectors::detectors_for(ArtifactKind::Flow),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::CategoryNotInRubric {
            kind: ArtifactKind::Apex,
            detector: "flow/design",
            category: Category::DesignNaming,
        }
    ));
}

#[test]
fn penalty_for_unknown_check_is_rejected() {
    let mut rubric = Rubric::apex();
    rubric.penalties.set("apex/does-not-exist", 3);
    let err = Validator::new(rubric).unwrap_err();
    assert_eq!(
        err.to_string(),
        "penalty override for unknown check 'apex/does-not-exist'"
    );
}

#[test]
fn custom_detector_plugs_into_the_engine() {
    let validator = Validator::with_detectors(Rubric::apex(), vec![Box::new(TodoDetector)]).unwrap();
    let report = validator.validate("// TODO one\nfoo();\n// TODO two\n");
    let lines: Vec<usize> = report.issues.iter().map(|i| i.line).collect();
    assert_eq!(lines, vec![1, 3]);
    assert_eq!(report.category(Category::CleanCode).unwrap().current, 12);
    assert_eq!(report.total_score, 142);
    assert!(report.issues[0].fix.is_none(), "empty remediation gives no fix");
}

#[test]
fn custom_budgets_change_the_maximum() {
    let mut rubric = Rubric::apex();
    rubric.set_budget(Category::CleanCode, 40);
    let validator = Validator::with_detectors(rubric, vec![Box::new(TodoDetector)]).unwrap();
    let report = validator.validate("// TODO\n");
    assert_eq!(report.max_score, 170);
    assert_eq!(report.total_score, 166);
}

#[test]
fn scorecard_clamps_at_zero() {
    let mut card = Scorecard::new(&[
        CategoryBudget::new(Category::Security, 10),
        CategoryBudget::new(Category::Testing, 5),
    ]);
    assert_eq!(card.deduct(Category::Security, 4), 4);
    assert_eq!(card.deduct(Category::Security, 20), 6);
    assert_eq!(card.deduct(Category::Security, 1), 0);
    assert_eq!(card.deduct(Category::Performance, 5), 0, "unbudgeted category");
    assert_eq!(card.current(Category::Security), Some(0));
    assert_eq!(card.total(), 5);
    assert_eq!(card.max_total(), 15);
}

#[test]
fn star_scale_boundaries() {
    let scale = RatingScale::stars();
    let stars = |score| scale.rate(score, 150).stars;
    assert_eq!(stars(150), Some(5));
    assert_eq!(stars(135), Some(5));
    assert_eq!(stars(134), Some(4));
    assert_eq!(stars(113), Some(4));
    assert_eq!(stars(112), Some(3));
    assert_eq!(stars(90), Some(3));
    assert_eq!(stars(89), Some(2));
    assert_eq!(stars(68), Some(2));
    assert_eq!(stars(67), Some(1));
    assert_eq!(stars(0), Some(1));
    assert_eq!(scale.rate(0, 150).label, "Critical Issues");
}

#[test]
fn deployment_status_scale_labels() {
    let scale = RatingScale::deployment_status();
    let label = |score| scale.rate(score, 130).label;
    assert_eq!(label(117), "PASSED");
    assert_eq!(label(116), "PASSED — review recommended");
    assert_eq!(label(91), "PASSED — review recommended");
    assert_eq!(label(90), "PASSED — address warnings");
    assert_eq!(label(78), "PASSED — address warnings");
    assert_eq!(label(77), "BLOCKED — fix critical issues before executing");
}

#[test]
fn rating_scale_must_descend_to_zero() {
    let tier = |pct, label: &str| RatingTier {
        min_percent: pct,
        label: label.to_string(),
        stars: None,
    };
    assert!(matches!(
        RatingScale::new(Vec::new()),
        Err(ConfigError::EmptyRatingScale)
    ));
    assert!(matches!(
        RatingScale::new(vec![tier(50, "ok"), tier(80, "good"), tier(0, "bad")]),
        Err(ConfigError::UnorderedRatingScale)
    ));
    assert!(matches!(
        RatingScale::new(vec![tier(50, "ok"), tier(10, "bad")]),
        Err(ConfigError::UnorderedRatingScale)
    ));
    let scale = RatingScale::new(vec![tier(50, "ok"), tier(0, "bad")]).unwrap();
    assert_eq!(scale.rate(5, 10).label, "ok");
    assert_eq!(scale.rate(4, 10).label, "bad");
}

#[test]
fn severity_ranks() {
    let ranks: Vec<u8> = Severity::ALL.iter().map(|s| s.rank()).collect();
    assert_eq!(ranks, vec![0, 1, 2, 2, 3, 4]);
    assert!(Severity::Critical.is_blocking());
    assert!(Severity::High.is_blocking());
    assert!(!Severity::Moderate.is_blocking());
}

#[test]
fn severity_sort_is_stable_within_a_rank() {
    let issue = |severity, line| Issue {
        rule_id: format!("r{line}"),
        severity,
        category: Category::Security,
        message: String::new(),
        line,
        points: 1,
        fix: None,
        source: None,
    };
    let mut issues = vec![
        issue(Severity::Warning, 1),
        issue(Severity::Info, 2),
        issue(Severity::Moderate, 3),
        issue(Severity::High, 4),
        issue(Severity::Warning, 5),
    ];
    sort_by_severity(&mut issues);
    let lines: Vec<usize> = issues.iter().map(|i| i.line).collect();
    assert_eq!(lines, vec![4, 1, 3, 5, 2]);
}

#[test]
fn rule_ids_are_unique() {
    let rules = all_rules();
    let ids: HashSet<&str> = rules.iter().map(|r| r.check.id).collect();
    assert_eq!(ids.len(), rules.len());
}

#[test]
fn checks_deduct_from_their_detector_category() {
    for (kind, detector) in detectors::all_detectors() {
        for check in detector.checks() {
            assert_eq!(
                check.category,
                detector.category(),
                "{} in {}",
                check.id,
                detector.name()
            );
            assert!(
                check.id.starts_with(kind.key()),
                "{} registered under {kind}",
                check.id
            );
            assert!(!check.remediation.is_empty(), "{}", check.id);
        }
    }
}

#[test]
fn report_serializes_with_snake_case_categories() {
    let report = oxidized_sf_audit::engine::validate("public class Plain {\n}", &Rubric::apex()).unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["kind"], "apex");
    assert_eq!(value["categories"][4]["category"], "clean_code");
    assert_eq!(value["issues"][0]["severity"], "WARNING");
    assert_eq!(value["issues"][0]["category"], "security");
}
