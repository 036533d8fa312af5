use super::RE_METHOD_DECL;
use crate::detectors::{snippet, Check, Detector, Penalties};
use crate::issue::{Issue, Severity};
use crate::rubric::Category;
use crate::source::Source;

/// Lines above a declaration searched for a doc comment.
const DOC_WINDOW: usize = 4;

const UNDOCUMENTED_METHOD: Check = Check {
    id: "apex/undocumented-method",
    severity: Severity::Info,
    category: Category::Documentation,
    points: 2,
    message: "Public method without a preceding doc comment",
    remediation: "Add ApexDoc comment: /** @description ... */",
};

static CHECKS: &[Check] = &[UNDOCUMENTED_METHOD];

pub struct DocumentationDetector;

impl Detector for DocumentationDetector {
    fn name(&self) -> &'static str {
        "apex/documentation"
    }

    fn description(&self) -> &'static str {
        "ApexDoc coverage of public methods"
    }

    fn category(&self) -> Category {
        Category::Documentation
    }

    fn checks(&self) -> &'static [Check] {
        CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let mut issues = Vec::new();

        for (line, _) in source.code_lines() {
            let is_public = RE_METHOD_DECL
                .captures(&line.code)
                .is_some_and(|caps| caps[1].eq_ignore_ascii_case("public"));
            if !is_public {
                continue;
            }

            let idx = line.number - 1;
            let window = &source.lines[idx.saturating_sub(DOC_WINDOW)..idx];
            let documented = window
                .iter()
                .any(|prev| prev.is_comment || prev.has_comment);

            if !documented {
                let mut issue = UNDOCUMENTED_METHOD.issue(
                    penalties,
                    line.number,
                    "Public method missing documentation",
                );
                issue.source = Some(snippet(line.raw));
                issues.push(issue);
            }
        }

        issues
    }
}
