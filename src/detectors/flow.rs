//! Flow definition detectors (110-point rubric).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::detectors::{Check, Detector, Penalties};
use crate::flow::{ElementKind, FlowDocument, FlowElement};
use crate::issue::{Issue, Severity};
use crate::rubric::Category;
use crate::source::Source;

const MISSING_DESCRIPTION: Check = Check {
    id: "flow/missing-description",
    severity: Severity::Info,
    category: Category::DesignNaming,
    points: 5,
    message: "Flow has no description",
    remediation: "Add a <description> explaining what the flow does and when it runs",
};

const DML_IN_LOOP: Check = Check {
    id: "flow/dml-in-loop",
    severity: Severity::Critical,
    category: Category::Performance,
    points: 15,
    message: "Create/update/delete element runs on every loop iteration",
    remediation: "Add records to a collection variable in the loop and run one DML element after it",
};

const QUERY_IN_LOOP: Check = Check {
    id: "flow/query-in-loop",
    severity: Severity::Critical,
    category: Category::Performance,
    points: 10,
    message: "Get Records element runs on every loop iteration",
    remediation: "Query once before the loop and filter the collection inside it",
};

const LOOP_WITH_DML: Check = Check {
    id: "flow/loop-with-dml",
    severity: Severity::Warning,
    category: Category::Performance,
    points: 0,
    message: "Flow has loops and DML elements that could not be traced",
    remediation: "Verify DML elements are connected outside the loop body",
};

const MISSING_FAULT_PATH: Check = Check {
    id: "flow/missing-fault-path",
    severity: Severity::Warning,
    category: Category::ErrorHandling,
    points: 10,
    message: "DML elements without a fault connector",
    remediation: "Connect a fault path from every create/update/delete element",
};

static DESIGN_CHECKS: &[Check] = &[MISSING_DESCRIPTION];
static LOOP_CHECKS: &[Check] = &[DML_IN_LOOP, QUERY_IN_LOOP, LOOP_WITH_DML];
static FAULT_CHECKS: &[Check] = &[MISSING_FAULT_PATH];

pub fn detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(DesignDetector),
        Box::new(LoopDetector),
        Box::new(FaultPathDetector),
    ]
}

pub struct DesignDetector;

impl Detector for DesignDetector {
    fn name(&self) -> &'static str {
        "flow/design"
    }

    fn description(&self) -> &'static str {
        "Flow-level description"
    }

    fn category(&self) -> Category {
        Category::DesignNaming
    }

    fn checks(&self) -> &'static [Check] {
        DESIGN_CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        if source.flow().has_description {
            return Vec::new();
        }
        vec![MISSING_DESCRIPTION.issue(penalties, 0, "Flow missing description element")]
    }
}

/// Elements reachable from `lp`'s loop body before control returns to `lp`.
fn loop_body<'a>(
    doc: &'a FlowDocument,
    by_name: &HashMap<&str, usize>,
    lp: &FlowElement,
) -> Vec<usize> {
    let mut seen = HashSet::new();
    let mut queue: VecDeque<&str> = lp.targets_via("nextValueConnector").collect();
    let mut body = Vec::new();

    while let Some(target) = queue.pop_front() {
        if target == lp.name {
            continue;
        }
        let Some(&idx) = by_name.get(target) else {
            continue;
        };
        if !seen.insert(idx) {
            continue;
        }
        body.push(idx);
        let element: &'a FlowElement = &doc.elements[idx];
        queue.extend(element.connectors.iter().map(|c| c.target.as_str()));
    }

    body
}

pub struct LoopDetector;

impl Detector for LoopDetector {
    fn name(&self) -> &'static str {
        "flow/loops"
    }

    fn description(&self) -> &'static str {
        "Record lookups and DML inside loop bodies"
    }

    fn category(&self) -> Category {
        Category::Performance
    }

    fn checks(&self) -> &'static [Check] {
        LOOP_CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let doc = source.flow();
        let by_name: HashMap<&str, usize> = doc
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.name.is_empty())
            .map(|(i, e)| (e.name.as_str(), i))
            .collect();

        // element index -> owning loop, first loop in document order wins
        let mut offenders: Vec<(usize, &FlowElement)> = Vec::new();
        let mut traced_any = false;

        for lp in doc.loops() {
            if lp.name.is_empty() {
                continue;
            }
            let body = loop_body(doc, &by_name, lp);
            traced_any |= !body.is_empty();
            for idx in body {
                let kind = doc.elements[idx].kind;
                let relevant = kind.is_dml() || kind == ElementKind::RecordLookup;
                if relevant && !offenders.iter().any(|(i, _)| *i == idx) {
                    offenders.push((idx, lp));
                }
            }
        }

        offenders.sort_by_key(|(idx, _)| doc.elements[*idx].line);

        let mut issues: Vec<Issue> = offenders
            .into_iter()
            .map(|(idx, lp)| {
                let element = &doc.elements[idx];
                let (check, what) = if element.kind.is_dml() {
                    (DML_IN_LOOP, "DML")
                } else {
                    (QUERY_IN_LOOP, "Get Records")
                };
                let mut issue = check.issue(
                    penalties,
                    element.line,
                    format!(
                        "{what} element '{}' inside loop '{}' (loop at line {})",
                        element.name, lp.name, lp.line
                    ),
                );
                issue.source = Some(format!("<{}> {}", element.kind.tag(), element.name));
                issue
            })
            .collect();

        let has_loops = doc.loops().next().is_some();
        let has_dml = doc.dml_elements().next().is_some();
        if has_loops && has_dml && !traced_any {
            let line = doc.loops().next().map(|l| l.line).unwrap_or(0);
            issues.push(LOOP_WITH_DML.issue(
                penalties,
                line,
                "Flow has both loops and DML elements - verify DML is outside loops",
            ));
        }

        issues
    }
}

pub struct FaultPathDetector;

impl Detector for FaultPathDetector {
    fn name(&self) -> &'static str {
        "flow/fault-paths"
    }

    fn description(&self) -> &'static str {
        "Fault connectors on DML elements"
    }

    fn category(&self) -> Category {
        Category::ErrorHandling
    }

    fn checks(&self) -> &'static [Check] {
        FAULT_CHECKS
    }

    fn detect(&self, source: &Source<'_>, penalties: &Penalties) -> Vec<Issue> {
        let doc = source.flow();
        let total = doc.dml_elements().count();
        let uncovered: Vec<&FlowElement> = doc
            .dml_elements()
            .filter(|e| !e.has_fault_connector)
            .collect();

        let Some(first) = uncovered.first() else {
            return Vec::new();
        };
        let mut issue = MISSING_FAULT_PATH.issue(
            penalties,
            first.line,
            format!(
                "{} of {total} DML element(s) have no fault connector",
                uncovered.len()
            ),
        );
        issue.source = Some(format!("<{}> {}", first.kind.tag(), first.name));
        vec![issue]
    }
}
