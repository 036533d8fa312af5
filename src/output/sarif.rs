use std::collections::BTreeMap;

use serde_sarif::sarif::{
    ArtifactLocation, Location, Message, MultiformatMessageString, PhysicalLocation, Region,
    ReportingDescriptor, Result as SarifResult, ResultLevel, Run, Sarif, Tool, ToolComponent,
};

use crate::audit::AuditSummary;
use crate::detectors::find_check;
use crate::issue::{Issue, Severity};

pub fn format(summary: &AuditSummary) -> String {
    let located: Vec<(&std::path::Path, &Issue)> = summary
        .files
        .iter()
        .flat_map(|f| f.report.issues.iter().map(move |i| (f.file.as_path(), i)))
        .collect();

    // Unique rules, sorted by id
    let mut rule_map: BTreeMap<&str, &Issue> = BTreeMap::new();
    for (_, issue) in &located {
        rule_map.entry(issue.rule_id.as_str()).or_insert(*issue);
    }

    let rule_index: BTreeMap<&str, i64> = rule_map
        .keys()
        .enumerate()
        .map(|(i, id)| (*id, i as i64))
        .collect();

    let rules: Vec<ReportingDescriptor> = rule_map
        .iter()
        .map(|(id, issue)| {
            let check = find_check(id);
            let mut rule = ReportingDescriptor::builder().id(id.to_string()).build();
            rule.short_description = Some(
                MultiformatMessageString::builder()
                    .text(check.map_or_else(|| issue.message.clone(), |c| c.message.to_string()))
                    .build(),
            );
            if let Some(fix) = check.map(|c| c.remediation).filter(|r| !r.is_empty()) {
                rule.help = Some(MultiformatMessageString::builder().text(fix.to_string()).build());
            }
            rule
        })
        .collect();

    let results: Vec<SarifResult> = located
        .iter()
        .map(|(file, issue)| {
            let level = match issue.severity {
                Severity::Critical | Severity::High => ResultLevel::Error,
                Severity::Moderate | Severity::Warning => ResultLevel::Warning,
                Severity::Low | Severity::Info => ResultLevel::Note,
            };

            let mut result = SarifResult::builder()
                .message(Message::builder().text(issue.message.clone()).build())
                .build();

            result.rule_id = Some(issue.rule_id.clone());
            result.level = Some(level);
            result.rule_index = rule_index.get(issue.rule_id.as_str()).copied();

            let uri = file.to_string_lossy().replace('\\', "/");
            let mut location = Location::builder().build();
            let mut physical = PhysicalLocation::builder().build();
            physical.artifact_location = Some(ArtifactLocation::builder().uri(uri).build());
            if issue.line > 0 {
                physical.region = Some(Region::builder().start_line(issue.line as i64).build());
            }
            location.physical_location = Some(physical);
            result.locations = Some(vec![location]);

            result
        })
        .collect();

    let driver = ToolComponent::builder()
        .name("oxidized-sf-audit")
        .version(env!("CARGO_PKG_VERSION").to_string())
        .rules(rules)
        .build();

    let tool = Tool::builder().driver(driver).build();

    let run = Run::builder().tool(tool).results(results).build();

    let sarif = Sarif::builder().version("2.1.0").runs(vec![run]).build();

    serde_json::to_string_pretty(&sarif).expect("SARIF serialization failed")
}
