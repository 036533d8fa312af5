//! PreToolUse hook adapter.
//!
//! Reads the JSON a host agent sends before an MCP tool call, pulls the
//! deployable body out of the tool parameters, scores it and answers with
//! an allow/deny decision. The gate fails open: input it cannot parse or
//! route is allowed without comment.
//!
//! ```
//! use oxidized_sf_audit::config::Config;
//! use oxidized_sf_audit::hook::{gate, Decision};
//!
//! let input = r#"{"tool_name": "mcp__cirra__metadata_create",
//!                 "tool_input": {"type": "ApexClass", "metadata": [{
//!                     "fullName": "Sync",
//!                     "body": "public with sharing class Sync {\n  void run(List<Account> a) {\n    for (Account x : a) {\n      update x;\n    }\n  }\n}"}]}}"#;
//! let response = gate(input, &Config::default());
//! assert_eq!(response.hook_specific_output.permission_decision, Decision::Deny);
//! ```

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::detectors::data::Tool;
use crate::issue::Issue;
use crate::policy::{self, Verdict};
use crate::rubric::ArtifactKind;
use crate::scoring::ValidationReport;

const APEX_TYPES: &[&str] = &["ApexClass", "ApexTrigger"];
const FLOW_TYPES: &[&str] = &["Flow", "FlowDefinition"];

const MAX_BLOCKING_LISTED: usize = 5;
const MAX_WARNINGS_LISTED: usize = 4;

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
struct HookInput {
    tool_name: String,
    tool_input: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

/// The JSON document written back to the host.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResponse {
    pub hook_specific_output: HookOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    pub hook_event_name: String,
    pub permission_decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

impl HookResponse {
    pub fn allow(context: Option<String>) -> Self {
        HookResponse::new(Decision::Allow, None, context)
    }

    pub fn deny(reason: String) -> Self {
        HookResponse::new(Decision::Deny, Some(reason), None)
    }

    fn new(decision: Decision, reason: Option<String>, context: Option<String>) -> Self {
        HookResponse {
            hook_specific_output: HookOutput {
                hook_event_name: "PreToolUse".to_string(),
                permission_decision: decision,
                permission_decision_reason: reason,
                additional_context: context,
            },
        }
    }
}

/// What the gate found worth scoring in one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub kind: ArtifactKind,
    /// Text handed to the validator.
    pub body: String,
    /// API name shown in messages.
    pub name: String,
}

/// Strips an `mcp__<server>__` prefix from a tool name.
///
/// ```
/// use oxidized_sf_audit::hook::base_tool_name;
///
/// assert_eq!(base_tool_name("mcp__cirra__metadata_create"), "metadata_create");
/// assert_eq!(base_tool_name("metadata_create"), "metadata_create");
/// assert_eq!(base_tool_name("mcp__cirra"), "mcp__cirra");
/// ```
pub fn base_tool_name(tool_name: &str) -> &str {
    if !tool_name.starts_with("mcp__") {
        return tool_name;
    }
    let mut parts = tool_name.splitn(3, "__");
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(_), Some(base)) => base,
        _ => tool_name,
    }
}

/// Metadata type named by the tool parameters: `type`, else `sObject`.
fn metadata_type(params: &Map<String, Value>) -> &str {
    non_empty_str(params, &["type"])
        .or_else(|| non_empty_str(params, &["sObject"]))
        .unwrap_or("")
}

/// First non-empty string value among `keys`.
fn non_empty_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

/// Locates the deployable artifact in a tool call, if any.
///
/// Returns `None` for tools and metadata types the gate does not score and
/// for payloads without a body.
pub fn extract_deployment(tool: &str, params: &Map<String, Value>) -> Option<Deployment> {
    let mtype = metadata_type(params);
    let kind = if APEX_TYPES.contains(&mtype) {
        ArtifactKind::Apex
    } else if FLOW_TYPES.contains(&mtype) {
        ArtifactKind::Flow
    } else if Tool::from_name(tool).is_some() {
        return Some(data_deployment(tool, params));
    } else {
        return None;
    };

    let (body, name) = match tool {
        "metadata_create" | "metadata_update" => {
            let first = params
                .get("metadata")
                .and_then(Value::as_array)
                .and_then(|list| list.first())
                .and_then(Value::as_object)?;
            let name = non_empty_str(first, &["fullName"]).unwrap_or_default();
            (metadata_body(kind, first), name)
        }
        "tooling_api_dml" => {
            let record = params.get("record").and_then(Value::as_object)?;
            let name = non_empty_str(record, &["FullName", "fullName"]).unwrap_or_default();
            let body = non_empty_str(record, &["Body", "body"])
                .map(str::to_string)
                .or_else(|| match kind {
                    ArtifactKind::Flow => ["Metadata", "metadata"]
                        .iter()
                        .find_map(|k| record.get(*k).and_then(Value::as_object))
                        .and_then(|inner| metadata_body(kind, inner)),
                    _ => None,
                });
            (body, name)
        }
        _ => return None,
    };

    let name = if name.is_empty() { kind.key() } else { name };
    Some(Deployment {
        kind,
        body: body?,
        name: name.to_string(),
    })
}

/// Body of one metadata entry: an XML/code string, or for Flow a
/// structured JSON definition serialised to XML.
fn metadata_body(kind: ArtifactKind, entry: &Map<String, Value>) -> Option<String> {
    match kind {
        ArtifactKind::Flow => non_empty_str(entry, &["body", "content"])
            .map(str::to_string)
            .or_else(|| {
                crate::flow::is_structured_flow_metadata(entry)
                    .then(|| crate::flow::metadata_json_to_xml(entry))
            }),
        _ => non_empty_str(entry, &["body"]).map(str::to_string),
    }
}

fn data_deployment(tool: &str, params: &Map<String, Value>) -> Deployment {
    let payload = serde_json::json!({ "tool": tool, "params": params });
    let name = non_empty_str(params, &["sObject"]).unwrap_or(tool);
    Deployment {
        kind: ArtifactKind::Data,
        body: payload.to_string(),
        name: name.to_string(),
    }
}

/// Evaluates one PreToolUse hook invocation.
///
/// Never fails: unparsable input, unknown tools, missing bodies and an
/// unusable configuration all produce a silent allow.
pub fn gate(input_json: &str, config: &Config) -> HookResponse {
    let input: HookInput = match serde_json::from_str(input_json) {
        Ok(input) => input,
        Err(e) => {
            debug!(error = %e, "unparsable hook input");
            return HookResponse::allow(None);
        }
    };
    let tool = base_tool_name(&input.tool_name);
    let Some(params) = input.tool_input.as_object() else {
        return HookResponse::allow(None);
    };
    let Some(deployment) = extract_deployment(tool, params) else {
        debug!(tool, "nothing to validate");
        return HookResponse::allow(None);
    };

    let validator = match config.validator(deployment.kind) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "configuration rejected, allowing deployment");
            return HookResponse::allow(None);
        }
    };
    let report = validator.validate(&deployment.body);
    let threshold = config.threshold(deployment.kind);
    let strict = config.strict.enabled;

    debug!(
        tool,
        kind = %deployment.kind,
        name = %deployment.name,
        score = report.total_score,
        "deployment scored"
    );
    respond(&deployment, &report, threshold, strict)
}

/// Renders the decision for a scored deployment.
pub fn respond(
    deployment: &Deployment,
    report: &ValidationReport,
    threshold_pct: u32,
    strict: bool,
) -> HookResponse {
    let domain = deployment.kind;
    let name = &deployment.name;
    let (score, max, pct) = (report.total_score, report.max_score, report.percent());

    match policy::verdict(report, threshold_pct, strict) {
        Verdict::Blocked => {
            let blocking: Vec<&Issue> = report
                .issues
                .iter()
                .filter(|i| policy::is_blocking(i.severity, strict))
                .collect();
            let mut lines: Vec<String> = blocking
                .iter()
                .take(MAX_BLOCKING_LISTED)
                .map(|i| match i.line {
                    0 => format!("• {}", i.message),
                    n => format!("• {} (line {n})", i.message),
                })
                .collect();
            if blocking.len() > MAX_BLOCKING_LISTED {
                lines.push(format!(
                    "• ...and {} more critical issues",
                    blocking.len() - MAX_BLOCKING_LISTED
                ));
            }
            HookResponse::deny(format!(
                "{domain} validation blocked deployment of '{name}' (score: {score}/{max}, {pct}%).\n\n\
                 Critical issues must be fixed before deploying:\n{}",
                lines.join("\n")
            ))
        }
        Verdict::Warning => {
            let mut lines: Vec<String> = report
                .issues
                .iter()
                .take(MAX_WARNINGS_LISTED)
                .map(|i| format!("• {}", i.message))
                .collect();
            if report.issues.len() > MAX_WARNINGS_LISTED {
                lines.push(format!(
                    "• ...and {} more issues",
                    report.issues.len() - MAX_WARNINGS_LISTED
                ));
            }
            HookResponse::allow(Some(format!(
                "{domain} score below threshold for '{name}': {score}/{max} \
                 ({pct}%, threshold is {threshold_pct}%). Consider fixing before deploying:\n{}",
                lines.join("\n")
            )))
        }
        Verdict::Passed => HookResponse::allow(Some(format!(
            "{domain} validation passed for '{name}': {score}/{max} {}",
            report.rating
        ))),
    }
}
