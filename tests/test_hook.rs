use oxidized_sf_audit::config::Config;
use oxidized_sf_audit::hook::{extract_deployment, gate, Decision, HookOutput};
use oxidized_sf_audit::rubric::ArtifactKind;
use serde_json::{json, Value};

fn run(input: Value) -> HookOutput {
    run_with(input, &Config::default())
}

fn run_with(input: Value, config: &Config) -> HookOutput {
    gate(&input.to_string(), config).hook_specific_output
}

fn apex_create(name: &str, body: &str) -> Value {
    json!({
        "tool_name": "mcp__cirra__metadata_create",
        "tool_input": {"type": "ApexClass", "metadata": [{"fullName": name, "body": body}]}
    })
}

fn reason(output: &HookOutput) -> &str {
    output.permission_decision_reason.as_deref().unwrap_or("")
}

fn context(output: &HookOutput) -> &str {
    output.additional_context.as_deref().unwrap_or("")
}

#[test]
fn dml_in_loop_denies_apex_deployment() {
    let body = "public with sharing class Sync {\n  void run(List<Account> a) {\n    for (Account x : a) {\n      update x;\n    }\n  }\n}";
    let output = run(apex_create("Sync", body));
    assert_eq!(output.permission_decision, Decision::Deny);
    assert_eq!(output.hook_event_name, "PreToolUse");
    let reason = reason(&output);
    assert!(
        reason.starts_with("Apex validation blocked deployment of 'Sync' (score: 140/150, 93%)."),
        "got {reason}"
    );
    assert!(reason.contains("Critical issues must be fixed before deploying:"));
    assert!(reason.contains("• DML inside loop (loop started line 3) (line 4)"));
    assert!(output.additional_context.is_none());
}

#[test]
fn clean_apex_is_allowed_with_score() {
    let output = run(apex_create("Greeter", "public with sharing class Greeter {\n}"));
    assert_eq!(output.permission_decision, Decision::Allow);
    assert!(output.permission_decision_reason.is_none());
    assert_eq!(
        context(&output),
        "Apex validation passed for 'Greeter': 150/150 Excellent (5/5)"
    );
}

#[test]
fn low_score_without_blocking_issues_warns() {
    let mut config = Config::default();
    config.thresholds.apex = 100;
    let output = run_with(
        apex_create("accountHelper", "public with sharing class accountHelper {\n}"),
        &config,
    );
    assert_eq!(output.permission_decision, Decision::Allow);
    let context = context(&output);
    assert!(
        context.starts_with(
            "Apex score below threshold for 'accountHelper': 148/150 (98%, threshold is 100%)."
        ),
        "got {context}"
    );
    assert!(context.contains("Consider fixing before deploying:\n• "));
}

#[test]
fn strict_mode_blocks_warnings() {
    let input = apex_create("Plain", "public class Plain {\n}");

    let relaxed = run(input.clone());
    assert_eq!(relaxed.permission_decision, Decision::Allow);

    let mut config = Config::default();
    config.strict.enabled = true;
    let strict = run_with(input, &config);
    assert_eq!(strict.permission_decision, Decision::Deny);
    assert!(reason(&strict).contains("(line 1)"));
}

#[test]
fn long_blocking_lists_are_truncated() {
    let updates: String = (0..8).map(|_| "      update x;\n").collect();
    let body = format!(
        "public with sharing class Bulk {{\n  void run(List<Account> a) {{\n    for (Account x : a) {{\n{updates}    }}\n  }}\n}}"
    );
    let output = run(apex_create("Bulk", &body));
    assert_eq!(output.permission_decision, Decision::Deny);
    let reason = reason(&output);
    assert_eq!(reason.matches("• DML inside loop").count(), 5);
    assert!(reason.ends_with("• ...and 3 more critical issues"), "got {reason}");
}

#[test]
fn long_warning_lists_are_truncated() {
    let mut config = Config::default();
    config.thresholds.data = 90;
    let output = run_with(
        json!({
            "tool_name": "mcp__cirra__soql_query",
            "tool_input": {"sObject": "Account"}
        }),
        &config,
    );
    assert_eq!(output.permission_decision, Decision::Allow);
    let context = context(&output);
    assert!(
        context.starts_with("Data score below threshold for 'Account': 105/130 (80%, threshold is 90%)."),
        "got {context}"
    );
    assert_eq!(context.matches("\n• ").count(), 5);
    assert!(context.ends_with("• ...and 2 more issues"));
}

#[test]
fn data_operations_are_routed_to_the_data_rubric() {
    let output = run(json!({
        "tool_name": "mcp__cirra__sobject_dml",
        "tool_input": {
            "sObject": "Contact",
            "operation": "insert",
            "sf_user": "admin@example.com",
            "records": [{"LastName": "Doe", "SSN__c": "123-45-6789"}]
        }
    }));
    assert_eq!(output.permission_decision, Decision::Deny);
    let reason = reason(&output);
    assert!(reason.starts_with("Data validation blocked deployment of 'Contact'"));
    assert!(reason.contains("• SSN pattern detected in record 0, field 'SSN__c'"));
}

#[test]
fn flow_body_in_content_field() {
    let xml = std::fs::read_to_string("tests/fixtures/flow/Contact_Sync.flow-meta.xml").unwrap();
    let output = run(json!({
        "tool_name": "mcp__cirra__metadata_update",
        "tool_input": {"type": "Flow", "metadata": [{"fullName": "Contact_Sync", "content": xml}]}
    }));
    assert_eq!(output.permission_decision, Decision::Deny);
    let reason = reason(&output);
    assert!(reason.starts_with("Flow validation blocked deployment of 'Contact_Sync' (score: 75/110, 68%)."));
    assert!(reason.contains("(line 20)"));
}

#[test]
fn tooling_api_flow_with_structured_metadata() {
    let output = run(json!({
        "tool_name": "mcp__cirra__tooling_api_dml",
        "tool_input": {
            "sObject": "Flow",
            "operation": "create",
            "record": {
                "FullName": "Json_Flow",
                "Metadata": {
                    "description": "Loops over items",
                    "processType": "AutoLaunchedFlow",
                    "loops": [{
                        "name": "Each_Item",
                        "nextValueConnector": {"targetReference": "Save_Item"}
                    }],
                    "recordCreates": [{
                        "name": "Save_Item",
                        "connector": {"targetReference": "Each_Item"},
                        "faultConnector": {"targetReference": "Each_Item"}
                    }]
                }
            }
        }
    }));
    assert_eq!(output.permission_decision, Decision::Deny);
    let reason = reason(&output);
    assert!(reason.starts_with("Flow validation blocked deployment of 'Json_Flow'"));
    assert!(reason.contains("'Save_Item' inside loop 'Each_Item'"));
}

#[test]
fn tooling_api_apex_body() {
    let params = json!({
        "sObject": "ApexTrigger",
        "record": {"Name": "ignored", "FullName": "LeadTrigger", "Body": "trigger LeadTrigger on Lead (before insert) {\n}"}
    });
    let deployment = extract_deployment("tooling_api_dml", params.as_object().unwrap()).unwrap();
    assert_eq!(deployment.kind, ArtifactKind::Apex);
    assert_eq!(deployment.name, "LeadTrigger");
    assert!(deployment.body.starts_with("trigger LeadTrigger"));
}

#[test]
fn missing_name_falls_back_to_kind() {
    let params = json!({"type": "ApexClass", "metadata": [{"body": "public with sharing class A {\n}"}]});
    let deployment = extract_deployment("metadata_create", params.as_object().unwrap()).unwrap();
    assert_eq!(deployment.name, "apex");
}

#[test]
fn missing_body_is_not_a_deployment() {
    let params = json!({"type": "ApexClass", "metadata": [{"fullName": "Empty"}]});
    assert!(extract_deployment("metadata_create", params.as_object().unwrap()).is_none());

    let output = run(json!({
        "tool_name": "mcp__cirra__metadata_create",
        "tool_input": params
    }));
    assert_eq!(output.permission_decision, Decision::Allow);
    assert!(output.additional_context.is_none());
}

#[test]
fn unrelated_tools_and_types_are_allowed_silently() {
    for input in [
        json!({"tool_name": "mcp__cirra__describe_sobject", "tool_input": {"sObject": "Account"}}),
        json!({"tool_name": "mcp__cirra__metadata_create", "tool_input": {"type": "CustomObject", "metadata": [{"fullName": "X__c"}]}}),
        json!({"tool_name": "Bash", "tool_input": {"command": "ls"}}),
        json!({"tool_name": "mcp__cirra__metadata_create", "tool_input": "not an object"}),
    ] {
        let output = run(input.clone());
        assert_eq!(output.permission_decision, Decision::Allow, "{input}");
        assert!(output.permission_decision_reason.is_none());
        assert!(output.additional_context.is_none());
    }
}

#[test]
fn unparsable_input_fails_open() {
    for raw in ["", "not json", "[1, 2]", "{\"tool_name\": 42}"] {
        let output = gate(raw, &Config::default()).hook_specific_output;
        assert_eq!(output.permission_decision, Decision::Allow, "{raw:?}");
        assert!(output.additional_context.is_none());
    }
}

#[test]
fn rejected_configuration_fails_open() {
    let mut config = Config::default();
    config.detectors.disabled.push("apex/nonexistent".into());
    let output = run_with(apex_create("Sync", "public class Sync {\n}"), &config);
    assert_eq!(output.permission_decision, Decision::Allow);
    assert!(output.additional_context.is_none());
}

#[test]
fn response_uses_camel_case_keys() {
    let response = gate(
        &apex_create("Greeter", "public with sharing class Greeter {\n}").to_string(),
        &Config::default(),
    );
    let value = serde_json::to_value(&response).unwrap();
    let output = &value["hookSpecificOutput"];
    assert_eq!(output["hookEventName"], "PreToolUse");
    assert_eq!(output["permissionDecision"], "allow");
    assert!(output["additionalContext"].is_string());
    assert!(output.get("permissionDecisionReason").is_none());
}
