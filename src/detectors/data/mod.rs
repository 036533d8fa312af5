//! Data-operation payload detectors (130-point rubric).
//!
//! Input is one JSON tool call:
//!
//! ```json
//! { "tool": "soql_query" | "sobject_dml", "params": { ... }, "context": { ... } }
//! ```
//!
//! Only the integrity detector reports an unparsable payload or an unknown
//! tool; every other detector stays silent in that case so one bad payload
//! costs exactly one deduction.

pub mod dml;
pub mod integrity;
pub mod query;

use std::sync::LazyLock;

use serde_json::{Map, Value};

use crate::detectors::Detector;
use crate::source::Source;

static EMPTY_OBJECT: LazyLock<Map<String, Value>> = LazyLock::new(Map::new);

pub const VALID_DML_OPERATIONS: &[&str] = &["insert", "update", "delete", "upsert"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    SoqlQuery,
    SobjectDml,
}

impl Tool {
    pub const NAMES: &'static [&'static str] = &["soql_query", "sobject_dml"];

    pub fn from_name(name: &str) -> Option<Tool> {
        match name {
            "soql_query" => Some(Tool::SoqlQuery),
            "sobject_dml" => Some(Tool::SobjectDml),
            _ => None,
        }
    }
}

/// Borrowed view of a data-operation payload.
pub struct Payload<'a> {
    root: &'a Map<String, Value>,
}

impl<'a> Payload<'a> {
    /// `None` when the text is not a JSON object.
    pub fn from_source(source: &'a Source<'_>) -> Option<Payload<'a>> {
        source
            .payload()
            .and_then(Value::as_object)
            .map(|root| Payload { root })
    }

    /// Like [`from_source`](Payload::from_source), but only for a supported tool.
    pub fn supported(source: &'a Source<'_>) -> Option<(Tool, Payload<'a>)> {
        let payload = Payload::from_source(source)?;
        let tool = Tool::from_name(payload.tool_name())?;
        Some((tool, payload))
    }

    pub fn tool_name(&self) -> &'a str {
        self.root.get("tool").and_then(Value::as_str).unwrap_or("")
    }

    /// Tool parameters; a missing or non-object `params` reads as empty.
    pub fn params(&self) -> &'a Map<String, Value> {
        self.root
            .get("params")
            .and_then(Value::as_object)
            .unwrap_or(&EMPTY_OBJECT)
    }

    /// The caller's context object, `None` when absent or empty.
    pub fn context(&self) -> Option<&'a Map<String, Value>> {
        self.root
            .get("context")
            .and_then(Value::as_object)
            .filter(|c| !c.is_empty())
    }

    pub fn param(&self, key: &str) -> Option<&'a Value> {
        self.params().get(key).filter(|v| !v.is_null())
    }

    /// A string parameter, `None` when missing, non-string or blank.
    pub fn param_str(&self, key: &str) -> Option<&'a str> {
        self.param(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn operation(&self) -> &'a str {
        self.param("operation").and_then(Value::as_str).unwrap_or("")
    }

    /// The `records` array when present and non-empty.
    pub fn records(&self) -> Option<&'a [Value]> {
        self.param("records")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .filter(|r| !r.is_empty())
    }

    /// Records that are JSON objects, in order.
    pub fn record_objects(&self) -> impl Iterator<Item = &'a Map<String, Value>> {
        self.records()
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_object)
    }
}

/// `true` for JSON values a caller would consider "set".
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

pub fn detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(integrity::IntegrityDetector),
        Box::new(integrity::DocumentationDetector),
        Box::new(query::QueryEfficiencyDetector),
        Box::new(dml::BulkSafetyDetector),
        Box::new(dml::PiiDetector),
        Box::new(dml::TestPatternsDetector),
        Box::new(dml::CleanupDetector),
    ]
}
