//! Flow metadata reader.
//!
//! Flow definitions are read with a single regex-driven pass over the XML
//! tokens. Only the shape the detectors need is kept: the top-level flow
//! elements, their API names, opening-tag lines and outgoing connectors.
//! Malformed XML degrades to fewer elements, never to an error.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static RE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<!--.*?-->|<\?.*?\?>|<!\[CDATA\[.*?\]\]>|<!DOCTYPE[^>]*>|<(/?)([A-Za-z_][\w.:-]*)[^>]*?(/?)>",
    )
    .unwrap()
});

/// Keys that mark a JSON object as structured Flow metadata rather than a wrapper.
const FLOW_JSON_KEYS: &[&str] = &[
    "processType",
    "start",
    "status",
    "apiVersion",
    "label",
    "decisions",
    "recordCreates",
    "recordUpdates",
    "recordLookups",
    "screens",
    "variables",
    "assignments",
    "loops",
    "formulas",
];

/// Kind of a top-level flow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Start,
    Loop,
    RecordCreate,
    RecordUpdate,
    RecordDelete,
    RecordLookup,
    Decision,
    Assignment,
    Screen,
    Subflow,
    ActionCall,
    Other,
}

impl ElementKind {
    /// Maps a top-level tag to a node kind; `None` for non-node tags such as
    /// `<variables>` or `<processType>`.
    pub fn from_tag(tag: &str) -> Option<ElementKind> {
        let kind = match tag {
            "start" => ElementKind::Start,
            "loops" => ElementKind::Loop,
            "recordCreates" => ElementKind::RecordCreate,
            "recordUpdates" => ElementKind::RecordUpdate,
            "recordDeletes" => ElementKind::RecordDelete,
            "recordLookups" => ElementKind::RecordLookup,
            "decisions" => ElementKind::Decision,
            "assignments" => ElementKind::Assignment,
            "screens" => ElementKind::Screen,
            "subflows" => ElementKind::Subflow,
            "actionCalls" => ElementKind::ActionCall,
            "apexPluginCalls" | "collectionProcessors" | "customErrors" | "recordRollbacks"
            | "waits" | "transforms" | "orchestratedStages" => ElementKind::Other,
            _ => return None,
        };
        Some(kind)
    }

    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Start => "start",
            ElementKind::Loop => "loops",
            ElementKind::RecordCreate => "recordCreates",
            ElementKind::RecordUpdate => "recordUpdates",
            ElementKind::RecordDelete => "recordDeletes",
            ElementKind::RecordLookup => "recordLookups",
            ElementKind::Decision => "decisions",
            ElementKind::Assignment => "assignments",
            ElementKind::Screen => "screens",
            ElementKind::Subflow => "subflows",
            ElementKind::ActionCall => "actionCalls",
            ElementKind::Other => "other",
        }
    }

    /// Create, update or delete.
    pub fn is_dml(self) -> bool {
        matches!(
            self,
            ElementKind::RecordCreate | ElementKind::RecordUpdate | ElementKind::RecordDelete
        )
    }
}

/// An outgoing edge of a flow element.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Connector {
    /// The connector tag holding the reference (`connector`, `faultConnector`,
    /// `nextValueConnector`, ...).
    pub via: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FlowElement {
    pub kind: ElementKind,
    /// API name; empty when the element has no `<name>`.
    pub name: String,
    /// 1-based line of the opening tag.
    pub line: usize,
    pub connectors: Vec<Connector>,
    pub has_fault_connector: bool,
}

impl FlowElement {
    pub fn targets_via<'a>(&'a self, via: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.connectors
            .iter()
            .filter(move |c| c.via == via)
            .map(|c| c.target.as_str())
    }
}

/// The parts of a Flow definition the detectors read.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct FlowDocument {
    /// Top-level nodes in document order.
    pub elements: Vec<FlowElement>,
    /// The flow itself (not one of its elements) has a non-empty `<description>`.
    pub has_description: bool,
}

struct OpenTag {
    name: String,
    content_start: usize,
    has_children: bool,
}

impl FlowDocument {
    /// Reads a Flow XML document.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxidized_sf_audit::flow::{ElementKind, FlowDocument};
    ///
    /// let doc = FlowDocument::parse(
    ///     "<Flow>\n  <recordCreates>\n    <name>Create_Task</name>\n  </recordCreates>\n</Flow>",
    /// );
    /// assert_eq!(doc.elements.len(), 1);
    /// assert_eq!(doc.elements[0].kind, ElementKind::RecordCreate);
    /// assert_eq!(doc.elements[0].name, "Create_Task");
    /// assert_eq!(doc.elements[0].line, 2);
    /// assert!(!doc.has_description);
    /// ```
    pub fn parse(xml: &str) -> FlowDocument {
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(xml.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        let line_of = |offset: usize| line_starts.partition_point(|&start| start <= offset);

        let mut doc = FlowDocument::default();
        let mut stack: Vec<OpenTag> = Vec::new();
        let mut current: Option<FlowElement> = None;

        for caps in RE_TOKEN.captures_iter(xml) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(tag) = caps.get(2) else {
                // Comment, declaration or CDATA.
                continue;
            };
            let tag = tag.as_str();
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let self_closing = caps.get(3).is_some_and(|m| !m.as_str().is_empty());

            if closing {
                let Some(pos) = stack.iter().rposition(|t| t.name == tag) else {
                    continue;
                };
                // Unclosed children are dropped along with the matched tag.
                stack.truncate(pos + 1);
                let Some(open) = stack.pop() else { continue };
                let depth = stack.len() + 1;

                if !open.has_children {
                    let text = leaf_text(&xml[open.content_start..whole.start()]);
                    match (depth, current.as_mut()) {
                        (2, _) if tag == "description" && !text.is_empty() => {
                            doc.has_description = true;
                        }
                        (3, Some(el)) if tag == "name" => el.name = text,
                        (d, Some(el)) if d >= 3 && tag == "targetReference" => {
                            let via = stack.last().map(|p| p.name.clone()).unwrap_or_default();
                            el.connectors.push(Connector { via, target: text });
                        }
                        _ => {}
                    }
                }

                if depth == 2 {
                    if let Some(el) = current.take() {
                        doc.elements.push(el);
                    }
                }
                continue;
            }

            if let Some(parent) = stack.last_mut() {
                parent.has_children = true;
            }
            let depth = stack.len() + 1;

            if tag == "faultConnector" {
                if let Some(el) = current.as_mut() {
                    el.has_fault_connector = true;
                }
            }

            if self_closing {
                continue;
            }

            if depth == 2 {
                current = ElementKind::from_tag(tag).map(|kind| FlowElement {
                    kind,
                    name: String::new(),
                    line: line_of(whole.start()),
                    connectors: Vec::new(),
                    has_fault_connector: false,
                });
            }

            stack.push(OpenTag {
                name: tag.to_string(),
                content_start: whole.end(),
                has_children: false,
            });
        }

        doc
    }

    pub fn element(&self, name: &str) -> Option<&FlowElement> {
        if name.is_empty() {
            return None;
        }
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn loops(&self) -> impl Iterator<Item = &FlowElement> {
        self.elements.iter().filter(|e| e.kind == ElementKind::Loop)
    }

    pub fn dml_elements(&self) -> impl Iterator<Item = &FlowElement> {
        self.elements.iter().filter(|e| e.kind.is_dml())
    }
}

fn leaf_text(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(raw);
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// `true` when a JSON object looks like structured Flow metadata.
pub fn is_structured_flow_metadata(obj: &serde_json::Map<String, Value>) -> bool {
    FLOW_JSON_KEYS.iter().any(|k| obj.contains_key(*k))
}

/// Returns Flow XML for `text`.
///
/// XML passes through untouched. A JSON object of structured Flow metadata
/// (optionally wrapped in `Metadata`/`metadata`) is converted with
/// [`metadata_json_to_xml`]. Anything else is returned as-is.
pub fn normalize_input(text: &str) -> Cow<'_, str> {
    if !text.trim_start().starts_with('{') {
        return Cow::Borrowed(text);
    }
    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(text) else {
        return Cow::Borrowed(text);
    };
    let inner = ["Metadata", "metadata"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_object))
        .filter(|m| is_structured_flow_metadata(m));
    match inner {
        Some(metadata) => Cow::Owned(metadata_json_to_xml(metadata)),
        None if is_structured_flow_metadata(&obj) => Cow::Owned(metadata_json_to_xml(&obj)),
        None => Cow::Borrowed(text),
    }
}

/// Serialises structured Flow metadata as Flow XML.
///
/// Keys become elements, arrays repeat their element, booleans become
/// `true`/`false`, and nulls are dropped. `fullName` is not part of the
/// definition and is skipped.
///
/// # Examples
///
/// ```
/// use oxidized_sf_audit::flow::metadata_json_to_xml;
///
/// let meta = serde_json::json!({"label": "Router", "loops": [{"name": "L1"}], "x": null});
/// let xml = metadata_json_to_xml(meta.as_object().unwrap());
/// assert!(xml.contains("<label>Router</label>"));
/// assert!(xml.contains("<loops>"));
/// assert!(!xml.contains("<x>"));
/// ```
pub fn metadata_json_to_xml(metadata: &serde_json::Map<String, Value>) -> String {
    let mut out = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
        r#"<Flow xmlns="http://soap.sforce.com/2006/04/metadata">"#.to_string(),
    ];
    for (key, value) in metadata {
        if key == "fullName" {
            continue;
        }
        write_value(&mut out, key, value, 1);
    }
    out.push("</Flow>".to_string());
    out.join("\n")
}

fn write_value(out: &mut Vec<String>, tag: &str, value: &Value, indent: usize) {
    let pad = "    ".repeat(indent);
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                write_value(out, tag, item, indent);
            }
        }
        Value::Object(map) => {
            out.push(format!("{pad}<{tag}>"));
            for (key, inner) in map {
                write_value(out, key, inner, indent + 1);
            }
            out.push(format!("{pad}</{tag}>"));
        }
        Value::Bool(b) => out.push(format!("{pad}<{tag}>{b}</{tag}>")),
        Value::Number(n) => out.push(format!("{pad}<{tag}>{n}</{tag}>")),
        Value::String(s) => out.push(format!("{pad}<{tag}>{}</{tag}>", escape_text(s))),
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
