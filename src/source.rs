//! Shared pre-processing of source text.
//!
//! Every line-oriented consumer (the [`classifier`](crate::classifier) and all
//! Apex detectors) reads the same cleaned view of the input: string literal
//! bodies are emptied and comments removed, so keywords or braces inside
//! `'...'`, `// ...` or `/* ... */` can never corrupt loop bookkeeping or
//! trigger a rule.

use std::sync::OnceLock;

use crate::classifier::{self, LineContext};
use crate::flow::FlowDocument;

/// One physical line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// 1-based line number.
    pub number: usize,
    /// The line exactly as read.
    pub raw: &'a str,
    /// The line with literal bodies emptied and comments removed.
    pub code: String,
    /// The line holds nothing but comment text.
    pub is_comment: bool,
    /// Some part of the line is comment text (literal contents do not count).
    pub has_comment: bool,
}

impl SourceLine<'_> {
    /// `true` when the cleaned line has no structural content.
    pub fn is_blank(&self) -> bool {
        self.code.trim().is_empty()
    }
}

/// Splits `text` into cleaned [`SourceLine`]s.
///
/// Line splitting follows [`str::lines`]: an empty input yields no lines and a
/// trailing newline does not produce an extra empty line.
///
/// # Examples
///
/// ```
/// use oxidized_sf_audit::source::split_lines;
///
/// let lines = split_lines("String s = 'for (x) {'; // while (y)\n/* do {\n } */ x++;");
/// assert_eq!(lines.len(), 3);
/// assert_eq!(lines[0].code.trim(), "String s = '';");
/// assert!(lines[1].is_comment);
/// assert_eq!(lines[2].code.trim(), "x++;");
/// ```
pub fn split_lines(text: &str) -> Vec<SourceLine<'_>> {
    let mut in_block = false;
    text.lines()
        .enumerate()
        .map(|(idx, raw)| {
            let started_in_block = in_block;
            let (code, has_comment) = strip_line(raw, &mut in_block);
            let trimmed = raw.trim_start();
            let opens_with_comment = started_in_block
                || trimmed.starts_with("//")
                || trimmed.starts_with("/*")
                || trimmed.starts_with('*');
            let is_comment = opens_with_comment && code.trim().is_empty() && !trimmed.is_empty();
            SourceLine {
                number: idx + 1,
                raw,
                code,
                is_comment,
                has_comment,
            }
        })
        .collect()
}

/// Removes comment text and empties string literals on a single line.
///
/// `in_block` carries an open `/* ... */` comment from one line to the next.
/// Unterminated string literals are closed at end of line. The flag reports
/// whether any comment text was removed.
fn strip_line(raw: &str, in_block: &mut bool) -> (String, bool) {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut has_comment = *in_block && !raw.trim().is_empty();

    while let Some(c) = chars.next() {
        if *in_block {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_block = false;
                out.push(' ');
            }
            continue;
        }

        match c {
            '/' if chars.peek() == Some(&'/') => {
                has_comment = true;
                break;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                *in_block = true;
                has_comment = true;
            }
            '\'' | '"' => {
                out.push(c);
                while let Some(inner) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == c {
                        break;
                    }
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    (out, has_comment)
}

/// A single validation input, pre-processed once and shared by every detector.
///
/// The per-line view and the loop context are computed eagerly; the Flow
/// document and the JSON payload are parsed on first use, so detectors of one
/// artifact kind never pay for another kind's parsing.
pub struct Source<'a> {
    pub text: &'a str,
    pub lines: Vec<SourceLine<'a>>,
    pub context: Vec<LineContext>,
    flow: OnceLock<FlowDocument>,
    payload: OnceLock<Option<serde_json::Value>>,
}

impl<'a> Source<'a> {
    pub fn new(text: &'a str) -> Self {
        let lines = split_lines(text);
        let context = classifier::classify_lines(&lines);
        Source {
            text,
            lines,
            context,
            flow: OnceLock::new(),
            payload: OnceLock::new(),
        }
    }

    /// Loop context for a 1-based line number.
    pub fn context_at(&self, line: usize) -> LineContext {
        line.checked_sub(1)
            .and_then(|idx| self.context.get(idx))
            .copied()
            .unwrap_or_default()
    }

    /// Code lines (non-comment) paired with their loop context.
    pub fn code_lines(&self) -> impl Iterator<Item = (&SourceLine<'a>, LineContext)> + '_ {
        self.lines
            .iter()
            .zip(self.context.iter().copied())
            .filter(|(line, _)| !line.is_comment)
    }

    /// The input parsed as Flow XML.
    pub fn flow(&self) -> &FlowDocument {
        self.flow.get_or_init(|| FlowDocument::parse(self.text))
    }

    /// The input parsed as JSON, or `None` when it is not valid JSON.
    pub fn payload(&self) -> Option<&serde_json::Value> {
        self.payload
            .get_or_init(|| serde_json::from_str(self.text).ok())
            .as_ref()
    }
}
