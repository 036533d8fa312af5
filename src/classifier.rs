//! Loop-context classification.
//!
//! A single forward pass over cleaned source lines decides, for every line,
//! whether it executes inside a loop body. No parse tree is built: the pass
//! keeps a stack of brace frames, a pending-loop marker for a header that has
//! not yet opened its body, and a parenthesis depth used to recognise
//! braceless single-statement bodies.
//!
//! The classifier knows nothing about rules. It only answers "is this line in
//! a loop, and which header owns it".
//!
//! # Line semantics
//!
//! - A loop header line is *not* inside its own loop unless code follows the
//!   body's opening brace on that same line, or the body is braceless and ends
//!   on that line (`for (...) doSomething();`).
//! - A line is inside a loop when a loop frame opened on an earlier line is
//!   still open at the end of the line, or when code on the line is scanned
//!   while a loop frame is open (so `x++; }` still counts).
//! - `loop_start_line` names the innermost enclosing header.
//! - The `while (...)` tail of a `do { } while (...);` never opens a new loop,
//!   whether it shares a line with the closing brace or sits on the next line.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::source::{self, SourceLine};

static RE_LOOP_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:for|while)\s*\(|\bdo\b").unwrap());

// `} while (cond);` closes a do-while; the `while` is its tail, not a header.
static RE_DO_WHILE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\}\s*while\s*\(").unwrap());

static RE_LEADING_WHILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*while\s*\(").unwrap());

/// Loop membership of one source line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LineContext {
    pub in_loop: bool,
    /// Header line of the innermost enclosing loop, `0` when `in_loop` is false.
    pub loop_start_line: usize,
}

impl LineContext {
    pub fn outside() -> Self {
        LineContext::default()
    }

    pub fn inside(header_line: usize) -> Self {
        LineContext {
            in_loop: true,
            loop_start_line: header_line,
        }
    }
}

/// Classifies every line of `text`.
///
/// Always returns exactly one entry per line (as counted by [`str::lines`]).
///
/// # Examples
///
/// ```
/// use oxidized_sf_audit::classifier::classify;
///
/// let ctx = classify("for (Account a : accs)\n    a.Name = 'x';\nif (done) {\n    finish();\n}");
/// assert!(ctx[1].in_loop);
/// assert_eq!(ctx[1].loop_start_line, 1);
/// assert!(!ctx[3].in_loop);
/// ```
pub fn classify(text: &str) -> Vec<LineContext> {
    classify_lines(&source::split_lines(text))
}

/// Classifies pre-processed lines (see [`source::split_lines`]).
pub fn classify_lines(lines: &[SourceLine<'_>]) -> Vec<LineContext> {
    let mut scanner = LoopScanner::default();
    lines.iter().map(|line| scanner.line(line)).collect()
}

#[derive(Debug, Clone, Copy)]
enum FrameKind {
    Loop { header: usize, is_do: bool },
    Block,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: FrameKind,
    opened_on: usize,
}

#[derive(Debug, Clone, Copy)]
struct PendingLoop {
    header: usize,
    is_do: bool,
}

/// Scanner state owned by one classification run.
#[derive(Debug, Default)]
struct LoopScanner {
    stack: Vec<Frame>,
    pending: Option<PendingLoop>,
    paren_depth: usize,
    /// The last structural token was the `}` closing a `do` body.
    after_do_body: bool,
}

impl LoopScanner {
    fn line(&mut self, line: &SourceLine<'_>) -> LineContext {
        if line.is_comment || line.is_blank() {
            return self.context_at_rest(line.number);
        }

        let code = line.code.as_str();
        let is_do_tail = RE_DO_WHILE_TAIL.is_match(code)
            || (self.after_do_body && RE_LEADING_WHILE.is_match(code));

        // The header only becomes pending once the scan reaches it, so a `;`
        // earlier on the line cannot end its body.
        let header_at = if is_do_tail {
            None
        } else {
            RE_LOOP_HEADER
                .find(code)
                .map(|m| (m.start(), m.as_str().eq_ignore_ascii_case("do")))
        };

        let mut braceless_header = None;
        let mut touched_header = None;

        for (idx, ch) in code.char_indices() {
            if let Some((start, is_do)) = header_at {
                if idx == start {
                    self.pending = Some(PendingLoop {
                        header: line.number,
                        is_do,
                    });
                    self.paren_depth = 0;
                }
            }

            match ch {
                '(' => self.paren_depth += 1,
                ')' => self.paren_depth = self.paren_depth.saturating_sub(1),
                '{' => {
                    let kind = match self.pending.take() {
                        Some(p) => {
                            trace!(header = p.header, line = line.number, "loop body opened");
                            FrameKind::Loop {
                                header: p.header,
                                is_do: p.is_do,
                            }
                        }
                        None => FrameKind::Block,
                    };
                    self.stack.push(Frame {
                        kind,
                        opened_on: line.number,
                    });
                }
                '}' => {
                    // Unbalanced closers are ignored.
                    if let Some(frame) = self.stack.pop() {
                        self.after_do_body =
                            matches!(frame.kind, FrameKind::Loop { is_do: true, .. });
                        continue;
                    }
                }
                ';' if self.paren_depth == 0 => {
                    if let Some(p) = self.pending.take() {
                        trace!(header = p.header, line = line.number, "braceless loop body");
                        braceless_header = Some(p.header);
                    }
                }
                _ => {}
            }

            if ch.is_whitespace() || ch == '{' || ch == '}' {
                continue;
            }
            self.after_do_body = false;
            if let Some(header) = self.innermost_loop() {
                touched_header = Some(header);
            }
        }

        match braceless_header.or(touched_header) {
            Some(header) => LineContext::inside(header),
            None => self.context_at_rest(line.number),
        }
    }

    /// Context from frames still open at end of line, ignoring a loop whose
    /// body opened on this very line (that line is the header).
    fn context_at_rest(&self, number: usize) -> LineContext {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| match frame.kind {
                FrameKind::Loop { header, .. } if frame.opened_on < number => {
                    Some(LineContext::inside(header))
                }
                _ => None,
            })
            .unwrap_or_default()
    }

    fn innermost_loop(&self) -> Option<usize> {
        self.stack.iter().rev().find_map(|frame| match frame.kind {
            FrameKind::Loop { header, .. } => Some(header),
            FrameKind::Block => None,
        })
    }
}
