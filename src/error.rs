//! Error types for every stage (lex, parse, run) plus the caret-underline
//! renderer and the runtime traceback builder.

use crate::env::Context;
use crate::position::Position;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Renders the offending line(s) of source with `^^^` under the span
/// `[pos_start, pos_end)`.
pub fn string_with_arrows(text: &str, pos_start: &Position, pos_end: &Position) -> String {
    let mut result = String::new();

    let mut idx_start = text[..pos_start.index.max(0) as usize]
        .rfind('\n')
        .map(|i| i as isize)
        .unwrap_or(-1)
        .max(0);
    let mut idx_end = find_from(text, idx_start + 1).unwrap_or(text.len() as isize);
    if idx_end < 0 {
        idx_end = text.len() as isize;
    }

    let line_count = (pos_end.line - pos_start.line + 1).max(1);
    for i in 0..line_count {
        let line = slice(text, idx_start, idx_end);
        let col_start = if i == 0 { pos_start.column } else { 0 };
        let col_end = if i == line_count - 1 { pos_end.column } else { line.chars().count() as isize - 1 };

        result.push_str(&line);
        result.push('\n');
        let pad = " ".repeat(col_start.max(0) as usize);
        let carets = "^".repeat((col_end - col_start).max(1) as usize);
        result.push_str(&pad);
        result.push_str(&carets);

        idx_start = idx_end;
        idx_end = find_from(text, idx_start + 1).unwrap_or(text.len() as isize);
        if idx_end < 0 {
            idx_end = text.len() as isize;
        }
    }

    result.replace('\t', "")
}

fn find_from(text: &str, from: isize) -> Option<isize> {
    let from = from.max(0) as usize;
    if from > text.len() {
        return None;
    }
    text[from..].find('\n').map(|i| (i + from) as isize)
}

fn slice(text: &str, start: isize, end: isize) -> String {
    let start = start.max(0) as usize;
    let end = (end.max(start as isize) as usize).min(text.len());
    text.get(start..end).unwrap_or("").to_string()
}

/// Wraps long error detail text at roughly 60 columns, as the original
/// implementation's `RTError.as_string` did for the `details` line.
pub fn word_wrap(text: &str, width: usize) -> String {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Error)]
pub enum LexError {
    #[error("Illegal Character")]
    IllegalCharacter { details: String, pos_start: Position, pos_end: Position },
    #[error("Expected Character")]
    ExpectedCharacter { details: String, pos_start: Position, pos_end: Position },
}

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("Invalid Syntax")]
    InvalidSyntax { details: String, pos_start: Position, pos_end: Position },
}

#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("Runtime Error")]
    RuntimeError { details: String, pos_start: Position, pos_end: Position, context: Rc<Context> },
}

impl RuntimeError {
    pub fn new(details: impl Into<String>, pos_start: Position, pos_end: Position, context: Rc<Context>) -> Self {
        RuntimeError::RuntimeError { details: details.into(), pos_start, pos_end, context }
    }
}

/// Top-level error produced anywhere in the pipeline; each variant knows how
/// to render itself with a file/line header, the caret-underlined snippet
/// and, for runtime errors, a call-stack traceback.
#[derive(Debug, Clone, Error)]
pub enum MathScriptError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl MathScriptError {
    pub fn as_string(&self) -> String {
        match self {
            MathScriptError::Lex(LexError::IllegalCharacter { details, pos_start, pos_end })
            | MathScriptError::Lex(LexError::ExpectedCharacter { details, pos_start, pos_end }) => {
                let name = match self {
                    MathScriptError::Lex(LexError::IllegalCharacter { .. }) => "Illegal Character",
                    _ => "Expected Character",
                };
                header_and_arrows(name, details, pos_start, pos_end, true)
            }
            MathScriptError::Parse(ParseError::InvalidSyntax { details, pos_start, pos_end }) => {
                header_and_arrows("Invalid Syntax", details, pos_start, pos_end, true)
            }
            MathScriptError::Runtime(RuntimeError::RuntimeError { details, pos_start, pos_end, context }) => {
                let mut result = generate_traceback(pos_start, context);
                result.push_str(&header_and_arrows("Runtime Error", details, pos_start, pos_end, false));
                result
            }
        }
    }
}

fn header_and_arrows(name: &str, details: &str, pos_start: &Position, pos_end: &Position, include_column: bool) -> String {
    let location = if include_column {
        format!("File {}, line {} at column {}", pos_start.filename, pos_start.line + 1, pos_start.column)
    } else {
        format!("File {}, line {}", pos_start.filename, pos_start.line + 1)
    };

    format!(
        "{name}: {}\n{location}\n\n{}",
        word_wrap(details, 60),
        string_with_arrows(&pos_start.text, pos_start, pos_end)
    )
}

fn generate_traceback(pos_start: &Position, context: &Rc<Context>) -> String {
    let mut result = String::new();
    let mut pos = pos_start.clone();
    let mut ctx = Some(context.clone());

    while let Some(c) = ctx {
        result = format!(
            "  File {}, line {}, in {}\n{}",
            pos.filename,
            pos.line + 1,
            c.display_name,
            result
        );
        match (&c.parent_entry_pos, &c.parent) {
            (Some(p), Some(parent)) => {
                pos = p.clone();
                ctx = Some(parent.clone());
            }
            _ => break,
        }
    }

    format!("Traceback (most recent call last):\n{result}")
}

impl fmt::Display for MathScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc as StdRc;

    fn pos(idx: isize, line: isize, col: isize, text: &str) -> Position {
        Position::new(idx, line, col, StdRc::from("<test>"), StdRc::from(text))
    }

    #[test]
    fn string_with_arrows_underlines_a_single_line() {
        let text = "1 + @";
        let out = string_with_arrows(text, &pos(4, 0, 4, text), &pos(5, 0, 5, text));
        assert!(out.contains("1 + @"));
        assert!(out.contains('^'));
    }

    #[test]
    fn word_wrap_breaks_long_lines() {
        let wrapped = word_wrap("one two three four five six seven eight nine ten eleven twelve", 20);
        assert!(wrapped.lines().all(|l| l.len() <= 20));
    }

    #[test]
    fn runtime_error_traceback_includes_display_name() {
        let ctx = Context::root("<program>");
        let err = RuntimeError::new("boom", pos(0, 0, 0, "x"), pos(1, 0, 1, "x"), ctx);
        let rendered = MathScriptError::from(err).as_string();
        assert!(rendered.contains("<program>"));
        assert!(rendered.contains("Runtime Error"));
    }
}
