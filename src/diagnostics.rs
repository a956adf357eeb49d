//! Diagnostic accumulation and position mapping.
//!
//! The checker (and parser) never unwind on the first problem; they push
//! diagnostics into an `ErrorReporter` and later passes keep running, so one
//! run surfaces every independent problem in a document. The reporter also
//! owns the offset → 1-based line/column conversion used both for message
//! formatting and for the machine-readable diagnostic shape consumed by
//! editor tooling.

use colored::Colorize;
use serde::Serialize;

use crate::ast::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSource {
    Parser,
    Checker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

/// A resolved source position. `line1` and `column1` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub offset: usize,
    pub line1: usize,
    pub column1: usize,
}

/// Quick-fix hints consumed by editor tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Suggestion {
    /// Replace the offending span with `name`.
    #[serde(rename = "replace")]
    Replace { name: String },
    /// Scaffold a missing object type definition named `name`.
    #[serde(rename = "add-object-type-def")]
    AddObjectTypeDef { name: String },
}

/// `range` is `None` for document-level problems (e.g. a missing root
/// definition) that have no source span to point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub source: DiagnosticSource,
    pub severity: Severity,
    pub message: String,
    pub range: Option<[Position; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
}

pub struct ErrorReporter {
    source: String,
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReporter {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        ErrorReporter {
            source: source.to_string(),
            line_starts,
            diagnostics: Vec::new(),
        }
    }

    /// Convert a byte offset into a 1-based line/column position. Offsets
    /// past the end of the source clamp to the last line.
    pub fn to_position(&self, offset: usize) -> Position {
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        Position {
            offset,
            line1: line + 1,
            column1: offset - self.line_starts[line] + 1,
        }
    }

    /// Line number(s) covered by a range, for use inside messages.
    pub fn lineno(&self, range: Range) -> String {
        let start = self.to_position(range[0]).line1;
        let end = self.to_position(range[1]).line1;
        if start == end { format!("{start}") } else { format!("{start}-{end}") }
    }

    pub fn report(
        &mut self,
        source: DiagnosticSource,
        message: impl Into<String>,
        range: Option<Range>,
        suggestions: Vec<Suggestion>,
    ) {
        self.diagnostics.push(Diagnostic {
            source,
            severity: Severity::Error,
            message: message.into(),
            range: range.map(|r| [self.to_position(r[0]), self.to_position(r[1])]),
            suggestions,
        });
    }

    pub fn report_checker(&mut self, message: impl Into<String>, range: Option<Range>) {
        self.report(DiagnosticSource::Checker, message, range, Vec::new());
    }

    pub fn report_checker_with(
        &mut self,
        message: impl Into<String>,
        range: Range,
        suggestions: Vec<Suggestion>,
    ) {
        self.report(DiagnosticSource::Checker, message, Some(range), suggestions);
    }

    pub fn report_parser(&mut self, message: impl Into<String>, range: Range) {
        self.report(DiagnosticSource::Parser, message, Some(range), Vec::new());
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Human-readable rendering with the offending line and a caret span.
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let source_tag = match diagnostic.source {
            DiagnosticSource::Parser => "parser",
            DiagnosticSource::Checker => "checker",
        };
        let mut out = format!(
            "{}{} {}",
            "error".red().bold(),
            format!("[{source_tag}]:").bold(),
            diagnostic.message.bold(),
        );

        if let Some([start, end]) = &diagnostic.range {
            out.push_str(&format!(
                "\n  {} line {}, column {}\n",
                "-->".blue(),
                start.line1,
                start.column1
            ));
            if let Some(line) = self.source.lines().nth(start.line1 - 1) {
                let width = if end.line1 == start.line1 && end.column1 > start.column1 {
                    end.column1 - start.column1
                } else {
                    1
                };
                out.push_str(&format!("   {} {line}\n", "|".blue()));
                out.push_str(&format!(
                    "   {} {}{}",
                    "|".blue(),
                    " ".repeat(start.column1 - 1),
                    "^".repeat(width).red().bold()
                ));
            }
        }

        for suggestion in &diagnostic.suggestions {
            match suggestion {
                Suggestion::Replace { name } => {
                    out.push_str(&format!("\n  {} did you mean '{name}'?", "hint:".green()));
                }
                Suggestion::AddObjectTypeDef { name } => {
                    out.push_str(&format!(
                        "\n  {} add a definition: type {name} {{ ... }}",
                        "hint:".green()
                    ));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_mapping_is_one_based() {
        let r = ErrorReporter::new("type Storage { x: NonExisting }");
        assert_eq!(
            r.to_position(18),
            Position { offset: 18, line1: 1, column1: 19 }
        );
        assert_eq!(
            r.to_position(29),
            Position { offset: 29, line1: 1, column1: 30 }
        );
    }

    #[test]
    fn position_mapping_across_lines() {
        let r = ErrorReporter::new("type A {}\ntype B {\n}\n");
        assert_eq!(r.to_position(0).line1, 1);
        assert_eq!(r.to_position(10), Position { offset: 10, line1: 2, column1: 1 });
        assert_eq!(r.to_position(19), Position { offset: 19, line1: 3, column1: 1 });
        // past the end clamps to the last line
        assert_eq!(r.to_position(100).line1, 4);
    }

    #[test]
    fn lineno_formats_single_and_multi_line_ranges() {
        let r = ErrorReporter::new("abc\ndef\nghi");
        assert_eq!(r.lineno([0, 2]), "1");
        assert_eq!(r.lineno([0, 9]), "1-3");
    }

    #[test]
    fn diagnostic_serialization_shape() {
        let mut r = ErrorReporter::new("type Henk {}");
        r.report_checker("Missing root object type definition named 'Storage'", None);
        let json = serde_json::to_value(&r.diagnostics()[0]).unwrap();
        assert_eq!(json["source"], "checker");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["range"], serde_json::Value::Null);
        assert!(json.get("suggestions").is_none());
    }

    #[test]
    fn suggestion_serialization_shape() {
        let mut r = ErrorReporter::new("x");
        r.report_checker_with(
            "Unknown type 'Strin'",
            [0, 1],
            vec![
                Suggestion::Replace { name: "String".into() },
                Suggestion::AddObjectTypeDef { name: "Strin".into() },
            ],
        );
        let json = serde_json::to_value(&r.diagnostics()[0]).unwrap();
        assert_eq!(json["suggestions"][0]["type"], "replace");
        assert_eq!(json["suggestions"][0]["name"], "String");
        assert_eq!(json["suggestions"][1]["type"], "add-object-type-def");
        assert_eq!(json["range"][0]["column1"], 1);
    }
}
