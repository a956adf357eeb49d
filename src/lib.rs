//! Schema language for live storage documents.
//!
//! Storage documents are plain values plus mutable live collections (live
//! objects, live lists, live maps). This crate carries the two subsystems
//! that share the AST type model:
//!
//! - the **semantic checker**: name resolution with fuzzy suggestions,
//!   duplicate/unused definition detection, cyclic-reference detection, and
//!   static/live classification with strict consistency across reference
//!   sites;
//! - the **type inference engine**: structural schema inference from sample
//!   values, merge/unify with forced-union fallback, scored naming, and AST
//!   generation.
//!
//! ```text
//! source text --[parser]--> AST --[checker]--> CheckedDocument
//! samples --[infer]--> inferred graph --[naming + codegen]--> AST --> text
//! ```

pub mod ast;
pub mod checker;
pub mod cli;
pub mod codegen;
pub mod diagnostics;
pub mod infer;
pub mod jq;
pub mod naming;
pub mod parser;
pub mod plain;
pub mod suggest;

pub use checker::{check, CheckFailed, CheckedDocument, Liveness};
pub use diagnostics::{
    Diagnostic, DiagnosticSource, ErrorReporter, Position, Severity, Suggestion,
};

/// The lint/editor boundary: parse, then check; returns the accumulated
/// diagnostics. Empty on a valid schema.
pub fn get_diagnostics(source: &str) -> Vec<Diagnostic> {
    let mut reporter = ErrorReporter::new(source);
    if let Some(doc) = parser::parse(source, &mut reporter) {
        let _ = checker::check(&doc, &mut reporter);
    }
    reporter.into_diagnostics()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_schemas_yield_no_diagnostics() {
        assert_eq!(get_diagnostics("type Storage {}"), vec![]);
        assert_eq!(get_diagnostics("type Storage { foo?: String }"), vec![]);
    }

    #[test]
    fn parse_errors_come_from_the_parser() {
        let diags = get_diagnostics("type Storage {");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].source, DiagnosticSource::Parser);
        assert_eq!(
            diags[0].message,
            "Expected \"}\" or <identifier> but end of input found."
        );
        let range = diags[0].range.unwrap();
        assert_eq!(range[0], Position { offset: 14, line1: 1, column1: 15 });
        assert_eq!(range[1], Position { offset: 14, line1: 1, column1: 15 });
    }

    #[test]
    fn semantic_errors_come_from_the_checker() {
        let diags = get_diagnostics("type Storage { x: NonExisting }");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].source, DiagnosticSource::Checker);
        assert_eq!(diags[0].message, "Unknown type 'NonExisting'");
        let range = diags[0].range.unwrap();
        assert_eq!(range[0], Position { offset: 18, line1: 1, column1: 19 });
        assert_eq!(range[1], Position { offset: 29, line1: 1, column1: 30 });
    }

    #[test]
    fn document_level_errors_have_no_range() {
        let diags = get_diagnostics("type Henk {}");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].source, DiagnosticSource::Checker);
        assert_eq!(
            diags[0].message,
            "Missing root object type definition named 'Storage'"
        );
        assert_eq!(diags[0].range, None);
    }
}
