//! jq preprocessing for sample documents (jaq-based).
//!
//! The CLI lets users carve the relevant subtree out of each sample file
//! before inference, e.g. `--jq-expr '.room.storage'`. One input document
//! can fan out into several samples.

use anyhow::{anyhow, Result};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

/// Apply a jq filter to one document; returns the produced values as JSON
/// text (one string per output).
pub fn apply_filter(filter_src: &str, input: &Value) -> Result<Vec<String>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader.load(&arena, program).map_err(format_parse_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(format_undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let mut outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut out = Vec::new();
    while let Some(item) = outputs.next() {
        let v = item.map_err(|e| anyhow!(format!("{e:?}")))?;
        out.push(format!("{v}"));
    }
    Ok(out)
}

fn format_parse_errors(errs: Vec<(load::File<&str, ()>, load::Error<&str>)>) -> anyhow::Error {
    let mut s = String::new();
    for (file, err) in errs {
        s.push_str(&format!("jq parse error: {err:?} in `{}`\n", file.code));
    }
    anyhow!(s)
}

fn format_undefined_errors(
    errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>,
) -> anyhow::Error {
    let mut s = String::new();
    for (file, list) in errs {
        for (name, undef) in list {
            s.push_str(&format!("jq undefined `{name}`: {undef:?} in `{}`\n", file.code));
        }
    }
    anyhow!(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_filter_passes_the_document_through() {
        let input = json!({ "a": 1 });
        let out = apply_filter(".", &input).unwrap();
        assert_eq!(out.len(), 1);
        let round: Value = serde_json::from_str(&out[0]).unwrap();
        assert_eq!(round, input);
    }

    #[test]
    fn filters_can_fan_out() {
        let input = json!({ "rooms": [ { "x": 1 }, { "x": 2 } ] });
        let out = apply_filter(".rooms[]", &input).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn bad_filters_error() {
        assert!(apply_filter("][", &json!(null)).is_err());
    }
}
