//! CLI: check schema files, or infer a schema from sample documents.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde_json::Value;

use crate::checker;
use crate::codegen;
use crate::diagnostics::ErrorReporter;
use crate::infer::{self, InferredObjectType};
use crate::parser;
use crate::plain;

// ------------------------------- types ------------------------------------- //

/// check schema documents, or infer a schema from JSON/NDJSON samples
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse and check schema files, printing diagnostics
    Check(CheckSettings),
    /// infer a schema from sample documents and print it as schema text
    Infer(InferSettings),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs; literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct CheckSettings {
    #[command(flatten)]
    input_settings: InputSettings,

    /// emit diagnostics as JSON instead of human-readable text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct InferSettings {
    #[command(flatten)]
    input_settings: InputSettings,

    /// treat input as newline-delimited JSON (one sample per line)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// jq filter applied to each document before inference
    #[arg(long)]
    jq_expr: Option<String>,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ---------------------------- implementation ------------------------------- //

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Check(settings) => run_check(settings),
            Command::Infer(settings) => run_infer(settings),
        }
    }
}

fn run_check(settings: &CheckSettings) -> Result<()> {
    let paths = resolve_file_path_patterns(&settings.input_settings.input)?;
    let mut failed = 0usize;

    for path in &paths {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let mut reporter = ErrorReporter::new(&source);
        if let Some(doc) = parser::parse(&source, &mut reporter) {
            let _ = checker::check(&doc, &mut reporter);
        }

        if settings.json {
            println!("{}", serde_json::to_string_pretty(reporter.diagnostics())?);
        } else {
            for diagnostic in reporter.diagnostics() {
                eprintln!("{}: {}\n", path.display(), reporter.render(diagnostic));
            }
        }
        if reporter.has_errors() {
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{failed} of {} schema file(s) had errors", paths.len());
    }
    Ok(())
}

fn run_infer(settings: &InferSettings) -> Result<()> {
    let paths = resolve_file_path_patterns(&settings.input_settings.input)?;

    // samples are independent and storage folding is associative, so
    // per-file inference runs in parallel and folds sequentially after
    let per_file: Vec<Vec<InferredObjectType>> = paths
        .par_iter()
        .map(|path| infer_file(path, settings))
        .collect::<Result<_>>()?;

    let mut folded: Option<InferredObjectType> = None;
    for inferred in per_file.into_iter().flatten() {
        folded = Some(match folded {
            None => inferred,
            Some(acc) => infer::merge_storage_types(&acc, &inferred)
                .ok_or_else(|| anyhow!(infer::InferError::IncompatibleSamples))?,
        });
    }
    let root = folded.ok_or_else(|| anyhow!("no samples found in the given inputs"))?;

    let doc = codegen::inferred_to_ast(&root)?;
    let schema_text = codegen::write_schema_text(&doc);

    if let Some(out) = settings.out.as_ref() {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(out, &schema_text)
            .with_context(|| format!("failed to write {}", out.display()))?;
    } else {
        println!("{schema_text}");
    }
    Ok(())
}

fn infer_file(path: &PathBuf, settings: &InferSettings) -> Result<Vec<InferredObjectType>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let documents: Vec<Value> = if settings.ndjson {
        source
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(parse_sample)
            .collect::<Result<_>>()
            .with_context(|| format!("in {}", path.display()))?
    } else {
        vec![parse_sample(&source).with_context(|| format!("in {}", path.display()))?]
    };

    let samples: Vec<Value> = match settings.jq_expr.as_ref() {
        None => documents,
        Some(jq_expr) => {
            let mut out = Vec::new();
            for document in &documents {
                for produced in crate::jq::apply_filter(jq_expr, document)? {
                    out.push(parse_sample(&produced)?);
                }
            }
            out
        }
    };

    samples
        .iter()
        .map(|sample| {
            infer::infer_storage_type(sample)
                .map_err(|err| anyhow!(err).context(format!("in {}", path.display())))
        })
        .collect()
}

fn parse_sample(src: &str) -> Result<Value> {
    plain::from_str_with_path(src).map_err(|err| anyhow!("invalid JSON sample: {err}"))
}

// ------------------------------- helpers ----------------------------------- //

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "b/c.json"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.json"), PathBuf::from("b/c.json")]);
    }

    #[test]
    fn unmatched_globs_are_errors() {
        assert!(resolve_file_path_patterns(["definitely-missing-*.json"]).is_err());
    }
}
