//! Scored name candidates and final name assignment.
//!
//! Every inferred object, list and union accumulates a weighted table of
//! human-readable name proposals from the contexts in which the value was
//! observed (enclosing field name, parent type). Merging two inferred types
//! merges their tables by summing weights. A separate assignment pass ranks
//! the candidates and resolves collisions into one unique, schema-valid name
//! per synthesized object type.

use std::collections::BTreeMap;
use std::collections::HashSet;

use ordered_float::OrderedFloat;

use crate::checker::{BUILTIN_KEYWORDS, RESERVED_NAMES, ROOT_NAME};

/// Candidate name → weight.
pub type ScoredNames = BTreeMap<String, OrderedFloat<f64>>;

pub fn scored(name: impl Into<String>, weight: f64) -> ScoredNames {
    let mut names = ScoredNames::new();
    names.insert(name.into(), OrderedFloat(weight));
    names
}

/// Merge two candidate tables, summing the weights of shared names.
pub fn merge_scored_names(a: &ScoredNames, b: &ScoredNames) -> ScoredNames {
    let mut out = a.clone();
    for (name, weight) in b {
        *out.entry(name.clone()).or_insert(OrderedFloat(0.0)) += *weight;
    }
    out
}

/// Candidates for a value observed under `field` inside a parent type with
/// the given candidate table: the PascalCased singular of the field name at
/// full weight, plus parent-qualified variants at half the parent's weight.
pub fn generate_names(field: &str, parent: &ScoredNames) -> ScoredNames {
    let base = pascal_case(&singularize(field));
    let mut out = ScoredNames::new();
    if base.is_empty() {
        return out;
    }
    out.insert(base.clone(), OrderedFloat(1.0));
    for (parent_name, weight) in parent {
        out.insert(format!("{parent_name}{base}"), OrderedFloat(weight.0 * 0.5));
    }
    out
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    if word.len() > 1 && word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

fn pascal_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c == ' ')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Tracks assigned names and resolves each object type's candidate table
/// into a unique final name.
#[derive(Debug, Default)]
pub struct NameRegistry {
    used: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The root always takes the reserved root name.
    pub fn assign_root(&mut self) -> String {
        self.used.insert(ROOT_NAME.to_string());
        ROOT_NAME.to_string()
    }

    /// Pick the best unclaimed, schema-valid candidate; fall back to numeric
    /// suffixes on the top candidate when everything collides.
    pub fn assign(&mut self, names: &ScoredNames) -> String {
        let mut ranked: Vec<(&String, OrderedFloat<f64>)> =
            names.iter().map(|(name, &weight)| (name, weight)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        for (candidate, _) in &ranked {
            if is_assignable(candidate) && !self.used.contains(*candidate) {
                self.used.insert((*candidate).clone());
                return (*candidate).clone();
            }
        }

        // Everything collided: fall back to numeric suffixes on the best
        // candidate whose suffixed forms are still schema-valid.
        let base = ranked
            .iter()
            .map(|(name, _)| (*name).clone())
            .find(|name| is_assignable(name))
            .or_else(|| {
                ranked
                    .first()
                    .map(|(name, _)| (*name).clone())
                    .filter(|name| is_assignable(&format!("{name}2")))
            })
            .unwrap_or_else(|| "AnonymousType".to_string());
        if is_assignable(&base) && !self.used.contains(&base) {
            self.used.insert(base.clone());
            return base;
        }
        for n in 2usize.. {
            let candidate = format!("{base}{n}");
            if is_assignable(&candidate) && !self.used.contains(&candidate) {
                self.used.insert(candidate.clone());
                return candidate;
            }
        }
        unreachable!("numeric suffixes are unbounded");
    }
}

/// A generated name must itself pass the checker's type-name rules and must
/// not shadow the root.
fn is_assignable(name: &str) -> bool {
    name != ROOT_NAME
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase() || c == '_')
        && !BUILTIN_KEYWORDS.is_match(name)
        && !RESERVED_NAMES.is_match(name)
}
