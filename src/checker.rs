//! Multi-pass semantic checker.
//!
//! Passes, in order: registration (duplicate definitions, only the first
//! wins), liveness classification (self-detection plus a reference-site walk
//! enforcing live/static consistency), structural validation (one walk, all
//! checks independent), the root `Storage` requirement, and the
//! unused-definition sweep.
//!
//! Diagnostics accumulate in the `ErrorReporter`; individual reports never
//! unwind, so one `check` call surfaces every independent problem. The call
//! as a whole fails if anything was reported. Liveness is kept in a
//! side-table on the returned `CheckedDocument` rather than written into the
//! AST, so the same document can be checked or inspected more than once.

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::ast::{
    walk_document, walk_type_expr, BuiltinKind, Document, FieldDef, Identifier,
    ObjectTypeDefinition, Range, TypeExpr, TypeName, TypeRef,
};
use crate::diagnostics::{ErrorReporter, Suggestion};
use crate::plain::LIVE_TYPE_TAG;
use crate::suggest;

/// The mandatory root definition name.
pub const ROOT_NAME: &str = "Storage";

pub(crate) static BUILTIN_KEYWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(String|Int|Float|Boolean)$").unwrap());

/// Names reserved for future use: anything starting with `Live`, plus
/// `Presence` and `Array` exactly.
pub(crate) static RESERVED_NAMES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(Presence$|Array$|Live)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Static,
    Live,
}

#[derive(Debug, Error)]
#[error("schema did not pass semantic checks")]
pub struct CheckFailed;

/// A validated view over a parsed document.
pub struct CheckedDocument<'a> {
    /// The root `Storage` definition.
    pub root: &'a ObjectTypeDefinition,
    /// All definitions, in source order.
    pub definitions: Vec<&'a ObjectTypeDefinition>,
    registry: IndexMap<&'a str, &'a ObjectTypeDefinition>,
    liveness: IndexMap<&'a str, Liveness>,
}

impl<'a> CheckedDocument<'a> {
    /// Resolve a reference to its definition. Guaranteed to succeed for any
    /// `TypeRef` inside a checked document.
    pub fn get_definition(&self, reference: &TypeRef) -> &'a ObjectTypeDefinition {
        match self.registry.get(reference.name.name.as_str()) {
            Some(def) => def,
            None => panic!("unknown type name '{}'", reference.name.name),
        }
    }

    pub fn liveness(&self, name: &str) -> Option<Liveness> {
        self.liveness.get(name).copied()
    }

    pub fn is_static(&self, name: &str) -> bool {
        matches!(self.liveness.get(name), Some(Liveness::Static))
    }
}

pub fn check<'a>(
    doc: &'a Document,
    reporter: &mut ErrorReporter,
) -> Result<CheckedDocument<'a>, CheckFailed> {
    let mut cx = Checker {
        doc,
        reporter,
        registry: IndexMap::new(),
        unreferenced: IndexSet::new(),
        self_live: HashSet::new(),
        referenced_live: HashSet::new(),
        first_plain: HashMap::new(),
        first_live: HashMap::new(),
    };

    cx.register();
    cx.classify_liveness();
    cx.validate();

    // The root requirement is checked regardless of earlier errors, but a
    // missing root aborts before the unused sweep.
    let Some(&root) = cx.registry.get(ROOT_NAME) else {
        cx.reporter.report_checker(
            format!("Missing root object type definition named '{ROOT_NAME}'"),
            None,
        );
        return Err(CheckFailed);
    };

    cx.sweep_unused();

    if cx.reporter.has_errors() {
        return Err(CheckFailed);
    }

    let liveness = cx.liveness_table();
    Ok(CheckedDocument {
        root,
        definitions: doc.definitions.iter().collect(),
        registry: cx.registry,
        liveness,
    })
}

struct Checker<'a, 'r> {
    doc: &'a Document,
    reporter: &'r mut ErrorReporter,
    registry: IndexMap<&'a str, &'a ObjectTypeDefinition>,
    /// Definitions not yet seen at any reference site.
    unreferenced: IndexSet<&'a str>,
    /// Definitions whose own field structure contains a live construct.
    self_live: HashSet<&'a str>,
    /// Definitions referenced as `LiveObject<..>` somewhere.
    referenced_live: HashSet<&'a str>,
    first_plain: HashMap<&'a str, Range>,
    first_live: HashMap<&'a str, Range>,
}

impl<'a> Checker<'a, '_> {
    // ------------------------- pass 1: registration ------------------------ //

    fn register(&mut self) {
        let doc = self.doc;
        for def in &doc.definitions {
            let name = def.name.name.as_str();
            match self.registry.get(name) {
                Some(existing) => {
                    let message = format!(
                        "A type named '{name}' is defined multiple times (on line {} and {})",
                        self.reporter.lineno(existing.name.range),
                        self.reporter.lineno(def.name.range),
                    );
                    self.reporter.report_checker(message, Some(def.name.range));
                }
                None => {
                    self.registry.insert(name, def);
                    self.unreferenced.insert(name);
                }
            }
        }
    }

    // ------------------- pass 2: liveness classification ------------------- //

    fn classify_liveness(&mut self) {
        let doc = self.doc;

        for def in &doc.definitions {
            if contains_live_construct(def) {
                self.self_live.insert(def.name.name.as_str());
            }
        }

        let _: ControlFlow<()> = walk_document(doc, &mut |expr| {
            if let TypeExpr::Ref(r) = expr {
                self.reference_site(r);
            }
            ControlFlow::Continue(())
        });
    }

    fn reference_site(&mut self, r: &'a TypeRef) {
        let name = r.name.name.as_str();
        if !self.registry.contains_key(name) {
            // Unknown names are reported during structural validation.
            return;
        }
        self.unreferenced.shift_remove(name);

        if r.as_live_object {
            self.referenced_live.insert(name);
            if let Some(&first) = self.first_plain.get(name) {
                let message = format!(
                    "Type '{name}' is referenced as 'LiveObject<{name}>' here, but as '{name}' on line {}",
                    self.reporter.lineno(first),
                );
                self.reporter.report_checker(message, Some(r.range));
            }
            self.first_live.entry(name).or_insert(r.range);
        } else if self.self_live.contains(name) {
            let message = format!("Type '{name}' must be referenced as 'LiveObject<{name}>'");
            self.reporter.report_checker_with(
                message,
                r.name.range,
                vec![Suggestion::Replace { name: format!("LiveObject<{name}>") }],
            );
        } else if let Some(&first) = self.first_live.get(name) {
            let message = format!(
                "Type '{name}' is referenced as '{name}' here, but as 'LiveObject<{name}>' on line {}",
                self.reporter.lineno(first),
            );
            self.reporter.report_checker(message, Some(r.range));
        } else {
            self.first_plain.entry(name).or_insert(r.range);
        }
    }

    fn liveness_table(&self) -> IndexMap<&'a str, Liveness> {
        self.registry
            .keys()
            .map(|&name| {
                let live =
                    self.self_live.contains(name) || self.referenced_live.contains(name);
                (name, if live { Liveness::Live } else { Liveness::Static })
            })
            .collect()
    }

    // -------------------- pass 3: structural validation -------------------- //

    fn validate(&mut self) {
        let doc = self.doc;
        for def in &doc.definitions {
            self.check_type_name(&def.name);
            self.check_duplicate_fields(&def.fields);
            for field in &def.fields {
                self.check_identifier(&field.name);
                self.check_type_expr(&field.ty);
            }
            self.check_no_self_reference(def);
        }
    }

    fn check_identifier(&mut self, ident: &Identifier) {
        if ident.name == LIVE_TYPE_TAG {
            self.reporter.report_checker(
                format!("Field name '{LIVE_TYPE_TAG}' is reserved"),
                Some(ident.range),
            );
        }
    }

    fn check_type_name(&mut self, name: &TypeName) {
        let starts_ok = name
            .name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase() || c == '_');
        if !starts_ok {
            self.reporter.report_checker(
                format!(
                    "Type name '{}' must start with an uppercase letter or an underscore",
                    name.name
                ),
                Some(name.range),
            );
        }

        if BUILTIN_KEYWORDS.is_match(&name.name) {
            self.reporter.report_checker(
                format!("Type name '{}' is a built-in type", name.name),
                Some(name.range),
            );
        } else if RESERVED_NAMES.is_match(&name.name) {
            self.reporter.report_checker(
                format!("Type name '{}' is reserved for future use", name.name),
                Some(name.range),
            );
        }
    }

    fn check_duplicate_fields(&mut self, fields: &[FieldDef]) {
        let mut seen: HashMap<&str, Range> = HashMap::new();
        for field in fields {
            let name = field.name.name.as_str();
            match seen.get(name) {
                Some(&first) => {
                    let message = format!(
                        "A field named '{name}' is defined multiple times (on line {} and {})",
                        self.reporter.lineno(first),
                        self.reporter.lineno(field.name.range),
                    );
                    self.reporter.report_checker(message, Some(field.name.range));
                }
                None => {
                    seen.insert(name, field.name.range);
                }
            }
        }
    }

    fn check_type_expr(&mut self, expr: &'a TypeExpr) {
        match expr {
            TypeExpr::Builtin { .. } => {}
            TypeExpr::Array(a) => {
                if a.of_type.is_live_construct() {
                    self.reporter.report_checker(
                        "Live types cannot be nested inside arrays",
                        Some(a.of_type.range()),
                    );
                }
                self.check_type_expr(&a.of_type);
            }
            TypeExpr::LiveList(l) => self.check_type_expr(&l.of_type),
            TypeExpr::LiveMap(m) => {
                self.check_type_expr(&m.key_type);
                self.check_type_expr(&m.value_type);
            }
            TypeExpr::ObjectLiteral(o) => {
                self.check_duplicate_fields(&o.fields);
                for field in &o.fields {
                    self.check_identifier(&field.name);
                    if field.ty.is_live_construct() {
                        self.reporter.report_checker(
                            "Live types cannot be nested inside object literals",
                            Some(field.ty.range()),
                        );
                    }
                    self.check_type_expr(&field.ty);
                }
            }
            TypeExpr::Ref(r) => self.check_type_ref(r),
        }
    }

    fn check_type_ref(&mut self, r: &'a TypeRef) {
        self.check_type_name(&r.name);

        let name = r.name.name.as_str();
        if self.registry.contains_key(name) {
            return;
        }

        if r.as_live_object {
            // Suggestions differ by context: a live-wrapped reference can
            // only ever point at an object type.
            let object_candidates: Vec<&str> = self.registry.keys().copied().collect();
            if BUILTIN_KEYWORDS.is_match(name) {
                let suggestions = replace_suggestions(name, &object_candidates);
                self.reporter.report_checker_with(
                    format!("Type '{name}' is not an object type"),
                    r.name.range,
                    suggestions,
                );
            } else {
                let mut suggestions = replace_suggestions(name, &object_candidates);
                if suggestions.is_empty() && is_definable_name(name) {
                    suggestions.push(Suggestion::AddObjectTypeDef { name: name.to_string() });
                }
                self.reporter.report_checker_with(
                    format!("Unknown type '{name}'"),
                    r.name.range,
                    suggestions,
                );
            }
        } else {
            let candidates: Vec<&str> = self
                .registry
                .keys()
                .copied()
                .chain(BuiltinKind::ALL.iter().map(|k| k.name()))
                .collect();
            let mut replacements = suggest::suggest(name, &candidates);
            if replacements.is_empty()
                && (name.eq_ignore_ascii_case("number") || name.eq_ignore_ascii_case("num"))
            {
                replacements = vec!["Float".to_string(), "Int".to_string()];
            }
            let mut suggestions: Vec<Suggestion> = replacements
                .into_iter()
                .map(|name| Suggestion::Replace { name })
                .collect();
            if suggestions.is_empty() && is_definable_name(name) {
                suggestions.push(Suggestion::AddObjectTypeDef { name: name.to_string() });
            }
            self.reporter.report_checker_with(
                format!("Unknown type '{name}'"),
                r.name.range,
                suggestions,
            );
        }
    }

    /// Depth-first self-reference detection. Walks every field (optional
    /// fields included), descending through resolved references with the
    /// forbidden set extended per path.
    fn check_no_self_reference(&mut self, def: &'a ObjectTypeDefinition) {
        let mut forbidden: HashSet<&'a str> = HashSet::new();
        forbidden.insert(def.name.name.as_str());
        for field in &def.fields {
            self.no_forbidden_refs(&field.ty, &mut forbidden);
        }
    }

    fn no_forbidden_refs(&mut self, expr: &'a TypeExpr, forbidden: &mut HashSet<&'a str>) {
        match expr {
            TypeExpr::Builtin { .. } => {}
            TypeExpr::Array(a) => self.no_forbidden_refs(&a.of_type, forbidden),
            TypeExpr::LiveList(l) => self.no_forbidden_refs(&l.of_type, forbidden),
            TypeExpr::LiveMap(m) => {
                self.no_forbidden_refs(&m.key_type, forbidden);
                self.no_forbidden_refs(&m.value_type, forbidden);
            }
            TypeExpr::ObjectLiteral(o) => {
                for field in &o.fields {
                    self.no_forbidden_refs(&field.ty, forbidden);
                }
            }
            TypeExpr::Ref(r) => {
                let name = r.name.name.as_str();
                if forbidden.contains(name) {
                    self.reporter.report_checker(
                        format!("Cyclical reference detected: '{name}'"),
                        Some(r.range),
                    );
                    return;
                }
                if let Some(&target) = self.registry.get(name) {
                    if forbidden.insert(name) {
                        for field in &target.fields {
                            self.no_forbidden_refs(&field.ty, forbidden);
                        }
                        forbidden.remove(name);
                    }
                }
            }
        }
    }

    // ---------------------- pass 5: unused definitions --------------------- //

    fn sweep_unused(&mut self) {
        let unreferenced: Vec<&'a str> = self
            .unreferenced
            .iter()
            .copied()
            .filter(|&name| name != ROOT_NAME)
            .collect();
        for name in unreferenced {
            if let Some(&def) = self.registry.get(name) {
                self.reporter.report_checker(
                    format!("Type '{name}' is defined but never used"),
                    Some(def.name.range),
                );
            }
        }
    }
}

/// True if the definition's own field structure (not crossing through other
/// named types) contains a live construct. Short-circuits at the first hit.
fn contains_live_construct(def: &ObjectTypeDefinition) -> bool {
    for field in &def.fields {
        let flow = walk_type_expr(&field.ty, &mut |e| {
            if e.is_live_construct() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        if flow.is_break() {
            return true;
        }
    }
    false
}

fn replace_suggestions(name: &str, candidates: &[&str]) -> Vec<Suggestion> {
    suggest::suggest(name, candidates)
        .into_iter()
        .map(|name| Suggestion::Replace { name })
        .collect()
}

/// Whether `name` could legally become a new object type definition, making
/// an "add a definition" quick-fix sensible.
fn is_definable_name(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase() || c == '_')
        && !BUILTIN_KEYWORDS.is_match(name)
        && !RESERVED_NAMES.is_match(name)
}
