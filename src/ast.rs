//! AST node model shared by the parser, the checker and schema generation.
//!
//! A closed set of node variants, each carrying a source `Range` (half-open
//! byte offset pair into the original source text). Synthesized nodes (built
//! by codegen rather than the parser) use the zero range.
//!
//! No serde_json::Value here; the sample-value side lives in `plain`.

use std::ops::ControlFlow;

/// Half-open `[start, end]` byte offsets, `start <= end`.
pub type Range = [usize; 2];

/// Range used for synthesized nodes that have no source location.
pub const ZERO_RANGE: Range = [0, 0];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Non-empty, in source order.
    pub definitions: Vec<ObjectTypeDefinition>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTypeDefinition {
    pub name: TypeName,
    pub fields: Vec<FieldDef>,
    pub leading_comment: Option<String>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: Identifier,
    pub optional: bool,
    pub ty: TypeExpr,
    pub leading_comment: Option<String>,
    pub trailing_comment: Option<String>,
    pub range: Range,
}

/// Name of a user-defined type. Distinct from `Identifier` because type
/// names and field names obey different validation rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub name: String,
    pub range: Range,
}

/// A field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub range: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    String,
    Int,
    Float,
    Boolean,
}

impl BuiltinKind {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::String => "String",
            BuiltinKind::Int => "Int",
            BuiltinKind::Float => "Float",
            BuiltinKind::Boolean => "Boolean",
        }
    }

    pub const ALL: [BuiltinKind; 4] = [
        BuiltinKind::String,
        BuiltinKind::Int,
        BuiltinKind::Float,
        BuiltinKind::Boolean,
    ];
}

/// Plain array of some element type, e.g. `String[]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayExpr {
    pub of_type: Box<TypeExpr>,
    pub range: Range,
}

/// Anonymous inline object, e.g. `{ x: Int, y: Int }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLiteralExpr {
    pub fields: Vec<FieldDef>,
    pub range: Range,
}

/// Reference to a named type, optionally wrapped as `LiveObject<Name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: TypeName,
    pub as_live_object: bool,
    pub range: Range,
}

/// `LiveList<T>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveListExpr {
    pub of_type: Box<TypeExpr>,
    pub range: Range,
}

/// `LiveMap<K, V>`. Present in the grammar; inference and schema generation
/// do not support it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveMapExpr {
    pub key_type: Box<TypeExpr>,
    pub value_type: Box<TypeExpr>,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Builtin { kind: BuiltinKind, range: Range },
    Array(ArrayExpr),
    ObjectLiteral(ObjectLiteralExpr),
    Ref(TypeRef),
    LiveList(LiveListExpr),
    LiveMap(LiveMapExpr),
}

impl TypeExpr {
    pub fn range(&self) -> Range {
        match self {
            TypeExpr::Builtin { range, .. } => *range,
            TypeExpr::Array(e) => e.range,
            TypeExpr::ObjectLiteral(e) => e.range,
            TypeExpr::Ref(e) => e.range,
            TypeExpr::LiveList(e) => e.range,
            TypeExpr::LiveMap(e) => e.range,
        }
    }

    /// True for the constructs that make a containing object type live:
    /// `LiveObject<..>` references, `LiveList<..>` and `LiveMap<..>`.
    pub fn is_live_construct(&self) -> bool {
        match self {
            TypeExpr::Ref(r) => r.as_live_object,
            TypeExpr::LiveList(_) | TypeExpr::LiveMap(_) => true,
            _ => false,
        }
    }

    pub fn is_builtin_scalar(&self) -> bool {
        matches!(self, TypeExpr::Builtin { .. })
    }
}

// ------------------------- synthesized-node helpers ------------------------ //

impl TypeName {
    pub fn synthesized(name: impl Into<String>) -> Self {
        TypeName { name: name.into(), range: ZERO_RANGE }
    }
}

impl Identifier {
    pub fn synthesized(name: impl Into<String>) -> Self {
        Identifier { name: name.into(), range: ZERO_RANGE }
    }
}

pub fn builtin(kind: BuiltinKind) -> TypeExpr {
    TypeExpr::Builtin { kind, range: ZERO_RANGE }
}

pub fn array_expr(of_type: TypeExpr) -> TypeExpr {
    TypeExpr::Array(ArrayExpr { of_type: Box::new(of_type), range: ZERO_RANGE })
}

pub fn live_list_expr(of_type: TypeExpr) -> TypeExpr {
    TypeExpr::LiveList(LiveListExpr { of_type: Box::new(of_type), range: ZERO_RANGE })
}

pub fn type_ref(name: impl Into<String>, as_live_object: bool) -> TypeExpr {
    TypeExpr::Ref(TypeRef {
        name: TypeName::synthesized(name),
        as_live_object,
        range: ZERO_RANGE,
    })
}

pub fn field_def(name: impl Into<String>, optional: bool, ty: TypeExpr) -> FieldDef {
    FieldDef {
        name: Identifier::synthesized(name),
        optional,
        ty,
        leading_comment: None,
        trailing_comment: None,
        range: ZERO_RANGE,
    }
}

pub fn object_type_definition(name: impl Into<String>, fields: Vec<FieldDef>) -> ObjectTypeDefinition {
    ObjectTypeDefinition {
        name: TypeName::synthesized(name),
        fields,
        leading_comment: None,
        range: ZERO_RANGE,
    }
}

pub fn document(definitions: Vec<ObjectTypeDefinition>) -> Document {
    Document { definitions, range: ZERO_RANGE }
}

// ------------------------------- traversal --------------------------------- //

/// Depth-first walk over a type expression and everything nested in it.
/// The callback sees every `TypeExpr` node (the given one first) and can
/// short-circuit the walk by returning `ControlFlow::Break`.
pub fn walk_type_expr<'a, B>(
    expr: &'a TypeExpr,
    f: &mut impl FnMut(&'a TypeExpr) -> ControlFlow<B>,
) -> ControlFlow<B> {
    f(expr)?;
    match expr {
        TypeExpr::Builtin { .. } | TypeExpr::Ref(_) => {}
        TypeExpr::Array(a) => walk_type_expr(&a.of_type, f)?,
        TypeExpr::LiveList(l) => walk_type_expr(&l.of_type, f)?,
        TypeExpr::LiveMap(m) => {
            walk_type_expr(&m.key_type, f)?;
            walk_type_expr(&m.value_type, f)?;
        }
        TypeExpr::ObjectLiteral(o) => {
            for field in &o.fields {
                walk_type_expr(&field.ty, f)?;
            }
        }
    }
    ControlFlow::Continue(())
}

/// Walk every type expression in the document, in source order.
pub fn walk_document<'a, B>(
    doc: &'a Document,
    f: &mut impl FnMut(&'a TypeExpr) -> ControlFlow<B>,
) -> ControlFlow<B> {
    for def in &doc.definitions {
        for field in &def.fields {
            walk_type_expr(&field.ty, f)?;
        }
    }
    ControlFlow::Continue(())
}

// --------------------------------- tests ----------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_construct_predicate() {
        assert!(type_ref("Foo", true).is_live_construct());
        assert!(!type_ref("Foo", false).is_live_construct());
        assert!(live_list_expr(builtin(BuiltinKind::Int)).is_live_construct());
        assert!(!array_expr(builtin(BuiltinKind::Int)).is_live_construct());
    }

    #[test]
    fn walk_visits_nested_expressions() {
        let expr = array_expr(TypeExpr::ObjectLiteral(ObjectLiteralExpr {
            fields: vec![
                field_def("a", false, builtin(BuiltinKind::Int)),
                field_def("b", false, type_ref("Foo", false)),
            ],
            range: ZERO_RANGE,
        }));

        let mut seen = 0usize;
        let flow = walk_type_expr(&expr, &mut |_| {
            seen += 1;
            ControlFlow::<()>::Continue(())
        });
        assert!(flow.is_continue());
        // array + literal + Int + Foo
        assert_eq!(seen, 4);
    }

    #[test]
    fn walk_short_circuits_on_break() {
        let expr = array_expr(live_list_expr(builtin(BuiltinKind::Int)));
        let mut seen = 0usize;
        let flow = walk_type_expr(&expr, &mut |e| {
            seen += 1;
            if e.is_live_construct() { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        });
        assert!(flow.is_break());
        assert_eq!(seen, 2);
    }
}
