//! Schema generation: inferred type graph → AST, and AST → schema text.
//!
//! Each distinct inferred object type becomes one named definition; nested
//! objects and lists become `TypeRef` / `ArrayExpr` / `LiveListExpr`
//! reference sites. Union lowering is not implemented yet, and neither are
//! the shapes that only unions could express (mixed scalar kinds). Lowering
//! refuses to emit a schema the checker itself would reject (live constructs
//! under plain containers).

use thiserror::Error;

use crate::ast::{self, BuiltinKind, Document, FieldDef, ObjectTypeDefinition, TypeExpr};
use crate::infer::{
    InferredFieldRef, InferredObjectType, InferredScalarType, InferredType, InferredUnionType,
};
use crate::naming::NameRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("union types cannot be expressed in the schema language yet")]
    UnionNotImplemented,
    #[error("values of mixed scalar kinds cannot be expressed without union types")]
    MixedScalar,
    #[error("cannot derive a type for an always-null value")]
    NullOnlyValue,
    #[error("cannot derive an element type for an always-empty list")]
    EmptyList,
    #[error("live types cannot be nested inside plain containers")]
    LiveInsidePlainContainer,
}

/// Lower an inferred root into an AST document: the root definition first,
/// then nested object types in discovery order, each under its
/// registry-assigned name.
pub fn inferred_to_ast(root: &InferredObjectType) -> Result<Document, CodegenError> {
    let mut cg = AstGen { registry: NameRegistry::new(), definitions: Vec::new() };
    cg.lower_object(root)?;
    let definitions = cg.definitions.into_iter().flatten().collect();
    Ok(ast::document(definitions))
}

struct AstGen {
    registry: NameRegistry,
    /// Slots reserved in discovery order; filled once a definition's fields
    /// are fully lowered.
    definitions: Vec<Option<ObjectTypeDefinition>>,
}

impl AstGen {
    fn lower_object(&mut self, obj: &InferredObjectType) -> Result<String, CodegenError> {
        let name = if obj.atomic {
            self.registry.assign_root()
        } else {
            self.registry.assign(&obj.names)
        };
        let slot = self.definitions.len();
        self.definitions.push(None);

        let mut fields = Vec::with_capacity(obj.fields.len());
        for (field_name, field) in &obj.fields {
            fields.push(self.lower_field(field_name, field)?);
        }
        self.definitions[slot] = Some(ast::object_type_definition(name.clone(), fields));
        Ok(name)
    }

    fn lower_field(&mut self, name: &str, field: &InferredFieldRef) -> Result<FieldDef, CodegenError> {
        // observed nulls surface as field optionality
        let nullable = matches!(&field.value, InferredType::Scalar(s) if s.nullable);
        let ty = self.lower_type(&field.value, false)?;
        Ok(ast::field_def(name, field.optional || nullable, ty))
    }

    /// `inside_plain` is true below a plain array; a live construct there
    /// would produce a schema the checker rejects.
    fn lower_type(
        &mut self,
        value: &InferredType,
        inside_plain: bool,
    ) -> Result<TypeExpr, CodegenError> {
        match value {
            InferredType::Scalar(s) => scalar_type_expr(s),
            InferredType::Object(o) => {
                if inside_plain && o.live {
                    return Err(CodegenError::LiveInsidePlainContainer);
                }
                let name = self.lower_object(o)?;
                Ok(ast::type_ref(name, o.live))
            }
            InferredType::List(l) => {
                if inside_plain && l.live {
                    return Err(CodegenError::LiveInsidePlainContainer);
                }
                let element = self.lower_members(&l.members, !l.live)?;
                Ok(if l.live { ast::live_list_expr(element) } else { ast::array_expr(element) })
            }
            InferredType::Union(u) => match u.members.as_slice() {
                [single] => self.lower_type(single, inside_plain),
                _ => Err(CodegenError::UnionNotImplemented),
            },
        }
    }

    fn lower_members(
        &mut self,
        members: &InferredUnionType,
        inside_plain: bool,
    ) -> Result<TypeExpr, CodegenError> {
        match members.members.as_slice() {
            [] => Err(CodegenError::EmptyList),
            [single] => self.lower_type(single, inside_plain),
            _ => Err(CodegenError::UnionNotImplemented),
        }
    }
}

fn scalar_type_expr(s: &InferredScalarType) -> Result<TypeExpr, CodegenError> {
    if s.is_null_only() {
        return Err(CodegenError::NullOnlyValue);
    }
    if s.kind_count() > 1 {
        return Err(CodegenError::MixedScalar);
    }
    if s.has_bool {
        return Ok(ast::builtin(BuiltinKind::Boolean));
    }
    if let Some(num) = &s.num {
        let kind = if num.saw_float { BuiltinKind::Float } else { BuiltinKind::Int };
        return Ok(ast::builtin(kind));
    }
    Ok(ast::builtin(BuiltinKind::String))
}

// ----------------------------- schema text --------------------------------- //

/// Prints an AST document back as schema source text.
pub struct SchemaWriter {
    out: String,
}

impl Default for SchemaWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaWriter {
    pub fn new() -> Self {
        SchemaWriter { out: String::new() }
    }

    pub fn emit(&mut self, doc: &Document) {
        for (i, def) in doc.definitions.iter().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            self.write_definition(def);
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn write_definition(&mut self, def: &ObjectTypeDefinition) {
        if let Some(comment) = &def.leading_comment {
            for line in comment.lines() {
                self.out.push_str(&format!("// {line}\n"));
            }
        }
        if def.fields.is_empty() {
            self.out.push_str(&format!("type {} {{}}\n", def.name.name));
            return;
        }
        self.out.push_str(&format!("type {} {{\n", def.name.name));
        for field in &def.fields {
            if let Some(comment) = &field.leading_comment {
                for line in comment.lines() {
                    self.out.push_str(&format!("  // {line}\n"));
                }
            }
            let marker = if field.optional { "?" } else { "" };
            self.out.push_str(&format!(
                "  {}{marker}: {}",
                field.name.name,
                type_expr_text(&field.ty)
            ));
            if let Some(comment) = &field.trailing_comment {
                self.out.push_str(&format!(" // {comment}"));
            }
            self.out.push('\n');
        }
        self.out.push_str("}\n");
    }
}

/// Convenience: document → schema source text.
pub fn write_schema_text(doc: &Document) -> String {
    let mut writer = SchemaWriter::new();
    writer.emit(doc);
    writer.into_string()
}

fn type_expr_text(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Builtin { kind, .. } => kind.name().to_string(),
        TypeExpr::Array(a) => format!("{}[]", type_expr_text(&a.of_type)),
        TypeExpr::Ref(r) => {
            if r.as_live_object {
                format!("LiveObject<{}>", r.name.name)
            } else {
                r.name.name.clone()
            }
        }
        TypeExpr::LiveList(l) => format!("LiveList<{}>", type_expr_text(&l.of_type)),
        TypeExpr::LiveMap(m) => format!(
            "LiveMap<{}, {}>",
            type_expr_text(&m.key_type),
            type_expr_text(&m.value_type)
        ),
        TypeExpr::ObjectLiteral(o) => {
            if o.fields.is_empty() {
                return "{}".to_string();
            }
            let fields: Vec<String> = o
                .fields
                .iter()
                .map(|f| {
                    let marker = if f.optional { "?" } else { "" };
                    format!("{}{marker}: {}", f.name.name, type_expr_text(&f.ty))
                })
                .collect();
            format!("{{ {} }}", fields.join(", "))
        }
    }
}
