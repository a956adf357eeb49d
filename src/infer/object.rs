//! Object inference and merging.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::union::union_of_inferred_types;
use super::{infer_type, merge_inferred_types, InferCtx, InferError, InferredType, MergeOptions};
use crate::naming::{generate_names, merge_scored_names, ScoredNames};

/// Field name → inferred value, in sample order.
pub type InferredFields = IndexMap<String, InferredFieldRef>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredFieldRef {
    pub value: InferredType,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredObjectType {
    pub live: bool,
    /// Atomic types are pinned: they never merge with another object, even
    /// under forced merging. Only the synthesized root is atomic.
    pub atomic: bool,
    pub fields: InferredFields,
    pub names: ScoredNames,
}

pub fn infer_object_type(
    map: &Map<String, Value>,
    live: bool,
    ctx: &InferCtx,
) -> Result<InferredObjectType, InferError> {
    let names = generate_names(ctx.field, ctx.parent);
    let fields = infer_fields(map, &names)?;
    Ok(InferredObjectType { live, atomic: false, fields, names })
}

pub(crate) fn infer_fields(
    map: &Map<String, Value>,
    parent: &ScoredNames,
) -> Result<InferredFields, InferError> {
    let mut fields = InferredFields::with_capacity(map.len());
    for (key, value) in map {
        let ctx = InferCtx { field: key, parent };
        fields.insert(
            key.clone(),
            InferredFieldRef { value: infer_type(value, &ctx)?, optional: false },
        );
    }
    Ok(fields)
}

pub fn merge_inferred_object_types(
    a: &InferredObjectType,
    b: &InferredObjectType,
    opts: MergeOptions,
) -> Option<InferredType> {
    // live and non-live objects never unify, and atomic types are pinned
    if a.live != b.live || a.atomic || b.atomic {
        return opts.force.then(|| {
            InferredType::Union(union_of_inferred_types(vec![
                InferredType::Object(a.clone()),
                InferredType::Object(b.clone()),
            ]))
        });
    }

    let fields = merge_inferred_fields(&a.fields, &b.fields, opts)?;
    Some(InferredType::Object(InferredObjectType {
        live: a.live,
        atomic: false,
        names: merge_scored_names(&a.names, &b.names),
        fields,
    }))
}

/// Key-union merge: a field present on only one side becomes optional; a
/// field present on both sides merges recursively with the same options, and
/// failure there fails the whole object merge.
pub(crate) fn merge_inferred_fields(
    a: &InferredFields,
    b: &InferredFields,
    opts: MergeOptions,
) -> Option<InferredFields> {
    let mut out = InferredFields::with_capacity(a.len().max(b.len()));
    for (key, fa) in a {
        match b.get(key) {
            None => {
                out.insert(key.clone(), InferredFieldRef { value: fa.value.clone(), optional: true });
            }
            Some(fb) => {
                let value = merge_inferred_types(&fa.value, &fb.value, opts)?;
                out.insert(
                    key.clone(),
                    InferredFieldRef { value, optional: fa.optional || fb.optional },
                );
            }
        }
    }
    for (key, fb) in b {
        if !out.contains_key(key) {
            out.insert(key.clone(), InferredFieldRef { value: fb.value.clone(), optional: true });
        }
    }
    Some(out)
}

/// Fold two per-sample roots. The general merge refuses atomic operands, so
/// whole samples combine here: field maps merge directly (non-forced) and
/// the result stays live, atomic, and pinned to the root name.
pub fn merge_storage_types(
    a: &InferredObjectType,
    b: &InferredObjectType,
) -> Option<InferredObjectType> {
    let fields = merge_inferred_fields(&a.fields, &b.fields, MergeOptions::default())?;
    Some(InferredObjectType {
        live: true,
        atomic: true,
        names: merge_scored_names(&a.names, &b.names),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::scored;
    use serde_json::json;

    fn infer(value: &Value, live: bool) -> InferredObjectType {
        let parent = scored("Storage", 1.0);
        let map = match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        };
        infer_object_type(map, live, &InferCtx { field: "profile", parent: &parent }).unwrap()
    }

    #[test]
    fn inferred_objects_carry_context_names() {
        let obj = infer(&json!({ "bio": "hi" }), false);
        assert!(obj.names.contains_key("Profile"));
        assert!(obj.names.contains_key("StorageProfile"));
        assert!(!obj.atomic);
    }

    #[test]
    fn field_order_follows_the_sample() {
        let obj = infer(&json!({ "z": 1, "a": 2, "m": 3 }), false);
        let keys: Vec<&str> = obj.fields.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn merging_keeps_shared_required_fields_required() {
        let a = infer(&json!({ "x": 1, "y": 2 }), false);
        let b = infer(&json!({ "x": 3 }), false);
        match merge_inferred_object_types(&a, &b, MergeOptions::default()).unwrap() {
            InferredType::Object(merged) => {
                assert!(!merged.fields["x"].optional);
                assert!(merged.fields["y"].optional);
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn optionality_is_sticky_across_merges() {
        let a = infer(&json!({ "x": 1 }), false);
        let b = infer(&json!({ "x": 2, "y": 3 }), false);
        let ab = match merge_inferred_object_types(&a, &b, MergeOptions::default()).unwrap() {
            InferredType::Object(o) => o,
            other => panic!("expected object, got {other:?}"),
        };
        // y optional after (a, b); merging with another y-carrying sample
        // must not make it required again
        let c = infer(&json!({ "x": 4, "y": 5 }), false);
        match merge_inferred_object_types(&ab, &c, MergeOptions::default()).unwrap() {
            InferredType::Object(merged) => assert!(merged.fields["y"].optional),
            other => panic!("expected object, got {other:?}"),
        }
    }
}
