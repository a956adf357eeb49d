//! Union construction and normalization.
//!
//! A union is built by folding candidates into an initially empty member
//! set. Nested unions flatten member by member (a union's direct members
//! never include another union), scalar candidates fold into the existing
//! scalar member (scalar merging is total), and object candidates try a
//! non-forced merge against every existing object member so that genuinely
//! different shapes stay distinct. First structural match wins, in insertion
//! order.

use super::object::merge_inferred_object_types;
use super::scalar::merge_inferred_scalar_types;
use super::{InferredType, MergeOptions};
use crate::naming::{merge_scored_names, ScoredNames};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredUnionType {
    /// Never contains another union.
    pub members: Vec<InferredType>,
    pub names: ScoredNames,
}

pub fn union_of_inferred_types(types: Vec<InferredType>) -> InferredUnionType {
    let mut union = InferredUnionType { members: Vec::new(), names: ScoredNames::new() };
    for t in types {
        add_member(&mut union, t);
    }
    union
}

/// Fold one more type into a union, the same way members are added during
/// construction. The union is never treated as an opaque whole.
pub fn merge_into_union(union: &InferredUnionType, t: &InferredType) -> InferredUnionType {
    let mut out = union.clone();
    add_member(&mut out, t.clone());
    out
}

fn add_member(union: &mut InferredUnionType, t: InferredType) {
    match t {
        InferredType::Union(nested) => {
            union.names = merge_scored_names(&union.names, &nested.names);
            for member in nested.members {
                add_member(union, member);
            }
        }
        InferredType::Scalar(s) => {
            for member in union.members.iter_mut() {
                if let InferredType::Scalar(existing) = member {
                    let merged = merge_inferred_scalar_types(existing, &s);
                    *existing = merged;
                    return;
                }
            }
            union.members.push(InferredType::Scalar(s));
        }
        InferredType::Object(obj) => {
            for i in 0..union.members.len() {
                if let InferredType::Object(existing) = &union.members[i] {
                    if let Some(merged) =
                        merge_inferred_object_types(existing, &obj, MergeOptions::default())
                    {
                        union.members[i] = merged;
                        return;
                    }
                }
            }
            union.members.push(InferredType::Object(obj));
        }
        // List-vs-list folding during union construction is a deliberate
        // extension point; lists join as distinct members for now.
        InferredType::List(l) => union.members.push(InferredType::List(l)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::{infer_type, InferCtx};
    use crate::naming::scored;
    use serde_json::{json, Value};

    fn infer(value: &Value) -> InferredType {
        let parent = scored("Storage", 1.0);
        infer_type(value, &InferCtx { field: "v", parent: &parent }).unwrap()
    }

    #[test]
    fn nested_unions_flatten() {
        let inner = union_of_inferred_types(vec![
            infer(&json!(1)),
            infer(&json!({ "liveType": "LiveObject", "data": { "a": 1 } })),
        ]);
        let outer = union_of_inferred_types(vec![
            InferredType::Union(inner),
            infer(&json!({ "b": 2 })),
        ]);
        assert_eq!(outer.members.len(), 3);
        assert!(outer
            .members
            .iter()
            .all(|m| !matches!(m, InferredType::Union(_))));
    }

    #[test]
    fn scalars_fold_into_one_member() {
        let union = union_of_inferred_types(vec![
            infer(&json!(1)),
            infer(&json!(2)),
            infer(&json!("x")),
        ]);
        assert_eq!(union.members.len(), 1);
    }

    #[test]
    fn compatible_objects_merge_first_match_wins() {
        let union = union_of_inferred_types(vec![
            infer(&json!({ "x": 1 })),
            infer(&json!({ "x": 2, "y": 3 })),
        ]);
        assert_eq!(union.members.len(), 1);
        match &union.members[0] {
            InferredType::Object(o) => assert!(o.fields["y"].optional),
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn incompatible_objects_stay_distinct() {
        let union = union_of_inferred_types(vec![
            infer(&json!({ "x": 1 })),
            infer(&json!({ "liveType": "LiveObject", "data": { "x": 1 } })),
        ]);
        assert_eq!(union.members.len(), 2);
    }

    #[test]
    fn lists_stay_distinct_members() {
        let union = union_of_inferred_types(vec![infer(&json!([1])), infer(&json!([2]))]);
        assert_eq!(union.members.len(), 2);
    }
}
