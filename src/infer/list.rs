//! List inference and merging.

use serde_json::Value;

use super::union::{merge_into_union, union_of_inferred_types, InferredUnionType};
use super::{infer_type, InferCtx, InferError, InferredType, MergeOptions};
use crate::naming::{generate_names, merge_scored_names, ScoredNames};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredListType {
    pub live: bool,
    /// Element shapes, kept as a (possibly single-member) union.
    pub members: InferredUnionType,
    pub names: ScoredNames,
}

pub fn infer_list_type(
    values: &[Value],
    live: bool,
    ctx: &InferCtx,
) -> Result<InferredListType, InferError> {
    let names = generate_names(ctx.field, ctx.parent);
    let members = values
        .iter()
        .map(|value| infer_type(value, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(InferredListType { live, members: union_of_inferred_types(members), names })
}

pub fn merge_inferred_list_types(
    a: &InferredListType,
    b: &InferredListType,
    opts: MergeOptions,
) -> Option<InferredType> {
    if a.live != b.live {
        return opts.force.then(|| {
            InferredType::Union(union_of_inferred_types(vec![
                InferredType::List(a.clone()),
                InferredType::List(b.clone()),
            ]))
        });
    }

    // Element unions always fold, regardless of the caller's options: list
    // elements are allowed to become heterogeneous.
    let members = merge_into_union(&a.members, &InferredType::Union(b.members.clone()));
    Some(InferredType::List(InferredListType {
        live: a.live,
        members,
        names: merge_scored_names(&a.names, &b.names),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::scored;
    use serde_json::json;

    fn infer(values: &Value, live: bool) -> InferredListType {
        let parent = scored("Storage", 1.0);
        infer_list_type(
            values.as_array().unwrap(),
            live,
            &InferCtx { field: "animals", parent: &parent },
        )
        .unwrap()
    }

    #[test]
    fn element_shapes_fold_during_inference() {
        let list = infer(&json!([1, 2, 3]), false);
        assert_eq!(list.members.members.len(), 1);
        assert!(list.names.contains_key("Animal"));
    }

    #[test]
    fn object_elements_with_matching_shape_unify() {
        let list = infer(&json!([{ "species": "dog" }, { "species": "cat" }]), false);
        assert_eq!(list.members.members.len(), 1);
        match &list.members.members[0] {
            InferredType::Object(o) => {
                assert!(!o.fields["species"].optional);
            }
            other => panic!("expected object member, got {other:?}"),
        }
    }

    #[test]
    fn empty_lists_have_no_members() {
        let list = infer(&json!([]), false);
        assert!(list.members.members.is_empty());
    }

    #[test]
    fn merged_lists_pool_their_elements() {
        let a = infer(&json!([{ "x": 1 }]), true);
        let b = infer(&json!([{ "x": 2, "y": 3 }]), true);
        match merge_inferred_list_types(&a, &b, MergeOptions::default()).unwrap() {
            InferredType::List(merged) => {
                assert!(merged.live);
                assert_eq!(merged.members.members.len(), 1);
                match &merged.members.members[0] {
                    InferredType::Object(o) => assert!(o.fields["y"].optional),
                    other => panic!("expected object member, got {other:?}"),
                }
            }
            other => panic!("expected list, got {other:?}"),
        }
    }
}
