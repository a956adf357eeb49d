//! Structural type inference over plain sample values.
//!
//! `infer_type` dispatches purely on the shape of the value: scalars become
//! evidence records, arrays become lists, objects become object types, and
//! the reserved live tag switches liveness (live maps are not supported).
//! `merge_inferred_types` unifies two inferred shapes; with `force` enabled
//! an incompatible pair lands in a union instead of failing.
//!
//! The per-sample entry point is `infer_storage_type`: the top-level value
//! becomes an always-live, atomic object pinned to the root name. Atomic
//! types never merge with anything through the general merge (even forced
//! merging only unions them); whole samples fold through
//! `merge_storage_types` instead.

pub mod list;
pub mod object;
pub mod scalar;
pub mod union;

use serde_json::Value;
use thiserror::Error;

use crate::checker::ROOT_NAME;
use crate::naming::{scored, ScoredNames};
use crate::plain::{self, LiveTag};

pub use list::{infer_list_type, merge_inferred_list_types, InferredListType};
pub use object::{
    infer_object_type, merge_inferred_object_types, merge_storage_types, InferredFieldRef,
    InferredFields, InferredObjectType,
};
pub use scalar::{infer_scalar_type, merge_inferred_scalar_types, InferredScalarType};
pub use union::{union_of_inferred_types, InferredUnionType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferError {
    #[error("live maps are not supported yet")]
    LiveMapUnsupported,
    #[error("internal error: unhandled live value tag '{0}'")]
    UnknownLiveTag(String),
    #[error("malformed live value: expected {expected} under 'data'")]
    MalformedLiveValue { expected: &'static str },
    #[error("the root sample must be an object")]
    RootNotAnObject,
    #[error("samples are structurally incompatible and cannot be merged")]
    IncompatibleSamples,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    pub force: bool,
}

impl MergeOptions {
    /// Never-failing mode: incompatible operands union instead of rejecting.
    pub fn forced() -> Self {
        MergeOptions { force: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferredType {
    Scalar(InferredScalarType),
    Object(InferredObjectType),
    List(InferredListType),
    Union(InferredUnionType),
}

impl InferredType {
    pub fn is_atomic(&self) -> bool {
        matches!(self, InferredType::Object(o) if o.atomic)
    }
}

impl From<InferredScalarType> for InferredType {
    fn from(value: InferredScalarType) -> Self {
        InferredType::Scalar(value)
    }
}

impl From<InferredObjectType> for InferredType {
    fn from(value: InferredObjectType) -> Self {
        InferredType::Object(value)
    }
}

impl From<InferredListType> for InferredType {
    fn from(value: InferredListType) -> Self {
        InferredType::List(value)
    }
}

impl From<InferredUnionType> for InferredType {
    fn from(value: InferredUnionType) -> Self {
        InferredType::Union(value)
    }
}

/// The context a value was observed in, used for name candidates.
#[derive(Debug, Clone, Copy)]
pub struct InferCtx<'a> {
    pub field: &'a str,
    pub parent: &'a ScoredNames,
}

pub fn infer_type(value: &Value, ctx: &InferCtx) -> Result<InferredType, InferError> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            Ok(InferredType::Scalar(scalar::infer_scalar_type(value)))
        }
        Value::Array(values) => Ok(InferredType::List(list::infer_list_type(values, false, ctx)?)),
        Value::Object(map) => match plain::live_tag(map)? {
            None => Ok(InferredType::Object(object::infer_object_type(map, false, ctx)?)),
            Some(LiveTag::Object) => Ok(InferredType::Object(object::infer_object_type(
                plain::live_object_data(map)?,
                true,
                ctx,
            )?)),
            Some(LiveTag::List) => Ok(InferredType::List(list::infer_list_type(
                plain::live_list_data(map)?,
                true,
                ctx,
            )?)),
            Some(LiveTag::Map) => Err(InferError::LiveMapUnsupported),
        },
    }
}

/// Infer a whole sample document. The top-level value is an always-live,
/// atomic object type pinned to the root name.
pub fn infer_storage_type(value: &Value) -> Result<InferredObjectType, InferError> {
    let Value::Object(map) = value else {
        return Err(InferError::RootNotAnObject);
    };
    let fields_src = match plain::live_tag(map)? {
        None => map,
        Some(LiveTag::Object) => plain::live_object_data(map)?,
        Some(_) => return Err(InferError::RootNotAnObject),
    };

    let names = scored(ROOT_NAME, 1.0);
    let fields = object::infer_fields(fields_src, &names)?;
    Ok(InferredObjectType { live: true, atomic: true, fields, names })
}

pub fn merge_inferred_types(
    a: &InferredType,
    b: &InferredType,
    opts: MergeOptions,
) -> Option<InferredType> {
    match (a, b) {
        (InferredType::Scalar(x), InferredType::Scalar(y)) => {
            Some(InferredType::Scalar(scalar::merge_inferred_scalar_types(x, y)))
        }
        (InferredType::Object(x), InferredType::Object(y)) => {
            object::merge_inferred_object_types(x, y, opts)
        }
        (InferredType::List(x), InferredType::List(y)) => {
            list::merge_inferred_list_types(x, y, opts)
        }
        // A union is never merged as an opaque whole; the other operand
        // joins it the same way members are added during construction.
        (InferredType::Union(x), other) | (other, InferredType::Union(x)) => {
            Some(InferredType::Union(union::merge_into_union(x, other)))
        }
        _ => opts
            .force
            .then(|| InferredType::Union(union_of_inferred_types(vec![a.clone(), b.clone()]))),
    }
}

// ------------------------------ front API ---------------------------------- //

/// Fold storage samples one by one into a single inferred root.
#[derive(Debug, Default)]
pub struct SchemaInference {
    state: Option<InferredObjectType>,
}

impl SchemaInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, sample: &Value) -> Result<(), InferError> {
        let inferred = infer_storage_type(sample)?;
        self.state = Some(match self.state.take() {
            None => inferred,
            Some(state) => object::merge_storage_types(&state, &inferred)
                .ok_or(InferError::IncompatibleSamples)?,
        });
        Ok(())
    }

    pub fn solve(self) -> Option<InferredObjectType> {
        self.state
    }
}

// --------------------------------- tests ----------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx_root() -> ScoredNames {
        scored(ROOT_NAME, 1.0)
    }

    fn infer_in_field(value: &Value, field: &str) -> InferredType {
        let parent = ctx_root();
        infer_type(value, &InferCtx { field, parent: &parent }).unwrap()
    }

    /// The flattening invariant: no union's direct members include a union.
    fn assert_flat(value: &InferredType) {
        match value {
            InferredType::Union(u) => {
                for member in &u.members {
                    assert!(
                        !matches!(member, InferredType::Union(_)),
                        "nested union in {u:?}"
                    );
                    assert_flat(member);
                }
            }
            InferredType::Object(o) => {
                for field in o.fields.values() {
                    assert_flat(&field.value);
                }
            }
            InferredType::List(l) => {
                for member in &l.members.members {
                    assert_flat(member);
                }
            }
            InferredType::Scalar(_) => {}
        }
    }

    #[test]
    fn scalars_infer_by_shape() {
        let v = infer_in_field(&json!(3), "count");
        match v {
            InferredType::Scalar(s) => {
                let num = s.num.expect("numeric evidence");
                assert!(num.saw_int && !num.saw_float);
            }
            other => panic!("expected scalar, got {other:?}"),
        }
    }

    #[test]
    fn scalar_merges_never_fail_and_widen() {
        let a = infer_in_field(&json!(1), "x");
        let b = infer_in_field(&json!(2.5), "x");
        let merged = merge_inferred_types(&a, &b, MergeOptions::default()).unwrap();
        match &merged {
            InferredType::Scalar(s) => {
                let num = s.num.as_ref().unwrap();
                assert!(num.saw_int && num.saw_float);
            }
            other => panic!("expected scalar, got {other:?}"),
        }

        // even across kinds, scalar merging collects both evidences
        let c = infer_in_field(&json!("hello"), "x");
        let merged = merge_inferred_types(&a, &c, MergeOptions::default()).unwrap();
        match merged {
            InferredType::Scalar(s) => {
                assert!(s.num.is_some() && s.str_.is_some());
            }
            other => panic!("expected scalar, got {other:?}"),
        }
    }

    #[test]
    fn live_mismatch_fails_unless_forced() {
        let live = infer_in_field(&json!({ "liveType": "LiveObject", "data": { "x": 1 } }), "a");
        let plain = infer_in_field(&json!({ "x": 1 }), "a");

        assert_eq!(merge_inferred_types(&live, &plain, MergeOptions::default()), None);

        let forced = merge_inferred_types(&live, &plain, MergeOptions::forced()).unwrap();
        match &forced {
            InferredType::Union(u) => assert_eq!(u.members.len(), 2),
            other => panic!("expected union, got {other:?}"),
        }
        assert_flat(&forced);
    }

    #[test]
    fn object_merge_unions_field_keys_and_marks_one_sided_optional() {
        let a = infer_in_field(&json!({ "x": 1 }), "o");
        let b = infer_in_field(&json!({ "x": 2, "y": "s" }), "o");
        let merged = merge_inferred_types(&a, &b, MergeOptions::default()).unwrap();
        match merged {
            InferredType::Object(o) => {
                assert!(!o.fields["x"].optional);
                assert!(o.fields["y"].optional);
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn field_level_failure_propagates() {
        let a = infer_in_field(&json!({ "x": { "liveType": "LiveObject", "data": {} } }), "o");
        let b = infer_in_field(&json!({ "x": {} }), "o");
        assert_eq!(merge_inferred_types(&a, &b, MergeOptions::default()), None);
        // forcing resolves the conflict into a union at the field level
        let forced = merge_inferred_types(&a, &b, MergeOptions::forced()).unwrap();
        assert_flat(&forced);
    }

    #[test]
    fn storage_roots_are_atomic_and_pinned() {
        let a = infer_storage_type(&json!({ "x": 1 })).unwrap();
        let b = infer_storage_type(&json!({ "y": 2 })).unwrap();
        assert!(a.live && a.atomic);

        let (ta, tb) = (InferredType::Object(a.clone()), InferredType::Object(b.clone()));
        // atomic objects never merge, not even with force
        assert_eq!(merge_inferred_types(&ta, &tb, MergeOptions::default()), None);
        match merge_inferred_types(&ta, &tb, MergeOptions::forced()).unwrap() {
            InferredType::Union(u) => assert_eq!(u.members.len(), 2),
            other => panic!("expected union, got {other:?}"),
        }

        // whole samples fold through the dedicated entry point instead
        let folded = merge_storage_types(&a, &b).unwrap();
        assert!(folded.live && folded.atomic);
        assert!(folded.fields["x"].optional && folded.fields["y"].optional);
    }

    #[test]
    fn merge_is_idempotent_up_to_name_weights() {
        // scalar fields carry no name tables, so the fold reproduces them
        // exactly (literal sets de-duplicated, flags preserved)
        let sample = json!({ "x": 1, "s": "str", "b": true });
        let a = infer_storage_type(&sample).unwrap();
        let b = infer_storage_type(&sample).unwrap();
        let folded = merge_storage_types(&a, &b).unwrap();
        assert_eq!(folded.fields, a.fields);
        assert_eq!((folded.live, folded.atomic), (a.live, a.atomic));

        // composite fields keep their structure; only name weights accumulate
        let sample = json!({ "p": { "b": true }, "tags": ["a"] });
        let a = infer_storage_type(&sample).unwrap();
        let folded =
            merge_storage_types(&a, &infer_storage_type(&sample).unwrap()).unwrap();
        match (&folded.fields["p"].value, &a.fields["p"].value) {
            (InferredType::Object(fo), InferredType::Object(ao)) => {
                assert_eq!(fo.fields, ao.fields);
                assert_eq!((fo.live, fo.atomic), (ao.live, ao.atomic));
            }
            other => panic!("expected objects, got {other:?}"),
        }
        match &folded.fields["tags"].value {
            InferredType::List(l) => assert_eq!(l.members.members.len(), 1),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn list_elements_fold_into_heterogeneous_members() {
        let a = infer_in_field(&json!([1, 2]), "xs");
        let b = infer_in_field(&json!(["s"]), "xs");
        let merged = merge_inferred_types(&a, &b, MergeOptions::default()).unwrap();
        match &merged {
            InferredType::List(l) => {
                assert!(!l.live);
                // scalar evidence folds into a single member
                assert_eq!(l.members.members.len(), 1);
            }
            other => panic!("expected list, got {other:?}"),
        }
        assert_flat(&merged);
    }

    #[test]
    fn list_liveness_mismatch_fails_unless_forced() {
        let plain = infer_in_field(&json!([1]), "xs");
        let live = infer_in_field(&json!({ "liveType": "LiveList", "data": [1] }), "xs");
        assert_eq!(merge_inferred_types(&plain, &live, MergeOptions::default()), None);
        match merge_inferred_types(&plain, &live, MergeOptions::forced()).unwrap() {
            InferredType::Union(u) => assert_eq!(u.members.len(), 2),
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn unions_stay_flat_under_repeated_forced_merges() {
        let mut acc = infer_in_field(&json!(1), "v");
        let samples = [
            json!({ "liveType": "LiveObject", "data": { "a": 1 } }),
            json!({ "a": 1 }),
            json!([1, 2]),
            json!({ "liveType": "LiveList", "data": ["x"] }),
            json!("scalar"),
        ];
        for sample in &samples {
            let next = infer_in_field(sample, "v");
            acc = merge_inferred_types(&acc, &next, MergeOptions::forced()).unwrap();
            assert_flat(&acc);
        }
    }

    #[test]
    fn live_maps_are_unsupported() {
        let parent = ctx_root();
        let err = infer_type(
            &json!({ "liveType": "LiveMap", "data": {} }),
            &InferCtx { field: "m", parent: &parent },
        )
        .unwrap_err();
        assert_eq!(err, InferError::LiveMapUnsupported);
    }

    #[test]
    fn non_object_roots_are_rejected() {
        assert_eq!(
            infer_storage_type(&json!([1, 2])).unwrap_err(),
            InferError::RootNotAnObject
        );
        assert_eq!(
            infer_storage_type(&json!({ "liveType": "LiveList", "data": [] })).unwrap_err(),
            InferError::RootNotAnObject
        );
    }

    #[test]
    fn front_api_folds_samples() {
        let mut inference = SchemaInference::new();
        inference.observe(&json!({ "x": 1 })).unwrap();
        inference.observe(&json!({ "x": 2, "y": "s" })).unwrap();
        let root = inference.solve().unwrap();
        assert!(!root.fields["x"].optional);
        assert!(root.fields["y"].optional);

        let mut inference = SchemaInference::new();
        inference.observe(&json!({ "x": 1 })).unwrap();
        let err = inference.observe(&json!({ "x": {} })).unwrap_err();
        assert_eq!(err, InferError::IncompatibleSamples);
    }
}
