//! Scalar inference: evidence records instead of a single kind tag.
//!
//! Keeping one optional arm per base kind (plus null/bool flags) makes
//! scalar merging total: merging is just a union of the evidence, and the
//! widening decision (Int vs Float, enum-able literal sets) is deferred to
//! schema generation.

use std::collections::BTreeSet;

use ordered_float::OrderedFloat;
use serde_json::Value;

// literal caps to keep evidence bounded; past the cap a set degrades to
// "arbitrary value of this kind"
const MAX_STR_LITS: usize = 64;
const MAX_NUM_LITS: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferredScalarType {
    pub nullable: bool,
    pub has_bool: bool,
    pub num: Option<NumEvidence>,
    pub str_: Option<StrEvidence>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumEvidence {
    pub lits: BTreeSet<OrderedFloat<f64>>,
    pub saw_int: bool,
    pub saw_float: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrEvidence {
    pub lits: BTreeSet<String>,
}

impl InferredScalarType {
    /// Distinct base kinds observed, not counting null.
    pub(crate) fn kind_count(&self) -> usize {
        usize::from(self.has_bool) + usize::from(self.num.is_some()) + usize::from(self.str_.is_some())
    }

    pub fn is_null_only(&self) -> bool {
        self.kind_count() == 0
    }
}

pub fn infer_scalar_type(value: &Value) -> InferredScalarType {
    match value {
        Value::Null => InferredScalarType { nullable: true, ..Default::default() },
        Value::Bool(_) => InferredScalarType { has_bool: true, ..Default::default() },
        Value::Number(n) => {
            let mut num = NumEvidence::default();
            if n.as_i64().is_some() || n.as_u64().is_some() {
                num.saw_int = true;
            } else {
                num.saw_float = true;
            }
            if let Some(f) = n.as_f64() {
                num.lits.insert(OrderedFloat(f));
            }
            InferredScalarType { num: Some(num), ..Default::default() }
        }
        Value::String(s) => {
            let mut str_ = StrEvidence::default();
            str_.lits.insert(s.clone());
            InferredScalarType { str_: Some(str_), ..Default::default() }
        }
        Value::Array(_) | Value::Object(_) => {
            unreachable!("scalar inference called with a composite value")
        }
    }
}

/// Total: scalar merging never fails, it unions the observed evidence.
pub fn merge_inferred_scalar_types(
    a: &InferredScalarType,
    b: &InferredScalarType,
) -> InferredScalarType {
    InferredScalarType {
        nullable: a.nullable || b.nullable,
        has_bool: a.has_bool || b.has_bool,
        num: match (&a.num, &b.num) {
            (None, None) => None,
            (Some(x), None) | (None, Some(x)) => Some(x.clone()),
            (Some(x), Some(y)) => Some(merge_num(x, y)),
        },
        str_: match (&a.str_, &b.str_) {
            (None, None) => None,
            (Some(x), None) | (None, Some(x)) => Some(x.clone()),
            (Some(x), Some(y)) => Some(merge_str(x, y)),
        },
    }
}

fn merge_num(a: &NumEvidence, b: &NumEvidence) -> NumEvidence {
    let mut lits: BTreeSet<OrderedFloat<f64>> = &a.lits | &b.lits;
    if lits.len() > MAX_NUM_LITS {
        lits.clear();
    }
    NumEvidence {
        lits,
        saw_int: a.saw_int || b.saw_int,
        saw_float: a.saw_float || b.saw_float,
    }
}

fn merge_str(a: &StrEvidence, b: &StrEvidence) -> StrEvidence {
    let mut lits: BTreeSet<String> = a.lits.union(&b.lits).cloned().collect();
    if lits.len() > MAX_STR_LITS {
        lits.clear();
    }
    StrEvidence { lits }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_bool_set_flags() {
        assert!(infer_scalar_type(&Value::Null).nullable);
        assert!(infer_scalar_type(&json!(true)).has_bool);
    }

    #[test]
    fn integers_and_floats_are_distinguished() {
        let int = infer_scalar_type(&json!(7));
        assert!(int.num.as_ref().unwrap().saw_int);
        assert!(!int.num.as_ref().unwrap().saw_float);

        let float = infer_scalar_type(&json!(7.5));
        assert!(float.num.as_ref().unwrap().saw_float);
    }

    #[test]
    fn merge_unions_and_dedupes_literals() {
        let a = infer_scalar_type(&json!("on"));
        let b = infer_scalar_type(&json!("off"));
        let merged = merge_inferred_scalar_types(&a, &b);
        assert_eq!(merged.str_.as_ref().unwrap().lits.len(), 2);

        // identical literals collapse
        let again = merge_inferred_scalar_types(&merged, &a);
        assert_eq!(again.str_.unwrap().lits.len(), 2);
    }

    #[test]
    fn merge_is_idempotent() {
        let a = infer_scalar_type(&json!(1.5));
        assert_eq!(merge_inferred_scalar_types(&a, &a), a);
    }

    #[test]
    fn literal_caps_degrade_to_plain_kind() {
        let mut acc = infer_scalar_type(&json!("v0"));
        for i in 1..=MAX_STR_LITS {
            let next = infer_scalar_type(&json!(format!("v{i}")));
            acc = merge_inferred_scalar_types(&acc, &next);
        }
        assert!(acc.str_.unwrap().lits.is_empty());
    }
}
