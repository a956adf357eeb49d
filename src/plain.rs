//! The "plain" sample value boundary.
//!
//! Samples are ordinary JSON values. An object carrying the reserved
//! `liveType` discriminator field represents a live structure wrapping a
//! `data` payload of the same shape:
//!
//! ```json
//! { "liveType": "LiveList", "data": [1, 2, 3] }
//! ```
//!
//! The checker rejects `liveType` as a schema field name for exactly this
//! reason.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::infer::InferError;

/// Reserved discriminator field on sample objects.
pub const LIVE_TYPE_TAG: &str = "liveType";

/// Payload field on tagged sample objects.
pub const LIVE_DATA_FIELD: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveTag {
    Object,
    List,
    Map,
}

/// Classify an object's live tag. `Ok(None)` for plain objects; an error for
/// tag values outside the closed set (the exhaustiveness guard at the data
/// boundary).
pub fn live_tag(map: &Map<String, Value>) -> Result<Option<LiveTag>, InferError> {
    match map.get(LIVE_TYPE_TAG) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(tag)) => match tag.as_str() {
            "LiveObject" => Ok(Some(LiveTag::Object)),
            "LiveList" => Ok(Some(LiveTag::List)),
            "LiveMap" => Ok(Some(LiveTag::Map)),
            other => Err(InferError::UnknownLiveTag(other.to_string())),
        },
        Some(other) => Err(InferError::UnknownLiveTag(other.to_string())),
    }
}

/// The `data` payload of a tagged live object.
pub fn live_object_data(map: &Map<String, Value>) -> Result<&Map<String, Value>, InferError> {
    match map.get(LIVE_DATA_FIELD) {
        Some(Value::Object(data)) => Ok(data),
        _ => Err(InferError::MalformedLiveValue { expected: "an object" }),
    }
}

/// The `data` payload of a tagged live list.
pub fn live_list_data(map: &Map<String, Value>) -> Result<&Vec<Value>, InferError> {
    match map.get(LIVE_DATA_FIELD) {
        Some(Value::Array(data)) => Ok(data),
        _ => Err(InferError::MalformedLiveValue { expected: "an array" }),
    }
}

/// Deserialize with JSON-path context in error messages, so a bad sample
/// file points at the offending value rather than just a byte offset.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path}: {}", err.into_inner()))
        }
    }
}
