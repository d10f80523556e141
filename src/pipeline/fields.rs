//! Typed access to caller-supplied JSON maps. A key holding `null` counts as
//! absent; a key holding the wrong kind of value is a composition error.
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::error::CompositionError;

pub type FieldMap = Map<String, Value>;

fn present<'a>(map: &'a FieldMap, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| !value.is_null())
}

pub fn string_field(map: &FieldMap, key: &str) -> Result<Option<String>, CompositionError> {
    match present(map, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(CompositionError::invalid(key, "a string")),
    }
}

pub fn number_field(map: &FieldMap, key: &str) -> Result<Option<f64>, CompositionError> {
    match present(map, key) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| CompositionError::invalid(key, "a number")),
    }
}

pub fn bool_field(map: &FieldMap, key: &str) -> Result<Option<bool>, CompositionError> {
    match present(map, key) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| CompositionError::invalid(key, "a boolean")),
    }
}

pub fn string_set_field(
    map: &FieldMap,
    key: &str,
) -> Result<Option<BTreeSet<String>>, CompositionError> {
    match present(map, key) {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| CompositionError::invalid(key, "a list of strings"))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Some),
        Some(_) => Err(CompositionError::invalid(key, "a list of strings")),
    }
}

pub fn object_field<'a>(
    map: &'a FieldMap,
    key: &str,
) -> Result<Option<&'a FieldMap>, CompositionError> {
    match present(map, key) {
        None => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(_) => Err(CompositionError::invalid(key, "an object")),
    }
}
