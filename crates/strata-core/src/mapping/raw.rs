//! Conversions between raw mapping values and typed attributes.

use crate::{Error, MappingArray, Result, Value};

use indexmap::IndexMap;

pub(crate) fn required_str(raw: &MappingArray, key: &str, owner: &str) -> Result<String> {
    match raw.get(key) {
        Some(value) => string(value, key, owner),
        None => Err(Error::invalid_mapping(format!(
            "missing mandatory key `{key}` on {owner}"
        ))),
    }
}

pub(crate) fn string(value: &Value, key: &str, owner: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(mismatch(value, key, owner, "a string")),
    }
}

pub(crate) fn opt_string(value: &Value, key: &str, owner: &str) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        _ => string(value, key, owner).map(Some),
    }
}

/// Accepts booleans and the integers 0 and 1, which some mapping sources
/// emit for flags.
pub(crate) fn boolean(value: &Value, key: &str, owner: &str) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::I64(0) => Ok(false),
        Value::I64(1) => Ok(true),
        _ => Err(mismatch(value, key, owner, "a boolean")),
    }
}

pub(crate) fn opt_bool(value: &Value, key: &str, owner: &str) -> Result<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        _ => boolean(value, key, owner).map(Some),
    }
}

pub(crate) fn list<'a>(value: &'a Value, key: &str, owner: &str) -> Result<&'a [Value]> {
    match value {
        Value::List(items) => Ok(items),
        // Mapping sources serialize empty lists as empty maps
        Value::Map(map) if map.is_empty() => Ok(&[]),
        _ => Err(mismatch(value, key, owner, "a list")),
    }
}

pub(crate) fn map<'a>(value: &'a Value, key: &str, owner: &str) -> Result<&'a MappingArray> {
    match value {
        Value::Map(map) => Ok(map),
        _ => Err(mismatch(value, key, owner, "a map")),
    }
}

pub(crate) fn string_list(value: &Value, key: &str, owner: &str) -> Result<Vec<String>> {
    list(value, key, owner)?
        .iter()
        .map(|item| string(item, key, owner))
        .collect()
}

pub(crate) fn string_map(
    value: &Value,
    key: &str,
    owner: &str,
) -> Result<IndexMap<String, String>> {
    map(value, key, owner)?
        .iter()
        .map(|(k, v)| Ok((k.clone(), string(v, key, owner)?)))
        .collect()
}

pub(crate) fn string_map_value(map: &IndexMap<String, String>) -> Value {
    Value::Map(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::from(v)))
            .collect(),
    )
}

pub(crate) fn string_list_value(list: &[String]) -> Value {
    Value::List(list.iter().map(Value::from).collect())
}

fn mismatch(value: &Value, key: &str, owner: &str, expected: &str) -> Error {
    Error::invalid_mapping(format!(
        "`{key}` on {owner} must be {expected}, got {}",
        value.kind_name()
    ))
}
