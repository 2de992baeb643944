use std::collections::BTreeMap;

use airx_core::{Error, Result};
use serde::Serialize;
use serde_json::Value;

/// Request parameters, keyed by their wire name.
///
/// Values are already coerced to their string form. The map keeps keys in
/// byte order, which is the order the string to sign expects.
pub type Params = BTreeMap<String, String>;

/// Convert caller data into [`Params`].
///
/// `data` must serialize to a map whose values are strings, numbers or
/// booleans. `()` and `None` serialize to `null` and mean "no data".
/// Anything else is rejected before a request is built.
pub fn to_params<T: Serialize + ?Sized>(data: &T) -> Result<Params> {
    let value = serde_json::to_value(data).map_err(|e| {
        Error::request_invalid("request data can't be serialized").with_source(e)
    })?;

    value_to_params(&value)
}

pub(crate) fn value_to_params(value: &Value) -> Result<Params> {
    match value {
        Value::Null => Ok(Params::new()),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), scalar_to_string(k, v)?)))
            .collect(),
        other => Err(Error::request_invalid(format!(
            "request data must be a map of scalar values, got {}",
            kind_of(other)
        ))),
    }
}

fn scalar_to_string(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::request_invalid(format!(
            "value of {key:?} must be a string, number or boolean, got {}",
            kind_of(other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
