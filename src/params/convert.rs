//! Conversion of raw textual values into declared parameter types.

use serde_json::Value;

use super::value::ParamValue;
use crate::descriptor::{ParamType, ParameterDescriptor};
use crate::types::{Error, Result};

/// Convert a raw value into the parameter's declared type. `None` stays null.
pub(crate) fn convert(param: &ParameterDescriptor, raw: Option<String>) -> Result<ParamValue> {
    let Some(raw) = raw else {
        return Ok(ParamValue::Null);
    };
    convert_text(param.param_type(), raw).map_err(|reason| {
        Error::invalid_parameter(format!("Error converting '{}' - {}", param.key(), reason))
    })
}

fn convert_text(param_type: ParamType, raw: String) -> std::result::Result<ParamValue, String> {
    let trimmed = raw.trim();
    match param_type {
        ParamType::Text => Ok(ParamValue::Text(raw)),
        ParamType::Int => trimmed
            .parse::<i64>()
            .map(ParamValue::Int)
            .map_err(|e| format!("'{}' is not an integer: {}", trimmed, e)),
        ParamType::Float => trimmed
            .parse::<f64>()
            .map(ParamValue::Float)
            .map_err(|e| format!("'{}' is not a number: {}", trimmed, e)),
        ParamType::Bool => {
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(ParamValue::Bool(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(ParamValue::Bool(false))
            } else {
                Err(format!("'{}' is not a boolean", trimmed))
            }
        }
        ParamType::Uuid => uuid::Uuid::parse_str(trimmed)
            .map(ParamValue::Uuid)
            .map_err(|e| format!("'{}' is not a UUID: {}", trimmed, e)),
        ParamType::TextList => convert_list(trimmed).map(ParamValue::List),
        ParamType::Document => serde_json::from_str::<Value>(trimmed)
            .map(ParamValue::Document)
            .map_err(|e| format!("not a JSON document: {}", e)),
        ParamType::File => Err("file parameters cannot be read from text".to_string()),
    }
}

/// JSON array of strings, or a comma-separated list.
fn convert_list(raw: &str) -> std::result::Result<Vec<String>, String> {
    if raw.starts_with('[') {
        let items: Vec<Value> =
            serde_json::from_str(raw).map_err(|e| format!("not a JSON array: {}", e))?;
        return items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(format!("expected string items, got {}", other)),
            })
            .collect();
    }
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    Ok(raw.split(',').map(|s| s.trim().to_string()).collect())
}
