//! Field extraction from a request's `data` object.

use crate::{LabError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{Map, Value};

type Data = Map<String, Value>;

/// Extract an optional string field.
pub(crate) fn get_str_param<'a>(data: &'a Data, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

/// Extract a required, non-empty string field.
pub(crate) fn require_str_param(data: &Data, key: &str) -> Result<String> {
    match get_str_param(data, key) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        Some(_) => Err(LabError::invalid_params(format!("{} must not be empty", key))),
        None => Err(LabError::invalid_params(format!(
            "missing required parameter: {}",
            key
        ))),
    }
}

/// Extract a required base64 field that decodes to at least one byte.
pub(crate) fn require_base64_param(data: &Data, key: &str) -> Result<Vec<u8>> {
    let encoded = require_str_param(data, key)?;
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|_| LabError::invalid_params(format!("{} must be valid base64", key)))?;
    if bytes.is_empty() {
        return Err(LabError::invalid_params(format!("{} must not be empty", key)));
    }
    Ok(bytes)
}

/// Extract an optional number. Present but non-numeric is an error.
pub(crate) fn get_f64_param(data: &Data, key: &str) -> Result<Option<f64>> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| LabError::invalid_params(format!("{} must be a finite number", key))),
    }
}

/// Extract a required finite number.
pub(crate) fn require_f64_param(data: &Data, key: &str) -> Result<f64> {
    get_f64_param(data, key)?.ok_or_else(|| {
        LabError::invalid_params(format!("missing required parameter: {}", key))
    })
}

/// Extract an optional integer. Floats with no fractional part are accepted.
pub(crate) fn get_i64_param(data: &Data, key: &str) -> Result<Option<i64>> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            if let Some(n) = value.as_i64() {
                return Ok(Some(n));
            }
            match value.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                _ => Err(LabError::invalid_params(format!(
                    "{} must be an integer",
                    key
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> Data {
        match value {
            Value::Object(map) => map,
            _ => panic!("test data must be an object"),
        }
    }

    #[test]
    fn test_require_str_param() {
        let d = data(json!({"name": "x", "empty": "", "num": 3}));
        assert_eq!(require_str_param(&d, "name").unwrap(), "x");
        assert_eq!(
            require_str_param(&d, "empty").unwrap_err().to_string(),
            "empty must not be empty"
        );
        assert_eq!(
            require_str_param(&d, "absent").unwrap_err().to_string(),
            "missing required parameter: absent"
        );
        assert!(require_str_param(&d, "num").is_err());
    }

    #[test]
    fn test_require_base64_param() {
        let d = data(json!({"ok": "aGk=", "bad": "***", "blank": "  "}));
        assert_eq!(require_base64_param(&d, "ok").unwrap(), b"hi");
        assert_eq!(
            require_base64_param(&d, "bad").unwrap_err().to_string(),
            "bad must be valid base64"
        );
        assert!(require_base64_param(&d, "blank").is_err());
    }

    #[test]
    fn test_numeric_params() {
        let d = data(json!({"a": 1.5, "n": 20, "f": 20.0, "s": "7", "frac": 2.5}));
        assert_eq!(require_f64_param(&d, "a").unwrap(), 1.5);
        assert_eq!(require_f64_param(&d, "n").unwrap(), 20.0);
        assert!(require_f64_param(&d, "s").is_err());
        assert!(require_f64_param(&d, "absent").is_err());

        assert_eq!(get_i64_param(&d, "n").unwrap(), Some(20));
        assert_eq!(get_i64_param(&d, "f").unwrap(), Some(20));
        assert_eq!(get_i64_param(&d, "absent").unwrap(), None);
        assert!(get_i64_param(&d, "frac").is_err());
    }
}
