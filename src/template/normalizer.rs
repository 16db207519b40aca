//! Preview data normalization.
//!
//! Preview data is stored as a string inside template records that are
//! themselves serialized by other layers, so by the time it comes back it
//! may carry escape sequences that no longer belong to it. The repairs below
//! undo the known corruption patterns before parsing.

use serde_json::{json, Value};

use super::types::NormalizeError;
use crate::metrics::PreviewMetrics;

/// Literal two-character sequences and their replacements, applied in order.
const REPAIRS: &[(&str, &str)] = &[
    ("\\n", ""),
    ("\\r", ""),
    ("\\t", ""),
    ("\\\"", "\""),
    ("\\'", "'"),
    ("\\\\", "\\"),
    ("\\b", ""),
    ("\\f", ""),
];

/// Normalize stored preview data into a payload object.
///
/// Never fails: absent, empty or unparseable input yields [`sample_payload`].
pub fn normalize_payload(raw: Option<&str>) -> Value {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return sample_payload();
    };

    match parse_preview_data(raw) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Preview data unusable, using sample payload");
            PreviewMetrics::record_payload_fallback(e.reason());
            sample_payload()
        }
    }
}

/// Repair and parse preview data, surfacing the failure.
///
/// Double-encoded data gets exactly one more parse: either the repaired text
/// parses to a JSON string, or it fails to parse but is wrapped in quotes.
/// The final value must be an object.
pub fn parse_preview_data(raw: &str) -> Result<Value, NormalizeError> {
    let cleaned = clean_preview_data(raw);

    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::String(inner)) => serde_json::from_str(inner.trim())?,
        Ok(value) => value,
        Err(e) => match strip_wrapping_quotes(&cleaned) {
            Some(inner) => serde_json::from_str(inner).map_err(|_| e)?,
            None => return Err(e.into()),
        },
    };

    match value {
        Value::Object(_) => Ok(value),
        other => Err(NormalizeError::NotAnObject(json_type_name(&other))),
    }
}

fn strip_wrapping_quotes(s: &str) -> Option<&str> {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map(str::trim)
}

/// Apply the character-level repairs and trim.
pub fn clean_preview_data(raw: &str) -> String {
    let repaired = REPAIRS
        .iter()
        .fold(raw.to_string(), |acc, (from, to)| acc.replace(from, to));

    repaired.trim().to_string()
}

/// Fixed sample payload used when no usable preview data exists
pub fn sample_payload() -> Value {
    json!({
        "customer": {
            "name": "John Smith",
            "email": "john.smith@example.com",
            "phone": "(555) 123-4567",
            "company": "Smith Family Holdings"
        },
        "property": {
            "address": "123 Main St, Springfield, IL 62701"
        },
        "project": {
            "product": "Roof Replacement",
            "message": "Looking for a quote before the rainy season.",
            "relationToProperty": "Owner",
            "needFinance": "Yes",
            "consultationType": "In-Home Consultation"
        },
        "submission": {
            "id": "SUB-000123",
            "timestamp": "2024-01-15T10:30:00Z",
            "leadSource": "Website"
        },
        "admin": {
            "dashboardUrl": "https://admin.example.com/dashboard"
        }
    })
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_returns_sample() {
        assert_eq!(normalize_payload(None), sample_payload());
        assert_eq!(normalize_payload(Some("")), sample_payload());
        assert_eq!(normalize_payload(Some("   ")), sample_payload());
    }

    #[test]
    fn test_clean_json_is_unchanged() {
        let raw = r#"{"customer":{"name":"Jane Doe","age":41,"vip":true},"tags":["a","b"]}"#;
        let expected: Value = serde_json::from_str(raw).unwrap();

        assert_eq!(normalize_payload(Some(raw)), expected);
    }

    #[test]
    fn test_escaped_quotes_and_newlines_are_repaired() {
        let payload = json!({
            "customer": { "name": "Jane Doe" },
            "submission": { "id": "SUB-9" }
        });
        let pretty = serde_json::to_string_pretty(&payload).unwrap();
        let corrupted = pretty.replace('"', "\\\"").replace('\n', "\\n");

        assert_eq!(normalize_payload(Some(&corrupted)), payload);
    }

    #[test]
    fn test_double_encoded_json_is_parsed_twice() {
        let payload = json!({ "customer": { "name": "Jane Doe" } });
        let once = serde_json::to_string(&payload).unwrap();
        let twice = serde_json::to_string(&once).unwrap();

        assert_eq!(normalize_payload(Some(&twice)), payload);
        assert_eq!(parse_preview_data(r#""{}""#).unwrap(), json!({}));
    }

    #[test]
    fn test_third_level_string_is_not_followed() {
        let err = parse_preview_data(r#""\"{}\"""#);
        assert!(matches!(err, Err(NormalizeError::NotAnObject("string"))));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(matches!(
            parse_preview_data("[1, 2, 3]"),
            Err(NormalizeError::NotAnObject("array"))
        ));
        assert!(matches!(
            parse_preview_data("42"),
            Err(NormalizeError::NotAnObject("number"))
        ));
        assert_eq!(normalize_payload(Some("[1, 2, 3]")), sample_payload());
    }

    #[test]
    fn test_garbage_falls_back_to_sample() {
        assert!(matches!(
            parse_preview_data("{customer: nope"),
            Err(NormalizeError::Parse(_))
        ));
        assert_eq!(normalize_payload(Some("{customer: nope")), sample_payload());
    }

    #[test]
    fn test_repairs_apply_in_order() {
        assert_eq!(clean_preview_data("  {\\\"a\\\":\\t1}\\r\\n  "), "{\"a\":1}");
        assert_eq!(clean_preview_data("\\\\u0041"), "\\u0041");
        assert_eq!(clean_preview_data("{\\'x\\'}\\f\\b"), "{'x'}");
    }

    #[test]
    fn test_sample_payload_shape() {
        let sample = sample_payload();
        for path in [
            "/customer/name",
            "/customer/email",
            "/customer/phone",
            "/customer/company",
            "/property/address",
            "/project/product",
            "/project/message",
            "/project/relationToProperty",
            "/project/needFinance",
            "/project/consultationType",
            "/submission/id",
            "/submission/timestamp",
            "/submission/leadSource",
            "/admin/dashboardUrl",
        ] {
            assert!(sample.pointer(path).is_some(), "missing {}", path);
        }
    }
}
