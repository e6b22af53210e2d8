//! Canonical document tree.
//!
//! Every input is pushed through its structural (JSON) form before rules see
//! it, so a struct, a map and a parsed JSON text are all treated the same.
//! Objects keep their field order.

use crate::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};

pub type Object = Map<String, Value>;

pub(crate) static NULL: Value = Value::Null;

/// Normalize any serializable input into the canonical tree.
pub fn normalize<T: Serialize + ?Sized>(source: &T) -> Result<Value> {
    Ok(serde_json::to_value(source)?)
}

/// Parse document text into the canonical tree.
pub fn parse(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Render a document (or any output object) as compact text.
pub fn render<T: Serialize + ?Sized>(document: &T) -> Result<String> {
    Ok(serde_json::to_string(document)?)
}

/// Field of an object. A field holding an explicit null is still present.
pub fn field<'a>(object: &'a Object, name: &str) -> Option<&'a Value> {
    object.get(name)
}

/// Field of an object, or null when the field is missing.
pub(crate) fn field_or_null<'a>(object: &'a Object, name: &str) -> &'a Value {
    object.get(name).unwrap_or(&NULL)
}

/// Default string form of a value.
///
/// Strings come back without quotes, numbers and booleans as written,
/// objects and arrays as compact JSON. Null has no string form.
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

pub fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Reading {
        sensor: &'static str,
        level: f64,
        tags: Vec<&'static str>,
    }

    #[test]
    fn test_normalize_struct_matches_json() {
        let reading = Reading {
            sensor: "north",
            level: 2.5,
            tags: vec!["a", "b"],
        };
        let tree = normalize(&reading).unwrap();
        assert_eq!(tree, json!({"sensor": "north", "level": 2.5, "tags": ["a", "b"]}));
    }

    #[test]
    fn test_normalize_keeps_field_order() {
        let tree = parse(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let keys: Vec<&str> = tree.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_text_of_scalars() {
        assert_eq!(text_of(&json!("plain")), Some("plain".to_string()));
        assert_eq!(text_of(&json!(12.21412341)), Some("12.21412341".to_string()));
        assert_eq!(text_of(&json!(3368946346_i64)), Some("3368946346".to_string()));
        assert_eq!(text_of(&json!(true)), Some("true".to_string()));
        assert_eq!(text_of(&Value::Null), None);
        assert_eq!(text_of(&json!({"Field": 12})), Some(r#"{"Field":12}"#.to_string()));
    }

    #[test]
    fn test_field_distinguishes_null_from_missing() {
        let tree = json!({"present": null});
        let object = tree.as_object().unwrap();
        assert_eq!(field(object, "present"), Some(&Value::Null));
        assert_eq!(field(object, "absent"), None);
        assert!(field_or_null(object, "absent").is_null());
    }

    #[test]
    fn test_render_is_compact() {
        assert_eq!(render(&json!({"a": [1, 2]})).unwrap(), r#"{"a":[1,2]}"#);
    }
}
