//! Canonical JSON stringification for argument comparison.
//!
//! Two argument objects built with different key insertion order must compare
//! equal. Object keys come out in byte order at every depth, because
//! `serde_json::Map` is a `BTreeMap` without the `preserve_order` feature;
//! array order is preserved. Integer-valued floats collapse to integers so
//! `1.0` and `1` match.

use serde_json::{Map, Number, Value};

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Number(n) => normalize_number(n),
        other => other.clone(),
    }
}

fn normalize_number(n: &Number) -> Value {
    if n.is_i64() || n.is_u64() {
        return Value::Number(n.clone());
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
            Value::Number(Number::from(f as i64))
        }
        _ => Value::Number(n.clone()),
    }
}

/// Deterministic compact string for `value`.
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":{"y":2,"x":3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":{"x":3,"y":2},"b":1}"#).unwrap();
        assert_eq!(canonical_json(&a), canonical_json(&b));
        assert_eq!(canonical_json(&a), r#"{"a":{"x":3,"y":2},"b":1}"#);
    }

    #[test]
    fn test_keys_in_byte_order() {
        let v = serde_json::json!({"b": 1, "a": 2, "B": 3, "_": 4});
        assert_eq!(canonical_json(&v), r#"{"B":3,"_":4,"a":2,"b":1}"#);
    }

    #[test]
    fn test_array_order_preserved() {
        let a = serde_json::json!({"paths": ["b", "a"]});
        let b = serde_json::json!({"paths": ["a", "b"]});
        assert_ne!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn test_nested_objects_in_arrays_sorted() {
        let a = serde_json::json!([{"z": 1, "a": 2}]);
        assert_eq!(canonical_json(&a), r#"[{"a":2,"z":1}]"#);
    }

    #[test]
    fn test_integer_float_normalized() {
        assert_eq!(
            canonical_json(&serde_json::json!({"n": 1.0})),
            canonical_json(&serde_json::json!({"n": 1}))
        );
        assert_eq!(canonical_json(&serde_json::json!(1.5)), "1.5");
    }
}
