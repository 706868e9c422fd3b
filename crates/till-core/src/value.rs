//! # Structural Equality
//!
//! The state store treats a write of a structurally equal value as a no-op.
//! `serde_json::Value`'s own `PartialEq` distinguishes `1` from `1.0`; this
//! comparison does not, since both serialize to the same JSON number.

use serde_json::Value;

/// Deep, structural comparison of two JSON values.
///
/// Objects compare by key set and per-key values (key order is ignored),
/// arrays element-wise, numbers by numeric value.
///
/// ## Example
/// ```rust
/// use serde_json::json;
/// use till_core::value::structurally_equal;
///
/// assert!(structurally_equal(&json!({"id": 1, "tags": ["a"]}), &json!({"tags": ["a"], "id": 1.0})));
/// assert!(!structurally_equal(&json!({"id": 1}), &json!({"id": 2})));
/// ```
pub fn structurally_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| structurally_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| structurally_equal(v, other)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_separately_built_objects_are_equal() {
        let first = json!({"id": 1, "name": "Ana", "roles": ["cashier"]});
        let second = json!({"roles": ["cashier"], "name": "Ana", "id": 1});
        assert!(structurally_equal(&first, &second));
    }

    #[test]
    fn test_differences_are_detected() {
        assert!(!structurally_equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!structurally_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!structurally_equal(&json!("1"), &json!(1)));
        assert!(!structurally_equal(&json!(null), &json!(false)));
    }

    #[test]
    fn test_integer_and_float_forms_compare_numerically() {
        assert!(structurally_equal(&json!(1), &json!(1.0)));
        assert!(!structurally_equal(&json!(1), &json!(1.5)));
    }
}
