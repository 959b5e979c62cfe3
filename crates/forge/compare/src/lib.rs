//! Forge Comparator
//!
//! Deep equality over JSON values as used by every judge strategy:
//!
//! 1. Both sides are rounded to 5 decimal places, so floating-point drift
//!    (`0.1 + 0.2`) never fails a case.
//! 2. When output order does not matter, both sides are normalized: every
//!    nested array is sorted, then the outer array is sorted.
//! 3. The results are compared structurally. Numbers compare by value, so
//!    `1` and `1.0` are equal.
//!
//! The sort uses a total order over JSON values
//! (`null < bool < number < string < array < object`), which makes the
//! comparison symmetric for any pair of inputs.

#![deny(unsafe_code)]

mod normalize;
mod round;

pub use normalize::{compare_values, normalize_unordered};
pub use round::{round_to_5_decimals, round_number};

use serde_json::Value;

/// Compare an actual value with an expected one
pub fn deep_equal(actual: &Value, expected: &Value, order_matters: bool) -> bool {
    let mut a = round_to_5_decimals(actual);
    let mut b = round_to_5_decimals(expected);
    if !order_matters {
        a = normalize_unordered(&a);
        b = normalize_unordered(&b);
    }
    values_equal(&a, &b)
}

/// Structural equality with numbers compared by value
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_float_drift_is_neutralized() {
        assert!(deep_equal(&json!(0.1 + 0.2), &json!(0.3), true));
        assert!(deep_equal(&json!(1.0000001), &json!(1.0000002), true));
        assert!(!deep_equal(&json!(1.00001), &json!(1.00002), true));
    }

    #[test]
    fn test_integer_and_float_forms_are_equal() {
        assert!(deep_equal(&json!([1, 2]), &json!([1.0, 2.0]), true));
    }

    #[test]
    fn test_order_sensitivity() {
        let a = json!([[1, 2], [3]]);
        let b = json!([[3], [2, 1]]);
        assert!(!deep_equal(&a, &b, true));
        assert!(deep_equal(&a, &b, false));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(!deep_equal(&json!([1, 2]), &json!([1, 2, 3]), false));
        assert!(!deep_equal(&json!([]), &json!(null), true));
    }

    #[test]
    fn test_objects() {
        assert!(deep_equal(
            &json!({"a": 1, "b": [2.000001]}),
            &json!({"b": [2], "a": 1.0}),
            true
        ));
        assert!(!deep_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2}), true));
    }

    #[test]
    fn test_mixed_types() {
        assert!(!deep_equal(&json!("1"), &json!(1), true));
        assert!(!deep_equal(&json!(true), &json!(1), true));
        assert!(deep_equal(&json!(null), &json!(null), false));
    }
}
