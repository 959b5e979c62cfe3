//! Decimal rounding

use serde_json::{Number, Value};

const SCALE: f64 = 1e5;

/// Round a number to 5 decimal places, halves rounding up.
/// Non-finite input is returned unchanged.
pub fn round_number(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let rounded = (x * SCALE + 0.5).floor() / SCALE;
    // keep -0.0 out of the output
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Deep copy of `value` with every non-integer number rounded to 5
/// decimal places. Integers, strings and structure pass through.
pub fn round_to_5_decimals(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .and_then(|x| Number::from_f64(round_number(x)))
            .map(Value::Number)
            .unwrap_or_else(|| value.clone()),
        Value::Array(items) => Value::Array(items.iter().map(round_to_5_decimals).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), round_to_5_decimals(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_number() {
        assert_eq!(round_number(1.234564), 1.23456);
        assert_eq!(round_number(1.234566), 1.23457);
        assert_eq!(round_number(-0.000001), 0.0);
        assert!(round_number(f64::NAN).is_nan());
    }

    #[test]
    fn test_deep_rounding() {
        let value = json!({"xs": [0.1234567, 2, "s"], "y": 3.333333333});
        assert_eq!(
            round_to_5_decimals(&value),
            json!({"xs": [0.12346, 2, "s"], "y": 3.33333})
        );
    }

    #[test]
    fn test_integers_untouched() {
        assert_eq!(round_to_5_decimals(&json!(i64::MAX)), json!(i64::MAX));
    }
}
