//! Order normalization

use serde_json::Value;
use std::cmp::Ordering;

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: `null < bool < number < string < array
/// < object`; arrays compare lexicographically, objects by sorted entries.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(xs), Value::Array(ys)) => xs
            .iter()
            .zip(ys)
            .map(|(x, y)| compare_values(x, y))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| xs.len().cmp(&ys.len())),
        (Value::Object(xs), Value::Object(ys)) => {
            let mut xe: Vec<_> = xs.iter().collect();
            let mut ye: Vec<_> = ys.iter().collect();
            xe.sort_by(|a, b| a.0.cmp(b.0));
            ye.sort_by(|a, b| a.0.cmp(b.0));
            xe.iter()
                .zip(&ye)
                .map(|((xk, xv), (yk, yv))| xk.cmp(yk).then_with(|| compare_values(xv, yv)))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| xe.len().cmp(&ye.len()))
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Sort every nested array, then the outer array. Non-array values are
/// returned unchanged.
pub fn normalize_unordered(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut items: Vec<Value> = items.iter().map(normalize_unordered).collect();
            items.sort_by(compare_values);
            Value::Array(items)
        }
        other => other.clone(),
    }
}
