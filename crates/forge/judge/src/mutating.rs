//! Mutating-array-with-k strategy
//!
//! The candidate mutates one array argument in place and yields a count
//! `k`. The count and the first `k` elements of the mutated array are
//! graded. Three expected shapes are accepted:
//!
//! - `[e0, e1, ...]`: the expected first `k` elements (`k` = its length)
//! - `{"expectedNums": [...]}`: the same, wrapped
//! - a bare number: legacy count-only mode. Only `k` is checked and the
//!   array contents are ignored. Older stored cases depend on this.

use crate::Verdict;
use forge_compare::{compare_values, deep_equal};
use serde_json::{json, Value};

/// Expected value of a mutating-array case
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedK<'a> {
    Elements(&'a [Value]),
    CountOnly(u64),
}

impl<'a> ExpectedK<'a> {
    pub fn parse(expected: &'a Value) -> Option<Self> {
        match expected {
            Value::Array(items) => Some(Self::Elements(items)),
            Value::Object(obj) => obj
                .get("expectedNums")
                .and_then(Value::as_array)
                .map(|items| Self::Elements(items.as_slice())),
            number @ Value::Number(_) => as_count(number).map(Self::CountOnly),
            _ => None,
        }
    }
}

/// A non-negative integer count; integral floats are accepted
fn as_count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let x = value.as_f64()?;
    (x >= 0.0 && x.fract() == 0.0 && x <= u32::MAX as f64).then_some(x as u64)
}

fn sorted(items: &[Value]) -> Vec<Value> {
    let mut items = items.to_vec();
    items.sort_by(compare_values);
    items
}

/// Grade a mutating-array case against the post-call arguments
pub fn judge_mutating(
    array_param_index: usize,
    k_is_return_value: bool,
    ignore_order: bool,
    runtime_args: &[Value],
    return_value: &Value,
    expected: &Value,
) -> Verdict {
    let Some(array) = runtime_args.get(array_param_index) else {
        return Verdict::rejected(
            Value::Null,
            expected.clone(),
            format!(
                "argument {} missing: candidate received {} arguments",
                array_param_index,
                runtime_args.len()
            ),
        );
    };
    let Some(array) = array.as_array() else {
        return Verdict::rejected(
            array.clone(),
            expected.clone(),
            format!("argument {} is not an array after the call", array_param_index),
        );
    };

    let k = if k_is_return_value {
        match as_count(return_value) {
            Some(k) => k,
            None => {
                return Verdict::rejected(
                    return_value.clone(),
                    expected.clone(),
                    "return value is not a non-negative integer count",
                )
            }
        }
    } else {
        array.len() as u64
    };

    let Some(shape) = ExpectedK::parse(expected) else {
        return Verdict::rejected(
            json!({ "k": k }),
            expected.clone(),
            "unsupported expected value for mutatingArrayWithK",
        );
    };

    match shape {
        ExpectedK::CountOnly(expected_k) => Verdict::new(k == expected_k, json!(k), json!(expected_k))
            .with_debug(json!({ "mode": "countOnly" })),
        ExpectedK::Elements(expected_items) => {
            let expected_k = expected_items.len() as u64;
            let expected_report = json!({ "k": expected_k, "nums": expected_items });
            if k > array.len() as u64 {
                return Verdict::rejected(
                    json!({ "k": k, "nums": array }),
                    expected_report,
                    format!("k = {} exceeds the array length {}", k, array.len()),
                );
            }

            let slice = &array[..k as usize];
            let (actual_items, expected_items) = if ignore_order {
                (sorted(slice), sorted(expected_items))
            } else {
                (slice.to_vec(), expected_items.to_vec())
            };
            let pass = k == expected_k
                && deep_equal(
                    &Value::Array(actual_items.clone()),
                    &Value::Array(expected_items.clone()),
                    true,
                );
            Verdict::new(
                pass,
                json!({ "k": k, "nums": actual_items }),
                json!({ "k": expected_k, "nums": expected_items }),
            )
        }
    }
}
