//! Property tests: the comparator is symmetric and, when order does not
//! matter, blind to permutations at every array level.

use forge_compare::*;
use proptest::prelude::*;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-50i64..50).prop_map(Value::from),
        (-50.0f64..50.0).prop_map(|x| json!(x)),
        "[a-c]{0,2}".prop_map(Value::from),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Value::Array)
    })
}

/// An array of integer arrays plus a shuffled copy (outer and inner)
fn arb_permuted_matrix() -> impl Strategy<Value = (Value, Value)> {
    prop::collection::vec(prop::collection::vec(-9i64..9, 0..5), 0..6)
        .prop_flat_map(|rows| {
            let shuffled_rows = rows
                .iter()
                .map(|row| Just(row.clone()).prop_shuffle())
                .collect::<Vec<_>>();
            (Just(rows), shuffled_rows)
        })
        .prop_flat_map(|(rows, inner_shuffled)| (Just(rows), Just(inner_shuffled).prop_shuffle()))
        .prop_map(|(rows, shuffled)| (json!(rows), json!(shuffled)))
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn deep_equal_is_symmetric(a in arb_value(), b in arb_value(), order_matters in any::<bool>()) {
        prop_assert_eq!(
            deep_equal(&a, &b, order_matters),
            deep_equal(&b, &a, order_matters)
        );
    }

    #[test]
    fn deep_equal_is_reflexive(a in arb_value(), order_matters in any::<bool>()) {
        prop_assert!(deep_equal(&a, &a, order_matters));
    }

    #[test]
    fn permutations_equal_when_order_ignored((a, b) in arb_permuted_matrix()) {
        prop_assert!(deep_equal(&a, &b, false));
    }

    #[test]
    fn tiny_drift_is_ignored(x in -1000.0f64..1000.0) {
        let snapped = round_number(x);
        let drifted = snapped + 1e-9;
        prop_assert!(deep_equal(&json!(snapped), &json!(drifted), true));
    }

    #[test]
    fn normalization_is_idempotent(a in arb_value()) {
        let once = normalize_unordered(&a);
        prop_assert_eq!(normalize_unordered(&once), once);
    }
}
