//! Host bindings exposed to scripts
//!
//! Scripts get exactly one native function, `__forge_native(op, payload)`.
//! Both the payload and the result are JSON text; the prelude wraps it in
//! the codec and comparator helpers. Node structures cross as tagged
//! node graphs.

use boa_engine::{Context, JsNativeError, JsResult, JsString, JsValue, NativeFunction};
use forge_codec::{deserialize_value, serialize_value};
use forge_compare::{deep_equal, round_to_5_decimals};
use forge_types::ValueType;
use serde_json::Value;

/// Name of the single native function visible to scripts
pub const NATIVE_FN: &str = "__forge_native";

/// Run one host operation on a decoded payload
pub fn dispatch(op: &str, payload: &Value) -> Result<Value, String> {
    let codec = |result: forge_codec::CodecResult<Value>| result.map_err(|e| format!("{op}: {e}"));
    match op {
        "arrayToList" => codec(deserialize_value(ValueType::ListNode, payload)),
        "listToArray" => codec(serialize_value(ValueType::ListNode, payload)),
        "arrayToTree" => codec(deserialize_value(ValueType::TreeNode, payload)),
        "treeToArray" => codec(serialize_value(ValueType::TreeNode, payload)),
        "arrayTo_Node" => codec(deserialize_value(ValueType::NextNode, payload)),
        "_NodeToArray" => codec(serialize_value(ValueType::NextNode, payload)),
        "deepEqual" => {
            let a = payload.get("a").unwrap_or(&Value::Null);
            let b = payload.get("b").unwrap_or(&Value::Null);
            let order_matters = payload
                .get("orderMatters")
                .and_then(Value::as_bool)
                .unwrap_or(true);
            Ok(Value::Bool(deep_equal(a, b, order_matters)))
        }
        "roundTo5Decimals" => Ok(round_to_5_decimals(payload)),
        other => Err(format!("unknown host operation: {other}")),
    }
}

fn arg_string(args: &[JsValue], index: usize, context: &mut Context) -> JsResult<String> {
    let value = args.get(index).cloned().unwrap_or_default();
    Ok(value.to_string(context)?.to_std_string_escaped())
}

fn native_entry(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let op = arg_string(args, 0, context)?;
    let text = arg_string(args, 1, context)?;
    let payload: Value = serde_json::from_str(&text).map_err(|e| {
        JsNativeError::typ().with_message(format!("{op}: payload is not JSON: {e}"))
    })?;
    let result = dispatch(&op, &payload).map_err(|msg| JsNativeError::typ().with_message(msg))?;
    Ok(JsValue::from(JsString::from(result.to_string().as_str())))
}

/// Install the native entry point into a fresh context
pub(crate) fn register(context: &mut Context) -> JsResult<()> {
    context.register_global_callable(
        JsString::from(NATIVE_FN),
        2,
        NativeFunction::from_fn_ptr(native_entry),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_codec::NodeGraph;
    use serde_json::json;

    #[test]
    fn test_codec_ops() {
        let graph = dispatch("arrayToTree", &json!([1, null, 2])).unwrap();
        assert!(NodeGraph::is_graph_value(&graph));
        assert_eq!(dispatch("treeToArray", &graph).unwrap(), json!([1, null, 2]));

        assert_eq!(dispatch("arrayToList", &json!([])).unwrap(), Value::Null);
        assert_eq!(dispatch("listToArray", &Value::Null).unwrap(), json!([]));
    }

    #[test]
    fn test_compare_ops() {
        let payload = json!({"a": [[2, 1]], "b": [[1, 2]], "orderMatters": false});
        assert_eq!(dispatch("deepEqual", &payload).unwrap(), json!(true));

        let payload = json!({"a": [[2, 1]], "b": [[1, 2]]});
        assert_eq!(dispatch("deepEqual", &payload).unwrap(), json!(false));

        assert_eq!(
            dispatch("roundTo5Decimals", &json!(2.0000049)).unwrap(),
            json!(2.0)
        );
    }

    #[test]
    fn test_errors_name_the_operation() {
        let err = dispatch("listToArray", &json!("nope")).unwrap_err();
        assert!(err.starts_with("listToArray:"));
        assert!(dispatch("readFile", &json!("/etc/passwd")).is_err());
    }
}
