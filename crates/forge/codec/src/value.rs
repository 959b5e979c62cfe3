//! Type-directed, defensive conversions between serialized values and
//! the node graph wire form
//!
//! Upstream code sometimes hands over values that are already converted,
//! or wraps a result one level too deep (`[[1, 2, 3]]`, `[{"$graph": ..}]`).
//! Every function here accepts those forms and converges on the same
//! output, so applying a conversion twice is harmless.

use crate::error::describe;
use crate::graph::{GraphShape, NodeGraph};
use crate::{
    array_to_list, array_to_next_tree, list_to_array, next_tree_to_array, tree_to_array,
    CodecError, CodecResult, ListNode, TreeNode,
};
use forge_types::ValueType;
use serde_json::Value;

/// A one-element array whose element is itself an array or a node is a
/// double-wrapped value; returns the inner value.
fn unwrap_nested(items: &[Value]) -> Option<&Value> {
    match items {
        [inner] if inner.is_array() || NodeGraph::looks_like_node(inner) => Some(inner),
        _ => None,
    }
}

/// Decode a linked list from an array, a graph, a nested object or `null`
pub fn decode_list(value: &Value) -> CodecResult<Option<Box<ListNode>>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => match unwrap_nested(items) {
            Some(inner) => decode_list(inner),
            None => Ok(array_to_list(items)),
        },
        other => NodeGraph::from_value(other)?.to_list(),
    }
}

/// Decode a binary tree from a level-order array, a graph, a nested
/// object or `null`
pub fn decode_tree(value: &Value) -> CodecResult<Option<Box<TreeNode>>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => match unwrap_nested(items) {
            Some(inner) => decode_tree(inner),
            None => Ok(crate::array_to_tree(items)),
        },
        other => NodeGraph::from_value(other)?.to_tree(),
    }
}

/// Decode a `_Node` tree from either array form, a graph or `null`
pub fn decode_next_tree(value: &Value) -> CodecResult<NodeGraph> {
    match value {
        Value::Null => Ok(NodeGraph::empty(GraphShape::NextTree)),
        Value::Array(items) => match unwrap_nested(items) {
            Some(inner) => decode_next_tree(inner),
            None => array_to_next_tree(items),
        },
        other => {
            let mut graph = NodeGraph::from_value(other)?;
            graph.shape = GraphShape::NextTree;
            graph.levels()?;
            Ok(graph)
        }
    }
}

/// Bring a value of type `ty` into its serialized form.
///
/// Values already serialized are returned unchanged (trees have trailing
/// `null`s trimmed); graphs and nested node objects are encoded.
pub fn serialize_value(ty: ValueType, value: &Value) -> CodecResult<Value> {
    match ty {
        ValueType::ListNode => match value {
            Value::Array(items) if unwrap_nested(items).is_none() => Ok(value.clone()),
            _ => Ok(Value::Array(list_to_array(decode_list(value)?.as_deref()))),
        },
        ValueType::TreeNode => Ok(Value::Array(tree_to_array(decode_tree(value)?.as_deref()))),
        ValueType::NextNode => match value {
            Value::Array(items) if unwrap_nested(items).is_none() => Ok(value.clone()),
            _ => Ok(Value::Array(next_tree_to_array(&decode_next_tree(value)?)?)),
        },
        ValueType::ListNodeArray => map_elements(ty, value, ValueType::ListNode, serialize_value),
        ValueType::TreeNodeArray => map_elements(ty, value, ValueType::TreeNode, serialize_value),
        _ => Ok(value.clone()),
    }
}

/// Bring a serialized value of type `ty` into the graph wire form used
/// inside the sandbox. Empty structures become `null`.
pub fn deserialize_value(ty: ValueType, value: &Value) -> CodecResult<Value> {
    match ty {
        ValueType::ListNode => Ok(match decode_list(value)? {
            Some(head) => NodeGraph::from_list(Some(&head)).to_value(),
            None => Value::Null,
        }),
        ValueType::TreeNode => Ok(match decode_tree(value)? {
            Some(root) => NodeGraph::from_tree(Some(&root)).to_value(),
            None => Value::Null,
        }),
        ValueType::NextNode => {
            let graph = decode_next_tree(value)?;
            Ok(if graph.is_empty() {
                Value::Null
            } else {
                graph.to_value()
            })
        }
        ValueType::ListNodeArray => map_elements(ty, value, ValueType::ListNode, deserialize_value),
        ValueType::TreeNodeArray => map_elements(ty, value, ValueType::TreeNode, deserialize_value),
        _ => Ok(value.clone()),
    }
}

fn map_elements(
    ty: ValueType,
    value: &Value,
    element: ValueType,
    convert: fn(ValueType, &Value) -> CodecResult<Value>,
) -> CodecResult<Value> {
    match value {
        Value::Null => Ok(Value::Array(Vec::new())),
        Value::Array(items) => items
            .iter()
            .map(|item| convert(element, item))
            .collect::<CodecResult<Vec<_>>>()
            .map(Value::Array),
        other => Err(CodecError::UnexpectedShape {
            expected: ty,
            found: describe(other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_serialize_is_idempotent() {
        let arr = json!([1, 2, 3]);
        assert_eq!(serialize_value(ValueType::ListNode, &arr).unwrap(), arr);

        let graph = deserialize_value(ValueType::ListNode, &arr).unwrap();
        assert!(NodeGraph::is_graph_value(&graph));
        assert_eq!(serialize_value(ValueType::ListNode, &graph).unwrap(), arr);
    }

    #[test]
    fn test_double_wrapped_inputs() {
        let arr = json!([1, 2, 3]);
        let graph = deserialize_value(ValueType::ListNode, &arr).unwrap();

        let wrapped_graph = json!([graph.clone()]);
        assert_eq!(serialize_value(ValueType::ListNode, &wrapped_graph).unwrap(), arr);

        let wrapped_array = json!([[1, 2, 3]]);
        assert_eq!(
            deserialize_value(ValueType::ListNode, &wrapped_array).unwrap(),
            graph
        );

        let again = deserialize_value(ValueType::ListNode, &graph).unwrap();
        assert_eq!(again, graph);
    }

    #[test]
    fn test_empty_structures() {
        assert_eq!(deserialize_value(ValueType::ListNode, &json!([])).unwrap(), Value::Null);
        assert_eq!(serialize_value(ValueType::ListNode, &Value::Null).unwrap(), json!([]));
        assert_eq!(serialize_value(ValueType::TreeNode, &Value::Null).unwrap(), json!([]));
        assert_eq!(deserialize_value(ValueType::NextNode, &json!([])).unwrap(), Value::Null);
    }

    #[test]
    fn test_tree_serialize_trims() {
        let value = json!([3, 9, 20, null, null, 15, 7, null, null]);
        assert_eq!(
            serialize_value(ValueType::TreeNode, &value).unwrap(),
            json!([3, 9, 20, null, null, 15, 7])
        );
    }

    #[test]
    fn test_nested_object_tree() {
        let value = json!({"val": 1, "left": null, "right": {"val": 2, "left": null, "right": null}});
        assert_eq!(
            serialize_value(ValueType::TreeNode, &value).unwrap(),
            json!([1, null, 2])
        );
    }

    #[test]
    fn test_array_of_structures() {
        let lists = json!([[1, 4, 5], [1, 3, 4], []]);
        let graphs = deserialize_value(ValueType::ListNodeArray, &lists).unwrap();
        let items = graphs.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert!(NodeGraph::is_graph_value(&items[0]));
        assert!(items[2].is_null());

        let mixed = json!([items[0].clone(), [1, 3, 4], null]);
        assert_eq!(
            serialize_value(ValueType::ListNodeArray, &mixed).unwrap(),
            lists
        );
    }

    #[test]
    fn test_next_tree_forms() {
        let input = json!([1, 2, 3]);
        assert_eq!(serialize_value(ValueType::NextNode, &input).unwrap(), input);

        let graph = deserialize_value(ValueType::NextNode, &json!([1, "#", 2, 3, "#"])).unwrap();
        assert_eq!(
            serialize_value(ValueType::NextNode, &graph).unwrap(),
            json!([1, "#", 2, 3, "#"])
        );
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(serialize_value(ValueType::Number, &json!(4.5)).unwrap(), json!(4.5));
        assert_eq!(
            deserialize_value(ValueType::NumberMatrix, &json!([[1], [2]])).unwrap(),
            json!([[1], [2]])
        );
    }

    #[test]
    fn test_unexpected_shape() {
        assert!(matches!(
            serialize_value(ValueType::ListNodeArray, &json!(5)),
            Err(CodecError::UnexpectedShape { .. })
        ));
        assert!(matches!(
            decode_list(&json!("abc")),
            Err(CodecError::NotANode(_))
        ));
    }
}
