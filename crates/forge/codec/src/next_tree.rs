//! `_Node` codec: binary trees whose nodes carry a same-level `next` pointer
//!
//! The serialized form lists each level by following `next` from the
//! level's leftmost node, and closes the level with a `"#"` marker once
//! its last node has been emitted: a perfect tree of seven nodes with all
//! `next` pointers connected serializes as `[1,#,2,3,#,4,5,6,7,#]`.
//! Because the values are read along `next`, a tree whose pointers were
//! never connected serializes as just the leftmost spine.
//!
//! Decoding accepts either that marker form (rebuilding children left to
//! right, two per parent, with `next` connected) or a plain level-order
//! array with `null` markers (the usual problem input, `next` unset).

use crate::graph::{GraphNode, GraphShape, NodeGraph};
use crate::{CodecError, CodecResult};
use serde_json::Value;

/// Level terminator in the serialized form
pub const LEVEL_MARKER: &str = "#";

pub(crate) fn is_marker(value: &Value) -> bool {
    value.as_str() == Some(LEVEL_MARKER)
}

/// Serialize a `_Node` tree into its `"#"`-terminated level form
pub fn next_tree_to_array(graph: &NodeGraph) -> CodecResult<Vec<Value>> {
    let mut out = Vec::new();
    for level in graph.levels()? {
        let Some(&first) = level.first() else {
            continue;
        };
        let mut cursor = Some(first);
        let mut steps = 0;
        while let Some(idx) = cursor {
            if steps > graph.nodes.len() {
                return Err(CodecError::Cycle);
            }
            let node = graph.node(idx)?;
            out.push(node.val.clone());
            cursor = node.next;
            steps += 1;
        }
        out.push(Value::from(LEVEL_MARKER));
    }
    Ok(out)
}

/// Deserialize either accepted `_Node` form into a graph
pub fn array_to_next_tree(values: &[Value]) -> CodecResult<NodeGraph> {
    if values.iter().any(is_marker) {
        from_marked_levels(values)
    } else {
        Ok(NodeGraph::from_level_order(values, GraphShape::NextTree))
    }
}

fn from_marked_levels(values: &[Value]) -> CodecResult<NodeGraph> {
    let mut levels: Vec<Vec<&Value>> = Vec::new();
    let mut current = Vec::new();
    for value in values {
        if is_marker(value) {
            levels.push(std::mem::take(&mut current));
        } else if value.is_null() {
            return Err(CodecError::MalformedLevels(
                "null inside a marked level".into(),
            ));
        } else {
            current.push(value);
        }
    }
    if !current.is_empty() {
        levels.push(current);
    }

    let mut graph = NodeGraph::empty(GraphShape::NextTree);
    let Some(top) = levels.first() else {
        return Ok(graph);
    };
    if top.is_empty() && levels.iter().all(Vec::is_empty) {
        return Ok(graph);
    }
    if top.len() != 1 {
        return Err(CodecError::MalformedLevels(format!(
            "first level must hold exactly one node, found {}",
            top.len()
        )));
    }

    let mut previous: Vec<usize> = Vec::new();
    for (depth, level) in levels.iter().enumerate() {
        if level.is_empty() {
            return Err(CodecError::MalformedLevels(format!("level {} is empty", depth)));
        }
        if depth > 0 && level.len() > previous.len() * 2 {
            return Err(CodecError::MalformedLevels(format!(
                "level {} holds {} nodes but only {} parents",
                depth,
                level.len(),
                previous.len()
            )));
        }

        let start = graph.nodes.len();
        for (pos, value) in level.iter().enumerate() {
            let idx = graph.nodes.len();
            graph.nodes.push(GraphNode::leaf((*value).clone()));
            if pos > 0 {
                graph.nodes[idx - 1].next = Some(idx);
            }
            if depth > 0 {
                let parent = previous[pos / 2];
                if pos % 2 == 0 {
                    graph.nodes[parent].left = Some(idx);
                } else {
                    graph.nodes[parent].right = Some(idx);
                }
            }
        }
        previous = (start..graph.nodes.len()).collect();
    }
    graph.root = Some(0);
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn marked(raw: &[&str]) -> Vec<Value> {
        raw.iter()
            .map(|s| match s.parse::<i64>() {
                Ok(n) => json!(n),
                Err(_) => json!(s),
            })
            .collect()
    }

    #[test]
    fn test_perfect_tree_round_trip() {
        let values = marked(&["1", "#", "2", "3", "#", "4", "5", "6", "7", "#"]);
        let graph = array_to_next_tree(&values).unwrap();
        assert_eq!(graph.nodes.len(), 7);
        assert_eq!(next_tree_to_array(&graph).unwrap(), values);
    }

    #[test]
    fn test_unconnected_input_serializes_spine_only() {
        let input: Vec<Value> = (1..=7).map(|i| json!(i)).collect();
        let graph = array_to_next_tree(&input).unwrap();
        assert!(graph.nodes.iter().all(|n| n.next.is_none()));
        assert_eq!(
            next_tree_to_array(&graph).unwrap(),
            marked(&["1", "#", "2", "#", "4", "#"])
        );
    }

    #[test]
    fn test_leaf_level_still_closed_by_marker() {
        let graph = array_to_next_tree(&[json!(1)]).unwrap();
        assert_eq!(next_tree_to_array(&graph).unwrap(), marked(&["1", "#"]));

        let graph = array_to_next_tree(&[json!(1), json!(null), json!(null)]).unwrap();
        assert_eq!(next_tree_to_array(&graph).unwrap(), marked(&["1", "#"]));
    }

    #[test]
    fn test_empty() {
        let graph = array_to_next_tree(&[]).unwrap();
        assert!(graph.is_empty());
        assert!(next_tree_to_array(&graph).unwrap().is_empty());
    }

    #[test]
    fn test_sparse_marked_levels() {
        let values = marked(&["1", "#", "2", "3", "#", "4", "5", "7", "#"]);
        let graph = array_to_next_tree(&values).unwrap();
        assert_eq!(next_tree_to_array(&graph).unwrap(), values);
    }

    #[test]
    fn test_malformed_levels() {
        let too_wide = marked(&["1", "#", "2", "3", "4", "#"]);
        assert!(matches!(
            array_to_next_tree(&too_wide),
            Err(CodecError::MalformedLevels(_))
        ));
        let two_roots = marked(&["1", "2", "#"]);
        assert!(array_to_next_tree(&two_roots).is_err());
    }

    #[test]
    fn test_cyclic_next_detected() {
        let mut graph = array_to_next_tree(&marked(&["1", "#", "2", "3", "#"])).unwrap();
        graph.nodes[2].next = Some(1);
        assert!(matches!(next_tree_to_array(&graph), Err(CodecError::Cycle)));
    }
}
