//! Binary tree codec (level order with `null` markers)

use crate::graph::{GraphShape, NodeGraph};
use serde_json::Value;
use std::collections::VecDeque;

/// A binary tree node
#[derive(Debug, PartialEq)]
pub struct TreeNode {
    pub val: Value,
    pub left: Option<Box<TreeNode>>,
    pub right: Option<Box<TreeNode>>,
}

impl TreeNode {
    pub fn new(val: impl Into<Value>) -> Self {
        Self {
            val: val.into(),
            left: None,
            right: None,
        }
    }

    /// Number of nodes in this subtree
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.left.as_deref());
            stack.extend(node.right.as_deref());
        }
        count
    }
}

/// `[1, 2, 3, null, 5]` → tree. An empty array or a `null` root yields
/// no tree; entries past the last possible parent are ignored.
pub fn array_to_tree(values: &[Value]) -> Option<Box<TreeNode>> {
    let graph = NodeGraph::from_level_order(values, GraphShape::Tree);
    let order: Vec<usize> = (0..graph.nodes.len()).collect();
    graph.build_tree(&order)
}

/// Tree → level-order array with `null` for each absent child of a
/// present node, trailing `null`s trimmed
pub fn tree_to_array(root: Option<&TreeNode>) -> Vec<Value> {
    let mut out = Vec::new();
    let mut queue: VecDeque<Option<&TreeNode>> = VecDeque::from([root]);
    if root.is_none() {
        return out;
    }

    while let Some(slot) = queue.pop_front() {
        match slot {
            Some(node) => {
                out.push(node.val.clone());
                queue.push_back(node.left.as_deref());
                queue.push_back(node.right.as_deref());
            }
            None => out.push(Value::Null),
        }
    }

    while out.last().is_some_and(Value::is_null) {
        out.pop();
    }
    out
}
