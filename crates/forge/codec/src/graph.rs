//! Node graph: arena form of linked structures
//!
//! A `NodeGraph` stores nodes in a flat vector and links them by index.
//! It is the in-memory form of `_Node` trees (whose `next` pointers make
//! a node reachable along more than one path) and the wire form in which
//! every structure crosses the sandbox boundary:
//!
//! ```json
//! {"$graph": "tree", "root": 0, "nodes": [{"val": 1, "left": 1}, {"val": 2}]}
//! ```

use crate::error::describe;
use crate::{CodecError, CodecResult, ListNode, TreeNode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;

/// JSON key marking a serialized node graph
pub const GRAPH_TAG: &str = "$graph";

/// Which kind of structure a graph holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphShape {
    List,
    Tree,
    NextTree,
}

/// One node of a graph; links are indices into `NodeGraph::nodes`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub val: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<usize>,
}

impl GraphNode {
    pub fn leaf(val: Value) -> Self {
        Self {
            val,
            next: None,
            left: None,
            right: None,
        }
    }
}

/// Arena-backed linked structure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeGraph {
    #[serde(rename = "$graph")]
    pub shape: GraphShape,
    pub root: Option<usize>,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl NodeGraph {
    /// A graph with no nodes
    pub fn empty(shape: GraphShape) -> Self {
        Self {
            shape,
            root: None,
            nodes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Look up a node, rejecting dangling indices
    pub fn node(&self, idx: usize) -> CodecResult<&GraphNode> {
        self.nodes.get(idx).ok_or(CodecError::DanglingIndex(idx))
    }

    // ── Value Detection ──────────────────────────────────────────────

    /// Whether a JSON value is a tagged node graph
    pub fn is_graph_value(value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|obj| obj.contains_key(GRAPH_TAG))
    }

    /// Whether a JSON value is a node in any accepted form: a tagged graph
    /// or a nested `{val, next | left | right}` object
    pub fn looks_like_node(value: &Value) -> bool {
        match value.as_object() {
            Some(obj) if obj.contains_key(GRAPH_TAG) => true,
            Some(obj) => {
                obj.contains_key("val")
                    && (obj.contains_key("next")
                        || obj.contains_key("left")
                        || obj.contains_key("right"))
            }
            None => false,
        }
    }

    /// Parse a node from a tagged graph or a nested object
    pub fn from_value(value: &Value) -> CodecResult<Self> {
        if Self::is_graph_value(value) {
            let graph: NodeGraph = serde_json::from_value(value.clone())?;
            graph.check_indices()?;
            return Ok(graph);
        }
        if Self::looks_like_node(value) {
            return Self::from_nested(value);
        }
        Err(CodecError::NotANode(describe(value)))
    }

    /// The tagged JSON wire form
    pub fn to_value(&self) -> Value {
        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                let mut obj = Map::new();
                obj.insert("val".into(), node.val.clone());
                for (key, link) in [("next", node.next), ("left", node.left), ("right", node.right)] {
                    if let Some(idx) = link {
                        obj.insert(key.into(), Value::from(idx));
                    }
                }
                Value::Object(obj)
            })
            .collect();

        let shape = match self.shape {
            GraphShape::List => "list",
            GraphShape::Tree => "tree",
            GraphShape::NextTree => "next_tree",
        };

        let mut obj = Map::new();
        obj.insert(GRAPH_TAG.into(), Value::from(shape));
        obj.insert(
            "root".into(),
            self.root.map(Value::from).unwrap_or(Value::Null),
        );
        obj.insert("nodes".into(), Value::Array(nodes));
        Value::Object(obj)
    }

    fn check_indices(&self) -> CodecResult<()> {
        if let Some(root) = self.root {
            self.node(root)?;
        }
        for node in &self.nodes {
            for idx in [node.next, node.left, node.right].into_iter().flatten() {
                self.node(idx)?;
            }
        }
        Ok(())
    }

    /// Parse nested objects: lists follow `next`, trees follow
    /// `left`/`right` (a nested `next` inside a tree is ignored, it would
    /// only repeat nodes already reachable through the tree).
    fn from_nested(value: &Value) -> CodecResult<Self> {
        let is_tree = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("left") || obj.contains_key("right"));
        let shape = match (is_tree, value.get("next").is_some()) {
            (true, true) => GraphShape::NextTree,
            (true, false) => GraphShape::Tree,
            (false, _) => GraphShape::List,
        };

        let mut graph = Self::empty(shape);
        let mut stack: Vec<(&Value, Option<(usize, &'static str)>)> = vec![(value, None)];

        while let Some((current, parent)) = stack.pop() {
            let obj = current
                .as_object()
                .ok_or_else(|| CodecError::NotANode(describe(current)))?;
            let idx = graph.nodes.len();
            graph
                .nodes
                .push(GraphNode::leaf(obj.get("val").cloned().unwrap_or(Value::Null)));

            match parent {
                None => graph.root = Some(idx),
                Some((p, "next")) => graph.nodes[p].next = Some(idx),
                Some((p, "left")) => graph.nodes[p].left = Some(idx),
                Some((p, _)) => graph.nodes[p].right = Some(idx),
            }

            let children: &[&'static str] = if is_tree { &["right", "left"] } else { &["next"] };
            for key in children {
                match obj.get(*key) {
                    Some(child) if !child.is_null() => stack.push((child, Some((idx, *key)))),
                    _ => {}
                }
            }
        }
        Ok(graph)
    }

    // ── Level Order ──────────────────────────────────────────────────

    /// Build a tree-shaped graph from a level-order array with `null`
    /// markers for absent children. Nodes are created parent-first.
    pub(crate) fn from_level_order(values: &[Value], shape: GraphShape) -> Self {
        let mut graph = Self::empty(shape);
        let first = match values.first() {
            Some(v) if !v.is_null() => v,
            _ => return graph,
        };
        graph.nodes.push(GraphNode::leaf(first.clone()));
        graph.root = Some(0);

        let mut queue = VecDeque::from([0usize]);
        let mut i = 1;
        while i < values.len() {
            let Some(parent) = queue.pop_front() else {
                break;
            };
            for side in [Side::Left, Side::Right] {
                let Some(value) = values.get(i) else {
                    break;
                };
                i += 1;
                if value.is_null() {
                    continue;
                }
                let idx = graph.nodes.len();
                graph.nodes.push(GraphNode::leaf(value.clone()));
                match side {
                    Side::Left => graph.nodes[parent].left = Some(idx),
                    Side::Right => graph.nodes[parent].right = Some(idx),
                }
                queue.push_back(idx);
            }
        }
        graph
    }

    /// Breadth-first levels over `left`/`right` links. Fails if a node is
    /// reachable from two parents or a link dangles.
    pub fn levels(&self) -> CodecResult<Vec<Vec<usize>>> {
        let Some(root) = self.root else {
            return Ok(Vec::new());
        };
        self.node(root)?;

        let mut seen = vec![false; self.nodes.len()];
        seen[root] = true;
        let mut levels = Vec::new();
        let mut current = vec![root];

        while !current.is_empty() {
            let mut next_level = Vec::new();
            for &idx in &current {
                let node = self.node(idx)?;
                for child in [node.left, node.right].into_iter().flatten() {
                    self.node(child)?;
                    if std::mem::replace(&mut seen[child], true) {
                        return Err(CodecError::SharedNode(child));
                    }
                    next_level.push(child);
                }
            }
            levels.push(std::mem::replace(&mut current, next_level));
        }
        Ok(levels)
    }

    // ── Trees ────────────────────────────────────────────────────────

    /// Materialize the `left`/`right` structure as boxed tree nodes
    pub fn to_tree(&self) -> CodecResult<Option<Box<TreeNode>>> {
        let order: Vec<usize> = self.levels()?.into_iter().flatten().collect();
        Ok(self.build_tree(&order))
    }

    /// Build boxes children-first; `order` must list parents before children
    pub(crate) fn build_tree(&self, order: &[usize]) -> Option<Box<TreeNode>> {
        let mut built: Vec<Option<Box<TreeNode>>> = self.nodes.iter().map(|_| None).collect();
        for &idx in order.iter().rev() {
            let Some(node) = self.nodes.get(idx) else {
                continue;
            };
            let mut take = |link: Option<usize>| link.and_then(|i| built.get_mut(i).and_then(Option::take));
            let left = take(node.left);
            let right = take(node.right);
            if let Some(slot) = built.get_mut(idx) {
                *slot = Some(Box::new(TreeNode {
                    val: node.val.clone(),
                    left,
                    right,
                }));
            }
        }
        self.root.and_then(|r| built.get_mut(r).and_then(Option::take))
    }

    /// Arena copy of a boxed tree
    pub fn from_tree(root: Option<&TreeNode>) -> Self {
        let mut graph = Self::empty(GraphShape::Tree);
        let Some(root) = root else {
            return graph;
        };
        graph.nodes.push(GraphNode::leaf(root.val.clone()));
        graph.root = Some(0);

        let mut queue = VecDeque::from([(root, 0usize)]);
        while let Some((node, idx)) = queue.pop_front() {
            for (child, side) in [(node.left.as_deref(), Side::Left), (node.right.as_deref(), Side::Right)] {
                if let Some(child) = child {
                    let child_idx = graph.nodes.len();
                    graph.nodes.push(GraphNode::leaf(child.val.clone()));
                    match side {
                        Side::Left => graph.nodes[idx].left = Some(child_idx),
                        Side::Right => graph.nodes[idx].right = Some(child_idx),
                    }
                    queue.push_back((child, child_idx));
                }
            }
        }
        graph
    }

    // ── Lists ────────────────────────────────────────────────────────

    /// Materialize the `next` chain from the root as a boxed list
    pub fn to_list(&self) -> CodecResult<Option<Box<ListNode>>> {
        let mut values = Vec::new();
        let mut seen = vec![false; self.nodes.len()];
        let mut cursor = self.root;
        while let Some(idx) = cursor {
            let node = self.node(idx)?;
            if std::mem::replace(&mut seen[idx], true) {
                return Err(CodecError::Cycle);
            }
            values.push(node.val.clone());
            cursor = node.next;
        }
        Ok(crate::array_to_list(&values))
    }

    /// Arena copy of a boxed list
    pub fn from_list(head: Option<&ListNode>) -> Self {
        let mut graph = Self::empty(GraphShape::List);
        if let Some(head) = head {
            for (idx, val) in head.iter().enumerate() {
                if idx > 0 {
                    graph.nodes[idx - 1].next = Some(idx);
                }
                graph.nodes.push(GraphNode::leaf(val.clone()));
            }
            graph.root = Some(0);
        }
        graph
    }
}
