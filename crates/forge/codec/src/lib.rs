//! Forge Codec Layer
//!
//! Pure, stateless converters between the flat serialized form used at
//! every boundary (generation, storage, judging) and in-memory recursive
//! structures:
//!
//! - [`ListNode`] ⇄ `[a, b, c]` (empty array ⇄ no list)
//! - [`TreeNode`] ⇄ level-order array with `null` for absent children,
//!   trailing `null`s trimmed
//! - `_Node` trees (binary tree with a same-level `next` pointer), held
//!   as a [`NodeGraph`] arena ⇄ level values following `next` with a `"#"`
//!   marker closing each level
//!
//! [`NodeGraph`] is also the wire form in which live structures cross the
//! sandbox boundary. [`serialize_value`] and [`deserialize_value`] are the
//! defensive entry points: they accept input that is already in the
//! opposite form, or double-wrapped one level deep.
//!
//! No function here mutates its input; every output is a fresh value.

#![deny(unsafe_code)]

mod error;
mod graph;
mod list;
mod next_tree;
mod tree;
mod value;

pub use error::{CodecError, CodecResult};
pub use graph::{GraphNode, GraphShape, NodeGraph, GRAPH_TAG};
pub use list::{array_to_list, list_to_array, ListNode};
pub use next_tree::{array_to_next_tree, next_tree_to_array, LEVEL_MARKER};
pub use tree::{array_to_tree, tree_to_array, TreeNode};
pub use value::{decode_list, decode_next_tree, decode_tree, deserialize_value, serialize_value};
