//! In-memory hierarchical namespace.
//!
//! Nodes are stored in an arena owned by [`NamespaceTree`] and addressed by
//! [`NodeId`] handles. A node is a directory or a file only by how it is used:
//! directories have children, files carry content.

mod node;
mod tree;

pub use node::NodeId;
pub use tree::{NamespaceTree, TreeError};
