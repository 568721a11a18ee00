use std::fmt;

use chrono::{DateTime, Local};
use derive_more::Display;
use hashlink::LinkedHashMap;

/// Name given to the root node. Never used as a lookup key.
pub const ROOT_NAME: &str = "/";

/// Format used when displaying creation times in listings.
pub const CREATION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Handle to a node slot inside a [`NamespaceTree`](super::NamespaceTree).
///
/// Slots are recycled after removal; the generation tells a stale handle
/// apart from the node that later reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("#{index}.{generation}")]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    pub(super) fn new(index: usize, generation: u32) -> Self {
        NodeId { index, generation }
    }

    pub(super) fn index(self) -> usize {
        self.index
    }

    pub(super) fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    children: LinkedHashMap<String, NodeId>,
    content: String,
    creation_time: DateTime<Local>,
}

impl Node {
    pub(super) fn new(name: impl Into<String>, parent: Option<NodeId>) -> Self {
        Node {
            name: name.into(),
            parent,
            children: LinkedHashMap::new(),
            content: String::new(),
            creation_time: Local::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &LinkedHashMap<String, NodeId> {
        &self.children
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn creation_time(&self) -> DateTime<Local> {
        self.creation_time
    }

    #[cfg(test)]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(super) fn children_mut(&mut self) -> &mut LinkedHashMap<String, NodeId> {
        &mut self.children
    }

    pub(super) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(super) fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    /// Content length in bytes.
    pub size: usize,
    pub creation_time: DateTime<Local>,
}

impl fmt::Display for ListingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}B\t{}",
            self.name,
            self.size,
            self.creation_time.format(CREATION_TIME_FORMAT)
        )
    }
}

/// Names from the root down to a node, root included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    pub(super) fn new(segments: Vec<String>) -> Self {
        NodePath { segments }
    }

    #[cfg(test)]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.depth() == 0 {
            return f.write_str(ROOT_NAME);
        }
        // The first segment is always the root.
        for segment in self.segments.iter().skip(1) {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
