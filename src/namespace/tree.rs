use snafu::{OptionExt, Snafu, ensure};
use tracing::debug;

use super::node::{ListingEntry, Node, NodeId, NodePath, ROOT_NAME};

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-backed tree of named nodes.
///
/// Every operation is relative to a caller supplied node. Released slots go
/// on a free list and are reused with a bumped generation, so the arena never
/// holds more slots than the peak number of live nodes, and an id that
/// outlives its node is reported as dangling.
#[derive(Debug, Clone)]
pub struct NamespaceTree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceTree {
    pub fn new() -> Self {
        NamespaceTree {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::new(ROOT_NAME, None)),
            }],
            free: Vec::new(),
            root: NodeId::new(0, 0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
            .context(DanglingNodeSnafu { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
            .context(DanglingNodeSnafu { id })
    }

    /// Number of nodes currently reachable from the root, root included.
    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Lists the direct children of `node` in insertion order.
    pub fn list(&self, node: NodeId) -> Result<Vec<ListingEntry>, TreeError> {
        self.node(node)?
            .children()
            .values()
            .map(|&child_id| -> Result<ListingEntry, TreeError> {
                let child = self.node(child_id)?;
                Ok(ListingEntry {
                    name: child.name().to_string(),
                    size: child.content().len(),
                    creation_time: child.creation_time(),
                })
            })
            .collect()
    }

    pub fn descend(&self, node: NodeId, name: &str) -> Result<NodeId, TreeError> {
        self.child(node, name)
    }

    /// Returns the parent of `node`, or `node` itself for the root.
    pub fn ascend(&self, node: NodeId) -> Result<NodeId, TreeError> {
        Ok(self.node(node)?.parent().unwrap_or(node))
    }

    pub fn make_container(&mut self, node: NodeId, name: &str) -> Result<NodeId, TreeError> {
        self.insert_child(node, name)
    }

    /// Removes a child that has no children of its own.
    ///
    /// No kind check is made: a file never has children and is therefore
    /// removable here as well.
    pub fn remove_container(&mut self, node: NodeId, name: &str) -> Result<(), TreeError> {
        let child = self.child(node, name)?;
        ensure!(
            self.node(child)?.children().is_empty(),
            NotEmptySnafu { name }
        );
        self.detach(node, name, child)
    }

    pub fn make_leaf(&mut self, node: NodeId, name: &str) -> Result<NodeId, TreeError> {
        self.insert_child(node, name)
    }

    /// Removes a child unconditionally, releasing everything below it.
    pub fn remove_leaf(&mut self, node: NodeId, name: &str) -> Result<(), TreeError> {
        let child = self.child(node, name)?;
        self.detach(node, name, child)
    }

    /// Replaces the content of child `name` with `text`.
    pub fn write_content(
        &mut self,
        node: NodeId,
        name: &str,
        text: impl Into<String>,
    ) -> Result<(), TreeError> {
        let child = self.child(node, name)?;
        self.node_mut(child)?.set_content(text);
        Ok(())
    }

    pub fn read_content(&self, node: NodeId, name: &str) -> Result<&str, TreeError> {
        let child = self.child(node, name)?;
        Ok(self.node(child)?.content())
    }

    /// Re-keys child `old_name` as `new_name`. The renamed entry moves to the
    /// end of the listing order.
    pub fn rename(&mut self, node: NodeId, old_name: &str, new_name: &str) -> Result<(), TreeError> {
        let child = self.child(node, old_name)?;
        self.ensure_vacant(node, new_name)?;

        let children = self.node_mut(node)?.children_mut();
        children.remove(old_name);
        children.insert(new_name.to_string(), child);
        self.node_mut(child)?.set_name(new_name);

        debug!("Renamed '{}' to '{}' under {}", old_name, new_name, node);
        Ok(())
    }

    /// Creates `new_name` as a childless copy carrying the content of `old_name`.
    pub fn duplicate(
        &mut self,
        node: NodeId,
        old_name: &str,
        new_name: &str,
    ) -> Result<NodeId, TreeError> {
        let source = self.child(node, old_name)?;
        self.ensure_vacant(node, new_name)?;

        let content = self.node(source)?.content().to_string();
        let copy = self.insert_child(node, new_name)?;
        self.node_mut(copy)?.set_content(content);
        Ok(copy)
    }

    pub fn current_path(&self, node: NodeId) -> Result<NodePath, TreeError> {
        let mut segments = Vec::new();
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let current = self.node(id)?;
            segments.push(current.name().to_string());
            cursor = current.parent();
        }
        segments.reverse();
        Ok(NodePath::new(segments))
    }

    fn child(&self, node: NodeId, name: &str) -> Result<NodeId, TreeError> {
        self.node(node)?
            .children()
            .get(name)
            .copied()
            .context(NotFoundSnafu { name })
    }

    fn ensure_vacant(&self, node: NodeId, name: &str) -> Result<(), TreeError> {
        ensure!(
            !self.node(node)?.children().contains_key(name),
            AlreadyExistsSnafu { name }
        );
        Ok(())
    }

    fn insert_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        self.ensure_vacant(parent, name)?;

        let id = self.allocate(Node::new(name, Some(parent)));
        self.node_mut(parent)?
            .children_mut()
            .insert(name.to_string(), id);

        debug!("Created '{}' as {} under {}", name, id, parent);
        Ok(id)
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(node);
                NodeId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len();
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId::new(index, 0)
            }
        }
    }

    fn detach(&mut self, parent: NodeId, name: &str, child: NodeId) -> Result<(), TreeError> {
        self.node_mut(parent)?.children_mut().remove(name);

        let mut pending = vec![child];
        let mut released = 0usize;
        while let Some(id) = pending.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.index())
                .filter(|slot| slot.generation == id.generation())
            else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index());
                pending.extend(node.children().values().copied());
                released += 1;
            }
        }

        debug!("Removed '{}' from {} ({} nodes released)", name, parent, released);
        Ok(())
    }
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum TreeError {
    #[snafu(display("No entry named '{}'", name))]
    NotFoundError { name: String },
    #[snafu(display("An entry named '{}' already exists", name))]
    AlreadyExistsError { name: String },
    #[snafu(display("Entry '{}' is not empty", name))]
    NotEmptyError { name: String },
    #[snafu(display("Node {} is no longer part of the tree", id))]
    DanglingNodeError { id: NodeId },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found(name: &str) -> TreeError {
        TreeError::NotFoundError {
            name: name.to_string(),
        }
    }

    fn already_exists(name: &str) -> TreeError {
        TreeError::AlreadyExistsError {
            name: name.to_string(),
        }
    }

    fn child_names(tree: &NamespaceTree, node: NodeId) -> Vec<String> {
        tree.list(node)
            .expect("node should be live")
            .into_iter()
            .map(|entry| entry.name)
            .collect()
    }

    #[test]
    fn new_tree_has_only_root() {
        let tree = NamespaceTree::new();
        let root = tree.node(tree.root()).unwrap();

        assert!(root.is_root());
        assert_eq!(root.name(), ROOT_NAME);
        assert_eq!(tree.live_count(), 1);
        assert!(tree.list(tree.root()).unwrap().is_empty());
    }

    #[test]
    fn make_container_twice_fails_and_leaves_tree_unchanged() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        tree.make_container(root, "docs").unwrap();

        let result = tree.make_container(root, "docs");

        assert_eq!(result, Err(already_exists("docs")));
        assert_eq!(child_names(&tree, root), vec!["docs"]);
        assert_eq!(tree.live_count(), 2);
    }

    #[test]
    fn make_leaf_collides_with_container() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        tree.make_container(root, "docs").unwrap();

        assert_eq!(tree.make_leaf(root, "docs"), Err(already_exists("docs")));
    }

    #[test]
    fn descend_and_ascend() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let docs = tree.make_container(root, "docs").unwrap();

        assert_eq!(tree.descend(root, "docs"), Ok(docs));
        assert_eq!(tree.ascend(docs), Ok(root));
        assert_eq!(tree.descend(root, "missing"), Err(not_found("missing")));
    }

    #[test]
    fn ascend_from_root_is_a_no_op() {
        let tree = NamespaceTree::new();
        assert_eq!(tree.ascend(tree.root()), Ok(tree.root()));
    }

    #[test]
    fn remove_container_requires_empty_directory() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let docs = tree.make_container(root, "docs").unwrap();
        tree.make_leaf(docs, "a.txt").unwrap();
        tree.make_leaf(docs, "b.txt").unwrap();

        assert_eq!(
            tree.remove_container(root, "docs"),
            Err(TreeError::NotEmptyError {
                name: "docs".to_string()
            })
        );

        tree.remove_leaf(docs, "a.txt").unwrap();
        tree.remove_leaf(docs, "b.txt").unwrap();

        assert_eq!(tree.remove_container(root, "docs"), Ok(()));
        assert!(child_names(&tree, root).is_empty());
        assert_eq!(tree.live_count(), 1);
    }

    #[test]
    fn remove_container_accepts_a_leaf() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        tree.make_leaf(root, "a.txt").unwrap();
        tree.write_content(root, "a.txt", "data").unwrap();

        assert_eq!(tree.remove_container(root, "a.txt"), Ok(()));
        assert!(child_names(&tree, root).is_empty());
    }

    #[test]
    fn remove_container_missing() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        assert_eq!(tree.remove_container(root, "nope"), Err(not_found("nope")));
    }

    #[test]
    fn remove_leaf_releases_whole_subtree() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let docs = tree.make_container(root, "docs").unwrap();
        let inner = tree.make_container(docs, "inner").unwrap();
        tree.make_leaf(inner, "deep.txt").unwrap();
        assert_eq!(tree.live_count(), 4);

        tree.remove_leaf(root, "docs").unwrap();

        assert_eq!(tree.live_count(), 1);
        assert_eq!(
            tree.node(inner).err(),
            Some(TreeError::DanglingNodeError { id: inner })
        );
        assert_eq!(tree.remove_leaf(root, "docs"), Err(not_found("docs")));
    }

    #[test]
    fn removed_slots_are_reused_with_a_new_generation() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let first = tree.make_leaf(root, "a").unwrap();
        tree.remove_leaf(root, "a").unwrap();
        let second = tree.make_leaf(root, "b").unwrap();

        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
        assert_eq!(
            tree.node(first).err(),
            Some(TreeError::DanglingNodeError { id: first })
        );
        assert_eq!(tree.node(second).unwrap().name(), "b");
        assert_eq!(tree.slot_count(), 2);
    }

    #[test]
    fn create_remove_cycles_do_not_grow_the_arena() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let docs = tree.make_container(root, "docs").unwrap();

        for _ in 0..100 {
            tree.make_leaf(docs, "x").unwrap();
            tree.remove_leaf(docs, "x").unwrap();
        }
        let inner = tree.make_container(docs, "inner").unwrap();
        tree.make_leaf(inner, "deep.txt").unwrap();
        tree.remove_leaf(root, "docs").unwrap();
        tree.make_leaf(root, "again").unwrap();

        assert_eq!(tree.slot_count(), 4);
        assert_eq!(tree.live_count(), 2);
    }

    #[test]
    fn write_replaces_content_exactly() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        tree.make_leaf(root, "notes.txt").unwrap();

        tree.write_content(root, "notes.txt", "first version").unwrap();
        tree.write_content(root, "notes.txt", "  second\tversion  ").unwrap();

        assert_eq!(
            tree.read_content(root, "notes.txt"),
            Ok("  second\tversion  ")
        );
    }

    #[test]
    fn write_and_read_missing_file() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();

        assert_eq!(tree.write_content(root, "x", "y"), Err(not_found("x")));
        assert_eq!(tree.read_content(root, "x"), Err(not_found("x")));
    }

    #[test]
    fn list_reports_byte_sizes_in_insertion_order() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        tree.make_leaf(root, "b").unwrap();
        tree.make_container(root, "a").unwrap();
        tree.write_content(root, "b", "äö").unwrap();

        let listing = tree.list(root).unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "b");
        assert_eq!(listing[0].size, 4);
        assert_eq!(listing[1].name, "a");
        assert_eq!(listing[1].size, 0);
    }

    #[test]
    fn rename_keeps_content_and_moves_to_end() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let a = tree.make_leaf(root, "a").unwrap();
        tree.make_leaf(root, "z").unwrap();
        tree.write_content(root, "a", "payload").unwrap();

        tree.rename(root, "a", "b").unwrap();

        assert_eq!(tree.read_content(root, "b"), Ok("payload"));
        assert_eq!(tree.read_content(root, "a"), Err(not_found("a")));
        assert_eq!(tree.node(a).unwrap().name(), "b");
        assert_eq!(tree.node(a).unwrap().parent(), Some(root));
        assert_eq!(child_names(&tree, root), vec!["z", "b"]);
    }

    #[test]
    fn rename_checks_before_mutating() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        tree.make_leaf(root, "a").unwrap();
        tree.make_leaf(root, "b").unwrap();

        assert_eq!(tree.rename(root, "a", "b"), Err(already_exists("b")));
        assert_eq!(tree.rename(root, "missing", "c"), Err(not_found("missing")));
        assert_eq!(child_names(&tree, root), vec!["a", "b"]);
    }

    #[test]
    fn renamed_directory_keeps_its_children() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let docs = tree.make_container(root, "docs").unwrap();
        tree.make_leaf(docs, "notes.txt").unwrap();

        tree.rename(root, "docs", "papers").unwrap();

        let papers = tree.descend(root, "papers").unwrap();
        assert_eq!(papers, docs);
        assert_eq!(child_names(&tree, papers), vec!["notes.txt"]);
        assert_eq!(tree.current_path(papers).unwrap().to_string(), "/papers");
    }

    #[test]
    fn duplicate_is_independent() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        tree.make_leaf(root, "a").unwrap();
        tree.write_content(root, "a", "original").unwrap();

        tree.duplicate(root, "a", "b").unwrap();
        tree.write_content(root, "b", "new").unwrap();

        assert_eq!(tree.read_content(root, "a"), Ok("original"));
        assert_eq!(tree.read_content(root, "b"), Ok("new"));
    }

    #[test]
    fn duplicate_of_directory_is_a_childless_copy() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let docs = tree.make_container(root, "docs").unwrap();
        tree.make_leaf(docs, "notes.txt").unwrap();

        let copy = tree.duplicate(root, "docs", "docs2").unwrap();

        assert!(tree.node(copy).unwrap().children().is_empty());
        assert_eq!(child_names(&tree, docs), vec!["notes.txt"]);
    }

    #[test]
    fn duplicate_errors() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        tree.make_leaf(root, "a").unwrap();
        tree.make_leaf(root, "b").unwrap();

        assert_eq!(tree.duplicate(root, "missing", "c"), Err(not_found("missing")));
        assert_eq!(tree.duplicate(root, "a", "b"), Err(already_exists("b")));
        assert_eq!(tree.live_count(), 3);
    }

    #[test]
    fn current_path_from_root_to_node() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let docs = tree.make_container(root, "docs").unwrap();
        let notes = tree.make_container(docs, "notes").unwrap();

        let path = tree.current_path(notes).unwrap();

        assert_eq!(path.segments(), &["/", "docs", "notes"]);
        assert_eq!(path.to_string(), "/docs/notes");
        assert_eq!(tree.current_path(root).unwrap().to_string(), "/");
    }

    #[test]
    fn tree_error_display() {
        assert_eq!(not_found("x").to_string(), "No entry named 'x'");
        assert_eq!(
            already_exists("x").to_string(),
            "An entry named 'x' already exists"
        );
        assert_eq!(
            TreeError::DanglingNodeError {
                id: NodeId::new(3, 1)
            }
            .to_string(),
            "Node #3.1 is no longer part of the tree"
        );
    }
}
