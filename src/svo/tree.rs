//! Materialized octree with parent links
//!
//! Parent/child references form a cyclic graph, so the tree is flattened
//! into an arena of nodes addressed by index: children point down, parents
//! point back up, nothing owns anything twice. This wiring exists only in
//! memory; the file format never stores it.

use super::node::Node;

/// Index of a node in the arena.
pub type NodeId = u32;

struct TreeNode {
    record: Node,
    parent: Option<NodeId>,
    children: [Option<NodeId>; 8],
}

/// A fully enumerated tree: every node of the sealed file plus the wiring
/// the neighbor search needs. Built by `SvoReader::collect_tree`.
pub struct SvoTree {
    nodes: Vec<TreeNode>,
    leaves: Vec<NodeId>,
}

impl SvoTree {
    /// Arena index of the root.
    pub const ROOT: NodeId = 0;

    pub(crate) fn with_root(record: Node) -> Self {
        Self {
            nodes: vec![TreeNode {
                record,
                parent: None,
                children: [None; 8],
            }],
            leaves: Vec::new(),
        }
    }

    /// Add `record` as the child of `parent` in `octant`, wiring both
    /// directions, and track it as a leaf when it has no children.
    pub(crate) fn attach(&mut self, parent: NodeId, octant: usize, record: Node) -> NodeId {
        assert!(octant < 8, "octant index out of range: {octant}");
        let id = self.nodes.len() as NodeId;
        let is_leaf = record.is_leaf();
        self.nodes.push(TreeNode {
            record,
            parent: Some(parent),
            children: [None; 8],
        });
        self.nodes[parent as usize].children[octant] = Some(id);
        if is_leaf {
            self.leaves.push(id);
        }
        id
    }

    /// Number of materialized nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// The decoded record of a node.
    pub fn record(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize].record
    }

    /// Parent of a node; `None` only for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id as usize].parent
    }

    /// Child of a node in the given octant, if present.
    pub fn child(&self, id: NodeId, octant: usize) -> Option<NodeId> {
        assert!(octant < 8, "octant index out of range: {octant}");
        self.nodes[id as usize].children[octant]
    }

    /// All true leaves, in file enumeration order (ascending Morton order).
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    /// Octant this node occupies in its parent, `None` for the root.
    pub fn octant_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        (0..8).find(|&octant| self.nodes[parent as usize].children[octant] == Some(id))
    }

    /// Depth of a node below the root (the root is 0).
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut at = id;
        while let Some(parent) = self.parent(at) {
            depth += 1;
            at = parent;
        }
        depth
    }
}
