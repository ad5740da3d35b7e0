//! Adaptive orthant tree
//!
//! Generalized quadtree/octree over D dimensions, refined only where the
//! point cloud is dense. Nodes live in an append-only arena; a `NodeId` is
//! an arena index and is never invalidated.
//!
//! Internal nodes own exactly `2^D` children allocated as one contiguous
//! block, so the children table of a node is `first_child + orthant`.

mod buckets;
mod builder;
mod neighbors;
mod node;

pub use buckets::{BucketError, PointBuckets};
pub use builder::{
    build, BuildConfig, BuildError, BuildOutput, BuildStats, PartitionedOutput, TreeBuilder,
    DEFAULT_CUTOFF, DEFAULT_MAX_DEPTH, MAX_DIMENSION,
};
pub use neighbors::{moore_neighborhood, neighbors, Directions, NeighborError, NeighborResolver};
pub use node::{half_width, Node, NodeId};

use crate::offsets::OrthantTable;

/// Immutable node arena produced by [`TreeBuilder`].
#[derive(Debug, Clone)]
pub struct SpatialTree<const D: usize> {
    nodes: Vec<Node<D>>,
    orthants: OrthantTable<D>,
}

impl<const D: usize> SpatialTree<D> {
    pub(crate) fn from_parts(nodes: Vec<Node<D>>, orthants: OrthantTable<D>) -> Self {
        debug_assert!(!nodes.is_empty(), "tree must contain a root");
        Self { nodes, orthants }
    }

    /// Root node id
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes, including unoccupied leaves
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true: a tree always has its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Orthant encoding shared by construction and traversal.
    pub fn orthants(&self) -> &OrthantTable<D> {
        &self.orthants
    }

    /// Node by id.
    ///
    /// Panics if `id` did not come from this tree; use [`get`](Self::get)
    /// for untrusted ids.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<D> {
        &self.nodes[id.index()]
    }

    /// Node by id, `None` if out of range.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<D>> {
        self.nodes.get(id.index())
    }

    /// Check that `id` belongs to this tree.
    #[inline]
    pub fn contains_id(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// All nodes in allocation order (breadth-first by depth).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<D>)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// Terminal nodes, occupied or not.
    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &Node<D>)> + '_ {
        self.iter().filter(|(_, node)| node.is_terminal())
    }

    /// Deepest level present.
    pub fn max_depth(&self) -> u32 {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    /// Parent id, `None` at the root.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Leaf check
    #[inline]
    pub fn is_terminal(&self, id: NodeId) -> bool {
        self.node(id).is_terminal()
    }

    /// Ids of all `2^D` children, in orthant order. Empty for leaves.
    pub fn children(&self, id: NodeId) -> impl ExactSizeIterator<Item = NodeId> {
        let block = match self.node(id).first_child() {
            Some(first) => first.index()..first.index() + self.orthants.len(),
            None => 0..0,
        };
        block.map(NodeId)
    }

    /// Child in a given orthant, `None` for leaves or `orthant >= 2^D`.
    #[inline]
    pub fn child(&self, id: NodeId, orthant: usize) -> Option<NodeId> {
        if orthant >= self.orthants.len() {
            return None;
        }
        self.node(id).first_child().map(|first| first.offset(orthant))
    }

    /// Child named by a `±1` sign pattern, `None` for leaves or malformed
    /// patterns.
    #[inline]
    pub fn child_by_descent(&self, id: NodeId, descent: &[i8; D]) -> Option<NodeId> {
        let orthant = self.orthants.index_of_descent(descent)?;
        self.child(id, orthant)
    }

    /// Terminal node whose cube holds `point`.
    ///
    /// Uses the same `≥ center` rule as construction, so locating an input
    /// point always returns the node it was assigned to.
    pub fn locate(&self, point: &[f64; D]) -> NodeId {
        let mut current = NodeId::ROOT;
        loop {
            let node = self.node(current);
            match node.first_child() {
                Some(first) => current = first.offset(self.orthants.encode(point, &node.center)),
                None => return current,
            }
        }
    }

    /// Closed-cube containment test for node `id`.
    pub fn contains(&self, id: NodeId, point: &[f64; D]) -> bool {
        self.node(id).contains(point)
    }
}
