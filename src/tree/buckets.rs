//! Points grouped by node
//!
//! Counting sort over the point → node assignment:
//! offsets[n]..offsets[n+1] indexes the points held by node n.

use thiserror::Error;

use super::NodeId;

/// Assignment that does not fit the declared node count.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BucketError {
    /// A point names a node past the end of the tree.
    #[error("point {point} assigned to node {node}, outside a tree of {len} nodes")]
    UnknownNode {
        /// Index of the offending point.
        point: usize,
        /// Node it was assigned to.
        node: NodeId,
        /// Declared node count.
        len: usize,
    },
}

/// Compressed per-node point lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointBuckets {
    offsets: Vec<usize>,
    points: Vec<usize>,
}

impl PointBuckets {
    /// Group `assignment` into buckets for a tree of `node_count` nodes.
    ///
    /// Points keep their input order within a bucket. Fails if any id is
    /// `>= node_count`.
    pub fn from_assignment(assignment: &[NodeId], node_count: usize) -> Result<Self, BucketError> {
        if let Some((point, &node)) = assignment
            .iter()
            .enumerate()
            .find(|(_, id)| id.index() >= node_count)
        {
            return Err(BucketError::UnknownNode {
                point,
                node,
                len: node_count,
            });
        }

        let mut offsets = vec![0usize; node_count + 1];
        for id in assignment {
            offsets[id.index() + 1] += 1;
        }
        for node in 0..node_count {
            offsets[node + 1] += offsets[node];
        }

        let mut cursor = offsets.clone();
        let mut points = vec![0usize; assignment.len()];
        for (point, id) in assignment.iter().enumerate() {
            let slot = &mut cursor[id.index()];
            points[*slot] = point;
            *slot += 1;
        }

        Ok(Self { offsets, points })
    }

    /// Number of nodes covered
    pub fn node_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Indices of the points held by `node`. Empty for ids past
    /// `node_count`.
    pub fn points_in(&self, node: NodeId) -> &[usize] {
        let index = node.index();
        match self.offsets.get(index..).and_then(|rest| rest.get(..2)) {
            Some(&[start, end]) => &self.points[start..end],
            _ => &[],
        }
    }

    /// Number of points held by `node`, zero for unknown ids.
    pub fn occupancy(&self, node: NodeId) -> usize {
        self.points_in(node).len()
    }

    /// Nodes holding at least one point, with their points.
    pub fn occupied(&self) -> impl Iterator<Item = (NodeId, &[usize])> + '_ {
        (0..self.node_count())
            .map(NodeId::new)
            .map(|id| (id, self.points_in(id)))
            .filter(|(_, points)| !points.is_empty())
    }
}
