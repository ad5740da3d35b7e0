//! Directional neighbor resolution
//!
//! Climb-then-descend walk over a non-uniform tree. Per axis, a direction
//! component r ∈ {-1, 0, 1} and the node's descent s = ±1:
//!
//! ```text
//! step  = s · (1 - 2|r|)        mirror the orthant on axes that move
//! r'    = trunc((s + r) / 2)    offset still pending at the parent
//! ```
//!
//! With r ≠ 0, s + r ∈ {-2, 0, 2}: the offset either leaves the parent
//! (r' = r) or lands on a sibling (r' = 0). With r = 0, s + r = ±1 and
//! truncation keeps r' = 0. So r' = 0 on every axis exactly when the target
//! cube shares the current ancestor, and the climb stops there.
//!
//! The descent replays the recorded steps newest first and stops at the
//! first terminal node, which then covers the target at coarser resolution.

use rayon::prelude::*;
use thiserror::Error;

use super::{NodeId, SpatialTree};
use crate::offsets::tuples;

/// Invalid neighbor query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NeighborError {
    /// Direction component outside `{-1, 0, 1}`.
    #[error("direction component {value} on axis {axis} is outside {{-1, 0, 1}}")]
    InvalidDirection {
        /// Offending axis.
        axis: usize,
        /// Offending component.
        value: i8,
    },

    /// Node id not present in the tree.
    #[error("node {node} out of range for a tree of {len} nodes")]
    UnknownNode {
        /// Requested node.
        node: NodeId,
        /// Tree size.
        len: usize,
    },

    /// Per-node directions with the wrong count.
    #[error("{directions} directions supplied for {nodes} nodes")]
    DirectionCountMismatch {
        /// Number of query nodes.
        nodes: usize,
        /// Number of directions.
        directions: usize,
    },
}

/// Directions for a batch query.
#[derive(Debug, Clone, Copy)]
pub enum Directions<'a, const D: usize> {
    /// One direction applied to every node
    Broadcast([i8; D]),

    /// One direction per node
    PerNode(&'a [[i8; D]]),
}

impl<const D: usize> Directions<'_, D> {
    #[inline]
    fn get(&self, index: usize) -> [i8; D] {
        match self {
            Directions::Broadcast(direction) => *direction,
            Directions::PerNode(directions) => directions[index],
        }
    }

    fn as_slice(&self) -> &[[i8; D]] {
        match self {
            Directions::Broadcast(direction) => std::slice::from_ref(direction),
            Directions::PerNode(directions) => directions,
        }
    }
}

impl<const D: usize> From<[i8; D]> for Directions<'_, D> {
    fn from(direction: [i8; D]) -> Self {
        Directions::Broadcast(direction)
    }
}

impl<'a, const D: usize> From<&'a [[i8; D]]> for Directions<'a, D> {
    fn from(directions: &'a [[i8; D]]) -> Self {
        Directions::PerNode(directions)
    }
}

/// All `3^D - 1` nonzero directions with entries in `{-1, 0, 1}`.
pub fn moore_neighborhood<const D: usize>() -> Vec<[i8; D]> {
    tuples::<i8, D>(&[-1, 0, 1])
        .into_iter()
        .filter(|direction| direction.iter().any(|&d| d != 0))
        .collect()
}

/// Batch form: resolve `directions` for every id in `nodes`.
pub fn neighbors<'a, const D: usize>(
    tree: &SpatialTree<D>,
    nodes: &[NodeId],
    directions: impl Into<Directions<'a, D>>,
) -> Result<Vec<Option<NodeId>>, NeighborError> {
    NeighborResolver::new(tree).neighbors(nodes, directions)
}

/// Read-only neighbor queries over a finished tree.
#[derive(Debug, Clone, Copy)]
pub struct NeighborResolver<'t, const D: usize> {
    tree: &'t SpatialTree<D>,
}

impl<'t, const D: usize> NeighborResolver<'t, D> {
    /// Resolver over `tree`.
    pub fn new(tree: &'t SpatialTree<D>) -> Self {
        Self { tree }
    }

    /// Neighbor of `node` one cube-width along `direction`.
    ///
    /// Returns `Ok(None)` when the target lies outside the root cube. The
    /// result is never deeper than `node`, and is coarser only when the tree
    /// stops refining first.
    pub fn neighbor(&self, node: NodeId, direction: [i8; D]) -> Result<Option<NodeId>, NeighborError> {
        self.check_node(node)?;
        check_direction(&direction)?;
        Ok(self.resolve(node, direction))
    }

    /// Resolve a batch in parallel. Results follow the order of `nodes`.
    ///
    /// The whole batch is validated before any query runs.
    pub fn neighbors<'a>(
        &self,
        nodes: &[NodeId],
        directions: impl Into<Directions<'a, D>>,
    ) -> Result<Vec<Option<NodeId>>, NeighborError> {
        let directions = directions.into();
        if let Directions::PerNode(per_node) = directions {
            if per_node.len() != nodes.len() {
                return Err(NeighborError::DirectionCountMismatch {
                    nodes: nodes.len(),
                    directions: per_node.len(),
                });
            }
        }
        for &node in nodes {
            self.check_node(node)?;
        }
        for direction in directions.as_slice() {
            check_direction(direction)?;
        }

        Ok(nodes
            .par_iter()
            .enumerate()
            .map(|(index, &node)| self.resolve(node, directions.get(index)))
            .collect())
    }

    /// Resolve every Moore direction of `node`.
    pub fn moore_neighbors(&self, node: NodeId) -> Result<Vec<([i8; D], Option<NodeId>)>, NeighborError> {
        self.check_node(node)?;
        Ok(moore_neighborhood::<D>()
            .into_iter()
            .map(|direction| (direction, self.resolve(node, direction)))
            .collect())
    }

    fn check_node(&self, node: NodeId) -> Result<(), NeighborError> {
        if self.tree.contains_id(node) {
            Ok(())
        } else {
            Err(NeighborError::UnknownNode {
                node,
                len: self.tree.len(),
            })
        }
    }

    fn resolve(&self, node: NodeId, direction: [i8; D]) -> Option<NodeId> {
        if direction.iter().all(|&d| d == 0) {
            return Some(node);
        }

        let mut current = node;
        let mut remaining = direction;
        let mut path: Vec<[i8; D]> = Vec::with_capacity(self.tree.node(node).depth as usize);

        // Upward: climb until nothing is pending. Running out of parents
        // means the target is outside the root cube.
        loop {
            let record = self.tree.node(current);
            let parent = record.parent?;

            let mut step = [0i8; D];
            for axis in 0..D {
                let s = record.descent[axis];
                let r = remaining[axis];
                step[axis] = s * (1 - 2 * r.abs());
                remaining[axis] = (s + r) / 2;
            }
            path.push(step);
            current = parent;

            if remaining.iter().all(|&r| r == 0) {
                break;
            }
        }

        // Downward: replay newest first, stop at the first leaf.
        for step in path.iter().rev() {
            match self.tree.child_by_descent(current, step) {
                Some(child) => current = child,
                None => break,
            }
        }

        Some(current)
    }
}

fn check_direction<const D: usize>(direction: &[i8; D]) -> Result<(), NeighborError> {
    match direction.iter().position(|d| !(-1..=1).contains(d)) {
        Some(axis) => Err(NeighborError::InvalidDirection {
            axis,
            value: direction[axis],
        }),
        None => Ok(()),
    }
}
