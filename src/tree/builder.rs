//! Level-synchronous adaptive construction
//!
//! One depth level per pass:
//! 1. Count live points per frontier node (nodes created by the last pass)
//! 2. Occupancy ≤ cutoff → terminal; otherwise the node is active
//! 3. Active nodes get `2^D` children appended as one contiguous block
//! 4. Live points of active nodes move to the child named by their orthant
//!
//! Points whose node turns terminal drop out of the live set, so each pass
//! only touches points that are still being refined: O(N · depth) total.
//! Within a pass, child creation and reassignment are independent per node
//! and run on rayon; the pass boundary is the only barrier.

use std::ops::Range;

use bitvec::prelude::*;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Node, NodeId, SpatialTree};
use crate::offsets::OrthantTable;

/// Default leaf capacity.
pub const DEFAULT_CUTOFF: usize = 5;

/// Default depth at which refinement is forced to stop.
///
/// Deep enough for any cloud whose distinct points are at least ~2^-31
/// apart in the reference cube.
pub const DEFAULT_MAX_DEPTH: u32 = 32;

/// Largest supported dimension (`2^16` children per internal node).
pub const MAX_DIMENSION: usize = 16;

/// Errors raised before any node is built.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    /// Leaf capacity must be at least one point.
    #[error("cutoff must be at least 1, got {0}")]
    InvalidCutoff(usize),

    /// Dimension outside `1..=MAX_DIMENSION`.
    #[error("unsupported dimension {dimension} (expected 1..={max})")]
    UnsupportedDimension {
        /// Requested dimension.
        dimension: usize,
        /// Largest supported dimension.
        max: usize,
    },

    /// A coordinate was NaN or infinite.
    #[error("point {index} has non-finite coordinate on axis {axis}")]
    NonFinitePoint {
        /// Index of the offending point.
        index: usize,
        /// Axis of the offending coordinate.
        axis: usize,
    },
}

/// Construction parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Maximum points a leaf may hold before it is refined
    pub cutoff: usize,

    /// Depth at which over-full nodes are forced terminal
    pub max_depth: u32,
}

impl BuildConfig {
    /// Configuration with the given cutoff and default depth cap.
    pub fn new(cutoff: usize) -> Result<Self, BuildError> {
        if cutoff == 0 {
            return Err(BuildError::InvalidCutoff(cutoff));
        }
        Ok(Self {
            cutoff,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    /// Override the depth cap.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn validate(&self) -> Result<(), BuildError> {
        if self.cutoff == 0 {
            return Err(BuildError::InvalidCutoff(self.cutoff));
        }
        Ok(())
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of refinement passes (= deepest level created)
    pub levels: u32,

    /// Total nodes allocated
    pub nodes: usize,

    /// Terminal nodes, occupied or not
    pub leaves: usize,

    /// Leaves forced terminal at the depth cap while over capacity
    pub depth_capped: Vec<NodeId>,
}

impl BuildStats {
    /// True when at least one leaf holds more than `cutoff` points.
    pub fn is_truncated(&self) -> bool {
        !self.depth_capped.is_empty()
    }
}

/// Tree plus the leaf each input point ended up in.
#[derive(Debug, Clone)]
pub struct BuildOutput<const D: usize> {
    /// The finished tree
    pub tree: SpatialTree<D>,

    /// `assignment[i]` is the terminal node holding point `i`
    pub assignment: Vec<NodeId>,

    /// Build summary
    pub stats: BuildStats,
}

/// Build output with the assignment split back into sources and targets.
#[derive(Debug, Clone)]
pub struct PartitionedOutput<const D: usize> {
    /// The finished tree
    pub tree: SpatialTree<D>,

    /// Leaf of each source point
    pub sources: Vec<NodeId>,

    /// Leaf of each target point
    pub targets: Vec<NodeId>,

    /// Build summary
    pub stats: BuildStats,
}

/// Adaptive tree builder.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    config: BuildConfig,
}

/// Build with default depth cap: `build(points, cutoff) -> (tree, assignment)`.
pub fn build<const D: usize>(points: &[[f64; D]], cutoff: usize) -> Result<BuildOutput<D>, BuildError> {
    TreeBuilder::new(BuildConfig::new(cutoff)?).build(points)
}

impl TreeBuilder {
    /// Builder for the given configuration.
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Builder with the given cutoff and default depth cap.
    pub fn with_cutoff(cutoff: usize) -> Result<Self, BuildError> {
        Ok(Self::new(BuildConfig::new(cutoff)?))
    }

    /// Active configuration
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Index sources and targets together, then split the assignment.
    pub fn build_partitioned<const D: usize>(
        &self,
        sources: &[[f64; D]],
        targets: &[[f64; D]],
    ) -> Result<PartitionedOutput<D>, BuildError> {
        let mut points = Vec::with_capacity(sources.len() + targets.len());
        points.extend_from_slice(sources);
        points.extend_from_slice(targets);

        let BuildOutput {
            tree,
            mut assignment,
            stats,
        } = self.build(&points)?;
        let targets = assignment.split_off(sources.len());

        Ok(PartitionedOutput {
            tree,
            sources: assignment,
            targets,
            stats,
        })
    }

    /// Refine until every occupied leaf holds at most `cutoff` points or sits
    /// at the depth cap.
    ///
    /// Points are expected inside the reference cube `[-1, 1]^D`. Points
    /// outside it are still assigned, to the boundary leaf nearest them.
    #[tracing::instrument(skip_all, fields(points = points.len(), dim = D, cutoff = self.config.cutoff))]
    pub fn build<const D: usize>(&self, points: &[[f64; D]]) -> Result<BuildOutput<D>, BuildError> {
        self.config.validate()?;
        validate_dimension::<D>()?;
        validate_points(points)?;

        let orthants = OrthantTable::<D>::new();
        let fanout = orthants.len();
        let cutoff = self.config.cutoff;
        let max_depth = self.config.max_depth;

        let mut nodes = vec![Node::<D>::root()];
        let mut assignment = vec![NodeId::ROOT; points.len()];
        let mut live: Vec<usize> = (0..points.len()).collect();
        let mut frontier: Range<usize> = 0..1;
        let mut depth = 0u32;
        let mut depth_capped = Vec::new();

        loop {
            let mut counts = vec![0usize; frontier.len()];
            for &point in &live {
                counts[assignment[point].index() - frontier.start] += 1;
            }

            let mut active = bitvec![usize, Lsb0; 0; frontier.len()];
            for (slot, &count) in counts.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                let id = frontier.start + slot;
                let over = count > cutoff;
                if over && depth >= max_depth {
                    warn!(node = id, depth, count, cutoff, "depth cap reached, leaf left over capacity");
                    depth_capped.push(NodeId(id));
                    nodes[id].terminal = true;
                    continue;
                }
                nodes[id].terminal = !over;
                active.set(slot, over);
            }

            if active.not_any() {
                break;
            }
            depth += 1;

            let base = nodes.len();
            let parents: Vec<usize> = active.iter_ones().map(|slot| frontier.start + slot).collect();

            // Per-slot first child, None for frontier nodes that stay leaves
            let mut first_child = vec![None; frontier.len()];
            for (rank, slot) in active.iter_ones().enumerate() {
                first_child[slot] = Some(NodeId(base + rank * fanout));
            }

            let children: Vec<Node<D>> = parents
                .par_iter()
                .flat_map_iter(|&parent| {
                    let center = nodes[parent].center;
                    orthants
                        .descents()
                        .iter()
                        .map(move |&descent| Node::child(NodeId(parent), &center, depth, descent))
                })
                .collect();

            let moved: Vec<(usize, NodeId)> = live
                .par_iter()
                .filter_map(|&point| {
                    let slot = assignment[point].index() - frontier.start;
                    let first = first_child[slot]?;
                    let center = &nodes[frontier.start + slot].center;
                    Some((point, first.offset(orthants.encode(&points[point], center))))
                })
                .collect();

            for (&parent, first) in parents.iter().zip((base..).step_by(fanout)) {
                nodes[parent].first_child = Some(NodeId(first));
            }
            nodes.extend(children);

            for &(point, child) in &moved {
                assignment[point] = child;
            }
            live = moved.into_iter().map(|(point, _)| point).collect();
            frontier = base..nodes.len();

            debug!(depth, active = parents.len(), live = live.len(), nodes = nodes.len(), "refined level");
        }

        let stats = BuildStats {
            levels: depth,
            nodes: nodes.len(),
            leaves: nodes.iter().filter(|node| node.terminal).count(),
            depth_capped,
        };
        debug!(nodes = stats.nodes, leaves = stats.leaves, levels = stats.levels, "tree built");

        Ok(BuildOutput {
            tree: SpatialTree::from_parts(nodes, orthants),
            assignment,
            stats,
        })
    }
}

fn validate_dimension<const D: usize>() -> Result<(), BuildError> {
    if D == 0 || D > MAX_DIMENSION {
        return Err(BuildError::UnsupportedDimension {
            dimension: D,
            max: MAX_DIMENSION,
        });
    }
    Ok(())
}

fn validate_points<const D: usize>(points: &[[f64; D]]) -> Result<(), BuildError> {
    for (index, point) in points.iter().enumerate() {
        if let Some(axis) = point.iter().position(|c| !c.is_finite()) {
            return Err(BuildError::NonFinitePoint { index, axis });
        }
    }
    Ok(())
}
