//! # Adaptive Orthant Trees for Hierarchical Summation
//!
//! This library builds the spatial core of a fast multipole method: an
//! adaptive generalized quadtree/octree over D dimensions, and a resolver
//! that finds a node's neighbor in any Moore direction.
//!
//! ## Core Algorithm
//!
//! 1. **Level-synchronous refinement**: every pass splits each node holding
//!    more than `cutoff` points into `2^D` orthant children
//! 2. **Shared orthant encoding**: one table, axis 0 most significant, used
//!    both to place points and to walk back down the tree
//! 3. **Climb-then-descend neighbors**: rise until the target shares an
//!    ancestor, then replay mirrored steps down to the first leaf
//!
//! Result: depth follows local density, and neighbor queries cost
//! O(depth) each with no mutable state, so batches run in parallel.
//!
//! ## Usage Example
//!
//! ```
//! use fmm_tree::{build, NeighborResolver};
//!
//! // Points already scaled into [-1, 1]^2
//! let points = [[-0.8, -0.8], [-0.7, -0.6], [-0.3, -0.3], [-0.2, -0.1], [0.7, 0.7]];
//! let output = build(&points, 2)?;
//!
//! let resolver = NeighborResolver::new(&output.tree);
//! let leaf = output.assignment[2];
//! let diagonal = resolver.neighbor(leaf, [1, 1])?;
//! assert_eq!(diagonal, Some(output.assignment[4]));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod offsets; // Cartesian offset tables and orthant encoding
pub mod tree;    // Node arena, builder, neighbor resolver

// Re-exports for convenience
pub use offsets::{cartesian_product, tuples, OrthantTable};
pub use tree::{
    build, half_width, moore_neighborhood, neighbors, BucketError, BuildConfig, BuildError, BuildOutput,
    BuildStats, Directions, NeighborError, NeighborResolver, Node, NodeId, PartitionedOutput,
    PointBuckets, SpatialTree, TreeBuilder,
};
