//! Node record
//!
//! Node = axis-aligned cube, stored by center and depth
//! Root cube: center 0, half-width 1
//! Half-width at depth d: h(d) = 2^-d
//! Child center: parent.center + descent · h(child.depth)

use std::fmt;

/// Stable index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root is always the first node allocated.
    pub const ROOT: NodeId = NodeId(0);

    /// Wrap a raw arena index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    /// Id `offset` slots after this one.
    #[inline]
    pub(crate) fn offset(self, offset: usize) -> Self {
        Self(self.0 + offset)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Half-width of a cube at `depth`, assuming a root half-width of 1.
#[inline]
pub fn half_width(depth: u32) -> f64 {
    0.5_f64.powi(depth as i32)
}

/// One cube of the decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<const D: usize> {
    /// Parent node, `None` for the root
    pub parent: Option<NodeId>,

    /// Root = 0, child = parent + 1
    pub depth: u32,

    /// Cube center
    pub center: [f64; D],

    /// Orthant offset relative to the parent center (all zero at the root)
    pub descent: [i8; D],

    pub(crate) terminal: bool,

    /// First of `2^D` contiguous children
    pub(crate) first_child: Option<NodeId>,
}

impl<const D: usize> Node<D> {
    /// Root cube covering `[-1, 1]^D`.
    pub(crate) fn root() -> Self {
        Self {
            parent: None,
            depth: 0,
            center: [0.0; D],
            descent: [0; D],
            terminal: true,
            first_child: None,
        }
    }

    /// Fresh child of `parent` in the orthant named by `descent`.
    ///
    /// Children start terminal until a later level finds them over capacity.
    pub(crate) fn child(parent: NodeId, parent_center: &[f64; D], depth: u32, descent: [i8; D]) -> Self {
        let h = half_width(depth);
        let mut center = *parent_center;
        for axis in 0..D {
            center[axis] += descent[axis] as f64 * h;
        }

        Self {
            parent: Some(parent),
            depth,
            center,
            descent,
            terminal: true,
            first_child: None,
        }
    }

    /// Leaf check
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Root check
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// First child id, `None` for leaves.
    #[inline]
    pub fn first_child(&self) -> Option<NodeId> {
        if self.terminal {
            None
        } else {
            self.first_child
        }
    }

    /// Half-width of this cube.
    #[inline]
    pub fn half_width(&self) -> f64 {
        half_width(self.depth)
    }

    /// Closed-cube containment test.
    pub fn contains(&self, point: &[f64; D]) -> bool {
        let h = self.half_width();
        (0..D).all(|axis| (point[axis] - self.center[axis]).abs() <= h)
    }

    /// Lower and upper corners.
    pub fn bounds(&self) -> ([f64; D], [f64; D]) {
        let h = self.half_width();
        (self.center.map(|c| c - h), self.center.map(|c| c + h))
    }
}
