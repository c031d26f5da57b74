//! Index arithmetic for a complete binary tree stored in breadth-first order.
//!
//! Node `0` is the root, the children of `t` are `2t + 1` (left) and
//! `2t + 2` (right), and layer `l` holds the nodes `2^l - 1 .. 2^(l+1) - 1`.
//! A tree of depth `D` has `D + 1` layers and `2^(D+1) - 1` nodes.

use crate::error::{OctError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Deepest tree accepted.
pub const MAX_DEPTH: usize = 16;

/// Identifier of a node in breadth-first order.
pub type NodeId = usize;

/// Which child of its parent a non-root node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Odd index, `2 * parent + 1`.
    Left,
    /// Even non-zero index, `2 * parent + 2`.
    Right,
}

/// Shape of a complete binary tree of fixed depth.
///
/// # Examples
///
/// ```
/// use octsvm::tree::{Side, TreeTopology};
///
/// let topo = TreeTopology::new(2).expect("depth 2 is valid");
/// assert_eq!(topo.n_nodes(), 7);
/// assert_eq!(topo.parent(5), Some(2));
/// assert_eq!(topo.side(5), Some(Side::Left));
/// assert_eq!(topo.layer(2), 3..7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeTopology {
    depth: usize,
}

impl TreeTopology {
    /// Creates the topology for a tree with `depth` split levels below the root.
    ///
    /// # Errors
    ///
    /// Returns an error if `depth` is zero or larger than [`MAX_DEPTH`].
    pub fn new(depth: usize) -> Result<Self> {
        if depth < 1 || depth > MAX_DEPTH {
            return Err(OctError::invalid_hyperparameter(
                "depth",
                depth,
                &format!("1 <= depth <= {MAX_DEPTH}"),
            ));
        }
        Ok(Self { depth })
    }

    /// Creates a topology from a signed depth, as read from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if `depth` is not positive.
    pub fn from_signed(depth: i64) -> Result<Self> {
        let depth = usize::try_from(depth)
            .map_err(|_| OctError::invalid_hyperparameter("depth", depth, ">= 1"))?;
        Self::new(depth)
    }

    /// Configured depth `D`.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Total node count `T = 2^(D+1) - 1`.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        (1usize << (self.depth + 1)) - 1
    }

    /// Number of layers, `D + 1`.
    #[must_use]
    pub fn n_layers(&self) -> usize {
        self.depth + 1
    }

    /// All node ids in breadth-first order.
    #[must_use]
    pub fn nodes(&self) -> Range<NodeId> {
        0..self.n_nodes()
    }

    /// Node ids at layer `l`.
    ///
    /// # Panics
    ///
    /// Panics if `l > depth`.
    #[must_use]
    pub fn layer(&self, l: usize) -> Range<NodeId> {
        assert!(l <= self.depth, "layer {l} out of range for depth {}", self.depth);
        ((1usize << l) - 1)..((1usize << (l + 1)) - 1)
    }

    /// Iterates over every layer's node range, root first.
    pub fn layers(&self) -> impl Iterator<Item = Range<NodeId>> + '_ {
        (0..self.n_layers()).map(move |l| self.layer(l))
    }

    /// Parent of `t`, `None` for the root.
    #[must_use]
    pub fn parent(&self, t: NodeId) -> Option<NodeId> {
        debug_assert!(t < self.n_nodes());
        (t > 0).then(|| (t - 1) / 2)
    }

    /// Layer of `t`, `floor(log2(t + 1))`.
    #[must_use]
    pub fn node_depth(&self, t: NodeId) -> usize {
        debug_assert!(t < self.n_nodes());
        (usize::BITS - 1 - (t + 1).leading_zeros()) as usize
    }

    /// Whether `t` is a left or right child, `None` for the root.
    #[must_use]
    pub fn side(&self, t: NodeId) -> Option<Side> {
        match t {
            0 => None,
            t if t % 2 == 1 => Some(Side::Left),
            _ => Some(Side::Right),
        }
    }

    /// Children `(2t + 1, 2t + 2)` of an internal node, `None` at the last layer.
    #[must_use]
    pub fn children(&self, t: NodeId) -> Option<(NodeId, NodeId)> {
        let right = 2 * t + 2;
        (right < self.n_nodes()).then_some((2 * t + 1, right))
    }

    /// Child of `t` on `side`, `None` at the last layer.
    #[must_use]
    pub fn child(&self, t: NodeId, side: Side) -> Option<NodeId> {
        self.children(t).map(|(l, r)| match side {
            Side::Left => l,
            Side::Right => r,
        })
    }

    /// Whether `t` sits in the last layer.
    #[must_use]
    pub fn is_leaf(&self, t: NodeId) -> bool {
        self.node_depth(t) == self.depth
    }
}
