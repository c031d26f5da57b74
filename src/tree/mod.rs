//! Complete binary trees with a linear separator at every node.
//!
//! - [`TreeTopology`]: breadth-first index arithmetic (parent, layer, side)
//! - [`SvmTree`]: learned hyperplanes plus routing and prediction
//!
//! # Example
//!
//! ```
//! use octsvm::tree::{NodeHyperplane, SvmTree, TreeTopology};
//!
//! let topology = TreeTopology::new(1).expect("depth 1");
//! let tree = SvmTree::new(
//!     topology,
//!     vec![
//!         NodeHyperplane::new(vec![0.4, 0.0], -1.0),
//!         NodeHyperplane::new(vec![0.0, 0.0], -1.0),
//!         NodeHyperplane::new(vec![0.0, 0.0], 1.0),
//!     ],
//! ).expect("three nodes");
//!
//! assert_eq!(tree.route(&[0.0, 1.0]), vec![0, 1]);
//! assert_eq!(tree.predict_one(&[5.0, 0.0]), 1.0);
//! ```

mod topology;

pub use topology::{NodeId, Side, TreeTopology, MAX_DEPTH};

use crate::error::{OctError, Result};
use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Separator `w·x + b` of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeHyperplane {
    /// Weights over the raw features
    pub weights: Vec<f64>,
    /// Intercept, zero when none was fitted
    pub intercept: f64,
}

impl NodeHyperplane {
    /// Creates a hyperplane.
    #[must_use]
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self { weights, intercept }
    }

    /// `w·x + b`
    #[must_use]
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.weights.iter().zip(x).map(|(w, x)| w * x).sum::<f64>() + self.intercept
    }

    /// `‖w‖²`, intercept excluded.
    #[must_use]
    pub fn squared_norm(&self) -> f64 {
        self.weights.iter().map(|w| w * w).sum()
    }
}

/// A depth-`D` tree of hyperplanes.
///
/// A sample at node `t` moves to the right child when `w_t·x + b_t >= 0`
/// and to the left child otherwise. The class is the sign of the
/// hyperplane of the node reached in the last layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmTree {
    topology: TreeTopology,
    nodes: Vec<NodeHyperplane>,
}

impl SvmTree {
    /// Creates a tree from one hyperplane per node in breadth-first order.
    ///
    /// # Errors
    ///
    /// Returns an error if the node count does not match the topology or
    /// the hyperplanes disagree on the feature count.
    pub fn new(topology: TreeTopology, nodes: Vec<NodeHyperplane>) -> Result<Self> {
        if nodes.len() != topology.n_nodes() {
            return Err(OctError::dimension_mismatch(
                "tree nodes",
                topology.n_nodes(),
                nodes.len(),
            ));
        }
        let n_features = nodes.first().map_or(0, |n| n.weights.len());
        if let Some(bad) = nodes.iter().find(|n| n.weights.len() != n_features) {
            return Err(OctError::dimension_mismatch(
                "hyperplane weights",
                n_features,
                bad.weights.len(),
            ));
        }
        Ok(Self { topology, nodes })
    }

    /// Tree shape.
    #[must_use]
    pub fn topology(&self) -> TreeTopology {
        self.topology
    }

    /// Hyperplanes in breadth-first order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeHyperplane] {
        &self.nodes
    }

    /// Hyperplane of node `t`.
    #[must_use]
    pub fn node(&self, t: NodeId) -> &NodeHyperplane {
        &self.nodes[t]
    }

    /// Number of raw features the hyperplanes expect.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.nodes.first().map_or(0, |n| n.weights.len())
    }

    /// Nodes whose squared weight norm exceeds `tol`.
    #[must_use]
    pub fn active_nodes(&self, tol: f64) -> Vec<NodeId> {
        self.topology
            .nodes()
            .filter(|&t| self.nodes[t].squared_norm() > tol)
            .collect()
    }

    /// Nodes visited by `x`, one per layer, root first.
    #[must_use]
    pub fn route(&self, x: &[f64]) -> Vec<NodeId> {
        let mut path = Vec::with_capacity(self.topology.n_layers());
        let mut t = 0;
        path.push(t);
        while let Some((left, right)) = self.topology.children(t) {
            t = if self.nodes[t].evaluate(x) >= 0.0 { right } else { left };
            path.push(t);
        }
        path
    }

    /// Predicted label in `{-1, +1}` for one sample.
    #[must_use]
    pub fn predict_one(&self, x: &[f64]) -> f64 {
        let mut t = 0;
        while let Some((left, right)) = self.topology.children(t) {
            t = if self.nodes[t].evaluate(x) >= 0.0 { right } else { left };
        }
        if self.nodes[t].evaluate(x) >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Predicted labels for every row of `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the column count differs from the training data.
    pub fn predict(&self, x: &Matrix<f64>) -> Result<Vec<f64>> {
        if x.n_cols() != self.n_features() {
            return Err(OctError::dimension_mismatch(
                "features",
                self.n_features(),
                x.n_cols(),
            ));
        }
        Ok(x.rows().map(|row| self.predict_one(row)).collect())
    }

    /// Fraction of rows whose prediction equals the label.
    ///
    /// # Errors
    ///
    /// Returns an error on a feature or label count mismatch.
    pub fn score(&self, x: &Matrix<f64>, y: &[f64]) -> Result<f64> {
        if y.len() != x.n_rows() {
            return Err(OctError::dimension_mismatch("labels", x.n_rows(), y.len()));
        }
        if y.is_empty() {
            return Err(OctError::empty_input("scoring samples"));
        }
        let predictions = self.predict(x)?;
        let correct = predictions
            .iter()
            .zip(y)
            .filter(|(p, t)| p == t)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }

    /// Saves the tree as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Loads a tree saved with [`SvmTree::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if reading or parsing fails, or the file describes
    /// an inconsistent tree.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let tree: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        Self::new(TreeTopology::new(tree.topology.depth())?, tree.nodes)
    }
}

#[cfg(test)]
mod tests;
