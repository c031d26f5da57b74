//! Allocation of every decision-variable family.
//!
//! Families are allocated in a fixed order (`delta`, `w`, `d`, `e`, `z`,
//! `theta`, `xi`, `beta`) and each family in row-major order of its key, so
//! equal shapes always produce equal [`VarId`]s and names.

use crate::model::{Model, VarId, Variable};
use crate::tree::NodeId;

/// Row-major grid of variables keyed by two indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarGrid {
    ids: Vec<VarId>,
    cols: usize,
}

impl VarGrid {
    fn allocate(
        model: &mut Model,
        rows: usize,
        cols: usize,
        make: impl Fn(usize, usize) -> Variable,
    ) -> Self {
        let mut ids = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                ids.push(model.add_variable(make(r, c)));
            }
        }
        Self { ids, cols }
    }

    /// Variable at `(r, c)`.
    ///
    /// # Panics
    ///
    /// Panics if the key is outside the grid.
    #[must_use]
    pub fn at(&self, r: usize, c: usize) -> VarId {
        assert!(c < self.cols, "column {c} out of range ({})", self.cols);
        self.ids[r * self.cols + c]
    }

    /// All variables of row `r`.
    #[must_use]
    pub fn row(&self, r: usize) -> &[VarId] {
        &self.ids[r * self.cols..(r + 1) * self.cols]
    }
}

/// Row-major cube of variables keyed by three indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarCube {
    ids: Vec<VarId>,
    dims: (usize, usize),
}

impl VarCube {
    fn allocate(
        model: &mut Model,
        (d0, d1, d2): (usize, usize, usize),
        make: impl Fn(usize, usize, usize) -> Variable,
    ) -> Self {
        let mut ids = Vec::with_capacity(d0 * d1 * d2);
        for a in 0..d0 {
            for b in 0..d1 {
                for c in 0..d2 {
                    ids.push(model.add_variable(make(a, b, c)));
                }
            }
        }
        Self { ids, dims: (d1, d2) }
    }

    /// Variable at `(a, b, c)`.
    ///
    /// # Panics
    ///
    /// Panics if the key is outside the cube.
    #[must_use]
    pub fn at(&self, a: usize, b: usize, c: usize) -> VarId {
        let (d1, d2) = self.dims;
        assert!(b < d1 && c < d2, "key ({a}, {b}, {c}) out of range");
        self.ids[(a * d1 + b) * d2 + c]
    }

    /// The innermost row `(a, b, ..)`.
    #[must_use]
    pub fn row(&self, a: usize, b: usize) -> &[VarId] {
        let (d1, d2) = self.dims;
        let start = (a * d1 + b) * d2;
        &self.ids[start..start + d2]
    }
}

/// Every variable of the formulation, addressed by `(sample, node[, feature])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctVariables {
    /// Global margin scalar, `>= 0`.
    pub delta: VarId,
    /// Hyperplane weights keyed by `(node, feature)`, free.
    pub w: VarGrid,
    /// Complexity indicators keyed by node, `>= 0`.
    pub d: Vec<VarId>,
    /// Slacks keyed by `(sample, node)`, `>= 0`.
    pub e: VarGrid,
    /// Routing indicators keyed by `(sample, node)`, binary.
    pub z: VarGrid,
    /// Sign indicators keyed by `(sample, node)`, binary.
    pub theta: VarGrid,
    /// Gating binaries keyed by `(sample, node)`.
    pub xi: VarGrid,
    /// Linearized products keyed by `(sample, node, feature)`, free.
    pub beta: VarCube,
    n_samples: usize,
    n_nodes: usize,
    n_features: usize,
}

impl OctVariables {
    /// Allocates all families into `model`.
    ///
    /// `n_features` counts the intercept column when one is fitted.
    pub fn allocate(model: &mut Model, n_samples: usize, n_nodes: usize, n_features: usize) -> Self {
        let delta = model.add_variable(Variable::non_negative("delta"));
        let w = VarGrid::allocate(model, n_nodes, n_features, |t, j| {
            Variable::free(format!("w_{t}_{j}"))
        });
        let d = (0..n_nodes)
            .map(|t| model.add_variable(Variable::non_negative(format!("d_{t}"))))
            .collect();
        let e = VarGrid::allocate(model, n_samples, n_nodes, |i, t| {
            Variable::non_negative(format!("e_{i}_{t}"))
        });
        let z = VarGrid::allocate(model, n_samples, n_nodes, |i, t| {
            Variable::binary(format!("z_{i}_{t}"))
        });
        let theta = VarGrid::allocate(model, n_samples, n_nodes, |i, t| {
            Variable::binary(format!("theta_{i}_{t}"))
        });
        let xi = VarGrid::allocate(model, n_samples, n_nodes, |i, t| {
            Variable::binary(format!("xi_{i}_{t}"))
        });
        let beta = VarCube::allocate(model, (n_samples, n_nodes, n_features), |i, t, j| {
            Variable::free(format!("beta_{i}_{t}_{j}"))
        });

        tracing::debug!(
            n_samples,
            n_nodes,
            n_features,
            n_variables = model.n_variables(),
            "allocated variable families"
        );

        Self {
            delta,
            w,
            d,
            e,
            z,
            theta,
            xi,
            beta,
            n_samples,
            n_nodes,
            n_features,
        }
    }

    /// Weights of node `t`.
    #[must_use]
    pub fn weights(&self, t: NodeId) -> &[VarId] {
        self.w.row(t)
    }

    /// Number of samples the variables were sized for.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Number of nodes the variables were sized for.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Number of feature columns (including the intercept column, if any).
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
