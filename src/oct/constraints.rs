//! Constraint families of the OCT-SVM formulation.
//!
//! With `x_i` the (possibly intercept-augmented) feature row, `y_i ∈ {-1,1}`
//! and `M` the big-M constant:
//!
//! | family | scope | constraint |
//! |---|---|---|
//! | margin bound | node | `‖w_t‖² <= 2·delta` |
//! | complexity monotonicity | non-root node | `d_t <= d_parent` |
//! | gated margin | sample, node | `y·(w_t·x) - 2y·(beta_it·x) >= 1 - e_it - M(1 - z_it)` |
//! | norm/complexity link | node | `‖w_t‖² <= M·d_t` |
//! | bilinear linearization | sample, node, feature | `beta_itj = w_tj·xi_it` |
//! | routing monotonicity | sample, non-root node | `z_it <= z_i,parent` |
//! | sign detection | sample, node | `-M(1 - theta_it) <= w_t·x <= M·theta_it` |
//! | branch inheritance | sample, non-root node | left: `z_ip - z_it <= theta_ip`, right: `z_ip - z_it <= 1 - theta_ip` |
//! | layer partition | sample, layer | `Σ_layer z_it = 1` |
//!
//! Squared norms only cover the raw features; an intercept column takes
//! part in every `w_t·x` but is never regularized.

use super::config::BilinearEncoding;
use super::variables::OctVariables;
use crate::model::{Constraint, LinearExpr, QuadTerm, Sense};
use crate::primitives::Matrix;
use crate::tree::{NodeId, Side, TreeTopology};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The family a generated constraint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintFamily {
    /// `‖w_t‖² <= 2·delta`
    MarginBound,
    /// `d_t <= d_parent(t)`
    ComplexityMonotonicity,
    /// Soft-margin SVM constraint enforced only where `z_it = 1`
    GatedMargin,
    /// `‖w_t‖² <= M·d_t`
    NormComplexityLink,
    /// `beta_itj = w_tj·xi_it`, linearized or as a product
    BilinearLinearization,
    /// `z_it <= z_i,parent(t)`
    RoutingMonotonicity,
    /// `theta_it` follows the sign of `w_t·x_i`
    SignDetection,
    /// Leaving the parent towards one child is explained by the parent's sign
    BranchInheritance,
    /// One routed node per sample and layer
    LayerPartition,
}

impl ConstraintFamily {
    /// Every family in generation order.
    pub const ALL: [Self; 9] = [
        Self::MarginBound,
        Self::ComplexityMonotonicity,
        Self::NormComplexityLink,
        Self::GatedMargin,
        Self::BilinearLinearization,
        Self::RoutingMonotonicity,
        Self::SignDetection,
        Self::BranchInheritance,
        Self::LayerPartition,
    ];

    /// Snake-case name, also used as constraint name prefix.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarginBound => "margin_bound",
            Self::ComplexityMonotonicity => "complexity_monotonicity",
            Self::GatedMargin => "gated_margin",
            Self::NormComplexityLink => "norm_complexity_link",
            Self::BilinearLinearization => "bilinear",
            Self::RoutingMonotonicity => "routing_monotonicity",
            Self::SignDetection => "sign_detection",
            Self::BranchInheritance => "branch_inheritance",
            Self::LayerPartition => "layer_partition",
        }
    }
}

impl fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generates constraints for one set of allocated variables.
#[derive(Debug)]
pub struct ConstraintBuilder<'a> {
    vars: &'a OctVariables,
    topology: TreeTopology,
    x: &'a Matrix<f64>,
    y: &'a [f64],
    big_m: f64,
    n_norm_features: usize,
    bilinear: BilinearEncoding,
}

impl<'a> ConstraintBuilder<'a> {
    /// `x` must already carry the intercept column if one is fitted;
    /// `n_norm_features` is the number of leading columns that enter the
    /// squared norms.
    #[must_use]
    pub fn new(
        vars: &'a OctVariables,
        topology: TreeTopology,
        x: &'a Matrix<f64>,
        y: &'a [f64],
        big_m: f64,
        n_norm_features: usize,
        bilinear: BilinearEncoding,
    ) -> Self {
        debug_assert_eq!(x.n_cols(), vars.n_features());
        debug_assert_eq!(x.n_rows(), y.len());
        Self {
            vars,
            topology,
            x,
            y,
            big_m,
            n_norm_features,
            bilinear,
        }
    }

    /// Every constraint of every family, per-node families first, then per
    /// sample. The order only depends on the problem shape.
    #[must_use]
    pub fn build(&self) -> Vec<(ConstraintFamily, Constraint)> {
        let mut out = Vec::new();
        for t in self.topology.nodes() {
            out.push((ConstraintFamily::MarginBound, self.margin_bound(t)));
            if let Some(c) = self.complexity_monotonicity(t) {
                out.push((ConstraintFamily::ComplexityMonotonicity, c));
            }
            out.push((ConstraintFamily::NormComplexityLink, self.norm_complexity_link(t)));
        }
        for i in 0..self.y.len() {
            for t in self.topology.nodes() {
                out.push((ConstraintFamily::GatedMargin, self.gated_margin(i, t)));
                for c in self.bilinear(i, t) {
                    out.push((ConstraintFamily::BilinearLinearization, c));
                }
                if let Some(c) = self.routing_monotonicity(i, t) {
                    out.push((ConstraintFamily::RoutingMonotonicity, c));
                }
                let (lower, upper) = self.sign_detection(i, t);
                out.push((ConstraintFamily::SignDetection, lower));
                out.push((ConstraintFamily::SignDetection, upper));
                if let Some(c) = self.branch_inheritance(i, t) {
                    out.push((ConstraintFamily::BranchInheritance, c));
                }
            }
            for l in 0..self.topology.n_layers() {
                out.push((ConstraintFamily::LayerPartition, self.layer_partition(i, l)));
            }
        }
        out
    }

    fn squared_norm(&self, t: NodeId) -> Vec<QuadTerm> {
        self.vars.weights(t)[..self.n_norm_features]
            .iter()
            .map(|&w| QuadTerm::square(w, 1.0))
            .collect()
    }

    /// `Σ_j scale·x_ij·w_tj`
    fn hyperplane(&self, i: usize, t: NodeId, scale: f64) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for (&w, &x) in self.vars.weights(t).iter().zip(self.x.row(i)) {
            expr.add_term(w, scale * x);
        }
        expr
    }

    /// `‖w_t‖² - 2·delta <= 0`
    pub fn margin_bound(&self, t: NodeId) -> Constraint {
        Constraint::quadratic(
            format!("margin_bound_{t}"),
            self.squared_norm(t),
            LinearExpr::new().term(self.vars.delta, -2.0),
            Sense::LessEqual,
            0.0,
        )
    }

    /// `d_t - d_parent <= 0`, `None` for the root.
    pub fn complexity_monotonicity(&self, t: NodeId) -> Option<Constraint> {
        let parent = self.topology.parent(t)?;
        Some(Constraint::linear(
            format!("complexity_monotonicity_{t}"),
            LinearExpr::new()
                .term(self.vars.d[t], 1.0)
                .term(self.vars.d[parent], -1.0),
            Sense::LessEqual,
            0.0,
        ))
    }

    /// `‖w_t‖² - M·d_t <= 0`
    pub fn norm_complexity_link(&self, t: NodeId) -> Constraint {
        Constraint::quadratic(
            format!("norm_complexity_link_{t}"),
            self.squared_norm(t),
            LinearExpr::new().term(self.vars.d[t], -self.big_m),
            Sense::LessEqual,
            0.0,
        )
    }

    /// `Σ_j y·x_ij·(w_tj - 2·beta_itj) + e_it - M·z_it >= 1 - M`
    pub fn gated_margin(&self, i: usize, t: NodeId) -> Constraint {
        let y = self.y[i];
        let mut expr = self.hyperplane(i, t, y);
        for (&beta, &x) in self.vars.beta.row(i, t).iter().zip(self.x.row(i)) {
            expr.add_term(beta, -2.0 * y * x);
        }
        expr.add_term(self.vars.e.at(i, t), 1.0);
        expr.add_term(self.vars.z.at(i, t), -self.big_m);
        Constraint::linear(
            format!("gated_margin_{i}_{t}"),
            expr,
            Sense::GreaterEqual,
            1.0 - self.big_m,
        )
    }

    /// Constraints tying `beta_itj` to `w_tj·xi_it` for every feature `j`.
    pub fn bilinear(&self, i: usize, t: NodeId) -> Vec<Constraint> {
        let m = self.big_m;
        let xi = self.vars.xi.at(i, t);
        let mut out = Vec::new();
        for (j, (&beta, &w)) in self
            .vars
            .beta
            .row(i, t)
            .iter()
            .zip(self.vars.weights(t))
            .enumerate()
        {
            match self.bilinear {
                BilinearEncoding::McCormick => {
                    // beta <= w + M(1 - xi)
                    out.push(Constraint::linear(
                        format!("bilinear_{i}_{t}_{j}_upper_w"),
                        LinearExpr::new().term(beta, 1.0).term(w, -1.0).term(xi, m),
                        Sense::LessEqual,
                        m,
                    ));
                    // beta >= w - M(1 - xi)
                    out.push(Constraint::linear(
                        format!("bilinear_{i}_{t}_{j}_lower_w"),
                        LinearExpr::new().term(beta, 1.0).term(w, -1.0).term(xi, -m),
                        Sense::GreaterEqual,
                        -m,
                    ));
                    // beta <= M·xi
                    out.push(Constraint::linear(
                        format!("bilinear_{i}_{t}_{j}_upper_gate"),
                        LinearExpr::new().term(beta, 1.0).term(xi, -m),
                        Sense::LessEqual,
                        0.0,
                    ));
                    // beta >= -M·xi
                    out.push(Constraint::linear(
                        format!("bilinear_{i}_{t}_{j}_lower_gate"),
                        LinearExpr::new().term(beta, 1.0).term(xi, m),
                        Sense::GreaterEqual,
                        0.0,
                    ));
                }
                BilinearEncoding::Product => {
                    out.push(Constraint::quadratic(
                        format!("bilinear_{i}_{t}_{j}"),
                        vec![QuadTerm::product(w, xi, -1.0)],
                        LinearExpr::from(beta),
                        Sense::Equal,
                        0.0,
                    ));
                }
            }
        }
        out
    }

    /// `z_it - z_i,parent <= 0`, `None` for the root.
    pub fn routing_monotonicity(&self, i: usize, t: NodeId) -> Option<Constraint> {
        let parent = self.topology.parent(t)?;
        Some(Constraint::linear(
            format!("routing_monotonicity_{i}_{t}"),
            LinearExpr::new()
                .term(self.vars.z.at(i, t), 1.0)
                .term(self.vars.z.at(i, parent), -1.0),
            Sense::LessEqual,
            0.0,
        ))
    }

    /// `w_t·x_i - M·theta_it >= -M` and `w_t·x_i - M·theta_it <= 0`.
    pub fn sign_detection(&self, i: usize, t: NodeId) -> (Constraint, Constraint) {
        let theta = self.vars.theta.at(i, t);
        let expr = self.hyperplane(i, t, 1.0).term(theta, -self.big_m);
        (
            Constraint::linear(
                format!("sign_detection_{i}_{t}_lower"),
                expr.clone(),
                Sense::GreaterEqual,
                -self.big_m,
            ),
            Constraint::linear(
                format!("sign_detection_{i}_{t}_upper"),
                expr,
                Sense::LessEqual,
                0.0,
            ),
        )
    }

    /// Left child: `z_ip - z_it - theta_ip <= 0`; right child:
    /// `z_ip - z_it + theta_ip <= 1`. `None` for the root.
    pub fn branch_inheritance(&self, i: usize, t: NodeId) -> Option<Constraint> {
        let parent = self.topology.parent(t)?;
        let side = self.topology.side(t)?;
        let expr = LinearExpr::new()
            .term(self.vars.z.at(i, parent), 1.0)
            .term(self.vars.z.at(i, t), -1.0);
        let theta = self.vars.theta.at(i, parent);
        Some(match side {
            Side::Left => Constraint::linear(
                format!("branch_inheritance_{i}_{t}_left"),
                expr.term(theta, -1.0),
                Sense::LessEqual,
                0.0,
            ),
            Side::Right => Constraint::linear(
                format!("branch_inheritance_{i}_{t}_right"),
                expr.term(theta, 1.0),
                Sense::LessEqual,
                1.0,
            ),
        })
    }

    /// `Σ_{t in layer l} z_it = 1`
    pub fn layer_partition(&self, i: usize, l: usize) -> Constraint {
        let mut expr = LinearExpr::new();
        for t in self.topology.layer(l) {
            expr.add_term(self.vars.z.at(i, t), 1.0);
        }
        Constraint::linear(format!("layer_partition_{i}_{l}"), expr, Sense::Equal, 1.0)
    }
}
