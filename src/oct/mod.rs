//! The OCT-SVM mixed-integer formulation.
//!
//! A depth-`D` complete binary tree carries one soft-margin hyperplane per
//! node. Binaries route every sample through exactly one node per layer,
//! follow the sign of the parent's hyperplane, and gate which margin
//! constraints are enforced. The objective trades the largest weight norm
//! against slack, gating activations and node complexity:
//!
//! ```text
//! min  delta + c1·Σ e + c2·Σ xi + c3·Σ d
//! ```
//!
//! [`OctModel::build`] validates the inputs, allocates the variables in a
//! fixed order, generates every constraint family and hands back a solver
//! independent [`Model`]. [`OctModel::extract`] turns a solver assignment
//! into an [`SvmTree`] plus per-sample routing.
//!
//! # Example
//!
//! ```
//! use octsvm::oct::{Dataset, OctModel, OctSvmConfig};
//!
//! let data = Dataset::from_rows(
//!     &[[0.0, 0.0], [0.0, 1.0], [5.0, 0.0], [5.0, 1.0]],
//!     &[-1.0, -1.0, 1.0, 1.0],
//! ).expect("valid data");
//! let config = OctSvmConfig::new().with_depth(1).with_big_m(100.0);
//!
//! let oct = OctModel::build(&data, &config).expect("valid inputs");
//! assert_eq!(oct.model().n_binaries(), 3 * 4 * 3);
//! ```

mod classifier;
pub mod config;
pub mod constraints;
pub mod data;
pub mod objective;
pub mod variables;

pub use classifier::OctSvmClassifier;
pub use config::{BilinearEncoding, OctSvmConfig};
pub use constraints::{ConstraintBuilder, ConstraintFamily};
pub use data::Dataset;
pub use variables::{OctVariables, VarCube, VarGrid};

use crate::error::{OctError, Result};
use crate::model::{Constraint, Model};
use crate::primitives::Matrix;
use crate::solver::{Solution, SolveStatus, Solver};
use crate::tree::{NodeHyperplane, NodeId, SvmTree, TreeTopology};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Name given to every generated model.
pub const MODEL_NAME: &str = "OCTSVM";

/// Binary values above this count as `1` when reading a solution.
const BINARY_THRESHOLD: f64 = 0.5;

/// Complexity indicators above this mark a node as active.
const ACTIVE_TOLERANCE: f64 = 1e-9;

/// Size summary of a generated model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStats {
    /// Total variable count
    pub n_variables: usize,
    /// Binary variable count
    pub n_binaries: usize,
    /// Continuous variable count
    pub n_continuous: usize,
    /// Total constraint count
    pub n_constraints: usize,
    /// Constraints with quadratic terms
    pub n_quadratic: usize,
    /// Constraint count per family
    pub by_family: BTreeMap<ConstraintFamily, usize>,
}

/// A built OCT-SVM model together with the data it was built from.
#[derive(Debug, Clone)]
pub struct OctModel {
    model: Model,
    vars: OctVariables,
    families: Vec<ConstraintFamily>,
    topology: TreeTopology,
    config: OctSvmConfig,
    x: Matrix<f64>,
    y: Vec<f64>,
    n_raw_features: usize,
}

impl OctModel {
    /// Builds the full formulation for `data` under `config`.
    ///
    /// Identical inputs always produce identical models, including the order
    /// and names of variables and constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails [`OctSvmConfig::validate`]. Data
    /// problems are caught earlier by [`Dataset::new`].
    pub fn build(data: &Dataset, config: &OctSvmConfig) -> Result<Self> {
        config.validate()?;
        let topology = config.topology()?;
        let n_raw_features = data.n_features();
        let x = if config.fit_intercept {
            data.features().with_constant_column(1.0)
        } else {
            data.features().clone()
        };
        let y = data.labels().to_vec();

        if config.big_m <= 1.0 {
            tracing::warn!(
                big_m = config.big_m,
                "big-M does not exceed the unit margin; inactive margin constraints cannot relax"
            );
        }

        let mut model = Model::new(MODEL_NAME);
        let vars = OctVariables::allocate(&mut model, data.n_samples(), topology.n_nodes(), x.n_cols());

        let generated = ConstraintBuilder::new(
            &vars,
            topology,
            &x,
            &y,
            config.big_m,
            n_raw_features,
            config.bilinear,
        )
        .build();
        let mut families = Vec::with_capacity(generated.len());
        for (family, constraint) in generated {
            model.add_constraint(constraint);
            families.push(family);
        }
        model.set_objective(objective::objective(&vars, config));

        tracing::info!(
            depth = topology.depth(),
            n_samples = data.n_samples(),
            n_features = n_raw_features,
            variables = model.n_variables(),
            binaries = model.n_binaries(),
            constraints = model.n_constraints(),
            "built OCT-SVM model"
        );

        Ok(Self {
            model,
            vars,
            families,
            topology,
            config: config.clone(),
            x,
            y,
            n_raw_features,
        })
    }

    /// The solver-facing model.
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Variable handles.
    #[must_use]
    pub fn variables(&self) -> &OctVariables {
        &self.vars
    }

    /// Tree shape.
    #[must_use]
    pub fn topology(&self) -> TreeTopology {
        self.topology
    }

    /// Configuration the model was built with.
    #[must_use]
    pub fn config(&self) -> &OctSvmConfig {
        &self.config
    }

    /// Family of every constraint, parallel to [`Model::constraints`].
    #[must_use]
    pub fn families(&self) -> &[ConstraintFamily] {
        &self.families
    }

    /// Constraints of one family in generation order.
    pub fn constraints_of(&self, family: ConstraintFamily) -> impl Iterator<Item = &Constraint> + '_ {
        self.model
            .constraints()
            .iter()
            .zip(&self.families)
            .filter(move |(_, f)| **f == family)
            .map(|(c, _)| c)
    }

    /// Feature matrix as seen by the constraints, intercept column included.
    #[must_use]
    pub fn design_matrix(&self) -> &Matrix<f64> {
        &self.x
    }

    /// Labels.
    #[must_use]
    pub fn labels(&self) -> &[f64] {
        &self.y
    }

    /// Number of raw features, without the intercept column.
    #[must_use]
    pub fn n_raw_features(&self) -> usize {
        self.n_raw_features
    }

    /// Variable and constraint counts.
    #[must_use]
    pub fn stats(&self) -> ModelStats {
        let mut by_family: BTreeMap<ConstraintFamily, usize> =
            ConstraintFamily::ALL.iter().map(|&f| (f, 0)).collect();
        for &family in &self.families {
            *by_family.entry(family).or_insert(0) += 1;
        }
        let n_binaries = self.model.n_binaries();
        ModelStats {
            n_variables: self.model.n_variables(),
            n_binaries,
            n_continuous: self.model.n_variables() - n_binaries,
            n_constraints: self.model.n_constraints(),
            n_quadratic: self.model.n_quadratic_constraints(),
            by_family,
        }
    }

    /// Solves the model and extracts the tree if the solver found any
    /// assignment. Non-optimal statuses are reported, not turned into errors.
    ///
    /// # Errors
    ///
    /// Returns solver failures and extraction errors.
    pub fn solve<S: Solver + ?Sized>(&self, solver: &mut S) -> Result<OctOutcome> {
        let outcome = solver.solve(&self.model)?;
        let fit = match &outcome.solution {
            Some(solution) => Some(self.extract(solution)?),
            None => None,
        };
        if !outcome.status.is_optimal() {
            tracing::warn!(solver = solver.name(), status = %outcome.status, "solve did not prove optimality");
        }
        Ok(OctOutcome {
            status: outcome.status,
            fit,
            elapsed: outcome.elapsed,
        })
    }

    /// Reads the tree, routing and slacks out of a solver assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the solution belongs to another model or some
    /// sample is not routed to exactly one node of a layer.
    pub fn extract(&self, solution: &Solution) -> Result<FitReport> {
        if solution.values().len() != self.model.n_variables() {
            return Err(OctError::dimension_mismatch(
                "solution values",
                self.model.n_variables(),
                solution.values().len(),
            ));
        }

        let nodes = self
            .topology
            .nodes()
            .map(|t| {
                let w: Vec<f64> = self.vars.weights(t).iter().map(|&v| solution.value(v)).collect();
                let intercept = if self.config.fit_intercept {
                    w[self.n_raw_features]
                } else {
                    0.0
                };
                NodeHyperplane::new(w[..self.n_raw_features].to_vec(), intercept)
            })
            .collect();
        let tree = SvmTree::new(self.topology, nodes)?;

        let complexity: Vec<f64> = self.vars.d.iter().map(|&v| solution.value(v)).collect();
        let active_nodes = self
            .topology
            .nodes()
            .filter(|&t| complexity[t] > ACTIVE_TOLERANCE)
            .collect();

        let n_samples = self.y.len();
        let mut routing = Vec::with_capacity(n_samples);
        for i in 0..n_samples {
            let mut path = Vec::with_capacity(self.topology.n_layers());
            for (l, layer) in self.topology.layers().enumerate() {
                let mut routed = layer.filter(|&t| solution.value(self.vars.z.at(i, t)) > BINARY_THRESHOLD);
                match (routed.next(), routed.next()) {
                    (Some(t), None) => path.push(t),
                    _ => {
                        return Err(OctError::Solver(format!(
                            "sample {i} is not routed to exactly one node of layer {l}"
                        )))
                    }
                }
            }
            routing.push(path);
        }

        let slacks: Vec<Vec<f64>> = (0..n_samples)
            .map(|i| {
                self.topology
                    .nodes()
                    .map(|t| solution.value(self.vars.e.at(i, t)))
                    .collect()
            })
            .collect();
        let gating_activations = (0..n_samples)
            .flat_map(|i| self.topology.nodes().map(move |t| (i, t)))
            .filter(|&(i, t)| solution.value(self.vars.xi.at(i, t)) > BINARY_THRESHOLD)
            .count();

        let report = FitReport {
            tree,
            routing,
            slacks,
            complexity,
            active_nodes,
            gating_activations,
            margin: solution.value(self.vars.delta),
            objective: solution.objective(),
        };
        tracing::debug!(
            objective = report.objective,
            margin = report.margin,
            active_nodes = ?report.active_nodes,
            gating_activations,
            "extracted tree"
        );
        Ok(report)
    }

    /// Builds the assignment a candidate tree induces on this model.
    ///
    /// Samples are routed by the tree's sign rule, gating stays off, every
    /// slack is the smallest value satisfying its routed margin, and `d` and
    /// `delta` are the smallest values the norm constraints allow. The result
    /// is feasible whenever `M` dominates the tree's hyperplane values, which
    /// makes it a warm start or a reference point for a solver's answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree has another shape, another feature
    /// count, or an intercept while the model fits none.
    pub fn assignment_for(&self, tree: &SvmTree) -> Result<Solution> {
        if tree.topology() != self.topology {
            return Err(OctError::dimension_mismatch(
                "tree nodes",
                self.topology.n_nodes(),
                tree.topology().n_nodes(),
            ));
        }
        if tree.n_features() != self.n_raw_features {
            return Err(OctError::dimension_mismatch(
                "hyperplane weights",
                self.n_raw_features,
                tree.n_features(),
            ));
        }
        if !self.config.fit_intercept && tree.nodes().iter().any(|n| n.intercept != 0.0) {
            return Err(OctError::validation(
                "tree has intercepts but the model was built without an intercept column",
            ));
        }

        let mut values = vec![0.0; self.model.n_variables()];
        for t in self.topology.nodes() {
            let node = tree.node(t);
            for (&v, &w) in self.vars.weights(t).iter().zip(&node.weights) {
                values[v.index()] = w;
            }
            if self.config.fit_intercept {
                values[self.vars.weights(t)[self.n_raw_features].index()] = node.intercept;
            }
        }

        for (i, row) in self.x.rows().enumerate() {
            let row = &row[..self.n_raw_features];
            let y = self.y[i];
            let path = tree.route(row);
            for t in self.topology.nodes() {
                let score = tree.node(t).evaluate(row);
                if score >= 0.0 {
                    values[self.vars.theta.at(i, t).index()] = 1.0;
                }
            }
            for &t in &path {
                values[self.vars.z.at(i, t).index()] = 1.0;
                let score = tree.node(t).evaluate(row);
                values[self.vars.e.at(i, t).index()] = (1.0 - y * score).max(0.0);
            }
        }

        // d_t covers every norm in its subtree so complexity never increases downwards
        let mut complexity: Vec<f64> = tree
            .nodes()
            .iter()
            .map(|n| n.squared_norm() / self.config.big_m)
            .collect();
        for t in self.topology.nodes().rev() {
            if let Some((left, right)) = self.topology.children(t) {
                complexity[t] = complexity[t].max(complexity[left]).max(complexity[right]);
            }
        }
        for (t, &d) in complexity.iter().enumerate() {
            values[self.vars.d[t].index()] = d;
        }

        let max_norm = tree.nodes().iter().map(NodeHyperplane::squared_norm).fold(0.0, f64::max);
        values[self.vars.delta.index()] = max_norm / 2.0;

        Solution::new(&self.model, values)
    }
}

/// What a solver run produced.
#[derive(Debug, Clone)]
pub struct OctOutcome {
    /// Termination status as reported by the solver
    pub status: SolveStatus,
    /// Extracted tree, present whenever the solver returned an assignment
    pub fit: Option<FitReport>,
    /// Wall-clock solve time
    pub elapsed: Duration,
}

/// A tree read out of a solution, with the routing that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// Learned hyperplanes
    pub tree: SvmTree,
    /// Node per layer for every sample, root first
    pub routing: Vec<Vec<NodeId>>,
    /// `e_{i,t}` for every sample and node
    pub slacks: Vec<Vec<f64>>,
    /// `d_t` for every node
    pub complexity: Vec<f64>,
    /// Nodes whose complexity indicator is non-zero
    pub active_nodes: Vec<NodeId>,
    /// Number of gating binaries set to one
    pub gating_activations: usize,
    /// Value of `delta`
    pub margin: f64,
    /// Objective value of the assignment
    pub objective: f64,
}

impl FitReport {
    /// Sum of the slacks on the nodes each sample is routed through.
    #[must_use]
    pub fn routed_slack(&self) -> f64 {
        self.routing
            .iter()
            .zip(&self.slacks)
            .map(|(path, slack)| path.iter().map(|&t| slack[t]).sum::<f64>())
            .sum()
    }

    /// Leaf-layer node each sample ends in.
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeId> {
        self.routing.iter().filter_map(|path| path.last().copied()).collect()
    }

    /// Rebuilds the tree through [`SvmTree::new`] and checks that routing,
    /// slacks and complexity agree with its topology.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed tree or any shape mismatch.
    pub fn checked(self) -> Result<Self> {
        let topology = TreeTopology::new(self.tree.topology().depth())?;
        let tree = SvmTree::new(topology, self.tree.nodes().to_vec())?;
        let n_nodes = topology.n_nodes();
        if self.slacks.len() != self.routing.len() {
            return Err(OctError::dimension_mismatch(
                "slack rows",
                self.routing.len(),
                self.slacks.len(),
            ));
        }
        for (path, slack) in self.routing.iter().zip(&self.slacks) {
            if path.len() != topology.n_layers() {
                return Err(OctError::dimension_mismatch(
                    "routing path",
                    topology.n_layers(),
                    path.len(),
                ));
            }
            if slack.len() != n_nodes {
                return Err(OctError::dimension_mismatch("slack row", n_nodes, slack.len()));
            }
        }
        if self.complexity.len() != n_nodes {
            return Err(OctError::dimension_mismatch(
                "complexity indicators",
                n_nodes,
                self.complexity.len(),
            ));
        }
        if let Some(&t) = self
            .routing
            .iter()
            .flatten()
            .chain(&self.active_nodes)
            .find(|&&t| t >= n_nodes)
        {
            return Err(OctError::validation(format!(
                "node {t} outside a tree of {n_nodes} nodes"
            )));
        }
        Ok(Self { tree, ..self })
    }
}

#[cfg(test)]
mod tests;
