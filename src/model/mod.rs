//! Solver-independent optimization model container.
//!
//! A [`Model`] owns variables with domains and bounds, linear and quadratic
//! constraints, and a linear objective that is always minimized. It is the
//! unit handed to a [`crate::solver::Solver`]. The container knows nothing
//! about trees or SVMs; the formulation in [`crate::oct`] fills it.
//!
//! # Example
//!
//! ```
//! use octsvm::model::{Constraint, LinearExpr, Model, Sense, Variable};
//!
//! let mut model = Model::new("toy");
//! let x = model.add_variable(Variable::non_negative("x"));
//! let y = model.add_variable(Variable::binary("y"));
//! model.add_constraint(Constraint::linear(
//!     "link",
//!     LinearExpr::new().term(x, 1.0).term(y, -10.0),
//!     Sense::LessEqual,
//!     0.0,
//! ));
//! model.set_objective(LinearExpr::new().term(x, -1.0).term(y, 2.0));
//! assert_eq!(model.n_variables(), 2);
//! assert_eq!(model.n_binaries(), 1);
//! ```

mod expr;

pub use expr::{LinearExpr, QuadTerm};

use serde::{Deserialize, Serialize};

/// Dense identifier of a variable inside one [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(usize);

impl VarId {
    /// Position of the variable in [`Model::variables`].
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Integrality of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarKind {
    /// Real-valued
    Continuous,
    /// Integer restricted to `{0, 1}`
    Binary,
}

/// A decision variable with its domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Solver-facing name, unique within a model
    pub name: String,
    /// Integrality
    pub kind: VarKind,
    /// Lower bound, `-inf` allowed
    pub lower: f64,
    /// Upper bound, `+inf` allowed
    pub upper: f64,
}

impl Variable {
    /// Unbounded continuous variable.
    #[must_use]
    pub fn free(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Continuous,
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    /// Continuous variable with lower bound zero.
    #[must_use]
    pub fn non_negative(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Continuous,
            lower: 0.0,
            upper: f64::INFINITY,
        }
    }

    /// Binary variable.
    #[must_use]
    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Binary,
            lower: 0.0,
            upper: 1.0,
        }
    }

    /// Whether the variable has neither a finite lower nor upper bound.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }

    /// Distance by which `value` leaves the domain (bounds and integrality).
    #[must_use]
    pub fn domain_violation(&self, value: f64) -> f64 {
        let bound = (self.lower - value).max(value - self.upper).max(0.0);
        match self.kind {
            VarKind::Continuous => bound,
            VarKind::Binary => bound.max((value - value.round()).abs()),
        }
    }
}

/// Relation between a constraint's left-hand side and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sense {
    /// `lhs <= rhs`
    LessEqual,
    /// `lhs >= rhs`
    GreaterEqual,
    /// `lhs == rhs`
    Equal,
}

impl Sense {
    /// Operator as written in LP files.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "=",
        }
    }
}

/// `linear + Σ quadratic  (sense)  rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Solver-facing name, unique within a model
    pub name: String,
    /// Affine part of the left-hand side
    pub linear: LinearExpr,
    /// Quadratic part of the left-hand side
    pub quadratic: Vec<QuadTerm>,
    /// Relation
    pub sense: Sense,
    /// Right-hand side
    pub rhs: f64,
}

impl Constraint {
    /// Purely linear constraint.
    #[must_use]
    pub fn linear(name: impl Into<String>, linear: LinearExpr, sense: Sense, rhs: f64) -> Self {
        Self {
            name: name.into(),
            linear,
            quadratic: Vec::new(),
            sense,
            rhs,
        }
    }

    /// Constraint with a quadratic part.
    #[must_use]
    pub fn quadratic(
        name: impl Into<String>,
        quadratic: Vec<QuadTerm>,
        linear: LinearExpr,
        sense: Sense,
        rhs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            linear,
            quadratic,
            sense,
            rhs,
        }
    }

    /// Whether the constraint has quadratic terms.
    #[must_use]
    pub fn is_quadratic(&self) -> bool {
        !self.quadratic.is_empty()
    }

    /// Left-hand side value for a full assignment.
    #[must_use]
    pub fn lhs_value(&self, values: &[f64]) -> f64 {
        self.linear.evaluate(values) + self.quadratic.iter().map(|q| q.evaluate(values)).sum::<f64>()
    }

    /// Amount by which the assignment violates the constraint, zero if satisfied.
    #[must_use]
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.lhs_value(values);
        match self.sense {
            Sense::LessEqual => (lhs - self.rhs).max(0.0),
            Sense::GreaterEqual => (self.rhs - lhs).max(0.0),
            Sense::Equal => (lhs - self.rhs).abs(),
        }
    }
}

/// An owned minimization problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl Model {
    /// Empty model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: LinearExpr::new(),
        }
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a variable and returns its id.
    pub fn add_variable(&mut self, variable: Variable) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(variable);
        id
    }

    /// Adds a constraint and returns its position.
    pub fn add_constraint(&mut self, constraint: Constraint) -> usize {
        self.constraints.push(constraint);
        self.constraints.len() - 1
    }

    /// Replaces the (minimized) objective.
    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    /// Variable by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this model.
    #[must_use]
    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    /// All variables, indexed by [`VarId::index`].
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// All constraints in insertion order.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The minimized objective.
    #[must_use]
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Variable count.
    #[must_use]
    pub fn n_variables(&self) -> usize {
        self.variables.len()
    }

    /// Constraint count.
    #[must_use]
    pub fn n_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Binary variable count.
    #[must_use]
    pub fn n_binaries(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.kind == VarKind::Binary)
            .count()
    }

    /// Quadratic constraint count.
    #[must_use]
    pub fn n_quadratic_constraints(&self) -> usize {
        self.constraints.iter().filter(|c| c.is_quadratic()).count()
    }

    /// Looks a variable up by its solver-facing name.
    #[must_use]
    pub fn find_variable(&self, name: &str) -> Option<VarId> {
        self.variables
            .iter()
            .position(|v| v.name == name)
            .map(VarId)
    }

    /// Objective value for a full assignment.
    #[must_use]
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }
}

#[cfg(test)]
mod tests;
