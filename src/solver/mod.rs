//! Boundary to external optimization engines.
//!
//! A [`Solver`] consumes a finished [`Model`] in one blocking call and
//! reports a terminal [`SolveStatus`] together with the best assignment it
//! holds, if any. Backends:
//! - [`ScipSolver`]: runs the `scip` executable on an LP file
//! - [`lp_format`]: CPLEX LP writer usable with any LP-reading solver

pub mod lp_format;
mod scip;

pub use scip::ScipSolver;

use crate::error::{OctError, Result};
use crate::model::{Model, VarId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Terminal outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// No feasible assignment exists.
    Infeasible,
    /// The objective can decrease without bound.
    Unbounded,
    /// The solver proved one of the previous two without telling which.
    InfeasibleOrUnbounded,
    /// The time limit stopped the search.
    TimeLimitReached,
    /// The configured relative gap stopped the search before optimality
    /// was proven.
    GapLimitReached,
    /// Any other limit or interruption stopped the search.
    Interrupted,
}

impl SolveStatus {
    /// Whether the status proves optimality.
    #[must_use]
    pub fn is_optimal(&self) -> bool {
        matches!(self, Self::Optimal)
    }

    /// Get string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Infeasible => "infeasible",
            Self::Unbounded => "unbounded",
            Self::InfeasibleOrUnbounded => "infeasible or unbounded",
            Self::TimeLimitReached => "time limit reached",
            Self::GapLimitReached => "gap limit reached",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A full assignment, one value per model variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    values: Vec<f64>,
    objective: f64,
}

impl Solution {
    /// Wraps values indexed by [`VarId::index`] and computes the objective.
    ///
    /// # Errors
    ///
    /// Returns an error if the value count differs from the variable count.
    pub fn new(model: &Model, values: Vec<f64>) -> Result<Self> {
        if values.len() != model.n_variables() {
            return Err(OctError::dimension_mismatch(
                "solution values",
                model.n_variables(),
                values.len(),
            ));
        }
        let objective = model.objective_value(&values);
        Ok(Self { values, objective })
    }

    /// Value of one variable.
    #[must_use]
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }

    /// Values indexed by [`VarId::index`].
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Objective value of the assignment.
    #[must_use]
    pub fn objective(&self) -> f64 {
        self.objective
    }
}

/// Status plus the assignment the solver ended with.
///
/// `solution` is always present for [`SolveStatus::Optimal`] and may be
/// present (best found so far) for limit statuses.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    /// Terminal status
    pub status: SolveStatus,
    /// Best assignment, if the solver reported one
    pub solution: Option<Solution>,
    /// Wall-clock time spent in the solver
    pub elapsed: Duration,
}

impl SolveOutcome {
    /// The solution of an optimal solve.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the status if the solve was not optimal.
    pub fn into_optimal(self) -> Result<Solution> {
        match (self.status, self.solution) {
            (SolveStatus::Optimal, Some(solution)) => Ok(solution),
            (status, _) => Err(OctError::Solver(format!(
                "no optimal solution: solver status is {status}"
            ))),
        }
    }
}

/// Limits passed through to the solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Wall-clock limit
    pub time_limit: Option<Duration>,
    /// Relative MIP gap at which the search stops
    pub mip_gap: Option<f64>,
    /// Thread count hint
    pub threads: Option<usize>,
}

impl SolverOptions {
    /// No limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wall-clock limit.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Sets the relative MIP gap.
    #[must_use]
    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_gap = Some(gap);
        self
    }

    /// Sets the thread count hint.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}

/// An optimization engine.
pub trait Solver {
    /// Optimizes `model` (minimization) and blocks until a terminal status.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine could not run or its output could not
    /// be read. Infeasibility and limits are statuses, not errors.
    fn solve(&mut self, model: &Model) -> Result<SolveOutcome>;

    /// Get solver name
    fn name(&self) -> &'static str;
}
