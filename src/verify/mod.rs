//! Post-hoc checks of a solver answer.
//!
//! Solvers work with their own tolerances and an undersized big-M silently
//! weakens the gated constraints, so a reported optimum is re-evaluated
//! here against the exact model:
//!
//! - [`check_feasibility`] / [`check_oct`]: every constraint and domain
//! - [`big_m_diagnostics`]: places where `M` stops dominating the values

mod report;

pub use report::{ConstraintViolation, DomainViolation, FeasibilityReport};

use crate::error::{OctError, Result};
use crate::model::Model;
use crate::oct::{ConstraintFamily, OctModel};
use crate::solver::Solution;
use crate::tree::NodeId;

/// Absolute tolerance used when none is given.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Evaluates every constraint and variable domain of `model` at `values`.
///
/// # Errors
///
/// Returns an error if `values` does not hold one value per variable.
pub fn check_feasibility(model: &Model, values: &[f64], tol: f64) -> Result<FeasibilityReport> {
    check(model, values, tol, |_| None)
}

/// [`check_feasibility`] with the constraint families of an OCT-SVM model
/// attached to each violation.
///
/// # Errors
///
/// Returns an error if the solution belongs to another model.
pub fn check_oct(oct: &OctModel, solution: &Solution, tol: f64) -> Result<FeasibilityReport> {
    let families = oct.families();
    let report = check(oct.model(), solution.values(), tol, |k| families.get(k).copied())?;
    if !report.is_feasible() {
        tracing::warn!(
            violated = report.constraint_violations().len(),
            max_violation = report.max_violation(),
            by_family = ?report.violations_by_family(),
            "solution violates the model"
        );
    }
    Ok(report)
}

fn check(
    model: &Model,
    values: &[f64],
    tol: f64,
    family: impl Fn(usize) -> Option<ConstraintFamily>,
) -> Result<FeasibilityReport> {
    if values.len() != model.n_variables() {
        return Err(OctError::dimension_mismatch(
            "assignment values",
            model.n_variables(),
            values.len(),
        ));
    }
    let mut report = FeasibilityReport::new(tol, model.n_constraints());
    for (index, (variable, &value)) in model.variables().iter().zip(values).enumerate() {
        let amount = variable.domain_violation(value);
        if amount > tol || value.is_nan() {
            report.add_domain(DomainViolation {
                index,
                name: variable.name.clone(),
                value,
                amount,
            });
        }
    }
    for (index, constraint) in model.constraints().iter().enumerate() {
        let amount = constraint.violation(values);
        if amount > tol || amount.is_nan() {
            report.add_constraint(ConstraintViolation {
                index,
                name: constraint.name.clone(),
                family: family(index),
                amount,
            });
        }
    }
    Ok(report)
}

/// A value the big-M constant fails to dominate.
#[derive(Debug, Clone, PartialEq)]
pub enum BigMIssue {
    /// `|w_t·x_i| >= M - 1`: an unrouted margin or a sign indicator can
    /// no longer be relaxed.
    Hyperplane {
        /// Sample index
        sample: usize,
        /// Node index
        node: NodeId,
        /// `w_t·x_i`, intercept included
        value: f64,
    },
    /// `|w_tj| >= M`: the linearized product is clipped.
    Weight {
        /// Node index
        node: NodeId,
        /// Column index, intercept column last
        feature: usize,
        /// `w_tj`
        value: f64,
    },
    /// `‖w_t‖² >= M`: the complexity indicator exceeds one.
    Norm {
        /// Node index
        node: NodeId,
        /// `‖w_t‖²`
        value: f64,
    },
}

/// Lists every place where the solution reaches the big-M constant.
///
/// An empty list means every big-M gate of the model was exact at this
/// solution.
#[must_use]
pub fn big_m_diagnostics(oct: &OctModel, solution: &Solution) -> Vec<BigMIssue> {
    let big_m = oct.config().big_m;
    let vars = oct.variables();
    let x = oct.design_matrix();
    let mut issues = Vec::new();

    for t in oct.topology().nodes() {
        let w: Vec<f64> = vars.weights(t).iter().map(|&v| solution.value(v)).collect();
        for (feature, &value) in w.iter().enumerate() {
            if value.abs() >= big_m {
                issues.push(BigMIssue::Weight { node: t, feature, value });
            }
        }
        let norm: f64 = w[..oct.n_raw_features()].iter().map(|v| v * v).sum();
        if norm >= big_m {
            issues.push(BigMIssue::Norm { node: t, value: norm });
        }
        for sample in 0..x.n_rows() {
            let value = x.row_dot(sample, &w);
            if value.abs() >= big_m - 1.0 {
                issues.push(BigMIssue::Hyperplane { sample, node: t, value });
            }
        }
    }

    if !issues.is_empty() {
        tracing::warn!(
            big_m,
            issues = issues.len(),
            "big-M does not dominate the solution; gated constraints may be weakened"
        );
    }
    issues
}
