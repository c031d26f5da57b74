//! Objective of the formulation.

use super::config::OctSvmConfig;
use super::variables::OctVariables;
use crate::model::LinearExpr;

/// `delta + c1·Σ e + c2·Σ xi + c3·Σ d`, minimized.
#[must_use]
pub fn objective(vars: &OctVariables, config: &OctSvmConfig) -> LinearExpr {
    let mut expr = LinearExpr::from(vars.delta);
    for i in 0..vars.n_samples() {
        for t in 0..vars.n_nodes() {
            expr.add_term(vars.e.at(i, t), config.slack_penalty);
        }
    }
    for i in 0..vars.n_samples() {
        for t in 0..vars.n_nodes() {
            expr.add_term(vars.xi.at(i, t), config.gating_penalty);
        }
    }
    for &d in &vars.d {
        expr.add_term(d, config.complexity_penalty);
    }
    expr
}
