//! Linear and quadratic expressions over model variables.

use super::VarId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Affine expression `Σ coef·var + constant`.
///
/// Terms keep insertion order so that two builds of the same model render
/// identically. Repeated variables are allowed; [`LinearExpr::compact`]
/// merges them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    /// The zero expression.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`LinearExpr::add_term`].
    #[must_use]
    pub fn term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    /// Builder form of [`LinearExpr::add_constant`].
    #[must_use]
    pub fn plus(mut self, value: f64) -> Self {
        self.add_constant(value);
        self
    }

    /// Appends `coef·var`. Zero coefficients are dropped.
    pub fn add_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
    }

    /// Adds to the constant part.
    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// Appends every term of `other` scaled by `scale`.
    pub fn add_scaled(&mut self, other: &LinearExpr, scale: f64) {
        for &(var, coef) in &other.terms {
            self.add_term(var, coef * scale);
        }
        self.constant += other.constant * scale;
    }

    /// Variable terms in insertion order.
    #[must_use]
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// Constant part.
    #[must_use]
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Whether the expression has no variable terms.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Merges repeated variables (first occurrence keeps its position) and
    /// drops terms that cancel out.
    #[must_use]
    pub fn compact(&self) -> Self {
        let mut position: HashMap<VarId, usize> = HashMap::with_capacity(self.terms.len());
        let mut merged: Vec<(VarId, f64)> = Vec::with_capacity(self.terms.len());
        for &(var, coef) in &self.terms {
            match position.get(&var) {
                Some(&k) => merged[k].1 += coef,
                None => {
                    position.insert(var, merged.len());
                    merged.push((var, coef));
                }
            }
        }
        merged.retain(|&(_, c)| c != 0.0);
        Self {
            terms: merged,
            constant: self.constant,
        }
    }

    /// Value of the expression for a full assignment indexed by [`VarId`].
    ///
    /// # Panics
    ///
    /// Panics if `values` is shorter than the largest referenced id.
    #[must_use]
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coef)| coef * values[var.index()])
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        Self::new().term(var, 1.0)
    }
}

/// A single quadratic term `coef·a·b`; `a == b` is a square.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadTerm {
    /// First factor
    pub a: VarId,
    /// Second factor
    pub b: VarId,
    /// Coefficient
    pub coef: f64,
}

impl QuadTerm {
    /// `coef·var²`
    #[must_use]
    pub fn square(var: VarId, coef: f64) -> Self {
        Self { a: var, b: var, coef }
    }

    /// `coef·a·b`
    #[must_use]
    pub fn product(a: VarId, b: VarId, coef: f64) -> Self {
        Self { a, b, coef }
    }

    /// Whether the term is a square of one variable.
    #[must_use]
    pub fn is_square(&self) -> bool {
        self.a == self.b
    }

    /// Value of the term for a full assignment.
    #[must_use]
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.coef * values[self.a.index()] * values[self.b.index()]
    }
}
