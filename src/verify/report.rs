//! Feasibility report and its text rendering.

use crate::oct::ConstraintFamily;
use std::collections::BTreeMap;
use std::fmt::Write;

/// A constraint the assignment does not satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    /// Position in [`crate::model::Model::constraints`]
    pub index: usize,
    /// Constraint name
    pub name: String,
    /// Family, when the model came from the OCT-SVM builder
    pub family: Option<ConstraintFamily>,
    /// Amount by which the constraint is violated
    pub amount: f64,
}

/// A variable whose value leaves its bounds or is fractional while binary.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainViolation {
    /// Position in [`crate::model::Model::variables`]
    pub index: usize,
    /// Variable name
    pub name: String,
    /// Offending value
    pub value: f64,
    /// Distance to the domain
    pub amount: f64,
}

/// Result of checking one assignment against one model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeasibilityReport {
    tolerance: f64,
    n_checked: usize,
    constraints: Vec<ConstraintViolation>,
    domains: Vec<DomainViolation>,
}

impl FeasibilityReport {
    pub(crate) fn new(tolerance: f64, n_checked: usize) -> Self {
        Self {
            tolerance,
            n_checked,
            constraints: Vec::new(),
            domains: Vec::new(),
        }
    }

    pub(crate) fn add_constraint(&mut self, violation: ConstraintViolation) {
        self.constraints.push(violation);
    }

    pub(crate) fn add_domain(&mut self, violation: DomainViolation) {
        self.domains.push(violation);
    }

    /// Tolerance the check ran with.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Whether nothing was violated beyond the tolerance.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.constraints.is_empty() && self.domains.is_empty()
    }

    /// Violated constraints in model order.
    #[must_use]
    pub fn constraint_violations(&self) -> &[ConstraintViolation] {
        &self.constraints
    }

    /// Variables outside their domain in model order.
    #[must_use]
    pub fn domain_violations(&self) -> &[DomainViolation] {
        &self.domains
    }

    /// Largest violation of any kind, zero when feasible.
    #[must_use]
    pub fn max_violation(&self) -> f64 {
        self.constraints
            .iter()
            .map(|v| v.amount)
            .chain(self.domains.iter().map(|v| v.amount))
            .fold(0.0, f64::max)
    }

    /// Number of violated constraints per family.
    #[must_use]
    pub fn violations_by_family(&self) -> BTreeMap<ConstraintFamily, usize> {
        let mut counts = BTreeMap::new();
        for family in self.constraints.iter().filter_map(|v| v.family) {
            *counts.entry(family).or_insert(0) += 1;
        }
        counts
    }

    /// Generate a summary line.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_feasible() {
            format!(
                "✓ feasible: {} constraints within {:e}",
                self.n_checked, self.tolerance
            )
        } else {
            format!(
                "✗ infeasible: {} of {} constraints violated, {} domain violations, max {:.3e}",
                self.constraints.len(),
                self.n_checked,
                self.domains.len(),
                self.max_violation()
            )
        }
    }

    /// Render the report as a plain-text table of the worst offenders.
    #[must_use]
    pub fn render(&self, limit: usize) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "{}", self.summary());
        if self.is_feasible() {
            return output;
        }

        let mut worst: Vec<&ConstraintViolation> = self.constraints.iter().collect();
        worst.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        if !worst.is_empty() {
            let _ = writeln!(output, "  {:<40} {:<24} {:>12}", "constraint", "family", "violation");
            for v in worst.into_iter().take(limit) {
                let family = v.family.map_or("-", |f| f.as_str());
                let _ = writeln!(output, "  {:<40} {:<24} {:>12.3e}", v.name, family, v.amount);
            }
        }
        for v in self.domains.iter().take(limit) {
            let _ = writeln!(output, "  domain {:<33} value {:>12.6}", v.name, v.value);
        }
        output
    }
}
