//! Estimator-style wrapper around build, solve and extraction.

use super::{Dataset, FitReport, OctModel, OctSvmConfig};
use crate::error::{OctError, Result};
use crate::primitives::Matrix;
use crate::solver::{SolveStatus, Solver};
use crate::tree::SvmTree;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Optimal classification tree with SVM splits.
///
/// # Examples
///
/// ```no_run
/// use octsvm::oct::{OctSvmClassifier, OctSvmConfig};
/// use octsvm::primitives::Matrix;
/// use octsvm::solver::ScipSolver;
///
/// let x = Matrix::from_rows(&[[0.0, 0.0], [0.0, 1.0], [5.0, 0.0], [5.0, 1.0]])
///     .expect("equal rows");
/// let y = [-1.0, -1.0, 1.0, 1.0];
///
/// let mut clf = OctSvmClassifier::new(OctSvmConfig::new().with_depth(1).with_big_m(100.0));
/// let status = clf.fit(&x, &y, &mut ScipSolver::new()).expect("scip runs");
/// assert!(status.is_optimal());
/// assert_eq!(clf.predict(&x).expect("fitted"), y);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OctSvmClassifier {
    config: OctSvmConfig,
    fit: Option<FitReport>,
    #[serde(default)]
    status: Option<SolveStatus>,
}

impl Default for OctSvmClassifier {
    fn default() -> Self {
        Self::new(OctSvmConfig::default())
    }
}

impl OctSvmClassifier {
    /// Creates an unfitted classifier.
    #[must_use]
    pub fn new(config: OctSvmConfig) -> Self {
        Self {
            config,
            fit: None,
            status: None,
        }
    }

    /// Configuration used by [`OctSvmClassifier::fit`].
    #[must_use]
    pub fn config(&self) -> &OctSvmConfig {
        &self.config
    }

    /// Builds the model for `(x, y)`, solves it and keeps the best tree the
    /// solver returned.
    ///
    /// A non-optimal status is returned as-is; when the solver still handed
    /// back an assignment (time limit with an incumbent), that tree is kept.
    ///
    /// # Errors
    ///
    /// Returns validation errors for bad data or configuration, and any
    /// solver or extraction failure.
    pub fn fit<S: Solver + ?Sized>(
        &mut self,
        x: &Matrix<f64>,
        y: &[f64],
        solver: &mut S,
    ) -> Result<SolveStatus> {
        let data = Dataset::new(x.clone(), y.to_vec())?;
        let oct = OctModel::build(&data, &self.config)?;
        let outcome = oct.solve(solver)?;
        self.status = Some(outcome.status);
        self.fit = outcome.fit;
        Ok(outcome.status)
    }

    /// Whether a tree is available for prediction.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fit.is_some()
    }

    /// Status of the last solve.
    #[must_use]
    pub fn status(&self) -> Option<SolveStatus> {
        self.status
    }

    /// Full report of the last solve that produced an assignment.
    #[must_use]
    pub fn report(&self) -> Option<&FitReport> {
        self.fit.as_ref()
    }

    /// The learned tree.
    ///
    /// # Errors
    ///
    /// Returns [`OctError::NotFitted`] before a successful fit.
    pub fn tree(&self) -> Result<&SvmTree> {
        self.fit.as_ref().map(|f| &f.tree).ok_or(OctError::NotFitted)
    }

    /// Predicted labels in `{-1, +1}`.
    ///
    /// # Errors
    ///
    /// Returns an error before fitting or on a feature count mismatch.
    pub fn predict(&self, x: &Matrix<f64>) -> Result<Vec<f64>> {
        self.tree()?.predict(x)
    }

    /// Accuracy on `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns an error before fitting or on a shape mismatch.
    pub fn score(&self, x: &Matrix<f64>, y: &[f64]) -> Result<f64> {
        self.tree()?.score(x, y)
    }

    /// Saves configuration and fitted state as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Loads a classifier saved with [`OctSvmClassifier::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if reading or parsing fails, if the configuration is
    /// invalid, or if the stored tree does not match its depth and routing.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut clf: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        clf.config.validate()?;
        if let Some(fit) = clf.fit.take() {
            let fit = fit.checked()?;
            let depth = fit.tree.topology().depth();
            if depth != clf.config.depth {
                return Err(OctError::validation(format!(
                    "stored tree has depth {depth}, configuration says {}",
                    clf.config.depth
                )));
            }
            clf.fit = Some(fit);
        }
        Ok(clf)
    }
}
