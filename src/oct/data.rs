//! Validated training data.

use crate::error::{OctError, Result};
use crate::primitives::Matrix;

/// Feature matrix plus ±1 labels, checked once up front.
///
/// # Examples
///
/// ```
/// use octsvm::oct::Dataset;
///
/// let data = Dataset::from_rows(
///     &[[0.0, 0.0], [0.0, 1.0], [5.0, 0.0], [5.0, 1.0]],
///     &[-1.0, -1.0, 1.0, 1.0],
/// ).expect("valid data");
/// assert_eq!(data.n_samples(), 4);
/// assert_eq!(data.n_features(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    x: Matrix<f64>,
    y: Vec<f64>,
}

impl Dataset {
    /// Wraps a feature matrix and labels.
    ///
    /// # Errors
    ///
    /// Fails when there are no samples, no features, the label count does
    /// not match the row count, a label is not `-1`/`+1`, or a feature is
    /// not finite.
    pub fn new(x: Matrix<f64>, y: Vec<f64>) -> Result<Self> {
        let (n_rows, n_cols) = x.shape();
        if n_rows == 0 {
            return Err(OctError::empty_input("training samples"));
        }
        if n_cols == 0 {
            return Err(OctError::empty_input("feature dimension"));
        }
        if y.len() != n_rows {
            return Err(OctError::dimension_mismatch("labels", n_rows, y.len()));
        }
        if let Some(i) = y.iter().position(|&v| v != 1.0 && v != -1.0) {
            return Err(OctError::validation(format!(
                "label {} of sample {i} is not -1 or +1",
                y[i]
            )));
        }
        if !x.is_finite() {
            return Err(OctError::validation("features must be finite"));
        }
        Ok(Self { x, y })
    }

    /// Builds a dataset from per-sample rows.
    ///
    /// # Errors
    ///
    /// Same as [`Dataset::new`], plus ragged rows.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R], labels: &[f64]) -> Result<Self> {
        Self::new(Matrix::from_rows(rows)?, labels.to_vec())
    }

    /// Number of samples `N`.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.x.n_rows()
    }

    /// Number of raw features `p`.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.x.n_cols()
    }

    /// Feature matrix.
    #[must_use]
    pub fn features(&self) -> &Matrix<f64> {
        &self.x
    }

    /// Labels in `{-1, +1}`.
    #[must_use]
    pub fn labels(&self) -> &[f64] {
        &self.y
    }
}
