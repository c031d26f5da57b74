//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use octsvm::prelude::*;
//! ```

pub use crate::error::{OctError, Result};
pub use crate::oct::{
    BilinearEncoding, ConstraintFamily, Dataset, FitReport, OctModel, OctSvmClassifier,
    OctSvmConfig,
};
pub use crate::primitives::Matrix;
pub use crate::solver::{ScipSolver, Solution, SolveStatus, Solver, SolverOptions};
pub use crate::tree::{NodeHyperplane, SvmTree, TreeTopology};
pub use crate::verify::{big_m_diagnostics, check_oct, DEFAULT_TOLERANCE};
