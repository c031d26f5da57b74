//! octsvm: optimal classification trees with SVM splits, as a
//! mixed-integer program.
//!
//! A fixed-depth complete binary tree carries one soft-margin hyperplane
//! per node. Routing, sign and gating binaries tie samples to nodes, and
//! the whole tree is learned by one mixed-integer quadratically
//! constrained program handed to an external solver.
//!
//! # Quick Start
//!
//! ```
//! use octsvm::prelude::*;
//!
//! let data = Dataset::from_rows(
//!     &[[0.0, 0.0], [0.0, 1.0], [5.0, 0.0], [5.0, 1.0]],
//!     &[-1.0, -1.0, 1.0, 1.0],
//! ).expect("valid data");
//! let config = OctSvmConfig::new().with_depth(1).with_big_m(100.0);
//!
//! // Build the formulation and export it for any LP-format solver
//! let oct = OctModel::build(&data, &config).expect("valid inputs");
//! let lp = octsvm::solver::lp_format::to_lp_string(oct.model());
//! assert!(lp.starts_with("\\ Model OCTSVM"));
//!
//! // Check a candidate tree against the exact model
//! let tree = SvmTree::new(oct.topology(), vec![
//!     NodeHyperplane::new(vec![0.4, 0.0], -1.0),
//!     NodeHyperplane::new(vec![0.0, 0.0], -1.0),
//!     NodeHyperplane::new(vec![0.0, 0.0], 1.0),
//! ]).expect("three nodes");
//! let solution = oct.assignment_for(&tree).expect("same shape");
//! let report = check_oct(&oct, &solution, DEFAULT_TOLERANCE).expect("sized");
//! assert!(report.is_feasible());
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Row-major feature matrix
//! - [`tree`]: Breadth-first tree topology and the learned [`tree::SvmTree`]
//! - [`model`]: Solver-independent variables, constraints and objective
//! - [`oct`]: The OCT-SVM formulation, extraction and classifier facade
//! - [`solver`]: Solver trait, LP export and the SCIP adapter
//! - [`verify`]: Feasibility and big-M checks of solver answers
//! - [`error`]: [`OctError`] and the crate [`Result`]

pub mod error;
pub mod model;
pub mod oct;
pub mod prelude;
pub mod primitives;
pub mod solver;
pub mod tree;
pub mod verify;

pub use error::{OctError, Result};
