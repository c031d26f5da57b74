//! Core compute primitives.
//!
//! The feature matrix is the only dense numeric container the formulation
//! needs; everything else is addressed through typed index grids.

mod matrix;

pub use matrix::Matrix;
