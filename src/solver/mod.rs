//! SVM solver implementations
//!
//! This module implements the Sequential Minimal Optimization (SMO) algorithm
//! with second-order working set selection, as popularized by LIBSVM.

pub mod qmatrix;
pub mod smo;

pub use self::qmatrix::*;
pub use self::smo::*;
