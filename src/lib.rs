//! Rust implementation of Support Vector Machines
//!
//! Training, hyperparameter search, persistence and inference for C-SVC,
//! ν-SVC, one-class SVM, ε-SVR and ν-SVR, solved with an SMO solver using
//! second-order working set selection.

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod model;
pub mod optimizer;
pub mod persistence;
pub mod search;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::{ModelInfo, TrainingHandle, SVM};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::error::{Result, SVMError};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::{CSVDataset, SampleMatrix, TrainingData};
pub use crate::kernel::{Kernel, LinearKernel, RBFKernel};
pub use crate::model::{DecisionFunction, Model};
pub use crate::optimizer::SVMOptimizer;
pub use crate::search::{GridSearch, ParamGrid, SearchConfig, SearchParam};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
