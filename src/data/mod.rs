//! Training data containers and loaders
//!
//! [`SampleMatrix`] is the validated dense representation every other
//! component consumes; [`TrainingData`] is the shared, replaceable handle the
//! SVM trains from; [`CSVDataset`] reads samples from disk.

pub mod csv;
pub mod matrix;
pub mod training_data;

pub use self::csv::*;
pub use self::matrix::*;
pub use self::training_data::*;
