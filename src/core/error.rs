//! Error types for SVM implementation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SVMError {
    #[error("Malformed training data: {0}")]
    ShapeError(String),

    #[error("Unsupported kernel: {0}")]
    UnsupportedKernel(String),

    /// Soft failure: the solver hit its iteration cap and the best-effort
    /// model was still committed.
    #[error("Optimization did not converge within {iterations} iterations")]
    ConvergenceError { iterations: usize },

    #[error("Invalid model document: {0}")]
    FormatError(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model not trained")]
    ModelNotTrained,

    #[error("{metric} requires a {expected} model")]
    WrongModelType {
        metric: &'static str,
        expected: &'static str,
    },

    #[error("A training run is already in progress on this SVM")]
    ConcurrentTraining,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SVMError {
    /// Whether the error still left a usable model behind
    pub fn is_soft(&self) -> bool {
        matches!(self, SVMError::ConvergenceError { .. })
    }
}

pub type Result<T> = std::result::Result<T, SVMError>;
