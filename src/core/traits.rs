//! Core traits for SVM implementation

use crate::core::Prediction;

/// Dataset abstraction for efficient data access
pub trait Dataset: Send + Sync {
    /// Number of samples in the dataset
    fn len(&self) -> usize;

    /// Number of features (dimensionality)
    fn dim(&self) -> usize;

    /// Feature vector of a single sample
    ///
    /// # Panics
    /// Panics if index >= len()
    fn row(&self, i: usize) -> &[f64];

    /// Label (class or regression target) of a single sample
    ///
    /// # Panics
    /// Panics if index >= len()
    fn label(&self, i: usize) -> f64;

    /// Get all labels as a vector
    fn get_labels(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.label(i)).collect()
    }

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trained SVM model
pub trait SVMModel: Send + Sync {
    /// Predict a single feature vector
    ///
    /// The caller is responsible for matching the model's dimensionality.
    fn predict(&self, x: &[f64]) -> Prediction;

    /// Predict multiple feature vectors
    fn predict_batch(&self, xs: &[&[f64]]) -> Vec<Prediction> {
        xs.iter().map(|x| self.predict(x)).collect()
    }

    /// Get the number of support vectors
    fn n_support_vectors(&self) -> usize;

    /// Number of features the model was fitted on
    fn n_features(&self) -> usize;
}
