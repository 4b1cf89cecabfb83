//! RBF (Radial Basis Function) kernel implementation
//!
//! The RBF kernel is defined as: K(x, y) = exp(-γ * ||x - y||²)
//! where γ (gamma) is a hyperparameter that controls the kernel width.

use crate::kernel::linear::dot;
use crate::kernel::Kernel;

/// RBF (Radial Basis Function) kernel: K(x, y) = exp(-γ * ||x - y||²)
///
/// This is one of the most popular kernels for non-linear classification.
/// The gamma parameter controls the "reach" of each training example:
/// - High gamma: close points have high influence (potential overfitting)
/// - Low gamma: distant points have influence (potential underfitting)
#[derive(Debug, Clone, Copy)]
pub struct RBFKernel {
    gamma: f64,
}

impl RBFKernel {
    /// Create a new RBF kernel with specified gamma parameter
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }

    /// Create RBF kernel with gamma = 1.0 / n_features
    pub fn with_auto_gamma(n_features: usize) -> Self {
        Self::new(1.0 / n_features.max(1) as f64)
    }

    /// Get the gamma parameter
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Default for RBFKernel {
    /// Default RBF kernel with gamma = 1.0
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        let squared_distance: f64 = x
            .iter()
            .zip(y)
            .map(|(a, b)| {
                let diff = a - b;
                diff * diff
            })
            .sum();
        (-self.gamma * squared_distance).exp()
    }

    fn compute_with_norms(&self, x: &[f64], y: &[f64], x_norm_sq: f64, y_norm_sq: f64) -> f64 {
        // ||x - y||² = ||x||² + ||y||² - 2*x^T*y
        let squared_distance = x_norm_sq + y_norm_sq - 2.0 * dot(x, y);

        // Ensure non-negative distance due to numerical precision
        let squared_distance = squared_distance.max(0.0);

        (-self.gamma * squared_distance).exp()
    }
}
