//! Kernel trait definition

/// Kernel function trait
///
/// A kernel function K(x, y) must satisfy Mercer's condition to be valid for SVM.
/// This trait provides the interface for different kernel implementations and
/// is also the extension point for user-supplied (custom) kernels.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    ///
    /// Both slices have the same length.
    fn compute(&self, x: &[f64], y: &[f64]) -> f64;

    /// Optional: compute kernel value using precomputed squared norms
    /// This can be more efficient for some kernels (e.g., RBF)
    fn compute_with_norms(&self, x: &[f64], y: &[f64], x_norm_sq: f64, y_norm_sq: f64) -> f64 {
        // Default implementation ignores the norms
        let _ = (x_norm_sq, y_norm_sq);
        self.compute(x, y)
    }
}

impl<F> Kernel for F
where
    F: Fn(&[f64], &[f64]) -> f64 + Send + Sync,
{
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        self(x, y)
    }
}
