//! Sigmoid (Tanh) Kernel Implementation
//!
//! K(x, y) = tanh(γ * <x, y> + r)
//!
//! The kernel is not positive semi-definite for every (γ, r); the solver
//! handles the resulting non-convex pair updates by clamping the curvature.

use crate::kernel::linear::dot;
use crate::kernel::traits::Kernel;

/// Sigmoid (Hyperbolic Tangent) kernel for non-linear classification
#[derive(Debug, Clone)]
pub struct SigmoidKernel {
    /// Scaling parameter for the dot product
    pub gamma: f64,
    /// Bias/offset parameter (can be positive, negative, or zero)
    pub coef0: f64,
}

impl SigmoidKernel {
    pub fn new(gamma: f64, coef0: f64) -> Self {
        Self { gamma, coef0 }
    }
}

impl Kernel for SigmoidKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        (self.gamma * dot(x, y) + self.coef0).tanh()
    }
}
