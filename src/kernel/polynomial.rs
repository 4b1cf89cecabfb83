//! Polynomial Kernel Implementation
//!
//! The polynomial kernel is defined as:
//! K(x, y) = (γ * <x, y> + r)^d
//!
//! Where:
//! - γ (gamma): scaling factor for the dot product
//! - r (coef0): independent term in the polynomial
//! - d (degree): degree of the polynomial
//!
//! The degree is stored as a real number so that it can be tuned on a
//! logarithmic grid. Integral degrees are evaluated with `powi`, which keeps
//! negative bases well defined.

use crate::kernel::linear::dot;
use crate::kernel::traits::Kernel;

/// Polynomial kernel with configurable degree, gamma, and coefficient
#[derive(Debug, Clone)]
pub struct PolynomialKernel {
    /// Scaling factor for the dot product
    pub gamma: f64,
    /// Independent term in the polynomial
    pub coef0: f64,
    /// Degree of the polynomial
    pub degree: f64,
}

impl PolynomialKernel {
    /// Creates a new polynomial kernel with the specified parameters
    ///
    /// # Examples
    /// ```
    /// use svmkit::kernel::{Kernel, PolynomialKernel};
    ///
    /// // Quadratic kernel: (x·y + 1)²
    /// let quad_kernel = PolynomialKernel::new(2.0, 1.0, 1.0);
    /// assert_eq!(quad_kernel.compute(&[1.0, 1.0], &[1.0, 0.0]), 4.0);
    /// ```
    pub fn new(degree: f64, gamma: f64, coef0: f64) -> Self {
        Self {
            gamma,
            coef0,
            degree,
        }
    }

    /// Creates a quadratic kernel: (γ * <x,y> + 1)²
    pub fn quadratic(gamma: f64) -> Self {
        Self::new(2.0, gamma, 1.0)
    }
}

impl Kernel for PolynomialKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        let base = self.gamma * dot(x, y) + self.coef0;
        if self.degree.fract() == 0.0 && self.degree.abs() <= i32::MAX as f64 {
            base.powi(self.degree as i32)
        } else {
            base.powf(self.degree)
        }
    }
}
