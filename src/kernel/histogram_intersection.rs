//! Histogram Intersection Kernel Implementation
//!
//! The Histogram Intersection kernel is defined as:
//! K(x, y) = Σᵢ min(xᵢ, yᵢ)
//!
//! This kernel measures the overlap between two histograms, making it intuitive and
//! highly effective for histogram data where the "intersection" represents similarity.
//! It has no hyperparameters.

use crate::kernel::traits::Kernel;

/// Histogram Intersection kernel
#[derive(Debug, Clone, Copy, Default)]
pub struct HistogramIntersectionKernel;

impl HistogramIntersectionKernel {
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for HistogramIntersectionKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        x.iter().zip(y).map(|(a, b)| a.min(*b)).sum()
    }
}
