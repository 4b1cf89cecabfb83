//! Kernel functions for SVM

pub mod chi_square;
pub mod histogram_intersection;
pub mod linear;
pub mod polynomial;
pub mod rbf;
pub mod sigmoid;
pub mod traits;

pub use self::chi_square::*;
pub use self::histogram_intersection::*;
pub use self::linear::LinearKernel;
pub use self::polynomial::*;
pub use self::rbf::*;
pub use self::sigmoid::*;
pub use self::traits::*;

use crate::core::{Hyperparameters, KernelType, Result, SVMError};
use std::sync::Arc;

/// Build the kernel selected by `params.kernel_type`
///
/// `custom` is only consulted for [`KernelType::Custom`].
pub fn build_kernel(
    params: &Hyperparameters,
    custom: Option<&Arc<dyn Kernel>>,
) -> Result<Arc<dyn Kernel>> {
    let kernel: Arc<dyn Kernel> = match params.kernel_type {
        KernelType::Custom => {
            return custom.cloned().ok_or_else(|| {
                SVMError::UnsupportedKernel(
                    "custom kernel selected but no kernel function was supplied".to_string(),
                )
            })
        }
        KernelType::Linear => Arc::new(LinearKernel::new()),
        KernelType::Polynomial => Arc::new(PolynomialKernel::new(
            params.degree,
            params.gamma,
            params.coef0,
        )),
        KernelType::Rbf => Arc::new(RBFKernel::new(params.gamma)),
        KernelType::Sigmoid => Arc::new(SigmoidKernel::new(params.gamma, params.coef0)),
        KernelType::Chi2 => Arc::new(ChiSquareKernel::new(params.gamma)),
        KernelType::Intersection => Arc::new(HistogramIntersectionKernel::new()),
    };
    Ok(kernel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_build_kernel_uses_params() {
        let params = Hyperparameters {
            kernel_type: KernelType::Rbf,
            gamma: 0.5,
            ..Hyperparameters::default()
        };
        let kernel = build_kernel(&params, None).expect("rbf builds");
        assert_relative_eq!(
            kernel.compute(&[0.0, 0.0], &[1.0, 1.0]),
            (-1.0f64).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_build_custom_kernel_without_function_fails() {
        let params = Hyperparameters {
            kernel_type: KernelType::Custom,
            ..Hyperparameters::default()
        };
        assert!(matches!(
            build_kernel(&params, None),
            Err(SVMError::UnsupportedKernel(_))
        ));
    }

    #[test]
    fn test_build_custom_kernel_delegates() {
        let params = Hyperparameters {
            kernel_type: KernelType::Custom,
            ..Hyperparameters::default()
        };
        let custom: Arc<dyn Kernel> =
            Arc::new(|x: &[f64], y: &[f64]| -> f64 {
                x.iter().zip(y).map(|(a, b)| (a * b).abs()).sum()
            });
        let kernel = build_kernel(&params, Some(&custom)).expect("custom builds");
        assert_eq!(kernel.compute(&[-1.0, 2.0], &[3.0, -1.0]), 5.0);
    }
}
