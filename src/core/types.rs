//! Core type definitions for SVM

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label, or the estimate for regression models
    pub label: f64,
    /// Raw decision function value
    ///
    /// For multi-class models this is the number of pairwise votes won by
    /// the predicted class.
    pub decision_value: f64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: f64, decision_value: f64) -> Self {
        Self {
            label,
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// How nested sample sequences are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleLayout {
    /// Each inner sequence is one sample
    #[default]
    Row,
    /// Each inner sequence is one feature across all samples
    Column,
}

/// Formulation of the SVM problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    /// C-support vector classification
    #[default]
    CSvc,
    /// ν-support vector classification
    NuSvc,
    /// Distribution estimation, all samples treated as one class
    OneClass,
    /// ε-support vector regression
    EpsSvr,
    /// ν-support vector regression
    NuSvr,
}

impl ProblemType {
    /// Whether predictions are class labels rather than continuous estimates
    pub fn is_classifier(self) -> bool {
        matches!(
            self,
            ProblemType::CSvc | ProblemType::NuSvc | ProblemType::OneClass
        )
    }

    /// Whether `c` takes part in the formulation
    pub fn uses_c(self) -> bool {
        matches!(
            self,
            ProblemType::CSvc | ProblemType::EpsSvr | ProblemType::NuSvr
        )
    }

    /// Whether `nu` takes part in the formulation
    pub fn uses_nu(self) -> bool {
        matches!(
            self,
            ProblemType::NuSvc | ProblemType::OneClass | ProblemType::NuSvr
        )
    }

    /// Whether `p` takes part in the formulation
    pub fn uses_p(self) -> bool {
        self == ProblemType::EpsSvr
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProblemType::CSvc => "C-SVC",
            ProblemType::NuSvc => "nu-SVC",
            ProblemType::OneClass => "one-class SVM",
            ProblemType::EpsSvr => "epsilon-SVR",
            ProblemType::NuSvr => "nu-SVR",
        };
        f.write_str(name)
    }
}

/// Kernel function selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelType {
    /// User-supplied kernel function
    Custom,
    Linear,
    Polynomial,
    #[default]
    Rbf,
    Sigmoid,
    Chi2,
    Intersection,
}

impl KernelType {
    pub fn uses_gamma(self) -> bool {
        matches!(
            self,
            KernelType::Polynomial | KernelType::Rbf | KernelType::Sigmoid | KernelType::Chi2
        )
    }

    pub fn uses_coef0(self) -> bool {
        matches!(self, KernelType::Polynomial | KernelType::Sigmoid)
    }

    pub fn uses_degree(self) -> bool {
        self == KernelType::Polynomial
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KernelType::Custom => "custom",
            KernelType::Linear => "linear",
            KernelType::Polynomial => "polynomial",
            KernelType::Rbf => "rbf",
            KernelType::Sigmoid => "sigmoid",
            KernelType::Chi2 => "chi2",
            KernelType::Intersection => "intersection",
        };
        f.write_str(name)
    }
}

/// Hyperparameters of an SVM
///
/// Mutating them never touches an already fitted model; they only take
/// effect on the next training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Kernel coefficient for polynomial, RBF, sigmoid and chi-squared kernels
    pub gamma: f64,
    /// Width of the insensitive tube for ε-SVR
    pub p: f64,
    /// Bound on the fraction of margin errors for the ν formulations
    pub nu: f64,
    /// Regularization parameter
    pub c: f64,
    /// Degree of the polynomial kernel
    #[serde(default = "default_degree")]
    pub degree: f64,
    /// Independent term of the polynomial and sigmoid kernels
    #[serde(default)]
    pub coef0: f64,
    pub kernel_type: KernelType,
    pub problem_type: ProblemType,
}

fn default_degree() -> f64 {
    3.0
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            gamma: 1.0,
            p: 0.1,
            nu: 0.5,
            c: 1.0,
            degree: default_degree(),
            coef0: 0.0,
            kernel_type: KernelType::Rbf,
            problem_type: ProblemType::CSvc,
        }
    }
}

impl Hyperparameters {
    /// Check the values the current kernel and problem type depend on
    pub fn validate(&self) -> Result<()> {
        let problem = self.problem_type;
        let kernel = self.kernel_type;

        // Unused values are persisted too, so every field must be finite
        for (name, value) in [
            ("gamma", self.gamma),
            ("p", self.p),
            ("nu", self.nu),
            ("c", self.c),
            ("degree", self.degree),
            ("coef0", self.coef0),
        ] {
            if !value.is_finite() {
                return Err(SVMError::InvalidParameter(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if problem.uses_c() && !(self.c > 0.0 && self.c.is_finite()) {
            return Err(SVMError::InvalidParameter(format!(
                "c must be positive for {problem}, got {}",
                self.c
            )));
        }
        if problem.uses_nu() && !(self.nu > 0.0 && self.nu <= 1.0) {
            return Err(SVMError::InvalidParameter(format!(
                "nu must be in (0, 1] for {problem}, got {}",
                self.nu
            )));
        }
        if problem.uses_p() && !(self.p >= 0.0 && self.p.is_finite()) {
            return Err(SVMError::InvalidParameter(format!(
                "p must be non-negative for {problem}, got {}",
                self.p
            )));
        }
        if kernel.uses_gamma() && !(self.gamma > 0.0 && self.gamma.is_finite()) {
            return Err(SVMError::InvalidParameter(format!(
                "gamma must be positive for the {kernel} kernel, got {}",
                self.gamma
            )));
        }
        if kernel.uses_degree() && !(self.degree > 0.0 && self.degree.is_finite()) {
            return Err(SVMError::InvalidParameter(format!(
                "degree must be positive for the {kernel} kernel, got {}",
                self.degree
            )));
        }
        Ok(())
    }
}

/// Result of optimization process
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Lagrange multipliers (alpha values)
    pub alpha: Vec<f64>,
    /// Offset of the decision function, `f(x) = Σ αᵢyᵢK(xᵢ, x) - rho`
    pub rho: f64,
    /// Extra offset reported by the ν solver, zero otherwise
    pub r: f64,
    /// Number of iterations performed
    pub iterations: usize,
    /// Final objective value
    pub objective_value: f64,
    /// Whether the KKT tolerance was reached before the iteration cap
    pub converged: bool,
}

/// Configuration for optimizer
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Tolerance for KKT conditions
    pub epsilon: f64,
    /// Maximum number of iterations per solver run
    pub max_iterations: usize,
    /// Kernel cache size in bytes
    pub cache_size: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.001,
            max_iterations: 100_000,
            cache_size: 100_000_000, // 100MB
        }
    }
}

/// Summary of a successful training run
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Hyperparameters the committed model was fitted with
    pub hyperparameters: Hyperparameters,
    /// Solver iterations summed over all sub-problems of the final fit
    pub iterations: usize,
    /// False when any sub-problem stopped at the iteration cap
    pub converged: bool,
    /// Number of distinct support vectors in the committed model
    pub n_support_vectors: usize,
    /// Cross-validation score of the winning combination (auto-train only)
    pub cv_score: Option<f64>,
}

impl TrainReport {
    /// The soft convergence error, if the solver hit its iteration cap
    pub fn warning(&self) -> Option<SVMError> {
        if self.converged {
            None
        } else {
            Some(SVMError::ConvergenceError {
                iterations: self.iterations,
            })
        }
    }
}
