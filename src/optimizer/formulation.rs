//! Dual formulations of the supported problem types
//!
//! Each function sets up the linear term, signs, box bounds and starting
//! point for one problem type, runs the SMO solver and converts the
//! multipliers into signed decision-function coefficients.

use crate::core::{OptimizationResult, OptimizerConfig, Result, SVMError};
use crate::kernel::Kernel;
use crate::solver::{ClassificationQ, DualProblem, RegressionQ, SMOSolver, SolverVariant};
use log::{debug, warn};
use std::sync::Arc;

/// Solution of one binary (or single) sub-problem
#[derive(Debug, Clone)]
pub(crate) struct SubSolution {
    /// One coefficient per training row of the sub-problem
    pub coefficients: Vec<f64>,
    pub rho: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl SubSolution {
    fn new(name: &str, coefficients: Vec<f64>, rho: f64, result: &OptimizationResult) -> Self {
        debug!(
            "{name}: {} iterations, objective {:.6}, rho {:.6}",
            result.iterations, result.objective_value, rho
        );
        if !result.converged {
            warn!(
                "{name}: stopped at the iteration cap ({}) before reaching the KKT tolerance",
                result.iterations
            );
        }
        Self {
            coefficients,
            rho,
            iterations: result.iterations,
            converged: result.converged,
        }
    }
}

/// C-SVC for two classes encoded as `y = ±1`
pub(crate) fn c_svc(
    rows: Vec<&[f64]>,
    y: &[f64],
    c: f64,
    kernel: &Arc<dyn Kernel>,
    config: &OptimizerConfig,
) -> Result<SubSolution> {
    let l = rows.len();
    let mut q = ClassificationQ::new(rows, y.to_vec(), Arc::clone(kernel), config.cache_size);
    let p = vec![-1.0; l];
    let problem = DualProblem {
        p: &p,
        y,
        alpha: vec![0.0; l],
        cp: c,
        cn: c,
    };
    let result = SMOSolver::new(config.clone()).solve(&mut q, problem, SolverVariant::Standard)?;

    let coefficients = result.alpha.iter().zip(y).map(|(a, y)| a * y).collect();
    Ok(SubSolution::new("C-SVC", coefficients, result.rho, &result))
}

/// ν-SVC for two classes encoded as `y = ±1`
pub(crate) fn nu_svc(
    rows: Vec<&[f64]>,
    y: &[f64],
    nu: f64,
    kernel: &Arc<dyn Kernel>,
    config: &OptimizerConfig,
) -> Result<SubSolution> {
    let l = rows.len();
    let n_pos = y.iter().filter(|&&v| v > 0.0).count();
    let n_neg = l - n_pos;
    if nu * l as f64 / 2.0 > n_pos.min(n_neg) as f64 {
        return Err(SVMError::InvalidParameter(format!(
            "nu = {nu} is infeasible for classes of sizes {n_pos} and {n_neg}"
        )));
    }

    let mut sum_pos = nu * l as f64 / 2.0;
    let mut sum_neg = sum_pos;
    let alpha = y
        .iter()
        .map(|&v| {
            let remaining = if v > 0.0 { &mut sum_pos } else { &mut sum_neg };
            let a = remaining.min(1.0);
            *remaining -= a;
            a
        })
        .collect();

    let mut q = ClassificationQ::new(rows, y.to_vec(), Arc::clone(kernel), config.cache_size);
    let p = vec![0.0; l];
    let problem = DualProblem {
        p: &p,
        y,
        alpha,
        cp: 1.0,
        cn: 1.0,
    };
    let result = SMOSolver::new(config.clone()).solve(&mut q, problem, SolverVariant::Nu)?;

    let r = result.r;
    if !(r > 0.0 && r.is_finite()) {
        return Err(SVMError::InvalidParameter(format!(
            "nu = {nu} gives a degenerate margin (r = {r})"
        )));
    }
    let coefficients = result
        .alpha
        .iter()
        .zip(y)
        .map(|(a, y)| a * y / r)
        .collect();
    Ok(SubSolution::new("nu-SVC", coefficients, result.rho / r, &result))
}

/// One-class SVM over all rows
pub(crate) fn one_class(
    rows: Vec<&[f64]>,
    nu: f64,
    kernel: &Arc<dyn Kernel>,
    config: &OptimizerConfig,
) -> Result<SubSolution> {
    let l = rows.len();
    let total = nu * l as f64;
    let whole = (total.floor() as usize).min(l);
    let mut alpha = vec![0.0; l];
    alpha[..whole].fill(1.0);
    if whole < l {
        alpha[whole] = total - whole as f64;
    }

    let mut q = ClassificationQ::one_class(rows, Arc::clone(kernel), config.cache_size);
    let p = vec![0.0; l];
    let y = vec![1.0; l];
    let problem = DualProblem {
        p: &p,
        y: &y,
        alpha,
        cp: 1.0,
        cn: 1.0,
    };
    let result = SMOSolver::new(config.clone()).solve(&mut q, problem, SolverVariant::Standard)?;

    Ok(SubSolution::new(
        "one-class",
        result.alpha.clone(),
        result.rho,
        &result,
    ))
}

/// ε-SVR with tube half-width `p`
pub(crate) fn eps_svr(
    rows: Vec<&[f64]>,
    targets: &[f64],
    p: f64,
    c: f64,
    kernel: &Arc<dyn Kernel>,
    config: &OptimizerConfig,
) -> Result<SubSolution> {
    let l = rows.len();
    let linear: Vec<f64> = targets
        .iter()
        .map(|t| p - t)
        .chain(targets.iter().map(|t| p + t))
        .collect();
    let signs = regression_signs(l);

    let mut q = RegressionQ::new(rows, Arc::clone(kernel), config.cache_size);
    let problem = DualProblem {
        p: &linear,
        y: &signs,
        alpha: vec![0.0; 2 * l],
        cp: c,
        cn: c,
    };
    let result = SMOSolver::new(config.clone()).solve(&mut q, problem, SolverVariant::Standard)?;

    let coefficients = fold_regression_alpha(&result.alpha);
    Ok(SubSolution::new("epsilon-SVR", coefficients, result.rho, &result))
}

/// ν-SVR
pub(crate) fn nu_svr(
    rows: Vec<&[f64]>,
    targets: &[f64],
    nu: f64,
    c: f64,
    kernel: &Arc<dyn Kernel>,
    config: &OptimizerConfig,
) -> Result<SubSolution> {
    let l = rows.len();
    let mut sum = c * nu * l as f64 / 2.0;
    let mut alpha = vec![0.0; 2 * l];
    for i in 0..l {
        let a = sum.min(c);
        alpha[i] = a;
        alpha[i + l] = a;
        sum -= a;
    }
    let linear: Vec<f64> = targets
        .iter()
        .map(|t| -t)
        .chain(targets.iter().copied())
        .collect();
    let signs = regression_signs(l);

    let mut q = RegressionQ::new(rows, Arc::clone(kernel), config.cache_size);
    let problem = DualProblem {
        p: &linear,
        y: &signs,
        alpha,
        cp: c,
        cn: c,
    };
    let result = SMOSolver::new(config.clone()).solve(&mut q, problem, SolverVariant::Nu)?;

    let coefficients = fold_regression_alpha(&result.alpha);
    Ok(SubSolution::new("nu-SVR", coefficients, result.rho, &result))
}

fn regression_signs(l: usize) -> Vec<f64> {
    let mut signs = vec![1.0; 2 * l];
    signs[l..].fill(-1.0);
    signs
}

/// `α⁺ᵢ - α⁻ᵢ` for every sample
fn fold_regression_alpha(alpha: &[f64]) -> Vec<f64> {
    let (plus, minus) = alpha.split_at(alpha.len() / 2);
    plus.iter().zip(minus).map(|(a, b)| a - b).collect()
}
