//! Optimization algorithms for SVM
//!
//! This module provides the high-level training interface that integrates
//! kernels and the SMO solver into complete models for every problem type.
//! Multi-class problems are split into one-vs-one binary sub-problems.

mod formulation;

use crate::core::{
    Dataset, Hyperparameters, OptimizerConfig, ProblemType, Result, SVMError, TrainReport,
};
use crate::kernel::{build_kernel, Kernel};
use crate::model::{DecisionFunction, Model, ModelParts};
use formulation::SubSolution;
use log::info;
use std::sync::Arc;

/// High-level SVM optimizer that integrates kernel functions and solving algorithms
pub struct SVMOptimizer {
    kernel: Arc<dyn Kernel>,
    params: Hyperparameters,
    config: OptimizerConfig,
}

/// A decision function still indexed by training rows
struct RawFunction {
    class_pair: Option<(usize, usize)>,
    rows: Vec<usize>,
    solution: SubSolution,
}

impl SVMOptimizer {
    /// Create an optimizer for the given hyperparameters
    ///
    /// `custom` supplies the kernel function when `params.kernel_type` is
    /// [`KernelType::Custom`](crate::core::KernelType::Custom).
    pub fn new(
        params: Hyperparameters,
        custom: Option<&Arc<dyn Kernel>>,
        config: OptimizerConfig,
    ) -> Result<Self> {
        params.validate()?;
        let kernel = build_kernel(&params, custom)?;
        Ok(Self {
            kernel,
            params,
            config,
        })
    }

    /// Create an optimizer with default solver configuration
    pub fn with_params(params: Hyperparameters) -> Result<Self> {
        Self::new(params, None, OptimizerConfig::default())
    }

    /// Get the optimizer configuration
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn params(&self) -> &Hyperparameters {
        &self.params
    }

    /// Get the kernel
    pub fn kernel(&self) -> &Arc<dyn Kernel> {
        &self.kernel
    }

    /// Train a model on the given dataset
    ///
    /// Reaching the iteration cap is reported through
    /// [`TrainReport::converged`], not as an error.
    pub fn train<D: Dataset>(&self, dataset: &D) -> Result<(Model, TrainReport)> {
        if dataset.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        let problem = self.params.problem_type;
        let labels = dataset.get_labels();
        let (classes, functions) = match problem {
            ProblemType::CSvc | ProblemType::NuSvc => {
                let classes = distinct_labels(&labels);
                let functions = self.train_one_vs_one(dataset, &labels, &classes)?;
                (classes, functions)
            }
            ProblemType::OneClass | ProblemType::EpsSvr | ProblemType::NuSvr => {
                let rows: Vec<usize> = (0..dataset.len()).collect();
                let samples = rows.iter().map(|&i| dataset.row(i)).collect();
                let solution = match problem {
                    ProblemType::OneClass => {
                        formulation::one_class(samples, self.params.nu, &self.kernel, &self.config)?
                    }
                    ProblemType::EpsSvr => formulation::eps_svr(
                        samples,
                        &labels,
                        self.params.p,
                        self.params.c,
                        &self.kernel,
                        &self.config,
                    )?,
                    _ => formulation::nu_svr(
                        samples,
                        &labels,
                        self.params.nu,
                        self.params.c,
                        &self.kernel,
                        &self.config,
                    )?,
                };
                let function = RawFunction {
                    class_pair: None,
                    rows,
                    solution,
                };
                (Vec::new(), vec![function])
            }
        };

        let iterations = functions.iter().map(|f| f.solution.iterations).sum();
        let converged = functions.iter().all(|f| f.solution.converged);
        let parts = self.assemble(dataset, classes, functions);
        let n_support_vectors = parts.support_vectors.len();
        let model = Model::from_parts(parts, Arc::clone(&self.kernel))?;

        info!(
            "Trained {problem} model with {} kernel: {n_support_vectors} support vectors, {iterations} iterations",
            self.params.kernel_type
        );

        let report = TrainReport {
            hyperparameters: self.params,
            iterations,
            converged,
            n_support_vectors,
            cv_score: None,
        };
        Ok((model, report))
    }

    /// One binary sub-problem per pair of classes, class `a` taking `y = +1`
    fn train_one_vs_one<D: Dataset>(
        &self,
        dataset: &D,
        labels: &[f64],
        classes: &[f64],
    ) -> Result<Vec<RawFunction>> {
        if classes.len() < 2 {
            return Err(SVMError::InvalidDataset(format!(
                "{} needs at least two classes, found {}",
                self.params.problem_type,
                classes.len()
            )));
        }

        let by_class: Vec<Vec<usize>> = classes
            .iter()
            .map(|&c| (0..labels.len()).filter(|&i| labels[i] == c).collect())
            .collect();

        let mut functions = Vec::with_capacity(classes.len() * (classes.len() - 1) / 2);
        for a in 0..classes.len() {
            for b in a + 1..classes.len() {
                let rows: Vec<usize> = by_class[a].iter().chain(&by_class[b]).copied().collect();
                let mut y = vec![1.0; by_class[a].len()];
                y.resize(rows.len(), -1.0);
                let samples = rows.iter().map(|&i| dataset.row(i)).collect();

                let solution = match self.params.problem_type {
                    ProblemType::NuSvc => formulation::nu_svc(
                        samples,
                        &y,
                        self.params.nu,
                        &self.kernel,
                        &self.config,
                    )?,
                    _ => formulation::c_svc(samples, &y, self.params.c, &self.kernel, &self.config)?,
                };
                functions.push(RawFunction {
                    class_pair: Some((a, b)),
                    rows,
                    solution,
                });
            }
        }
        Ok(functions)
    }

    /// Pool the support vectors of all decision functions
    ///
    /// Rows with a zero coefficient everywhere are dropped; the pool keeps
    /// training order.
    fn assemble<D: Dataset>(
        &self,
        dataset: &D,
        classes: Vec<f64>,
        functions: Vec<RawFunction>,
    ) -> ModelParts {
        let n = dataset.len();
        let mut used = vec![false; n];
        for f in &functions {
            for (&row, &coef) in f.rows.iter().zip(&f.solution.coefficients) {
                if coef != 0.0 {
                    used[row] = true;
                }
            }
        }

        let mut pool_index = vec![usize::MAX; n];
        let mut support_vectors = Vec::new();
        for (row, &is_sv) in used.iter().enumerate() {
            if !is_sv {
                continue;
            }
            pool_index[row] = support_vectors.len();
            support_vectors.push(dataset.row(row).to_vec());
        }

        let decision_functions = functions
            .into_iter()
            .map(|f| {
                let (sv_indices, coefficients) = f
                    .rows
                    .iter()
                    .zip(&f.solution.coefficients)
                    .filter(|&(_, &coef)| coef != 0.0)
                    .map(|(&row, &coef)| (pool_index[row], coef))
                    .unzip();
                DecisionFunction {
                    class_pair: f.class_pair,
                    sv_indices,
                    coefficients,
                    rho: f.solution.rho,
                }
            })
            .collect();

        ModelParts {
            hyperparameters: self.params,
            n_features: dataset.dim(),
            classes,
            support_vectors,
            decision_functions,
        }
    }
}

/// Distinct labels in ascending order
fn distinct_labels(labels: &[f64]) -> Vec<f64> {
    let mut classes = labels.to_vec();
    classes.sort_by(f64::total_cmp);
    classes.dedup();
    classes
}
