//! Hyperparameter search
//!
//! Exhaustive search over logarithmic grids, scored with deterministic k-fold
//! cross-validation, followed by a refit of the winner on all samples.

use crate::core::{
    Dataset, Hyperparameters, OptimizerConfig, ProblemType, Result, SVMError, SVMModel,
    TrainReport,
};
use crate::data::SampleMatrix;
use crate::kernel::{build_kernel, Kernel};
use crate::model::Model;
use crate::optimizer::SVMOptimizer;
use log::{debug, info, warn};
use std::sync::Arc;

/// Logarithmic grid `min, min·step, min·step², …` below `max`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamGrid {
    pub min: f64,
    pub max: f64,
    pub log_step: f64,
}

impl ParamGrid {
    pub fn new(min: f64, max: f64, log_step: f64) -> Self {
        Self { min, max, log_step }
    }

    /// Grid holding only `value`
    pub fn fixed(value: f64) -> Self {
        Self::new(value, value, 0.0)
    }

    /// Values of the grid in ascending order
    ///
    /// A step of at most one, or a non-positive minimum, yields `[min]`.
    pub fn values(&self) -> Vec<f64> {
        if self.log_step <= 1.0 || !(self.min > 0.0) || !self.log_step.is_finite() {
            return vec![self.min];
        }
        let mut values = vec![self.min];
        let mut value = self.min * self.log_step;
        while value < self.max {
            values.push(value);
            value *= self.log_step;
        }
        values
    }
}

/// A searchable hyperparameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchParam {
    C,
    Gamma,
    P,
    Nu,
    Coef0,
    Degree,
}

impl SearchParam {
    /// Nesting order of the search, outermost first
    pub const ORDER: [SearchParam; 6] = [
        SearchParam::C,
        SearchParam::Gamma,
        SearchParam::P,
        SearchParam::Nu,
        SearchParam::Coef0,
        SearchParam::Degree,
    ];

    /// Whether this hyperparameter affects a model with the given settings
    pub fn is_relevant(self, params: &Hyperparameters) -> bool {
        let (problem, kernel) = (params.problem_type, params.kernel_type);
        match self {
            SearchParam::C => problem.uses_c(),
            SearchParam::Gamma => kernel.uses_gamma(),
            SearchParam::P => problem.uses_p(),
            SearchParam::Nu => problem.uses_nu(),
            SearchParam::Coef0 => kernel.uses_coef0(),
            SearchParam::Degree => kernel.uses_degree(),
        }
    }

    fn set(self, params: &mut Hyperparameters, value: f64) {
        match self {
            SearchParam::C => params.c = value,
            SearchParam::Gamma => params.gamma = value,
            SearchParam::P => params.p = value,
            SearchParam::Nu => params.nu = value,
            SearchParam::Coef0 => params.coef0 = value,
            SearchParam::Degree => params.degree = value,
        }
    }
}

/// Configuration for hyperparameter search
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of cross-validation folds, clamped to the sample count
    pub k_fold: usize,
    pub c_grid: ParamGrid,
    pub gamma_grid: ParamGrid,
    pub p_grid: ParamGrid,
    pub nu_grid: ParamGrid,
    pub coef0_grid: ParamGrid,
    pub degree_grid: ParamGrid,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k_fold: 10,
            c_grid: ParamGrid::new(0.1, 500.0, 5.0),
            gamma_grid: ParamGrid::new(1e-5, 0.6, 15.0),
            p_grid: ParamGrid::new(0.01, 100.0, 7.0),
            nu_grid: ParamGrid::new(0.01, 0.2, 3.0),
            coef0_grid: ParamGrid::new(0.1, 300.0, 14.0),
            degree_grid: ParamGrid::new(1.0, 5.0, 2.0),
        }
    }
}

impl SearchConfig {
    pub fn with_k_fold(mut self, k_fold: usize) -> Self {
        self.k_fold = k_fold;
        self
    }

    /// Replace the grid of one hyperparameter
    pub fn with_grid(mut self, param: SearchParam, grid: ParamGrid) -> Self {
        *self.grid_mut(param) = grid;
        self
    }

    pub fn grid(&self, param: SearchParam) -> &ParamGrid {
        match param {
            SearchParam::C => &self.c_grid,
            SearchParam::Gamma => &self.gamma_grid,
            SearchParam::P => &self.p_grid,
            SearchParam::Nu => &self.nu_grid,
            SearchParam::Coef0 => &self.coef0_grid,
            SearchParam::Degree => &self.degree_grid,
        }
    }

    fn grid_mut(&mut self, param: SearchParam) -> &mut ParamGrid {
        match param {
            SearchParam::C => &mut self.c_grid,
            SearchParam::Gamma => &mut self.gamma_grid,
            SearchParam::P => &mut self.p_grid,
            SearchParam::Nu => &mut self.nu_grid,
            SearchParam::Coef0 => &mut self.coef0_grid,
            SearchParam::Degree => &mut self.degree_grid,
        }
    }
}

/// Winner of a search
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub hyperparameters: Hyperparameters,
    /// Accuracy for classifiers, negative MSE for regressors
    pub score: f64,
    /// Number of combinations that produced a score
    pub evaluated: usize,
}

/// One cross-validation split
struct Fold {
    train: SampleMatrix,
    test: Vec<usize>,
}

/// Grid search with k-fold cross-validation
pub struct GridSearch {
    config: SearchConfig,
    optimizer_config: OptimizerConfig,
}

impl GridSearch {
    pub fn new(config: SearchConfig, optimizer_config: OptimizerConfig) -> Self {
        Self {
            config,
            optimizer_config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Every combination to try, in search order
    ///
    /// Hyperparameters that do not affect `base`'s problem and kernel type
    /// keep their value from `base`.
    pub fn candidates(&self, base: &Hyperparameters) -> Vec<Hyperparameters> {
        let axes: Vec<(SearchParam, Vec<f64>)> = SearchParam::ORDER
            .iter()
            .filter(|param| param.is_relevant(base))
            .map(|&param| (param, self.config.grid(param).values()))
            .collect();

        let mut candidates = Vec::new();
        let mut position = vec![0usize; axes.len()];
        loop {
            let mut params = *base;
            for ((param, values), &k) in axes.iter().zip(&position) {
                param.set(&mut params, values[k]);
            }
            candidates.push(params);

            // Advance the innermost axis first
            let mut axis = axes.len();
            loop {
                if axis == 0 {
                    return candidates;
                }
                axis -= 1;
                position[axis] += 1;
                if position[axis] < axes[axis].1.len() {
                    break;
                }
                position[axis] = 0;
            }
        }
    }

    /// Search the grid and return the best combination
    pub fn search(
        &self,
        data: &SampleMatrix,
        base: &Hyperparameters,
        custom: Option<&Arc<dyn Kernel>>,
    ) -> Result<SearchOutcome> {
        build_kernel(base, custom)?;
        let folds = self.prepare_folds(data, base.problem_type)?;
        let candidates = self.candidates(base);
        info!(
            "Searching {} hyperparameter combinations with {}-fold cross-validation",
            candidates.len(),
            folds.len()
        );

        let mut best: Option<(Hyperparameters, f64)> = None;
        let mut first_error: Option<SVMError> = None;
        let mut evaluated = 0;
        for params in candidates {
            match self.score(data, &folds, &params, custom) {
                Ok(Some(score)) if score.is_finite() => {
                    evaluated += 1;
                    debug!(
                        "c={} gamma={} p={} nu={} coef0={} degree={}: score {score:.6}",
                        params.c, params.gamma, params.p, params.nu, params.coef0, params.degree
                    );
                    if best.map_or(true, |(_, best_score)| score > best_score) {
                        best = Some((params, score));
                    }
                }
                Ok(_) => debug!("Skipping {params:?}: no fold produced a score"),
                Err(e) => {
                    debug!("Skipping {params:?}: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        // No winner: report the first fit error, if any
        let (hyperparameters, score) = best.ok_or_else(|| {
            first_error.unwrap_or_else(|| {
                SVMError::InvalidDataset(
                    "no hyperparameter combination could be cross-validated".to_string(),
                )
            })
        })?;
        info!(
            "Best of {evaluated} combinations: c={} gamma={} p={} nu={} coef0={} degree={} (score {score:.6})",
            hyperparameters.c,
            hyperparameters.gamma,
            hyperparameters.p,
            hyperparameters.nu,
            hyperparameters.coef0,
            hyperparameters.degree
        );

        Ok(SearchOutcome {
            hyperparameters,
            score,
            evaluated,
        })
    }

    /// Search, then fit the winner on the full dataset
    pub fn run(
        &self,
        data: &SampleMatrix,
        base: &Hyperparameters,
        custom: Option<&Arc<dyn Kernel>>,
    ) -> Result<(Model, TrainReport)> {
        let outcome = self.search(data, base, custom)?;
        let optimizer = SVMOptimizer::new(
            outcome.hyperparameters,
            custom,
            self.optimizer_config.clone(),
        )?;
        let (model, mut report) = optimizer.train(data)?;
        report.cv_score = Some(outcome.score);
        Ok((model, report))
    }

    fn prepare_folds(&self, data: &SampleMatrix, problem: ProblemType) -> Result<Vec<Fold>> {
        let n = data.n_samples();
        if self.config.k_fold < 2 {
            return Err(SVMError::InvalidParameter(format!(
                "k_fold must be at least 2, got {}",
                self.config.k_fold
            )));
        }
        if n < 2 {
            return Err(SVMError::InvalidDataset(
                "cross-validation needs at least two samples".to_string(),
            ));
        }

        let k = self.config.k_fold.min(n);
        let assignment = assign_folds(data.labels(), k, problem.is_classifier());
        let needs_two_classes = matches!(problem, ProblemType::CSvc | ProblemType::NuSvc);

        let mut folds = Vec::with_capacity(k);
        for fold in 0..k {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..n).partition(|&i| assignment[i] == fold);
            let train = data.select(&train);
            if needs_two_classes && train.classes().len() < 2 {
                warn!("Skipping fold {fold}: its training part holds a single class");
                continue;
            }
            folds.push(Fold { train, test });
        }
        Ok(folds)
    }

    /// Cross-validation score, `None` when no fold could be used
    fn score(
        &self,
        data: &SampleMatrix,
        folds: &[Fold],
        params: &Hyperparameters,
        custom: Option<&Arc<dyn Kernel>>,
    ) -> Result<Option<f64>> {
        let optimizer = SVMOptimizer::new(*params, custom, self.optimizer_config.clone())?;
        let classifier = params.problem_type.is_classifier();

        let mut correct = 0usize;
        let mut squared_error = 0.0;
        let mut evaluated = 0usize;
        for fold in folds {
            let (model, _) = optimizer.train(&fold.train)?;
            for &i in &fold.test {
                let predicted = model.predict(data.row(i)).label;
                let actual = data.label(i);
                if classifier {
                    correct += usize::from(predicted == actual);
                } else {
                    squared_error += (predicted - actual).powi(2);
                }
                evaluated += 1;
            }
        }

        if evaluated == 0 {
            return Ok(None);
        }
        Ok(Some(if classifier {
            correct as f64 / evaluated as f64
        } else {
            -squared_error / evaluated as f64
        }))
    }
}

/// Fold index of every sample
///
/// Stratified assignment deals the samples of each class round-robin, classes
/// in ascending order; otherwise sample `i` goes to fold `i mod k`.
pub fn assign_folds(labels: &[f64], k: usize, stratified: bool) -> Vec<usize> {
    let n = labels.len();
    if !stratified {
        return (0..n).map(|i| i % k).collect();
    }

    let mut classes = labels.to_vec();
    classes.sort_by(f64::total_cmp);
    classes.dedup();

    let mut folds = vec![0; n];
    let mut dealt = 0;
    for class in classes {
        for (i, _) in labels.iter().enumerate().filter(|&(_, &l)| l == class) {
            folds[i] = dealt % k;
            dealt += 1;
        }
    }
    folds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KernelType, SampleLayout};
    use approx::assert_relative_eq;

    fn linear_svc() -> Hyperparameters {
        Hyperparameters {
            kernel_type: KernelType::Linear,
            ..Hyperparameters::default()
        }
    }

    fn separable() -> SampleMatrix {
        let samples = [
            [-2.0, 0.1],
            [2.0, -0.1],
            [-2.5, 0.0],
            [2.5, 0.0],
            [-3.0, -0.2],
            [3.0, 0.2],
            [-3.5, 0.1],
            [3.5, -0.1],
        ];
        let labels = [-1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0];
        SampleMatrix::from_nested(&samples, &labels, SampleLayout::Row).unwrap()
    }

    #[test]
    fn test_param_grid_values() {
        let c = ParamGrid::new(0.1, 500.0, 5.0).values();
        assert_eq!(c.len(), 6);
        assert_relative_eq!(c[0], 0.1);
        assert_relative_eq!(c[5], 312.5, epsilon = 1e-9);

        assert_eq!(ParamGrid::new(1e-5, 0.6, 15.0).values().len(), 5);
        assert_eq!(ParamGrid::new(1.0, 5.0, 2.0).values(), vec![1.0, 2.0, 4.0]);
        assert_eq!(ParamGrid::new(2.0, 100.0, 1.0).values(), vec![2.0]);
        assert_eq!(ParamGrid::new(3.0, 1.0, 10.0).values(), vec![3.0]);
        assert_eq!(ParamGrid::fixed(0.5).values(), vec![0.5]);
    }

    #[test]
    fn test_candidates_only_vary_relevant_params() {
        let search = GridSearch::new(SearchConfig::default(), OptimizerConfig::default());

        let rbf = Hyperparameters::default();
        let candidates = search.candidates(&rbf);
        assert_eq!(candidates.len(), 6 * 5);
        // gamma is nested inside c
        assert_eq!(candidates[0].c, 0.1);
        assert_eq!(candidates[1].c, 0.1);
        assert_relative_eq!(candidates[1].gamma, 1.5e-4, epsilon = 1e-12);
        assert!(candidates.iter().all(|p| p.nu == rbf.nu && p.p == rbf.p));

        let svr = Hyperparameters {
            problem_type: ProblemType::EpsSvr,
            ..linear_svc()
        };
        assert_eq!(search.candidates(&svr).len(), 6 * 5);

        let poly = Hyperparameters {
            kernel_type: KernelType::Polynomial,
            ..Hyperparameters::default()
        };
        assert_eq!(search.candidates(&poly).len(), 6 * 5 * 4 * 3);

        let one_class = Hyperparameters {
            problem_type: ProblemType::OneClass,
            kernel_type: KernelType::Intersection,
            ..Hyperparameters::default()
        };
        let candidates = search.candidates(&one_class);
        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|p| p.c == one_class.c));
    }

    #[test]
    fn test_assign_folds() {
        let labels = [2.0, 1.0, 2.0, 1.0, 1.0, 2.0];
        // Class 1 first (rows 1, 3, 4), then class 2 (rows 0, 2, 5)
        assert_eq!(assign_folds(&labels, 3, true), vec![0, 0, 1, 1, 2, 2]);
        assert_eq!(assign_folds(&labels, 4, false), vec![0, 1, 2, 3, 0, 1]);
    }

    #[test]
    fn test_search_ties_go_to_first_combination() {
        // Beyond the hard-margin solution every C yields the same model
        let config = SearchConfig::default()
            .with_k_fold(4)
            .with_grid(SearchParam::C, ParamGrid::new(10.0, 10_000.0, 10.0));
        let search = GridSearch::new(config, OptimizerConfig::default());

        let outcome = search.search(&separable(), &linear_svc(), None).unwrap();
        assert_eq!(outcome.hyperparameters.c, 10.0);
        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.evaluated, 3);
    }

    #[test]
    fn test_run_refits_winner() {
        let config = SearchConfig::default().with_k_fold(4);
        let search = GridSearch::new(config, OptimizerConfig::default());
        let data = separable();

        let (model, report) = search.run(&data, &linear_svc(), None).unwrap();
        assert_eq!(report.cv_score, Some(1.0));
        assert_eq!(model.hyperparameters(), &report.hyperparameters);
        for i in 0..data.len() {
            assert_eq!(model.predict(data.row(i)).label, data.label(i));
        }
    }

    #[test]
    fn test_search_without_usable_folds_fails() {
        let data = SampleMatrix::from_nested(
            &[[0.0], [1.0], [2.0]],
            &[1.0, 1.0, 1.0],
            SampleLayout::Row,
        )
        .unwrap();
        let search = GridSearch::new(SearchConfig::default(), OptimizerConfig::default());

        assert!(matches!(
            search.search(&data, &linear_svc(), None),
            Err(SVMError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_search_with_invalid_grid_reports_parameter_error() {
        let config = SearchConfig::default()
            .with_k_fold(4)
            .with_grid(SearchParam::C, ParamGrid::new(-1.0, 10.0, 10.0));
        let search = GridSearch::new(config, OptimizerConfig::default());

        assert!(matches!(
            search.search(&separable(), &linear_svc(), None),
            Err(SVMError::InvalidParameter(msg)) if msg.contains("c must be positive")
        ));
    }

    #[test]
    fn test_search_reports_missing_custom_kernel() {
        let base = Hyperparameters {
            kernel_type: KernelType::Custom,
            ..Hyperparameters::default()
        };
        let search = GridSearch::new(SearchConfig::default(), OptimizerConfig::default());
        assert!(matches!(
            search.search(&separable(), &base, None),
            Err(SVMError::UnsupportedKernel(_))
        ));
    }

    #[test]
    fn test_regression_search_scores_negative_mse() {
        let samples: Vec<Vec<f64>> = (0..12).map(|i| vec![i as f64 / 4.0]).collect();
        let targets: Vec<f64> = samples.iter().map(|x| 2.0 * x[0]).collect();
        let data = SampleMatrix::from_nested(&samples, &targets, SampleLayout::Row).unwrap();
        let base = Hyperparameters {
            problem_type: ProblemType::EpsSvr,
            ..linear_svc()
        };
        let config = SearchConfig::default().with_k_fold(3);
        let search = GridSearch::new(config, OptimizerConfig::default());

        let outcome = search.search(&data, &base, None).unwrap();
        assert!(outcome.score <= 0.0);
        assert!(outcome.score > -0.1);
    }
}
