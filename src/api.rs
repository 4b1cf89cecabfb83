//! High-level API for Support Vector Machine operations
//!
//! [`SVM`] bundles hyperparameters, a training session and the committed
//! model behind one cheaply cloneable handle. Clones share state, so a model
//! trained through one clone is visible to all of them.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use svmkit::{SampleLayout, TrainingData, SVM};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let samples = vec![vec![0.0, 0.1], vec![0.2, 0.0], vec![2.0, 2.1], vec![2.2, 1.9]];
//! let labels = vec![0.0, 0.0, 1.0, 1.0];
//! let data = TrainingData::new(&samples, &labels, SampleLayout::Row)?;
//!
//! let svm = SVM::new().with_c(10.0).with_gamma(0.5);
//! let report = svm.train(&data)?;
//! println!("{} support vectors", report.n_support_vectors);
//!
//! println!("class: {}", svm.predict(&[0.1, 0.1])?);
//! println!("accuracy: {:.2}", svm.compute_class_accuracy(&samples, &labels)?);
//! svm.write_to_file("model.json")?;
//! # Ok(())
//! # }
//! ```

use crate::core::{
    Hyperparameters, KernelType, OptimizerConfig, Prediction, ProblemType, Result, SVMError,
    SVMModel, TrainReport,
};
use crate::data::{SampleMatrix, TrainingData};
use crate::kernel::{build_kernel, Kernel};
use crate::model::Model;
use crate::optimizer::SVMOptimizer;
use crate::persistence::SerializableModel;
use crate::search::{GridSearch, SearchConfig};
use log::{info, warn};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

/// High-level SVM interface with builder pattern
#[derive(Clone, Default)]
pub struct SVM {
    shared: Arc<Shared>,
}

/// State shared by all clones of an [`SVM`]
#[derive(Default)]
struct Shared {
    params: RwLock<Hyperparameters>,
    custom_kernel: RwLock<Option<Arc<dyn Kernel>>>,
    optimizer_config: RwLock<OptimizerConfig>,
    search_config: RwLock<SearchConfig>,
    model: RwLock<Option<Arc<Model>>>,
    training: AtomicBool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrainMode {
    /// Fit with the configured hyperparameters
    Fixed,
    /// Grid search, then refit with the winner
    Search,
}

fn read<T: Clone>(lock: &RwLock<T>) -> T {
    lock.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn write<T>(lock: &RwLock<T>, value: T) {
    *lock.write().unwrap_or_else(PoisonError::into_inner) = value;
}

/// Marks the session as training for as long as it lives
struct TrainingGuard {
    shared: Arc<Shared>,
}

impl TrainingGuard {
    fn acquire(shared: &Arc<Shared>) -> Result<Self> {
        shared
            .training
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SVMError::ConcurrentTraining)?;
        Ok(Self {
            shared: Arc::clone(shared),
        })
    }
}

impl Drop for TrainingGuard {
    fn drop(&mut self) {
        self.shared.training.store(false, Ordering::Release);
    }
}

/// Handle to a training run on a background thread
#[derive(Debug)]
pub struct TrainingHandle {
    handle: JoinHandle<()>,
}

impl TrainingHandle {
    /// Wait for the run, completion callback included, to finish
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Shared {
    fn fit_and_commit(&self, matrix: &SampleMatrix, mode: TrainMode) -> Result<TrainReport> {
        let params = read(&self.params);
        let custom = read(&self.custom_kernel);
        let config = read(&self.optimizer_config);

        let (model, report) = match mode {
            TrainMode::Fixed => SVMOptimizer::new(params, custom.as_ref(), config)?.train(matrix)?,
            TrainMode::Search => {
                GridSearch::new(read(&self.search_config), config).run(
                    matrix,
                    &params,
                    custom.as_ref(),
                )?
            }
        };

        write(&self.model, Some(Arc::new(model)));
        if mode == TrainMode::Search {
            let tuned = report.hyperparameters;
            let mut current = self.params.write().unwrap_or_else(PoisonError::into_inner);
            current.c = tuned.c;
            current.gamma = tuned.gamma;
            current.p = tuned.p;
            current.nu = tuned.nu;
            current.coef0 = tuned.coef0;
            current.degree = tuned.degree;
        }

        if let Some(warning) = report.warning() {
            warn!("{warning}; the best-effort model was committed");
        }
        info!(
            "Committed {} model trained on {} samples",
            report.hyperparameters.problem_type,
            matrix.n_samples()
        );
        Ok(report)
    }
}

impl SVM {
    /// Create a new SVM with default hyperparameters (C-SVC, RBF kernel)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an SVM with the given hyperparameters
    pub fn with_hyperparameters(params: Hyperparameters) -> Self {
        let svm = Self::new();
        svm.set_hyperparameters(params);
        svm
    }

    /// Set regularization parameter C
    pub fn with_c(self, c: f64) -> Self {
        self.set_c(c);
        self
    }

    pub fn with_gamma(self, gamma: f64) -> Self {
        self.set_gamma(gamma);
        self
    }

    pub fn with_nu(self, nu: f64) -> Self {
        self.set_nu(nu);
        self
    }

    pub fn with_p(self, p: f64) -> Self {
        self.set_p(p);
        self
    }

    pub fn with_degree(self, degree: f64) -> Self {
        self.set_degree(degree);
        self
    }

    pub fn with_coef0(self, coef0: f64) -> Self {
        self.set_coef0(coef0);
        self
    }

    pub fn with_kernel_type(self, kernel_type: KernelType) -> Self {
        self.set_kernel_type(kernel_type);
        self
    }

    pub fn with_problem_type(self, problem_type: ProblemType) -> Self {
        self.set_problem_type(problem_type);
        self
    }

    /// Use a caller-supplied kernel function
    pub fn with_custom_kernel(self, kernel: Arc<dyn Kernel>) -> Self {
        self.set_custom_kernel(kernel);
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(self, epsilon: f64) -> Self {
        self.update_optimizer_config(|config| config.epsilon = epsilon);
        self
    }

    /// Set maximum number of solver iterations
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        self.update_optimizer_config(|config| config.max_iterations = max_iterations);
        self
    }

    /// Set kernel cache size in bytes
    pub fn with_cache_size(self, cache_size: usize) -> Self {
        self.update_optimizer_config(|config| config.cache_size = cache_size);
        self
    }

    pub fn with_optimizer_config(self, config: OptimizerConfig) -> Self {
        write(&self.shared.optimizer_config, config);
        self
    }

    /// Configure grids and fold count used by auto-training
    pub fn with_search_config(self, config: SearchConfig) -> Self {
        write(&self.shared.search_config, config);
        self
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        read(&self.shared.params)
    }

    /// Replace all hyperparameters; they take effect on the next training run
    pub fn set_hyperparameters(&self, params: Hyperparameters) {
        write(&self.shared.params, params);
    }

    fn update_params(&self, update: impl FnOnce(&mut Hyperparameters)) {
        let mut params = self.shared.params.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut *params);
    }

    fn update_optimizer_config(&self, update: impl FnOnce(&mut OptimizerConfig)) {
        let mut config = self
            .shared
            .optimizer_config
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        update(&mut *config);
    }

    pub fn gamma(&self) -> f64 {
        self.hyperparameters().gamma
    }

    pub fn set_gamma(&self, gamma: f64) {
        self.update_params(|p| p.gamma = gamma);
    }

    pub fn p(&self) -> f64 {
        self.hyperparameters().p
    }

    pub fn set_p(&self, p: f64) {
        self.update_params(|params| params.p = p);
    }

    pub fn nu(&self) -> f64 {
        self.hyperparameters().nu
    }

    pub fn set_nu(&self, nu: f64) {
        self.update_params(|p| p.nu = nu);
    }

    pub fn c(&self) -> f64 {
        self.hyperparameters().c
    }

    pub fn set_c(&self, c: f64) {
        self.update_params(|p| p.c = c);
    }

    pub fn degree(&self) -> f64 {
        self.hyperparameters().degree
    }

    pub fn set_degree(&self, degree: f64) {
        self.update_params(|p| p.degree = degree);
    }

    pub fn coef0(&self) -> f64 {
        self.hyperparameters().coef0
    }

    pub fn set_coef0(&self, coef0: f64) {
        self.update_params(|p| p.coef0 = coef0);
    }

    pub fn kernel_type(&self) -> KernelType {
        self.hyperparameters().kernel_type
    }

    pub fn set_kernel_type(&self, kernel_type: KernelType) {
        self.update_params(|p| p.kernel_type = kernel_type);
    }

    pub fn problem_type(&self) -> ProblemType {
        self.hyperparameters().problem_type
    }

    pub fn set_problem_type(&self, problem_type: ProblemType) {
        self.update_params(|p| p.problem_type = problem_type);
    }

    /// Install a kernel function and select [`KernelType::Custom`]
    pub fn set_custom_kernel(&self, kernel: Arc<dyn Kernel>) {
        write(&self.shared.custom_kernel, Some(kernel));
        self.set_kernel_type(KernelType::Custom);
    }

    pub fn optimizer_config(&self) -> OptimizerConfig {
        read(&self.shared.optimizer_config)
    }

    pub fn search_config(&self) -> SearchConfig {
        read(&self.shared.search_config)
    }

    /// Whether the configured problem type predicts class labels
    pub fn is_classifier(&self) -> bool {
        self.problem_type().is_classifier()
    }

    pub fn is_trained(&self) -> bool {
        self.model().is_some()
    }

    /// Whether a training run is in progress
    pub fn is_training(&self) -> bool {
        self.shared.training.load(Ordering::Acquire)
    }

    /// Feature count of the committed model, 0 before the first training
    pub fn number_of_features(&self) -> usize {
        self.model().map(|m| m.n_features()).unwrap_or(0)
    }

    /// The committed model, if any
    pub fn model(&self) -> Option<Arc<Model>> {
        read(&self.shared.model)
    }

    /// Get model information
    pub fn info(&self) -> Option<ModelInfo> {
        self.model().map(|model| ModelInfo {
            problem_type: model.problem_type(),
            kernel_type: model.hyperparameters().kernel_type,
            n_features: model.n_features(),
            n_classes: model.classes().len(),
            n_support_vectors: model.n_support_vectors(),
        })
    }

    /// Train with the configured hyperparameters, blocking until done
    ///
    /// Fails with [`SVMError::ConcurrentTraining`] while another run is in
    /// progress. On error the previously committed model stays in place.
    pub fn train(&self, data: &TrainingData) -> Result<TrainReport> {
        let (_guard, matrix) = self.prepare(data, TrainMode::Fixed)?;
        self.shared.fit_and_commit(&matrix, TrainMode::Fixed)
    }

    /// Search the hyperparameter grids, then train with the best combination
    ///
    /// The winning values replace the configured hyperparameters.
    pub fn auto_train(&self, data: &TrainingData) -> Result<TrainReport> {
        let (_guard, matrix) = self.prepare(data, TrainMode::Search)?;
        self.shared.fit_and_commit(&matrix, TrainMode::Search)
    }

    /// Train on a background thread
    ///
    /// Errors detectable up front (a run already in progress, no samples, an
    /// unusable kernel or hyperparameters) are returned directly and
    /// `completion` is not called. Otherwise `completion` runs exactly once on
    /// the training thread, after the new model was committed and before
    /// [`is_training`](Self::is_training) turns false.
    pub fn train_async<F>(&self, data: &TrainingData, completion: F) -> Result<TrainingHandle>
    where
        F: FnOnce(Result<TrainReport>) + Send + 'static,
    {
        self.spawn(data, TrainMode::Fixed, completion)
    }

    /// Background variant of [`auto_train`](Self::auto_train)
    pub fn auto_train_async<F>(&self, data: &TrainingData, completion: F) -> Result<TrainingHandle>
    where
        F: FnOnce(Result<TrainReport>) + Send + 'static,
    {
        self.spawn(data, TrainMode::Search, completion)
    }

    fn prepare(
        &self,
        data: &TrainingData,
        mode: TrainMode,
    ) -> Result<(TrainingGuard, Arc<SampleMatrix>)> {
        let guard = TrainingGuard::acquire(&self.shared)?;
        let matrix = data.snapshot().ok_or(SVMError::EmptyDataset)?;

        let params = self.hyperparameters();
        if mode == TrainMode::Fixed {
            params.validate()?;
        }
        build_kernel(&params, read(&self.shared.custom_kernel).as_ref())?;
        Ok((guard, matrix))
    }

    fn spawn<F>(&self, data: &TrainingData, mode: TrainMode, completion: F) -> Result<TrainingHandle>
    where
        F: FnOnce(Result<TrainReport>) + Send + 'static,
    {
        let (guard, matrix) = self.prepare(data, mode)?;
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("svmkit-train".to_string())
            .spawn(move || {
                let result = shared.fit_and_commit(&matrix, mode);
                completion(result);
                drop(guard);
            })?;
        Ok(TrainingHandle { handle })
    }

    fn committed(&self) -> Result<Arc<Model>> {
        self.model().ok_or(SVMError::ModelNotTrained)
    }

    fn check_dimension(model: &Model, sample: &[f64]) -> Result<()> {
        if sample.len() != model.n_features() {
            return Err(SVMError::DimensionMismatch {
                expected: model.n_features(),
                actual: sample.len(),
            });
        }
        Ok(())
    }

    /// Predict a single sample
    ///
    /// Returns the class label for classifiers, `1.0`/`0.0` (inlier/outlier)
    /// for one-class models and the estimate for regressors.
    pub fn predict(&self, sample: &[f64]) -> Result<f64> {
        Ok(self.predict_detailed(sample)?.label)
    }

    /// Predict a single sample, keeping the decision value
    pub fn predict_detailed(&self, sample: &[f64]) -> Result<Prediction> {
        let model = self.committed()?;
        Self::check_dimension(&model, sample)?;
        Ok(model.predict(sample))
    }

    /// Predict multiple samples against one snapshot of the model
    pub fn predict_batch<S: AsRef<[f64]>>(&self, samples: &[S]) -> Result<Vec<f64>> {
        let model = self.committed()?;
        samples
            .iter()
            .map(|s| {
                Self::check_dimension(&model, s.as_ref())?;
                Ok(model.predict(s.as_ref()).label)
            })
            .collect()
    }

    /// Raw decision values, one per decision function
    pub fn decision_function(&self, sample: &[f64]) -> Result<Vec<f64>> {
        let model = self.committed()?;
        Self::check_dimension(&model, sample)?;
        Ok(model.decision_values(sample))
    }

    /// Fraction of samples whose predicted class equals the label
    pub fn compute_class_accuracy<S: AsRef<[f64]>>(
        &self,
        samples: &[S],
        labels: &[f64],
    ) -> Result<f64> {
        let pairs = self.labeled_predictions(samples, labels, "class accuracy", true)?;
        let correct = pairs.iter().filter(|(pred, actual)| pred == actual).count();
        Ok(correct as f64 / pairs.len() as f64)
    }

    /// Mean squared difference between estimates and targets
    pub fn compute_mse<S: AsRef<[f64]>>(&self, samples: &[S], targets: &[f64]) -> Result<f64> {
        let pairs = self.labeled_predictions(samples, targets, "mean squared error", false)?;
        let sum: f64 = pairs.iter().map(|(pred, actual)| (pred - actual).powi(2)).sum();
        Ok(sum / pairs.len() as f64)
    }

    fn labeled_predictions<S: AsRef<[f64]>>(
        &self,
        samples: &[S],
        labels: &[f64],
        metric: &'static str,
        classifier: bool,
    ) -> Result<Vec<(f64, f64)>> {
        let model = self.committed()?;
        if model.problem_type().is_classifier() != classifier {
            return Err(SVMError::WrongModelType {
                metric,
                expected: if classifier {
                    "classification"
                } else {
                    "regression"
                },
            });
        }
        if samples.len() != labels.len() {
            return Err(SVMError::ShapeError(format!(
                "{} samples but {} labels",
                samples.len(),
                labels.len()
            )));
        }
        if samples.is_empty() {
            return Err(SVMError::ShapeError("no samples to evaluate".to_string()));
        }

        samples
            .iter()
            .zip(labels)
            .map(|(s, &label)| {
                Self::check_dimension(&model, s.as_ref())?;
                Ok((model.predict(s.as_ref()).label, label))
            })
            .collect()
    }

    /// Save the committed model, replacing any existing file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let model = self.committed()?;
        SerializableModel::from_model(&model).save_to_file(path)
    }

    /// Create a trained SVM from a saved model
    ///
    /// Models using a custom kernel fail with [`SVMError::UnsupportedKernel`];
    /// load those with [`init_from_file_with_kernel`](Self::init_from_file_with_kernel).
    pub fn init_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(path, None)
    }

    /// Create a trained SVM from a saved custom-kernel model
    pub fn init_from_file_with_kernel<P: AsRef<Path>>(
        path: P,
        kernel: Arc<dyn Kernel>,
    ) -> Result<Self> {
        Self::load(path, Some(kernel))
    }

    fn load<P: AsRef<Path>>(path: P, custom: Option<Arc<dyn Kernel>>) -> Result<Self> {
        let document = SerializableModel::load_from_file(path)?;
        let model = document.into_model(custom.as_ref())?;

        let svm = Self::with_hyperparameters(*model.hyperparameters());
        write(&svm.shared.custom_kernel, custom);
        write(&svm.shared.model, Some(Arc::new(model)));
        Ok(svm)
    }
}

impl fmt::Debug for SVM {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SVM")
            .field("hyperparameters", &self.hyperparameters())
            .field("is_trained", &self.is_trained())
            .field("is_training", &self.is_training())
            .finish()
    }
}

/// Model information
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub problem_type: ProblemType,
    pub kernel_type: KernelType,
    pub n_features: usize,
    pub n_classes: usize,
    pub n_support_vectors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SampleLayout;
    use std::sync::mpsc;
    use tempfile::NamedTempFile;

    fn blobs() -> (Vec<Vec<f64>>, Vec<f64>) {
        let samples = vec![
            vec![0.0, 0.1],
            vec![0.2, 0.0],
            vec![0.1, 0.3],
            vec![2.0, 2.1],
            vec![2.2, 1.9],
            vec![1.8, 2.0],
        ];
        let labels = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (samples, labels)
    }

    fn blob_data() -> TrainingData {
        let (samples, labels) = blobs();
        TrainingData::new(&samples, &labels, SampleLayout::Row).unwrap()
    }

    #[test]
    fn test_svm_builder_pattern() {
        let svm = SVM::new()
            .with_c(2.0)
            .with_gamma(0.25)
            .with_kernel_type(KernelType::Polynomial)
            .with_epsilon(0.01)
            .with_max_iterations(5000);

        assert_eq!(svm.c(), 2.0);
        assert_eq!(svm.gamma(), 0.25);
        assert_eq!(svm.kernel_type(), KernelType::Polynomial);
        assert_eq!(svm.optimizer_config().epsilon, 0.01);
        assert_eq!(svm.optimizer_config().max_iterations, 5000);
        assert!(!svm.is_trained());
        assert_eq!(svm.number_of_features(), 0);
    }

    #[test]
    fn test_is_classifier_follows_problem_type() {
        let svm = SVM::new();
        assert!(svm.is_classifier());
        svm.set_problem_type(ProblemType::NuSvr);
        assert!(!svm.is_classifier());
        svm.set_problem_type(ProblemType::OneClass);
        assert!(svm.is_classifier());
    }

    #[test]
    fn test_untrained_operations_fail() {
        let svm = SVM::new();
        assert!(matches!(
            svm.predict(&[0.0, 0.0]),
            Err(SVMError::ModelNotTrained)
        ));
        assert!(matches!(
            svm.compute_mse(&[[0.0]], &[0.0]),
            Err(SVMError::ModelNotTrained)
        ));
        let file = NamedTempFile::new().unwrap();
        assert!(matches!(
            svm.write_to_file(file.path()),
            Err(SVMError::ModelNotTrained)
        ));
    }

    #[test]
    fn test_train_and_predict() {
        let (samples, labels) = blobs();
        let svm = SVM::new().with_gamma(0.5);
        let report = svm.train(&blob_data()).expect("Training should succeed");

        assert!(report.converged);
        assert!(report.cv_score.is_none());
        assert!(svm.is_trained());
        assert_eq!(svm.number_of_features(), 2);
        assert_eq!(svm.predict(&[0.1, 0.1]).unwrap(), 0.0);
        assert_eq!(svm.predict(&[2.0, 2.0]).unwrap(), 1.0);
        assert_eq!(
            svm.compute_class_accuracy(&samples, &labels).unwrap(),
            1.0
        );
        assert_eq!(svm.predict_batch(&samples).unwrap(), labels);
        assert_eq!(svm.decision_function(&[0.0, 0.0]).unwrap().len(), 1);

        let info = svm.info().unwrap();
        assert_eq!(info.n_classes, 2);
        assert_eq!(info.n_support_vectors, report.n_support_vectors);
    }

    #[test]
    fn test_predictor_validates_input() {
        let svm = SVM::new();
        svm.train(&blob_data()).unwrap();

        assert!(matches!(
            svm.predict(&[1.0]),
            Err(SVMError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            svm.compute_class_accuracy(&[[0.0, 0.0]], &[0.0, 1.0]),
            Err(SVMError::ShapeError(_))
        ));
        assert!(matches!(
            svm.compute_mse(&[[0.0, 0.0]], &[0.0]),
            Err(SVMError::WrongModelType { .. })
        ));
    }

    #[test]
    fn test_failed_training_keeps_previous_model() {
        let svm = SVM::new();
        svm.train(&blob_data()).unwrap();
        let before = svm.model().unwrap();

        svm.set_c(-1.0);
        assert!(matches!(
            svm.train(&blob_data()),
            Err(SVMError::InvalidParameter(_))
        ));
        assert!(Arc::ptr_eq(&before, &svm.model().unwrap()));
        assert!(!svm.is_training());

        assert!(matches!(
            svm.train(&TrainingData::default()),
            Err(SVMError::EmptyDataset)
        ));
        assert!(!svm.is_training());
    }

    #[test]
    fn test_concurrent_training_is_rejected() {
        let svm = SVM::new();
        let guard = TrainingGuard::acquire(&svm.shared).unwrap();
        assert!(svm.is_training());

        assert!(matches!(
            svm.train(&blob_data()),
            Err(SVMError::ConcurrentTraining)
        ));
        let result = svm.train_async(&blob_data(), |_| panic!("must not run"));
        assert!(matches!(result, Err(SVMError::ConcurrentTraining)));
        assert!(!svm.is_trained());

        drop(guard);
        assert!(!svm.is_training());
        assert!(svm.train(&blob_data()).is_ok());
    }

    #[test]
    fn test_async_completion_fires_once_while_training() {
        let svm = SVM::new();
        let observer = svm.clone();
        let (tx, rx) = mpsc::channel();

        let handle = svm
            .train_async(&blob_data(), move |result| {
                tx.send((result.is_ok(), observer.is_training(), observer.is_trained()))
                    .unwrap();
            })
            .expect("spawn should succeed");
        handle.join().unwrap();

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(events, vec![(true, true, true)]);
        assert!(!svm.is_training());
        assert!(svm.is_trained());
    }

    #[test]
    fn test_async_reports_fit_errors_through_completion() {
        let (tx, rx) = mpsc::channel();
        let data = TrainingData::new(&[[0.0], [1.0]], &[1.0, 1.0], SampleLayout::Row).unwrap();

        let handle = SVM::new()
            .train_async(&data, move |result| tx.send(result.is_err()).unwrap())
            .unwrap();
        handle.join().unwrap();

        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![true]);
    }

    #[test]
    fn test_write_and_load_round_trip() {
        let (samples, _) = blobs();
        let svm = SVM::new().with_gamma(0.5);
        svm.train(&blob_data()).unwrap();

        let file = NamedTempFile::new().unwrap();
        svm.write_to_file(file.path()).unwrap();
        let loaded = SVM::init_from_file(file.path()).unwrap();

        assert!(loaded.is_trained());
        assert_eq!(loaded.gamma(), 0.5);
        for s in &samples {
            assert_eq!(
                loaded.decision_function(s).unwrap(),
                svm.decision_function(s).unwrap()
            );
        }
    }

    #[test]
    fn test_custom_kernel_model_needs_kernel_to_load() {
        let kernel: Arc<dyn Kernel> =
            Arc::new(|x: &[f64], y: &[f64]| -> f64 { x.iter().zip(y).map(|(a, b)| a * b).sum() });
        let svm = SVM::new().with_custom_kernel(Arc::clone(&kernel));
        assert_eq!(svm.kernel_type(), KernelType::Custom);
        svm.train(&blob_data()).unwrap();

        let file = NamedTempFile::new().unwrap();
        svm.write_to_file(file.path()).unwrap();

        assert!(matches!(
            SVM::init_from_file(file.path()),
            Err(SVMError::UnsupportedKernel(_))
        ));
        let loaded = SVM::init_from_file_with_kernel(file.path(), kernel).unwrap();
        assert_eq!(loaded.predict(&[2.0, 2.0]).unwrap(), 1.0);
    }
}
