//! Shared, replaceable training data

use crate::core::{Result, SVMError, SampleLayout};
use crate::data::SampleMatrix;
use log::debug;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

/// Labeled training samples
///
/// A cheap handle: clones share the same contents. Every import replaces the
/// contents wholesale, and only once the new samples validated completely,
/// so a failed import leaves the previous contents in place.
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    inner: Arc<RwLock<Option<Arc<SampleMatrix>>>>,
}

impl TrainingData {
    /// Create training data from nested samples and their labels
    pub fn new<S: AsRef<[f64]>>(
        samples: &[S],
        labels: &[f64],
        layout: SampleLayout,
    ) -> Result<Self> {
        let data = Self::default();
        data.import_samples(samples, labels, layout)?;
        Ok(data)
    }

    /// Wrap an already validated matrix
    pub fn from_matrix(matrix: SampleMatrix) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(Arc::new(matrix)))),
        }
    }

    /// Replace the contents with the given samples
    pub fn import_samples<S: AsRef<[f64]>>(
        &self,
        samples: &[S],
        labels: &[f64],
        layout: SampleLayout,
    ) -> Result<()> {
        let matrix = SampleMatrix::from_nested(samples, labels, layout)?;
        self.replace(matrix);
        Ok(())
    }

    /// Replace the contents on a background thread
    ///
    /// `completion` runs exactly once on that thread, after the contents were
    /// replaced (or left untouched on error).
    pub fn import_samples_async<S, F>(
        &self,
        samples: Vec<S>,
        labels: Vec<f64>,
        layout: SampleLayout,
        completion: F,
    ) -> Result<JoinHandle<()>>
    where
        S: AsRef<[f64]> + Send + 'static,
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let data = self.clone();
        let handle = thread::Builder::new()
            .name("svmkit-import".to_string())
            .spawn(move || {
                let result = data.import_samples(&samples, &labels, layout);
                completion(result);
            })
            .map_err(SVMError::IoError)?;
        Ok(handle)
    }

    /// Current contents, if any samples were imported
    pub fn snapshot(&self) -> Option<Arc<SampleMatrix>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.snapshot().map(|m| m.n_samples()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of features per sample
    pub fn n_features(&self) -> usize {
        self.snapshot().map(|m| m.n_features()).unwrap_or(0)
    }

    fn replace(&self, matrix: SampleMatrix) {
        debug!(
            "Importing {} samples with {} features",
            matrix.n_samples(),
            matrix.n_features()
        );
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(matrix));
    }
}
