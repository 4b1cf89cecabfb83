//! Q-matrix views over kernel evaluations
//!
//! The dual problems solved by [`SMOSolver`](crate::solver::SMOSolver) all
//! share the form `min ½αᵀQα + pᵀα`. Only `Q` differs between formulations:
//! classification uses `Qᵢⱼ = yᵢyⱼK(xᵢ, xⱼ)`, regression doubles the variables
//! and uses signed copies of the kernel matrix.

use crate::cache::{CacheStats, KernelCache};
use crate::kernel::Kernel;
use std::sync::Arc;

/// Row access to the Q matrix of a dual problem
pub trait QMatrix {
    /// Row `i` of Q, covering every variable of the problem
    fn row(&mut self, i: usize) -> Arc<[f64]>;

    /// Diagonal of Q
    fn diagonal(&self) -> &[f64];

    /// Row cache counters
    fn cache_stats(&self) -> CacheStats;

    /// Number of variables
    fn len(&self) -> usize {
        self.diagonal().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Kernel evaluations over a fixed set of samples
struct KernelMatrix<'a> {
    rows: Vec<&'a [f64]>,
    norms: Vec<f64>,
    kernel: Arc<dyn Kernel>,
}

impl<'a> KernelMatrix<'a> {
    fn new(rows: Vec<&'a [f64]>, kernel: Arc<dyn Kernel>) -> Self {
        let norms = rows
            .iter()
            .map(|r| r.iter().map(|v| v * v).sum())
            .collect();
        Self {
            rows,
            norms,
            kernel,
        }
    }

    fn eval(&self, i: usize, j: usize) -> f64 {
        self.kernel
            .compute_with_norms(self.rows[i], self.rows[j], self.norms[i], self.norms[j])
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Q matrix for classification and one-class problems
pub struct ClassificationQ<'a> {
    km: KernelMatrix<'a>,
    y: Vec<f64>,
    qd: Vec<f64>,
    cache: KernelCache,
}

impl<'a> ClassificationQ<'a> {
    /// `y` holds the ±1 sign of every sample
    pub fn new(
        rows: Vec<&'a [f64]>,
        y: Vec<f64>,
        kernel: Arc<dyn Kernel>,
        cache_bytes: usize,
    ) -> Self {
        let km = KernelMatrix::new(rows, kernel);
        let qd = (0..km.len()).map(|i| km.eval(i, i)).collect();
        let cache = KernelCache::with_memory_limit(cache_bytes, km.len());
        Self { km, y, qd, cache }
    }

    /// One-class problems treat every sample as the positive class
    pub fn one_class(rows: Vec<&'a [f64]>, kernel: Arc<dyn Kernel>, cache_bytes: usize) -> Self {
        let y = vec![1.0; rows.len()];
        Self::new(rows, y, kernel, cache_bytes)
    }
}

impl QMatrix for ClassificationQ<'_> {
    fn row(&mut self, i: usize) -> Arc<[f64]> {
        let km = &self.km;
        let y = &self.y;
        self.cache.get_or_insert_with(i, || {
            (0..km.len()).map(|j| y[i] * y[j] * km.eval(i, j)).collect()
        })
    }

    fn diagonal(&self) -> &[f64] {
        &self.qd
    }

    fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Q matrix for ε-SVR and ν-SVR
///
/// Variable `k < l` is α⁺ of sample `k`, variable `k ≥ l` is α⁻ of sample
/// `k - l`; `Qₖₜ = sₖsₜK(x_{k mod l}, x_{t mod l})` with `s = +1` for the
/// first half and `-1` for the second.
pub struct RegressionQ<'a> {
    km: KernelMatrix<'a>,
    qd: Vec<f64>,
    cache: KernelCache,
}

impl<'a> RegressionQ<'a> {
    pub fn new(rows: Vec<&'a [f64]>, kernel: Arc<dyn Kernel>, cache_bytes: usize) -> Self {
        let km = KernelMatrix::new(rows, kernel);
        let diag: Vec<f64> = (0..km.len()).map(|i| km.eval(i, i)).collect();
        let qd = diag.iter().chain(diag.iter()).copied().collect();
        let cache = KernelCache::with_memory_limit(cache_bytes, km.len());
        Self { km, qd, cache }
    }

    fn sign(&self, k: usize) -> f64 {
        if k < self.km.len() {
            1.0
        } else {
            -1.0
        }
    }
}

impl QMatrix for RegressionQ<'_> {
    fn row(&mut self, k: usize) -> Arc<[f64]> {
        let l = self.km.len();
        let real = k % l;
        let km = &self.km;
        let kernel_row = self
            .cache
            .get_or_insert_with(real, || (0..l).map(|j| km.eval(real, j)).collect());

        let sign_k = self.sign(k);
        (0..2 * l)
            .map(|t| sign_k * self.sign(t) * kernel_row[t % l])
            .collect::<Vec<_>>()
            .into()
    }

    fn diagonal(&self) -> &[f64] {
        &self.qd
    }

    fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
