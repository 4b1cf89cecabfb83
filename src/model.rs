//! Fitted SVM models
//!
//! A [`Model`] is immutable once built. Training produces a new one and the
//! owning [`SVM`](crate::SVM) swaps it in atomically, so readers holding an
//! `Arc<Model>` never observe a half-written model.

use crate::core::{Hyperparameters, Prediction, ProblemType, Result, SVMError, SVMModel};
use crate::kernel::Kernel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One binary decision function `f(x) = Σ cₖK(svₖ, x) - rho`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionFunction {
    /// Indices into the model's class list; `f(x) > 0` votes for the first
    ///
    /// `None` for one-class and regression models.
    #[serde(default)]
    pub class_pair: Option<(usize, usize)>,
    /// Indices into the model's support vector pool
    pub sv_indices: Vec<usize>,
    /// Signed dual coefficients, one per support vector
    pub coefficients: Vec<f64>,
    pub rho: f64,
}

/// Everything a model is made of except the kernel function itself
#[derive(Debug, Clone)]
pub struct ModelParts {
    pub hyperparameters: Hyperparameters,
    pub n_features: usize,
    /// Sorted class labels, empty unless the model classifies into classes
    pub classes: Vec<f64>,
    pub support_vectors: Vec<Vec<f64>>,
    pub decision_functions: Vec<DecisionFunction>,
}

/// A fitted SVM
pub struct Model {
    parts: ModelParts,
    kernel: Arc<dyn Kernel>,
}

impl Model {
    /// Assemble a model, checking that its parts are mutually consistent
    pub fn from_parts(parts: ModelParts, kernel: Arc<dyn Kernel>) -> Result<Self> {
        parts.validate()?;
        Ok(Self { parts, kernel })
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.parts.hyperparameters
    }

    pub fn problem_type(&self) -> ProblemType {
        self.parts.hyperparameters.problem_type
    }

    pub fn classes(&self) -> &[f64] {
        &self.parts.classes
    }

    pub fn support_vectors(&self) -> &[Vec<f64>] {
        &self.parts.support_vectors
    }

    pub fn decision_functions(&self) -> &[DecisionFunction] {
        &self.parts.decision_functions
    }

    /// Raw value of every decision function at `x`
    pub fn decision_values(&self, x: &[f64]) -> Vec<f64> {
        let kernel_values: Vec<f64> = self
            .parts
            .support_vectors
            .iter()
            .map(|sv| self.kernel.compute(sv, x))
            .collect();

        self.parts
            .decision_functions
            .iter()
            .map(|df| {
                let sum: f64 = df
                    .sv_indices
                    .iter()
                    .zip(&df.coefficients)
                    .map(|(&k, c)| c * kernel_values[k])
                    .sum();
                sum - df.rho
            })
            .collect()
    }

    fn vote(&self, values: &[f64]) -> Prediction {
        let classes = &self.parts.classes;
        let mut votes = vec![0usize; classes.len()];
        for (df, &value) in self.parts.decision_functions.iter().zip(values) {
            if let Some((a, b)) = df.class_pair {
                if value > 0.0 {
                    votes[a] += 1;
                } else {
                    votes[b] += 1;
                }
            }
        }

        // Ties go to the class listed first
        let mut winner = 0;
        for (k, &v) in votes.iter().enumerate() {
            if v > votes[winner] {
                winner = k;
            }
        }

        if values.len() == 1 {
            Prediction::new(classes[winner], values[0])
        } else {
            Prediction::new(classes[winner], votes[winner] as f64)
        }
    }
}

impl SVMModel for Model {
    fn predict(&self, x: &[f64]) -> Prediction {
        let values = self.decision_values(x);
        match self.problem_type() {
            ProblemType::CSvc | ProblemType::NuSvc => self.vote(&values),
            ProblemType::OneClass => {
                let value = values[0];
                let label = if value > 0.0 { 1.0 } else { 0.0 };
                Prediction::new(label, value)
            }
            ProblemType::EpsSvr | ProblemType::NuSvr => Prediction::new(values[0], values[0]),
        }
    }

    fn n_support_vectors(&self) -> usize {
        self.parts.support_vectors.len()
    }

    fn n_features(&self) -> usize {
        self.parts.n_features
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("hyperparameters", &self.parts.hyperparameters)
            .field("n_features", &self.parts.n_features)
            .field("classes", &self.parts.classes)
            .field("n_support_vectors", &self.parts.support_vectors.len())
            .field("n_decision_functions", &self.parts.decision_functions.len())
            .finish()
    }
}

impl ModelParts {
    /// Check that the parts are mutually consistent
    pub fn validate(&self) -> Result<()> {
        validate(self)
    }
}

fn validate(parts: &ModelParts) -> Result<()> {
    let bad = |msg: String| Err(SVMError::FormatError(msg));

    parts
        .hyperparameters
        .validate()
        .map_err(|e| SVMError::FormatError(e.to_string()))?;

    if parts.n_features == 0 {
        return bad("model has zero features".into());
    }
    for (k, sv) in parts.support_vectors.iter().enumerate() {
        if sv.len() != parts.n_features {
            return bad(format!(
                "support vector {k} has {} values, expected {}",
                sv.len(),
                parts.n_features
            ));
        }
        if sv.iter().any(|v| !v.is_finite()) {
            return bad(format!("support vector {k} has non-finite values"));
        }
    }

    let n_sv = parts.support_vectors.len();
    for (k, df) in parts.decision_functions.iter().enumerate() {
        if df.sv_indices.len() != df.coefficients.len() {
            return bad(format!(
                "decision function {k} has {} indices but {} coefficients",
                df.sv_indices.len(),
                df.coefficients.len()
            ));
        }
        if let Some(&idx) = df.sv_indices.iter().find(|&&idx| idx >= n_sv) {
            return bad(format!(
                "decision function {k} references support vector {idx} of {n_sv}"
            ));
        }
        if !df.rho.is_finite() || df.coefficients.iter().any(|c| !c.is_finite()) {
            return bad(format!("decision function {k} has non-finite values"));
        }
    }

    let n_df = parts.decision_functions.len();
    match parts.hyperparameters.problem_type {
        ProblemType::CSvc | ProblemType::NuSvc => {
            let n_classes = parts.classes.len();
            if n_classes < 2 {
                return bad(format!("classifier has {n_classes} classes"));
            }
            if parts.classes.windows(2).any(|w| w[0] >= w[1]) {
                return bad("class labels must be strictly increasing".into());
            }
            if n_df != n_classes * (n_classes - 1) / 2 {
                return bad(format!(
                    "{n_classes} classes need {} decision functions, found {n_df}",
                    n_classes * (n_classes - 1) / 2
                ));
            }
            for df in &parts.decision_functions {
                match df.class_pair {
                    Some((a, b)) if a < b && b < n_classes => {}
                    other => return bad(format!("invalid class pair {other:?}")),
                }
            }
        }
        ProblemType::OneClass | ProblemType::EpsSvr | ProblemType::NuSvr => {
            if n_df != 1 {
                return bad(format!("expected one decision function, found {n_df}"));
            }
            if parts.decision_functions[0].class_pair.is_some() {
                return bad("unexpected class pair".into());
            }
        }
    }

    Ok(())
}
