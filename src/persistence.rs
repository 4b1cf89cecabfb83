//! Model serialization and persistence
//!
//! Models are stored as a self-describing JSON document. Fields unknown to
//! this version are ignored on load, so documents may grow new fields without
//! a version bump; a structural change bumps [`FORMAT_VERSION`].

use crate::core::{Hyperparameters, KernelType, ProblemType, Result, SVMError, SVMModel};
use crate::kernel::{build_kernel, Kernel};
use crate::model::{DecisionFunction, Model, ModelParts};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Newest document version this library reads and the one it writes
pub const FORMAT_VERSION: u32 = 1;

/// Serializable representation of a trained SVM model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableModel {
    pub format_version: u32,
    #[serde(flatten)]
    pub metadata: ModelMetadata,
    pub problem_type: ProblemType,
    pub kernel_type: KernelType,
    pub hyperparameters: Hyperparameters,
    pub n_features: usize,
    /// Sorted class labels; empty for one-class and regression models
    #[serde(default)]
    pub classes: Vec<f64>,
    pub support_vectors: Vec<Vec<f64>>,
    pub decision_functions: Vec<DecisionFunction>,
}

/// Model metadata for tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl SerializableModel {
    /// Create a serializable model from a trained model
    pub fn from_model(model: &Model) -> Self {
        let hyperparameters = *model.hyperparameters();
        Self {
            format_version: FORMAT_VERSION,
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
            problem_type: hyperparameters.problem_type,
            kernel_type: hyperparameters.kernel_type,
            hyperparameters,
            n_features: model.n_features(),
            classes: model.classes().to_vec(),
            support_vectors: model.support_vectors().to_vec(),
            decision_functions: model.decision_functions().to_vec(),
        }
    }

    /// Rebuild the model
    ///
    /// `custom` supplies the kernel function of [`KernelType::Custom`]
    /// models, which cannot be stored in the document.
    pub fn into_model(self, custom: Option<&Arc<dyn Kernel>>) -> Result<Model> {
        let parts = self.into_parts()?;
        let kernel = build_kernel(&parts.hyperparameters, custom)?;
        Model::from_parts(parts, kernel)
    }

    /// Check the document's consistency without building its kernel
    ///
    /// Succeeds for custom-kernel documents whose parts are sound.
    pub fn validate(&self) -> Result<()> {
        self.clone().into_parts()?.validate()
    }

    fn into_parts(self) -> Result<ModelParts> {
        if self.problem_type != self.hyperparameters.problem_type
            || self.kernel_type != self.hyperparameters.kernel_type
        {
            return Err(SVMError::FormatError(
                "problem or kernel type disagrees with the stored hyperparameters".to_string(),
            ));
        }

        Ok(ModelParts {
            hyperparameters: self.hyperparameters,
            n_features: self.n_features,
            classes: self.classes,
            support_vectors: self.support_vectors,
            decision_functions: self.decision_functions,
        })
    }

    /// Save model to file, replacing any existing file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SVMError::FormatError(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse a document, checking its version before its structure
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| SVMError::FormatError(e.to_string()))?;

        let version = value
            .get("format_version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| SVMError::FormatError("missing format_version".to_string()))?;
        if version > u64::from(FORMAT_VERSION) {
            return Err(SVMError::FormatError(format!(
                "format version {version} is newer than the supported version {FORMAT_VERSION}"
            )));
        }

        serde_json::from_value(value).map_err(|e| SVMError::FormatError(e.to_string()))
    }

    /// Print model summary
    pub fn print_summary(&self) {
        let params = &self.hyperparameters;
        println!("=== SVM Model Summary ===");
        println!("Problem Type: {}", self.problem_type);
        println!("Kernel Type: {}", self.kernel_type);
        println!("Features: {}", self.n_features);
        if !self.classes.is_empty() {
            println!("Classes: {:?}", self.classes);
        }
        println!("Support Vectors: {}", self.support_vectors.len());
        println!("Decision Functions: {}", self.decision_functions.len());
        println!("Format Version: {}", self.format_version);
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at);
        println!("Hyperparameters:");
        println!("  C: {}", params.c);
        println!("  Gamma: {}", params.gamma);
        println!("  Nu: {}", params.nu);
        println!("  P: {}", params.p);
        println!("  Degree: {}", params.degree);
        println!("  Coef0: {}", params.coef0);
    }
}
