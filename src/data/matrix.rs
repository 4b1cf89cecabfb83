//! Dense sample matrix
//!
//! Normalizes nested numeric sequences (row- or column-major) into a
//! validated, rectangular row-major matrix with one label per row.

use crate::core::{Dataset, Result, SVMError, SampleLayout};

/// Validated dense matrix of samples plus their labels
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMatrix {
    /// Row-major feature values
    data: Vec<f64>,
    labels: Vec<f64>,
    n_features: usize,
}

impl SampleMatrix {
    /// Build a matrix from nested sequences
    ///
    /// With [`SampleLayout::Row`] every inner sequence is one sample; with
    /// [`SampleLayout::Column`] every inner sequence holds one feature for all
    /// samples. After normalization row *i* corresponds to `labels[i]`.
    ///
    /// # Errors
    /// [`SVMError::ShapeError`] for ragged input, a label count that differs
    /// from the sample count, an empty matrix, or non-finite values.
    pub fn from_nested<S: AsRef<[f64]>>(
        samples: &[S],
        labels: &[f64],
        layout: SampleLayout,
    ) -> Result<Self> {
        let outer = samples.len();
        let inner = samples.first().map(|s| s.as_ref().len()).unwrap_or(0);

        if let Some((pos, s)) = samples
            .iter()
            .enumerate()
            .find(|(_, s)| s.as_ref().len() != inner)
        {
            return Err(SVMError::ShapeError(format!(
                "{} {pos} has {} values, expected {inner}",
                match layout {
                    SampleLayout::Row => "row",
                    SampleLayout::Column => "column",
                },
                s.as_ref().len()
            )));
        }

        let (n_samples, n_features) = match layout {
            SampleLayout::Row => (outer, inner),
            SampleLayout::Column => (inner, outer),
        };

        if n_samples == 0 {
            return Err(SVMError::ShapeError("no samples".to_string()));
        }
        if n_features == 0 {
            return Err(SVMError::ShapeError(
                "samples have no features".to_string(),
            ));
        }
        if labels.len() != n_samples {
            return Err(SVMError::ShapeError(format!(
                "{} labels for {n_samples} samples",
                labels.len()
            )));
        }
        if let Some(pos) = labels.iter().position(|v| !v.is_finite()) {
            return Err(SVMError::ShapeError(format!(
                "label {pos} is not a finite number"
            )));
        }

        let mut data = Vec::with_capacity(n_samples * n_features);
        match layout {
            SampleLayout::Row => {
                for s in samples {
                    data.extend_from_slice(s.as_ref());
                }
            }
            SampleLayout::Column => {
                for i in 0..n_samples {
                    data.extend(samples.iter().map(|column| column.as_ref()[i]));
                }
            }
        }

        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(SVMError::ShapeError(format!(
                "sample {} feature {} is not a finite number",
                pos / n_features,
                pos % n_features
            )));
        }

        Ok(Self {
            data,
            labels: labels.to_vec(),
            n_features,
        })
    }

    /// Number of samples (rows)
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Number of features (columns)
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    /// Iterate over sample rows
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.n_features)
    }

    /// Copy of the given rows, in the given order
    pub fn select(&self, indices: &[usize]) -> SampleMatrix {
        let mut data = Vec::with_capacity(indices.len() * self.n_features);
        let mut labels = Vec::with_capacity(indices.len());
        for &i in indices {
            data.extend_from_slice(self.row(i));
            labels.push(self.labels[i]);
        }
        SampleMatrix {
            data,
            labels,
            n_features: self.n_features,
        }
    }

    /// Distinct labels in ascending order
    pub fn classes(&self) -> Vec<f64> {
        let mut classes = self.labels.clone();
        classes.sort_by(f64::total_cmp);
        classes.dedup();
        classes
    }
}

impl Dataset for SampleMatrix {
    fn len(&self) -> usize {
        self.n_samples()
    }

    fn dim(&self) -> usize {
        self.n_features
    }

    fn row(&self, i: usize) -> &[f64] {
        let start = i * self.n_features;
        &self.data[start..start + self.n_features]
    }

    fn label(&self, i: usize) -> f64 {
        self.labels[i]
    }

    fn get_labels(&self) -> Vec<f64> {
        self.labels.clone()
    }
}
