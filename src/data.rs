//! Labelled datasets and the synthetic spiral generator.

use crate::error::{Error, Result};
use crate::linalg::{validate_matrix, Matrix};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Feature matrix with one integer class label per row.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub features: Matrix,
    pub labels: Vec<usize>,
}

impl Dataset {
    /// Validate shapes and build a dataset.
    pub fn new(features: Matrix, labels: Vec<usize>) -> Result<Self> {
        validate_matrix(&features, "dataset")?;
        if labels.len() != features.len() {
            return Err(Error::mismatch("dataset", features.len(), labels.len()));
        }
        Ok(Self { features, labels })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of feature columns
    pub fn feature_count(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }

    /// One more than the largest label
    pub fn class_count(&self) -> usize {
        self.labels.iter().max().map_or(0, |&m| m + 1)
    }
}

/// Interleaved 2-D spirals, one arm per class.
///
/// For sample `i` of class `c`, with `s = i / (samples_per_class - 1)`:
/// radius `s`, angle `t = 4c + 4s + noise·N(0, 1)`, point
/// `(s·sin(2.5t), s·cos(2.5t))`.
pub fn spiral<R: Rng + ?Sized>(
    samples_per_class: usize,
    classes: usize,
    noise: f64,
    rng: &mut R,
) -> Result<Dataset> {
    if samples_per_class < 2 {
        return Err(Error::invalid_parameter(
            "spiral needs at least two samples per class",
        ));
    }
    if classes == 0 {
        return Err(Error::invalid_parameter("spiral needs at least one class"));
    }
    if !noise.is_finite() || noise < 0.0 {
        return Err(Error::invalid_parameter(format!(
            "noise must be finite and non-negative, got {noise}"
        )));
    }

    let total = samples_per_class * classes;
    let mut features = Vec::with_capacity(total);
    let mut labels = Vec::with_capacity(total);
    let span = (samples_per_class - 1) as f64;

    for class in 0..classes {
        for i in 0..samples_per_class {
            let s = i as f64 / span;
            let jitter: f64 = StandardNormal.sample(rng);
            let t = class as f64 * 4.0 + s * 4.0 + jitter * noise;
            features.push(vec![s * (t * 2.5).sin(), s * (t * 2.5).cos()]);
            labels.push(class);
        }
    }

    Dataset::new(features, labels)
}
