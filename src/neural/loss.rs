//! Categorical cross-entropy and its fused softmax gradient.

use crate::error::{Error, Result};
use crate::linalg::{validate_matrix, Matrix};

/// Floor applied to probabilities before taking the log.
pub const EPSILON: f64 = 1e-15;

/// Validate predictions against labels. Returns the class count.
fn validate(predictions: &Matrix, labels: &[usize], op: &'static str) -> Result<usize> {
    let classes = validate_matrix(predictions, op)?;
    if labels.len() != predictions.len() {
        return Err(Error::mismatch(op, predictions.len(), labels.len()));
    }
    if let Some((sample, &label)) = labels.iter().enumerate().find(|&(_, &l)| l >= classes) {
        return Err(Error::InvalidLabel {
            sample,
            label,
            classes,
        });
    }
    Ok(classes)
}

/// Mean categorical cross-entropy: `-(1/N) Σ ln(max(p[i][label_i], ε))`.
///
/// `predictions` are softmax probabilities, one row per sample.
pub fn categorical_cross_entropy(predictions: &Matrix, labels: &[usize]) -> Result<f64> {
    validate(predictions, labels, "categorical_cross_entropy")?;
    let total: f64 = predictions
        .iter()
        .zip(labels)
        .map(|(row, &label)| -row[label].max(EPSILON).ln())
        .sum();
    Ok(total / predictions.len() as f64)
}

/// Gradient of softmax + cross-entropy with respect to the logits.
///
/// `d[i][j] = (p[i][j] - 1{j = label_i}) / N`. Only valid when softmax
/// produced `predictions`.
pub fn softmax_cross_entropy_backward(predictions: &Matrix, labels: &[usize]) -> Result<Matrix> {
    validate(predictions, labels, "softmax_cross_entropy_backward")?;
    let n = predictions.len() as f64;
    Ok(predictions
        .iter()
        .zip(labels)
        .map(|(row, &label)| {
            row.iter()
                .enumerate()
                .map(|(j, &p)| if j == label { (p - 1.0) / n } else { p / n })
                .collect()
        })
        .collect())
}

/// Index of the largest entry in each row.
pub fn argmax_rows(predictions: &Matrix) -> Result<Vec<usize>> {
    validate_matrix(predictions, "argmax")?;
    Ok(predictions
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (j, &p)| {
                    if p > best.1 {
                        (j, p)
                    } else {
                        best
                    }
                })
                .0
        })
        .collect())
}

/// Fraction of rows whose arg-max matches the label.
pub fn accuracy(predictions: &Matrix, labels: &[usize]) -> Result<f64> {
    validate(predictions, labels, "accuracy")?;
    let predicted = argmax_rows(predictions)?;
    let correct = predicted.iter().zip(labels).filter(|(p, l)| p == l).count();
    Ok(correct as f64 / labels.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_entropy_known_value() {
        let loss = categorical_cross_entropy(&vec![vec![0.7, 0.2, 0.1]], &[0]).unwrap();
        assert!((loss - (-(0.7f64).ln())).abs() < 1e-12);
        assert!((loss - 0.3567).abs() < 1e-4);
    }

    #[test]
    fn test_cross_entropy_limits() {
        let perfect = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(categorical_cross_entropy(&perfect, &[0, 1]).unwrap(), 0.0);

        let nearly = vec![vec![1.0 - 1e-9, 1e-9]];
        assert!(categorical_cross_entropy(&nearly, &[0]).unwrap() < 1e-8);

        let imperfect = vec![vec![1.0, 0.0], vec![0.4, 0.6]];
        assert!(categorical_cross_entropy(&imperfect, &[0, 1]).unwrap() > 0.0);
    }

    #[test]
    fn test_cross_entropy_clamps_zero_probability() {
        let loss = categorical_cross_entropy(&vec![vec![0.0, 1.0]], &[0]).unwrap();
        assert!(loss.is_finite());
        assert!((loss - (-EPSILON.ln())).abs() < 1e-9);
    }

    #[test]
    fn test_cross_entropy_errors() {
        assert!(matches!(
            categorical_cross_entropy(&Vec::new(), &[]),
            Err(Error::EmptyInput { .. })
        ));
        assert!(matches!(
            categorical_cross_entropy(&vec![vec![0.5, 0.5]], &[0, 1]),
            Err(Error::DimensionMismatch { .. })
        ));
        assert_eq!(
            categorical_cross_entropy(&vec![vec![0.5, 0.5], vec![0.5, 0.5]], &[0, 2]).unwrap_err(),
            Error::InvalidLabel { sample: 1, label: 2, classes: 2 }
        );
    }

    #[test]
    fn test_fused_backward_single_sample() {
        let d = softmax_cross_entropy_backward(&vec![vec![0.7, 0.2, 0.1]], &[0]).unwrap();
        let expected = [-0.3, 0.2, 0.1];
        for (got, want) in d[0].iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_fused_backward_divides_by_batch() {
        let p = vec![vec![0.5, 0.5], vec![0.1, 0.9]];
        let d = softmax_cross_entropy_backward(&p, &[1, 1]).unwrap();
        assert_eq!(d[0], vec![0.25, -0.25]);
        assert!((d[1][0] - 0.05).abs() < 1e-12);
        assert!((d[1][1] + 0.05).abs() < 1e-12);
        assert!(softmax_cross_entropy_backward(&p, &[0, 5]).is_err());
    }

    #[test]
    fn test_accuracy() {
        let p = vec![vec![0.9, 0.1], vec![0.3, 0.7], vec![0.6, 0.4], vec![0.2, 0.8]];
        assert_eq!(argmax_rows(&p).unwrap(), vec![0, 1, 0, 1]);
        assert_eq!(accuracy(&p, &[0, 1, 1, 1]).unwrap(), 0.75);
    }
}
