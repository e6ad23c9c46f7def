//! Activation functions and their gradient rules.
//!
//! Every activation comes as an allocating function, an in-place variant and
//! a backward function. Backward functions receive the cached tensor they
//! depend on explicitly: the pre-activation input for the ReLU family, the
//! forward output for sigmoid and tanh.

use crate::error::Result;
use crate::linalg::{validate_matrix, validate_same_shape, Matrix};
use serde::{Deserialize, Serialize};

/// Sigmoid saturates to exactly 0 or 1 beyond this magnitude.
const SIGMOID_CLIP: f64 = 20.0;

/// Activation applied after a dense layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    LeakyRelu { alpha: f64 },
    Elu { alpha: f64 },
    Sigmoid,
    Tanh,
    Softmax,
    Linear,
}

impl Activation {
    /// Leaky ReLU with the usual 0.01 slope.
    pub const fn leaky_relu() -> Self {
        Activation::LeakyRelu { alpha: 0.01 }
    }

    /// ELU with `alpha = 1`.
    pub const fn elu() -> Self {
        Activation::Elu { alpha: 1.0 }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Activation::Relu => "relu",
            Activation::LeakyRelu { .. } => "leaky_relu",
            Activation::Elu { .. } => "elu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Softmax => "softmax",
            Activation::Linear => "linear",
        }
    }

    /// Apply the activation, returning a new matrix.
    pub fn forward(&self, inputs: &Matrix) -> Result<Matrix> {
        match *self {
            Activation::Relu => relu(inputs),
            Activation::LeakyRelu { alpha } => leaky_relu(inputs, alpha),
            Activation::Elu { alpha } => elu(inputs, alpha),
            Activation::Sigmoid => sigmoid(inputs),
            Activation::Tanh => tanh(inputs),
            Activation::Softmax => softmax(inputs),
            Activation::Linear => {
                validate_matrix(inputs, "linear")?;
                Ok(inputs.clone())
            }
        }
    }

    /// Apply the activation in place.
    pub fn forward_in_place(&self, inputs: &mut Matrix) -> Result<()> {
        match *self {
            Activation::Relu => relu_in_place(inputs),
            Activation::LeakyRelu { alpha } => leaky_relu_in_place(inputs, alpha),
            Activation::Elu { alpha } => elu_in_place(inputs, alpha),
            Activation::Sigmoid => sigmoid_in_place(inputs),
            Activation::Tanh => tanh_in_place(inputs),
            Activation::Softmax => softmax_in_place(inputs),
            Activation::Linear => validate_matrix(inputs, "linear").map(|_| ()),
        }
    }

    /// Gradient with respect to the activation input.
    ///
    /// `pre_activation` is the tensor fed into `forward`; `output` is what
    /// `forward` returned. Each rule reads only the one it needs.
    pub fn backward(
        &self,
        d_outputs: &Matrix,
        pre_activation: &Matrix,
        output: &Matrix,
    ) -> Result<Matrix> {
        match *self {
            Activation::Relu => relu_backward(d_outputs, pre_activation),
            Activation::LeakyRelu { alpha } => {
                leaky_relu_backward(d_outputs, pre_activation, alpha)
            }
            Activation::Elu { alpha } => elu_backward(d_outputs, pre_activation, alpha),
            Activation::Sigmoid => sigmoid_backward(d_outputs, output),
            Activation::Tanh => tanh_backward(d_outputs, output),
            Activation::Softmax => softmax_backward(d_outputs, output),
            Activation::Linear => {
                validate_same_shape(d_outputs, pre_activation, "linear_backward")?;
                Ok(d_outputs.clone())
            }
        }
    }

    /// True when `backward` needs the forward output rather than the input.
    pub fn backward_uses_output(&self) -> bool {
        matches!(self, Activation::Sigmoid | Activation::Tanh | Activation::Softmax)
    }
}

impl std::fmt::Display for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn map(inputs: &Matrix, op: &'static str, f: impl Fn(f64) -> f64) -> Result<Matrix> {
    validate_matrix(inputs, op)?;
    Ok(inputs
        .iter()
        .map(|row| row.iter().map(|&x| f(x)).collect())
        .collect())
}

fn map_in_place(inputs: &mut Matrix, op: &'static str, f: impl Fn(f64) -> f64) -> Result<()> {
    validate_matrix(inputs, op)?;
    for x in inputs.iter_mut().flatten() {
        *x = f(*x);
    }
    Ok(())
}

/// Combine an upstream gradient with a cached tensor elementwise.
fn zip_grad(
    d_outputs: &Matrix,
    cache: &Matrix,
    op: &'static str,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Matrix> {
    validate_same_shape(d_outputs, cache, op)?;
    Ok(d_outputs
        .iter()
        .zip(cache)
        .map(|(d_row, c_row)| d_row.iter().zip(c_row).map(|(&d, &c)| f(d, c)).collect())
        .collect())
}

#[inline]
fn sigmoid_scalar(x: f64) -> f64 {
    if x < -SIGMOID_CLIP {
        0.0
    } else if x > SIGMOID_CLIP {
        1.0
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}

#[inline]
fn elu_scalar(x: f64, alpha: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        alpha * (x.exp() - 1.0)
    }
}

// ReLU family

pub fn relu(inputs: &Matrix) -> Result<Matrix> {
    map(inputs, "relu", |x| x.max(0.0))
}

pub fn relu_in_place(inputs: &mut Matrix) -> Result<()> {
    map_in_place(inputs, "relu", |x| x.max(0.0))
}

/// Passes `d_outputs` through where the pre-activation input was positive.
pub fn relu_backward(d_outputs: &Matrix, inputs: &Matrix) -> Result<Matrix> {
    zip_grad(d_outputs, inputs, "relu_backward", |d, x| if x > 0.0 { d } else { 0.0 })
}

pub fn leaky_relu(inputs: &Matrix, alpha: f64) -> Result<Matrix> {
    map(inputs, "leaky_relu", |x| if x > 0.0 { x } else { alpha * x })
}

pub fn leaky_relu_in_place(inputs: &mut Matrix, alpha: f64) -> Result<()> {
    map_in_place(inputs, "leaky_relu", |x| if x > 0.0 { x } else { alpha * x })
}

pub fn leaky_relu_backward(d_outputs: &Matrix, inputs: &Matrix, alpha: f64) -> Result<Matrix> {
    zip_grad(d_outputs, inputs, "leaky_relu_backward", |d, x| {
        if x > 0.0 {
            d
        } else {
            alpha * d
        }
    })
}

pub fn elu(inputs: &Matrix, alpha: f64) -> Result<Matrix> {
    map(inputs, "elu", |x| elu_scalar(x, alpha))
}

pub fn elu_in_place(inputs: &mut Matrix, alpha: f64) -> Result<()> {
    map_in_place(inputs, "elu", |x| elu_scalar(x, alpha))
}

pub fn elu_backward(d_outputs: &Matrix, inputs: &Matrix, alpha: f64) -> Result<Matrix> {
    zip_grad(d_outputs, inputs, "elu_backward", |d, x| {
        if x > 0.0 {
            d
        } else {
            d * alpha * x.exp()
        }
    })
}

// Sigmoid / tanh

pub fn sigmoid(inputs: &Matrix) -> Result<Matrix> {
    map(inputs, "sigmoid", sigmoid_scalar)
}

pub fn sigmoid_in_place(inputs: &mut Matrix) -> Result<()> {
    map_in_place(inputs, "sigmoid", sigmoid_scalar)
}

/// `d_in = d_out * out * (1 - out)`, using the forward output.
pub fn sigmoid_backward(d_outputs: &Matrix, outputs: &Matrix) -> Result<Matrix> {
    zip_grad(d_outputs, outputs, "sigmoid_backward", |d, y| d * y * (1.0 - y))
}

pub fn tanh(inputs: &Matrix) -> Result<Matrix> {
    map(inputs, "tanh", f64::tanh)
}

pub fn tanh_in_place(inputs: &mut Matrix) -> Result<()> {
    map_in_place(inputs, "tanh", f64::tanh)
}

/// `d_in = d_out * (1 - out²)`, using the forward output.
pub fn tanh_backward(d_outputs: &Matrix, outputs: &Matrix) -> Result<Matrix> {
    zip_grad(d_outputs, outputs, "tanh_backward", |d, y| d * (1.0 - y * y))
}

// Softmax

fn softmax_row(row: &mut [f64]) {
    let Some(max) = row.iter().copied().reduce(f64::max) else {
        return;
    };
    let mut sum = 0.0;
    for x in row.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    for x in row.iter_mut() {
        *x /= sum;
    }
}

/// Row-wise softmax, shifted by the row maximum for stability.
pub fn softmax(inputs: &Matrix) -> Result<Matrix> {
    let mut output = inputs.clone();
    softmax_in_place(&mut output)?;
    Ok(output)
}

pub fn softmax_in_place(inputs: &mut Matrix) -> Result<()> {
    validate_matrix(inputs, "softmax")?;
    for row in inputs.iter_mut() {
        softmax_row(row);
    }
    Ok(())
}

/// Placeholder gradient: returns `d_outputs` unchanged.
///
/// Softmax is always paired with cross-entropy, whose fused gradient
/// (`loss::softmax_cross_entropy_backward`) already targets the logits.
pub fn softmax_backward(d_outputs: &Matrix, outputs: &Matrix) -> Result<Matrix> {
    validate_same_shape(d_outputs, outputs, "softmax_backward")?;
    Ok(d_outputs.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn sample() -> Matrix {
        vec![
            vec![-2.0, -0.5, 0.0, 0.5, 3.0],
            vec![1000.0, -1000.0, 25.0, -25.0, 1e-3],
        ]
    }

    #[test]
    fn test_relu_properties() {
        let x = sample();
        let y = relu(&x).unwrap();
        for (xr, yr) in x.iter().zip(&y) {
            for (&xi, &yi) in xr.iter().zip(yr) {
                assert!(yi >= 0.0);
                if xi > 0.0 {
                    assert_eq!(yi, xi);
                }
            }
        }
    }

    #[test]
    fn test_in_place_matches_allocating() {
        let activations = [
            Activation::Relu,
            Activation::leaky_relu(),
            Activation::elu(),
            Activation::Sigmoid,
            Activation::Tanh,
            Activation::Softmax,
            Activation::Linear,
        ];
        for act in activations {
            let mut x = sample();
            let expected = act.forward(&x).unwrap();
            act.forward_in_place(&mut x).unwrap();
            assert_eq!(x, expected, "{act}");
        }
    }

    #[test]
    fn test_empty_and_ragged_inputs() {
        let empty: Matrix = Vec::new();
        assert!(matches!(relu(&empty), Err(Error::EmptyInput { .. })));
        assert!(matches!(softmax(&empty), Err(Error::EmptyInput { .. })));

        let mut ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(sigmoid(&ragged), Err(Error::RaggedMatrix { .. })));
        assert!(matches!(tanh_in_place(&mut ragged), Err(Error::RaggedMatrix { .. })));
    }

    #[test]
    fn test_relu_backward_uses_pre_activation() {
        let x = vec![vec![-1.0, 0.0, 2.0]];
        let d = vec![vec![5.0, 5.0, 5.0]];
        assert_eq!(relu_backward(&d, &x).unwrap(), vec![vec![0.0, 0.0, 5.0]]);
        assert!(matches!(
            relu_backward(&d, &vec![vec![1.0]]),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_leaky_relu_and_elu() {
        let x = vec![vec![-2.0, 3.0]];
        assert_eq!(leaky_relu(&x, 0.1).unwrap(), vec![vec![-0.2, 3.0]]);
        let e = elu(&x, 1.0).unwrap();
        assert!((e[0][0] - ((-2.0f64).exp() - 1.0)).abs() < 1e-12);
        assert_eq!(e[0][1], 3.0);

        let d = vec![vec![1.0, 1.0]];
        assert_eq!(leaky_relu_backward(&d, &x, 0.1).unwrap(), vec![vec![0.1, 1.0]]);
        let de = elu_backward(&d, &x, 1.0).unwrap();
        assert!((de[0][0] - (-2.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_sigmoid_clamps_and_stays_finite() {
        let y = sigmoid(&sample()).unwrap();
        assert_eq!(y[1][0], 1.0);
        assert_eq!(y[1][1], 0.0);
        assert_eq!(y[1][2], 1.0);
        assert_eq!(y[1][3], 0.0);
        assert!((y[0][2] - 0.5).abs() < 1e-12);
        assert!(y.iter().flatten().all(|v| v.is_finite() && (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_sigmoid_and_tanh_backward() {
        let out = vec![vec![0.5, 0.25]];
        let d = vec![vec![2.0, 4.0]];
        assert_eq!(sigmoid_backward(&d, &out).unwrap(), vec![vec![0.5, 0.75]]);
        assert_eq!(tanh_backward(&d, &out).unwrap(), vec![vec![1.5, 3.75]]);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let y = softmax(&sample()).unwrap();
        for row in &y {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_softmax_known_values() {
        let y = softmax(&vec![vec![0.0, 0.0], vec![1.0, 1.0 + 2f64.ln()]]).unwrap();
        assert!((y[0][0] - 0.5).abs() < 1e-12);
        assert!((y[1][1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_softmax_backward_is_passthrough() {
        let out = vec![vec![0.2, 0.8]];
        let d = vec![vec![0.1, -0.1]];
        assert_eq!(softmax_backward(&d, &out).unwrap(), d);
    }

    #[test]
    fn test_dispatch_backward() {
        let x = vec![vec![-1.0, 1.0]];
        let d = vec![vec![1.0, 1.0]];
        let y = Activation::Relu.forward(&x).unwrap();
        assert_eq!(Activation::Relu.backward(&d, &x, &y).unwrap(), vec![vec![0.0, 1.0]]);

        let y = Activation::Sigmoid.forward(&x).unwrap();
        let expected = sigmoid_backward(&d, &y).unwrap();
        assert_eq!(Activation::Sigmoid.backward(&d, &x, &y).unwrap(), expected);
        assert!(Activation::Tanh.backward_uses_output());
        assert!(!Activation::Relu.backward_uses_output());
    }

    #[test]
    fn test_activation_yaml_names() {
        let act: Activation = serde_yaml::from_str("relu").unwrap();
        assert_eq!(act, Activation::Relu);
        let yaml = serde_yaml::to_string(&Activation::LeakyRelu { alpha: 0.2 }).unwrap();
        let act: Activation = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(act, Activation::LeakyRelu { alpha: 0.2 });
    }
}
