//! Dense (fully-connected) layer with forward/backward propagation.

use crate::error::{Error, Result};
use crate::linalg::{from_array, to_array, validate_matrix, Matrix};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Deep copy of one layer's parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerParams {
    pub weights: Array2<f64>,
    pub biases: Array1<f64>,
}

/// Gradients produced by one backward computation.
#[derive(Clone, Debug)]
pub struct LayerGradients {
    /// `[neurons, inputs]`, averaged over the batch
    pub d_weights: Array2<f64>,
    /// `[neurons]`, averaged over the batch
    pub d_biases: Array1<f64>,
    /// `[batch, inputs]`, handed to the preceding layer
    pub d_inputs: Array2<f64>,
}

/// A fully-connected layer computing `output = input · Wᵀ + b` per row.
///
/// `weights` has shape `[neurons, inputs]`. The most recent forward input and
/// pre-activation output are cached for `backward`.
#[derive(Clone, Debug)]
pub struct DenseLayer {
    weights: Array2<f64>,
    biases: Array1<f64>,
    input: Option<Array2<f64>>,
    output: Option<Array2<f64>>,
}

pub(crate) fn gaussian(std: f64) -> Result<Normal<f64>> {
    if !std.is_finite() || std < 0.0 {
        return Err(Error::invalid_parameter(format!(
            "standard deviation must be finite and non-negative, got {std}"
        )));
    }
    Normal::new(0.0, std).map_err(|e| Error::invalid_parameter(e.to_string()))
}

/// Compute parameter and input gradients from explicit tensors.
///
/// `input` is the forward input `[batch, inputs]`, `weights` the layer
/// weights `[neurons, inputs]`, `d_outputs` the upstream gradient
/// `[batch, neurons]`.
pub fn dense_gradients(
    input: &Array2<f64>,
    weights: &Array2<f64>,
    d_outputs: &Array2<f64>,
) -> Result<LayerGradients> {
    let (batch, inputs) = input.dim();
    let (neurons, weight_inputs) = weights.dim();
    if weight_inputs != inputs {
        return Err(Error::mismatch("dense_gradients", weight_inputs, inputs));
    }
    if d_outputs.nrows() != batch {
        return Err(Error::mismatch("dense_gradients", batch, d_outputs.nrows()));
    }
    if d_outputs.ncols() != neurons {
        return Err(Error::mismatch("dense_gradients", neurons, d_outputs.ncols()));
    }
    if batch == 0 {
        return Err(Error::EmptyInput { op: "dense_gradients" });
    }

    let n = batch as f64;
    let d_weights = d_outputs.t().dot(input) / n;
    let d_biases = d_outputs.sum_axis(Axis(0)) / n;
    let d_inputs = d_outputs.dot(weights);

    Ok(LayerGradients {
        d_weights,
        d_biases,
        d_inputs,
    })
}

impl DenseLayer {
    /// Create a layer with `N(0, init_std²)` weights and zero biases.
    pub fn new<R: Rng + ?Sized>(
        inputs: usize,
        neurons: usize,
        init_std: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if inputs == 0 || neurons == 0 {
            return Err(Error::mismatch("dense_layer", 1, inputs.min(neurons)));
        }
        let normal = gaussian(init_std)?;
        let weights = Array2::from_shape_fn((neurons, inputs), |_| normal.sample(rng));

        Ok(Self {
            weights,
            biases: Array1::zeros(neurons),
            input: None,
            output: None,
        })
    }

    /// Create a layer from explicit row-major weights `[neurons][inputs]`.
    pub fn from_parameters(weights: Matrix, biases: Vec<f64>) -> Result<Self> {
        if weights.is_empty() || weights[0].is_empty() {
            return Err(Error::UninitializedLayer);
        }
        let weights = to_array(&weights)?;
        if biases.len() != weights.nrows() {
            return Err(Error::mismatch("from_parameters", weights.nrows(), biases.len()));
        }

        Ok(Self {
            weights,
            biases: Array1::from_vec(biases),
            input: None,
            output: None,
        })
    }

    /// Width of the expected input rows
    #[inline]
    pub fn input_size(&self) -> usize {
        self.weights.ncols()
    }

    /// Number of neurons (output width)
    #[inline]
    pub fn neurons(&self) -> usize {
        self.weights.nrows()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn biases(&self) -> &Array1<f64> {
        &self.biases
    }

    /// Input of the most recent forward pass.
    pub fn cached_input(&self) -> Option<&Array2<f64>> {
        self.input.as_ref()
    }

    /// Pre-activation output of the most recent forward pass.
    pub fn cached_output(&self) -> Option<&Array2<f64>> {
        self.output.as_ref()
    }

    /// Total number of weights and biases.
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// True when no parameter is NaN or infinite.
    pub fn is_valid(&self) -> bool {
        self.weights.iter().all(|w| w.is_finite()) && self.biases.iter().all(|b| b.is_finite())
    }

    /// Deep copy of the current weights and biases.
    pub fn params(&self) -> LayerParams {
        LayerParams {
            weights: self.weights.clone(),
            biases: self.biases.clone(),
        }
    }

    /// Overwrite weights and biases. Shapes must match the layer.
    pub fn set_params(&mut self, params: &LayerParams) -> Result<()> {
        if params.weights.dim() != self.weights.dim() {
            return Err(Error::mismatch(
                "set_params",
                self.weights.len(),
                params.weights.len(),
            ));
        }
        if params.biases.len() != self.biases.len() {
            return Err(Error::mismatch("set_params", self.biases.len(), params.biases.len()));
        }
        self.weights.assign(&params.weights);
        self.biases.assign(&params.biases);
        Ok(())
    }

    /// Redraw every weight from `N(0, std²)` and reset biases to zero.
    pub fn reinitialize<R: Rng + ?Sized>(&mut self, std: f64, rng: &mut R) -> Result<()> {
        let normal = gaussian(std)?;
        self.weights.mapv_inplace(|_| normal.sample(rng));
        self.biases.fill(0.0);
        Ok(())
    }

    /// Add `N(0, scale²)` noise to every weight and bias.
    pub fn perturb<R: Rng + ?Sized>(&mut self, scale: f64, rng: &mut R) -> Result<()> {
        let normal = gaussian(scale)?;
        self.weights.mapv_inplace(|w| w + normal.sample(rng));
        self.biases.mapv_inplace(|b| b + normal.sample(rng));
        Ok(())
    }

    /// Forward pass: `output[n] = bias[n] + Σ_j weight[n][j] * x[row][j]`.
    ///
    /// Caches `x` and the pre-activation output for the next `backward`.
    pub fn forward(&mut self, x: &Matrix) -> Result<Matrix> {
        if x.is_empty() {
            return Err(Error::InvalidInput("forward input has no rows".to_string()));
        }
        let input = to_array(x)?;
        if input.ncols() != self.input_size() {
            return Err(Error::InvalidInput(format!(
                "expected {} input columns, got {}",
                self.input_size(),
                input.ncols()
            )));
        }

        let mut output = input.dot(&self.weights.t());
        output += &self.biases;

        let rows = from_array(&output);
        self.input = Some(input);
        self.output = Some(output);
        Ok(rows)
    }

    /// Gradients for `d_outputs` relative to the cached forward input,
    /// without touching the parameters.
    pub fn gradients(&self, d_outputs: &Matrix) -> Result<LayerGradients> {
        let input = self.input.as_ref().ok_or(Error::NoForwardPass)?;
        let cols = validate_matrix(d_outputs, "dense_backward")?;
        if d_outputs.len() != input.nrows() {
            return Err(Error::mismatch("dense_backward", input.nrows(), d_outputs.len()));
        }
        if cols != self.neurons() {
            return Err(Error::mismatch("dense_backward", self.neurons(), cols));
        }
        dense_gradients(input, &self.weights, &to_array(d_outputs)?)
    }

    /// Backward pass followed by an unconditional gradient-descent update.
    ///
    /// Returns the gradient with respect to the layer input, computed with
    /// the pre-update weights.
    pub fn backward(&mut self, d_outputs: &Matrix, learning_rate: f64) -> Result<Matrix> {
        let grads = self.gradients(d_outputs)?;
        self.weights.scaled_add(-learning_rate, &grads.d_weights);
        self.biases.scaled_add(-learning_rate, &grads.d_biases);
        Ok(from_array(&grads.d_inputs))
    }
}
