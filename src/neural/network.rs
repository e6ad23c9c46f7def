//! Network structure: an ordered chain of dense layers.

use super::activation::Activation;
use super::layer::{DenseLayer, LayerParams};
use super::loss::{accuracy, argmax_rows, categorical_cross_entropy, softmax_cross_entropy_backward};
use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::linalg::{from_array, Matrix};
use rand::Rng;

/// Feed-forward network
///
/// The hidden activation follows every layer except the last; the output
/// activation follows the last layer. Which activations to use is the
/// caller's decision.
#[derive(Clone, Debug)]
pub struct Network {
    layers: Vec<DenseLayer>,
    hidden_activation: Activation,
    output_activation: Activation,
}

impl Network {
    /// Build a network from consecutive layer widths, e.g. `[2, 8, 3]`.
    pub fn new<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        hidden_activation: Activation,
        output_activation: Activation,
        init_std: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(Error::invalid_parameter(format!(
                "a network needs at least two layer sizes, got {}",
                layer_sizes.len()
            )));
        }

        let layers = layer_sizes
            .windows(2)
            .map(|pair| DenseLayer::new(pair[0], pair[1], init_std, rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            layers,
            hidden_activation,
            output_activation,
        })
    }

    /// Build a network from the `network` section of a config
    pub fn from_config<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Self> {
        Self::new(
            &config.layer_sizes,
            config.hidden_activation,
            config.output_activation,
            config.init_std,
            rng,
        )
    }

    /// Assemble a network from existing layers. Widths must chain.
    pub fn from_layers(
        layers: Vec<DenseLayer>,
        hidden_activation: Activation,
        output_activation: Activation,
    ) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::UninitializedLayer);
        }
        for pair in layers.windows(2) {
            if pair[0].neurons() != pair[1].input_size() {
                return Err(Error::mismatch(
                    "from_layers",
                    pair[0].neurons(),
                    pair[1].input_size(),
                ));
            }
        }

        Ok(Self {
            layers,
            hidden_activation,
            output_activation,
        })
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Mutable access to the layers.
    ///
    /// A replaced layer must keep the widths chaining; otherwise the next
    /// `forward` reports the mismatch.
    pub fn layers_mut(&mut self) -> &mut [DenseLayer] {
        &mut self.layers
    }

    pub fn hidden_activation(&self) -> Activation {
        self.hidden_activation
    }

    pub fn output_activation(&self) -> Activation {
        self.output_activation
    }

    /// Input width followed by every layer's neuron count.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![self.layers[0].input_size()];
        sizes.extend(self.layers.iter().map(DenseLayer::neurons));
        sizes
    }

    /// Get total number of parameters (weights + biases)
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(DenseLayer::parameter_count).sum()
    }

    /// Check if network is valid (no NaN/Inf)
    pub fn is_valid(&self) -> bool {
        self.layers.iter().all(DenseLayer::is_valid)
    }

    /// Forward pass through every layer and activation.
    ///
    /// Each layer caches its input and pre-activation output.
    pub fn forward(&mut self, x: &Matrix) -> Result<Matrix> {
        let last = self.layers.len() - 1;
        let mut current: Option<Matrix> = None;

        for (i, layer) in self.layers.iter_mut().enumerate() {
            let input = current.as_ref().unwrap_or(x);
            let mut output = layer.forward(input)?;
            if i < last {
                self.hidden_activation.forward_in_place(&mut output)?;
            } else {
                self.output_activation.forward_in_place(&mut output)?;
            }
            current = Some(output);
        }

        current.ok_or(Error::UninitializedLayer)
    }

    /// Mean cross-entropy of the current parameters on `(x, labels)`.
    pub fn loss(&mut self, x: &Matrix, labels: &[usize]) -> Result<f64> {
        let predictions = self.forward(x)?;
        categorical_cross_entropy(&predictions, labels)
    }

    /// Predicted class per row.
    pub fn predict(&mut self, x: &Matrix) -> Result<Vec<usize>> {
        let predictions = self.forward(x)?;
        argmax_rows(&predictions)
    }

    /// Classification accuracy on `(x, labels)`.
    pub fn accuracy(&mut self, x: &Matrix, labels: &[usize]) -> Result<f64> {
        let predictions = self.forward(x)?;
        accuracy(&predictions, labels)
    }

    /// Backward chain from the gradient w.r.t. the final layer's
    /// pre-activation output.
    ///
    /// Every layer is updated in place. Returns the gradient w.r.t. the
    /// network input.
    pub fn backward(&mut self, d_logits: &Matrix, learning_rate: f64) -> Result<Matrix> {
        let last = self.layers.len() - 1;
        let hidden = self.hidden_activation;
        let mut grad = d_logits.clone();

        for (i, layer) in self.layers.iter_mut().enumerate().rev() {
            if i < last {
                let pre_activation = from_array(layer.cached_output().ok_or(Error::NoForwardPass)?);
                grad = if hidden.backward_uses_output() {
                    let output = hidden.forward(&pre_activation)?;
                    hidden.backward(&grad, &pre_activation, &output)?
                } else {
                    hidden.backward(&grad, &pre_activation, &pre_activation)?
                };
            }
            grad = layer.backward(&grad, learning_rate)?;
        }

        Ok(grad)
    }

    /// One gradient-descent step on the full batch.
    ///
    /// Returns the loss measured before the update. The output activation
    /// must be softmax so the fused cross-entropy gradient applies.
    pub fn train_step(&mut self, x: &Matrix, labels: &[usize], learning_rate: f64) -> Result<f64> {
        if self.output_activation != Activation::Softmax {
            return Err(Error::invalid_parameter(format!(
                "gradient descent needs a softmax output activation, got {}",
                self.output_activation
            )));
        }

        let predictions = self.forward(x)?;
        let loss = categorical_cross_entropy(&predictions, labels)?;
        let d_logits = softmax_cross_entropy_backward(&predictions, labels)?;
        self.backward(&d_logits, learning_rate)?;
        Ok(loss)
    }

    /// Deep copy of every layer's weights and biases.
    pub fn snapshot(&self) -> Vec<LayerParams> {
        self.layers.iter().map(DenseLayer::params).collect()
    }

    /// Write a snapshot back into the layers.
    pub fn restore(&mut self, snapshot: &[LayerParams]) -> Result<()> {
        if snapshot.len() != self.layers.len() {
            return Err(Error::mismatch("restore", self.layers.len(), snapshot.len()));
        }
        for (layer, params) in self.layers.iter_mut().zip(snapshot) {
            layer.set_params(params)?;
        }
        Ok(())
    }

    /// Redraw all weights from `N(0, std²)` and zero all biases.
    pub fn reinitialize<R: Rng + ?Sized>(&mut self, std: f64, rng: &mut R) -> Result<()> {
        for layer in &mut self.layers {
            layer.reinitialize(std, rng)?;
        }
        Ok(())
    }

    /// Add `N(0, scale²)` noise to every weight and bias.
    pub fn perturb<R: Rng + ?Sized>(&mut self, scale: f64, rng: &mut R) -> Result<()> {
        for layer in &mut self.layers {
            layer.perturb(scale, rng)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn toy_data() -> (Matrix, Vec<usize>) {
        let x = vec![
            vec![1.0, 0.1],
            vec![0.9, -0.2],
            vec![-1.0, 0.2],
            vec![-0.8, -0.1],
            vec![0.1, 1.0],
            vec![-0.2, 0.9],
        ];
        (x, vec![0, 0, 1, 1, 2, 2])
    }

    fn net(seed: u64, hidden: Activation, std: f64) -> Network {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Network::new(&[2, 5, 3], hidden, Activation::Softmax, std, &mut rng).unwrap()
    }

    #[test]
    fn test_network_shape() {
        let net = net(1, Activation::Relu, 0.01);
        assert_eq!(net.layers().len(), 2);
        assert_eq!(net.layer_sizes(), vec![2, 5, 3]);
        assert_eq!(net.parameter_count(), 2 * 5 + 5 + 5 * 3 + 3);
        assert!(net.is_valid());
    }

    #[test]
    fn test_invalid_construction() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            Network::new(&[4], Activation::Relu, Activation::Softmax, 0.01, &mut rng),
            Err(Error::InvalidParameter(_))
        ));

        let a = DenseLayer::new(2, 4, 0.01, &mut rng).unwrap();
        let b = DenseLayer::new(3, 2, 0.01, &mut rng).unwrap();
        assert!(matches!(
            Network::from_layers(vec![a, b], Activation::Relu, Activation::Softmax),
            Err(Error::DimensionMismatch { .. })
        ));
        assert_eq!(
            Network::from_layers(Vec::new(), Activation::Relu, Activation::Softmax).unwrap_err(),
            Error::UninitializedLayer
        );
    }

    #[test]
    fn test_layers_mut() {
        let (x, _) = toy_data();
        let mut net = net(2, Activation::Relu, 0.5);
        let before = net.forward(&x).unwrap();

        let mut params = net.layers()[1].params();
        params.biases[0] += 5.0;
        net.layers_mut()[1].set_params(&params).unwrap();
        let after = net.forward(&x).unwrap();
        assert!(after.iter().zip(&before).all(|(a, b)| a[0] > b[0]));

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        net.layers_mut()[1] = DenseLayer::new(4, 3, 0.1, &mut rng).unwrap();
        assert!(matches!(net.forward(&x), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_forward_produces_probabilities() {
        let (x, _) = toy_data();
        let mut net = net(2, Activation::Relu, 0.5);
        let probs = net.forward(&x).unwrap();
        assert_eq!(probs.len(), x.len());
        for row in &probs {
            assert_eq!(row.len(), 3);
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
        assert_eq!(net.layers()[0].cached_output().unwrap().dim(), (6, 5));
    }

    #[test]
    fn test_forward_rejects_wrong_width() {
        let mut net = net(2, Activation::Relu, 0.5);
        assert!(matches!(net.forward(&vec![vec![1.0, 2.0, 3.0]]), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_train_step_reduces_loss() {
        let (x, y) = toy_data();
        let mut net = net(3, Activation::Relu, 0.5);
        let initial = net.loss(&x, &y).unwrap();
        for _ in 0..300 {
            net.train_step(&x, &y, 0.5).unwrap();
        }
        let trained = net.loss(&x, &y).unwrap();
        assert!(trained < initial, "{trained} should be below {initial}");
        assert!(net.is_valid());
    }

    #[test]
    fn test_train_step_requires_softmax() {
        let (x, y) = toy_data();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut net =
            Network::new(&[2, 3], Activation::Relu, Activation::Sigmoid, 0.1, &mut rng).unwrap();
        assert!(matches!(net.train_step(&x, &y, 0.1), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_backward_matches_finite_differences() {
        let (x, y) = toy_data();
        for hidden in [Activation::Tanh, Activation::Sigmoid] {
            let mut net = net(5, hidden, 0.5);
            let snapshot = net.snapshot();
            let eps = 1e-6;

            // Numeric gradient for a handful of first-layer weights.
            let mut numeric = Vec::new();
            for (n, j) in [(0, 0), (2, 1), (4, 0)] {
                let base = net.loss(&x, &y).unwrap();
                let mut shifted = snapshot.clone();
                shifted[0].weights[[n, j]] += eps;
                net.restore(&shifted).unwrap();
                let bumped = net.loss(&x, &y).unwrap();
                net.restore(&snapshot).unwrap();
                numeric.push(((n, j), (bumped - base) / eps));
            }

            // With learning rate 1 the weight change equals minus the layer
            // gradient, which carries an extra 1/batch on top of the mean loss.
            net.train_step(&x, &y, 1.0).unwrap();
            let after = net.snapshot();
            let batch = x.len() as f64;
            for ((n, j), expected) in numeric {
                let analytic = (snapshot[0].weights[[n, j]] - after[0].weights[[n, j]]) * batch;
                assert!(
                    (analytic - expected).abs() < 1e-4,
                    "{hidden}: analytic {analytic} vs numeric {expected}"
                );
            }
        }
    }

    #[test]
    fn test_snapshot_is_deep_copy() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut net = net(6, Activation::Relu, 0.01);
        let snapshot = net.snapshot();
        net.perturb(0.5, &mut rng).unwrap();
        assert_ne!(net.snapshot(), snapshot);
        net.restore(&snapshot).unwrap();
        assert_eq!(net.snapshot(), snapshot);
        assert!(net.restore(&snapshot[..1]).is_err());
    }

    #[test]
    fn test_predict_and_accuracy() {
        let (x, y) = toy_data();
        let mut net = net(7, Activation::Relu, 0.5);
        for _ in 0..500 {
            net.train_step(&x, &y, 0.5).unwrap();
        }
        assert_eq!(net.predict(&x).unwrap().len(), x.len());
        let acc = net.accuracy(&x, &y).unwrap();
        assert!((0.0..=1.0).contains(&acc));
    }
}
