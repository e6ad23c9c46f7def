//! Neural network building blocks.
//!
//! - Dense layers with cached forward state
//! - Activation functions and their gradients
//! - Cross-entropy loss with the fused softmax gradient
//! - Network composition

pub mod activation;
pub mod layer;
pub mod loss;
mod network;

pub use activation::Activation;
pub use layer::{dense_gradients, DenseLayer, LayerGradients, LayerParams};
pub use loss::{accuracy, categorical_cross_entropy, softmax_cross_entropy_backward};
pub use network::Network;
