//! # spiralnet
//!
//! Minimal feed-forward neural network toolkit.
//!
//! ## Features
//!
//! - **Dense layers** with cached forward state and fused backward/update
//! - **Activations**: ReLU, leaky ReLU, ELU, sigmoid, tanh, softmax
//! - **Loss**: categorical cross-entropy with the fused softmax gradient
//! - **Optimizers**: gradient descent, hill-climbing, random search
//! - **Reproducible**: all randomness flows through a seeded generator
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use spiralnet::data::spiral;
//! use spiralnet::neural::{Activation, Network};
//! use spiralnet::optim::Strategy;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let data = spiral(100, 3, 0.2, &mut rng).unwrap();
//! let mut net = Network::new(&[2, 16, 3], Activation::Relu, Activation::Softmax, 0.01, &mut rng)
//!     .unwrap();
//!
//! let strategy = Strategy::GradientDescent { learning_rate: 1.0, epochs: 1000 };
//! let report = strategy.run(&mut net, &data, &mut rng, 100).unwrap();
//! println!("{}", report);
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use spiralnet::config::StrategyKind;
//! use spiralnet::Config;
//!
//! let mut config = Config::default();
//! config.optimizer.strategy = StrategyKind::HillClimbing;
//! config.optimizer.iterations = 500;
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod linalg;
pub mod neural;
pub mod optim;

// Re-export main types
pub use config::Config;
pub use data::Dataset;
pub use error::{Error, Result};
pub use linalg::Matrix;
pub use neural::{Activation, DenseLayer, Network};
pub use optim::{OptimizeReport, Strategy};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a full training session described by `config`.
///
/// Generates the spiral dataset, builds the network, runs the configured
/// strategy and measures accuracy on the training data.
pub fn train(config: &Config) -> Result<RunSummary> {
    config.validate().map_err(Error::InvalidParameter)?;

    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let ds = &config.dataset;
    let data = data::spiral(ds.samples_per_class, ds.classes, ds.noise, &mut rng)?;
    let mut network = Network::from_config(&config.network, &mut rng)?;

    log::info!(
        "training {:?} ({} parameters) on {} samples with {}",
        network.layer_sizes(),
        network.parameter_count(),
        data.len(),
        config.strategy().name()
    );

    let report = config
        .strategy()
        .run(&mut network, &data, &mut rng, config.logging.log_interval)?;
    let accuracy = network.accuracy(&data.features, &data.labels)?;

    Ok(RunSummary {
        seed,
        parameter_count: network.parameter_count(),
        accuracy,
        report,
    })
}

/// Result of [`train`]
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: u64,
    pub parameter_count: usize,
    /// Training-set accuracy of the final network state
    pub accuracy: f64,
    pub report: OptimizeReport,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.report)?;
        writeln!(f, "Seed: {}", self.seed)?;
        writeln!(f, "Parameters: {}", self.parameter_count)?;
        writeln!(f, "Accuracy: {:.1}%", self.accuracy * 100.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_training() {
        let mut config = Config::default();
        config.seed = Some(1);
        config.dataset.samples_per_class = 20;
        config.network.layer_sizes = vec![2, 8, 3];
        config.optimizer.epochs = 20;

        let summary = train(&config).unwrap();
        assert_eq!(summary.seed, 1);
        assert_eq!(summary.report.iterations, 20);
        assert!((0.0..=1.0).contains(&summary.accuracy));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.network.layer_sizes = vec![2];
        assert!(matches!(train(&config), Err(Error::InvalidParameter(_))));
    }
}
