//! Configuration for training runs.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::neural::Activation;
use crate::optim::Strategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub network: NetworkConfig,
    pub optimizer: OptimizerConfig,
    pub logging: LoggingConfig,
    /// Random seed; a fresh one is drawn when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Spiral dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Points per spiral arm
    pub samples_per_class: usize,
    /// Number of arms (classes)
    pub classes: usize,
    /// Standard deviation of the angular noise
    pub noise: f64,
}

/// Network architecture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Input width followed by each layer's width
    pub layer_sizes: Vec<usize>,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
    /// Standard deviation of the initial weights
    pub init_std: f64,
}

/// Which optimizer to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    GradientDescent,
    HillClimbing,
    RandomSearch,
}

/// Optimizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub strategy: StrategyKind,
    /// Gradient descent step size
    pub learning_rate: f64,
    /// Gradient descent epochs
    pub epochs: usize,
    /// Hill-climbing noise standard deviation
    pub perturbation_scale: f64,
    /// Hill-climbing / random search iterations
    pub iterations: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Iterations between progress lines
    pub log_interval: usize,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            network: NetworkConfig::default(),
            optimizer: OptimizerConfig::default(),
            logging: LoggingConfig::default(),
            seed: None,
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            samples_per_class: 100,
            classes: 3,
            noise: 0.2,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            layer_sizes: vec![2, 8, 8, 6, 6, 4, 3],
            hidden_activation: Activation::Relu,
            output_activation: Activation::Softmax,
            init_std: 0.01,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::GradientDescent,
            learning_rate: 0.01,
            epochs: 10_000,
            perturbation_scale: 0.05,
            iterations: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_interval: 100,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// The configured optimizer with its parameters
    pub fn strategy(&self) -> Strategy {
        let opt = &self.optimizer;
        match opt.strategy {
            StrategyKind::GradientDescent => Strategy::GradientDescent {
                learning_rate: opt.learning_rate,
                epochs: opt.epochs,
            },
            StrategyKind::HillClimbing => Strategy::HillClimbing {
                scale: opt.perturbation_scale,
                iterations: opt.iterations,
            },
            StrategyKind::RandomSearch => Strategy::RandomSearch {
                iterations: opt.iterations,
                init_std: self.network.init_std,
            },
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        let sizes = &self.network.layer_sizes;
        if sizes.len() < 2 {
            return Err("layer_sizes needs at least an input and an output width".to_string());
        }
        if sizes.contains(&0) {
            return Err("layer_sizes must all be > 0".to_string());
        }
        if sizes[0] != 2 {
            return Err("the spiral dataset has 2 features; layer_sizes[0] must be 2".to_string());
        }
        if sizes[sizes.len() - 1] != self.dataset.classes {
            return Err("last layer width must equal dataset.classes".to_string());
        }
        if self.dataset.samples_per_class < 2 || self.dataset.classes == 0 {
            return Err("dataset needs >= 2 samples per class and >= 1 class".to_string());
        }
        if self.optimizer.strategy == StrategyKind::GradientDescent
            && self.network.output_activation != Activation::Softmax
        {
            return Err("gradient_descent requires a softmax output activation".to_string());
        }
        let rates = [
            ("dataset.noise", self.dataset.noise),
            ("network.init_std", self.network.init_std),
            ("optimizer.learning_rate", self.optimizer.learning_rate),
            ("optimizer.perturbation_scale", self.optimizer.perturbation_scale),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be finite and non-negative"));
            }
        }
        Ok(())
    }
}
