//! Parameter-search strategies.
//!
//! Exactly one strategy drives a network during a run:
//! - Gradient descent through the fused backward/update chain
//! - Hill-climbing with Gaussian perturbation and accept/revert
//! - Random search by full re-sampling of every parameter

mod gradient_descent;
mod hill_climbing;
mod random_search;

pub use gradient_descent::gradient_descent;
pub use hill_climbing::{hill_climbing, HillClimber, Step};
pub use random_search::random_search;

use crate::data::Dataset;
use crate::error::{Error, Result};
use crate::neural::Network;
use rand::Rng;

/// Strategy and its parameters, chosen once per run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Strategy {
    GradientDescent { learning_rate: f64, epochs: usize },
    HillClimbing { scale: f64, iterations: usize },
    RandomSearch { iterations: usize, init_std: f64 },
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::GradientDescent { .. } => "gradient_descent",
            Strategy::HillClimbing { .. } => "hill_climbing",
            Strategy::RandomSearch { .. } => "random_search",
        }
    }

    /// Run the strategy to completion on `network`.
    ///
    /// `log_interval` controls debug progress lines; 0 disables them.
    pub fn run<R: Rng + ?Sized>(
        &self,
        network: &mut Network,
        data: &Dataset,
        rng: &mut R,
        log_interval: usize,
    ) -> Result<OptimizeReport> {
        match *self {
            Strategy::GradientDescent {
                learning_rate,
                epochs,
            } => gradient_descent(network, data, learning_rate, epochs, log_interval),
            Strategy::HillClimbing { scale, iterations } => {
                hill_climbing(network, data, scale, iterations, rng, log_interval)
            }
            Strategy::RandomSearch {
                iterations,
                init_std,
            } => random_search(network, data, iterations, init_std, rng, log_interval),
        }
    }
}

/// Outcome of one optimizer run
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizeReport {
    pub strategy: &'static str,
    /// Lowest loss observed; `f64::INFINITY` when nothing was evaluated
    pub best_loss: f64,
    /// Iteration at which `best_loss` was observed
    pub best_iteration: Option<usize>,
    /// Loss of the state the network is left in
    pub final_loss: f64,
    pub iterations: usize,
    /// Accepted trials (every trial for gradient descent and random search)
    pub accepted: usize,
    /// Loss per iteration
    pub history: Vec<f64>,
}

impl OptimizeReport {
    pub(crate) fn new(strategy: &'static str) -> Self {
        Self {
            strategy,
            best_loss: f64::INFINITY,
            best_iteration: None,
            final_loss: f64::INFINITY,
            iterations: 0,
            accepted: 0,
            history: Vec::new(),
        }
    }

    /// Record a trial loss, updating the best when strictly lower.
    pub(crate) fn record(&mut self, iteration: usize, loss: f64) -> bool {
        self.iterations += 1;
        self.final_loss = loss;
        self.history.push(loss);
        if loss < self.best_loss {
            self.best_loss = loss;
            self.best_iteration = Some(iteration);
            true
        } else {
            false
        }
    }
}

impl std::fmt::Display for OptimizeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== {} ===", self.strategy)?;
        writeln!(f, "Iterations: {}", self.iterations)?;
        writeln!(f, "Accepted: {}", self.accepted)?;
        match self.best_iteration {
            Some(i) => writeln!(f, "Best loss: {:.6} (iteration {})", self.best_loss, i)?,
            None => writeln!(f, "Best loss: {:.6}", self.best_loss)?,
        }
        writeln!(f, "Final loss: {:.6}", self.final_loss)?;
        Ok(())
    }
}

pub(crate) fn check_rate(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::invalid_parameter(format!(
            "{name} must be finite and non-negative, got {value}"
        )));
    }
    Ok(())
}

#[inline]
pub(crate) fn should_log(iteration: usize, log_interval: usize) -> bool {
    log_interval > 0 && iteration % log_interval == 0
}
