//! Hill-climbing: perturb every parameter, keep the trial only if it helps.

use super::{check_rate, should_log, OptimizeReport};
use crate::data::Dataset;
use crate::error::Result;
use crate::neural::{LayerParams, Network};
use rand::Rng;

/// Result of a single hill-climbing iteration
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// Trial loss beat the best; the perturbed parameters are kept.
    Accepted { loss: f64 },
    /// Trial loss did not improve; parameters were restored.
    Rejected { loss: f64 },
}

impl Step {
    pub fn loss(&self) -> f64 {
        match *self {
            Step::Accepted { loss } | Step::Rejected { loss } => loss,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Step::Accepted { .. })
    }
}

/// Step-wise hill climber.
///
/// Holds the best loss seen so far and a deep copy of the parameters that
/// produced it. `best_loss` never increases.
#[derive(Clone, Debug)]
pub struct HillClimber {
    scale: f64,
    best_loss: f64,
    best: Vec<LayerParams>,
}

impl HillClimber {
    /// Evaluate the starting loss and snapshot the network.
    pub fn new(network: &mut Network, data: &Dataset, scale: f64) -> Result<Self> {
        check_rate("scale", scale)?;
        let best_loss = network.loss(&data.features, &data.labels)?;
        Ok(Self {
            scale,
            best_loss,
            best: network.snapshot(),
        })
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    pub fn best_snapshot(&self) -> &[LayerParams] {
        &self.best
    }

    /// Perturb, evaluate, then accept or revert.
    ///
    /// On error the network is restored to the best snapshot before the
    /// error is returned.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        network: &mut Network,
        data: &Dataset,
        rng: &mut R,
    ) -> Result<Step> {
        let trial = network
            .perturb(self.scale, rng)
            .and_then(|_| network.loss(&data.features, &data.labels));
        let loss = match trial {
            Ok(loss) => loss,
            Err(e) => {
                network.restore(&self.best)?;
                return Err(e);
            }
        };

        if loss < self.best_loss {
            self.best_loss = loss;
            self.best = network.snapshot();
            Ok(Step::Accepted { loss })
        } else {
            network.restore(&self.best)?;
            Ok(Step::Rejected { loss })
        }
    }
}

/// Run `iterations` hill-climbing steps. The network ends at the best state.
pub fn hill_climbing<R: Rng + ?Sized>(
    network: &mut Network,
    data: &Dataset,
    scale: f64,
    iterations: usize,
    rng: &mut R,
    log_interval: usize,
) -> Result<OptimizeReport> {
    let mut climber = HillClimber::new(network, data, scale)?;
    let mut report = OptimizeReport::new("hill_climbing");
    report.best_loss = climber.best_loss();
    report.final_loss = climber.best_loss();

    log::debug!("hill climbing: initial loss {:.6}", climber.best_loss());

    for iteration in 0..iterations {
        let step = climber.step(network, data, rng)?;
        report.iterations += 1;
        report.history.push(step.loss());
        if step.is_accepted() {
            report.accepted += 1;
            report.best_iteration = Some(iteration);
        }
        report.best_loss = climber.best_loss();
        report.final_loss = climber.best_loss();

        if should_log(iteration, log_interval) {
            log::debug!(
                "iteration {:5} | trial {:.6} | best {:.6}",
                iteration,
                step.loss(),
                climber.best_loss()
            );
        }
    }

    log::info!(
        "hill climbing finished: {} iterations, {} accepted, best loss {:.6}",
        report.iterations,
        report.accepted,
        report.best_loss
    );
    Ok(report)
}
