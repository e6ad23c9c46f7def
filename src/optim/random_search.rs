//! Random search over independently resampled parameter sets.

use super::{check_rate, should_log, OptimizeReport};
use crate::data::Dataset;
use crate::error::Result;
use crate::neural::Network;
use rand::Rng;

/// Redraw every parameter from `N(0, init_std²)` each iteration and keep
/// track of the best loss.
///
/// The network is not restored to the best parameters afterwards: it ends
/// in whatever state the last trial produced. With zero iterations nothing
/// is evaluated and `best_loss` stays `f64::INFINITY`.
pub fn random_search<R: Rng + ?Sized>(
    network: &mut Network,
    data: &Dataset,
    iterations: usize,
    init_std: f64,
    rng: &mut R,
    log_interval: usize,
) -> Result<OptimizeReport> {
    check_rate("init_std", init_std)?;
    let mut report = OptimizeReport::new("random_search");

    for iteration in 0..iterations {
        network.reinitialize(init_std, rng)?;
        let loss = network.loss(&data.features, &data.labels)?;
        let improved = report.record(iteration, loss);
        report.accepted += 1;

        if improved {
            log::debug!("iteration {:5} | new best loss {:.6}", iteration, loss);
        } else if should_log(iteration, log_interval) {
            log::debug!("iteration {:5} | loss {:.6}", iteration, loss);
        }
    }

    log::info!(
        "random search finished: {} iterations, best loss {:.6} at {:?}",
        report.iterations,
        report.best_loss,
        report.best_iteration
    );
    Ok(report)
}
