//! Full-batch gradient descent through the fused backward/update chain.

use super::{check_rate, should_log, OptimizeReport};
use crate::data::Dataset;
use crate::error::Result;
use crate::neural::Network;

/// Run `epochs` steps of forward → loss → backward/update.
///
/// Every step is accepted; the network ends in the state produced by the
/// final update. That state is evaluated once more after the loop, so
/// `final_loss` is the loss of the returned network and `best_loss` covers
/// it too.
pub fn gradient_descent(
    network: &mut Network,
    data: &Dataset,
    learning_rate: f64,
    epochs: usize,
    log_interval: usize,
) -> Result<OptimizeReport> {
    check_rate("learning_rate", learning_rate)?;
    let mut report = OptimizeReport::new("gradient_descent");

    for epoch in 0..epochs {
        let loss = network.train_step(&data.features, &data.labels, learning_rate)?;
        report.record(epoch, loss);
        report.accepted += 1;

        if should_log(epoch, log_interval) {
            log::debug!("epoch {:5} | loss {:.6}", epoch, loss);
        }
    }

    if epochs > 0 {
        let loss = network.loss(&data.features, &data.labels)?;
        report.final_loss = loss;
        if loss < report.best_loss {
            report.best_loss = loss;
            report.best_iteration = Some(epochs);
        }
    }

    log::info!(
        "gradient descent finished: {} epochs, best loss {:.6}, final loss {:.6}",
        report.iterations,
        report.best_loss,
        report.final_loss
    );
    Ok(report)
}
