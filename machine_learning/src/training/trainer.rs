use super::{CheckpointSink, Evaluation, MetricsReporter, TrainReport};
use crate::{Result, arch::Parameters, dataset::Dataset};

/// A type-erased model trainer, as built by `TrainerBuilder`.
pub trait Trainer {
    /// Trains on `dataset` for the configured amount of epochs.
    ///
    /// # Arguments
    /// * `dataset` - The samples to train on.
    /// * `reporter` - Receives the metrics of every step.
    /// * `sink` - Persists the parameters after every epoch.
    ///
    /// # Returns
    /// A report of the run or the error that aborted it.
    fn run(
        &mut self,
        dataset: &Dataset,
        reporter: &mut dyn MetricsReporter,
        sink: &mut dyn CheckpointSink,
    ) -> Result<TrainReport>;

    /// Evaluates the model in inference mode over `dataset`.
    fn evaluate(&mut self, dataset: &Dataset) -> Result<Evaluation>;

    fn params(&self) -> &Parameters;

    fn params_mut(&mut self) -> &mut Parameters;

    /// Returns the index the next epoch will have.
    fn epoch(&self) -> usize;
}
