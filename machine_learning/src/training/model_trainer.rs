use std::num::NonZeroUsize;

use log::{debug, info, warn};
use rand::Rng;

use super::{
    CheckpointSink, EpochSummary, Evaluation, MetricsReporter, StepMetrics, TrainReport, Trainer,
    evaluate,
};
use crate::{
    MlErr, Result,
    arch::{Mode, Model, Parameters, loss::LossFn},
    dataset::{Batch, Dataset, num_batches},
    metrics::accuracy,
    optimization::Optimizer,
};

/// Where a training step left the shared training state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Clean,
    GradientsAccumulated,
    ParametersUpdated,
}

/// A model `Trainer`. Contains the relevant components needed for training a model,
/// including the model itself.
pub struct ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    model: M,
    optimizer: O,
    loss_fn: L,
    rng: R,

    epochs: usize,
    batch_size: NonZeroUsize,
    epoch: usize,
    phase: Phase,
}

impl<M, O, L, R> ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    /// Returns a new `ModelTrainer`.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `optimizer` - The optimizer that updates the model's parameters.
    /// * `loss_fn` - The loss function used to measure the difference between a model's output and the expected one.
    /// * `rng` - A random number generator, drives the per-epoch shuffles.
    /// * `epochs` - The amount of epochs to run per `run` call.
    /// * `batch_size` - The amount of samples per training step.
    ///
    /// # Returns
    /// A new `ModelTrainer` or an error if `batch_size` is zero.
    pub fn new(
        model: M,
        optimizer: O,
        loss_fn: L,
        rng: R,
        epochs: usize,
        batch_size: usize,
    ) -> Result<Self> {
        let batch_size = NonZeroUsize::new(batch_size).ok_or(MlErr::InvalidBatchSize)?;

        Ok(Self {
            model,
            optimizer,
            loss_fn,
            rng,
            epochs,
            batch_size,
            epoch: 0,
            phase: Phase::Clean,
        })
    }

    /// Runs `epochs` epochs over `dataset`.
    ///
    /// Each epoch resets the model, shuffles a copy of the dataset, runs one step per full batch
    /// and then hands the parameters to `sink`. Epoch indices keep counting across calls.
    ///
    /// # Arguments
    /// * `dataset` - The samples to train on.
    /// * `reporter` - Receives the metrics of every step, its failures are only logged.
    /// * `sink` - Persists the parameters after every epoch, its failures are fatal.
    ///
    /// # Returns
    /// A report of the run, or the first error a collaborator returned.
    pub fn run<P, C>(
        &mut self,
        dataset: &Dataset,
        reporter: &mut P,
        sink: &mut C,
    ) -> Result<TrainReport>
    where
        P: MetricsReporter + ?Sized,
        C: CheckpointSink + ?Sized,
    {
        if self.phase != Phase::Clean {
            return Err(MlErr::TrainerPoisoned);
        }

        let steps_per_epoch = num_batches(dataset.len(), self.batch_size);
        let total_steps = steps_per_epoch * self.epochs;

        info!(
            epochs = self.epochs,
            batch_size = self.batch_size.get(),
            samples = dataset.len(),
            steps_per_epoch = steps_per_epoch;
            "starting training"
        );

        let mut report = TrainReport::default();
        for _ in 0..self.epochs {
            let summary = self.run_epoch(dataset, reporter, total_steps)?;
            sink.save(summary.epoch, self.model.params())?;

            info!(
                epoch = summary.epoch,
                mean_loss = summary.mean_loss,
                mean_accuracy = summary.mean_accuracy;
                "epoch finished"
            );

            report.epochs.push(summary);
            self.epoch += 1;
        }

        info!(steps = report.steps(); "training finished");
        Ok(report)
    }

    fn run_epoch<P>(
        &mut self,
        dataset: &Dataset,
        reporter: &mut P,
        total_steps: usize,
    ) -> Result<EpochSummary>
    where
        P: MetricsReporter + ?Sized,
    {
        let epoch = self.epoch;
        self.model.reset();

        let shuffled = dataset.shuffled(&mut self.rng);
        let mut summary = EpochSummary::new(epoch);
        debug!(epoch = epoch; "starting epoch");

        for batch in shuffled.batches(self.batch_size) {
            let metrics = self.step(epoch, batch)?;
            summary.record(&metrics);

            if let Err(e) = reporter.report(&metrics, total_steps) {
                warn!("metrics reporter failed: {e}");
            }
        }

        Ok(summary)
    }

    /// Runs a single training step, moving the state `Clean -> GradientsAccumulated ->
    /// ParametersUpdated -> Clean`. A failure after the gradients start accumulating leaves the
    /// trainer poisoned.
    fn step(&mut self, epoch: usize, batch: Batch<'_>) -> Result<StepMetrics> {
        self.optimizer.zero_grad(self.model.params_mut());

        let y_pred = self.model.forward(batch.x, Mode::Train)?;
        let loss = self.loss_fn.compute(y_pred.view(), batch.y)?;

        self.phase = Phase::GradientsAccumulated;
        loss.backward(&mut self.model)?;

        self.optimizer.step(self.model.params_mut(), &loss)?;
        self.phase = Phase::ParametersUpdated;

        self.model.reset();
        self.phase = Phase::Clean;

        let metrics = StepMetrics {
            epoch,
            batch_start: batch.start,
            learning_rate: self.optimizer.learning_rate(),
            loss: loss.value(),
            accuracy: accuracy(y_pred.view(), batch.y)?,
        };

        drop((y_pred, loss));
        Ok(metrics)
    }

    /// Evaluates the model in inference mode over `dataset`.
    pub fn evaluate(&mut self, dataset: &Dataset) -> Result<Evaluation> {
        evaluate(&mut self.model, &self.loss_fn, dataset, self.batch_size)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Returns the index the next epoch will have.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl<M, O, L, R> Trainer for ModelTrainer<M, O, L, R>
where
    M: Model,
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    fn run(
        &mut self,
        dataset: &Dataset,
        reporter: &mut dyn MetricsReporter,
        sink: &mut dyn CheckpointSink,
    ) -> Result<TrainReport> {
        self.run(dataset, reporter, sink)
    }

    fn evaluate(&mut self, dataset: &Dataset) -> Result<Evaluation> {
        self.evaluate(dataset)
    }

    fn params(&self) -> &Parameters {
        self.model.params()
    }

    fn params_mut(&mut self) -> &mut Parameters {
        self.model.params_mut()
    }

    fn epoch(&self) -> usize {
        self.epoch
    }
}
