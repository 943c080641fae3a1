use log::info;

use crate::Result;

/// The metrics of a single training step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepMetrics {
    pub epoch: usize,
    pub batch_start: usize,
    pub learning_rate: f32,
    pub loss: f32,
    pub accuracy: f32,
}

/// Receives the metrics of every training step.
///
/// A failing reporter never aborts training, the trainer logs the error and moves on.
pub trait MetricsReporter {
    /// Reports the metrics of a step.
    ///
    /// # Arguments
    /// * `metrics` - The step's metrics.
    /// * `total_steps` - The amount of steps the whole run is expected to take.
    fn report(&mut self, metrics: &StepMetrics, total_steps: usize) -> Result<()>;
}

impl<T: MetricsReporter + ?Sized> MetricsReporter for &mut T {
    fn report(&mut self, metrics: &StepMetrics, total_steps: usize) -> Result<()> {
        (**self).report(metrics, total_steps)
    }
}

/// Reports to both reporters, the second one is called even if the first one fails.
impl<A: MetricsReporter, B: MetricsReporter> MetricsReporter for (A, B) {
    fn report(&mut self, metrics: &StepMetrics, total_steps: usize) -> Result<()> {
        let first = self.0.report(metrics, total_steps);
        let second = self.1.report(metrics, total_steps);
        first.and(second)
    }
}

/// Logs every `interval`-th step at the info level.
#[derive(Debug, Clone)]
pub struct LogReporter {
    interval: usize,
    step: usize,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::with_interval(1)
    }

    /// Creates a `LogReporter` that only logs one of every `interval` steps, plus the last one.
    pub fn with_interval(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
            step: 0,
        }
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsReporter for LogReporter {
    fn report(&mut self, metrics: &StepMetrics, total_steps: usize) -> Result<()> {
        self.step += 1;
        if self.step % self.interval != 0 && self.step != total_steps {
            return Ok(());
        }

        let StepMetrics {
            epoch,
            batch_start,
            learning_rate,
            loss,
            accuracy,
        } = *metrics;

        info!(
            step = self.step,
            total_steps = total_steps,
            epoch = epoch,
            batch_start = batch_start,
            learning_rate = learning_rate,
            loss = loss,
            accuracy = accuracy;
            "training step"
        );

        Ok(())
    }
}

/// Keeps every reported step in memory.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: Vec<StepMetrics>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[StepMetrics] {
        &self.records
    }

    pub fn into_records(self) -> Vec<StepMetrics> {
        self.records
    }
}

impl MetricsReporter for History {
    fn report(&mut self, metrics: &StepMetrics, _total_steps: usize) -> Result<()> {
        self.records.push(*metrics);
        Ok(())
    }
}
