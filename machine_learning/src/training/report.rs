use super::StepMetrics;

/// The averaged metrics of a completed epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSummary {
    pub epoch: usize,
    pub steps: usize,
    pub mean_loss: f32,
    pub mean_accuracy: f32,
}

impl EpochSummary {
    pub(super) fn new(epoch: usize) -> Self {
        Self {
            epoch,
            steps: 0,
            mean_loss: 0.0,
            mean_accuracy: 0.0,
        }
    }

    /// Folds a step into the running means.
    pub(super) fn record(&mut self, metrics: &StepMetrics) {
        self.steps += 1;
        let n = self.steps as f32;
        self.mean_loss += (metrics.loss - self.mean_loss) / n;
        self.mean_accuracy += (metrics.accuracy - self.mean_accuracy) / n;
    }
}

/// The outcome of a training run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainReport {
    pub epochs: Vec<EpochSummary>,
}

impl TrainReport {
    /// Returns the amount of steps taken across every epoch.
    pub fn steps(&self) -> usize {
        self.epochs.iter().map(|e| e.steps).sum()
    }

    pub fn last(&self) -> Option<&EpochSummary> {
        self.epochs.last()
    }
}
