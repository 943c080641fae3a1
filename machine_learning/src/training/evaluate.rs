use std::num::NonZeroUsize;

use crate::{
    MlErr, Result,
    arch::{Mode, Model, loss::LossFn},
    dataset::Dataset,
    metrics::accuracy,
};

/// The metrics of a model over a whole dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f32,
    pub accuracy: f32,
    pub samples: usize,
}

/// Runs `model` in inference mode over every sample of `dataset`.
///
/// Parameters and their gradient are left untouched. The last chunk may be shorter than
/// `batch_size`, means are weighted by sample count.
///
/// # Arguments
/// * `model` - The model to evaluate.
/// * `loss_fn` - The loss function to measure it with.
/// * `dataset` - The samples to evaluate on.
/// * `batch_size` - The amount of samples per forward pass.
///
/// # Returns
/// The sample-weighted mean loss and accuracy, or an error if `dataset` is empty.
pub fn evaluate<M, L>(
    model: &mut M,
    loss_fn: &L,
    dataset: &Dataset,
    batch_size: NonZeroUsize,
) -> Result<Evaluation>
where
    M: Model + ?Sized,
    L: LossFn + ?Sized,
{
    if dataset.is_empty() {
        return Err(MlErr::InvalidInput("can't evaluate on an empty dataset"));
    }

    model.reset();

    let mut loss_sum = 0.0;
    let mut hits = 0.0;
    for chunk in dataset.chunks(batch_size) {
        let y_pred = model.forward(chunk.x, Mode::Eval)?;
        model.reset();

        let n = chunk.len() as f32;
        loss_sum += loss_fn.compute(y_pred.view(), chunk.y)?.value() * n;
        hits += accuracy(y_pred.view(), chunk.y)? * n;
    }

    let samples = dataset.len();
    Ok(Evaluation {
        loss: loss_sum / samples as f32,
        accuracy: hits / samples as f32,
        samples,
    })
}
