use log::trace;

use crate::{
    MlErr, Result,
    arch::{Parameters, loss::Loss},
};

/// Defines the strategy for updating model parameters based on calculated gradients.
pub trait Optimizer {
    /// Updates the parameters following the algorithm's learning rule.
    ///
    /// # Arguments
    /// * `params` - The parameters that are going to be modified.
    /// * `grad` - The gradient corresponding to `params`.
    ///
    /// # Returns
    /// An error if there's a mismatch in the sizes of `params` and `grad`.
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()>;

    /// Returns the learning rate the next update will use.
    fn learning_rate(&self) -> f32;

    /// Clears the gradient pending on `params`, must be called before each forward pass.
    fn zero_grad(&mut self, params: &mut Parameters) {
        params.zero_grad();
    }

    /// Applies one update to `params` using their accumulated gradient.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `loss` - The loss the gradient was computed from.
    fn step(&mut self, params: &mut Parameters, loss: &Loss) -> Result<()> {
        trace!(loss = loss.value(), lr = self.learning_rate(); "optimizer step");

        let (values, grad) = params.split_mut();
        self.update_params(values, grad)
    }
}

pub(super) fn check_sizes(params: &[f32], grad: &[f32], state: usize) -> Result<()> {
    if grad.len() != params.len() {
        return Err(MlErr::SizeMismatch {
            what: "gradient",
            got: grad.len(),
            expected: params.len(),
        });
    }

    if state != params.len() {
        return Err(MlErr::SizeMismatch {
            what: "optimizer state",
            got: state,
            expected: params.len(),
        });
    }

    Ok(())
}
