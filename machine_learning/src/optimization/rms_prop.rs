use super::{Optimizer, optimizer::check_sizes};
use crate::Result;

/// RMSProp: gradient descent with each step scaled by a running average of squared gradients.
#[derive(Debug, Clone)]
pub struct RmsProp {
    learning_rate: f32,
    beta: f32,
    epsilon: f32,
    s: Box<[f32]>,
}

impl RmsProp {
    /// Creates a new `RmsProp` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `beta` - The decay of the running average.
    /// * `epsilon` - Added to the denominator to keep it away from zero.
    pub fn new(len: usize, learning_rate: f32, beta: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta,
            epsilon,
            s: vec![0.; len].into_boxed_slice(),
        }
    }
}

impl Optimizer for RmsProp {
    fn update_params(&mut self, params: &mut [f32], grad: &[f32]) -> Result<()> {
        check_sizes(params, grad, self.s.len())?;

        let Self {
            learning_rate: lr,
            beta,
            epsilon: eps,
            ..
        } = *self;

        params
            .iter_mut()
            .zip(grad)
            .zip(self.s.iter_mut())
            .for_each(|((p, g), s)| {
                *s = beta * *s + (1. - beta) * g.powi(2);
                *p -= lr * g / (s.sqrt() + eps);
            });

        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_normalized_by_the_gradient_scale() {
        let mut small = RmsProp::new(1, 0.01, 0.9, 0.0);
        let mut large = RmsProp::new(1, 0.01, 0.9, 0.0);
        let (mut a, mut b) = ([0.0], [0.0]);

        small.update_params(&mut a, &[0.1]).unwrap();
        large.update_params(&mut b, &[100.0]).unwrap();

        assert!((a[0] - b[0]).abs() < 1e-6);
        assert!(a[0] < 0.0);
    }
}
