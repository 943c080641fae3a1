use ndarray::{Array2, ArrayView2};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{MlErr, Result, arch::Mode};

/// Inverted dropout: while training, zeroes each activation with probability `rate` and scales
/// the survivors by `1 / (1 - rate)`. It's the identity in `Mode::Eval`.
#[derive(Debug, Clone)]
pub struct Dropout {
    rate: f32,
    rng: StdRng,

    // Forward metadata, `Some(None)` means the last pass didn't drop anything.
    mask: Option<Option<Array2<f32>>>,
}

impl Dropout {
    /// Creates a new `Dropout` layer.
    ///
    /// # Arguments
    /// * `rate` - The probability of dropping an activation, in `[0, 1)`.
    /// * `seed` - The seed for the layer's mask generator.
    ///
    /// # Returns
    /// A new `Dropout` instance or an error if the rate is out of range.
    pub fn new(rate: f32, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&rate) {
            return Err(MlErr::InvalidSpec(format!(
                "dropout rate must be in [0, 1), got {rate}"
            )));
        }

        Ok(Self {
            rate,
            rng: StdRng::seed_from_u64(seed),
            mask: None,
        })
    }

    pub fn forward(&mut self, x: ArrayView2<f32>, mode: Mode) -> Array2<f32> {
        if mode == Mode::Eval || self.rate == 0.0 {
            self.mask = Some(None);
            return x.to_owned();
        }

        let keep = 1.0 - self.rate;
        let mask = x.map(|_| {
            if self.rng.random::<f32>() < keep {
                1.0 / keep
            } else {
                0.0
            }
        });

        let a = &x * &mask;
        self.mask = Some(Some(mask));
        a
    }

    pub fn backward(&mut self, d: Array2<f32>) -> Result<Array2<f32>> {
        match &self.mask {
            None => Err(MlErr::MissingForward { layer: "dropout" }),
            Some(None) => Ok(d),
            Some(Some(mask)) => Ok(d * mask),
        }
    }

    pub fn reset(&mut self) {
        self.mask = None;
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn eval_mode_is_the_identity() {
        let mut dropout = Dropout::new(0.5, 0).unwrap();
        let x = array![[1.0, 2.0, 3.0]];

        assert_eq!(dropout.forward(x.view(), Mode::Eval), x);
        assert_eq!(dropout.backward(array![[1.0, 1.0, 1.0]]).unwrap(), array![[1.0, 1.0, 1.0]]);
    }

    #[test]
    fn train_mode_masks_and_rescales() {
        let mut dropout = Dropout::new(0.5, 42).unwrap();
        let x = Array2::ones((8, 16));

        let a = dropout.forward(x.view(), Mode::Train);
        assert!(a.iter().all(|&v| v == 0.0 || v == 2.0));
        assert!(a.iter().any(|&v| v == 0.0));

        // The gradient only flows through the kept activations.
        let d = dropout.backward(Array2::ones((8, 16))).unwrap();
        assert_eq!(d, a);
    }

    #[test]
    fn invalid_rates_are_rejected() {
        assert!(Dropout::new(1.0, 0).is_err());
        assert!(Dropout::new(-0.1, 0).is_err());
    }

    #[test]
    fn backward_after_reset_fails() {
        let mut dropout = Dropout::new(0.2, 0).unwrap();
        dropout.forward(array![[1.0]].view(), Mode::Train);
        dropout.reset();
        assert!(dropout.backward(array![[1.0]]).is_err());
    }
}
