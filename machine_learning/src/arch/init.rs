use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// How a layer's weights are initialized. Biases always start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamGen {
    Const {
        value: f32,
    },
    Uniform {
        low: f32,
        high: f32,
    },
    #[default]
    XavierUniform,
    HeNormal,
}

impl ParamGen {
    /// Fills `weights` following this strategy.
    ///
    /// # Arguments
    /// * `weights` - The weights to overwrite.
    /// * `fan_in` - The number of input units of the layer.
    /// * `fan_out` - The number of output units of the layer.
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// An error if the strategy's distribution is invalid.
    pub fn fill<R: Rng + ?Sized>(
        &self,
        weights: &mut [f32],
        fan_in: usize,
        fan_out: usize,
        rng: &mut R,
    ) -> Result<()> {
        match *self {
            ParamGen::Const { value } => weights.fill(value),
            ParamGen::Uniform { low, high } => sample_into(weights, uniform(low, high)?, rng),
            ParamGen::XavierUniform => {
                let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
                sample_into(weights, uniform(-limit, limit)?, rng);
            }
            ParamGen::HeNormal => {
                let std = (2.0 / fan_in.max(1) as f32).sqrt();
                let normal = Normal::new(0.0, std)
                    .map_err(|e| MlErr::InvalidSpec(format!("invalid normal distribution: {e}")))?;
                sample_into(weights, normal, rng);
            }
        }

        Ok(())
    }
}

fn uniform(low: f32, high: f32) -> Result<Uniform<f32>> {
    Uniform::new(low, high)
        .map_err(|e| MlErr::InvalidSpec(format!("invalid uniform range [{low}, {high}): {e}")))
}

fn sample_into<D, R>(weights: &mut [f32], distribution: D, rng: &mut R)
where
    D: Distribution<f32>,
    R: Rng + ?Sized,
{
    weights
        .iter_mut()
        .for_each(|w| *w = distribution.sample(rng));
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn xavier_stays_within_its_limit() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut weights = [0.0; 64];
        ParamGen::XavierUniform
            .fill(&mut weights, 4, 2, &mut rng)
            .unwrap();

        let limit = 1.0;
        assert!(weights.iter().all(|w| w.abs() <= limit));
        assert!(weights.iter().any(|&w| w != 0.0));
    }

    #[test]
    fn const_fills_every_weight() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut weights = [1.0; 3];
        ParamGen::Const { value: 0.5 }
            .fill(&mut weights, 1, 1, &mut rng)
            .unwrap();
        assert_eq!(weights, [0.5; 3]);
    }

    #[test]
    fn an_empty_uniform_range_is_an_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut weights = [0.0; 3];
        let gen_ = ParamGen::Uniform { low: 1.0, high: 1.0 };
        assert!(gen_.fill(&mut weights, 1, 1, &mut rng).is_err());
    }

    #[test]
    fn specs_deserialize_from_json() {
        let gen_: ParamGen = serde_json::from_str(r#"{"uniform": {"low": -1, "high": 1}}"#).unwrap();
        assert_eq!(gen_, ParamGen::Uniform { low: -1.0, high: 1.0 });

        let gen_: ParamGen = serde_json::from_str(r#""he_normal""#).unwrap();
        assert_eq!(gen_, ParamGen::HeNormal);
    }
}
