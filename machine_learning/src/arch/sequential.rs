use std::ops::Range;

use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{Mode, Model, ParamGen, Parameters, layers::Layer};
use crate::{MlErr, Result};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
#[derive(Debug, Clone)]
pub struct Sequential {
    layers: Vec<Layer>,
    ranges: Vec<Range<usize>>,
    params: Parameters,
}

impl Sequential {
    /// Creates a new `Sequential` with every parameter set to zero.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance or an error if two consecutive dense layers don't connect.
    pub fn new<I>(layers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Layer>,
    {
        let layers: Vec<Layer> = layers.into_iter().collect();
        check_connections(&layers)?;

        let mut params = Parameters::new();
        let ranges = layers
            .iter()
            .enumerate()
            .map(|(i, layer)| {
                let start = params.len();
                for (name, shape) in layer.param_shapes() {
                    params.register(format!("layers.{i}.{name}"), &shape);
                }
                start..params.len()
            })
            .collect();

        Ok(Self {
            layers,
            ranges,
            params,
        })
    }

    /// Initializes the weights of every dense layer with `init` and zeroes the biases.
    ///
    /// # Arguments
    /// * `init` - The weight initialization strategy.
    /// * `rng` - A random number generator.
    pub fn init<R: Rng + ?Sized>(&mut self, init: &ParamGen, rng: &mut R) -> Result<()> {
        let values = self.params.values_mut();

        for (layer, range) in self.layers.iter().zip(&self.ranges) {
            let Layer::Dense(dense) = layer else {
                continue;
            };

            let (n_in, n_out) = dense.dim();
            let (weights, biases) = values[range.clone()].split_at_mut(n_in * n_out);
            init.fill(weights, n_in, n_out, rng)?;
            biases.fill(0.0);
        }

        Ok(())
    }
}

impl Model for Sequential {
    fn forward(&mut self, x: ArrayView2<f32>, mode: Mode) -> Result<Array2<f32>> {
        let values = self.params.values();
        let mut out: Option<Array2<f32>> = None;

        for (layer, range) in self.layers.iter_mut().zip(&self.ranges) {
            let input = out.as_ref().map_or(x.view(), |a| a.view());
            let next = layer.forward(&values[range.clone()], input, mode)?;
            out = Some(next);
        }

        Ok(out.unwrap_or_else(|| x.to_owned()))
    }

    fn backward(&mut self, d: ArrayView2<f32>) -> Result<()> {
        let (values, grad) = self.params.split_mut();
        let mut d = d.to_owned();

        for (layer, range) in self.layers.iter_mut().zip(&self.ranges).rev() {
            d = layer.backward(&values[range.clone()], &mut grad[range.clone()], d)?;
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.layers.iter_mut().for_each(Layer::reset);
    }

    fn params(&self) -> &Parameters {
        &self.params
    }

    fn params_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }
}

fn check_connections(layers: &[Layer]) -> Result<()> {
    let mut prev_out: Option<usize> = None;

    for (i, layer) in layers.iter().enumerate() {
        let Layer::Dense(dense) = layer else {
            continue;
        };

        let (n_in, n_out) = dense.dim();
        if let Some(expected) = prev_out {
            if n_in != expected {
                return Err(MlErr::InvalidSpec(format!(
                    "layer {i} takes {n_in} inputs but the previous dense layer outputs {expected}"
                )));
            }
        }
        prev_out = Some(n_out);
    }

    Ok(())
}
