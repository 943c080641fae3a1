use ndarray::{Array2, ArrayView2};

use super::{Dense, Dropout};
use crate::{
    Result,
    arch::{Mode, activations::ActFn},
};

/// A layer of a `Sequential` model.
#[derive(Debug, Clone)]
pub enum Layer {
    Dense(Dense),
    Dropout(Dropout),
}
use Layer::*;

impl Layer {
    pub fn dense(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self::Dense(Dense::new(dim, act_fn))
    }

    pub fn dropout(rate: f32, seed: u64) -> Result<Self> {
        Ok(Self::Dropout(Dropout::new(rate, seed)?))
    }

    /// Returns the name and shape of each of this layer's parameters, in buffer order.
    pub fn param_shapes(&self) -> Vec<(&'static str, Vec<usize>)> {
        match self {
            Dense(l) => {
                let (n_in, n_out) = l.dim();
                vec![("weight", vec![n_in, n_out]), ("bias", vec![n_out])]
            }
            Dropout(_) => Vec::new(),
        }
    }

    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>, mode: Mode) -> Result<Array2<f32>> {
        match self {
            Dense(l) => l.forward(params, x),
            Dropout(l) => Ok(l.forward(x, mode)),
        }
    }

    pub fn backward(&mut self, params: &[f32], grad: &mut [f32], d: Array2<f32>) -> Result<Array2<f32>> {
        match self {
            Dense(l) => l.backward(params, grad, d),
            Dropout(l) => l.backward(d),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Dense(l) => l.reset(),
            Dropout(l) => l.reset(),
        }
    }
}
