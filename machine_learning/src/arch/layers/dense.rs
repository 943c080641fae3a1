use ndarray::{linalg, prelude::*};

use crate::{MlErr, Result, arch::activations::ActFn};

/// A fully connected layer, `act_fn(x·W + b)`.
///
/// Its parameter slice holds the `dim.0 x dim.1` weights followed by the `dim.1` biases.
#[derive(Debug, Clone)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,

    // Forward metadata
    x: Option<Array2<f32>>,
    z: Option<Array2<f32>>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The amount of (inputs, outputs).
    /// * `act_fn` - An optional activation function applied to the outputs.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self {
            dim,
            act_fn,
            x: None,
            z: None,
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    fn size(&self) -> usize {
        (self.dim.0 + 1) * self.dim.1
    }

    /// Makes a forward pass through this layer, keeping its input and pre-activations.
    ///
    /// # Arguments
    /// * `params` - This layer's parameter slice.
    /// * `x` - The input batch.
    ///
    /// # Returns
    /// The layer's activations or an error if the shapes don't line up.
    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(MlErr::SizeMismatch {
                what: "dense layer inputs",
                got: x.ncols(),
                expected: self.dim.0,
            });
        }

        let (w, b) = self.view_params(params)?;
        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1.0, &x, &w, 0.0, &mut z);
        z += &b;

        let a = match &self.act_fn {
            Some(act_fn) => z.mapv(|z| act_fn.f(z)),
            None => z.clone(),
        };

        self.x = Some(x.to_owned());
        self.z = Some(z);
        Ok(a)
    }

    /// Makes a backward pass through this layer, adding its parameter gradients to `grad`.
    ///
    /// # Arguments
    /// * `params` - This layer's parameter slice.
    /// * `grad` - This layer's gradient slice.
    /// * `d` - The gradient of the loss with respect to this layer's output.
    ///
    /// # Returns
    /// The gradient of the loss with respect to this layer's input.
    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        mut d: Array2<f32>,
    ) -> Result<Array2<f32>> {
        let (Some(x), Some(z)) = (&self.x, &self.z) else {
            return Err(MlErr::MissingForward { layer: "dense" });
        };

        if d.dim() != z.dim() {
            return Err(MlErr::SizeMismatch {
                what: "dense layer deltas",
                got: d.len(),
                expected: z.len(),
            });
        }

        if let Some(act_fn) = &self.act_fn {
            d.zip_mut_with(z, |d, &z| *d *= act_fn.df(z));
        }

        let (mut dw, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &x.t(), &d, 1.0, &mut dw);
        db += &d.sum_axis(Axis(0));

        let (w, _) = self.view_params(params)?;
        Ok(d.dot(&w.t()))
    }

    /// Drops the cached forward pass.
    pub fn reset(&mut self) {
        self.x = None;
        self.z = None;
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this layer.
    ///
    /// # Arguments
    /// * `grad` - A gradient slice.
    ///
    /// # Returns
    /// A tuple containing the delta weights and delta biases.
    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        self.check_len(grad.len())?;

        let w_size = self.size() - self.dim.1;
        let (dw_raw, db_raw) = grad.split_at_mut(w_size);
        let dw = ArrayViewMut2::from_shape(self.dim, dw_raw)?;
        let db = ArrayViewMut1::from_shape(self.dim.1, db_raw)?;
        Ok((dw, db))
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    ///
    /// # Arguments
    /// * `params` - A slice of parameters.
    ///
    /// # Returns
    /// A tuple containing the weights and biases.
    fn view_params<'a>(&self, params: &'a [f32]) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        self.check_len(params.len())?;

        let w_size = self.size() - self.dim.1;
        let (w_raw, b_raw) = params.split_at(w_size);
        let weights = ArrayView2::from_shape(self.dim, w_raw)?;
        let biases = ArrayView1::from_shape(self.dim.1, b_raw)?;
        Ok((weights, biases))
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.size() {
            return Err(MlErr::SizeMismatch {
                what: "dense layer parameters",
                got: len,
                expected: self.size(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // w = [[1, 2], [3, 4]], b = [0.5, -1]
    const PARAMS: [f32; 6] = [1.0, 2.0, 3.0, 4.0, 0.5, -1.0];

    #[test]
    fn forward_computes_the_affine_transform() {
        let mut dense = Dense::new((2, 2), None);
        let x = array![[1.0, 1.0], [0.0, 2.0]];

        let y = dense.forward(&PARAMS, x.view()).unwrap();
        assert_eq!(y, array![[4.5, 5.0], [6.5, 7.0]]);
    }

    #[test]
    fn backward_accumulates_the_gradient() {
        let mut dense = Dense::new((2, 2), None);
        let x = array![[1.0, 2.0]];
        let mut grad = [0.0; 6];

        dense.forward(&PARAMS, x.view()).unwrap();
        let dx = dense
            .backward(&PARAMS, &mut grad, array![[1.0, -1.0]])
            .unwrap();

        // dW = xᵀ·d, db = d, dx = d·Wᵀ
        assert_eq!(grad, [1.0, -1.0, 2.0, -2.0, 1.0, -1.0]);
        assert_eq!(dx, array![[-1.0, -1.0]]);

        dense
            .backward(&PARAMS, &mut grad, array![[1.0, -1.0]])
            .unwrap();
        assert_eq!(grad, [2.0, -2.0, 4.0, -4.0, 2.0, -2.0]);
    }

    #[test]
    fn backward_without_forward_fails() {
        let mut dense = Dense::new((2, 2), Some(ActFn::relu()));
        let mut grad = [0.0; 6];

        dense.forward(&PARAMS, array![[1.0, 1.0]].view()).unwrap();
        dense.reset();

        let res = dense.backward(&PARAMS, &mut grad, array![[1.0, 1.0]]);
        assert!(matches!(res, Err(MlErr::MissingForward { .. })));
    }

    #[test]
    fn wrong_input_width_is_rejected() {
        let mut dense = Dense::new((2, 2), None);
        let res = dense.forward(&PARAMS, array![[1.0, 1.0, 1.0]].view());
        assert!(matches!(res, Err(MlErr::SizeMismatch { got: 3, expected: 2, .. })));
    }
}
