use std::ops::Range;

use crate::{MlErr, Result};

/// A named, shaped region of the flat parameter buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSlot {
    name: String,
    shape: Vec<usize>,
    offset: usize,
}

impl ParamSlot {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the amount of scalars in this slot.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the region of the flat buffers this slot spans.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len()
    }
}

/// The learnable parameters of a model together with their gradient.
///
/// Values and gradients live in two flat buffers of equal length, so optimizers can update
/// every parameter with a single pass, while the slots keep track of what each region is.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    values: Vec<f32>,
    grad: Vec<f32>,
    slots: Vec<ParamSlot>,
}

impl Parameters {
    /// Creates a new empty `Parameters`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a zeroed parameter of the given shape.
    ///
    /// # Arguments
    /// * `name` - A unique name for the parameter.
    /// * `shape` - The parameter's shape.
    ///
    /// # Returns
    /// The region of the flat buffers the new parameter spans.
    pub fn register(&mut self, name: impl Into<String>, shape: &[usize]) -> Range<usize> {
        let slot = ParamSlot {
            name: name.into(),
            shape: shape.to_vec(),
            offset: self.values.len(),
        };

        let range = slot.range();
        self.values.resize(range.end, 0.0);
        self.grad.resize(range.end, 0.0);
        self.slots.push(slot);
        range
    }

    /// Returns the total amount of scalar parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn slots(&self) -> &[ParamSlot] {
        &self.slots
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    pub fn grad(&self) -> &[f32] {
        &self.grad
    }

    /// Borrows the values and the gradient at the same time.
    pub fn split_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.values, &mut self.grad)
    }

    /// Clears any gradient accumulated so far.
    pub fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }

    /// Returns the values of the parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&[f32]> {
        let slot = self.slots.iter().find(|slot| slot.name == name)?;
        Some(&self.values[slot.range()])
    }

    /// Overwrites the values of the parameter called `name`.
    ///
    /// # Arguments
    /// * `name` - The parameter's name.
    /// * `values` - The new values, must have exactly the parameter's length.
    ///
    /// # Returns
    /// An error if there's no such parameter or the length is wrong.
    pub fn assign(&mut self, name: &str, values: &[f32]) -> Result<()> {
        let range = self
            .slots
            .iter()
            .find(|slot| slot.name == name)
            .map(ParamSlot::range)
            .ok_or_else(|| MlErr::InvalidSpec(format!("unknown parameter '{name}'")))?;

        if values.len() != range.len() {
            return Err(MlErr::SizeMismatch {
                what: "parameter values",
                got: values.len(),
                expected: range.len(),
            });
        }

        self.values[range].copy_from_slice(values);
        Ok(())
    }
}
