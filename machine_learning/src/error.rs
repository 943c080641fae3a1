use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use ndarray::ShapeError;
use safetensors::tensor::SafeTensorError;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
///
/// Every collaborator of the training loop (models, loss functions, optimizers, checkpoint
/// sinks) reports failures with this type, so the loop propagates them untouched.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidBatchSize,
    InvalidInput(&'static str),
    InvalidSpec(String),
    MissingForward {
        layer: &'static str,
    },
    NonFinite {
        what: &'static str,
    },
    TrainerPoisoned,
    Shape(ShapeError),
    Checkpoint(SafeTensorError),
    Io(io::Error),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch for {what}, got {got} and expected {expected}"
            ),
            MlErr::InvalidBatchSize => write!(f, "The batch size must be at least 1"),
            MlErr::InvalidInput(msg) => write!(f, "The input is invalid: {msg}"),
            MlErr::InvalidSpec(msg) => write!(f, "The spec is invalid: {msg}"),
            MlErr::MissingForward { layer } => write!(
                f,
                "Tried to run a backward pass through a {layer} layer without a cached forward pass"
            ),
            MlErr::NonFinite { what } => write!(f, "The {what} is not a finite number"),
            MlErr::TrainerPoisoned => write!(
                f,
                "A previous training step failed midway, the trainer's state can't be trusted"
            ),
            MlErr::Shape(e) => write!(f, "An array has the wrong shape: {e}"),
            MlErr::Checkpoint(e) => write!(f, "The checkpoint couldn't be handled: {e}"),
            MlErr::Io(e) => write!(f, "An io operation failed: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Shape(e) => Some(e),
            MlErr::Checkpoint(e) => Some(e),
            MlErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ShapeError> for MlErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<SafeTensorError> for MlErr {
    fn from(value: SafeTensorError) -> Self {
        Self::Checkpoint(value)
    }
}
