pub mod arch;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod optimization;
pub mod specs;
mod test;
pub mod training;

pub use error::{MlErr, Result};
