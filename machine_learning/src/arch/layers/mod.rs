mod dense;
mod dropout;
mod layer;

pub use dense::Dense;
pub use dropout::Dropout;
pub use layer::Layer;
