pub mod activations;
mod init;
pub mod layers;
pub mod loss;
mod model;
mod params;
mod sequential;

pub use init::ParamGen;
pub use model::{Mode, Model};
pub use params::{ParamSlot, Parameters};
pub use sequential::Sequential;
