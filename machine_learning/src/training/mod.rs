mod builder;
mod checkpoint;
mod evaluate;
mod model_trainer;
mod report;
mod reporter;
mod trainer;

pub use builder::TrainerBuilder;
pub use checkpoint::{CheckpointSink, SafetensorsSink, load_checkpoint};
pub use evaluate::{Evaluation, evaluate};
pub use model_trainer::{ModelTrainer, Phase};
pub use report::{EpochSummary, TrainReport};
pub use reporter::{History, LogReporter, MetricsReporter, StepMetrics};
pub use trainer::Trainer;
