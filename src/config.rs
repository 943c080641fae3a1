use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use machine_learning::specs::TrainerSpec;
use serde::Deserialize;

use crate::data::DatasetConfig;

/// The configuration of a training run.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub trainer: TrainerSpec,
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub eval_dataset: Option<DatasetConfig>,
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
    #[serde(default = "default_checkpoint_prefix")]
    pub checkpoint_prefix: String,
    /// A checkpoint to start from instead of freshly initialized parameters.
    #[serde(default)]
    pub init_checkpoint: Option<PathBuf>,
    #[serde(default = "default_log_interval")]
    pub log_interval: usize,
}

impl Config {
    /// Reads a `Config` from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read '{}'", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("invalid config '{}'", path.display()))
    }
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("model_saves")
}

fn default_checkpoint_prefix() -> String {
    "model".to_string()
}

fn default_log_interval() -> usize {
    1
}
