use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use safetensors::tensor::{Dtype, SafeTensors, TensorView, serialize_to_file};

use crate::{MlErr, Result, arch::Parameters};

const EPOCH_KEY: &str = "epoch";

/// Durably persists a model's parameters at the end of every epoch.
pub trait CheckpointSink {
    /// Persists `params` as the checkpoint of `epoch`.
    ///
    /// # Arguments
    /// * `epoch` - The index of the epoch that just finished.
    /// * `params` - The model's parameters.
    ///
    /// # Returns
    /// An error if the checkpoint couldn't be persisted.
    fn save(&mut self, epoch: usize, params: &Parameters) -> Result<()>;
}

impl<T: CheckpointSink + ?Sized> CheckpointSink for &mut T {
    fn save(&mut self, epoch: usize, params: &Parameters) -> Result<()> {
        (**self).save(epoch, params)
    }
}

/// Writes one `safetensors` file per epoch, named `<prefix>_epoch_<epoch>.safetensors`.
#[derive(Debug, Clone)]
pub struct SafetensorsSink {
    dir: PathBuf,
    prefix: String,
}

impl SafetensorsSink {
    /// Creates a new `SafetensorsSink` writing into `dir` with the `model` prefix.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "model".to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns the path the checkpoint of `epoch` is written to.
    pub fn path(&self, epoch: usize) -> PathBuf {
        self.dir
            .join(format!("{}_epoch_{epoch}.safetensors", self.prefix))
    }
}

impl CheckpointSink for SafetensorsSink {
    fn save(&mut self, epoch: usize, params: &Parameters) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let values = params.values();
        let tensors = params
            .slots()
            .iter()
            .map(|slot| {
                let bytes: &[u8] = bytemuck::cast_slice(&values[slot.range()]);
                let view = TensorView::new(Dtype::F32, slot.shape().to_vec(), bytes)?;
                Ok((slot.name(), view))
            })
            .collect::<Result<Vec<_>>>()?;

        let metadata = HashMap::from([(EPOCH_KEY.to_string(), epoch.to_string())]);

        // Written aside and renamed, a crash never leaves a truncated checkpoint behind.
        let path = self.path(epoch);
        let tmp = path.with_extension("safetensors.tmp");
        serialize_to_file(tensors, &Some(metadata), &tmp)?;
        fs::rename(&tmp, &path)?;

        info!(epoch = epoch; "checkpoint saved to {}", path.display());
        Ok(())
    }
}

/// Restores parameters from a `safetensors` checkpoint.
///
/// Every parameter in `params` must be present in the file with the same shape.
///
/// # Arguments
/// * `path` - The checkpoint's path.
/// * `params` - The parameters to overwrite.
///
/// # Returns
/// The epoch the checkpoint was taken at, if recorded, or an error if it doesn't fit `params`.
pub fn load_checkpoint(path: impl AsRef<Path>, params: &mut Parameters) -> Result<Option<usize>> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;

    let (_, metadata) = SafeTensors::read_metadata(&bytes)?;
    let epoch = metadata
        .metadata()
        .as_ref()
        .and_then(|m| m.get(EPOCH_KEY))
        .and_then(|e| e.parse().ok());

    let tensors = SafeTensors::deserialize(&bytes)?;
    let stored = tensors.names().len();
    if stored != params.slots().len() {
        return Err(MlErr::SizeMismatch {
            what: "checkpoint tensors",
            got: stored,
            expected: params.slots().len(),
        });
    }

    for slot in params.slots().to_vec() {
        let view = tensors.tensor(slot.name())?;
        if view.dtype() != Dtype::F32 {
            return Err(MlErr::InvalidSpec(format!(
                "parameter '{}' is stored as {:?}, expected F32",
                slot.name(),
                view.dtype()
            )));
        }

        if view.shape() != slot.shape() {
            return Err(MlErr::InvalidSpec(format!(
                "parameter '{}' has shape {:?}, expected {:?}",
                slot.name(),
                view.shape(),
                slot.shape()
            )));
        }

        let values: Vec<f32> = bytemuck::pod_collect_to_vec(view.data());
        params.assign(slot.name(), &values)?;
    }

    debug!("checkpoint loaded from {} (epoch {epoch:?})", path.display());
    Ok(epoch)
}
