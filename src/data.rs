use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail, ensure};
use machine_learning::dataset::Dataset;
use ndarray::Array2;
use serde::Deserialize;

const IDX_IMAGES_MAGIC: u32 = 0x0000_0803;
const IDX_LABELS_MAGIC: u32 = 0x0000_0801;

/// Where a dataset comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetConfig {
    /// A pair of IDX files (the MNIST distribution format): `u8` images and `u8` class labels.
    Idx {
        images: PathBuf,
        labels: PathBuf,
        #[serde(default = "default_classes")]
        classes: usize,
        /// Multiplies every pixel.
        #[serde(default = "default_scale")]
        scale: f32,
        /// Keeps only the first `limit` samples.
        #[serde(default)]
        limit: Option<usize>,
    },
    /// Rows of `x_size` features followed by `y_size` labels.
    Inline {
        data: Vec<f32>,
        x_size: usize,
        y_size: usize,
    },
}

impl DatasetConfig {
    /// Materializes the dataset in memory.
    pub fn load(&self) -> Result<Dataset> {
        match self {
            DatasetConfig::Idx {
                images,
                labels,
                classes,
                scale,
                limit,
            } => {
                let image_bytes = fs::read(images)
                    .with_context(|| format!("cannot read '{}'", images.display()))?;
                let label_bytes = fs::read(labels)
                    .with_context(|| format!("cannot read '{}'", labels.display()))?;

                idx_dataset(&image_bytes, &label_bytes, *classes, *scale, *limit)
            }
            DatasetConfig::Inline {
                data,
                x_size,
                y_size,
            } => Ok(Dataset::from_flat(data.clone(), *x_size, *y_size)?),
        }
    }
}

/// Builds a dataset out of the raw contents of an IDX image file and an IDX label file.
fn idx_dataset(
    image_bytes: &[u8],
    label_bytes: &[u8],
    classes: usize,
    scale: f32,
    limit: Option<usize>,
) -> Result<Dataset> {
    let (count, pixels, images) = parse_idx_images(image_bytes)?;
    let labels = parse_idx_labels(label_bytes)?;

    ensure!(
        labels.len() == count,
        "there are {count} images but {} labels",
        labels.len()
    );

    let n = limit.map_or(count, |limit| limit.min(count));
    let x: Vec<f32> = images[..n * pixels]
        .iter()
        .map(|&p| p as f32 * scale)
        .collect();
    let x = Array2::from_shape_vec((n, pixels), x)?;

    let labels: Vec<usize> = labels[..n].iter().map(|&l| l as usize).collect();
    Ok(Dataset::from_class_indices(x, &labels, classes)?)
}

/// Parses an IDX3 image file.
///
/// # Returns
/// The amount of images, the amount of pixels per image and the pixels themselves.
fn parse_idx_images(bytes: &[u8]) -> Result<(usize, usize, &[u8])> {
    let magic = read_be_u32(bytes, 0)?;
    if magic != IDX_IMAGES_MAGIC {
        bail!("not an IDX image file, magic number is {magic:#010x}");
    }

    let count = read_be_u32(bytes, 4)? as usize;
    let rows = read_be_u32(bytes, 8)? as usize;
    let cols = read_be_u32(bytes, 12)? as usize;
    let pixels = rows.checked_mul(cols).context("IDX dimensions overflow")?;
    let total = count.checked_mul(pixels).context("IDX dimensions overflow")?;

    let data = &bytes[16..];
    ensure!(
        data.len() == total,
        "expected {count} images of {rows}x{cols}, got {} bytes",
        data.len()
    );

    Ok((count, pixels, data))
}

/// Parses an IDX1 label file.
fn parse_idx_labels(bytes: &[u8]) -> Result<&[u8]> {
    let magic = read_be_u32(bytes, 0)?;
    if magic != IDX_LABELS_MAGIC {
        bail!("not an IDX label file, magic number is {magic:#010x}");
    }

    let count = read_be_u32(bytes, 4)? as usize;
    let data = &bytes[8..];
    ensure!(
        data.len() == count,
        "expected {count} labels, got {} bytes",
        data.len()
    );

    Ok(data)
}

fn read_be_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    let raw = bytes
        .get(offset..offset + 4)
        .context("truncated IDX header")?;

    Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn default_classes() -> usize {
    10
}

fn default_scale() -> f32 {
    1.0 / 255.0
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn idx_images(images: &[[u8; 4]]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(IDX_IMAGES_MAGIC.to_be_bytes());
        bytes.extend((images.len() as u32).to_be_bytes());
        bytes.extend(2u32.to_be_bytes());
        bytes.extend(2u32.to_be_bytes());
        images.iter().for_each(|img| bytes.extend(img));
        bytes
    }

    fn idx_labels(labels: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend(IDX_LABELS_MAGIC.to_be_bytes());
        bytes.extend((labels.len() as u32).to_be_bytes());
        bytes.extend(labels);
        bytes
    }

    #[test]
    fn idx_files_become_scaled_one_hot_datasets() {
        let images = idx_images(&[[0, 255, 51, 0], [255, 255, 255, 255]]);
        let labels = idx_labels(&[2, 0]);

        let ds = idx_dataset(&images, &labels, 3, 0.5, None).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.features().row(0), array![0.0, 127.5, 25.5, 0.0]);
        assert_eq!(ds.labels(), array![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]);
    }

    #[test]
    fn limit_keeps_the_first_samples() {
        let images = idx_images(&[[1; 4], [2; 4], [3; 4]]);
        let labels = idx_labels(&[0, 1, 0]);

        let ds = idx_dataset(&images, &labels, 2, 1.0, Some(2)).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.features().row(1), array![2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn malformed_idx_files_are_rejected() {
        let images = idx_images(&[[0; 4], [0; 4]]);

        assert!(idx_dataset(&images, &idx_labels(&[0]), 10, 1.0, None).is_err());
        assert!(idx_dataset(&idx_labels(&[0, 0]), &idx_labels(&[0, 0]), 10, 1.0, None).is_err());
        assert!(idx_dataset(&images[..10], &idx_labels(&[0, 0]), 10, 1.0, None).is_err());
        assert!(idx_dataset(&images[..20], &idx_labels(&[0, 0]), 10, 1.0, None).is_err());
        assert!(idx_dataset(&images, &idx_labels(&[0, 10]), 10, 1.0, None).is_err());
    }

    #[test]
    fn overflowing_idx_dimensions_are_rejected() {
        let mut images = Vec::new();
        images.extend(IDX_IMAGES_MAGIC.to_be_bytes());
        (0..3).for_each(|_| images.extend(u32::MAX.to_be_bytes()));

        let err = idx_dataset(&images, &idx_labels(&[0]), 10, 1.0, None).unwrap_err();
        assert!(err.to_string().contains("overflow"), "{err}");
    }

    #[test]
    fn inline_datasets_split_rows() {
        let config = DatasetConfig::Inline {
            data: vec![0.0, 1.0, 1.0, 1.0, 0.0, 1.0],
            x_size: 2,
            y_size: 1,
        };

        let ds = config.load().unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.labels(), array![[1.0], [1.0]]);
    }
}
