use std::num::NonZeroUsize;

use ndarray::{Array2, ArrayView2, Axis, s};
use rand::{Rng, seq::SliceRandom};

use crate::{MlErr, Result};

/// An in-memory supervised dataset.
///
/// Features and labels are two index-aligned matrices: row `i` of `x` pairs with row `i` of `y`.
/// The dataset is never mutated in place, shuffling produces a reordered copy.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Array2<f32>,
    y: Array2<f32>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `x` - The features, one sample per row.
    /// * `y` - The labels, one sample per row.
    ///
    /// # Returns
    /// A new `Dataset` instance or an error if the amount of rows differ.
    pub fn new(x: Array2<f32>, y: Array2<f32>) -> Result<Self> {
        if x.nrows() != y.nrows() {
            return Err(MlErr::SizeMismatch {
                what: "label rows",
                got: y.nrows(),
                expected: x.nrows(),
            });
        }

        Ok(Self { x, y })
    }

    /// Creates a new `Dataset` from a flat buffer where each row holds `x_size` features
    /// followed by `y_size` labels.
    ///
    /// # Arguments
    /// * `data` - The raw samples.
    /// * `x_size` - The amount of features per sample.
    /// * `y_size` - The amount of labels per sample.
    ///
    /// # Returns
    /// A new `Dataset` instance or an error if `data` can't be split in whole rows.
    pub fn from_flat(data: Vec<f32>, x_size: usize, y_size: usize) -> Result<Self> {
        let row_size = x_size + y_size;
        if x_size == 0 || y_size == 0 {
            return Err(MlErr::InvalidInput(
                "samples must have at least one feature and one label",
            ));
        }

        if data.len() % row_size != 0 {
            return Err(MlErr::SizeMismatch {
                what: "flat dataset length",
                got: data.len(),
                expected: data.len() - data.len() % row_size,
            });
        }

        let rows = data.len() / row_size;
        let full = Array2::from_shape_vec((rows, row_size), data)?;
        let (x, y) = full.view().split_at(Axis(1), x_size);

        Self::new(x.to_owned(), y.to_owned())
    }

    /// Creates a new `Dataset` expanding class indices into one-hot label rows.
    ///
    /// # Arguments
    /// * `x` - The features, one sample per row.
    /// * `classes` - The class index of each sample.
    /// * `num_classes` - The total amount of classes.
    ///
    /// # Returns
    /// A new `Dataset` instance or an error if a class is out of range or the lengths differ.
    pub fn from_class_indices(x: Array2<f32>, classes: &[usize], num_classes: usize) -> Result<Self> {
        if let Some(&class) = classes.iter().find(|&&c| c >= num_classes) {
            return Err(MlErr::SizeMismatch {
                what: "class index",
                got: class,
                expected: num_classes,
            });
        }

        let mut y = Array2::zeros((classes.len(), num_classes));
        for (mut row, &class) in y.rows_mut().into_iter().zip(classes) {
            row[class] = 1.0;
        }

        Self::new(x, y)
    }

    /// Returns the amount of samples.
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the amount of features per sample.
    pub fn x_size(&self) -> usize {
        self.x.ncols()
    }

    /// Returns the amount of labels per sample.
    pub fn y_size(&self) -> usize {
        self.y.ncols()
    }

    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.x.view()
    }

    pub fn labels(&self) -> ArrayView2<'_, f32> {
        self.y.view()
    }

    /// Draws a uniform random permutation and returns the reordered copy.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut perm: Vec<usize> = (0..self.len()).collect();
        perm.shuffle(rng);
        self.select(&perm)
    }

    /// Iterates over the full batches of this dataset, a trailing partial batch is dropped.
    ///
    /// # Arguments
    /// * `batch_size` - The amount of samples per batch.
    pub fn batches(&self, batch_size: NonZeroUsize) -> Batches<'_> {
        Batches {
            dataset: self,
            batch_size: batch_size.get(),
            start: 0,
            drop_last: true,
        }
    }

    /// Iterates over the dataset in chunks of `batch_size`, keeping a trailing partial chunk.
    ///
    /// # Arguments
    /// * `batch_size` - The maximum amount of samples per chunk.
    pub fn chunks(&self, batch_size: NonZeroUsize) -> Batches<'_> {
        Batches {
            drop_last: false,
            ..self.batches(batch_size)
        }
    }

    fn select(&self, indices: &[usize]) -> Self {
        Self {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
        }
    }
}

/// Returns the amount of full batches an epoch over `len` samples yields.
///
/// Equals `(len - batch_size) / batch_size + 1` when `len >= batch_size` and zero otherwise.
pub fn num_batches(len: usize, batch_size: NonZeroUsize) -> usize {
    len / batch_size.get()
}

/// A borrowed batch of samples, its views are read-only inputs for a training step.
#[derive(Debug, Clone)]
pub struct Batch<'a> {
    /// The index of the batch's first sample.
    pub start: usize,
    pub x: ArrayView2<'a, f32>,
    pub y: ArrayView2<'a, f32>,
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterator over contiguous batches of a `Dataset`.
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    dataset: &'a Dataset,
    batch_size: usize,
    start: usize,
    drop_last: bool,
}

impl<'a> Iterator for Batches<'a> {
    type Item = Batch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.dataset.len();
        if self.start >= len {
            return None;
        }

        let mut end = self.start + self.batch_size;
        if end > len {
            if self.drop_last {
                return None;
            }
            end = len;
        }

        let batch = Batch {
            start: self.start,
            x: self.dataset.x.slice(s![self.start..end, ..]),
            y: self.dataset.y.slice(s![self.start..end, ..]),
        };

        self.start = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.start);
        let n = if self.drop_last {
            remaining / self.batch_size
        } else {
            remaining.div_ceil(self.batch_size)
        };

        (n, Some(n))
    }
}

impl ExactSizeIterator for Batches<'_> {}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn indexed(n: usize) -> Dataset {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f32);
        let y = Array2::from_shape_fn((n, 1), |(i, _)| i as f32 + 1000.0);
        Dataset::new(x, y).unwrap()
    }

    #[test]
    fn mismatched_rows_are_rejected() {
        let x = Array2::zeros((3, 2));
        let y = Array2::zeros((2, 1));
        assert!(matches!(
            Dataset::new(x, y),
            Err(MlErr::SizeMismatch { got: 2, expected: 3, .. })
        ));
    }

    #[test]
    fn from_flat_splits_features_and_labels() {
        let and2 = vec![
            0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            1.0, 0.0, 0.0, //
            1.0, 1.0, 1.0, //
        ];

        let ds = Dataset::from_flat(and2, 2, 1).unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.features().row(3), array![1.0, 1.0]);
        assert_eq!(ds.labels().column(0), array![0.0, 0.0, 0.0, 1.0]);

        assert!(Dataset::from_flat(vec![0.0; 7], 2, 1).is_err());
    }

    #[test]
    fn class_indices_become_one_hot_rows() {
        let ds = Dataset::from_class_indices(Array2::zeros((3, 1)), &[2, 0, 1], 3).unwrap();
        assert_eq!(
            ds.labels(),
            array![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        );

        assert!(Dataset::from_class_indices(Array2::zeros((1, 1)), &[3], 3).is_err());
    }

    #[test]
    fn batch_count_drops_the_partial_batch() {
        for (len, bs) in [(130, 64), (128, 64), (63, 64), (64, 64), (10, 3), (10, 1), (0, 5)] {
            let ds = indexed(len);
            let batches: Vec<_> = ds.batches(nz(bs)).collect();

            let expected = if len >= bs { (len - bs) / bs + 1 } else { 0 };
            assert_eq!(batches.len(), expected, "len={len} bs={bs}");
            assert_eq!(num_batches(len, nz(bs)), expected);

            for batch in &batches {
                assert_eq!(batch.len(), bs);
                assert!(batch.start + bs <= len);
            }
        }
    }

    #[test]
    fn batches_start_at_multiples_of_the_batch_size() {
        let ds = indexed(130);
        let starts: Vec<_> = ds.batches(nz(64)).map(|b| b.start).collect();
        assert_eq!(starts, [0, 64]);
    }

    #[test]
    fn chunks_keep_the_trailing_samples() {
        let ds = indexed(10);
        let sizes: Vec<_> = ds.chunks(nz(4)).map(|b| b.len()).collect();
        assert_eq!(sizes, [4, 4, 2]);
        assert_eq!(ds.chunks(nz(4)).len(), 3);
    }

    #[test]
    fn shuffling_keeps_features_and_labels_aligned() {
        let ds = indexed(50);
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = ds.shuffled(&mut rng);

        assert_eq!(shuffled.len(), ds.len());
        for (x, y) in shuffled.features().rows().into_iter().zip(shuffled.labels().rows()) {
            let original = (x[0] / 2.0) as usize;
            assert_eq!(x[1], x[0] + 1.0);
            assert_eq!(y[0], original as f32 + 1000.0);
        }

        // The base ordering stays untouched.
        assert_eq!(ds.features().row(0), array![0.0, 1.0]);
    }

    #[test]
    fn shuffles_are_reproducible_given_a_seed() {
        let ds = indexed(20);
        let a = ds.shuffled(&mut StdRng::seed_from_u64(3));
        let b = ds.shuffled(&mut StdRng::seed_from_u64(3));
        assert_eq!(a.features(), b.features());
    }
}
