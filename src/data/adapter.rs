// ============================================================
// Layer 4 — XY Adapter
// ============================================================
// The view handed to the training loop. Holds the finished
// (reduced, extended, shuffled) samples plus the mapper that
// turns a sample into an (X, Y) pair.
//
// Mapping and batching are lazy. Nothing is mapped until the
// caller pulls from one of the iterators:
//
//   iter()          → x0, x1, x2, x0, x1, x2, x0, ...   (never ends)
//   batch_arrays()  → [x0, x1], [x2, x0], [x1, x2], ... (never ends)
//
// Both iterators cycle over the stored order forever so a
// training loop can run any number of epochs without asking
// the pipeline again. Every call to iter() starts again at the
// first sample; nothing is reshuffled between passes.
//
// Reference: Rust Book §13 (Iterators and Closures)

use std::{fmt, sync::Arc};

use crate::data::error::PipelineError;
use crate::domain::sample::SampleRef;

/// Turns one sample into the value fed to training.
pub type Mapper<T> = Arc<dyn Fn(&SampleRef) -> T + Send + Sync>;

/// The default mapper: hands the sample itself through.
pub fn identity() -> Mapper<SampleRef> {
    Arc::new(|sample: &SampleRef| Arc::clone(sample))
}

pub struct XYAdapter<T> {
    samples:    Vec<SampleRef>,
    mapper:     Mapper<T>,
    batch_size: usize,
}

impl<T> XYAdapter<T> {
    pub fn new(samples: Vec<SampleRef>, mapper: Mapper<T>, batch_size: usize) -> Self {
        Self { samples, mapper, batch_size }
    }

    /// Number of stored samples (before mapping or batching)
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The stored samples, in iteration order
    pub fn samples(&self) -> &[SampleRef] {
        &self.samples
    }

    /// Endless iteration over mapped samples, starting at the first one.
    ///
    /// # Errors
    /// `PipelineError::EmptyAdapter` if there is nothing to cycle over.
    pub fn iter(&self) -> Result<Cycle<'_, T>, PipelineError> {
        if self.samples.is_empty() {
            return Err(PipelineError::EmptyAdapter);
        }
        Ok(Cycle {
            samples:  &self.samples,
            mapper:   &self.mapper,
            position: 0,
        })
    }

    /// Endless iteration over batches of exactly `batch_size` mapped
    /// samples. A batch wraps around when it is larger than the data.
    ///
    /// # Errors
    /// `PipelineError::EmptyAdapter` if there is nothing to cycle over.
    pub fn batch_arrays(&self) -> Result<Batches<'_, T>, PipelineError> {
        Ok(Batches {
            items:      self.iter()?,
            batch_size: self.batch_size,
        })
    }
}

impl<T> fmt::Debug for XYAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XYAdapter")
            .field("len", &self.samples.len())
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

// ─── Cycle ────────────────────────────────────────────────────────────────────
/// Never returns None: wraps back to the first sample after the last.
pub struct Cycle<'a, T> {
    samples:  &'a [SampleRef],
    mapper:   &'a Mapper<T>,
    position: usize,
}

impl<T> Iterator for Cycle<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let sample    = self.samples.get(self.position)?;
        self.position = (self.position + 1) % self.samples.len();
        Some((self.mapper)(sample))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

// ─── Batches ──────────────────────────────────────────────────────────────────
pub struct Batches<'a, T> {
    items:      Cycle<'a, T>,
    batch_size: usize,
}

impl<T> Iterator for Batches<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        Some(self.items.by_ref().take(self.batch_size).collect())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::{MapSample, Sample};
    use serde_json::Value;

    fn numbered(n: i64) -> Vec<SampleRef> {
        (1..=n).map(|i| MapSample::default().with("id", i).into_ref()).collect()
    }

    fn id_mapper() -> Mapper<i64> {
        Arc::new(|s: &SampleRef| s.get("id").and_then(Value::as_i64).unwrap_or(-1))
    }

    #[test]
    fn test_iteration_cycles_forever() {
        let adapter    = XYAdapter::new(numbered(3), id_mapper(), 2);
        let ids: Vec<_> = adapter.iter().unwrap().take(7).collect();
        assert_eq!(ids, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn test_identity_mapper_yields_same_samples() {
        let samples     = numbered(3);
        let adapter     = XYAdapter::new(samples.clone(), identity(), 2);
        let pulled: Vec<_> = adapter.iter().unwrap().take(4).collect();
        assert!(Arc::ptr_eq(&pulled[0], &samples[0]));
        assert!(Arc::ptr_eq(&pulled[3], &samples[0]));
    }

    #[test]
    fn test_each_iteration_restarts_at_first_sample() {
        let adapter = XYAdapter::new(numbered(3), id_mapper(), 2);
        let mut first = adapter.iter().unwrap();
        first.next();
        first.next();
        assert_eq!(adapter.iter().unwrap().next(), Some(1));
    }

    #[test]
    fn test_batches_wrap_around_data() {
        let adapter = XYAdapter::new(numbered(3), id_mapper(), 2);
        let batches: Vec<_> = adapter.batch_arrays().unwrap().take(2).collect();
        assert_eq!(batches, vec![vec![1, 2], vec![3, 1]]);
    }

    #[test]
    fn test_batch_larger_than_data_repeats_samples() {
        let adapter = XYAdapter::new(numbered(2), id_mapper(), 5);
        let batch   = adapter.batch_arrays().unwrap().next().unwrap();
        assert_eq!(batch, vec![1, 2, 1, 2, 1]);
    }

    #[test]
    fn test_len_ignores_batching() {
        let adapter = XYAdapter::new(numbered(5), id_mapper(), 128);
        assert_eq!(adapter.len(), 5);
        assert!(!adapter.is_empty());
    }

    #[test]
    fn test_empty_adapter_refuses_to_iterate() {
        let adapter = XYAdapter::new(Vec::new(), id_mapper(), 4);
        assert_eq!(adapter.iter().err(), Some(PipelineError::EmptyAdapter));
        assert_eq!(adapter.batch_arrays().err(), Some(PipelineError::EmptyAdapter));
    }
}
