// ============================================================
// Layer 4 — Sample Pipeline
// ============================================================
// Prepares raw samples for a training run. Samples flow
// through these stages:
//
//   S1  filter    keep a sample if ANY filter accepts it
//       │         (no filters → keep everything)
//       ▼
//   S2  reduce    apply reducers left to right
//       │         (transform, or restrict to a probe set)
//       ▼
//   S3  split     train / validate / test     (split() only)
//       │
//       ▼
//   S4  extend    each extender turns one sample into 0..n;
//       │         extenders compose, so 2 × 3 → 6 per sample
//       ▼         (after a split, only "train" is extended)
//   S5  shuffle   uniform permutation from the caller's RNG
//       │
//       ▼
//   S6  map       sample → (X, Y)     ┐ deferred into
//   S7  batch     batch_size pairs    ┘ XYAdapter
//
// Usage:
//
//   let mut pl = Pipeline::new();
//   pl.add_filter(|s| Ok(s.get("value").and_then(Value::as_f64) > Some(0.5)));
//   pl.add_reducer(Reducer::restrict(["in", "out"]));
//   pl.add_extender(augment);
//   let pl = pl.with_mapper(|s| (s.get("in").cloned(), s.get("out").cloned()));
//
//   let mut rng = StdRng::seed_from_u64(42);
//   let groups  = pl.split(samples, &mut rng)?;
//   let batches = groups["train"].batch_arrays()?;
//
// Errors from filters, reducers and extenders propagate to the
// caller unchanged.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            rand crate documentation (SliceRandom)

use std::{collections::BTreeMap, fmt, sync::Arc};

use anyhow::Result;
use rand::{seq::SliceRandom, Rng};

use crate::data::{
    adapter::{identity, Mapper, XYAdapter},
    error::PipelineError,
    reduced::ReducedSample,
    splitter::{split_by_category, Categories, TRAIN},
};
use crate::domain::sample::{ProbeId, Sample, SampleRef};

pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Inclusion predicate for S1.
pub type Filter = Box<dyn Fn(&dyn Sample) -> Result<bool> + Send + Sync>;

/// Arbitrary sample transform for S2.
pub type Transform = Box<dyn Fn(SampleRef) -> Result<SampleRef> + Send + Sync>;

/// Synthetic sample generator for S4.
pub type Extender = Box<dyn Fn(&SampleRef) -> Result<Vec<SampleRef>> + Send + Sync>;

// ─── Reducer ──────────────────────────────────────────────────────────────────
/// One S2 step.
pub enum Reducer {
    /// Replace the sample with whatever the function returns
    Transform(Transform),
    /// Hide every probe not in the list
    Restrict(Vec<ProbeId>),
}

impl Reducer {
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(SampleRef) -> Result<SampleRef> + Send + Sync + 'static,
    {
        Self::Transform(Box::new(f))
    }

    pub fn restrict<I, S>(probes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ProbeId>,
    {
        Self::Restrict(probes.into_iter().map(Into::into).collect())
    }

    fn apply(&self, sample: SampleRef) -> Result<SampleRef> {
        match self {
            Self::Transform(f)        => f(sample),
            Self::Restrict(reduction) => Ok(Arc::new(ReducedSample::new(sample, reduction.clone()))),
        }
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform(_)    => f.write_str("Transform(..)"),
            Self::Restrict(probes) => f.debug_tuple("Restrict").field(probes).finish(),
        }
    }
}

// ─── Pipeline ─────────────────────────────────────────────────────────────────
/// Pipeline configuration. Fields are public so callers can
/// adjust them freely before running; the pipeline keeps no
/// other state.
///
/// `T` is what the mapper produces for each sample. The default
/// mapper is the identity, so `T` starts out as `SampleRef`.
pub struct Pipeline<T = SampleRef> {
    pub filters:    Vec<Filter>,
    pub reducers:   Vec<Reducer>,
    pub categories: Categories,
    pub extenders:  Vec<Extender>,
    pub mapper:     Mapper<T>,
    pub batch_size: usize,
    pub shuffle:    bool,
}

impl Pipeline<SampleRef> {
    /// No filters, reducers or extenders; identity mapper;
    /// default categories; batch size 128; shuffling on.
    pub fn new() -> Self {
        Self {
            filters:    Vec::new(),
            reducers:   Vec::new(),
            categories: Categories::default(),
            extenders:  Vec::new(),
            mapper:     identity(),
            batch_size: DEFAULT_BATCH_SIZE,
            shuffle:    true,
        }
    }
}

impl Default for Pipeline<SampleRef> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pipeline<T> {
    pub fn add_filter<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&dyn Sample) -> Result<bool> + Send + Sync + 'static,
    {
        self.filters.push(Box::new(f));
        self
    }

    pub fn add_reducer(&mut self, reducer: Reducer) -> &mut Self {
        self.reducers.push(reducer);
        self
    }

    pub fn add_extender<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&SampleRef) -> Result<Vec<SampleRef>> + Send + Sync + 'static,
    {
        self.extenders.push(Box::new(f));
        self
    }

    /// Swap the mapper, changing what the adapters yield.
    pub fn with_mapper<U, F>(self, mapper: F) -> Pipeline<U>
    where
        F: Fn(&SampleRef) -> U + Send + Sync + 'static,
    {
        Pipeline {
            filters:    self.filters,
            reducers:   self.reducers,
            categories: self.categories,
            extenders:  self.extenders,
            mapper:     Arc::new(mapper),
            batch_size: self.batch_size,
            shuffle:    self.shuffle,
        }
    }

    /// Run S1 and S2 only, appending each result to `output` in
    /// input order. Nothing is extended, shuffled or batched.
    pub fn append_reduced_samples<I, E>(&self, input: I, output: &mut E) -> Result<()>
    where
        I: IntoIterator<Item = SampleRef>,
        E: Extend<SampleRef>,
    {
        for sample in self.reduced_samples(input) {
            output.extend(std::iter::once(sample?));
        }
        Ok(())
    }

    /// Run S1, S2, S4 and S5 over all samples and wrap the result
    /// in a single adapter.
    pub fn get<I, R>(&self, samples: I, rng: &mut R) -> Result<XYAdapter<T>>
    where
        I: IntoIterator<Item = SampleRef>,
        R: Rng + ?Sized,
    {
        self.check_batch_size()?;

        let mut samples = self.extended_samples(self.reduced_samples(samples))?;
        if self.shuffle {
            samples.shuffle(rng);
        }

        tracing::debug!("Pipeline produced {} samples", samples.len());
        Ok(self.adapter(samples))
    }

    /// Run S1 and S2, split into categories (S3), then extend and
    /// shuffle the "train" group only (S4, S5). Every category gets
    /// its own adapter; non-train groups keep their split order.
    pub fn split<I, R>(&self, samples: I, rng: &mut R) -> Result<BTreeMap<String, XYAdapter<T>>>
    where
        I: IntoIterator<Item = SampleRef>,
        R: Rng + ?Sized,
    {
        self.check_batch_size()?;

        let reduced    = self.reduced_samples(samples).collect::<Result<Vec<_>>>()?;
        let mut groups = split_by_category(reduced, &self.categories)?;

        if let Some(train) = groups.remove(TRAIN) {
            let mut train = self.extended_samples(train.into_iter().map(Ok))?;
            if self.shuffle {
                train.shuffle(rng);
            }
            groups.insert(TRAIN.to_string(), train);
        }

        for (category, group) in &groups {
            tracing::debug!("Split '{}': {} samples", category, group.len());
        }

        Ok(groups
            .into_iter()
            .map(|(category, group)| (category, self.adapter(group)))
            .collect())
    }

    // ── S1 + S2 ───────────────────────────────────────────────────────────────
    fn reduced_samples<'a, I>(&'a self, samples: I) -> impl Iterator<Item = Result<SampleRef>> + 'a
    where
        I: IntoIterator<Item = SampleRef>,
        I::IntoIter: 'a,
    {
        // Lazy: nothing is filtered or reduced until the caller pulls.
        // Rejected samples vanish; a failing filter surfaces as Err so
        // the caller's collect() stops at the first error.
        samples
            .into_iter()
            .filter_map(move |sample| match self.accepts(&*sample) {
                Ok(true)  => Some(self.reduce_sample(sample)),
                Ok(false) => None,
                Err(e)    => Some(Err(e)),
            })
    }

    /// OR across filters; an empty filter list accepts everything.
    fn accepts(&self, sample: &dyn Sample) -> Result<bool> {
        // Short-circuit on the first filter that says yes
        for filter in &self.filters {
            if filter(sample)? {
                return Ok(true);
            }
        }
        Ok(self.filters.is_empty())
    }

    fn reduce_sample(&self, sample: SampleRef) -> Result<SampleRef> {
        // Each reducer sees the previous one's output, in insertion order
        self.reducers
            .iter()
            .try_fold(sample, |sample, reducer| reducer.apply(sample))
    }

    // ── S4 ────────────────────────────────────────────────────────────────────
    fn extended_samples<I>(&self, samples: I) -> Result<Vec<SampleRef>>
    where
        I: IntoIterator<Item = Result<SampleRef>>,
    {
        let mut extended = Vec::new();
        for sample in samples {
            extended.extend(self.extend_sample(sample?)?);
        }
        Ok(extended)
    }

    /// Feed the output of each extender into the next one.
    fn extend_sample(&self, sample: SampleRef) -> Result<Vec<SampleRef>> {
        // Start from the sample itself; with no extenders it passes
        // through unchanged
        let mut current = vec![sample];
        for extender in &self.extenders {
            let mut next = Vec::new();
            for s in &current {
                next.extend(extender(s)?);
            }
            // Counts multiply: 2 outputs x 3 outputs = 6 samples
            current = next;
        }
        Ok(current)
    }

    fn check_batch_size(&self) -> Result<(), PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidBatchSize);
        }
        Ok(())
    }

    fn adapter(&self, samples: Vec<SampleRef>) -> XYAdapter<T> {
        XYAdapter::new(samples, Arc::clone(&self.mapper), self.batch_size)
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("filters", &self.filters.len())
            .field("reducers", &self.reducers)
            .field("categories", &self.categories)
            .field("extenders", &self.extenders.len())
            .field("batch_size", &self.batch_size)
            .field("shuffle", &self.shuffle)
            .finish_non_exhaustive()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::splitter::{TEST, VALIDATE};
    use crate::domain::sample::MapSample;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::{json, Value};

    fn sample(id: i64, value: f64) -> SampleRef {
        MapSample::default()
            .with("id", id)
            .with("value", value)
            .with("noise", "x")
            .into_ref()
    }

    fn samples(n: i64) -> Vec<SampleRef> {
        (0..n).map(|i| sample(i, i as f64 / n as f64)).collect()
    }

    fn id(s: &dyn Sample) -> i64 {
        s.get("id").and_then(Value::as_i64).unwrap_or(-1)
    }

    fn ids(samples: &[SampleRef]) -> Vec<i64> {
        samples.iter().map(|s| id(&**s)).collect()
    }

    /// Copy a sample, tagging the copy with a variant number
    fn variant(s: &SampleRef, n: usize) -> SampleRef {
        let mut copy = MapSample::default();
        for key in s.keys() {
            if let Some(v) = s.get(&key) {
                copy = copy.with(key.clone(), v.clone());
            }
        }
        copy.with("variant", n).into_ref()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_defaults() {
        let pl = Pipeline::new();
        assert_eq!(pl.batch_size, 128);
        assert!(pl.shuffle);
        assert_eq!(pl.categories, Categories::default());
    }

    #[test]
    fn test_no_filters_keeps_everything_in_order() {
        let pl      = Pipeline::new();
        let mut out = Vec::new();
        pl.append_reduced_samples(samples(5), &mut out).unwrap();
        assert_eq!(ids(&out), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_filters_are_combined_with_or() {
        let mut pl = Pipeline::new();
        pl.add_filter(|s| Ok(id(s) == 1));
        pl.add_filter(|s| Ok(id(s) == 3));

        let mut out = Vec::new();
        pl.append_reduced_samples(samples(5), &mut out).unwrap();
        assert_eq!(ids(&out), vec![1, 3]);
    }

    #[test]
    fn test_restrict_reducer_hides_other_probes() {
        let mut pl = Pipeline::new();
        pl.add_reducer(Reducer::restrict(["value", "id"]));

        let mut out = Vec::new();
        pl.append_reduced_samples(samples(2), &mut out).unwrap();
        assert_eq!(out[1].get("noise"), None);
        assert_eq!(out[1].get("value"), Some(&json!(0.5)));
        assert_eq!(out[1].keys(), vec!["value".to_string(), "id".to_string()]);
    }

    #[test]
    fn test_reducers_compose_left_to_right() {
        let mut pl = Pipeline::new();
        pl.add_reducer(Reducer::transform(|s| Ok(variant(&s, 7))));
        pl.add_reducer(Reducer::restrict(["variant"]));

        let mut out = Vec::new();
        pl.append_reduced_samples(samples(1), &mut out).unwrap();
        assert_eq!(out[0].get("variant"), Some(&json!(7)));
        assert_eq!(out[0].get("id"), None);
    }

    #[test]
    fn test_append_matches_manual_filter_and_reduce() {
        let input = samples(10);

        let mut pl = Pipeline::new();
        pl.add_filter(|s| Ok(s.get("value").and_then(Value::as_f64) > Some(0.5)));
        pl.add_reducer(Reducer::restrict(["value"]));
        pl.add_extender(|s| Ok(vec![s.clone(), s.clone()]));

        let mut out = Vec::new();
        pl.append_reduced_samples(input.clone(), &mut out).unwrap();

        let expected: Vec<Value> = input
            .iter()
            .filter(|s| s.get("value").and_then(Value::as_f64) > Some(0.5))
            .map(|s| s.get("value").cloned().unwrap())
            .collect();
        let actual: Vec<Value> = out.iter().map(|s| s.get("value").cloned().unwrap()).collect();

        // Extenders do not run here
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_append_extends_existing_sink() {
        let pl      = Pipeline::new();
        let mut out = vec![sample(99, 0.0)];
        pl.append_reduced_samples(samples(2), &mut out).unwrap();
        assert_eq!(ids(&out), vec![99, 0, 1]);
    }

    #[test]
    fn test_extenders_fan_out_multiplicatively() {
        let mut pl = Pipeline::new();
        pl.shuffle = false;
        pl.add_extender(|s| Ok((0..2).map(|n| variant(s, n)).collect()));
        pl.add_extender(|s| Ok((0..3).map(|n| variant(s, n)).collect()));

        let adapter = pl.get(samples(1), &mut rng()).unwrap();
        assert_eq!(adapter.len(), 6);
    }

    #[test]
    fn test_extender_may_drop_samples() {
        let mut pl = Pipeline::new();
        pl.shuffle = false;
        pl.add_extender(|s| Ok(if id(&**s) % 2 == 0 { vec![s.clone()] } else { Vec::new() }));

        let adapter = pl.get(samples(6), &mut rng()).unwrap();
        assert_eq!(ids(adapter.samples()), vec![0, 2, 4]);
    }

    #[test]
    fn test_get_without_shuffle_keeps_order() {
        let mut pl = Pipeline::new();
        pl.shuffle = false;
        let adapter = pl.get(samples(5), &mut rng()).unwrap();
        assert_eq!(ids(adapter.samples()), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let pl      = Pipeline::new();
        let adapter = pl.get(samples(50), &mut rng()).unwrap();

        let mut shuffled = ids(adapter.samples());
        assert_ne!(shuffled, (0..50).collect::<Vec<_>>());
        shuffled.sort_unstable();
        assert_eq!(shuffled, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_is_reproducible_with_seed() {
        let pl     = Pipeline::new();
        let first  = pl.get(samples(30), &mut rng()).unwrap();
        let second = pl.get(samples(30), &mut rng()).unwrap();
        assert_eq!(ids(first.samples()), ids(second.samples()));
    }

    #[test]
    fn test_mapper_applies_lazily_in_adapter() {
        let mut pl = Pipeline::new();
        pl.shuffle = false;
        let pl = pl.with_mapper(|s| (id(&**s), s.get("value").cloned()));

        let adapter = pl.get(samples(3), &mut rng()).unwrap();
        let pairs: Vec<_> = adapter.iter().unwrap().take(4).map(|(x, _)| x).collect();
        assert_eq!(pairs, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_batches_from_pipeline() {
        let mut pl = Pipeline::new();
        pl.shuffle    = false;
        pl.batch_size = 2;
        let pl = pl.with_mapper(|s| id(&**s));

        let adapter = pl.get(samples(3), &mut rng()).unwrap();
        let batches: Vec<_> = adapter.batch_arrays().unwrap().take(2).collect();
        assert_eq!(batches, vec![vec![0, 1], vec![2, 0]]);
    }

    #[test]
    fn test_split_partitions_reduced_samples() {
        let mut pl = Pipeline::new();
        pl.add_extender(|s| Ok(vec![variant(s, 0), variant(s, 1)]));

        let groups = pl.split(samples(100), &mut rng()).unwrap();
        assert_eq!(groups.len(), 3);

        // Only train was extended (80 × 2)
        assert_eq!(groups[TRAIN].len(), 160);
        assert_eq!(groups[VALIDATE].len(), 10);
        assert_eq!(groups[TEST].len(), 10);
        assert_eq!(groups[TRAIN].len() / 2 + groups[VALIDATE].len() + groups[TEST].len(), 100);
    }

    #[test]
    fn test_split_leaves_non_train_groups_untouched() {
        let pl     = Pipeline::new();
        let groups = pl.split(samples(100), &mut rng()).unwrap();

        assert_eq!(ids(groups[VALIDATE].samples()), (80..90).collect::<Vec<_>>());
        assert_eq!(ids(groups[TEST].samples()), (90..100).collect::<Vec<_>>());

        // Train holds the first 80, but shuffled
        let train = ids(groups[TRAIN].samples());
        assert_ne!(train, (0..80).collect::<Vec<_>>());
        let mut sorted = train;
        sorted.sort_unstable();
        assert_eq!(sorted, (0..80).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_filters_before_splitting() {
        let mut pl = Pipeline::new();
        pl.shuffle = false;
        pl.add_filter(|s| Ok(id(s) % 2 == 0));

        let groups = pl.split(samples(20), &mut rng()).unwrap();
        assert_eq!(ids(groups[TRAIN].samples()), vec![0, 2, 4, 6, 8, 10, 12, 14]);
        assert_eq!(ids(groups[VALIDATE].samples()), vec![16]);
        assert_eq!(ids(groups[TEST].samples()), vec![18]);
    }

    #[test]
    fn test_split_without_train_category() {
        let mut pl = Pipeline::new();
        pl.categories = Categories::new().with(VALIDATE, 0.5).with(TEST, 0.5);
        pl.add_extender(|s| Ok(vec![s.clone(), s.clone()]));

        let groups = pl.split(samples(4), &mut rng()).unwrap();
        assert!(!groups.contains_key(TRAIN));
        assert_eq!(groups[VALIDATE].len(), 2);
        assert_eq!(groups[TEST].len(), 2);
    }

    #[test]
    fn test_filter_error_propagates() {
        let mut pl = Pipeline::new();
        pl.add_filter(|s| {
            if id(s) == 3 {
                anyhow::bail!("probe 'value' is corrupt");
            }
            Ok(true)
        });

        let err = pl.get(samples(5), &mut rng()).unwrap_err();
        assert!(err.to_string().contains("corrupt"));
    }

    #[test]
    fn test_extender_error_propagates_from_split() {
        let mut pl = Pipeline::new();
        pl.add_extender(|_| Err(anyhow::anyhow!("augmentation failed")));

        let err = pl.split(samples(10), &mut rng()).unwrap_err();
        assert_eq!(err.to_string(), "augmentation failed");
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let mut pl = Pipeline::new();
        pl.batch_size = 0;
        let err = pl.get(samples(3), &mut rng()).unwrap_err();
        assert_eq!(err.downcast_ref::<PipelineError>(), Some(&PipelineError::InvalidBatchSize));
    }

    #[test]
    fn test_everything_filtered_gives_empty_adapter() {
        let mut pl = Pipeline::new();
        pl.add_filter(|_| Ok(false));
        let adapter = pl.get(samples(3), &mut rng()).unwrap();
        assert!(adapter.is_empty());
        assert!(adapter.iter().is_err());
    }
}
