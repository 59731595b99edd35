// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Runs a samples file through the pipeline and reports what a
// training run would receive:
//
//   Step 1: Load samples              (Layer 4 - data)
//   Step 2: Build the pipeline        (filters, reducer, mapper)
//   Step 3: Split + extend + shuffle  (Layer 4 - data)
//   Step 4: Pull one pass and one batch per group (XYAdapter)
//   Step 5: Summarise                 (PrepareReport)
//
// The mapper turns each sample into (input, target), read from
// the configured probes. Samples where either side is missing
// are counted as incomplete.

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::{
    loader::JsonSampleLoader,
    pipeline::{Pipeline, Reducer, DEFAULT_BATCH_SIZE},
    splitter::{Categories, TEST, TRAIN, VALIDATE},
};
use crate::domain::{
    sample::{Sample, SampleRef},
    traits::SampleSource,
};

/// What the mapper yields: (input, target).
pub type XYPair = (Option<Value>, Option<Value>);

// ─── Prepare Configuration ───────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareConfig {
    pub samples_path: String,
    /// Keep samples carrying ANY of these probes (empty → keep all)
    pub require:      Vec<String>,
    /// Restrict samples to these probes (empty → no restriction)
    pub keep:         Vec<String>,
    pub input_probe:  String,
    pub target_probe: String,
    pub train:        f64,
    pub validate:     f64,
    pub test:         f64,
    pub batch_size:   usize,
    pub shuffle:      bool,
    /// Fixed seed for a reproducible shuffle
    pub seed:         Option<u64>,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            samples_path: "samples.jsonl".to_string(),
            require:      Vec::new(),
            keep:         Vec::new(),
            input_probe:  "in".to_string(),
            target_probe: "out".to_string(),
            train:        0.8,
            validate:     0.1,
            test:         0.1,
            batch_size:   DEFAULT_BATCH_SIZE,
            shuffle:      true,
            seed:         None,
        }
    }
}

// ─── Report ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category:          String,
    pub samples:           usize,
    pub batches_per_epoch: usize,
    /// Size of the first batch a trainer would receive (0 for an
    /// empty group). Small groups wrap around to fill it.
    pub first_batch:       usize,
    /// Samples whose input or target probe is absent
    pub incomplete:        usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareReport {
    pub loaded:     usize,
    pub categories: Vec<CategoryReport>,
}

// ─── PrepareUseCase ───────────────────────────────────────────────────────────
pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    /// Load the configured samples file and run it through the pipeline.
    pub fn execute(&self) -> Result<PrepareReport> {
        let loader  = JsonSampleLoader::new(&self.config.samples_path);
        let samples = loader.load_all()?;
        self.run(samples)
    }

    /// Run already-loaded samples through the pipeline.
    pub fn run(&self, samples: Vec<SampleRef>) -> Result<PrepareReport> {
        let cfg    = &self.config;
        let loaded = samples.len();

        let pipeline = self.build_pipeline();
        let mut rng  = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };

        let groups = pipeline.split(samples, &mut rng)?;

        let mut categories = Vec::with_capacity(groups.len());
        for (category, adapter) in &groups {
            // An empty group has nothing to pull
            let (incomplete, first_batch) = if adapter.is_empty() {
                (0, 0)
            } else {
                // One full pass for the completeness count
                let incomplete = adapter
                    .iter()?
                    .take(adapter.len())
                    .filter(|(x, y)| x.is_none() || y.is_none())
                    .count();
                let first_batch = adapter.batch_arrays()?.next().map_or(0, |b| b.len());
                (incomplete, first_batch)
            };

            tracing::info!(
                "{}: {} samples, first batch {}, {} incomplete",
                category,
                adapter.len(),
                first_batch,
                incomplete
            );

            categories.push(CategoryReport {
                category:          category.clone(),
                samples:           adapter.len(),
                batches_per_epoch: adapter.len().div_ceil(adapter.batch_size()),
                first_batch,
                incomplete,
            });
        }

        Ok(PrepareReport { loaded, categories })
    }

    fn build_pipeline(&self) -> Pipeline<XYPair> {
        let cfg          = &self.config;
        let mut pipeline = Pipeline::new();

        for probe in &cfg.require {
            let probe = probe.clone();
            pipeline.add_filter(move |s| Ok(s.has(&probe)));
        }

        if !cfg.keep.is_empty() {
            pipeline.add_reducer(Reducer::restrict(cfg.keep.clone()));
        }

        pipeline.categories = Categories::new()
            .with(TRAIN, cfg.train)
            .with(VALIDATE, cfg.validate)
            .with(TEST, cfg.test);
        pipeline.batch_size = cfg.batch_size;
        pipeline.shuffle    = cfg.shuffle;

        let input  = cfg.input_probe.clone();
        let target = cfg.target_probe.clone();
        pipeline.with_mapper(move |s| (s.get(&input).cloned(), s.get(&target).cloned()))
    }
}
