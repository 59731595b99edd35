// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from a samples file on disk
// to the cyclic, batched views the training loop pulls from.
//
// The pipeline flows in this order:
//
//   samples.json / .jsonl
//       │
//       ▼
//   JsonSampleLoader  → reads records into MapSamples
//       │
//       ▼
//   Pipeline          → filter, reduce (ReducedSample), split,
//       │               extend, shuffle
//       ▼
//   split_by_category → train / validate / test groups
//       │
//       ▼
//   XYAdapter         → endless mapped samples and batches
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Loads samples from JSON or JSON Lines files
pub mod loader;

/// Read-only view restricting a sample to a set of probes
pub mod reduced;

/// Deterministic split into named categories
pub mod splitter;

/// Filter → reduce → split → extend → shuffle
pub mod pipeline;

/// Lazy, cyclic, batching view handed to training
pub mod adapter;

/// Typed pipeline failures
pub mod error;
