//! Perkeep HTTP client plus a sample preparation pipeline for
//! machine-learning training.
//!
//! Layers, outermost first:
//!   1. `cli`         — argument parsing and printing
//!   2. `application` — use cases (query, transfer, prepare)
//!   3. `domain`      — samples and the traits other layers implement
//!   4. `data`        — loader, pipeline, splitter, adapter
//!   5. `infra`       — client config and the HTTP client

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;

pub use data::{
    adapter::{Mapper, XYAdapter},
    error::PipelineError,
    pipeline::{Pipeline, Reducer},
    reduced::ReducedSample,
    splitter::Categories,
};
pub use domain::sample::{MapSample, ProbeId, Sample, SampleRef};
pub use infra::client::PerkeepClient;
