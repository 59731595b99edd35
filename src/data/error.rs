// ============================================================
// Layer 4 — Pipeline Errors
// ============================================================
// Typed failures raised by the pipeline itself. Errors from
// caller-supplied filters, reducers and extenders are NOT
// wrapped here: they travel through anyhow unchanged.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    /// Iterating an adapter with zero samples would never yield.
    #[error("adapter holds no samples; iteration would never produce a value")]
    EmptyAdapter,

    #[error("batch size must be positive")]
    InvalidBatchSize,

    #[error("fraction for category '{category}' must be within [0, 1], got {fraction}")]
    InvalidFraction { category: String, fraction: f64 },

    #[error("category fractions sum to zero; nothing to split by")]
    NoFractions,
}
