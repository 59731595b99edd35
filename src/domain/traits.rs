// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits, never to the
// concrete loader or HTTP client. Tests swap in in-memory
// implementations.
//
//   - JsonSampleLoader implements SampleSource
//   - PerkeepClient    implements BlobStore
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use serde_json::Value;

use crate::domain::sample::SampleRef;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can produce a finite set of samples.
pub trait SampleSource {
    /// Load all available samples from this source.
    fn load_all(&self) -> Result<Vec<SampleRef>>;
}

// ─── BlobStore ────────────────────────────────────────────────────────────────
/// A content-addressable store reachable over its query / download /
/// upload API.
pub trait BlobStore {
    /// Run a search query and return the raw JSON response.
    fn query(&self, opts: &Value) -> Result<Value>;

    /// Fetch the contents of the file behind `blobref`.
    fn download(&self, blobref: &str) -> Result<Vec<u8>>;

    /// Store `blob` as a file named `file_name`; returns its fileref.
    fn upload(&self, blob: Vec<u8>, file_name: &str) -> Result<String>;
}
