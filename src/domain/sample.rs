// ============================================================
// Layer 3 — Sample Domain Type
// ============================================================
// A sample is one labelled data point: a set of sensor
// "probes" mapped to their recorded values.
//
//   { "temperature": 21.5, "humidity": 0.4, "label": "dry" }
//     └─ probe id ─┘ └value┘
//
// The pipeline never mutates a sample in place. Reducers and
// extenders produce new samples (or views over old ones), so
// samples are shared behind an Arc and passed around as
// SampleRef.
//
// Reference: Rust Book §10 (Traits), §15 (Smart Pointers)

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key type used to look up a value within a sample.
pub type ProbeId = String;

/// A shared, immutable sample.
pub type SampleRef = Arc<dyn Sample>;

/// Key-value lookup by probe identifier.
///
/// Implementations:
///   - MapSample     → a JSON object loaded from disk
///   - ReducedSample → a view restricted to a fixed set of probes
pub trait Sample: fmt::Debug + Send + Sync {
    /// Look up the value recorded for `probe_id`.
    /// Returns None if the probe is absent (never an error).
    fn get(&self, probe_id: &str) -> Option<&Value>;

    /// All probe identifiers visible through this sample.
    fn keys(&self) -> Vec<ProbeId>;

    /// True if `probe_id` resolves to a non-null value.
    fn has(&self, probe_id: &str) -> bool {
        matches!(self.get(probe_id), Some(v) if !v.is_null())
    }
}

/// A sample backed by a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapSample {
    probes: Map<String, Value>,
}

impl MapSample {
    pub fn new(probes: Map<String, Value>) -> Self {
        Self { probes }
    }

    /// Builder-style insert, handy for tests and extenders.
    pub fn with(mut self, probe_id: impl Into<ProbeId>, value: impl Into<Value>) -> Self {
        self.probes.insert(probe_id.into(), value.into());
        self
    }

    /// Wrap into a shared SampleRef.
    pub fn into_ref(self) -> SampleRef {
        Arc::new(self)
    }
}

impl Sample for MapSample {
    fn get(&self, probe_id: &str) -> Option<&Value> {
        self.probes.get(probe_id)
    }

    fn keys(&self) -> Vec<ProbeId> {
        self.probes.keys().cloned().collect()
    }
}

impl From<Map<String, Value>> for MapSample {
    fn from(probes: Map<String, Value>) -> Self {
        Self::new(probes)
    }
}
