// ============================================================
// Layer 4 — Reduced Sample View
// ============================================================
// Wraps a sample so that only a fixed set of probes stays
// visible. Used by the pipeline's "restrict" reducers to drop
// every probe the training step does not need.
//
//   delegate:  { a: 1, b: 2, c: 3 }
//   reduction: [c, a]
//   view:      get("a") → 1, get("b") → None, keys() → [c, a]
//
// The delegate is shared, not copied. Keys are reported in the
// order the reduction was given, even if the delegate lacks one.

use std::collections::HashSet;

use serde_json::Value;

use crate::domain::sample::{ProbeId, Sample, SampleRef};

#[derive(Debug)]
pub struct ReducedSample {
    delegate:      SampleRef,
    reduction:     Vec<ProbeId>,
    reduction_set: HashSet<ProbeId>,
}

impl ReducedSample {
    pub fn new(delegate: SampleRef, reduction: Vec<ProbeId>) -> Self {
        let reduction_set = reduction.iter().cloned().collect();
        Self { delegate, reduction, reduction_set }
    }
}

impl Sample for ReducedSample {
    fn get(&self, probe_id: &str) -> Option<&Value> {
        if self.reduction_set.contains(probe_id) {
            self.delegate.get(probe_id)
        } else {
            None
        }
    }

    fn keys(&self) -> Vec<ProbeId> {
        self.reduction.clone()
    }
}
