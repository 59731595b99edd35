// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each:
// searching the blob store, moving files in and out of it,
// and preparing training samples.
//
// Rules for this layer:
//   - No HTTP details here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - Only workflow coordination, against Layer 3 traits
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Search queries and permanode titles
pub mod query_use_case;

// Download / upload of whole files
pub mod transfer_use_case;

// Sample loading, pipeline split and reporting
pub mod prepare_use_case;
