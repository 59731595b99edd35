// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing what the system
// works with: labelled samples and the blob store they are
// queried from.
//
// Rules for this layer:
//   - NO HTTP client types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A labelled data point, looked up by probe identifier
pub mod sample;

// Core abstractions (traits) that other layers implement
pub mod traits;
