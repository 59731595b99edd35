// ============================================================
// Layer 5 — Infrastructure Layer
// ============================================================
// Everything that talks to the world outside the process:
//
//   config.rs — Client configuration discovery
//               Locates client-config.json (honouring
//               CAMLI_CONFIG_DIR), picks the default server
//               and parses its "userpass" credentials.
//
//   client.rs — Perkeep HTTP client
//               Blocking reqwest client for search queries,
//               blob downloads and multipart uploads, with
//               basic auth on every request.
//
// The application layer only sees the BlobStore trait from
// Layer 3; PerkeepClient is the production implementation.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)

/// client-config.json discovery and parsing
pub mod config;

/// Query / download / upload over the Perkeep HTTP API
pub mod client;
