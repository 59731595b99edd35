// ============================================================
// Layer 2 — TransferUseCase
// ============================================================
// Moves whole files between the local disk and the blob store.
//
//   download: blobref → bytes → file on disk
//   upload:   file on disk → bytes → fileref
//
// The uploaded file keeps its base name on the server.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::traits::BlobStore;

pub struct TransferUseCase<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> TransferUseCase<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fetch `blobref` and write it to `path`. Returns the byte count.
    pub fn download_to_file(&self, blobref: &str, path: &Path) -> Result<usize> {
        let bytes = self
            .store
            .download(blobref)
            .with_context(|| format!("Cannot download '{}'", blobref))?;

        fs::write(path, &bytes)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::info!("Saved {} ({} bytes) to '{}'", blobref, bytes.len(), path.display());
        Ok(bytes.len())
    }

    /// Upload the file at `path` and return its fileref.
    pub fn upload_file(&self, path: &Path) -> Result<String> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("'{}' has no usable file name", path.display()))?;

        let blob = fs::read(path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;

        self.store
            .upload(blob, file_name)
            .with_context(|| format!("Cannot upload '{}'", path.display()))
    }
}
