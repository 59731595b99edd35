// ============================================================
// Layer 4 — Sample Loader
// ============================================================
// Reads samples from a JSON file on disk. Two layouts work:
//
//   JSON array              JSON Lines
//   [                       {"temp": 21.5, "label": 1}
//     {"temp": 21.5, ...},  {"temp": 19.0, "label": 0}
//     {"temp": 19.0, ...}
//   ]
//
// Every record must be a JSON object; its fields become the
// sample's probes. Blank lines in JSON Lines files are skipped.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::{fs, path::PathBuf};

use crate::domain::sample::{MapSample, SampleRef};
use crate::domain::traits::SampleSource;

/// Loads samples from a JSON array or JSON Lines file.
pub struct JsonSampleLoader {
    path: PathBuf,
}

impl JsonSampleLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SampleSource for JsonSampleLoader {
    fn load_all(&self) -> Result<Vec<SampleRef>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read samples from '{}'", self.path.display()))?;

        let records = parse_records(&text)
            .with_context(|| format!("Cannot parse samples in '{}'", self.path.display()))?;

        let samples = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| into_sample(i, record))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!("Loaded {} samples from '{}'", samples.len(), self.path.display());
        Ok(samples)
    }
}

fn parse_records(text: &str) -> Result<Vec<Value>> {
    if text.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(text)?);
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {}", i + 1))
        })
        .collect()
}

fn into_sample(index: usize, record: Value) -> Result<SampleRef> {
    match record {
        Value::Object(probes) => Ok(MapSample::new(probes).into_ref()),
        other => bail!("Record {} is not a JSON object: {}", index, other),
    }
}
