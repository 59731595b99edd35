// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the four subcommands and their flags:
//
//   query     search the blob store, print titles or raw JSON
//   download  save a blob's file contents to disk
//   upload    store a local file, print its fileref
//   prepare   split a samples file and report the result
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::prepare_use_case::PrepareConfig;
use crate::data::pipeline::DEFAULT_BATCH_SIZE;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the default Perkeep server
    Query(QueryArgs),

    /// Download a blob's contents to a file
    Download(DownloadArgs),

    /// Upload a file and print its fileref
    Upload(UploadArgs),

    /// Split a samples file into train/validate/test and report
    Prepare(PrepareArgs),
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Search expression, e.g. "tag:solln"
    #[arg(long)]
    pub expression: String,

    /// How deep the server should describe results
    #[arg(long, default_value_t = 1)]
    pub depth: u32,

    /// Print the full JSON response instead of titles
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Blobref of the file, e.g. sha224-...
    #[arg(long)]
    pub blobref: String,

    /// Where to write the contents
    #[arg(long)]
    pub output: String,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file to upload
    #[arg(long)]
    pub file: String,
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// JSON array or JSON Lines file of samples
    #[arg(long)]
    pub samples: String,

    /// Keep samples that carry any of these probes (repeatable)
    #[arg(long)]
    pub require: Vec<String>,

    /// Restrict samples to these probes (repeatable)
    #[arg(long)]
    pub keep: Vec<String>,

    /// Probe used as the training input
    #[arg(long, default_value = "in")]
    pub input: String,

    /// Probe used as the training target
    #[arg(long, default_value = "out")]
    pub target: String,

    #[arg(long, default_value_t = 0.8)]
    pub train: f64,

    #[arg(long, default_value_t = 0.1)]
    pub validate: f64,

    #[arg(long, default_value_t = 0.1)]
    pub test: f64,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Keep the training samples in file order
    #[arg(long)]
    pub no_shuffle: bool,

    /// Seed for a reproducible shuffle
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also write the report as JSON to this path
    #[arg(long)]
    pub report: Option<String>,
}

/// The application layer never sees clap types.
impl From<&PrepareArgs> for PrepareConfig {
    fn from(a: &PrepareArgs) -> Self {
        PrepareConfig {
            samples_path: a.samples.clone(),
            require:      a.require.clone(),
            keep:         a.keep.clone(),
            input_probe:  a.input.clone(),
            target_probe: a.target.clone(),
            train:        a.train,
            validate:     a.validate,
            test:         a.test,
            batch_size:   a.batch_size,
            shuffle:      !a.no_shuffle,
            seed:         a.seed,
        }
    }
}
