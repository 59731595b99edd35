// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to its
// use case in Layer 2. Printing happens here and nowhere else.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, DownloadArgs, PrepareArgs, QueryArgs, UploadArgs};
use std::path::Path;

use crate::infra::client::PerkeepClient;

#[derive(Parser, Debug)]
#[command(
    name = "perkeep-samples",
    version,
    about = "Query, download and upload Perkeep blobs; prepare training samples."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. Only routes, never computes.
    pub fn run(self) -> Result<()> {
        match &self.command {
            Commands::Query(args)    => self.run_query(args),
            Commands::Download(args) => self.run_download(args),
            Commands::Upload(args)   => self.run_upload(args),
            Commands::Prepare(args)  => self.run_prepare(args),
        }
    }

    fn run_query(&self, args: &QueryArgs) -> Result<()> {
        use crate::application::query_use_case::QueryUseCase;

        let use_case = QueryUseCase::new(connect()?);

        if args.raw {
            let body   = crate::application::query_use_case::build_query(&args.expression, args.depth);
            let result = use_case.run(&body)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        for titled in use_case.titles(&args.expression, args.depth)? {
            println!("{}\t{}", titled.blob, titled.title);
        }
        Ok(())
    }

    fn run_download(&self, args: &DownloadArgs) -> Result<()> {
        use crate::application::transfer_use_case::TransferUseCase;

        let use_case = TransferUseCase::new(connect()?);
        let written  = use_case.download_to_file(&args.blobref, Path::new(&args.output))?;
        println!("{} bytes written to {}", written, args.output);
        Ok(())
    }

    fn run_upload(&self, args: &UploadArgs) -> Result<()> {
        use crate::application::transfer_use_case::TransferUseCase;

        let use_case = TransferUseCase::new(connect()?);
        let fileref  = use_case.upload_file(Path::new(&args.file))?;
        println!("file_ref: {}", fileref);
        Ok(())
    }

    fn run_prepare(&self, args: &PrepareArgs) -> Result<()> {
        use crate::application::prepare_use_case::PrepareUseCase;

        tracing::info!("Preparing samples from: {}", args.samples);

        let report = PrepareUseCase::new(args.into()).execute()?;
        let json   = serde_json::to_string_pretty(&report)?;

        if let Some(path) = &args.report {
            std::fs::write(path, &json)
                .with_context(|| format!("Cannot write report to '{}'", path))?;
        }

        println!("{}", json);
        Ok(())
    }
}

/// Client for the default server in the local client config.
fn connect() -> Result<PerkeepClient> {
    PerkeepClient::from_default_config().context("Cannot set up the Perkeep client")
}
