///
/// This module implements the CLI interface for photobatch: command parsing,
/// merging flags with the optional config file, and invoking the core upload
/// pipeline.
///
/// All pipeline logic (resolution, dedup, dispatch, reporting) lives in the
/// [`photobatch-core`] crate. This module is strictly CLI glue.
///
/// ## How To Use
/// - For command-line users: run the installed `photobatch` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`photobatch-core`]: ../../photobatch-core/
use crate::load_config::{load_config, FileConfig};
use crate::photos::GooglePhotosClient;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use photobatch_core::config::{UploadConfig, DEFAULT_LEDGER_PATH};
use photobatch_core::ledger::Ledger;
use photobatch_core::upload::upload;
use std::future::Future;
use std::io;
use std::path::PathBuf;

/// CLI for photobatch: upload photos and remote URLs, skipping content uploaded before.
#[derive(Parser, Debug)]
#[clap(
    name = "photobatch",
    version,
    about = "Upload local photos and remote URLs to a photo library, skipping already uploaded content"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload files, directories and URLs
    Upload(UploadArgs),
}

#[derive(Args, Debug, Default)]
pub struct UploadArgs {
    /// Files, directories (walked recursively) and http(s) URLs
    pub paths: Vec<String>,

    /// Add the items to the existing album with this title
    #[clap(short = 'a', long = "album", conflicts_with = "new_album")]
    pub album: Option<String>,

    /// Create an album with this title and add the items to it
    #[clap(short = 'n', long = "new-album")]
    pub new_album: Option<String>,

    /// Basic auth credential for URL inputs, as user:pass
    #[clap(long = "request-auth")]
    pub request_auth: Option<String>,

    /// Extra header for URL inputs, as "Key: Value" (repeatable)
    #[clap(long = "request-header")]
    pub request_headers: Vec<String>,

    /// Ledger file recording the hashes of uploaded files
    #[clap(long)]
    pub ledger: Option<PathBuf>,

    /// Path to an optional YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// Merges flags over the config file. Headers from both are kept, file first.
pub fn upload_config(args: UploadArgs, file: &FileConfig) -> UploadConfig {
    let mut request_headers = file.request_headers.clone();
    request_headers.extend(args.request_headers);
    UploadConfig {
        paths: args.paths,
        album_title: args.album,
        new_album_title: args.new_album,
        request_auth: args.request_auth.or_else(|| file.request_auth.clone()),
        request_headers,
        ledger_path: args
            .ledger
            .or_else(|| file.ledger_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH)),
    }
}

/// Runs `task` to completion unless `interrupt` resolves with `Ok` first.
/// An interrupt that fails, for example when no signal handler can be
/// installed, never cancels the task.
async fn unless_interrupted<F, I>(task: F, interrupt: I) -> Option<F::Output>
where
    F: Future,
    I: Future<Output = io::Result<()>>,
{
    tokio::select! {
        output = task => Some(output),
        Ok(()) = interrupt => None,
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Upload(args) => {
            let file = match &args.config {
                Some(path) => load_config(path)?,
                None => FileConfig::default(),
            };
            let api_base_url = file.api_base_url.clone();
            let config = upload_config(args, &file);
            tracing::info!(command = "upload", "Starting upload");

            // Without inputs the pipeline fails before it needs the ledger.
            let ledger = if config.paths.is_empty() {
                Ledger::new()
            } else {
                Ledger::load(&config.ledger_path)?
            };
            let client = reqwest::Client::new();
            let mut stdout = std::io::stdout().lock();
            let mut stderr = std::io::stderr();

            let pipeline = upload(
                &config,
                ledger,
                &client,
                || GooglePhotosClient::new_from_env(api_base_url),
                &mut stdout,
                &mut stderr,
            );
            let Some(result) = unless_interrupted(pipeline, tokio::signal::ctrl_c()).await else {
                tracing::warn!(command = "upload", "Interrupted");
                anyhow::bail!("Interrupted");
            };

            match result {
                Ok(report) => {
                    tracing::info!(command = "upload", ?report, "Upload complete");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "upload", error = %e, kind = ?e.kind(), "Upload failed");
                    Err(e.into())
                }
            }
        }
    }
}
