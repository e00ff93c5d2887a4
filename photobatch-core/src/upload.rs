//! High-level pipeline: resolve → dispatch → report.
//!
//! This module provides the top-level orchestration for one upload run:
//!   - Resolves the configured paths and URLs into a batch, deduplicating local
//!     files against the [`Ledger`]
//!   - Lists the batch on the error stream before any remote call
//!   - Dispatches the batch to the remote [`PhotoService`] (library, existing
//!     album or new album)
//!   - Reports one line per item on the output stream and appends the hashes of
//!     successful uploads to the ledger store
//!
//! # Responsibilities
//! - Fail-fast: configuration, discovery and batch-level remote errors abort the
//!   run before any per-item line is printed
//! - Per-item failures never abort the run
//! - Every remote operation runs at most once; nothing is retried
//!
//! # Ordering
//! The remote client is only constructed after resolution succeeded and the
//! pre-flight listing was written, so input problems surface without
//! credentials.

use std::io::Write;

use tracing::{error, info};

use crate::config::UploadConfig;
use crate::contract::{PhotoService, ServiceError};
use crate::dispatch::dispatch;
use crate::error::{PipelineError, Result};
use crate::ledger::{Ledger, LedgerStore};
use crate::report::{report, write_preflight, UploadReport};
use crate::resolve::{resolve, RequestOptions};

/// Runs one upload.
///
/// `ledger` is consumed by resolution. `connect` builds the remote service and
/// is only called once there is something to upload. Report lines go to `out`,
/// the pre-flight listing to `err`.
pub async fn upload<S, C, O, E>(
    config: &UploadConfig,
    mut ledger: Ledger,
    client: &reqwest::Client,
    connect: C,
    out: &mut O,
    err: &mut E,
) -> Result<UploadReport>
where
    S: PhotoService,
    C: FnOnce() -> std::result::Result<S, ServiceError>,
    O: Write,
    E: Write,
{
    if config.paths.is_empty() {
        return Err(PipelineError::NoInputs);
    }
    config.trace_loaded();

    let options = RequestOptions::parse(config.request_auth.as_deref(), &config.request_headers)?;
    let batch = resolve(&config.paths, &mut ledger, client, &options)?;
    drop(ledger);

    info!("The following {} items will be uploaded:", batch.len());
    write_preflight(err, batch.items())?;

    let service = connect().map_err(|e| {
        error!(error = %e, "Could not construct photo service client");
        PipelineError::Connect(e)
    })?;
    let results = dispatch(&service, &config.target(), batch.items()).await?;

    let mut store = LedgerStore::open(&config.ledger_path);
    let summary = report(out, &batch, &results, &mut store)?;
    Ok(summary)
}
