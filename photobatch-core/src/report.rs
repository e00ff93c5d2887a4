//! Reports per-item outcomes and persists the hashes of successful uploads.

use std::io::{self, Write};

use tracing::{debug, info, warn};

use crate::contract::AddResult;
use crate::item::UploadItem;
use crate::ledger::LedgerStore;
use crate::resolve::ResolvedBatch;

/// Counts for one reporting pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Hashes appended to the ledger store.
    pub persisted: usize,
}

/// Writes the `#<n>: <item>` listing shown before anything is sent.
pub fn write_preflight<W: Write>(out: &mut W, items: &[UploadItem]) -> io::Result<()> {
    for (i, item) in items.iter().enumerate() {
        writeln!(out, "#{}: {}", i + 1, item)?;
    }
    Ok(())
}

/// Writes one line per result and appends the hash of every successful local upload to `store`.
///
/// `results` must be aligned with `batch`; [`crate::dispatch::dispatch`] guarantees this.
pub fn report<W: Write>(
    out: &mut W,
    batch: &ResolvedBatch,
    results: &[AddResult],
    store: &mut LedgerStore,
) -> io::Result<UploadReport> {
    let mut summary = UploadReport::default();
    for (i, ((item, hash), result)) in batch.iter().zip(results).enumerate() {
        match &result.error {
            Some(e) => {
                writeln!(out, "#{}: {}: {}", i + 1, item, e)?;
                debug!(item = %item, error = %e, "Item failed");
                summary.failed += 1;
            }
            None => {
                writeln!(out, "#{}: {}: OK", i + 1, item)?;
                summary.succeeded += 1;
                if !hash.is_empty() && store.append_hex(hash) {
                    summary.persisted += 1;
                }
            }
        }
    }

    if summary.succeeded > 0 && !store.is_persisting() {
        warn!(
            succeeded = summary.succeeded,
            "Ledger store unavailable, successful uploads were not recorded"
        );
    }
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        persisted = summary.persisted,
        "Upload finished"
    );
    Ok(summary)
}
