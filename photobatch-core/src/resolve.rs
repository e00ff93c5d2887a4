//! Resolves input paths and URLs into an ordered upload batch.
//!
//! URLs become one HTTP item each and bypass dedup. Filesystem inputs are
//! walked recursively; every regular file is probed against the [`Ledger`]
//! and only files that need uploading become items.

use std::path::Path;

use reqwest::Url;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{PipelineError, Result};
use crate::item::{parse_header, BasicAuth, HttpRequest, HttpUploadItem, UploadItem};
use crate::ledger::Ledger;

/// Request settings applied to every URL input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub basic_auth: Option<BasicAuth>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// Builds options from a `user:pass` credential and `Key: Value` header strings.
    pub fn parse(basic_auth: Option<&str>, headers: &[String]) -> Result<Self> {
        let headers = headers
            .iter()
            .map(|h| parse_header(h))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            basic_auth: basic_auth.filter(|s| !s.is_empty()).map(BasicAuth::parse),
            headers,
        })
    }
}

/// Upload items with their content hashes, kept positionally aligned.
///
/// The hash of an HTTP item is the empty string.
#[derive(Debug, Default)]
pub struct ResolvedBatch {
    items: Vec<UploadItem>,
    hashes: Vec<String>,
}

impl ResolvedBatch {
    pub fn push(&mut self, item: UploadItem, hash: String) {
        self.items.push(item);
        self.hashes.push(hash);
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    pub fn hashes(&self) -> &[String] {
        &self.hashes
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UploadItem, &str)> {
        self.items.iter().zip(self.hashes.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Whether an input is treated as a URL rather than a filesystem path.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolves `inputs` in order.
///
/// Fails on the first walk error or malformed URL, discarding everything
/// resolved so far. Fails with [`PipelineError::NothingToUpload`] when no input
/// produced an item.
pub fn resolve(
    inputs: &[String],
    ledger: &mut Ledger,
    client: &reqwest::Client,
    options: &RequestOptions,
) -> Result<ResolvedBatch> {
    let mut batch = ResolvedBatch::default();
    for input in inputs {
        if is_url(input) {
            let url = Url::parse(input).map_err(|e| PipelineError::InvalidUrl {
                url: input.clone(),
                reason: e.to_string(),
            })?;
            debug!(url = %url, "Resolved URL input");
            batch.push(
                UploadItem::Http(HttpUploadItem {
                    client: client.clone(),
                    request: HttpRequest {
                        url,
                        basic_auth: options.basic_auth.clone(),
                        headers: options.headers.clone(),
                    },
                }),
                String::new(),
            );
        } else {
            walk_root(input, ledger, &mut batch)?;
        }
    }

    if batch.is_empty() {
        return Err(PipelineError::NothingToUpload {
            roots: inputs.to_vec(),
        });
    }
    info!(items = batch.len(), inputs = inputs.len(), "Resolved upload batch");
    Ok(batch)
}

fn walk_root(root: &str, ledger: &mut Ledger, batch: &mut ResolvedBatch) -> Result<()> {
    let before = batch.len();
    for entry in WalkDir::new(Path::new(root)).sort_by_file_name() {
        let entry = entry.map_err(|source| PipelineError::Walk {
            root: root.to_string(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let (needs_upload, hash) = ledger.need_upload(entry.path());
        if needs_upload {
            batch.push(UploadItem::file(entry.path()), hash);
        }
    }
    debug!(root = %root, items = batch.len() - before, "Walked input root");
    Ok(())
}
