use std::path::PathBuf;
use tracing::{debug, info};

use crate::dispatch::Target;

/// Ledger store used when none is configured.
pub const DEFAULT_LEDGER_PATH: &str = ".photobatch-ledger";

/// Settings for one upload run.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Filesystem paths and `http(s)://` URLs, in order.
    pub paths: Vec<String>,
    /// Title of an existing album to add to.
    pub album_title: Option<String>,
    /// Title of an album to create and add to.
    pub new_album_title: Option<String>,
    /// `user:pass` credential for URL inputs.
    pub request_auth: Option<String>,
    /// `Key: Value` headers for URL inputs.
    pub request_headers: Vec<String>,
    pub ledger_path: PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            album_title: None,
            new_album_title: None,
            request_auth: None,
            request_headers: Vec::new(),
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
        }
    }
}

impl UploadConfig {
    pub fn target(&self) -> Target {
        Target::select(self.album_title.as_deref(), self.new_album_title.as_deref())
    }

    pub fn trace_loaded(&self) {
        info!(
            inputs = self.paths.len(),
            target = ?self.target(),
            ledger_path = %self.ledger_path.display(),
            request_headers = self.request_headers.len(),
            request_auth = self.request_auth.is_some(),
            "Loaded upload config"
        );
        debug!(paths = ?self.paths, "Upload inputs");
    }
}
