//! Content-hash ledger used to skip files that were already uploaded.
//!
//! The ledger has two halves:
//! - [`Ledger`], the in-memory set of hex-encoded SHA-256 digests consulted
//!   (and grown) while resolving input paths.
//! - [`LedgerStore`], the append-only file that receives the raw digest bytes
//!   of confirmed uploads during reporting.
//!
//! The store is a flat concatenation of [`DIGEST_LEN`]-byte digests with no
//! header or delimiters. Digests are SHA-256, so a store written with 16-byte
//! MD5 digests does not load as the same set of hashes.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};

/// Width in bytes of one digest in the ledger store.
pub const DIGEST_LEN: usize = 32;

/// In-memory set of known content hashes.
#[derive(Debug, Clone)]
pub struct Ledger {
    hashes: HashSet<String>,
    reserve_on_sight: bool,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            hashes: HashSet::new(),
            reserve_on_sight: true,
        }
    }

    pub fn from_hashes<I, S>(hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hashes: hashes.into_iter().map(Into::into).collect(),
            reserve_on_sight: true,
        }
    }

    /// Loads the ledger store at `path`. A missing store is an empty ledger.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No ledger store yet, starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(PipelineError::LedgerLoad {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let digests = bytes.chunks_exact(DIGEST_LEN);
        let trailing = digests.remainder().len();
        if trailing > 0 {
            warn!(
                path = %path.display(),
                trailing_bytes = trailing,
                "Ledger store ends with a partial digest, ignoring it"
            );
        }
        let ledger = Self::from_hashes(digests.map(hex::encode));
        info!(path = %path.display(), hashes = ledger.len(), "Loaded ledger");
        Ok(ledger)
    }

    /// When disabled, [`Ledger::need_upload`] no longer records new hashes, so
    /// identical files within one run are all uploaded.
    pub fn reserve_on_sight(mut self, enabled: bool) -> Self {
        self.reserve_on_sight = enabled;
        self
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Decides whether the file at `path` needs uploading and returns its hash.
    ///
    /// - Unreadable file: `(false, "")`. The file is skipped, not reported as an error.
    /// - Hash already known: `(false, hash)`.
    /// - Otherwise the hash is recorded immediately and `(true, hash)` is returned,
    ///   so a later file with the same content in this run is skipped.
    pub fn need_upload(&mut self, path: &Path) -> (bool, String) {
        let hash = match hash_file(path) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not hash file, skipping it");
                return (false, String::new());
            }
        };
        if self.hashes.contains(&hash) {
            debug!(path = %path.display(), hash = %hash, "Already uploaded, skipping");
            return (false, hash);
        }
        if self.reserve_on_sight {
            self.hashes.insert(hash.clone());
        }
        debug!(path = %path.display(), hash = %hash, "Needs upload");
        (true, hash)
    }
}

/// Hex-encoded SHA-256 of the full contents of `path`.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Append handle on the ledger store, open for a whole reporting pass.
#[derive(Debug)]
pub struct LedgerStore {
    path: PathBuf,
    file: Option<File>,
}

impl LedgerStore {
    /// Opens `path` in append-create mode. If that fails the store stays usable
    /// but drops every append.
    ///
    /// A partial digest left at the end of the store by an interrupted write is
    /// cut off first, so new digests stay aligned to [`DIGEST_LEN`].
    pub fn open(path: &Path) -> Self {
        let file = match OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .and_then(|file| align(file, path))
        {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not open ledger store, uploaded hashes will not be persisted"
                );
                None
            }
        };
        Self {
            path: path.to_path_buf(),
            file,
        }
    }

    pub fn is_persisting(&self) -> bool {
        self.file.is_some()
    }

    /// Appends the raw bytes of a hex-encoded digest. Returns whether anything was written.
    pub fn append_hex(&mut self, hash: &str) -> bool {
        let Some(file) = self.file.as_mut() else {
            return false;
        };
        let digest = match hex::decode(hash) {
            Ok(digest) => digest,
            Err(e) => {
                warn!(hash = %hash, error = %e, "Malformed hash, not persisting it");
                return false;
            }
        };
        match file.write_all(&digest) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not append to ledger store");
                false
            }
        }
    }
}

fn align(file: File, path: &Path) -> io::Result<File> {
    let len = file.metadata()?.len();
    let trailing = len % DIGEST_LEN as u64;
    if trailing > 0 {
        warn!(
            path = %path.display(),
            trailing_bytes = trailing,
            "Truncating partial digest at the end of the ledger store"
        );
        file.set_len(len - trailing)?;
    }
    Ok(file)
}
