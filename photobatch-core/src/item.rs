//! Upload items: the payload sources submitted to the photo service.
//!
//! An [`UploadItem`] is either a local file or an HTTP resource fetched at
//! upload time. Both variants can describe themselves (via `Display`), name
//! the file the remote side should store, and produce their payload bytes.

use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::Url;
use tracing::debug;

use crate::contract::ServiceError;
use crate::error::{PipelineError, Result};

/// A single payload source submitted to the photo service.
#[derive(Debug, Clone)]
pub enum UploadItem {
    /// A local file, read in full at upload time.
    File(PathBuf),
    /// A remote resource, fetched with a GET request at upload time.
    Http(HttpUploadItem),
}

/// A remote resource plus the client used to fetch it.
#[derive(Debug, Clone)]
pub struct HttpUploadItem {
    /// Shared handle; cloning a `reqwest::Client` shares its connection pool.
    pub client: reqwest::Client,
    pub request: HttpRequest,
}

/// Everything needed to issue the GET request for an [`HttpUploadItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: Url,
    pub basic_auth: Option<BasicAuth>,
    pub headers: Vec<(String, String)>,
}

/// Basic-auth credential for remote fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
}

impl BasicAuth {
    /// Splits `user:pass` on the first colon. Without a colon the whole string is the username.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((username, password)) => BasicAuth {
                username: username.to_string(),
                password: Some(password.to_string()),
            },
            None => BasicAuth {
                username: raw.to_string(),
                password: None,
            },
        }
    }
}

/// Parses a `Key: Value` header string, splitting on the first colon and trimming both sides.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once(':')
        .ok_or_else(|| PipelineError::InvalidHeader(raw.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(PipelineError::InvalidHeader(raw.to_string()));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

impl UploadItem {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        UploadItem::File(path.into())
    }

    /// File name the remote service should store the item under.
    pub fn name(&self) -> String {
        match self {
            UploadItem::File(path) => file_name(path),
            UploadItem::Http(item) => url_name(&item.request.url),
        }
    }

    /// Reads the whole payload: the file contents, or the HTTP response body.
    pub async fn read_payload(&self) -> std::result::Result<Vec<u8>, ServiceError> {
        match self {
            UploadItem::File(path) => {
                debug!(path = %path.display(), "Reading file payload");
                let bytes = tokio::fs::read(path).await?;
                Ok(bytes)
            }
            UploadItem::Http(item) => item.fetch().await,
        }
    }
}

impl HttpUploadItem {
    async fn fetch(&self) -> std::result::Result<Vec<u8>, ServiceError> {
        debug!(url = %self.request.url, "Fetching HTTP payload");
        let mut builder = self.client.get(self.request.url.clone());
        if let Some(auth) = &self.request.basic_auth {
            builder = builder.basic_auth(&auth.username, auth.password.as_ref());
        }
        for (key, value) in &self.request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        let response = builder.send().await?.error_for_status()?;
        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

impl fmt::Display for UploadItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadItem::File(path) => write!(f, "{}", path.display()),
            UploadItem::Http(item) => write!(f, "{}", item.request.url),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn url_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
