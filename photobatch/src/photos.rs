#![doc = "Photo service integration for the CLI: implements the core `PhotoService` trait against the Google Photos Library API."]
//
//! # Google Photos client
//!
//! [`GooglePhotosClient`] is the concrete [`PhotoService`] used by the CLI.
//! Every item is uploaded in two steps:
//!
//! 1. its payload bytes are posted to `/v1/uploads`, which answers with an
//!    upload token;
//! 2. the tokens are turned into media items with `/v1/mediaItems:batchCreate`,
//!    in chunks of [`BATCH_CREATE_LIMIT`], optionally into an album.
//!
//! A failure in either step only fails the items it concerns. Only album lookup
//! and album creation fail a whole batch.
//!
//! ## Client Usage
//! - Construct with [`GooglePhotosClient::new_from_env`] (`PHOTOS_ACCESS_TOKEN`,
//!   optional `PHOTOS_API_BASE_URL`). Obtaining the OAuth2 access token is left
//!   to the caller.

use std::collections::HashMap;
use std::env;

use async_trait::async_trait;
use photobatch_core::contract::{AddResult, PhotoService, ServiceError};
use photobatch_core::item::UploadItem;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://photoslibrary.googleapis.com";
pub const ACCESS_TOKEN_ENV: &str = "PHOTOS_ACCESS_TOKEN";
pub const API_BASE_URL_ENV: &str = "PHOTOS_API_BASE_URL";

/// Maximum number of media items per batchCreate call.
pub const BATCH_CREATE_LIMIT: usize = 50;

const ALBUMS_PAGE_SIZE: &str = "50";

pub struct GooglePhotosClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlbumsPage {
    #[serde(default)]
    albums: Vec<Album>,
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateAlbumRequest<'a> {
    album: NewAlbum<'a>,
}

#[derive(Debug, Serialize)]
struct NewAlbum<'a> {
    title: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchCreateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    album_id: Option<&'a str>,
    new_media_items: Vec<NewMediaItem<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewMediaItem<'a> {
    simple_media_item: SimpleMediaItem<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimpleMediaItem<'a> {
    upload_token: &'a str,
    file_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchCreateResponse {
    #[serde(default)]
    new_media_item_results: Vec<NewMediaItemResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewMediaItemResult {
    upload_token: String,
    #[serde(default)]
    status: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: Option<i32>,
    #[serde(default)]
    message: Option<String>,
}

/// One uploaded item waiting for batchCreate: its index in the batch and its upload token.
type Pending = (usize, String);

impl GooglePhotosClient {
    pub fn new(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    /// Builds a client from the environment. `base_url` wins over `PHOTOS_API_BASE_URL`.
    pub fn new_from_env(base_url: Option<String>) -> Result<Self, ServiceError> {
        dotenvy::dotenv().ok();
        let access_token = env::var(ACCESS_TOKEN_ENV).map_err(|e| {
            tracing::error!(error = ?e, "{ACCESS_TOKEN_ENV} missing in environment");
            format!("{ACCESS_TOKEN_ENV} is not set: {e}")
        })?;
        let base_url = base_url
            .or_else(|| env::var(API_BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        tracing::info!(base_url = %base_url, "Initialized GooglePhotosClient from environment");
        Ok(Self::new(access_token, base_url))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn upload_item(&self, item: &UploadItem) -> Result<String, ServiceError> {
        let payload = item.read_payload().await?;
        tracing::debug!(item = %item, bytes = payload.len(), "Uploading payload");
        let response = self
            .http
            .post(self.endpoint("uploads"))
            .bearer_auth(&self.access_token)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header("X-Goog-Upload-File-Name", item.name())
            .header("X-Goog-Upload-Protocol", "raw")
            .body(payload)
            .send()
            .await?
            .error_for_status()?;
        let token = response.text().await?;
        if token.trim().is_empty() {
            return Err("photo service returned an empty upload token".into());
        }
        Ok(token.trim().to_string())
    }

    async fn batch_create(
        &self,
        album_id: Option<&str>,
        items: &[UploadItem],
        pending: &[Pending],
    ) -> Result<BatchCreateResponse, ServiceError> {
        let request = batch_create_request(album_id, items, pending);
        let response = self
            .http
            .post(self.endpoint("mediaItems:batchCreate"))
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<BatchCreateResponse>().await?)
    }

    /// Looks up an album by exact title, walking every page of the album list.
    pub async fn find_album(&self, title: &str) -> Result<Option<Album>, ServiceError> {
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .http
                .get(self.endpoint("albums"))
                .bearer_auth(&self.access_token)
                .query(&[("pageSize", ALBUMS_PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page: AlbumsPage = request.send().await?.error_for_status()?.json().await?;
            if let Some(album) = page.albums.into_iter().find(|a| a.title == title) {
                return Ok(Some(album));
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => return Ok(None),
            }
        }
    }

    pub async fn new_album(&self, title: &str) -> Result<Album, ServiceError> {
        let request = CreateAlbumRequest {
            album: NewAlbum { title },
        };
        let album: Album = self
            .http
            .post(self.endpoint("albums"))
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        tracing::info!(album_id = %album.id, title = %title, "Created album");
        Ok(album)
    }

    /// Uploads every item, then registers the uploaded ones. Never fails as a whole.
    async fn add(&self, album_id: Option<&str>, items: &[UploadItem]) -> Vec<AddResult> {
        let mut results: Vec<Option<AddResult>> = items.iter().map(|_| None).collect();
        let mut pending: Vec<Pending> = Vec::new();

        for (i, item) in items.iter().enumerate() {
            match self.upload_item(item).await {
                Ok(token) => pending.push((i, token)),
                Err(e) => {
                    tracing::warn!(item = %item, error = %e, "Upload of item failed");
                    results[i] = Some(AddResult::failed(e));
                }
            }
        }

        for chunk in pending.chunks(BATCH_CREATE_LIMIT) {
            match self.batch_create(album_id, items, chunk).await {
                Ok(response) => {
                    for ((i, _), result) in chunk.iter().zip(chunk_results(chunk, response)) {
                        results[*i] = Some(result);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, items = chunk.len(), "batchCreate failed");
                    for (i, _) in chunk {
                        results[*i] = Some(AddResult::failed(e.to_string()));
                    }
                }
            }
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| AddResult::failed("item was not processed")))
            .collect()
    }
}

fn batch_create_request<'a>(
    album_id: Option<&'a str>,
    items: &[UploadItem],
    pending: &'a [Pending],
) -> BatchCreateRequest<'a> {
    BatchCreateRequest {
        album_id,
        new_media_items: pending
            .iter()
            .map(|(i, token)| NewMediaItem {
                simple_media_item: SimpleMediaItem {
                    upload_token: token,
                    file_name: items[*i].name(),
                },
            })
            .collect(),
    }
}

/// Matches batchCreate results to the chunk by upload token, in chunk order.
fn chunk_results(chunk: &[Pending], response: BatchCreateResponse) -> Vec<AddResult> {
    let mut by_token: HashMap<String, Option<Status>> = response
        .new_media_item_results
        .into_iter()
        .map(|r| (r.upload_token, r.status))
        .collect();
    chunk
        .iter()
        .map(|(_, token)| match by_token.remove(token) {
            None => AddResult::failed("photo service returned no result for the item"),
            Some(None) => AddResult::ok(),
            Some(Some(status)) => match status.code {
                None | Some(0) => AddResult::ok(),
                Some(code) => AddResult::failed(format!(
                    "{} (code {code})",
                    status.message.unwrap_or_else(|| "media item creation failed".into())
                )),
            },
        })
        .collect()
}

#[async_trait]
impl PhotoService for GooglePhotosClient {
    async fn add_to_library(&self, items: &[UploadItem]) -> Vec<AddResult> {
        tracing::info!(items = items.len(), "Adding items to library");
        self.add(None, items).await
    }

    async fn add_to_album(
        &self,
        title: &str,
        items: &[UploadItem],
    ) -> Result<Vec<AddResult>, ServiceError> {
        let album = self.find_album(title).await?.ok_or_else(|| {
            tracing::error!(title = %title, "Album not found");
            format!("Album not found: {title}")
        })?;
        tracing::info!(album_id = %album.id, items = items.len(), "Adding items to album");
        Ok(self.add(Some(&album.id), items).await)
    }

    async fn create_album(
        &self,
        title: &str,
        items: &[UploadItem],
    ) -> Result<Vec<AddResult>, ServiceError> {
        let album = self.new_album(title).await?;
        Ok(self.add(Some(&album.id), items).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn pending(tokens: &[&str]) -> Vec<Pending> {
        tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (i, t.to_string()))
            .collect()
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = GooglePhotosClient::new("token", "http://localhost:8080/");
        assert_eq!(client.endpoint("uploads"), "http://localhost:8080/v1/uploads");
    }

    #[test]
    fn batch_create_request_uses_item_names_and_album() {
        let items = vec![
            UploadItem::file("/tmp/dir/a.jpg"),
            UploadItem::file("/tmp/dir/c.jpg"),
        ];
        let pending = pending(&["tok-a", "tok-c"]);

        let json = serde_json::to_value(batch_create_request(Some("album-1"), &items, &pending))
            .unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "albumId": "album-1",
                "newMediaItems": [
                    {"simpleMediaItem": {"uploadToken": "tok-a", "fileName": "a.jpg"}},
                    {"simpleMediaItem": {"uploadToken": "tok-c", "fileName": "c.jpg"}}
                ]
            })
        );
    }

    #[test]
    fn library_request_omits_album_id() {
        let items = vec![UploadItem::file("/tmp/a.jpg")];
        let json =
            serde_json::to_value(batch_create_request(None, &items, &pending(&["t"]))).unwrap();
        assert!(json.get("albumId").is_none());
    }

    #[test]
    fn chunk_results_match_by_token_and_status() {
        let response: BatchCreateResponse = serde_json::from_value(serde_json::json!({
            "newMediaItemResults": [
                {"uploadToken": "t2", "status": {"code": 3, "message": "Invalid media"}},
                {"uploadToken": "t1", "status": {"message": "Success"}}
            ]
        }))
        .unwrap();

        let results = chunk_results(&pending(&["t1", "t2", "t3"]), response);

        assert!(results[0].is_ok());
        assert_eq!(
            results[1].error.as_ref().unwrap().to_string(),
            "Invalid media (code 3)"
        );
        assert!(!results[2].is_ok());
    }

    #[test]
    fn albums_page_tolerates_missing_fields() {
        let page: AlbumsPage = serde_json::from_str("{}").unwrap();
        assert!(page.albums.is_empty());
        assert!(page.next_page_token.is_none());

        let page: AlbumsPage = serde_json::from_str(
            r#"{"albums":[{"id":"1","title":"Trips"},{"id":"2"}],"nextPageToken":"p2"}"#,
        )
        .unwrap();
        assert_eq!(page.albums[0].title, "Trips");
        assert_eq!(page.albums[1].title, "");
        assert_eq!(page.next_page_token.as_deref(), Some("p2"));
    }

    #[test]
    #[serial]
    fn new_from_env_requires_access_token() {
        env::remove_var(ACCESS_TOKEN_ENV);
        let err = GooglePhotosClient::new_from_env(None).err().unwrap();
        assert!(err.to_string().contains(ACCESS_TOKEN_ENV));
    }

    #[test]
    #[serial]
    fn explicit_base_url_wins_over_env() {
        env::set_var(ACCESS_TOKEN_ENV, "test-token");
        env::set_var(API_BASE_URL_ENV, "http://from-env");
        let client = GooglePhotosClient::new_from_env(Some("http://explicit".into())).unwrap();
        assert_eq!(client.base_url, "http://explicit");

        let client = GooglePhotosClient::new_from_env(None).unwrap();
        assert_eq!(client.base_url, "http://from-env");

        env::remove_var(ACCESS_TOKEN_ENV);
        env::remove_var(API_BASE_URL_ENV);
    }
}
