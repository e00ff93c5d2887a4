use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use photobatch::photos::{GooglePhotosClient, BATCH_CREATE_LIMIT};
use photobatch_core::contract::PhotoService;
use photobatch_core::item::UploadItem;
use serde_json::{json, Value};
use tempfile::tempdir;

/// In-process stand-in for the photo library API.
#[derive(Default)]
struct FakePhotos {
    /// Uploads with this file name answer 500.
    failing_upload: Option<String>,
    /// batchCreate calls carrying this upload token answer 500.
    failing_batch_token: Option<String>,
    batch_calls: Mutex<Vec<Value>>,
    created_albums: Mutex<Vec<String>>,
}

impl FakePhotos {
    fn batch_calls(&self) -> Vec<Value> {
        self.batch_calls.lock().unwrap().clone()
    }
}

async fn photos_api(
    State(api): State<Arc<FakePhotos>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match (method.as_str(), uri.path()) {
        ("POST", "/v1/uploads") => {
            let name = headers
                .get("x-goog-upload-file-name")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            if api.failing_upload.as_deref() == Some(name.as_str()) {
                return (StatusCode::INTERNAL_SERVER_ERROR, "upload rejected").into_response();
            }
            format!("tok-{name}").into_response()
        }
        ("POST", "/v1/mediaItems:batchCreate") => {
            let request: Value = serde_json::from_slice(&body).unwrap();
            api.batch_calls.lock().unwrap().push(request.clone());
            let tokens: Vec<String> = request["newMediaItems"]
                .as_array()
                .unwrap()
                .iter()
                .map(|item| {
                    item["simpleMediaItem"]["uploadToken"]
                        .as_str()
                        .unwrap()
                        .to_string()
                })
                .collect();
            if let Some(bad) = &api.failing_batch_token {
                if tokens.contains(bad) {
                    return (StatusCode::INTERNAL_SERVER_ERROR, "batch rejected").into_response();
                }
            }
            let results: Vec<Value> = tokens
                .iter()
                .map(|token| json!({ "uploadToken": token, "status": { "message": "Success" } }))
                .collect();
            Json(json!({ "newMediaItemResults": results })).into_response()
        }
        ("GET", "/v1/albums") => {
            let page = if uri.query().unwrap_or_default().contains("pageToken=page-2") {
                json!({ "albums": [{ "id": "album-2", "title": "Holidays" }] })
            } else {
                json!({
                    "albums": [{ "id": "album-1", "title": "Work" }],
                    "nextPageToken": "page-2"
                })
            };
            Json(page).into_response()
        }
        ("POST", "/v1/albums") => {
            let request: Value = serde_json::from_slice(&body).unwrap();
            let title = request["album"]["title"].as_str().unwrap().to_string();
            api.created_albums.lock().unwrap().push(title.clone());
            Json(json!({ "id": "album-new", "title": title })).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serves `api` on an ephemeral port and returns its base URL.
async fn serve(api: Arc<FakePhotos>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(photos_api).with_state(api);
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

fn photos(dir: &Path, names: &[String]) -> Vec<UploadItem> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            std::fs::write(&path, name.as_bytes()).unwrap();
            UploadItem::file(path)
        })
        .collect()
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn failed_upload_fails_only_its_item() {
    let api = Arc::new(FakePhotos {
        failing_upload: Some("b.jpg".into()),
        ..FakePhotos::default()
    });
    let client = GooglePhotosClient::new("token", serve(api.clone()).await);
    let dir = tempdir().unwrap();
    let items = photos(dir.path(), &names(&["a.jpg", "b.jpg", "c.jpg"]));

    let results = client.add_to_library(&items).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(!results[1].is_ok());
    assert!(results[2].is_ok());

    let calls = api.batch_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].get("albumId").is_none());
    let file_names: Vec<&str> = calls[0]["newMediaItems"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["simpleMediaItem"]["fileName"].as_str().unwrap())
        .collect();
    assert_eq!(file_names, vec!["a.jpg", "c.jpg"]);
}

#[tokio::test]
async fn batch_create_is_chunked_and_a_failed_chunk_fails_alone() {
    let count = BATCH_CREATE_LIMIT + 1;
    let file_names: Vec<String> = (0..count).map(|i| format!("photo-{i:02}.jpg")).collect();
    let api = Arc::new(FakePhotos {
        failing_batch_token: Some(format!("tok-{}", file_names[count - 1])),
        ..FakePhotos::default()
    });
    let client = GooglePhotosClient::new("token", serve(api.clone()).await);
    let dir = tempdir().unwrap();
    let items = photos(dir.path(), &file_names);

    let results = client.add_to_library(&items).await;

    let calls = api.batch_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0]["newMediaItems"].as_array().unwrap().len(), BATCH_CREATE_LIMIT);
    assert_eq!(calls[1]["newMediaItems"].as_array().unwrap().len(), 1);

    assert_eq!(results.len(), count);
    assert!(results[..BATCH_CREATE_LIMIT].iter().all(|r| r.is_ok()));
    assert!(!results[BATCH_CREATE_LIMIT].is_ok());
}

#[tokio::test]
async fn album_on_a_later_page_receives_the_items() {
    let api = Arc::new(FakePhotos::default());
    let client = GooglePhotosClient::new("token", serve(api.clone()).await);
    let dir = tempdir().unwrap();
    let items = photos(dir.path(), &names(&["a.jpg"]));

    let results = client.add_to_album("Holidays", &items).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
    assert_eq!(api.batch_calls()[0]["albumId"], "album-2");
}

#[tokio::test]
async fn first_page_album_is_found_without_paging() {
    let client = GooglePhotosClient::new("token", serve(Arc::new(FakePhotos::default())).await);

    let album = client.find_album("Work").await.unwrap().unwrap();

    assert_eq!(album.id, "album-1");
}

#[tokio::test]
async fn unknown_album_fails_the_whole_batch() {
    let api = Arc::new(FakePhotos::default());
    let client = GooglePhotosClient::new("token", serve(api.clone()).await);
    let dir = tempdir().unwrap();
    let items = photos(dir.path(), &names(&["a.jpg"]));

    let err = client.add_to_album("Nope", &items).await.unwrap_err();

    assert_eq!(err.to_string(), "Album not found: Nope");
    assert!(api.batch_calls().is_empty());
}

#[tokio::test]
async fn new_album_is_created_and_receives_the_items() {
    let api = Arc::new(FakePhotos::default());
    let client = GooglePhotosClient::new("token", serve(api.clone()).await);
    let dir = tempdir().unwrap();
    let items = photos(dir.path(), &names(&["a.jpg", "b.jpg"]));

    let results = client.create_album("Fresh", &items).await.unwrap();

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(*api.created_albums.lock().unwrap(), vec!["Fresh".to_string()]);
    let calls = api.batch_calls();
    assert_eq!(calls[0]["albumId"], "album-new");
    assert_eq!(calls[0]["newMediaItems"].as_array().unwrap().len(), 2);
}
