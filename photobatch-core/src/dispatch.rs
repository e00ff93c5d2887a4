//! Routes a resolved batch to exactly one remote operation.

use tracing::{error, info};

use crate::contract::{AddResult, PhotoService};
use crate::error::{PipelineError, Result};
use crate::item::UploadItem;

/// Where the batch goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Library,
    ExistingAlbum(String),
    NewAlbum(String),
}

impl Target {
    /// An existing album title wins over a new album title; neither means the library.
    /// Empty titles count as absent.
    pub fn select(album_title: Option<&str>, new_album_title: Option<&str>) -> Self {
        match (
            album_title.filter(|t| !t.is_empty()),
            new_album_title.filter(|t| !t.is_empty()),
        ) {
            (Some(title), _) => Target::ExistingAlbum(title.to_string()),
            (None, Some(title)) => Target::NewAlbum(title.to_string()),
            (None, None) => Target::Library,
        }
    }
}

/// Submits `items` to `target` and returns one result per item, in order.
pub async fn dispatch<S>(service: &S, target: &Target, items: &[UploadItem]) -> Result<Vec<AddResult>>
where
    S: PhotoService + ?Sized,
{
    info!(?target, items = items.len(), "Dispatching upload batch");
    let results = match target {
        Target::Library => service.add_to_library(items).await,
        Target::ExistingAlbum(title) => service.add_to_album(title, items).await.map_err(|e| {
            error!(album = %title, error = %e, "Adding to album failed");
            PipelineError::Remote(e)
        })?,
        Target::NewAlbum(title) => service.create_album(title, items).await.map_err(|e| {
            error!(album = %title, error = %e, "Creating album failed");
            PipelineError::Remote(e)
        })?,
    };

    if results.len() != items.len() {
        error!(
            expected = items.len(),
            actual = results.len(),
            "Photo service result count does not match the batch"
        );
        return Err(PipelineError::ResultCountMismatch {
            expected: items.len(),
            actual: results.len(),
        });
    }
    Ok(results)
}
