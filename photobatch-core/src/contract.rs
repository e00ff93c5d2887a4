//! # contract: interface to the remote photo service
//!
//! This module defines the [`PhotoService`] trait and the per-item result type
//! the pipeline consumes. Concrete clients (a real API client, a mock in tests)
//! implement the trait; the pipeline itself never knows which one it talks to.
//!
//! ## Error model
//! - Batch-level failures (album lookup or creation, the call itself) are
//!   returned as `Err(ServiceError)` from the album operations.
//! - Failures of individual items are reported as [`AddResult`] entries inside
//!   an `Ok` result. `add_to_library` has no batch-level error at all.
//!
//! ## Mocking
//! The trait is annotated for `mockall`; `MockPhotoService` is exported when
//! the `test-export-mocks` feature is enabled (the default).

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::item::UploadItem;

/// Boxed error used across the service boundary.
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of adding one item.
#[derive(Debug)]
pub struct AddResult {
    pub error: Option<ServiceError>,
}

impl AddResult {
    pub fn ok() -> Self {
        Self { error: None }
    }

    pub fn failed(error: impl Into<ServiceError>) -> Self {
        Self {
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Remote photo storage.
///
/// Every operation returns one [`AddResult`] per submitted item, in submission order.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PhotoService: Send + Sync {
    /// Add items to the user's library, outside any album.
    async fn add_to_library(&self, items: &[UploadItem]) -> Vec<AddResult>;

    /// Add items to the existing album with the given title.
    async fn add_to_album(
        &self,
        title: &str,
        items: &[UploadItem],
    ) -> Result<Vec<AddResult>, ServiceError>;

    /// Create an album with the given title and add items to it.
    async fn create_album(
        &self,
        title: &str,
        items: &[UploadItem],
    ) -> Result<Vec<AddResult>, ServiceError>;
}
