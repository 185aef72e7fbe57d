//! Remote Service Gateway.
//!
//! [`RemoteService`] is the transport boundary of the core: every network
//! interaction goes through this trait, which is injected into the
//! coordinator and the transfer executor. There is no ambient client and no
//! interceptor side effects; an expired credential surfaces as
//! [`ApiError::AuthExpired`](crate::error::ApiError::AuthExpired) for the
//! caller to handle. [`HttpRemoteService`] is the production implementation;
//! tests use the stub in [`crate::testing`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use visage_model::{AdminStats, AlbumDetail, Person, PersonId, Photo, PhotoId, PhotoPage};

use crate::error::ApiResult;

pub mod http;

pub use http::HttpRemoteService;

/// A file admitted by the validation gate, ready to be carried in a batch
/// upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Byte-level progress of an in-flight batch transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub bytes_sent: u64,
    pub bytes_total: u64,
}

impl TransferProgress {
    /// Aggregate percentage, 0 to 100. A zero-byte batch reports 100.
    pub fn percent(&self) -> u8 {
        if self.bytes_total == 0 {
            return 100;
        }
        ((self.bytes_sent.min(self.bytes_total) * 100) / self.bytes_total) as u8
    }
}

/// Callback invoked as upload bytes go out the door.
pub type ProgressFn = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// Request/response contract of the gallery service.
///
/// Semantics, not wire bytes: implementations may use any transport that
/// honors these shapes. All mutating calls are single round trips; the batch
/// upload carries every file in one request.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Upload a batch of photos in a single request. Progress is reported
    /// through `progress` as cumulative bytes over total bytes. Returns the
    /// entities the server created, one per file, in request order.
    async fn upload_photos(
        &self,
        files: &[UploadFile],
        progress: Option<ProgressFn>,
    ) -> ApiResult<Vec<Photo>>;

    /// Fetch one page of the photo listing.
    async fn list_photos(&self, page: u32, per_page: u32) -> ApiResult<PhotoPage>;

    /// URL serving a photo's image, optionally the thumbnail rendition.
    fn photo_image_url(&self, id: PhotoId, thumbnail: bool) -> String;

    /// Fetch the original bytes of a photo, for saving locally.
    async fn fetch_photo_bytes(&self, id: PhotoId) -> ApiResult<Vec<u8>>;

    /// Delete a photo and its derived faces.
    async fn delete_photo(&self, id: PhotoId) -> ApiResult<()>;

    /// List all person albums, sorted by photo count descending.
    async fn list_albums(&self) -> ApiResult<Vec<Person>>;

    /// Fetch a person together with every photo they appear in.
    async fn fetch_album_detail(&self, id: PersonId) -> ApiResult<AlbumDetail>;

    /// Fetch a ZIP archive of every photo in an album.
    async fn fetch_album_archive(&self, id: PersonId) -> ApiResult<Vec<u8>>;

    /// Rename a person. The server rejects empty names.
    async fn rename_person(&self, id: PersonId, name: &str) -> ApiResult<()>;

    /// Merge two persons into one. Order-insensitive; the surviving record's
    /// attributes are the server's choice.
    async fn merge_persons(&self, first: PersonId, second: PersonId) -> ApiResult<()>;

    /// Fetch aggregate statistics.
    async fn fetch_stats(&self) -> ApiResult<AdminStats>;

    /// Kick off a full server-side reprocess. Returns as soon as the job is
    /// accepted; completion is never awaited.
    async fn trigger_reprocess(&self) -> ApiResult<()>;

    /// Cheap liveness probe.
    async fn health_check(&self) -> ApiResult<bool>;
}
