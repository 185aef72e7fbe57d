//! In-memory test double for [`RemoteService`].
//!
//! [`StubRemoteService`] keeps photos, albums, and stats in memory, records
//! every call by operation name, and can be primed with one-shot failures.
//! It never touches the network or the filesystem; uploads synthesize
//! entities from the file metadata alone.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use visage_model::{
    AdminStats, AlbumDetail, Person, PersonId, Photo, PhotoId, PhotoPage,
};

use crate::error::{ApiError, ApiResult};
use crate::gateway::{ProgressFn, RemoteService, TransferProgress, UploadFile};

/// A failure the stub should serve on the next call of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubFailure {
    Validation,
    Network,
    NotFound,
    Server,
    AuthExpired,
}

impl StubFailure {
    fn into_error(self) -> ApiError {
        match self {
            StubFailure::Validation => ApiError::Validation("stub validation failure".into()),
            StubFailure::Network => ApiError::Network("stub network failure".into()),
            StubFailure::NotFound => ApiError::NotFound("stub missing entity".into()),
            StubFailure::Server => ApiError::Server {
                status: 500,
                message: "stub server failure".into(),
            },
            StubFailure::AuthExpired => ApiError::AuthExpired,
        }
    }
}

#[derive(Debug, Default)]
struct InnerStubState {
    photos: Vec<Photo>,
    albums: Vec<Person>,
    stats: Option<AdminStats>,
    photo_bytes: HashMap<PhotoId, Vec<u8>>,
    next_photo_id: i64,
    calls: HashMap<String, usize>,
    failures: HashMap<String, Vec<StubFailure>>,
    merge_pairs: Vec<(PersonId, PersonId)>,
    renames: Vec<(PersonId, String)>,
}

/// In-memory [`RemoteService`] implementation for tests.
#[derive(Debug, Clone, Default)]
pub struct StubRemoteService {
    inner: Arc<RwLock<InnerStubState>>,
}

impl StubRemoteService {
    pub fn new() -> Self {
        StubRemoteService {
            inner: Arc::new(RwLock::new(InnerStubState {
                next_photo_id: 1,
                ..InnerStubState::default()
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, InnerStubState> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, InnerStubState> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push_photo(&self, photo: Photo) {
        let mut guard = self.write();
        guard.next_photo_id = guard.next_photo_id.max(photo.id.as_i64() + 1);
        guard.photos.push(photo);
    }

    pub fn push_album(&self, album: Person) {
        self.write().albums.push(album);
    }

    pub fn set_photo_bytes(&self, id: PhotoId, bytes: Vec<u8>) {
        self.write().photo_bytes.insert(id, bytes);
    }

    pub fn set_stats(&self, stats: AdminStats) {
        self.write().stats = Some(stats);
    }

    /// Prime a one-shot failure for the named operation. Queued failures are
    /// served in order, one per call, before the normal behavior resumes.
    pub fn queue_failure(&self, op: &str, failure: StubFailure) {
        self.write()
            .failures
            .entry(op.to_string())
            .or_default()
            .push(failure);
    }

    /// How many times the named operation was invoked, failures included.
    pub fn call_count(&self, op: &str) -> usize {
        self.read().calls.get(op).copied().unwrap_or(0)
    }

    pub fn last_merge_pair(&self) -> Option<(PersonId, PersonId)> {
        self.read().merge_pairs.last().copied()
    }

    pub fn last_rename(&self) -> Option<(PersonId, String)> {
        self.read().renames.last().cloned()
    }

    /// Record the call and serve a primed failure if one is queued.
    fn enter(&self, op: &str) -> ApiResult<()> {
        let mut guard = self.write();
        *guard.calls.entry(op.to_string()).or_insert(0) += 1;
        if let Some(queued) = guard.failures.get_mut(op)
            && !queued.is_empty()
        {
            return Err(queued.remove(0).into_error());
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteService for StubRemoteService {
    async fn upload_photos(
        &self,
        files: &[UploadFile],
        progress: Option<ProgressFn>,
    ) -> ApiResult<Vec<Photo>> {
        self.enter("upload_photos")?;

        let bytes_total: u64 = files.iter().map(|file| file.size_bytes).sum();
        if let Some(callback) = &progress {
            callback(TransferProgress {
                bytes_sent: 0,
                bytes_total,
            });
        }

        let mut created = Vec::with_capacity(files.len());
        let mut bytes_sent = 0u64;
        for file in files {
            let photo = {
                let mut guard = self.write();
                let id = PhotoId(guard.next_photo_id);
                guard.next_photo_id += 1;
                let photo = Photo {
                    id,
                    filename: format!("{id}_{}", file.file_name),
                    original_filename: file.file_name.clone(),
                    upload_date: Utc::now(),
                    file_size: Some(file.size_bytes),
                    width: None,
                    height: None,
                    processed: false,
                    faces_count: 0,
                };
                guard.photos.push(photo.clone());
                photo
            };
            created.push(photo);

            bytes_sent += file.size_bytes;
            if let Some(callback) = &progress {
                callback(TransferProgress {
                    bytes_sent,
                    bytes_total,
                });
            }
        }
        Ok(created)
    }

    async fn list_photos(&self, page: u32, per_page: u32) -> ApiResult<PhotoPage> {
        self.enter("list_photos")?;
        let guard = self.read();
        let total = guard.photos.len() as u64;
        let per_page = per_page.max(1) as usize;
        let pages = guard.photos.len().div_ceil(per_page).max(1) as u32;
        let current = page.max(1);
        let start = (current as usize - 1) * per_page;
        let photos: Vec<Photo> = guard
            .photos
            .iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect();
        Ok(PhotoPage {
            photos,
            total,
            pages,
            current_page: current,
            has_next: current < pages,
            has_prev: current > 1,
        })
    }

    fn photo_image_url(&self, id: PhotoId, thumbnail: bool) -> String {
        if thumbnail {
            format!("stub://photos/{id}/image?thumbnail=true")
        } else {
            format!("stub://photos/{id}/image")
        }
    }

    async fn fetch_photo_bytes(&self, id: PhotoId) -> ApiResult<Vec<u8>> {
        self.enter("fetch_photo_bytes")?;
        self.read()
            .photo_bytes
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("photo {id}")))
    }

    async fn delete_photo(&self, id: PhotoId) -> ApiResult<()> {
        self.enter("delete_photo")?;
        let mut guard = self.write();
        let before = guard.photos.len();
        guard.photos.retain(|photo| photo.id != id);
        guard.photo_bytes.remove(&id);
        if guard.photos.len() == before {
            return Err(ApiError::NotFound(format!("photo {id}")));
        }
        Ok(())
    }

    async fn list_albums(&self) -> ApiResult<Vec<Person>> {
        self.enter("list_albums")?;
        let mut albums = self.read().albums.clone();
        albums.sort_by(|a, b| b.photo_count.cmp(&a.photo_count));
        Ok(albums)
    }

    async fn fetch_album_detail(&self, id: PersonId) -> ApiResult<AlbumDetail> {
        self.enter("fetch_album_detail")?;
        let guard = self.read();
        let person = guard
            .albums
            .iter()
            .find(|album| album.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("album {id}")))?;
        Ok(AlbumDetail {
            person,
            photos: guard.photos.clone(),
        })
    }

    async fn fetch_album_archive(&self, id: PersonId) -> ApiResult<Vec<u8>> {
        self.enter("fetch_album_archive")?;
        let guard = self.read();
        if !guard.albums.iter().any(|album| album.id == id) {
            return Err(ApiError::NotFound(format!("album {id}")));
        }
        Ok(b"PK\x05\x06stub-archive".to_vec())
    }

    async fn rename_person(&self, id: PersonId, name: &str) -> ApiResult<()> {
        self.enter("rename_person")?;
        let mut guard = self.write();
        guard.renames.push((id, name.to_string()));
        let album = guard
            .albums
            .iter_mut()
            .find(|album| album.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("album {id}")))?;
        album.name = name.to_string();
        Ok(())
    }

    async fn merge_persons(&self, first: PersonId, second: PersonId) -> ApiResult<()> {
        self.enter("merge_persons")?;
        let mut guard = self.write();
        guard.merge_pairs.push((first, second));
        let absorbed = guard
            .albums
            .iter()
            .find(|album| album.id == second)
            .map(|album| album.photo_count)
            .unwrap_or(0);
        guard.albums.retain(|album| album.id != second);
        if let Some(survivor) = guard.albums.iter_mut().find(|album| album.id == first) {
            survivor.photo_count += absorbed;
        }
        Ok(())
    }

    async fn fetch_stats(&self) -> ApiResult<AdminStats> {
        self.enter("fetch_stats")?;
        let guard = self.read();
        if let Some(stats) = &guard.stats {
            return Ok(stats.clone());
        }
        let total_photos = guard.photos.len() as u64;
        let processed = guard.photos.iter().filter(|photo| photo.processed).count() as u64;
        Ok(AdminStats {
            total_photos,
            total_persons: guard.albums.len() as u64,
            total_faces: guard
                .photos
                .iter()
                .map(|photo| u64::from(photo.faces_count))
                .sum(),
            processed_photos: processed,
            processing_progress: if total_photos == 0 {
                100.0
            } else {
                (processed as f64 / total_photos as f64) * 100.0
            },
            total_storage: None,
        })
    }

    async fn trigger_reprocess(&self) -> ApiResult<()> {
        self.enter("trigger_reprocess")
    }

    async fn health_check(&self) -> ApiResult<bool> {
        self.enter("health_check")?;
        Ok(true)
    }
}

/// A photo with sensible defaults for test setup.
pub fn sample_photo(id: i64, original_filename: &str) -> Photo {
    Photo {
        id: PhotoId(id),
        filename: format!("{id}_{original_filename}"),
        original_filename: original_filename.to_string(),
        upload_date: Utc::now(),
        file_size: Some(1024),
        width: Some(800),
        height: Some(600),
        processed: true,
        faces_count: 1,
    }
}

/// An album with sensible defaults for test setup.
pub fn sample_album(id: i64, name: &str, photo_count: u32) -> Person {
    Person {
        id: PersonId(id),
        name: name.to_string(),
        created_date: Utc::now(),
        photo_count,
        representative_face: None,
        is_merged: false,
    }
}
