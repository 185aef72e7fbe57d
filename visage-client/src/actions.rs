//! Batch Action Coordinator.
//!
//! Validates preconditions against the current selection, invokes the remote
//! service, aggregates per-item outcomes, and reconciles the local
//! [`GalleryStore`]. Each action kind is independently re-entrant-guarded:
//! while one call of a kind is outstanding, a second one is ignored with an
//! advisory notice rather than queued. Every failure becomes a dismissible
//! notice and is also returned to the caller typed; no failure path leaves
//! the store, queue, or selection partially mutated, except batch download,
//! which is per-item best-effort by contract.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use visage_model::{AdminStats, AlbumDetail, PersonId, Photo, PhotoId, PhotoPage};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::gateway::{ProgressFn, RemoteService};
use crate::notice::{Notice, NoticeLog};
use crate::selection::SelectionStore;
use crate::store::GalleryStore;
use crate::upload::queue::UploadQueue;
use crate::upload::transfer::TransferExecutor;
use crate::upload::validate::{self, UploadCandidate};

/// The action kinds subject to the one-in-flight rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    UploadFlush,
    Download,
    Delete,
    Merge,
    Rename,
    Reprocess,
}

impl ActionKind {
    fn label(&self) -> &'static str {
        match self {
            ActionKind::UploadFlush => "Upload",
            ActionKind::Download => "Download",
            ActionKind::Delete => "Delete",
            ActionKind::Merge => "Merge",
            ActionKind::Rename => "Rename",
            ActionKind::Reprocess => "Reprocessing",
        }
    }
}

#[derive(Debug, Default)]
struct ActionGuards {
    in_flight: HashSet<ActionKind>,
}

impl ActionGuards {
    fn begin(&mut self, kind: ActionKind) -> bool {
        self.in_flight.insert(kind)
    }

    fn end(&mut self, kind: ActionKind) {
        self.in_flight.remove(&kind);
    }

    fn is_busy(&self, kind: ActionKind) -> bool {
        self.in_flight.contains(&kind)
    }
}

/// Per-item result of a batch download.
#[derive(Debug)]
pub struct BatchOutcome {
    pub id: PhotoId,
    pub result: Result<PathBuf, ApiError>,
}

impl BatchOutcome {
    pub fn ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// What a rename call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    /// The trimmed name was empty or unchanged; no network call was made.
    Skipped,
}

/// Handle to the one-shot stats re-fetch scheduled after a reprocess.
///
/// The coordinator does not await the server job; it schedules exactly one
/// delayed stats fetch as a best-effort refresh. Await [`join`](Self::join)
/// and feed the result to [`GalleryCoordinator::apply_stats`], or drop the
/// handle to skip the refresh.
#[derive(Debug)]
pub struct StatsRefresh {
    handle: JoinHandle<ApiResult<AdminStats>>,
}

impl StatsRefresh {
    pub async fn join(self) -> ApiResult<AdminStats> {
        self.handle
            .await
            .map_err(|err| ApiError::Network(format!("stats refresh task failed: {err}")))?
    }
}

/// Orchestrates batch actions against the remote service for one view.
pub struct GalleryCoordinator {
    gateway: Arc<dyn RemoteService>,
    executor: TransferExecutor,
    config: ClientConfig,
    store: GalleryStore,
    notices: NoticeLog,
    guards: ActionGuards,
    on_auth_expired: Option<Box<dyn Fn() + Send + Sync>>,
}

impl std::fmt::Debug for GalleryCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryCoordinator")
            .field("store", &self.store)
            .field("guards", &self.guards)
            .finish()
    }
}

impl GalleryCoordinator {
    pub fn new(gateway: Arc<dyn RemoteService>, config: ClientConfig) -> Self {
        GalleryCoordinator {
            executor: TransferExecutor::new(Arc::clone(&gateway)),
            gateway,
            config,
            store: GalleryStore::new(),
            notices: NoticeLog::new(),
            guards: ActionGuards::default(),
            on_auth_expired: None,
        }
    }

    /// Install the handler invoked whenever a call fails with
    /// [`ApiError::AuthExpired`]. The coordinator itself never navigates or
    /// retries; it only reports.
    pub fn set_auth_expired_handler<F>(&mut self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_auth_expired = Some(Box::new(handler));
    }

    pub fn gateway(&self) -> &Arc<dyn RemoteService> {
        &self.gateway
    }

    pub fn store(&self) -> &GalleryStore {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_busy(&self, kind: ActionKind) -> bool {
        self.guards.is_busy(kind)
    }

    /// Remove and return all pending user notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn notices(&self) -> &NoticeLog {
        &self.notices
    }

    /// Run candidates through the validation gate and append the survivors
    /// to the queue. One notice per rejected file; rejections never block
    /// the rest of the batch. Returns the number of admitted files.
    pub fn enqueue_files(
        &mut self,
        queue: &mut UploadQueue,
        candidates: Vec<UploadCandidate>,
    ) -> usize {
        let outcome = validate::validate(candidates, &self.config);
        for rejected in &outcome.rejected {
            self.notices.push(Notice::error(format!(
                "{} {}.",
                rejected.candidate.file_name, rejected.reason
            )));
        }
        let admitted = outcome.accepted.len();
        queue.append(outcome.accepted);
        admitted
    }

    /// Flush the upload queue as one batch transfer and reconcile created
    /// entities into the store. Ignored (with a notice) while another flush
    /// is outstanding.
    pub async fn flush_uploads(
        &mut self,
        queue: &mut UploadQueue,
        on_progress: Option<ProgressFn>,
    ) -> ApiResult<Vec<Photo>> {
        if !self.guards.begin(ActionKind::UploadFlush) {
            self.notice_busy(ActionKind::UploadFlush);
            return Ok(Vec::new());
        }

        let result = self.executor.flush(queue, on_progress).await;
        self.guards.end(ActionKind::UploadFlush);

        match result {
            Ok(photos) => {
                self.store.insert_photos(photos.clone());
                self.notices.push(Notice::success(format!(
                    "Successfully uploaded {} photos",
                    photos.len()
                )));
                Ok(photos)
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Download each selected photo to `dest`, sequentially in selection
    /// order. Per-item failures are tolerated and reported individually;
    /// siblings keep going. A cancellation token stops the loop between
    /// items; completed outcomes are kept.
    pub async fn download_selected(
        &mut self,
        selection: &SelectionStore<PhotoId>,
        dest: &Path,
        cancel: Option<&CancellationToken>,
    ) -> ApiResult<Vec<BatchOutcome>> {
        if selection.is_empty() {
            let err = ApiError::Validation("no photos selected for download".into());
            self.report(&err);
            return Err(err);
        }
        if !self.guards.begin(ActionKind::Download) {
            self.notice_busy(ActionKind::Download);
            return Ok(Vec::new());
        }

        let ids: Vec<PhotoId> = selection.ids().to_vec();
        let total = ids.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut cancelled = false;

        for id in ids {
            if let Some(token) = cancel
                && token.is_cancelled()
            {
                cancelled = true;
                break;
            }

            let result = self.download_one(id, dest).await;
            if let Err(err) = &result {
                self.notices
                    .push(Notice::error(format!("Failed to download photo {id}: {err}")));
            }
            outcomes.push(BatchOutcome { id, result });
        }
        self.guards.end(ActionKind::Download);

        let succeeded = outcomes.iter().filter(|outcome| outcome.ok()).count();
        if cancelled {
            self.notices.push(Notice::info(format!(
                "Download cancelled after {succeeded} of {total} photos"
            )));
        } else {
            self.notices.push(Notice::success(format!(
                "Downloaded {succeeded} of {total} photos"
            )));
        }
        Ok(outcomes)
    }

    async fn download_one(&self, id: PhotoId, dest: &Path) -> Result<PathBuf, ApiError> {
        let bytes = self.gateway.fetch_photo_bytes(id).await?;
        let file_name = self
            .store
            .photo(id)
            .map(|photo| photo.original_filename.clone())
            .unwrap_or_else(|| format!("photo_{id}.jpg"));
        let target = dest.join(file_name);
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|err| ApiError::Io(format!("cannot write {}: {err}", target.display())))?;
        Ok(target)
    }

    /// Download an album's ZIP archive to `dest`. Guarded alongside the
    /// photo batch download; a second download while one is in flight is
    /// ignored with a notice.
    pub async fn download_album(
        &mut self,
        id: PersonId,
        dest: &Path,
    ) -> ApiResult<Option<PathBuf>> {
        if !self.guards.begin(ActionKind::Download) {
            self.notice_busy(ActionKind::Download);
            return Ok(None);
        }

        let result = self.gateway.fetch_album_archive(id).await;
        let written = match result {
            Ok(bytes) => {
                let name = self
                    .store
                    .album(id)
                    .map(|album| format!("{}.zip", album.name))
                    .unwrap_or_else(|| format!("album_{id}.zip"));
                let target = dest.join(name);
                tokio::fs::write(&target, &bytes).await.map_err(|err| {
                    ApiError::Io(format!("cannot write {}: {err}", target.display()))
                })
                .map(|()| target)
            }
            Err(err) => Err(err),
        };
        self.guards.end(ActionKind::Download);

        match written {
            Ok(target) => {
                self.notices
                    .push(Notice::success("Album downloaded successfully"));
                Ok(Some(target))
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Fetch one album with every photo its person appears in, folding those
    /// photos into the store.
    pub async fn album_detail(&mut self, id: PersonId) -> ApiResult<AlbumDetail> {
        match self.gateway.fetch_album_detail(id).await {
            Ok(detail) => {
                self.store.insert_photos(detail.photos.clone());
                Ok(detail)
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Probe service liveness. `Ok(false)` means unreachable, not broken;
    /// only non-transport failures surface as errors.
    pub async fn check_health(&mut self) -> ApiResult<bool> {
        match self.gateway.health_check().await {
            Ok(alive) => Ok(alive),
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Delete one photo remotely, then reconcile the store and the caller's
    /// active selection. On failure both are untouched.
    pub async fn delete_photo(
        &mut self,
        id: PhotoId,
        selection: &mut SelectionStore<PhotoId>,
    ) -> ApiResult<()> {
        if !self.guards.begin(ActionKind::Delete) {
            self.notice_busy(ActionKind::Delete);
            return Ok(());
        }

        let result = self.gateway.delete_photo(id).await;
        self.guards.end(ActionKind::Delete);

        match result {
            Ok(()) => {
                self.store.remove_photo(id);
                selection.remove(id);
                self.notices
                    .push(Notice::success("Photo deleted successfully"));
                Ok(())
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Merge the two selected albums. The surviving record's attributes are
    /// server-defined, so on success the album listing is invalidated and
    /// re-fetched wholesale rather than synthesized locally; the selection
    /// is then cleared. On failure selection and cache are untouched.
    pub async fn merge_albums(
        &mut self,
        selection: &mut SelectionStore<PersonId>,
    ) -> ApiResult<()> {
        let Some((first, second)) = selection.pair() else {
            let err = ApiError::Validation("select exactly 2 albums to merge".into());
            self.report(&err);
            return Err(err);
        };
        if !self.guards.begin(ActionKind::Merge) {
            self.notice_busy(ActionKind::Merge);
            return Ok(());
        }

        let result = self.gateway.merge_persons(first, second).await;

        match result {
            Ok(()) => {
                match self.gateway.list_albums().await {
                    Ok(albums) => self.store.replace_albums(albums),
                    Err(err) => {
                        // Merge committed server-side; drop the stale list
                        // rather than display attributes the server may have
                        // changed.
                        self.store.invalidate_albums();
                        warn!("[Actions] album refresh after merge failed: {err}");
                        self.notices.push(Notice::error(format!(
                            "Albums merged, but refreshing the list failed: {err}"
                        )));
                    }
                }
                selection.clear();
                self.guards.end(ActionKind::Merge);
                self.notices
                    .push(Notice::success("Successfully merged albums"));
                Ok(())
            }
            Err(err) => {
                self.guards.end(ActionKind::Merge);
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Rename an album. Short-circuits with zero network calls when the
    /// trimmed name is empty or unchanged. The edit is applied optimistically
    /// and rolled back if the remote call fails.
    pub async fn rename_album(&mut self, id: PersonId, new_name: &str) -> ApiResult<RenameOutcome> {
        let trimmed = new_name.trim();
        let Some(current) = self.store.album(id).map(|album| album.name.clone()) else {
            let err = ApiError::Validation(format!("unknown album {id}"));
            self.report(&err);
            return Err(err);
        };
        if trimmed.is_empty() || trimmed == current {
            return Ok(RenameOutcome::Skipped);
        }
        if !self.guards.begin(ActionKind::Rename) {
            self.notice_busy(ActionKind::Rename);
            return Ok(RenameOutcome::Skipped);
        }

        let previous = self
            .store
            .rename_album(id, trimmed)
            .unwrap_or_else(|| current.clone());

        let result = self.gateway.rename_person(id, trimmed).await;
        self.guards.end(ActionKind::Rename);

        match result {
            Ok(()) => {
                self.notices
                    .push(Notice::success("Album renamed successfully"));
                Ok(RenameOutcome::Renamed)
            }
            Err(err) => {
                self.store.rename_album(id, &previous);
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Trigger a full server-side reprocess. Destructive and system-wide, so
    /// the caller must pass `confirmed = true` after its own confirmation
    /// step; without it this is a validation failure with zero network
    /// calls. Completion is never awaited: on acceptance, exactly one stats
    /// re-fetch is scheduled after the configured delay as a best-effort
    /// refresh.
    pub async fn reprocess_all(&mut self, confirmed: bool) -> ApiResult<Option<StatsRefresh>> {
        if !confirmed {
            let err = ApiError::Validation("reprocessing requires explicit confirmation".into());
            self.report(&err);
            return Err(err);
        }
        if !self.guards.begin(ActionKind::Reprocess) {
            self.notice_busy(ActionKind::Reprocess);
            return Ok(None);
        }

        let result = self.gateway.trigger_reprocess().await;
        self.guards.end(ActionKind::Reprocess);

        match result {
            Ok(()) => {
                self.notices.push(Notice::success(
                    "Face reprocessing started. This may take a few minutes.",
                ));
                let gateway = Arc::clone(&self.gateway);
                let delay = self.config.stats_refresh_delay;
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    gateway.fetch_stats().await
                });
                info!(
                    "[Actions] scheduled stats refresh in {:?}",
                    self.config.stats_refresh_delay
                );
                Ok(Some(StatsRefresh { handle }))
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Fetch one page of photos into the store.
    pub async fn refresh_photos(&mut self, page: u32) -> ApiResult<PhotoPage> {
        let result = self.gateway.list_photos(page, self.config.page_size).await;
        match result {
            Ok(page) => {
                self.store.insert_photos(page.photos.clone());
                Ok(page)
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Re-fetch the album listing wholesale.
    pub async fn refresh_albums(&mut self) -> ApiResult<()> {
        match self.gateway.list_albums().await {
            Ok(albums) => {
                self.store.replace_albums(albums);
                Ok(())
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Re-fetch aggregate statistics.
    pub async fn refresh_stats(&mut self) -> ApiResult<()> {
        match self.gateway.fetch_stats().await {
            Ok(stats) => {
                self.store.apply_stats(stats);
                Ok(())
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Apply stats fetched out-of-band (e.g. from a [`StatsRefresh`]).
    pub fn apply_stats(&mut self, stats: AdminStats) {
        self.store.apply_stats(stats);
    }

    fn notice_busy(&mut self, kind: ActionKind) {
        info!("[Actions] ignoring {kind:?} while one is in flight");
        self.notices.push(Notice::info(format!(
            "{} already in progress",
            kind.label()
        )));
    }

    /// Funnel every failure through one place: log, notify, and hand
    /// credential expiry to the caller's handler.
    fn report(&mut self, err: &ApiError) {
        warn!("[Actions] {err}");
        if matches!(err, ApiError::AuthExpired)
            && let Some(handler) = &self.on_auth_expired
        {
            handler();
        }
        self.notices.push(Notice::error(err.to_string()));
    }

    #[cfg(test)]
    pub(crate) fn force_busy(&mut self, kind: ActionKind) {
        self.guards.begin(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::notice::Severity;
    use crate::selection::SelectionContext;
    use crate::testing::{StubFailure, StubRemoteService, sample_album, sample_photo};

    fn coordinator_with(stub: &Arc<StubRemoteService>) -> GalleryCoordinator {
        GalleryCoordinator::new(stub.clone(), ClientConfig::default())
    }

    #[tokio::test]
    async fn merge_with_wrong_selection_size_makes_no_network_call() {
        let stub = Arc::new(StubRemoteService::new());
        let mut coordinator = coordinator_with(&stub);
        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::merge());
        selection.toggle(PersonId(1), &mut notices);

        let err = coordinator.merge_albums(&mut selection).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(stub.call_count("merge_persons"), 0);
        assert_eq!(selection.len(), 1);
    }

    #[tokio::test]
    async fn merge_refetches_albums_and_clears_selection() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_album(sample_album(1, "Alice", 5));
        stub.push_album(sample_album(2, "Bob", 3));

        let mut coordinator = coordinator_with(&stub);
        coordinator.refresh_albums().await.expect("seed albums");

        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::merge());
        selection.toggle(PersonId(1), &mut notices);
        selection.toggle(PersonId(2), &mut notices);

        coordinator
            .merge_albums(&mut selection)
            .await
            .expect("merge succeeds");

        assert_eq!(stub.call_count("merge_persons"), 1);
        let (a, b) = stub.last_merge_pair().expect("merge recorded");
        assert!(matches!(
            (a, b),
            (PersonId(1), PersonId(2)) | (PersonId(2), PersonId(1))
        ));
        assert!(selection.is_empty());
        // Wholesale re-fetch: the merged-away album is gone locally.
        assert_eq!(coordinator.store().albums().len(), 1);
    }

    #[tokio::test]
    async fn merge_failure_leaves_selection_and_cache_untouched() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_album(sample_album(1, "Alice", 5));
        stub.push_album(sample_album(2, "Bob", 3));

        let mut coordinator = coordinator_with(&stub);
        coordinator.refresh_albums().await.expect("seed albums");

        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::merge());
        selection.toggle(PersonId(1), &mut notices);
        selection.toggle(PersonId(2), &mut notices);

        stub.queue_failure("merge_persons", StubFailure::Server);
        assert!(coordinator.merge_albums(&mut selection).await.is_err());

        assert_eq!(selection.len(), 2);
        assert_eq!(coordinator.store().albums().len(), 2);
    }

    #[tokio::test]
    async fn second_merge_while_busy_is_ignored_without_network_call() {
        let stub = Arc::new(StubRemoteService::new());
        let mut coordinator = coordinator_with(&stub);
        coordinator.force_busy(ActionKind::Merge);

        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::merge());
        selection.toggle(PersonId(1), &mut notices);
        selection.toggle(PersonId(2), &mut notices);

        let result = coordinator.merge_albums(&mut selection).await;
        assert!(result.is_ok());
        assert_eq!(stub.call_count("merge_persons"), 0);
        assert_eq!(selection.len(), 2);
    }

    #[tokio::test]
    async fn rename_to_current_name_skips_network() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_album(sample_album(1, "Alice", 5));
        let mut coordinator = coordinator_with(&stub);
        coordinator.refresh_albums().await.expect("seed albums");

        let outcome = coordinator
            .rename_album(PersonId(1), "  Alice ")
            .await
            .expect("skip");
        assert_eq!(outcome, RenameOutcome::Skipped);
        assert_eq!(stub.call_count("rename_person"), 0);
        assert_eq!(coordinator.store().album(PersonId(1)).unwrap().name, "Alice");
    }

    #[tokio::test]
    async fn rename_to_empty_name_skips_network() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_album(sample_album(1, "Alice", 5));
        let mut coordinator = coordinator_with(&stub);
        coordinator.refresh_albums().await.expect("seed albums");

        let outcome = coordinator
            .rename_album(PersonId(1), "   ")
            .await
            .expect("skip");
        assert_eq!(outcome, RenameOutcome::Skipped);
        assert_eq!(stub.call_count("rename_person"), 0);
    }

    #[tokio::test]
    async fn rename_failure_rolls_back_optimistic_edit() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_album(sample_album(1, "Alice", 5));
        let mut coordinator = coordinator_with(&stub);
        coordinator.refresh_albums().await.expect("seed albums");

        stub.queue_failure("rename_person", StubFailure::Network);
        assert!(coordinator.rename_album(PersonId(1), "Alicia").await.is_err());
        assert_eq!(coordinator.store().album(PersonId(1)).unwrap().name, "Alice");
    }

    #[tokio::test]
    async fn delete_failure_leaves_cache_and_selection_untouched() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_photo(sample_photo(42, "beach.jpg"));
        let mut coordinator = coordinator_with(&stub);
        coordinator.refresh_photos(1).await.expect("seed photos");

        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::download());
        selection.toggle(PhotoId(42), &mut notices);

        stub.queue_failure("delete_photo", StubFailure::Server);
        coordinator.drain_notices();
        assert!(coordinator
            .delete_photo(PhotoId(42), &mut selection)
            .await
            .is_err());

        assert!(coordinator.store().photo(PhotoId(42)).is_some());
        assert!(selection.contains(PhotoId(42)));
        let errors: Vec<Notice> = coordinator
            .drain_notices()
            .into_iter()
            .filter(|notice| notice.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn delete_success_reconciles_cache_and_selection() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_photo(sample_photo(42, "beach.jpg"));
        let mut coordinator = coordinator_with(&stub);
        coordinator.refresh_photos(1).await.expect("seed photos");

        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::download());
        selection.toggle(PhotoId(42), &mut notices);

        coordinator
            .delete_photo(PhotoId(42), &mut selection)
            .await
            .expect("delete succeeds");
        assert!(coordinator.store().photo(PhotoId(42)).is_none());
        assert!(!selection.contains(PhotoId(42)));
    }

    #[tokio::test]
    async fn download_is_sequential_best_effort_per_item() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_photo(sample_photo(1, "a.jpg"));
        stub.push_photo(sample_photo(2, "b.jpg"));
        stub.push_photo(sample_photo(3, "c.jpg"));
        stub.set_photo_bytes(PhotoId(1), b"one".to_vec());
        // Photo 2 has no bytes registered: the stub serves NotFound for it.
        stub.set_photo_bytes(PhotoId(3), b"three".to_vec());

        let mut coordinator = coordinator_with(&stub);
        coordinator.refresh_photos(1).await.expect("seed photos");

        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::download());
        selection.toggle(PhotoId(1), &mut notices);
        selection.toggle(PhotoId(2), &mut notices);
        selection.toggle(PhotoId(3), &mut notices);

        let dest = tempfile::tempdir().expect("dest dir");
        let outcomes = coordinator
            .download_selected(&selection, dest.path(), None)
            .await
            .expect("batch completes");

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].ok());
        assert!(!outcomes[1].ok());
        assert!(outcomes[2].ok());
        assert!(dest.path().join("a.jpg").exists());
        assert!(dest.path().join("c.jpg").exists());
    }

    #[tokio::test]
    async fn download_with_empty_selection_is_validation_error() {
        let stub = Arc::new(StubRemoteService::new());
        let mut coordinator = coordinator_with(&stub);
        let selection: SelectionStore<PhotoId> =
            SelectionStore::new(SelectionContext::download());

        let dest = tempfile::tempdir().expect("dest dir");
        let err = coordinator
            .download_selected(&selection, dest.path(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(stub.call_count("fetch_photo_bytes"), 0);
    }

    #[tokio::test]
    async fn cancelled_download_stops_between_items() {
        let stub = Arc::new(StubRemoteService::new());
        for id in 1..=3 {
            stub.push_photo(sample_photo(id, &format!("{id}.jpg")));
            stub.set_photo_bytes(PhotoId(id), vec![0u8; 4]);
        }
        let mut coordinator = coordinator_with(&stub);
        coordinator.refresh_photos(1).await.expect("seed photos");

        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::download());
        for id in 1..=3 {
            selection.toggle(PhotoId(id), &mut notices);
        }

        let token = CancellationToken::new();
        token.cancel();

        let dest = tempfile::tempdir().expect("dest dir");
        let outcomes = coordinator
            .download_selected(&selection, dest.path(), Some(&token))
            .await
            .expect("batch returns");
        assert!(outcomes.is_empty());
        assert_eq!(stub.call_count("fetch_photo_bytes"), 0);
    }

    #[tokio::test]
    async fn reprocess_without_confirmation_makes_no_network_call() {
        let stub = Arc::new(StubRemoteService::new());
        let mut coordinator = coordinator_with(&stub);

        let err = coordinator.reprocess_all(false).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(stub.call_count("trigger_reprocess"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reprocess_schedules_exactly_one_delayed_stats_refresh() {
        let stub = Arc::new(StubRemoteService::new());
        let mut coordinator = coordinator_with(&stub);

        let refresh = coordinator
            .reprocess_all(true)
            .await
            .expect("reprocess accepted")
            .expect("refresh scheduled");
        assert_eq!(stub.call_count("trigger_reprocess"), 1);
        assert_eq!(stub.call_count("fetch_stats"), 0);

        let stats = refresh.join().await.expect("stats fetched");
        coordinator.apply_stats(stats);
        assert_eq!(stub.call_count("fetch_stats"), 1);
        assert!(coordinator.store().stats().is_some());
    }

    #[tokio::test]
    async fn auth_expiry_fires_the_caller_handler_once() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_album(sample_album(1, "Alice", 2));
        let mut coordinator = coordinator_with(&stub);

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        coordinator.set_auth_expired_handler(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        stub.queue_failure("list_albums", StubFailure::AuthExpired);
        assert!(matches!(
            coordinator.refresh_albums().await.unwrap_err(),
            ApiError::AuthExpired
        ));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upload_flush_reconciles_created_entities_into_store() {
        let stub = Arc::new(StubRemoteService::new());
        let mut coordinator = coordinator_with(&stub);
        let mut queue = UploadQueue::new();
        coordinator.enqueue_files(
            &mut queue,
            vec![UploadCandidate {
                path: "/nonexistent/a.jpg".into(),
                file_name: "a.jpg".into(),
                size_bytes: 1024,
            }],
        );

        let photos = coordinator
            .flush_uploads(&mut queue, None)
            .await
            .expect("flush succeeds");
        assert_eq!(photos.len(), 1);
        assert_eq!(coordinator.store().photo_count(), 1);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn album_detail_folds_photos_into_store() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_album(sample_album(1, "Alice", 2));
        stub.push_photo(sample_photo(10, "a.jpg"));
        stub.push_photo(sample_photo(11, "b.jpg"));
        let mut coordinator = coordinator_with(&stub);

        let detail = coordinator
            .album_detail(PersonId(1))
            .await
            .expect("detail fetched");
        assert_eq!(detail.person.name, "Alice");
        assert_eq!(stub.call_count("fetch_album_detail"), 1);
        assert_eq!(coordinator.store().photo_count(), 2);
    }

    #[tokio::test]
    async fn album_detail_for_unknown_album_is_not_found() {
        let stub = Arc::new(StubRemoteService::new());
        let mut coordinator = coordinator_with(&stub);

        let err = coordinator.album_detail(PersonId(9)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn download_album_writes_the_archive() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_album(sample_album(1, "Alice", 2));
        let mut coordinator = coordinator_with(&stub);
        coordinator.refresh_albums().await.expect("seed albums");

        let dest = tempfile::tempdir().expect("dest dir");
        let target = coordinator
            .download_album(PersonId(1), dest.path())
            .await
            .expect("archive written")
            .expect("not busy");

        assert_eq!(target, dest.path().join("Alice.zip"));
        assert!(target.exists());
        assert_eq!(stub.call_count("fetch_album_archive"), 1);
    }

    #[tokio::test]
    async fn download_album_while_busy_is_ignored() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_album(sample_album(1, "Alice", 2));
        let mut coordinator = coordinator_with(&stub);
        coordinator.force_busy(ActionKind::Download);

        let dest = tempfile::tempdir().expect("dest dir");
        let outcome = coordinator
            .download_album(PersonId(1), dest.path())
            .await
            .expect("ignored, not an error");
        assert!(outcome.is_none());
        assert_eq!(stub.call_count("fetch_album_archive"), 0);
    }

    #[tokio::test]
    async fn download_write_failure_is_local_io_not_network() {
        let stub = Arc::new(StubRemoteService::new());
        stub.push_photo(sample_photo(1, "a.jpg"));
        stub.set_photo_bytes(PhotoId(1), b"bytes".to_vec());
        let mut coordinator = coordinator_with(&stub);
        coordinator.refresh_photos(1).await.expect("seed photos");

        let mut notices = NoticeLog::new();
        let mut selection = SelectionStore::new(SelectionContext::download());
        selection.toggle(PhotoId(1), &mut notices);

        let outcomes = coordinator
            .download_selected(&selection, Path::new("/nonexistent/dest"), None)
            .await
            .expect("batch completes");
        assert!(matches!(
            outcomes[0].result,
            Err(ApiError::Io(_))
        ));
    }

    #[tokio::test]
    async fn health_check_passes_liveness_through() {
        let stub = Arc::new(StubRemoteService::new());
        let mut coordinator = coordinator_with(&stub);

        assert!(coordinator.check_health().await.expect("probe runs"));
        assert_eq!(stub.call_count("health_check"), 1);

        stub.queue_failure("health_check", StubFailure::AuthExpired);
        assert!(matches!(
            coordinator.check_health().await.unwrap_err(),
            ApiError::AuthExpired
        ));
    }

    #[tokio::test]
    async fn enqueue_reports_one_notice_per_rejection() {
        let stub = Arc::new(StubRemoteService::new());
        let mut coordinator = coordinator_with(&stub);
        let mut queue = UploadQueue::new();

        let admitted = coordinator.enqueue_files(
            &mut queue,
            vec![
                UploadCandidate {
                    path: "/nonexistent/a.jpg".into(),
                    file_name: "a.jpg".into(),
                    size_bytes: 2 * 1024 * 1024,
                },
                UploadCandidate {
                    path: "/nonexistent/huge.jpg".into(),
                    file_name: "huge.jpg".into(),
                    size_bytes: 20 * 1024 * 1024,
                },
                UploadCandidate {
                    path: "/nonexistent/clip.gif".into(),
                    file_name: "clip.gif".into(),
                    size_bytes: 1024,
                },
            ],
        );

        assert_eq!(admitted, 1);
        assert_eq!(queue.len(), 1);
        let errors: Vec<Notice> = coordinator
            .drain_notices()
            .into_iter()
            .filter(|notice| notice.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 2);
    }
}
