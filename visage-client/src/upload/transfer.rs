//! Transfer executor: drains the upload queue as one batch transfer.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use log::{info, warn};

use visage_model::Photo;

use crate::error::{ApiError, ApiResult};
use crate::gateway::{ProgressFn, RemoteService, TransferProgress, UploadFile};
use crate::upload::queue::{TransferStatus, UploadQueue};

/// Submits queued items as a single batch operation.
///
/// All-or-nothing by contract: the batch is one round trip, progress is one
/// aggregate percentage (bytes sent over total bytes queued, monotonically
/// non-decreasing), and any failure fails the whole batch. There is no
/// partial-success state; on failure the queue keeps its items, in order,
/// for the caller to retry or clear.
pub struct TransferExecutor {
    gateway: Arc<dyn RemoteService>,
}

impl std::fmt::Debug for TransferExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferExecutor").finish()
    }
}

impl TransferExecutor {
    pub fn new(gateway: Arc<dyn RemoteService>) -> Self {
        TransferExecutor { gateway }
    }

    /// Flush every queued item in one batch upload.
    ///
    /// Fails immediately with a validation error when the queue is empty. On
    /// success the queue is cleared and the created entities are returned;
    /// on any failure every item is tagged with the shared error detail and
    /// queue membership and order are left untouched.
    pub async fn flush(
        &self,
        queue: &mut UploadQueue,
        on_progress: Option<ProgressFn>,
    ) -> ApiResult<Vec<Photo>> {
        if queue.is_empty() {
            return Err(ApiError::Validation("upload queue is empty".into()));
        }
        if !queue.begin_flush() {
            return Err(ApiError::Validation(
                "an upload flush is already in progress".into(),
            ));
        }

        for item in queue.items_mut() {
            item.status = TransferStatus::Uploading;
            item.progress_percent = 0;
            item.error_detail = None;
        }

        let files: Vec<UploadFile> = queue
            .items()
            .iter()
            .map(|item| UploadFile {
                file_name: item.file_name.clone(),
                path: item.source.clone(),
                size_bytes: item.size_bytes,
            })
            .collect();

        // Clamp the reported percentage to non-decreasing; callers only see
        // strict increases.
        let cell = queue.progress_cell();
        let caller = on_progress;
        let wrapped: ProgressFn = Arc::new(move |progress: TransferProgress| {
            let percent = progress.percent();
            let previous = cell.fetch_max(percent, Ordering::Relaxed);
            if percent > previous
                && let Some(callback) = &caller
            {
                callback(progress);
            }
        });

        info!("[Transfer] flushing {} queued items", files.len());
        match self.gateway.upload_photos(&files, Some(wrapped)).await {
            Ok(photos) => {
                for item in queue.items_mut() {
                    item.status = TransferStatus::Success;
                    item.progress_percent = 100;
                }
                queue.finish_flush();
                queue.clear();
                info!("[Transfer] batch succeeded, {} entities created", photos.len());
                Ok(photos)
            }
            Err(err) => {
                let detail = err.to_string();
                for item in queue.items_mut() {
                    item.status = TransferStatus::Error;
                    item.error_detail = Some(detail.clone());
                }
                queue.finish_flush();
                warn!("[Transfer] batch failed: {detail}");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use crate::testing::{StubFailure, StubRemoteService};
    use crate::upload::validate::UploadCandidate;

    fn queued(queue: &mut UploadQueue, name: &str, size_bytes: u64) {
        queue.append(vec![UploadCandidate {
            path: PathBuf::from(format!("/nonexistent/{name}")),
            file_name: name.to_string(),
            size_bytes,
        }]);
    }

    #[tokio::test]
    async fn empty_queue_fails_without_network_call() {
        let stub = Arc::new(StubRemoteService::new());
        let executor = TransferExecutor::new(stub.clone());
        let mut queue = UploadQueue::new();

        let err = executor.flush(&mut queue, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(stub.call_count("upload_photos"), 0);
    }

    #[tokio::test]
    async fn successful_flush_clears_queue_and_reports_monotonic_progress() {
        let stub = Arc::new(StubRemoteService::new());
        let executor = TransferExecutor::new(stub.clone());
        let mut queue = UploadQueue::new();
        queued(&mut queue, "a.jpg", 2 * 1024 * 1024);
        queued(&mut queue, "b.jpg", 3 * 1024 * 1024);
        queued(&mut queue, "c.png", 1024 * 1024);

        let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let photos = executor
            .flush(
                &mut queue,
                Some(Arc::new(move |p: TransferProgress| {
                    sink.lock().expect("progress lock").push(p.percent());
                })),
            )
            .await
            .expect("flush succeeds");

        assert_eq!(photos.len(), 3);
        assert!(queue.is_empty());
        assert!(!queue.is_flushing());
        assert_eq!(queue.progress_percent(), 0);

        let seen = seen.lock().expect("progress lock");
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(*seen.last().expect("at least one report"), 100);
    }

    #[tokio::test]
    async fn failed_flush_keeps_items_and_tags_error() {
        let stub = Arc::new(StubRemoteService::new());
        stub.queue_failure("upload_photos", StubFailure::Server);
        let executor = TransferExecutor::new(stub.clone());
        let mut queue = UploadQueue::new();
        queued(&mut queue, "a.jpg", 100);
        queued(&mut queue, "b.jpg", 200);

        let err = executor.flush(&mut queue, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Server { .. }));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.items()[0].file_name, "a.jpg");
        assert_eq!(queue.items()[0].status, TransferStatus::Error);
        assert!(queue.items()[0].error_detail.is_some());
        assert!(!queue.is_flushing());
    }

    #[tokio::test]
    async fn failed_flush_can_be_retried() {
        let stub = Arc::new(StubRemoteService::new());
        stub.queue_failure("upload_photos", StubFailure::Network);
        let executor = TransferExecutor::new(stub.clone());
        let mut queue = UploadQueue::new();
        queued(&mut queue, "a.jpg", 100);

        assert!(executor.flush(&mut queue, None).await.is_err());
        let photos = executor
            .flush(&mut queue, None)
            .await
            .expect("retry succeeds");
        assert_eq!(photos.len(), 1);
        assert!(queue.is_empty());
        assert_eq!(stub.call_count("upload_photos"), 2);
    }
}
