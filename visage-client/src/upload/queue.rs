//! Upload queue: ordered pending transfers with per-item status.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use log::debug;
use tempfile::NamedTempFile;

use crate::upload::validate::UploadCandidate;

/// Lifecycle of one queued transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Pending,
    Uploading,
    Success,
    Error,
}

/// An ephemeral local preview of a queued file.
///
/// Owned by the [`TransferItem`]; the backing temp file is deleted when the
/// item leaves the queue, not at some later collection point.
#[derive(Debug)]
pub struct PreviewHandle {
    file: NamedTempFile,
}

impl PreviewHandle {
    /// Copy the source bytes into a temp file the UI can display from.
    pub fn capture(source: &Path) -> io::Result<Self> {
        let file = NamedTempFile::new()?;
        std::fs::copy(source, file.path())?;
        Ok(PreviewHandle { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// One queued file transfer.
///
/// Created when a file passes the validation gate. The status and progress
/// fields are written only by the transfer executor during a flush.
#[derive(Debug)]
pub struct TransferItem {
    pub id: u64,
    pub file_name: String,
    pub source: PathBuf,
    pub size_bytes: u64,
    pub status: TransferStatus,
    pub progress_percent: u8,
    pub error_detail: Option<String>,
    pub preview: Option<PreviewHandle>,
}

/// Ordered collection of pending transfers.
///
/// Insertion order is preserved; item ids are unique and minted here. While a
/// flush is in progress the queue is read-only to external callers: `remove`
/// and `clear` become silent no-ops until the flush resolves.
#[derive(Debug)]
pub struct UploadQueue {
    items: Vec<TransferItem>,
    next_id: u64,
    flushing: bool,
    aggregate: Arc<AtomicU8>,
}

impl Default for UploadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadQueue {
    pub fn new() -> Self {
        UploadQueue {
            items: Vec::new(),
            next_id: 1,
            flushing: false,
            aggregate: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Append validated candidates in arrival order, tagged pending. No
    /// deduplication by content or path is performed. Returns the ids minted
    /// for the new items.
    pub fn append(&mut self, accepted: Vec<UploadCandidate>) -> Vec<u64> {
        let mut ids = Vec::with_capacity(accepted.len());
        for candidate in accepted {
            let id = self.next_id;
            self.next_id += 1;

            let preview = match PreviewHandle::capture(&candidate.path) {
                Ok(preview) => Some(preview),
                Err(err) => {
                    debug!(
                        "[Queue] no preview for {}: {err}",
                        candidate.path.display()
                    );
                    None
                }
            };

            self.items.push(TransferItem {
                id,
                file_name: candidate.file_name,
                source: candidate.path,
                size_bytes: candidate.size_bytes,
                status: TransferStatus::Pending,
                progress_percent: 0,
                error_detail: None,
                preview,
            });
            ids.push(id);
        }
        ids
    }

    /// Remove a single item. Silent no-op when the id is unknown or a flush
    /// is in progress.
    pub fn remove(&mut self, id: u64) -> bool {
        if self.flushing {
            debug!("[Queue] ignoring remove({id}) during flush");
            return false;
        }
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Empty the queue and reset aggregate progress. No-op mid-flush.
    pub fn clear(&mut self) {
        if self.flushing {
            debug!("[Queue] ignoring clear during flush");
            return;
        }
        self.items.clear();
        self.aggregate.store(0, Ordering::Relaxed);
    }

    pub fn items(&self) -> &[TransferItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_flushing(&self) -> bool {
        self.flushing
    }

    /// Aggregate transfer percentage across the whole batch.
    pub fn progress_percent(&self) -> u8 {
        self.aggregate.load(Ordering::Relaxed)
    }

    pub(crate) fn items_mut(&mut self) -> &mut [TransferItem] {
        &mut self.items
    }

    /// Mark the queue read-only for the duration of a flush. Returns false
    /// if a flush is already marked.
    pub(crate) fn begin_flush(&mut self) -> bool {
        if self.flushing {
            return false;
        }
        self.flushing = true;
        self.aggregate.store(0, Ordering::Relaxed);
        true
    }

    pub(crate) fn finish_flush(&mut self) {
        self.flushing = false;
    }

    pub(crate) fn progress_cell(&self) -> Arc<AtomicU8> {
        Arc::clone(&self.aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn candidate(name: &str, size_bytes: u64) -> UploadCandidate {
        UploadCandidate {
            path: PathBuf::from(format!("/nonexistent/{name}")),
            file_name: name.to_string(),
            size_bytes,
        }
    }

    #[test]
    fn append_preserves_order_and_mints_unique_ids() {
        let mut queue = UploadQueue::new();
        let ids = queue.append(vec![candidate("a.jpg", 1), candidate("b.jpg", 2)]);
        let more = queue.append(vec![candidate("c.jpg", 3)]);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.items()[0].file_name, "a.jpg");
        assert_eq!(queue.items()[2].file_name, "c.jpg");

        let mut all = ids;
        all.extend(more);
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn remove_is_silent_noop_for_unknown_id() {
        let mut queue = UploadQueue::new();
        queue.append(vec![candidate("a.jpg", 1)]);
        assert!(!queue.remove(999));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn queue_is_read_only_mid_flush() {
        let mut queue = UploadQueue::new();
        let ids = queue.append(vec![candidate("a.jpg", 1), candidate("b.jpg", 2)]);

        assert!(queue.begin_flush());
        assert!(!queue.begin_flush());
        assert!(!queue.remove(ids[0]));
        queue.clear();
        assert_eq!(queue.len(), 2);

        queue.finish_flush();
        assert!(queue.remove(ids[0]));
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_resets_aggregate_progress() {
        let mut queue = UploadQueue::new();
        queue.append(vec![candidate("a.jpg", 1)]);
        queue.progress_cell().store(80, Ordering::Relaxed);

        queue.clear();
        assert_eq!(queue.progress_percent(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn preview_is_released_when_item_leaves_the_queue() {
        let mut source = NamedTempFile::new().expect("temp source");
        source.write_all(b"not really a jpeg").expect("write");

        let mut queue = UploadQueue::new();
        let ids = queue.append(vec![UploadCandidate {
            path: source.path().to_path_buf(),
            file_name: "a.jpg".to_string(),
            size_bytes: 17,
        }]);

        let preview_path = queue.items()[0]
            .preview
            .as_ref()
            .expect("preview captured")
            .path()
            .to_path_buf();
        assert!(preview_path.exists());

        assert!(queue.remove(ids[0]));
        assert!(!preview_path.exists());
    }
}
