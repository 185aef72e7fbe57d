//! Client orchestration core for the Visage photo gallery.
//!
//! Everything between the UI and the wire: the upload pipeline (validation
//! gate, queue, batch transfer executor), per-view selection with
//! action-specific caps, the batch action coordinator with its re-entrancy
//! guards, a local mirror of server-known entities, and the
//! [`RemoteService`](gateway::RemoteService) gateway the whole core talks
//! through. Rendering, routing, persistence, and authentication flows live
//! elsewhere; credential expiry surfaces here only as a typed error handed
//! to the host's handler.

pub mod actions;
pub mod config;
pub mod error;
pub mod gateway;
pub mod notice;
pub mod selection;
pub mod store;
pub mod testing;
pub mod upload;

pub use actions::{ActionKind, BatchOutcome, GalleryCoordinator, RenameOutcome, StatsRefresh};
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult, ErrorKind};
pub use gateway::{HttpRemoteService, ProgressFn, RemoteService, TransferProgress, UploadFile};
pub use notice::{Notice, NoticeLog, Severity};
pub use selection::{SelectionContext, SelectionStore, ToggleOutcome};
pub use store::GalleryStore;
pub use upload::queue::{TransferItem, TransferStatus, UploadQueue};
pub use upload::transfer::TransferExecutor;
pub use upload::validate::{RejectReason, RejectedFile, UploadCandidate, ValidationOutcome, validate};
