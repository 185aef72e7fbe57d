//! Upload pipeline: validation gate, queue, and transfer executor.
//!
//! Candidates enter through [`validate`](validate::validate), admitted files
//! accumulate in an [`UploadQueue`](queue::UploadQueue), and
//! [`TransferExecutor`](transfer::TransferExecutor) drains the queue as one
//! all-or-nothing batch transfer.

pub mod queue;
pub mod transfer;
pub mod validate;

pub use queue::{TransferItem, TransferStatus, UploadQueue};
pub use transfer::TransferExecutor;
pub use validate::{RejectReason, RejectedFile, UploadCandidate, ValidationOutcome, validate};
