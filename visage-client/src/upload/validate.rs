//! Validation gate for upload candidates.
//!
//! One pass over the candidate list, partitioning it into accepted files and
//! rejections. Every input lands in exactly one of the two lists; a rejection
//! never blocks the files after it. The predicate mirrors the service's own
//! admission rules so a locally rejected file would have been refused
//! remotely anyway.

use std::io;
use std::path::{Path, PathBuf};

use crate::config::ClientConfig;

/// A file offered for upload, before admission.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
}

impl UploadCandidate {
    /// Build a candidate from a path, taking the size from the filesystem.
    pub fn from_path(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(UploadCandidate {
            path,
            file_name,
            size_bytes: metadata.len(),
        })
    }
}

/// Why a candidate was refused admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidType,
    TooLarge,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::InvalidType => write!(f, "is not a supported image type"),
            RejectReason::TooLarge => write!(f, "exceeds the per-file size limit"),
        }
    }
}

/// A refused candidate together with its reason tag.
#[derive(Debug, Clone)]
pub struct RejectedFile {
    pub candidate: UploadCandidate,
    pub reason: RejectReason,
}

/// Result of one validation pass.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub accepted: Vec<UploadCandidate>,
    pub rejected: Vec<RejectedFile>,
}

/// Partition `candidates` by the admission predicate: extension in the
/// configured allow-list and size within the per-file cap.
pub fn validate(candidates: Vec<UploadCandidate>, config: &ClientConfig) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    for candidate in candidates {
        if !has_allowed_extension(&candidate.path, &config.allowed_extensions) {
            outcome.rejected.push(RejectedFile {
                candidate,
                reason: RejectReason::InvalidType,
            });
        } else if candidate.size_bytes > config.max_file_bytes {
            outcome.rejected.push(RejectedFile {
                candidate,
                reason: RejectReason::TooLarge,
            });
        } else {
            outcome.accepted.push(candidate);
        }
    }

    outcome
}

fn has_allowed_extension(path: &Path, allowed: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            allowed
                .iter()
                .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
        })
        .unwrap_or(false)
}
