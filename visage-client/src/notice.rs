//! User-facing notices.
//!
//! The original UI surfaced every outcome as a dismissible toast. This core
//! keeps the same contract without owning any rendering: operations push
//! [`Notice`] values into a [`NoticeLog`] and the consuming view drains them
//! whenever it likes.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// One dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Notice {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// FIFO buffer of notices awaiting display.
#[derive(Debug, Default)]
pub struct NoticeLog {
    entries: VecDeque<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) {
        log::debug!("[Notice] {:?}: {}", notice.severity, notice.message);
        self.entries.push_back(notice);
    }

    /// Remove and return all pending notices, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.entries.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
