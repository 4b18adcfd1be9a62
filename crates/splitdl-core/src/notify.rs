//! Events flowing from workers to the coordinator, and from the coordinator
//! to whoever presents progress.

use std::fmt;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Informational status line.
    Progress,
    /// A segment (or the whole job) finished.
    Success,
    /// A segment (or the whole job) failed.
    Abort,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationKind::Progress => "progress",
            NotificationKind::Success => "success",
            NotificationKind::Abort => "abort",
        };
        f.write_str(s)
    }
}

/// A kind plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn progress(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Progress, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn abort(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Abort, message)
    }

    pub fn is_abort(&self) -> bool {
        self.kind == NotificationKind::Abort
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
