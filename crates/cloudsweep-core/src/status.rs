//! Resource status taxonomy
//!
//! Providers report free-form status strings. The raw value is kept as-is so
//! nothing is lost, and mapped on demand onto a small closed set and a coarse
//! display category. Unrecognised values degrade to `Unknown`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw status string as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(String);

impl Status {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> StatusKind {
        StatusKind::parse(&self.0)
    }

    pub fn category(&self) -> StatusCategory {
        self.kind().category()
    }

    /// True once a job run can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind(),
            StatusKind::Succeeded | StatusKind::Failed | StatusKind::Canceled
        )
    }
}

impl From<StatusKind> for Status {
    fn from(kind: StatusKind) -> Self {
        Self(kind.to_string())
    }
}

impl From<&str> for Status {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recognised status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Active,
    Ready,
    Running,
    Pending,
    Queued,
    Succeeded,
    Failed,
    Canceled,
    Error,
    Deleted,
    Unknown,
}

impl StatusKind {
    /// Case-insensitive parse. Anything unrecognised is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => StatusKind::Active,
            "ready" => StatusKind::Ready,
            "running" => StatusKind::Running,
            "pending" => StatusKind::Pending,
            "queued" => StatusKind::Queued,
            "succeeded" => StatusKind::Succeeded,
            "failed" => StatusKind::Failed,
            // both spellings show up across provider APIs
            "canceled" | "cancelled" => StatusKind::Canceled,
            "error" => StatusKind::Error,
            "deleted" => StatusKind::Deleted,
            _ => StatusKind::Unknown,
        }
    }

    pub fn category(self) -> StatusCategory {
        match self {
            StatusKind::Active | StatusKind::Ready | StatusKind::Running | StatusKind::Succeeded => {
                StatusCategory::Healthy
            }
            StatusKind::Pending | StatusKind::Queued => StatusCategory::InProgress,
            StatusKind::Error | StatusKind::Failed => StatusCategory::Failed,
            StatusKind::Deleted | StatusKind::Canceled => StatusCategory::Gone,
            StatusKind::Unknown => StatusCategory::Unknown,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Active => write!(f, "active"),
            StatusKind::Ready => write!(f, "ready"),
            StatusKind::Running => write!(f, "running"),
            StatusKind::Pending => write!(f, "pending"),
            StatusKind::Queued => write!(f, "queued"),
            StatusKind::Succeeded => write!(f, "succeeded"),
            StatusKind::Failed => write!(f, "failed"),
            StatusKind::Canceled => write!(f, "canceled"),
            StatusKind::Error => write!(f, "error"),
            StatusKind::Deleted => write!(f, "deleted"),
            StatusKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Coarse grouping used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    Healthy,
    InProgress,
    Failed,
    Gone,
    Unknown,
}

impl StatusCategory {
    pub fn symbol(self) -> char {
        match self {
            StatusCategory::Healthy => '✅',
            StatusCategory::InProgress => '🕒',
            StatusCategory::Failed => '❌',
            StatusCategory::Gone => '🧹',
            StatusCategory::Unknown => '❔',
        }
    }
}
