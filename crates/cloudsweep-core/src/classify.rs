//! Provider failure classification
//!
//! Discovery runs many concurrent requests against the same account, so rate
//! limiting is expected. Listings also race with deletions: a detail call may
//! hit a resource that vanished after its parent listing. Every provider error
//! is sorted into one of three buckets before the coordinator decides what to
//! do with the failed task.

use std::fmt;

/// What the coordinator does with a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The resource disappeared mid-scan. Drop the task and continue.
    Ignorable,
    /// Provider back-pressure. Requeue the task, bounded by `max_retries`.
    Retryable,
    /// Anything else. Abort the whole scan.
    Fatal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Ignorable => write!(f, "ignorable"),
            ErrorClass::Retryable => write!(f, "retryable"),
            ErrorClass::Fatal => write!(f, "fatal"),
        }
    }
}

/// Implemented by provider error types.
pub trait Classify {
    fn classify(&self) -> ErrorClass;
}

/// Classification from an HTTP status code alone.
///
/// 404 is ignorable, 429 is retryable, everything else is fatal.
pub fn classify_status(status: u16) -> ErrorClass {
    match status {
        404 => ErrorClass::Ignorable,
        429 => ErrorClass::Retryable,
        _ => ErrorClass::Fatal,
    }
}
