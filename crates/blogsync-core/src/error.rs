//! Error types module
//!
//! Every public operation either returns its documented result or fails with a
//! `StoreError`. The coarse classification callers branch on is `ErrorKind`;
//! the variants carry the remote-provided detail where one was available.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected outcomes like a missing path
    Debug,
    /// Warning level - for conditions the caller is expected to resolve
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Failure classification shared by all operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Path absent on the remote branch.
    NotFound,
    /// Revision mismatch on write. Never retried or merged automatically.
    Conflict,
    /// Remote-side validation, auth or other failure.
    Rejected,
    /// Timeout or connection failure. Safe for the caller to retry.
    TransientNetwork,
    /// Input that cannot be represented in the transport encoding.
    EncodingFailure,
    /// Invalid client configuration, raised before any request is made.
    Config,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Rejected => "rejected",
            ErrorKind::TransientNetwork => "transient_network",
            ErrorKind::EncodingFailure => "encoding_failure",
            ErrorKind::Config => "config",
        };
        f.write_str(name)
    }
}

/// Metadata describing how an error should be reported to a user or a log.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "REVISION_CONFLICT")
    fn error_code(&self) -> &'static str;

    /// Whether repeating the same call may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the caller
    fn suggested_action(&self) -> Option<&'static str>;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict on {path}: {message}")]
    Conflict { path: String, message: String },

    #[error("Rejected by remote (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    TransientNetwork(String),

    #[error("Encoding failure: {0}")]
    EncodingFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for content store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::Rejected { .. } => ErrorKind::Rejected,
            StoreError::TransientNetwork(_) => ErrorKind::TransientNetwork,
            StoreError::EncodingFailure(_) => ErrorKind::EncodingFailure,
            StoreError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Rewrap a failure with operation-specific wording, keeping its kind.
    pub fn with_prefix(self, prefix: &str) -> Self {
        match self {
            StoreError::NotFound(m) => StoreError::NotFound(format!("{}: {}", prefix, m)),
            StoreError::Conflict { path, message } => StoreError::Conflict {
                path,
                message: format!("{}: {}", prefix, message),
            },
            StoreError::Rejected { status, message } => StoreError::Rejected {
                status,
                message: format!("{}: {}", prefix, message),
            },
            StoreError::TransientNetwork(m) => {
                StoreError::TransientNetwork(format!("{}: {}", prefix, m))
            }
            StoreError::EncodingFailure(m) => {
                StoreError::EncodingFailure(format!("{}: {}", prefix, m))
            }
            StoreError::Config(m) => StoreError::Config(format!("{}: {}", prefix, m)),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::EncodingFailure(format!("JSON error: {}", err))
    }
}

/// Static metadata for each kind: (error_code, recoverable, suggested_action, log_level).
fn kind_static_metadata(kind: ErrorKind) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match kind {
        ErrorKind::NotFound => (
            "NOT_FOUND",
            false,
            Some("Verify the path exists on the configured branch"),
            LogLevel::Debug,
        ),
        ErrorKind::Conflict => (
            "REVISION_CONFLICT",
            false,
            Some("Reload the document, reapply the edit and save again"),
            LogLevel::Warn,
        ),
        ErrorKind::Rejected => (
            "REMOTE_REJECTED",
            false,
            Some("Check the access token and the request content"),
            LogLevel::Error,
        ),
        ErrorKind::TransientNetwork => (
            "TRANSIENT_NETWORK",
            true,
            Some("Retry after a short delay"),
            LogLevel::Warn,
        ),
        ErrorKind::EncodingFailure => (
            "ENCODING_FAILURE",
            false,
            Some("Check the path and content for invalid characters"),
            LogLevel::Debug,
        ),
        ErrorKind::Config => (
            "CONFIG_ERROR",
            false,
            Some("Check BLOGSYNC_* environment variables"),
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for StoreError {
    fn error_code(&self) -> &'static str {
        kind_static_metadata(self.kind()).0
    }

    fn is_recoverable(&self) -> bool {
        kind_static_metadata(self.kind()).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        kind_static_metadata(self.kind()).2
    }

    fn log_level(&self) -> LogLevel {
        kind_static_metadata(self.kind()).3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_failures_are_recoverable() {
        let transient = StoreError::TransientNetwork("timed out".into());
        assert!(transient.is_recoverable());
        assert_eq!(transient.error_code(), "TRANSIENT_NETWORK");

        let conflict = StoreError::Conflict {
            path: "posts/a.md".into(),
            message: "sha mismatch".into(),
        };
        assert!(!conflict.is_recoverable());
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert_eq!(conflict.log_level(), LogLevel::Warn);
    }

    #[test]
    fn with_prefix_keeps_kind_and_detail() {
        let err = StoreError::Rejected {
            status: 422,
            message: "Invalid request".into(),
        }
        .with_prefix("asset upload failed");

        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert_eq!(
            err.to_string(),
            "Rejected by remote (status 422): asset upload failed: Invalid request"
        );
    }
}
