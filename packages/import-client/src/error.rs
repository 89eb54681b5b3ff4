//! Error types for the import client.

use thiserror::Error;

/// Result type for import client operations.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Machine-readable failure code, keyed by operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Submission failed (network or non-2xx)
    UploadError,
    /// Status or list query failed
    FetchError,
    /// Deletion failed
    DeleteError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UploadError => "UPLOAD_ERROR",
            ErrorKind::FetchError => "FETCH_ERROR",
            ErrorKind::DeleteError => "DELETE_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Import client errors.
///
/// Every variant carries the [`ErrorKind`] of the operation that failed, so a
/// caller can branch on [`ImportError::kind`] without inspecting variants.
/// No network or parsing panic crosses the client boundary.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Connection failed, timed out, or the request never reached the server
    #[error("{kind}: {source}")]
    Transport {
        kind: ErrorKind,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx HTTP response
    #[error("{kind}: HTTP {status}: {message}")]
    Api {
        kind: ErrorKind,
        status: u16,
        message: String,
    },

    /// Server answered with a `success: false` envelope
    #[error("{kind}: {message}")]
    Rejected { kind: ErrorKind, message: String },

    /// Response body matched neither the bare nor the wrapped shape
    #[error("{kind}: malformed response: {source}")]
    Malformed {
        kind: ErrorKind,
        #[source]
        source: serde_json::Error,
    },

    /// Input rejected before any network call (e.g. empty file)
    #[error("{kind}: {message}")]
    InvalidInput { kind: ErrorKind, message: String },

    /// Reading a local file for submission failed
    #[error("{kind}: {source}")]
    Io {
        kind: ErrorKind,
        #[source]
        source: std::io::Error,
    },
}

impl ImportError {
    /// The machine code for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImportError::Transport { kind, .. }
            | ImportError::Api { kind, .. }
            | ImportError::Rejected { kind, .. }
            | ImportError::Malformed { kind, .. }
            | ImportError::InvalidInput { kind, .. }
            | ImportError::Io { kind, .. } => *kind,
        }
    }
}
