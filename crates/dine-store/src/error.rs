//! Error types for the dine-store crate.
//!
//! This module provides the [`StoreError`] type for failures of a persisted
//! key-value backend.

use camino::{Utf8Path, Utf8PathBuf};

/// Errors that can occur while reading or writing a persisted store.
///
/// # Error Recovery Strategy
///
/// - **I/O errors** ([`StoreError::Io`]): Recoverable - the next operation
///   may succeed
/// - **Corrupt file** ([`StoreError::Corrupt`]): Fatal - the file needs repair
/// - **Encode errors** ([`StoreError::Encode`]): Fatal - the value cannot be
///   written at all
/// - **Unavailable** ([`StoreError::Unavailable`]): Recoverable - the backend
///   reported a transient failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred on the store file.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The file being accessed.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The store file exists but does not hold a JSON object of strings.
    #[error("store file '{path}' is corrupt: {source}")]
    Corrupt {
        /// The corrupt file.
        path: Utf8PathBuf,
        /// The parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The store contents could not be encoded.
    #[error("failed to encode store contents: {0}")]
    Encode(#[from] serde_json::Error),

    /// The backend is temporarily unable to serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Creates a new [`StoreError::Io`] error.
    #[inline]
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`StoreError::Corrupt`] error.
    #[inline]
    pub fn corrupt(path: impl Into<Utf8PathBuf>, source: serde_json::Error) -> Self {
        Self::Corrupt {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if retrying the operation may succeed.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Unavailable(_))
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Io { path, .. } | Self::Corrupt { path, .. } => Some(path),
            Self::Encode(_) | Self::Unavailable(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn parse_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{").unwrap_err()
    }

    #[test]
    fn test_io_error() {
        let error = StoreError::io(
            "/data/store.json",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(error.is_recoverable());
        assert_eq!(error.path(), Some(Utf8Path::new("/data/store.json")));
        let msg = error.to_string();
        assert!(msg.contains("/data/store.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_corrupt_error() {
        let error = StoreError::corrupt("/data/store.json", parse_error());
        assert!(!error.is_recoverable());
        assert_eq!(error.path(), Some(Utf8Path::new("/data/store.json")));
        assert!(error.to_string().contains("corrupt"));
    }

    #[test]
    fn test_encode_error() {
        let error = StoreError::from(parse_error());
        assert!(!error.is_recoverable());
        assert!(error.path().is_none());
    }

    #[test]
    fn test_unavailable_error() {
        let error = StoreError::Unavailable("disk busy".to_owned());
        assert!(error.is_recoverable());
        assert!(error.path().is_none());
        assert_eq!(error.to_string(), "store unavailable: disk busy");
    }
}
