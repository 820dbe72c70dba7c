//! Error types for the dine-favorites crate.

use std::sync::Arc;

use dine_store::StoreError;

/// Errors returned by favorites operations.
///
/// A malformed persisted value is not an error: it decodes to an empty list.
#[derive(Debug, thiserror::Error)]
pub enum FavoritesError {
    /// The backend read behind a load failed.
    ///
    /// Every caller that joined the same load receives the same error, hence
    /// the shared pointer. The cache is left unloaded so the next call
    /// retries.
    #[error("failed to load favorites: {0}")]
    Load(#[source] Arc<StoreError>),

    /// The backend write after a toggle failed.
    ///
    /// The in-memory list keeps the toggle and listeners have been notified.
    #[error("failed to persist favorites: {source}")]
    Persist {
        /// Whether the item is a favorite in memory after the toggle.
        added: bool,
        /// The backend error.
        #[source]
        source: StoreError,
    },

    /// The favorites list could not be encoded. Nothing was changed.
    #[error("failed to encode favorites: {0}")]
    Encode(#[from] serde_json::Error),
}

impl FavoritesError {
    /// Returns `true` if retrying the operation may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Load(e) => e.is_recoverable(),
            Self::Persist { source, .. } => source.is_recoverable(),
            Self::Encode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_shares_source() {
        let source = Arc::new(StoreError::Unavailable("offline".to_owned()));
        let a = FavoritesError::Load(Arc::clone(&source));
        let b = FavoritesError::Load(Arc::clone(&source));

        assert!(a.is_recoverable());
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(
            a.to_string(),
            "failed to load favorites: store unavailable: offline"
        );
    }

    #[test]
    fn test_persist_error_recoverability_follows_source() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = FavoritesError::Persist {
            added: false,
            source: StoreError::corrupt("/data/store.json", parse),
        };
        assert!(!error.is_recoverable());
        assert!(error.to_string().starts_with("failed to persist favorites"));
    }

    #[test]
    fn test_encode_error_is_fatal() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!FavoritesError::from(parse).is_recoverable());
    }
}
