//! Configuration errors.

use camino::{Utf8Path, Utf8PathBuf};

/// Errors raised while loading or validating a [`Config`](crate::Config).
///
/// # Examples
///
/// ```
/// use dine_core::ConfigError;
///
/// let error = ConfigError::invalid_option("favorites.storage_key", "must not be empty");
/// assert_eq!(
///     error.to_string(),
///     "invalid value for 'favorites.storage_key': must not be empty"
/// );
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configured path cannot be used, e.g. the data directory is a file.
    #[error("unusable path '{path}': {reason}")]
    InvalidPath {
        /// The offending path.
        path: Utf8PathBuf,
        /// Why it cannot be used.
        reason: String,
    },

    /// An option holds a value outside its allowed range.
    #[error("invalid value for '{option}': {reason}")]
    InvalidOption {
        /// Dotted option name, e.g. `storage.file_name`.
        option: String,
        /// Why the value is rejected.
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for the schema.
    #[error("malformed configuration file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[must_use]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new [`ConfigError::InvalidPath`] error.
    #[must_use]
    pub fn invalid_path(path: impl Into<Utf8PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the path this error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::InvalidPath { path, .. } => Some(path),
            Self::InvalidOption { .. } | Self::Io(_) | Self::Parse(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_path() {
        let error = ConfigError::invalid_path("/srv/dine", "not a directory");
        assert_eq!(error.path(), Some(Utf8Path::new("/srv/dine")));
        assert_eq!(
            error.to_string(),
            "unusable path '/srv/dine': not a directory"
        );
    }

    #[test]
    fn test_invalid_option_has_no_path() {
        let error = ConfigError::invalid_option("storage.file_name", "must not be empty");
        assert!(error.path().is_none());
        assert!(error.to_string().contains("storage.file_name"));
    }

    #[test]
    fn test_parse_error_from_serde() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = ConfigError::from(parse);
        assert!(error.to_string().starts_with("malformed configuration file"));
    }
}
