//! Error types for catalog build and update operations.
//!
//! Only failures that abort an entire invocation surface as `CatalogError`.
//! Per-version and per-dataset problems degrade to skips (see
//! [`crate::builder::SkipReason`] and the reconciler's run report) and never
//! appear here.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Storage or other core infrastructure failure.
    #[error(transparent)]
    Core(#[from] geostac_core::Error),

    /// The dataset registry returned an error or unusable response.
    #[error("registry error: {message}")]
    Registry {
        /// Description of the registry failure.
        message: String,
    },

    /// Serialization of a STAC document failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A catalog document already exists at the well-known key.
    ///
    /// `create` refuses to overwrite or merge; overwriting is an explicit
    /// operator choice.
    #[error("catalog already exists at {key}; pass overwrite to replace it")]
    CatalogExists {
        /// Key of the existing catalog document.
        key: String,
    },
}

impl CatalogError {
    /// Creates a registry error with the given message.
    #[must_use]
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }
}
