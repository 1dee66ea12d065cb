//! Error types for the cartography engine.

use crate::spatial_index::ClusterId;
use cartography_types::CoordinateError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CartographyError>;

/// Errors produced by the engine.
///
/// The type is `Clone` because a single failed fetch is replayed to every
/// caller that was waiting on it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CartographyError {
    /// A raw directory entry had a latitude or longitude outside the valid range.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),

    /// The directory repository failed to produce a dataset.
    #[error("upstream fetch failed for {source_name}: {message}")]
    UpstreamFetch {
        source_name: String,
        message: String,
    },

    /// A cluster id that this index never produced.
    #[error("unknown cluster: {0}")]
    UnknownCluster(ClusterId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CartographyError {
    /// Shorthand used by repository implementations.
    pub fn upstream(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::UpstreamFetch {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for CartographyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "toml")]
impl From<toml::de::Error> for CartographyError {
    fn from(err: toml::de::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
