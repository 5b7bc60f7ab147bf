//! Error types for configmanager operations

use configmanager_core::ParseError;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The single error type surfaced by the configuration manager.
///
/// Every failure (missing configuration, unknown provider, provider
/// failures, unreadable files) is reported as a `ConfigError` carrying a
/// human-readable message. The underlying error, if any, is available via
/// [`std::error::Error::source`].
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ConfigError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ConfigError {
    /// Creates an error without an underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping `source`.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The message of this error, without the underlying cause.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the underlying cause if it is of type `E`.
    pub fn source_as<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref::<E>()
    }
}

impl From<ParseError> for ConfigError {
    fn from(err: ParseError) -> Self {
        ConfigError::with_source("Invalid configuration", err)
    }
}

/// A type alias for `Result<T, ConfigError>`
pub type Result<T> = std::result::Result<T, ConfigError>;
