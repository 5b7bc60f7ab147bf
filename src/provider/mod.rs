//! # Provider System
//!
//! Configuration files and secrets are read through pluggable providers.
//! File storage and secret storage vary independently: a deployment may read
//! configuration files from a local directory while secrets come from
//! environment variables or the system keychain.
//!
//! ## Architecture
//!
//! - [`FileProvider`] resolves contexts and serves configuration files.
//! - [`SecretProvider`] looks up secret values by path.
//! - [`ProviderRegistry`] maps provider names to factories. The names to use
//!   are read from the `configManager` section of the configuration.
//!
//! ## Available Providers
//!
//! File providers:
//!
//! - [`LocalFileProvider`]: files below a local directory
//!
//! Secret providers:
//!
//! - [`EnvSecretProvider`]: environment variables (read-only)
//! - [`FileSecretProvider`]: `.env` style files
//! - [`KeyringSecretProvider`]: system keychain
//!
//! ## Example
//!
//! ```toml
//! [configManager]
//! fileProvider = "local"
//! secretProvider = "file"
//! localConfigDir = "/etc/platform/config"
//! secretsFiles = "/etc/platform/secrets.env"
//! ```

use configmanager_core::{Context, ParseError, Path};
use std::collections::HashSet;
use std::io::{self, Read};
use thiserror::Error;

pub mod dotenv;
pub mod env;
pub mod keyring;
pub mod local;
pub mod registry;

pub use dotenv::FileSecretProvider;
pub use env::EnvSecretProvider;
pub use keyring::KeyringSecretProvider;
pub use local::LocalFileProvider;
pub use registry::{FileProviderFactory, ProviderRegistry, SecretProviderFactory};

/// Information about a provider.
///
/// Contains metadata used for displaying available providers to users,
/// including the provider's name, description, and example settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    /// The name used to select the provider in the `configManager` section.
    pub name: &'static str,
    /// A human-readable description of what the provider does.
    pub description: &'static str,
    /// Example settings for the `configManager` section.
    pub examples: &'static [&'static str],
}

impl ProviderInfo {
    /// Formats the provider information for display, including examples if available.
    ///
    /// # Returns
    ///
    /// A formatted string in one of two formats:
    /// - Without examples: "name: description"
    /// - With examples: "name: description (e.g., example1, example2)"
    pub fn display_with_examples(&self) -> String {
        if self.examples.is_empty() {
            format!("{}: {}", self.name, self.description)
        } else {
            format!(
                "{}: {} (e.g., {})",
                self.name,
                self.description,
                self.examples.join(", ")
            )
        }
    }
}

/// Errors raised by provider implementations.
///
/// The configuration manager wraps these into a
/// [`ConfigError`](crate::ConfigError), keeping the provider error as source.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Keyring error: {0}")]
    Keyring(#[from] ::keyring::Error),
    #[error("Dotenv error: {0}")]
    Dotenv(#[from] ::dotenvy::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ParseError),
    #[error("Invalid path '{0}'")]
    InvalidPath(String),
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Whether this error reports a missing resource rather than a failure.
    pub fn is_not_found(&self) -> bool {
        match self {
            ProviderError::NotFound(_) => true,
            ProviderError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// A type alias for `Result<T, ProviderError>`
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Access to configuration files.
///
/// Providers must be `Send + Sync`; a single instance serves all threads
/// sharing a [`ConfigManager`](crate::ConfigManager).
pub trait FileProvider: Send + Sync {
    /// Translates `context` into the provider's canonical form, e.g. a
    /// branch name into a commit.
    fn resolve_context(&self, context: &Context) -> ProviderResult<Context>;

    /// Opens the file at `path` in `context`.
    fn get_file(&self, context: &Context, path: &Path) -> ProviderResult<Box<dyn Read + Send>>;

    /// Checks whether a file exists at `path`.
    ///
    /// - `Ok(false)` if there is no such file
    /// - `Err` only if the provider could not answer
    fn contains_file(&self, context: &Context, path: &Path) -> ProviderResult<bool>;

    /// Lists the files in the directory at `path`. Each returned path is
    /// `path` joined with the entry name by `/`.
    fn list_files(&self, context: &Context, path: &Path) -> ProviderResult<HashSet<Path>>;

    /// Returns the name of this provider.
    fn name(&self) -> &'static str;
}

/// Access to secret values.
pub trait SecretProvider: Send + Sync {
    /// Retrieves the secret at `path`.
    ///
    /// Returns [`ProviderError::NotFound`] if the secret does not exist.
    fn get_secret(&self, path: &Path) -> ProviderResult<String>;

    /// Returns the name of this provider.
    fn name(&self) -> &'static str;
}
