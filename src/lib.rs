//! configmanager - configuration files and secrets from pluggable providers
//!
//! This library gives applications a single entry point for reading
//! configuration files and secrets, independent of where they are stored.
//!
//! # Features
//!
//! - **Pluggable providers**: file storage and secret storage are selected by
//!   name in the configuration and can vary per deployment
//! - **Contexts**: configuration files are read in a context, such as a
//!   revision of a configuration repository
//! - **Layered secrets**: secrets defined in the configuration override the
//!   secret provider, unless this is switched off
//! - **Lazy providers**: providers are created once, on first use
//!
//! # Example
//!
//! ```no_run
//! use configmanager::{Config, ConfigManager, Context, Path};
//!
//! let config: Config = r#"
//!     [configManager]
//!     fileProvider = "local"
//!     secretProvider = "env"
//!     localConfigDir = "/etc/platform/config"
//! "#.parse()?;
//!
//! let manager = ConfigManager::create_with_builtins(config)?;
//!
//! for file in manager.list_files(Some(&Context::new("main")), &Path::new("rules"))? {
//!     println!("{}", file);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod manager;

pub mod provider;

pub use configmanager_core::{Config, Context, ParseError, Path};
pub use error::{ConfigError, Result};
pub use manager::ConfigManager;
pub use provider::{FileProvider, ProviderError, ProviderInfo, ProviderRegistry, SecretProvider};
