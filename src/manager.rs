//! The configuration manager: the single entry point for configuration
//! files and secrets.

use crate::error::{ConfigError, Result};
use crate::provider::{FileProvider, ProviderRegistry, SecretProvider};
use configmanager_core::{Config, Context, Path};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use toml::Value;
use tracing::{debug, warn};

/// Provides access to configuration files and secrets while hiding which
/// providers back them.
///
/// The providers to use are named in the `configManager` section of the
/// configuration:
///
/// ```toml
/// [configManager]
/// fileProvider = "local"
/// secretProvider = "env"
/// localConfigDir = "/etc/platform/config"
/// ```
///
/// Providers are created on first use and then reused for the lifetime of
/// the manager, so a manager that never reads secrets does not need a
/// working secret provider. Creating the file provider creates the secret
/// provider first, since file providers may need secrets themselves.
///
/// # Example
///
/// ```no_run
/// use configmanager::{Config, ConfigManager, Path};
///
/// let config = Config::load_default()?;
/// let manager = ConfigManager::create_with_builtins(config)?;
///
/// let rules = manager.get_file_as_string(None, &Path::new("rules.kts"))?;
/// let token = manager.get_secret(&Path::new("github.token"))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ConfigManager {
    config: Config,
    manager_config: Config,
    registry: ProviderRegistry,
    allow_secrets_from_config: bool,
    secret_provider: OnceCell<Arc<dyn SecretProvider>>,
    file_provider: OnceCell<Box<dyn FileProvider>>,
}

impl ConfigManager {
    /// Name of the section containing the settings of the manager.
    pub const CONFIG_MANAGER_SECTION: &'static str = "configManager";

    /// Key naming the file provider.
    pub const FILE_PROVIDER_NAME_PROPERTY: &'static str = "fileProvider";

    /// Key naming the secret provider.
    pub const SECRET_PROVIDER_NAME_PROPERTY: &'static str = "secretProvider";

    /// Key of the flag controlling whether secrets may be defined directly in
    /// the configuration. Defaults to `true`.
    pub const SECRET_FROM_CONFIG_PROPERTY: &'static str = "allowSecretsFromConfig";

    /// Creates a manager for `config` using the factories in `registry`.
    ///
    /// Only the presence of the `configManager` section is checked here;
    /// provider names are resolved on first use.
    pub fn create(config: Config, registry: ProviderRegistry) -> Result<Self> {
        if !config.has_path(Self::CONFIG_MANAGER_SECTION) {
            return Err(ConfigError::new(format!(
                "The configuration does not contain a '{}' section.",
                Self::CONFIG_MANAGER_SECTION
            )));
        }

        let manager_config = config.get_section(Self::CONFIG_MANAGER_SECTION)?;
        let allow_secrets_from_config =
            manager_config.get_bool_or(Self::SECRET_FROM_CONFIG_PROPERTY, true)?;

        Ok(Self {
            config,
            manager_config,
            registry,
            allow_secrets_from_config,
            secret_provider: OnceCell::new(),
            file_provider: OnceCell::new(),
        })
    }

    /// Creates a manager using [`ProviderRegistry::with_builtins`].
    pub fn create_with_builtins(config: Config) -> Result<Self> {
        Self::create(config, ProviderRegistry::with_builtins())
    }

    /// The full configuration this manager was created from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolves `context` via the file provider. `None` stands for the
    /// default context.
    pub fn resolve_context(&self, context: Option<&Context>) -> Result<Context> {
        let context = or_default(context);
        self.file_provider()?
            .resolve_context(&context)
            .map_err(|e| {
                ConfigError::with_source(format!("Could not resolve context '{}'.", context), e)
            })
    }

    /// Opens the configuration file at `path`.
    pub fn get_file(&self, context: Option<&Context>, path: &Path) -> Result<Box<dyn Read + Send>> {
        let context = or_default(context);
        self.file_provider()?
            .get_file(&context, path)
            .map_err(|e| {
                ConfigError::with_source(
                    format!("Could not get file '{}' in context '{}'.", path, context),
                    e,
                )
            })
    }

    /// Reads the configuration file at `path` completely into a string.
    pub fn get_file_as_string(&self, context: Option<&Context>, path: &Path) -> Result<String> {
        let mut reader = self.get_file(context, path)?;
        let mut content = String::new();
        reader.read_to_string(&mut content).map_err(|e| {
            ConfigError::with_source(format!("Could not read file '{}'.", path), e)
        })?;
        Ok(content)
    }

    /// Checks whether a configuration file exists at `path`. A missing file
    /// is reported as `false`; only provider failures are errors.
    pub fn contains_file(&self, context: Option<&Context>, path: &Path) -> Result<bool> {
        let context = or_default(context);
        self.file_provider()?
            .contains_file(&context, path)
            .map_err(|e| {
                ConfigError::with_source(
                    format!("Could not check for file '{}' in context '{}'.", path, context),
                    e,
                )
            })
    }

    /// Lists the configuration files in the directory at `path`.
    pub fn list_files(&self, context: Option<&Context>, path: &Path) -> Result<HashSet<Path>> {
        let context = or_default(context);
        self.file_provider()?
            .list_files(&context, path)
            .map_err(|e| {
                ConfigError::with_source(
                    format!("Could not list files in '{}' in context '{}'.", path, context),
                    e,
                )
            })
    }

    /// Returns the secret at `path`.
    ///
    /// A string defined at `path` in the configuration takes precedence over
    /// the secret provider unless `allowSecretsFromConfig` is `false`.
    pub fn get_secret(&self, path: &Path) -> Result<String> {
        if self.allow_secrets_from_config {
            if let Some(Value::String(value)) = self.config.get(path.path()) {
                debug!(path = %path, "secret taken from configuration");
                return Ok(value.clone());
            }
        }

        self.secret_provider()?.get_secret(path).map_err(|e| {
            ConfigError::with_source(format!("Could not get secret '{}'.", path), e)
        })
    }

    /// Returns the string setting at `key`.
    pub fn get_string(&self, key: &str) -> Result<String> {
        Ok(self.config.get_string(key)?)
    }

    /// Returns the string setting at `key`, or `None` if it is not set.
    pub fn get_string_or_none(&self, key: &str) -> Result<Option<String>> {
        Ok(self.config.get_string_or_none(key)?)
    }

    fn secret_provider(&self) -> Result<&Arc<dyn SecretProvider>> {
        self.secret_provider.get_or_try_init(|| {
            let name = self.provider_name(Self::SECRET_PROVIDER_NAME_PROPERTY, "secret")?;
            let factory = self
                .registry
                .secret_provider_factory(&name)
                .ok_or_else(|| unknown_provider("secret", &name))?;

            debug!(provider = %name, "creating secret provider");
            factory(&self.manager_config).map_err(|e| {
                warn!(provider = %name, error = %e, "failed to create secret provider");
                ConfigError::with_source(format!("Could not create secret provider '{}'.", name), e)
            })
        })
    }

    fn file_provider(&self) -> Result<&dyn FileProvider> {
        let provider = self.file_provider.get_or_try_init(|| {
            let name = self.provider_name(Self::FILE_PROVIDER_NAME_PROPERTY, "file")?;
            let factory = self
                .registry
                .file_provider_factory(&name)
                .ok_or_else(|| unknown_provider("file", &name))?;
            let secret_provider = Arc::clone(self.secret_provider()?);

            debug!(provider = %name, "creating file provider");
            factory(&self.manager_config, secret_provider).map_err(|e| {
                warn!(provider = %name, error = %e, "failed to create file provider");
                ConfigError::with_source(format!("Could not create file provider '{}'.", name), e)
            })
        })?;
        Ok(provider.as_ref())
    }

    fn provider_name(&self, property: &str, kind: &str) -> Result<String> {
        self.manager_config
            .get_string_or_none(property)?
            .ok_or_else(|| {
                ConfigError::new(format!(
                    "No {} provider configured. Set '{}.{}' to the name of a {} provider.",
                    kind,
                    Self::CONFIG_MANAGER_SECTION,
                    property,
                    kind
                ))
            })
    }
}

impl fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigManager")
            .field("registry", &self.registry)
            .field("allow_secrets_from_config", &self.allow_secrets_from_config)
            .field("secret_provider", &self.secret_provider.get().map(|p| p.name()))
            .field("file_provider", &self.file_provider.get().map(|p| p.name()))
            .finish_non_exhaustive()
    }
}

fn or_default(context: Option<&Context>) -> Context {
    context.cloned().unwrap_or_default()
}

fn unknown_provider(kind: &str, name: &str) -> ConfigError {
    ConfigError::new(format!("Could not find a {} provider named '{}'.", kind, name))
}
