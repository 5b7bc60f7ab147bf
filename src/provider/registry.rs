use super::dotenv::{FileSecretProvider, FileSecretsConfig};
use super::env::{EnvConfig, EnvSecretProvider};
use super::keyring::{KeyringConfig, KeyringSecretProvider};
use super::local::{LocalConfig, LocalFileProvider};
use super::{FileProvider, ProviderInfo, ProviderResult, SecretProvider};
use configmanager_core::Config;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Factory creating a file provider from the `configManager` section.
///
/// The already created secret provider is passed along so the file provider
/// can obtain credentials it needs.
pub type FileProviderFactory = Box<
    dyn Fn(&Config, Arc<dyn SecretProvider>) -> ProviderResult<Box<dyn FileProvider>> + Send + Sync,
>;

/// Factory creating a secret provider from the `configManager` section.
pub type SecretProviderFactory =
    Box<dyn Fn(&Config) -> ProviderResult<Arc<dyn SecretProvider>> + Send + Sync>;

struct Registration<F> {
    info: ProviderInfo,
    factory: F,
}

/// Maps provider names to factories.
///
/// A registry is an explicit value owned by a
/// [`ConfigManager`](crate::ConfigManager); applications populate it at
/// startup. [`ProviderRegistry::with_builtins`] registers the providers
/// shipped with this crate.
///
/// # Example
///
/// ```ignore
/// let mut registry = ProviderRegistry::with_builtins();
/// registry.register_secret_provider(VaultSecretProvider::info(), |config| {
///     Ok(Arc::new(VaultSecretProvider::new(config.try_into()?)?))
/// });
/// ```
#[derive(Default)]
pub struct ProviderRegistry {
    file_providers: HashMap<&'static str, Registration<FileProviderFactory>>,
    secret_providers: HashMap<&'static str, Registration<SecretProviderFactory>>,
}

impl ProviderRegistry {
    /// Creates a registry without any providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry containing the built-in providers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register_file_provider(LocalFileProvider::info(), |config, _secrets| {
            let config = LocalConfig::try_from(config)?;
            Ok(Box::new(LocalFileProvider::new(config)?))
        });

        registry.register_secret_provider(EnvSecretProvider::info(), |config| {
            let config = EnvConfig::try_from(config)?;
            Ok(Arc::new(EnvSecretProvider::new(config)))
        });
        registry.register_secret_provider(FileSecretProvider::info(), |config| {
            let config = FileSecretsConfig::try_from(config)?;
            Ok(Arc::new(FileSecretProvider::new(config)?))
        });
        registry.register_secret_provider(KeyringSecretProvider::info(), |config| {
            let config = KeyringConfig::try_from(config)?;
            Ok(Arc::new(KeyringSecretProvider::new(config)))
        });

        registry
    }

    /// Registers a file provider under `info.name`, replacing any factory
    /// registered under the same name.
    pub fn register_file_provider<F>(&mut self, info: ProviderInfo, factory: F) -> &mut Self
    where
        F: Fn(&Config, Arc<dyn SecretProvider>) -> ProviderResult<Box<dyn FileProvider>>
            + Send
            + Sync
            + 'static,
    {
        self.file_providers.insert(
            info.name,
            Registration {
                info,
                factory: Box::new(factory),
            },
        );
        self
    }

    /// Registers a secret provider under `info.name`, replacing any factory
    /// registered under the same name.
    pub fn register_secret_provider<F>(&mut self, info: ProviderInfo, factory: F) -> &mut Self
    where
        F: Fn(&Config) -> ProviderResult<Arc<dyn SecretProvider>> + Send + Sync + 'static,
    {
        self.secret_providers.insert(
            info.name,
            Registration {
                info,
                factory: Box::new(factory),
            },
        );
        self
    }

    /// Looks up a file provider factory by exact name.
    pub fn file_provider_factory(&self, name: &str) -> Option<&FileProviderFactory> {
        self.file_providers.get(name).map(|reg| &reg.factory)
    }

    /// Looks up a secret provider factory by exact name.
    pub fn secret_provider_factory(&self, name: &str) -> Option<&SecretProviderFactory> {
        self.secret_providers.get(name).map(|reg| &reg.factory)
    }

    /// Returns the registered file providers, sorted by name.
    pub fn file_providers(&self) -> Vec<ProviderInfo> {
        sorted_infos(self.file_providers.values().map(|reg| &reg.info))
    }

    /// Returns the registered secret providers, sorted by name.
    pub fn secret_providers(&self) -> Vec<ProviderInfo> {
        sorted_infos(self.secret_providers.values().map(|reg| &reg.info))
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |infos: Vec<ProviderInfo>| infos.into_iter().map(|i| i.name).collect::<Vec<_>>();
        f.debug_struct("ProviderRegistry")
            .field("file_providers", &names(self.file_providers()))
            .field("secret_providers", &names(self.secret_providers()))
            .finish()
    }
}

fn sorted_infos<'a>(infos: impl Iterator<Item = &'a ProviderInfo>) -> Vec<ProviderInfo> {
    let mut infos: Vec<ProviderInfo> = infos.cloned().collect();
    infos.sort_by_key(|info| info.name);
    infos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderError, ProviderResult};
    use configmanager_core::Path;

    struct FixedSecret(&'static str);

    impl SecretProvider for FixedSecret {
        fn get_secret(&self, _path: &Path) -> ProviderResult<String> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn fixed_info() -> ProviderInfo {
        ProviderInfo {
            name: "fixed",
            description: "Always returns the same secret",
            examples: &[],
        }
    }

    #[test]
    fn test_builtin_providers() {
        let registry = ProviderRegistry::with_builtins();

        let file_names: Vec<_> = registry.file_providers().iter().map(|i| i.name).collect();
        assert_eq!(file_names, vec!["local"]);

        let secret_names: Vec<_> = registry.secret_providers().iter().map(|i| i.name).collect();
        assert_eq!(secret_names, vec!["env", "file", "keyring"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = ProviderRegistry::new();
        assert!(registry.file_provider_factory("local").is_none());
        assert!(registry.secret_provider_factory("env").is_none());
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = ProviderRegistry::with_builtins();
        assert!(registry.secret_provider_factory("env").is_some());
        assert!(registry.secret_provider_factory("ENV").is_none());
        assert!(registry.secret_provider_factory("env ").is_none());
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = ProviderRegistry::new();
        registry.register_secret_provider(fixed_info(), |_| Ok(Arc::new(FixedSecret("one"))));

        let factory = registry.secret_provider_factory("fixed").unwrap();
        let provider = factory(&Config::empty()).unwrap();
        assert_eq!(provider.get_secret(&Path::new("x")).unwrap(), "one");
    }

    #[test]
    fn test_reregistering_replaces_factory() {
        let mut registry = ProviderRegistry::new();
        registry
            .register_secret_provider(fixed_info(), |_| Ok(Arc::new(FixedSecret("one"))))
            .register_secret_provider(fixed_info(), |_| Ok(Arc::new(FixedSecret("two"))));

        assert_eq!(registry.secret_providers().len(), 1);
        let factory = registry.secret_provider_factory("fixed").unwrap();
        let provider = factory(&Config::empty()).unwrap();
        assert_eq!(provider.get_secret(&Path::new("x")).unwrap(), "two");
    }

    #[test]
    fn test_builtin_factory_reports_configuration_errors() {
        let registry = ProviderRegistry::with_builtins();
        let factory = registry.file_provider_factory("local").unwrap();

        let secrets: Arc<dyn SecretProvider> = Arc::new(FixedSecret("unused"));
        let result = factory(&Config::empty(), secrets);

        match result {
            Err(ProviderError::Config(e)) => assert!(e.to_string().contains("localConfigDir")),
            Err(e) => panic!("Expected configuration error, got {}", e),
            Ok(_) => panic!("Expected configuration error"),
        }
    }
}
