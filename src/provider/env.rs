use super::{ProviderError, ProviderInfo, ProviderResult, SecretProvider};
use configmanager_core::env_subst::{EnvSource, ProcessEnv};
use configmanager_core::{Config, Path};

/// Configuration for the environment variables secret provider.
///
/// The only setting is an optional prefix prepended to every variable name,
/// read from `configManager.envSecretsPrefix`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub prefix: Option<String>,
}

impl EnvConfig {
    pub const PREFIX_PROPERTY: &'static str = "envSecretsPrefix";
}

impl TryFrom<&Config> for EnvConfig {
    type Error = ProviderError;

    fn try_from(config: &Config) -> ProviderResult<Self> {
        Ok(Self {
            prefix: config.get_string_or_none(Self::PREFIX_PROPERTY)?,
        })
    }
}

/// A read-only provider that reads secrets from environment variables.
///
/// A secret path is mapped to a variable name by upper-casing it and
/// replacing every character that is not an ASCII letter or digit with `_`,
/// so the path `db.admin-password` is read from `DB_ADMIN_PASSWORD`.
/// Variables that are not valid unicode count as unset.
pub struct EnvSecretProvider {
    config: EnvConfig,
    source: Box<dyn EnvSource + Send + Sync>,
}

impl EnvSecretProvider {
    pub const NAME: &'static str = "env";

    /// Reads the variables of the current process.
    pub fn new(config: EnvConfig) -> Self {
        Self::with_source(config, ProcessEnv)
    }

    /// Reads variables from `source` instead of the process environment.
    pub fn with_source(config: EnvConfig, source: impl EnvSource + Send + Sync + 'static) -> Self {
        Self {
            config,
            source: Box::new(source),
        }
    }

    pub fn info() -> ProviderInfo {
        ProviderInfo {
            name: Self::NAME,
            description: "Read-only environment variables",
            examples: &["envSecretsPrefix = \"PLATFORM_\""],
        }
    }

    /// The name of the environment variable holding the secret at `path`.
    pub fn variable_name(&self, path: &Path) -> String {
        let mapped: String = path
            .path()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();

        match &self.config.prefix {
            Some(prefix) => format!("{}{}", prefix, mapped),
            None => mapped,
        }
    }
}

impl SecretProvider for EnvSecretProvider {
    fn get_secret(&self, path: &Path) -> ProviderResult<String> {
        let name = self.variable_name(path);
        self.source
            .get(&name)
            .ok_or(ProviderError::NotFound(name))
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
