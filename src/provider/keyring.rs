use super::{ProviderError, ProviderInfo, ProviderResult, SecretProvider};
use configmanager_core::{Config, Path};
use keyring::Entry;

/// Configuration for the keyring secret provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyringConfig {
    /// Prefix of the keychain service name, `configManager.keyringService`.
    pub service: String,
    /// Account the entries belong to, `configManager.keyringAccount`.
    /// Defaults to the current system user.
    pub account: String,
}

impl KeyringConfig {
    pub const SERVICE_PROPERTY: &'static str = "keyringService";
    pub const ACCOUNT_PROPERTY: &'static str = "keyringAccount";
    pub const DEFAULT_SERVICE: &'static str = "configmanager";
}

impl TryFrom<&Config> for KeyringConfig {
    type Error = ProviderError;

    fn try_from(config: &Config) -> ProviderResult<Self> {
        let service = config
            .get_string_or_none(Self::SERVICE_PROPERTY)?
            .unwrap_or_else(|| Self::DEFAULT_SERVICE.to_string());
        let account = config
            .get_string_or_none(Self::ACCOUNT_PROPERTY)?
            .unwrap_or_else(whoami::username);
        Ok(Self { service, account })
    }
}

/// Provider reading secrets from the system keychain.
///
/// The KeyringSecretProvider uses the operating system's native secure
/// credential storage mechanism:
/// - macOS: Keychain
/// - Windows: Credential Manager
/// - Linux: Secret Service API (via libsecret)
///
/// The secret at path `p` is stored under the service `{service}/{p}`.
pub struct KeyringSecretProvider {
    config: KeyringConfig,
}

impl KeyringSecretProvider {
    pub const NAME: &'static str = "keyring";

    pub fn new(config: KeyringConfig) -> Self {
        Self { config }
    }

    pub fn info() -> ProviderInfo {
        ProviderInfo {
            name: Self::NAME,
            description: "Uses system keychain",
            examples: &["keyringService = \"platform\""],
        }
    }

    /// The keychain service name for the secret at `path`.
    pub fn service_name(&self, path: &Path) -> String {
        format!("{}/{}", self.config.service, path)
    }
}

impl SecretProvider for KeyringSecretProvider {
    fn get_secret(&self, path: &Path) -> ProviderResult<String> {
        let entry = Entry::new(&self.service_name(path), &self.config.account)?;
        match entry.get_password() {
            Ok(password) => Ok(password),
            Err(keyring::Error::NoEntry) => Err(ProviderError::NotFound(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
