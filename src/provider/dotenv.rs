use super::{ProviderError, ProviderInfo, ProviderResult, SecretProvider};
use configmanager_core::{Config, Path};
use std::collections::HashMap;
use std::path::PathBuf;
use toml::Value;
use tracing::debug;

/// Configuration for the file based secret provider.
///
/// `configManager.secretsFiles` lists the files to read, either as a TOML
/// array or as a comma separated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSecretsConfig {
    pub files: Vec<PathBuf>,
}

impl FileSecretsConfig {
    pub const FILES_PROPERTY: &'static str = "secretsFiles";
}

impl TryFrom<&Config> for FileSecretsConfig {
    type Error = ProviderError;

    fn try_from(config: &Config) -> ProviderResult<Self> {
        let files: Vec<PathBuf> = match config.get(Self::FILES_PROPERTY) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(PathBuf::from).ok_or_else(|| {
                        ProviderError::Other(format!(
                            "Entries of '{}' must be strings",
                            Self::FILES_PROPERTY
                        ))
                    })
                })
                .collect::<ProviderResult<_>>()?,
            Some(_) => config
                .get_string(Self::FILES_PROPERTY)?
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect(),
            None => Vec::new(),
        };

        if files.is_empty() {
            return Err(ProviderError::Other(format!(
                "No secret files configured in '{}'",
                Self::FILES_PROPERTY
            )));
        }

        Ok(Self { files })
    }
}

/// A read-only provider serving secrets from `.env` style files.
///
/// All files are parsed once when the provider is created. If a key occurs
/// in several files, the first file listed wins.
pub struct FileSecretProvider {
    secrets: HashMap<String, String>,
}

impl FileSecretProvider {
    pub const NAME: &'static str = "file";

    pub fn new(config: FileSecretsConfig) -> ProviderResult<Self> {
        let mut secrets = HashMap::new();
        for file in &config.files {
            debug!(file = %file.display(), "loading secrets file");
            for item in dotenvy::from_path_iter(file)? {
                let (key, value) = item?;
                secrets.entry(key).or_insert(value);
            }
        }
        Ok(Self { secrets })
    }

    pub fn info() -> ProviderInfo {
        ProviderInfo {
            name: Self::NAME,
            description: "Secrets from .env style files",
            examples: &["secretsFiles = \"/etc/platform/secrets.env\""],
        }
    }
}

impl SecretProvider for FileSecretProvider {
    fn get_secret(&self, path: &Path) -> ProviderResult<String> {
        self.secrets
            .get(path.path())
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(path.to_string()))
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
