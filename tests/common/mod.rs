//! Providers and helpers shared by the integration tests.

#![allow(dead_code)]

use configmanager::provider::{ProviderError, ProviderResult};
use configmanager::{
    Config, ConfigManager, Context, FileProvider, Path, ProviderInfo, ProviderRegistry,
    SecretProvider,
};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TEST_SECRET_NAME: &str = "top-secret";
pub const TEST_SECRET_VALUE: &str = "licenseToTest";

/// File provider reading from the fixture directories.
///
/// The name of a context is the directory to read from; the default context
/// maps to `tests/fixtures/default`.
pub struct TestFileProvider;

impl TestFileProvider {
    pub const NAME: &'static str = "testFileProvider";
    pub const RESOLVED_PREFIX: &'static str = "resolved_";
    /// Contexts and paths with this value make the provider fail.
    pub const ERROR_VALUE: &'static str = "error";
    /// Path for which `get_file` returns a stream that fails when read.
    pub const BROKEN_STREAM: &'static str = "broken-stream";
    /// Setting naming a secret the factory must be able to read.
    pub const SECRET_PROPERTY: &'static str = "requiredSecret";

    pub fn info() -> ProviderInfo {
        ProviderInfo {
            name: Self::NAME,
            description: "File provider for tests",
            examples: &[],
        }
    }

    fn directory(context: &Context) -> PathBuf {
        if context.is_default() {
            fixtures_dir().join("default")
        } else {
            PathBuf::from(context.name())
        }
    }
}

impl FileProvider for TestFileProvider {
    fn resolve_context(&self, context: &Context) -> ProviderResult<Context> {
        if context.name() == Self::ERROR_VALUE {
            return Err(ProviderError::Other("Cannot resolve context".to_string()));
        }
        Ok(Context::new(format!("{}{}", Self::RESOLVED_PREFIX, context)))
    }

    fn get_file(&self, context: &Context, path: &Path) -> ProviderResult<Box<dyn Read + Send>> {
        if path.path() == Self::BROKEN_STREAM {
            return Ok(Box::new(FailingReader));
        }
        Ok(Box::new(File::open(Self::directory(context).join(path.path()))?))
    }

    fn contains_file(&self, context: &Context, path: &Path) -> ProviderResult<bool> {
        if path.path() == Self::ERROR_VALUE {
            return Err(ProviderError::InvalidPath(path.to_string()));
        }
        Ok(Self::directory(context).join(path.path()).is_file())
    }

    fn list_files(&self, context: &Context, path: &Path) -> ProviderResult<HashSet<Path>> {
        let mut files = HashSet::new();
        for entry in fs::read_dir(Self::directory(context).join(path.path()))? {
            let entry = entry?;
            files.insert(path.child(&entry.file_name().to_string_lossy()));
        }
        Ok(files)
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("stream is broken"))
    }
}

/// Secret provider serving the table `configManager.secrets`.
pub struct TestSecretProvider {
    secrets: HashMap<String, String>,
}

impl TestSecretProvider {
    pub const NAME: &'static str = "testSecretProvider";
    pub const SECRETS_PROPERTY: &'static str = "secrets";

    pub fn info() -> ProviderInfo {
        ProviderInfo {
            name: Self::NAME,
            description: "Secret provider for tests",
            examples: &[],
        }
    }

    pub fn from_config(config: &Config) -> ProviderResult<Self> {
        let section = config.get_section_or_empty(Self::SECRETS_PROPERTY)?;
        let secrets = section
            .keys()
            .map(|key| -> ProviderResult<(String, String)> {
                Ok((key.to_string(), section.get_string(key)?))
            })
            .collect::<ProviderResult<_>>()?;
        Ok(Self { secrets })
    }
}

impl SecretProvider for TestSecretProvider {
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

/// Counts how often the factories of a [`test_registry`] were invoked.
#[derive(Clone, Default)]
pub struct FactoryCalls {
    pub file: Arc<AtomicUsize>,
    pub secret: Arc<AtomicUsize>,
}

impl FactoryCalls {
    pub fn file(&self) -> usize {
        self.file.load(Ordering::SeqCst)
    }

    pub fn secret(&self) -> usize {
        self.secret.load(Ordering::SeqCst)
    }
}

/// A registry with the test providers, counting factory invocations.
pub fn test_registry(calls: &FactoryCalls) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    let file_calls = Arc::clone(&calls.file);
    registry.register_file_provider(TestFileProvider::info(), move |config, secrets| {
        file_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(secret) = config.get_string_or_none(TestFileProvider::SECRET_PROPERTY)? {
            secrets.get_secret(&Path::new(secret))?;
        }
        Ok(Box::new(TestFileProvider))
    });

    let secret_calls = Arc::clone(&calls.secret);
    registry.register_secret_provider(TestSecretProvider::info(), move |config| {
        secret_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(TestSecretProvider::from_config(config)?))
    });

    registry
}

/// Builds a configuration with a `configManager` section selecting the test
/// providers. `top_level` is inserted before the section, `section` inside it.
pub fn test_config(top_level: &str, section: &str) -> Config {
    let toml = format!(
        r#"
{top_level}

[configManager]
fileProvider = "{file}"
secretProvider = "{secret}"
{section}

[configManager.secrets]
{name} = "{value}"
"#,
        file = TestFileProvider::NAME,
        secret = TestSecretProvider::NAME,
        name = TEST_SECRET_NAME,
        value = TEST_SECRET_VALUE,
    );
    toml.parse().expect("valid test configuration")
}

pub fn create_manager(config: Config) -> ConfigManager {
    ConfigManager::create(config, test_registry(&FactoryCalls::default()))
        .expect("manager should be created")
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Context pointing to the `tests/fixtures/config` directory.
pub fn test_context() -> Context {
    Context::new(fixtures_dir().join("config").to_string_lossy().into_owned())
}
