use super::{FileProvider, ProviderError, ProviderInfo, ProviderResult};
use configmanager_core::{Config, Context, Path};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, PathBuf};

/// Configuration for the local file provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    /// Root directory of the configuration files, `configManager.localConfigDir`.
    pub root: PathBuf,
}

impl LocalConfig {
    pub const DIR_PROPERTY: &'static str = "localConfigDir";
}

impl TryFrom<&Config> for LocalConfig {
    type Error = ProviderError;

    fn try_from(config: &Config) -> ProviderResult<Self> {
        Ok(Self {
            root: PathBuf::from(config.get_string(Self::DIR_PROPERTY)?),
        })
    }
}

/// Provider serving configuration files from a local directory.
///
/// There is only one version of the files, so contexts are accepted as
/// they are and do not influence which file is read. Paths are interpreted
/// relative to the root directory and may not leave it.
#[derive(Debug)]
pub struct LocalFileProvider {
    root: PathBuf,
}

impl LocalFileProvider {
    pub const NAME: &'static str = "local";

    pub fn new(config: LocalConfig) -> ProviderResult<Self> {
        if !config.root.is_dir() {
            return Err(ProviderError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!(
                    "Configuration directory '{}' does not exist",
                    config.root.display()
                ),
            )));
        }
        Ok(Self { root: config.root })
    }

    pub fn info() -> ProviderInfo {
        ProviderInfo {
            name: Self::NAME,
            description: "Configuration files in a local directory",
            examples: &["localConfigDir = \"/etc/platform/config\""],
        }
    }

    fn resolve(&self, path: &Path) -> ProviderResult<PathBuf> {
        let relative = std::path::Path::new(path.path());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ProviderError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl FileProvider for LocalFileProvider {
    fn resolve_context(&self, context: &Context) -> ProviderResult<Context> {
        Ok(context.clone())
    }

    fn get_file(&self, _context: &Context, path: &Path) -> ProviderResult<Box<dyn Read + Send>> {
        let file_path = self.resolve(path)?;
        if file_path.is_dir() {
            return Err(ProviderError::NotFound(path.to_string()));
        }
        Ok(Box::new(File::open(file_path)?))
    }

    fn contains_file(&self, _context: &Context, path: &Path) -> ProviderResult<bool> {
        match fs::metadata(self.resolve(path)?) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_files(&self, _context: &Context, path: &Path) -> ProviderResult<HashSet<Path>> {
        let mut files = HashSet::new();
        for entry in fs::read_dir(self.resolve(path)?)? {
            let entry = entry?;
            // Follows symlinks like `contains_file`; dangling links are skipped.
            let is_file = match fs::metadata(entry.path()) {
                Ok(metadata) => metadata.is_file(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => false,
                Err(e) => return Err(e.into()),
            };
            if is_file {
                files.insert(path.child(&entry.file_name().to_string_lossy()));
            }
        }
        Ok(files)
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn provider_with_files() -> (LocalFileProvider, TempDir) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("root.txt"), "Root config file.\n").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/sub1.txt"), "one").unwrap();
        fs::write(dir.path().join("sub/sub2.txt"), "two").unwrap();
        fs::create_dir(dir.path().join("sub/nested")).unwrap();

        let provider = LocalFileProvider::new(LocalConfig {
            root: dir.path().to_path_buf(),
        })
        .unwrap();
        (provider, dir)
    }

    #[test]
    fn test_resolve_context_is_identity() {
        let (provider, _dir) = provider_with_files();
        let context = Context::new("main");
        assert_eq!(provider.resolve_context(&context).unwrap(), context);
    }

    #[test]
    fn test_get_file() {
        let (provider, _dir) = provider_with_files();
        let mut content = String::new();
        provider
            .get_file(&Context::default(), &Path::new("root.txt"))
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "Root config file.\n");
    }

    #[test]
    fn test_get_missing_file_is_not_found() {
        let (provider, _dir) = provider_with_files();
        let err = provider
            .get_file(&Context::default(), &Path::new("missing.txt"))
            .err()
            .expect("missing file should fail");
        assert!(err.is_not_found());

        let err = provider
            .get_file(&Context::default(), &Path::new("sub"))
            .err()
            .expect("directory should fail");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_contains_file() {
        let (provider, _dir) = provider_with_files();
        let context = Context::default();
        assert!(provider.contains_file(&context, &Path::new("root.txt")).unwrap());
        assert!(provider.contains_file(&context, &Path::new("./sub/sub1.txt")).unwrap());
        assert!(!provider.contains_file(&context, &Path::new("missing.txt")).unwrap());
        assert!(!provider.contains_file(&context, &Path::new("sub")).unwrap());
    }

    #[test]
    fn test_list_files_skips_directories() {
        let (provider, _dir) = provider_with_files();
        let files = provider
            .list_files(&Context::default(), &Path::new("sub"))
            .unwrap();
        let expected: HashSet<Path> = ["sub/sub1.txt", "sub/sub2.txt"]
            .into_iter()
            .map(Path::from)
            .collect();
        assert_eq!(files, expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_listed() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let data = dir.path().join("..data");
        fs::create_dir(&data).unwrap();
        fs::write(data.join("rules.kts"), "rule").unwrap();
        symlink(data.join("rules.kts"), dir.path().join("rules.kts")).unwrap();
        symlink(data.join("gone.kts"), dir.path().join("dangling.kts")).unwrap();
        symlink(&data, dir.path().join("linked-dir")).unwrap();

        let provider = LocalFileProvider::new(LocalConfig {
            root: dir.path().to_path_buf(),
        })
        .unwrap();
        let context = Context::default();

        assert!(provider.contains_file(&context, &Path::new("rules.kts")).unwrap());
        assert!(!provider.contains_file(&context, &Path::new("dangling.kts")).unwrap());

        let files = provider.list_files(&context, &Path::new(".")).unwrap();
        let expected: HashSet<Path> = [Path::new("./rules.kts")].into_iter().collect();
        assert_eq!(files, expected);
    }

    #[test]
    fn test_list_missing_directory_fails() {
        let (provider, _dir) = provider_with_files();
        assert!(provider
            .list_files(&Context::default(), &Path::new("missing"))
            .is_err());
    }

    #[test]
    fn test_paths_may_not_escape_root() {
        let (provider, _dir) = provider_with_files();
        let context = Context::default();
        for path in ["../secret.txt", "/etc/passwd", "sub/../../x"] {
            assert!(matches!(
                provider.contains_file(&context, &Path::new(path)),
                Err(ProviderError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn test_missing_root_directory() {
        let dir = TempDir::new().unwrap();
        let result = LocalFileProvider::new(LocalConfig {
            root: dir.path().join("missing"),
        });
        assert!(result.is_err());
    }
}
