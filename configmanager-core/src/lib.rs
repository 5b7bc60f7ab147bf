//! # configmanager core
//!
//! Value objects and the raw configuration tree shared by the configuration
//! manager and its providers.
//!
//! Configuration is written in TOML. Settings are addressed by dotted paths
//! that navigate nested tables, so both of the following define the key
//! `database.url`:
//!
//! ```toml
//! database.url = "postgres://localhost/platform"
//!
//! [database]
//! url = "postgres://localhost/platform"
//! ```
//!
//! String values may reference environment variables with `${VAR}` or
//! `${VAR:-default}`; see [`env_subst`].

use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use toml::{Table, Value};

mod context;
pub mod env_subst;

pub use context::{Context, Path};
use env_subst::{EnvSource, ProcessEnv};

/// Environment variable naming a configuration file that overrides the
/// platform default location.
pub const CONFIG_FILE_ENV: &str = "CONFIGMANAGER_CONFIG";

/// A read-only tree of configuration settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    table: Table,
}

impl Config {
    /// Creates a configuration without any settings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps an already parsed table. No environment substitution is applied.
    pub fn from_table(table: Table) -> Self {
        Self { table }
    }

    /// Parses TOML and substitutes variables from the given environment.
    pub fn from_str_with_env(s: &str, env: &dyn EnvSource) -> Result<Self, ParseError> {
        let mut table: Table = toml::from_str(s)?;
        env_subst::substitute_env_vars(&mut table, env)?;
        Ok(Self { table })
    }

    /// Loads the configuration file named by [`CONFIG_FILE_ENV`], or
    /// `config.toml` in the platform configuration directory.
    pub fn load_default() -> Result<Self, ParseError> {
        let path = default_config_path()?;
        Self::try_from(path.as_path())
    }

    /// The underlying table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Names of the top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Looks up the raw value at a dotted path.
    pub fn get(&self, key: &str) -> Option<&Value> {
        lookup(&self.table, key)
    }

    pub fn has_path(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the value at `key` as a string. Scalars other than strings
    /// are converted to their textual form.
    pub fn get_string(&self, key: &str) -> Result<String, ParseError> {
        let value = self.require(key)?;
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Boolean(b) => Ok(b.to_string()),
            Value::Datetime(d) => Ok(d.to_string()),
            other => Err(ParseError::wrong_type(key, "string", other)),
        }
    }

    /// Like [`get_string`](Self::get_string), but `None` for a missing key.
    pub fn get_string_or_none(&self, key: &str) -> Result<Option<String>, ParseError> {
        if self.has_path(key) {
            self.get_string(key).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Returns the value at `key` as a boolean. The strings `"true"` and
    /// `"false"` are accepted, as they result from environment substitution.
    pub fn get_bool(&self, key: &str) -> Result<bool, ParseError> {
        match self.require(key)? {
            Value::Boolean(b) => Ok(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            other => Err(ParseError::wrong_type(key, "boolean", other)),
        }
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool, ParseError> {
        if self.has_path(key) {
            self.get_bool(key)
        } else {
            Ok(default)
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64, ParseError> {
        match self.require(key)? {
            Value::Integer(i) => Ok(*i),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| ParseError::wrong_type(key, "integer", &Value::String(s.clone()))),
            other => Err(ParseError::wrong_type(key, "integer", other)),
        }
    }

    /// Returns the table at `key` as a configuration of its own.
    pub fn get_section(&self, key: &str) -> Result<Config, ParseError> {
        match self.require(key)? {
            Value::Table(t) => Ok(Config::from_table(t.clone())),
            other => Err(ParseError::wrong_type(key, "table", other)),
        }
    }

    /// Like [`get_section`](Self::get_section), but empty for a missing key.
    pub fn get_section_or_empty(&self, key: &str) -> Result<Config, ParseError> {
        if self.has_path(key) {
            self.get_section(key)
        } else {
            Ok(Config::empty())
        }
    }

    fn require(&self, key: &str) -> Result<&Value, ParseError> {
        self.get(key)
            .ok_or_else(|| ParseError::Missing(key.to_string()))
    }
}

impl FromStr for Config {
    type Err = ParseError;

    /// Parses TOML and substitutes variables from the process environment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_with_env(s, &ProcessEnv)
    }
}

impl TryFrom<&std::path::Path> for Config {
    type Error = ParseError;

    fn try_from(path: &std::path::Path) -> Result<Self, Self::Error> {
        let content = fs::read_to_string(path).map_err(|e| {
            ParseError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            ))
        })?;
        content.parse()
    }
}

impl From<Table> for Config {
    fn from(table: Table) -> Self {
        Self::from_table(table)
    }
}

/// Path of the configuration file used by [`Config::load_default`].
pub fn default_config_path() -> Result<PathBuf, ParseError> {
    default_config_path_with(&ProcessEnv)
}

/// Like [`default_config_path`], reading [`CONFIG_FILE_ENV`] from `env`.
pub fn default_config_path_with(env: &dyn EnvSource) -> Result<PathBuf, ParseError> {
    if let Some(path) = env.get(CONFIG_FILE_ENV) {
        return Ok(PathBuf::from(path));
    }

    let dirs = ProjectDirs::from("", "", "configmanager").ok_or_else(|| {
        ParseError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "Could not determine the configuration directory",
        ))
    })?;
    Ok(dirs.config_dir().join("config.toml"))
}

/// Literal keys win over navigation, so a quoted key `"a.b"` is found
/// before the nested path `a` -> `b`.
fn lookup<'a>(table: &'a Table, key: &str) -> Option<&'a Value> {
    if let Some(value) = table.get(key) {
        return Some(value);
    }

    key.match_indices('.').find_map(|(pos, _)| {
        let (head, rest) = (&key[..pos], &key[pos + 1..]);
        match table.get(head) {
            Some(Value::Table(nested)) => lookup(nested, rest),
            _ => None,
        }
    })
}

/// Errors that can occur while loading or reading configuration.
#[derive(Debug)]
pub enum ParseError {
    /// I/O error when reading configuration files
    Io(io::Error),
    /// TOML parsing error
    Toml(toml::de::Error),
    /// No setting exists for the key
    Missing(String),
    /// The setting exists but has an unexpected type
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    /// A referenced environment variable is not set
    EnvSubst { var: String, key: String },
}

impl ParseError {
    fn wrong_type(key: &str, expected: &'static str, found: &Value) -> Self {
        ParseError::WrongType {
            key: key.to_string(),
            expected,
            found: found.type_str(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Io(e) => write!(f, "I/O error: {}", e),
            ParseError::Toml(e) => write!(f, "TOML parsing error: {}", e),
            ParseError::Missing(key) => {
                write!(f, "No configuration setting found for key '{}'", key)
            }
            ParseError::WrongType {
                key,
                expected,
                found,
            } => write!(
                f,
                "Configuration key '{}' has type {} rather than {}",
                key, found, expected
            ),
            ParseError::EnvSubst { var, key } => write!(
                f,
                "Environment variable '{}' is not set (required by key '{}')",
                var, key
            ),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            ParseError::Toml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::Io(e)
    }
}

impl From<toml::de::Error> for ParseError {
    fn from(e: toml::de::Error) -> Self {
        ParseError::Toml(e)
    }
}
