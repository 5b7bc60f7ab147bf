//! Value objects used to address configuration data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selects a configuration instance, such as a revision of a configuration
/// repository or the name of a logical environment.
///
/// File providers may translate a context into a canonical form (for
/// instance, a branch name into a commit hash); the result of that
/// translation is again a `Context`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    name: String,
}

impl Context {
    /// Name of the context used when callers do not supply one.
    pub const DEFAULT_NAME: &'static str = "default";

    /// Creates a context with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The name of this context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the default context.
    pub fn is_default(&self) -> bool {
        self.name == Self::DEFAULT_NAME
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Context {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Context {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Identifies a logical resource: a configuration file or a secret.
///
/// The manager treats paths as opaque; only providers interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    path: String,
}

impl Path {
    /// Creates a path from its string form.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The string form of this path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a path for `name` located below this one, separated by `/`.
    pub fn child(&self, name: &str) -> Path {
        Path::new(format!("{}/{}", self.path, name))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<&str> for Path {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Path {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}
