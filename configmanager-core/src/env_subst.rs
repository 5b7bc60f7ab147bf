//! Environment variable substitution in configuration values.
//!
//! String values loaded from configuration files may reference environment
//! variables:
//!
//! - `${VAR}` is replaced by the value of `VAR`; loading fails if it is unset.
//! - `${VAR:-default}` falls back to `default` when `VAR` is unset.
//! - `$$` produces a literal `$`.
//!
//! An unclosed `${` and a `$` followed by anything else are kept verbatim.

use crate::ParseError;
use std::collections::HashMap;
use toml::{Table, Value};

/// Source of environment variable values, replaceable in tests.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the variables of the current process.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed set of variables.
impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Substitutes variables in all string values of `table`, recursing into
/// nested tables and arrays.
pub fn substitute_env_vars(table: &mut Table, env: &dyn EnvSource) -> Result<(), ParseError> {
    substitute_in_table(table, env, "")
}

fn substitute_in_table(table: &mut Table, env: &dyn EnvSource, prefix: &str) -> Result<(), ParseError> {
    for (key, value) in table.iter_mut() {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        substitute_in_value(value, env, &path)?;
    }
    Ok(())
}

fn substitute_in_value(value: &mut Value, env: &dyn EnvSource, path: &str) -> Result<(), ParseError> {
    match value {
        Value::String(s) => {
            if let Some(substituted) = substitute_in_string(s, env, path)? {
                *s = substituted;
            }
        }
        Value::Table(t) => substitute_in_table(t, env, path)?,
        Value::Array(items) => {
            for item in items {
                substitute_in_value(item, env, path)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Returns `None` if `input` needs no substitution.
fn substitute_in_string(input: &str, env: &dyn EnvSource, path: &str) -> Result<Option<String>, ParseError> {
    if !input.contains('$') {
        return Ok(None);
    }

    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        match chars.peek() {
            Some('$') => {
                chars.next();
                result.push('$');
            }
            Some('{') => {
                chars.next();
                let mut body = String::new();
                let mut closed = false;
                for ch in chars.by_ref() {
                    if ch == '}' {
                        closed = true;
                        break;
                    }
                    body.push(ch);
                }

                if !closed {
                    result.push_str("${");
                    result.push_str(&body);
                    continue;
                }

                let (var_name, default) = match body.split_once(":-") {
                    Some((name, default)) => (name, Some(default)),
                    None => (body.as_str(), None),
                };

                match (env.get(var_name), default) {
                    (Some(value), _) => result.push_str(&value),
                    (None, Some(default)) => result.push_str(default),
                    (None, None) => {
                        return Err(ParseError::EnvSubst {
                            var: var_name.to_string(),
                            key: path.to_string(),
                        });
                    }
                }
            }
            _ => result.push('$'),
        }
    }

    Ok(Some(result))
}
