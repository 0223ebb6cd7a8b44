use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::core::functions::resolve_function;
use crate::error::ConfigError;
use crate::models::collection::Collection;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{([^}]+)\}\}").unwrap();
}

pub const BASE_URL: &str = "baseUrl";

/// Single-pass `{{name}}` substitution.
///
/// Lookup order per token: `$` builtins, per-run variables, globals, process
/// environment. Anything else is left as written. Substituted values are not
/// scanned again.
#[derive(Debug, Default, Clone)]
pub struct Resolver {
    variables: HashMap<String, String>,
    globals: HashMap<String, String>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the per-run variables with those of `env_name`.
    ///
    /// A collection that declares environments must contain `env_name`; one
    /// that declares none only contributes its top-level base url.
    pub fn load_environment(
        &mut self,
        collection: &Collection,
        env_name: &str,
    ) -> Result<(), ConfigError> {
        self.variables.clear();

        match collection.environment.get(env_name) {
            Some(env) => {
                self.variables
                    .insert(BASE_URL.to_string(), env.base_url.clone());
                self.variables.extend(
                    env.variables
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
            }
            None if !collection.environment.is_empty() => {
                return Err(ConfigError::UnknownEnvironment {
                    name: env_name.to_string(),
                    collection: collection.name.clone(),
                });
            }
            None => {}
        }

        let base_url_missing = self
            .variables
            .get(BASE_URL)
            .map_or(true, |v| v.is_empty());
        if !collection.base_url.is_empty() && base_url_missing {
            self.variables
                .insert(BASE_URL.to_string(), collection.base_url.clone());
        }
        Ok(())
    }

    /// Survives `load_environment`.
    pub fn set_global(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.globals.insert(key.into(), value.into());
    }

    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn variable(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    pub fn resolve(&self, s: &str) -> String {
        PLACEHOLDER
            .replace_all(s, |caps: &Captures| {
                let key = caps[1].trim();
                self.lookup(key)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if key.starts_with('$') {
            return Some(resolve_function(key));
        }
        self.variables
            .get(key)
            .or_else(|| self.globals.get(key))
            .cloned()
            .or_else(|| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Applies [`Resolver::resolve`] to every string leaf.
    pub fn resolve_body(&self, body: &Value) -> Value {
        match body {
            Value::String(s) => Value::String(self.resolve(s)),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.resolve_body(v)))
                    .collect(),
            ),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.resolve_body(v)).collect())
            }
            other => other.clone(),
        }
    }
}
