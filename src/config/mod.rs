//! Runtime configuration for the dispatch layer.
//!
//! Configuration is a flat map of dotted keys (`soli.urlmapping.cache.maxsize`)
//! assembled from `.env` files in the application folder, then from `SOLI_*`
//! process environment variables. The running [`Environment`] comes from
//! `APP_ENV`.

pub mod env_loader;

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;

use crate::error::ConfigError;

/// Config key holding the maximum number of cached controller lookups.
pub const CACHE_MAX_SIZE_KEY: &str = "soli.urlmapping.cache.maxsize";

/// Cache size used when [`CACHE_MAX_SIZE_KEY`] is not configured.
pub const DEFAULT_CACHE_MAX_SIZE: usize = 10_000;

/// Initial key-table size of a resolution cache.
pub const INITIAL_CAPACITY: usize = 500;

/// Prefix of process environment variables folded into the flat config.
const ENV_PREFIX: &str = "SOLI_";

/// The mode the application runs in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    /// Live reload first: controller lookups are never cached.
    Development,
    Test,
    #[default]
    Production,
    Custom(String),
}

impl Environment {
    /// Parse an `APP_ENV` value. Unknown names are kept as [`Environment::Custom`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            "test" => Self::Test,
            "production" | "prod" | "" => Self::Production,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Read the current environment from `APP_ENV`, defaulting to production.
    pub fn current() -> Self {
        std::env::var("APP_ENV")
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flat key/value configuration with dotted, lower-case keys.
#[derive(Debug, Clone, Default)]
pub struct FlatConfig {
    values: HashMap<String, String>,
}

impl FlatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `.env` files from `folder` and overlay `SOLI_*` environment variables.
    pub fn load(folder: &Path, environment: &Environment) -> Self {
        let mut config = Self::new();
        env_loader::load_env_files(folder, Some(environment.name()), &mut config);
        config.overlay_env_vars(std::env::vars());
        config
    }

    /// Fold `SOLI_*` variables in, overriding existing keys.
    pub fn overlay_env_vars<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if key.starts_with(ENV_PREFIX) {
                self.set(&key, &value);
            }
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(normalize_key(key), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatConfig {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut config = Self::new();
        for (k, v) in iter {
            config.set(&k.into(), &v.into());
        }
        config
    }
}

/// `SOLI_URLMAPPING_CACHE_MAXSIZE` and `soli.urlmapping.cache.maxsize` name the same key.
fn normalize_key(key: &str) -> String {
    let key = key.trim();
    if key.contains('.') {
        key.to_ascii_lowercase()
    } else {
        key.to_ascii_lowercase().replace('_', ".")
    }
}

/// Settings consumed by the controller resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub environment: Environment,
    pub cache_max_size: NonZeroUsize,
}

impl ResolverConfig {
    /// Build from a flat config. A non-numeric or zero cache size is rejected here
    /// so misconfiguration never surfaces at request time.
    pub fn from_flat(config: &FlatConfig, environment: Environment) -> Result<Self, ConfigError> {
        let cache_max_size = match config.get(CACHE_MAX_SIZE_KEY) {
            None => DEFAULT_CACHE_MAX_SIZE,
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                ConfigError::invalid_value(CACHE_MAX_SIZE_KEY, raw, e.to_string())
            })?,
        };
        let cache_max_size = NonZeroUsize::new(cache_max_size).ok_or_else(|| {
            ConfigError::invalid_value(CACHE_MAX_SIZE_KEY, "0", "cache size must be positive")
        })?;

        Ok(Self {
            environment,
            cache_max_size,
        })
    }

    /// Whether lookups may be cached in this environment.
    pub fn caching_enabled(&self) -> bool {
        !self.environment.is_development()
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            cache_max_size: NonZeroUsize::new(DEFAULT_CACHE_MAX_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse("DEV"), Environment::Development);
        assert_eq!(Environment::parse("test"), Environment::Test);
        assert_eq!(Environment::parse("prod"), Environment::Production);
        assert_eq!(
            Environment::parse("staging"),
            Environment::Custom("staging".to_string())
        );
        assert_eq!(Environment::parse("staging").to_string(), "staging");
    }

    #[test]
    fn test_cache_size_defaults() {
        let config = ResolverConfig::from_flat(&FlatConfig::new(), Environment::Production).unwrap();
        assert_eq!(config.cache_max_size.get(), DEFAULT_CACHE_MAX_SIZE);
        assert!(config.caching_enabled());
    }

    #[test]
    fn test_cache_size_from_config() {
        let flat: FlatConfig = [(CACHE_MAX_SIZE_KEY, " 42 ")].into_iter().collect();
        let config = ResolverConfig::from_flat(&flat, Environment::Test).unwrap();
        assert_eq!(config.cache_max_size.get(), 42);
    }

    #[test]
    fn test_non_numeric_cache_size_fails_fast() {
        let flat: FlatConfig = [(CACHE_MAX_SIZE_KEY, "lots")].into_iter().collect();
        let err = ResolverConfig::from_flat(&flat, Environment::Production).unwrap_err();
        assert_eq!(err.key(), CACHE_MAX_SIZE_KEY);

        let flat: FlatConfig = [(CACHE_MAX_SIZE_KEY, "0")].into_iter().collect();
        assert!(ResolverConfig::from_flat(&flat, Environment::Production).is_err());
    }

    #[test]
    fn test_development_disables_caching() {
        let config =
            ResolverConfig::from_flat(&FlatConfig::new(), Environment::Development).unwrap();
        assert!(!config.caching_enabled());
    }

    #[test]
    fn test_env_vars_override_files() {
        let mut flat: FlatConfig = [(CACHE_MAX_SIZE_KEY, "10")].into_iter().collect();
        flat.overlay_env_vars(vec![
            ("SOLI_URLMAPPING_CACHE_MAXSIZE".to_string(), "77".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ]);
        assert_eq!(flat.get(CACHE_MAX_SIZE_KEY), Some("77"));
        assert_eq!(flat.len(), 1);
    }
}
