//! Error types for configuration, controller loading and dispatch.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors. Raised while building a resolver, never at lookup time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::InvalidValue { key, .. } => key,
        }
    }
}

/// Errors raised while reading controller sources from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse controller '{path}': {message}")]
    ControllerParse { path: PathBuf, message: String },
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn controller_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ControllerParse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Io { path, .. } => path,
            Self::ControllerParse { path, .. } => path,
        }
    }
}

/// A unified error type for the dispatch layer.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Malformed feature id: {0}")]
    MalformedFeature(String),
}

impl DispatchError {
    pub fn malformed_feature(message: impl Into<String>) -> Self {
        Self::MalformedFeature(message.into())
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::invalid_value("soli.urlmapping.cache.maxsize", "lots", "not a number");
        assert_eq!(err.key(), "soli.urlmapping.cache.maxsize");
        assert_eq!(
            err.to_string(),
            "Invalid value 'lots' for 'soli.urlmapping.cache.maxsize': not a number"
        );

        let wrapped: DispatchError = err.into();
        assert!(wrapped.to_string().starts_with("Configuration error: "));
    }

    #[test]
    fn test_load_error_keeps_path() {
        let err = LoadError::controller_parse("app/controllers/x_controller.soli", "no class");
        assert_eq!(
            err.path(),
            &PathBuf::from("app/controllers/x_controller.soli")
        );
    }
}
