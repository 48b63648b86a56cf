//! Environment file loading utilities

use std::path::Path;

use super::FlatConfig;

/// Load `.env` and then `.env.{app_env}` from the application folder into `config`.
/// Values from the environment-specific file win.
pub fn load_env_files(folder: &Path, app_env: Option<&str>, config: &mut FlatConfig) {
    load_env_file(folder, ".env", config);

    if let Some(app_env) = app_env {
        load_env_file(folder, &format!(".env.{}", app_env), config);
    }
}

/// Load a single .env file
///
/// # Arguments
/// * `folder` - The directory containing the .env file
/// * `filename` - The name of the .env file
/// * `config` - Receives every `KEY=value` pair found
pub fn load_env_file(folder: &Path, filename: &str, config: &mut FlatConfig) {
    let env_file = folder.join(filename);
    if !env_file.exists() {
        return;
    }

    let Ok(content) = std::fs::read_to_string(&env_file) else {
        tracing::warn!(path = %env_file.display(), "unreadable env file skipped");
        return;
    };

    parse_env_content(&content, config);
}

/// Parse `KEY=value` lines, skipping blanks and `#` comments.
pub fn parse_env_content(content: &str, config: &mut FlatConfig) {
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim();
        let value = value.trim().trim_matches('"').trim_matches('\'');

        config.set(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_content() {
        let mut config = FlatConfig::new();
        parse_env_content(
            r#"
# cache tuning
SOLI_URLMAPPING_CACHE_MAXSIZE="250"

soli.other.flag = 'on'
not a pair
"#,
            &mut config,
        );

        assert_eq!(config.get("soli.urlmapping.cache.maxsize"), Some("250"));
        assert_eq!(config.get("soli.other.flag"), Some("on"));
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn test_environment_file_overrides_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "soli.urlmapping.cache.maxsize=100\n").unwrap();
        std::fs::write(
            dir.path().join(".env.production"),
            "soli.urlmapping.cache.maxsize=900\n",
        )
        .unwrap();

        let mut config = FlatConfig::new();
        load_env_files(dir.path(), Some("production"), &mut config);
        assert_eq!(config.get("soli.urlmapping.cache.maxsize"), Some("900"));

        let mut config = FlatConfig::new();
        load_env_files(dir.path(), None, &mut config);
        assert_eq!(config.get("soli.urlmapping.cache.maxsize"), Some("100"));
    }
}
