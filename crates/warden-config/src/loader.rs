//! Configuration file loading and error types.

use std::{fs, path::Path};

use crate::Config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config format")]
    UnsupportedFormat,
    #[error("validation: {0}")]
    Validation(String),
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
        "json" | "jsonc" => {
            let stripped = json_comments::StripComments::new(data.as_bytes());
            Ok(serde_json::from_reader(stripped)?)
        }
        "yaml" | "yml" => Ok(serde_yaml::from_str(&data)?),
        "toml" => Ok(toml::from_str(&data)?),
        _ => Err(ConfigError::UnsupportedFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.toml",
            r#"
            [server]
            listen = "127.0.0.1:9000"

            [registry]
            path = "/var/lib/warden/users.json"
            reload_interval_secs = 10
            "#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:9000");
        assert_eq!(config.registry.path, "/var/lib/warden/users.json");
        assert_eq!(config.registry.reload_interval_secs, 10);
        // Unspecified sections fall back to defaults.
        assert_eq!(config.registry.flush_interval_secs, 5);
        assert!(config.metrics.listen.is_none());
    }

    #[test]
    fn loads_json_with_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.jsonc",
            r#"{
                // auth endpoint
                "server": {"listen": "0.0.0.0:28262"},
                "registry": {"on_corrupt": "fail"}
            }"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:28262");
        assert_eq!(config.registry.on_corrupt, "fail");
    }

    #[test]
    fn loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.yaml",
            "logging:\n  level: debug\n  format: json\n",
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.ini", "listen = x");
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::UnsupportedFormat)
        ));
    }
}
