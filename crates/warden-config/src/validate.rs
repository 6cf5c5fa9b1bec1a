//! Configuration validation logic.

use crate::Config;
use crate::loader::ConfigError;

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.listen.trim().is_empty() {
        return Err(ConfigError::Validation("server.listen is empty".into()));
    }
    if config.registry.path.trim().is_empty() {
        return Err(ConfigError::Validation("registry.path is empty".into()));
    }
    if config.registry.flush_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "registry.flush_interval_secs must be > 0".into(),
        ));
    }
    if config.registry.flush_max_pending == 0 {
        return Err(ConfigError::Validation(
            "registry.flush_max_pending must be > 0".into(),
        ));
    }
    if config.registry.io_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "registry.io_timeout_secs must be > 0".into(),
        ));
    }
    let valid_policies = ["empty", "fail"];
    if !valid_policies.contains(&config.registry.on_corrupt.as_str()) {
        return Err(ConfigError::Validation(format!(
            "registry.on_corrupt must be one of: {valid_policies:?}"
        )));
    }
    if let Some(level) = &config.logging.level {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of: {valid_levels:?}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        validate_config(&Config::default()).unwrap();
    }

    #[test]
    fn rejects_empty_listen() {
        let mut config = Config::default();
        config.server.listen = "  ".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_zero_flush_interval() {
        let mut config = Config::default();
        config.registry.flush_interval_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_unknown_corrupt_policy() {
        let mut config = Config::default();
        config.registry.on_corrupt = "panic".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = Config::default();
        config.logging.level = Some("loud".into());
        assert!(validate_config(&config).is_err());
    }
}
