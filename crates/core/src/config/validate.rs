use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Auto-close threshold is at least one hour
/// - Scheduler interval is at least one minute
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Auto-close validation
    if config.autoclose.after_hours == 0 {
        return Err(ConfigError::ValidationError(
            "autoclose.after_hours must be at least 1".to_string(),
        ));
    }
    if config.autoclose.interval_secs < 60 {
        return Err(ConfigError::ValidationError(
            "autoclose.interval_secs must be at least 60".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_threshold_fails() {
        let mut config = Config::default();
        config.autoclose.after_hours = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_sub_minute_interval_fails() {
        let mut config = Config::default();
        config.autoclose.interval_secs = 30;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));

        config.autoclose.interval_secs = 60;
        assert!(validate_config(&config).is_ok());
    }
}
