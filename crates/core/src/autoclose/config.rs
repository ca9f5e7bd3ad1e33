//! Auto-close scheduler configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Configuration for the auto-close scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoCloseConfig {
    /// Enable/disable the scheduler.
    /// When disabled, tickets are only ever closed by an administrator.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Close open tickets after this many hours without a user reply to a
    /// support message.
    #[serde(default = "default_after_hours")]
    pub after_hours: u64,

    /// How often to scan for idle tickets (seconds).
    /// Values below 60 are rejected by config validation.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_after_hours() -> u64 {
    24
}

fn default_interval() -> u64 {
    3600 // 1 hour
}

impl Default for AutoCloseConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            after_hours: default_after_hours(),
            interval_secs: default_interval(),
        }
    }
}

impl AutoCloseConfig {
    /// The idle threshold as a duration.
    pub fn idle_threshold(&self) -> Duration {
        Duration::hours(self.after_hours as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AutoCloseConfig::default();
        assert!(config.enabled);
        assert_eq!(config.after_hours, 24);
        assert_eq!(config.interval_secs, 3600);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            enabled = false
        "#;
        let config: AutoCloseConfig = toml::from_str(toml).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.after_hours, 24);
        assert_eq!(config.interval_secs, 3600);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            enabled = true
            after_hours = 48
            interval_secs = 600
        "#;
        let config: AutoCloseConfig = toml::from_str(toml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.after_hours, 48);
        assert_eq!(config.interval_secs, 600);
    }

    #[test]
    fn test_idle_threshold() {
        let config = AutoCloseConfig {
            after_hours: 48,
            ..Default::default()
        };
        assert_eq!(config.idle_threshold(), Duration::hours(48));
    }
}
