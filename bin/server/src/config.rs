//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested keys (`GITHUB__CLIENT_ID`, `SESSION__DURATION_MINUTES`).
//!
//! See [`ProviderSettings`] for the GitHub provider keys.

use config::{Config, ConfigBuilder, ConfigError, builder::DefaultState};
use orgwarden_access::{ConfigurationError, ProviderConfig, ProviderSettings};
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// GitHub provider settings, validated by [`ServerConfig::provider_config`].
    #[serde(default)]
    pub github: ProviderSettings,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session duration in minutes, counted from login.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: u32,

    /// Interval between sweeps of ended sessions, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

impl SessionConfig {
    /// Session duration, at least one minute.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.duration_minutes.max(1)))
    }

    /// Max-Age for the session cookie, matching [`SessionConfig::duration`].
    #[must_use]
    pub fn cookie_max_age(&self) -> time::Duration {
        time::Duration::minutes(i64::from(self.duration_minutes.max(1)))
    }

    /// Interval between sweeps, at least one second.
    #[must_use]
    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cleanup_interval_seconds.max(1))
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_session_duration_minutes() -> u32 {
    8 * 60
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed into its field.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Config::builder().add_source(
            config::Environment::default()
                .separator("__")
                .try_parsing(true),
        ))
    }

    fn load(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// Validates the GitHub settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if a required setting is missing or the
    /// TTL is out of range.
    pub fn provider_config(&self) -> Result<ProviderConfig, ConfigurationError> {
        self.github.clone().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.duration_minutes, 480);
        assert_eq!(config.cleanup_interval_seconds, 300);
        assert!(config.secure_cookies);
        assert_eq!(config.duration(), chrono::Duration::hours(8));
        assert_eq!(config.cookie_max_age(), time::Duration::hours(8));
    }

    #[test]
    fn zero_durations_are_raised_to_the_minimum() {
        let config = SessionConfig {
            duration_minutes: 0,
            cleanup_interval_seconds: 0,
            secure_cookies: true,
        };
        assert_eq!(config.duration(), chrono::Duration::minutes(1));
        assert_eq!(config.cleanup_interval(), std::time::Duration::from_secs(1));
    }

    #[test]
    fn loads_nested_github_settings() {
        let builder = Config::builder()
            .set_override("github.client_id", "client-id")
            .unwrap()
            .set_override("github.client_secret", "client-secret")
            .unwrap()
            .set_override("github.callback_url", "https://app.example.com/auth/callback")
            .unwrap()
            .set_override("github.organization", "acme")
            .unwrap()
            .set_override("github.ttl_seconds", 60)
            .unwrap()
            .set_override("session.secure_cookies", false)
            .unwrap()
            .set_override("session.duration_minutes", 30)
            .unwrap();

        let config = ServerConfig::load(builder).unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert!(!config.session.secure_cookies);
        assert_eq!(config.session.duration_minutes, 30);

        let provider = config.provider_config().unwrap();
        assert_eq!(provider.organization(), "acme");
        assert_eq!(provider.ttl_seconds(), 60);
        assert_eq!(provider.scope(), "repo");
    }

    #[test]
    fn missing_github_settings_fail_validation() {
        let config = ServerConfig::load(Config::builder()).unwrap();

        let err = config.provider_config().unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingField {
                field: "callback_url"
            }
        );
    }
}
