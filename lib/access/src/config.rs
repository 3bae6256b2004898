//! OAuth provider configuration.
//!
//! Settings arrive as a loose [`ProviderSettings`] (from the environment or a
//! builder chain) and are validated exactly once into an immutable
//! [`ProviderConfig`]. Request handling only ever sees the validated form.

use std::fmt;
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::Deserialize;

use crate::error::ConfigurationError;

/// Default OAuth scope requested from the provider.
pub const DEFAULT_SCOPE: &str = "repo";

/// Default membership cache window: one day.
pub const DEFAULT_TTL_SECONDS: u64 = 86_400;

/// Upper bound on the membership cache window: ten years.
pub const MAX_TTL_SECONDS: u64 = 315_360_000;

/// Default path rejected requests are redirected to.
pub const DEFAULT_AUTHENTICATE_URL: &str = "/auth/login";

/// Default upper bound on a single membership query.
pub const DEFAULT_ORACLE_TIMEOUT_SECONDS: u64 = 10;

/// Validated provider configuration.
///
/// Never mutated after construction; share it behind an `Arc`.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    client_id: String,
    client_secret: String,
    callback_url: String,
    organization: String,
    scope: String,
    ttl_seconds: u64,
    authenticate_url: String,
    oracle_timeout: StdDuration,
}

impl ProviderConfig {
    /// Starts a settings chain to be validated with [`ProviderSettings::build`].
    #[must_use]
    pub fn builder() -> ProviderSettings {
        ProviderSettings::default()
    }

    /// Returns the OAuth client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the redirect target registered with the provider.
    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Returns the organization whose membership is enforced.
    #[must_use]
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Returns the OAuth scope requested at login.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns how long a membership verdict is trusted, in seconds.
    #[must_use]
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Returns the membership cache window.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_seconds as i64)
    }

    /// Returns where unauthenticated or revoked requests are redirected.
    #[must_use]
    pub fn authenticate_url(&self) -> &str {
        &self.authenticate_url
    }

    /// Returns the upper bound on a single membership query.
    #[must_use]
    pub fn oracle_timeout(&self) -> StdDuration {
        self.oracle_timeout
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("callback_url", &self.callback_url)
            .field("organization", &self.organization)
            .field("scope", &self.scope)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("authenticate_url", &self.authenticate_url)
            .field("oracle_timeout", &self.oracle_timeout)
            .finish()
    }
}

impl TryFrom<ProviderSettings> for ProviderConfig {
    type Error = ConfigurationError;

    fn try_from(settings: ProviderSettings) -> Result<Self, Self::Error> {
        settings.build()
    }
}

/// Unvalidated provider settings.
///
/// Deserializable so it can sit inside a `config`-loaded server configuration,
/// and chainable so tests and embedders can build one in code.
#[derive(Clone, Default, Deserialize)]
pub struct ProviderSettings {
    client_id: Option<String>,
    client_secret: Option<String>,
    callback_url: Option<String>,
    organization: Option<String>,
    scope: Option<String>,
    ttl_seconds: Option<u64>,
    authenticate_url: Option<String>,
    oracle_timeout_seconds: Option<u64>,
    #[serde(skip)]
    oracle_timeout: Option<StdDuration>,
}

impl ProviderSettings {
    /// Sets the OAuth client ID.
    #[must_use]
    pub fn client_id(mut self, value: impl Into<String>) -> Self {
        self.client_id = Some(value.into());
        self
    }

    /// Sets the OAuth client secret.
    #[must_use]
    pub fn client_secret(mut self, value: impl Into<String>) -> Self {
        self.client_secret = Some(value.into());
        self
    }

    /// Sets the callback URL registered with the provider.
    #[must_use]
    pub fn callback_url(mut self, value: impl Into<String>) -> Self {
        self.callback_url = Some(value.into());
        self
    }

    /// Sets the organization to enforce.
    #[must_use]
    pub fn organization(mut self, value: impl Into<String>) -> Self {
        self.organization = Some(value.into());
        self
    }

    /// Overrides the OAuth scope.
    #[must_use]
    pub fn scope(mut self, value: impl Into<String>) -> Self {
        self.scope = Some(value.into());
        self
    }

    /// Overrides the membership cache window.
    #[must_use]
    pub fn ttl_seconds(mut self, value: u64) -> Self {
        self.ttl_seconds = Some(value);
        self
    }

    /// Overrides the redirect target for rejected requests.
    #[must_use]
    pub fn authenticate_url(mut self, value: impl Into<String>) -> Self {
        self.authenticate_url = Some(value.into());
        self
    }

    /// Overrides the per-query oracle timeout.
    #[must_use]
    pub fn oracle_timeout(mut self, value: StdDuration) -> Self {
        self.oracle_timeout = Some(value);
        self
    }

    /// Validates the settings.
    ///
    /// Required fields are checked in a fixed order and the first one that is
    /// absent or blank is reported.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingField`] for a missing required
    /// setting, [`ConfigurationError::InvalidTtl`] for a TTL outside
    /// `1..=MAX_TTL_SECONDS` and [`ConfigurationError::InvalidOracleTimeout`]
    /// for a zero oracle timeout.
    pub fn build(self) -> Result<ProviderConfig, ConfigurationError> {
        let callback_url = required(self.callback_url, "callback_url")?;
        let client_id = required(self.client_id, "client_id")?;
        let client_secret = required(self.client_secret, "client_secret")?;
        let organization = required(self.organization, "organization")?;

        let ttl_seconds = self.ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS);
        if ttl_seconds == 0 || ttl_seconds > MAX_TTL_SECONDS {
            return Err(ConfigurationError::InvalidTtl);
        }

        let oracle_timeout = self.oracle_timeout.unwrap_or_else(|| {
            StdDuration::from_secs(
                self.oracle_timeout_seconds
                    .unwrap_or(DEFAULT_ORACLE_TIMEOUT_SECONDS),
            )
        });
        if oracle_timeout.is_zero() {
            return Err(ConfigurationError::InvalidOracleTimeout);
        }

        Ok(ProviderConfig {
            client_id,
            client_secret,
            callback_url,
            organization,
            scope: non_blank(self.scope).unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            ttl_seconds,
            authenticate_url: non_blank(self.authenticate_url)
                .unwrap_or_else(|| DEFAULT_AUTHENTICATE_URL.to_string()),
            oracle_timeout,
        })
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[redacted]"))
            .field("callback_url", &self.callback_url)
            .field("organization", &self.organization)
            .field("scope", &self.scope)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("authenticate_url", &self.authenticate_url)
            .finish_non_exhaustive()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigurationError> {
    non_blank(value).ok_or(ConfigurationError::MissingField { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ProviderSettings {
        ProviderConfig::builder()
            .client_id("client-id")
            .client_secret("client-secret")
            .callback_url("https://app.example.com/auth/callback")
            .organization("acme")
    }

    #[test]
    fn builds_with_defaults() {
        let config = complete().build().expect("valid config");

        assert_eq!(config.client_id(), "client-id");
        assert_eq!(config.client_secret(), "client-secret");
        assert_eq!(config.callback_url(), "https://app.example.com/auth/callback");
        assert_eq!(config.organization(), "acme");
        assert_eq!(config.scope(), "repo");
        assert_eq!(config.ttl_seconds(), 86_400);
        assert_eq!(config.ttl(), Duration::days(1));
        assert_eq!(config.authenticate_url(), "/auth/login");
        assert_eq!(config.oracle_timeout(), StdDuration::from_secs(10));
    }

    #[test]
    fn overrides_apply() {
        let config = complete()
            .scope("read:org")
            .ttl_seconds(60)
            .authenticate_url("/login")
            .oracle_timeout(StdDuration::from_millis(250))
            .build()
            .expect("valid config");

        assert_eq!(config.scope(), "read:org");
        assert_eq!(config.ttl(), Duration::seconds(60));
        assert_eq!(config.authenticate_url(), "/login");
        assert_eq!(config.oracle_timeout(), StdDuration::from_millis(250));
    }

    #[test]
    fn each_required_field_is_enforced() {
        let cases: [(ProviderSettings, &'static str); 4] = [
            (
                ProviderConfig::builder()
                    .client_secret("s")
                    .callback_url("https://cb")
                    .organization("o"),
                "client_id",
            ),
            (
                ProviderConfig::builder()
                    .client_id("c")
                    .callback_url("https://cb")
                    .organization("o"),
                "client_secret",
            ),
            (
                ProviderConfig::builder()
                    .client_id("c")
                    .client_secret("s")
                    .organization("o"),
                "callback_url",
            ),
            (
                ProviderConfig::builder()
                    .client_id("c")
                    .client_secret("s")
                    .callback_url("https://cb"),
                "organization",
            ),
        ];

        for (settings, field) in cases {
            assert_eq!(
                settings.build(),
                Err(ConfigurationError::MissingField { field })
            );
        }
    }

    #[test]
    fn blank_required_field_is_missing() {
        let err = complete().organization("   ").build().expect_err("blank org");
        assert_eq!(
            err,
            ConfigurationError::MissingField {
                field: "organization"
            }
        );
    }

    #[test]
    fn callback_url_is_reported_first() {
        let err = ProviderConfig::builder().build().expect_err("empty settings");
        assert_eq!(
            err,
            ConfigurationError::MissingField {
                field: "callback_url"
            }
        );
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let err = complete().ttl_seconds(0).build().expect_err("zero ttl");
        assert_eq!(err, ConfigurationError::InvalidTtl);
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        let err = complete()
            .ttl_seconds(MAX_TTL_SECONDS + 1)
            .build()
            .expect_err("huge ttl");
        assert_eq!(err, ConfigurationError::InvalidTtl);
    }

    #[test]
    fn zero_oracle_timeout_is_rejected() {
        let err = complete()
            .oracle_timeout(StdDuration::ZERO)
            .build()
            .expect_err("zero timeout");
        assert_eq!(err, ConfigurationError::InvalidOracleTimeout);

        let settings: ProviderSettings = serde_json::from_str(
            r#"{
                "client_id": "c",
                "client_secret": "s",
                "callback_url": "https://cb",
                "organization": "o",
                "oracle_timeout_seconds": 0
            }"#,
        )
        .expect("deserialize");
        assert_eq!(
            settings.build(),
            Err(ConfigurationError::InvalidOracleTimeout)
        );
    }

    #[test]
    fn deserializes_and_validates() {
        let json = r#"{
            "client_id": "my-client",
            "client_secret": "secret",
            "callback_url": "https://app.example.com/callback",
            "organization": "acme",
            "ttl_seconds": 300,
            "oracle_timeout_seconds": 3
        }"#;

        let settings: ProviderSettings = serde_json::from_str(json).expect("deserialize");
        let config = ProviderConfig::try_from(settings).expect("valid config");

        assert_eq!(config.ttl_seconds(), 300);
        assert_eq!(config.scope(), "repo");
        assert_eq!(config.oracle_timeout(), StdDuration::from_secs(3));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = complete().build().expect("valid config");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("client-secret"));
        assert!(rendered.contains("[redacted]"));

        let rendered = format!("{:?}", complete());
        assert!(!rendered.contains("client-secret"));
    }
}
