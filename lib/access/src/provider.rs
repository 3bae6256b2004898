//! The OAuth transport seam.
//!
//! The cryptographic handshake is someone else's job. The core only needs a
//! URL to send the user to and, once the provider calls back, the access token
//! plus the identity it belongs to.

use async_trait::async_trait;
use rootcause::prelude::Report;

use crate::error::ProviderError;

/// Identity delivered by the provider after a successful code exchange.
///
/// The identity fields are optional because providers do not guarantee them;
/// the callback handler rejects a profile that lacks either one.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Provider-side user ID.
    pub external_user_id: Option<String>,
    /// Login handle.
    pub username: Option<String>,
    /// Access token issued for the configured scope.
    pub access_token: String,
}

impl ProviderProfile {
    /// Creates a profile with both identity fields present.
    #[must_use]
    pub fn new(
        external_user_id: impl Into<String>,
        username: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            external_user_id: Some(external_user_id.into()),
            username: Some(username.into()),
            access_token: access_token.into(),
        }
    }
}

impl std::fmt::Debug for ProviderProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderProfile")
            .field("external_user_id", &self.external_user_id)
            .field("username", &self.username)
            .field("access_token", &"[redacted]")
            .finish()
    }
}

/// Where to send the user to start a login, and the CSRF state to expect back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// The provider's authorization URL, fully parameterized.
    pub url: String,
    /// State parameter for CSRF protection (store in a cookie for the callback).
    pub csrf_state: String,
}

/// OAuth code-grant transport.
#[async_trait]
pub trait OAuthTransport: Send + Sync {
    /// Builds the authorization redirect for a new login.
    fn authorization_request(&self) -> AuthorizationRequest;

    /// Exchanges an authorization code for a token and the matching profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the code exchange or the profile fetch fails.
    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, Report<ProviderError>>;
}
