//! GitHub OAuth code grant.
//!
//! The token exchange is delegated to the `oauth2` crate. GitHub's token
//! response carries no identity, so the profile is fetched from `GET /user`
//! with the fresh token.

use async_trait::async_trait;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EmptyExtraTokenFields,
    RedirectUrl, Scope, StandardTokenResponse, TokenResponse, TokenUrl,
    basic::{BasicClient, BasicTokenType},
};
use orgwarden_access::{
    AuthorizationRequest, OAuthTransport, ProviderConfig, ProviderError, ProviderProfile,
};
use reqwest::header;
use rootcause::prelude::Report;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{GITHUB_ACCEPT, GithubEndpoints, http_client};

/// Type alias for the token response type.
type GithubTokenResponse = StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>;

/// The fields of `GET /user` the profile needs.
#[derive(Debug, Deserialize)]
struct GithubUser {
    id: Option<u64>,
    login: Option<String>,
}

/// OAuth transport for github.com (or a GitHub Enterprise host).
#[derive(Clone)]
pub struct GithubOAuthClient {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    scope: String,
    api_base: String,
    http: reqwest::Client,
}

impl GithubOAuthClient {
    /// Creates a client from the validated provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any endpoint or the callback URL is not a valid
    /// URL, or the HTTP client cannot be built.
    pub fn new(
        config: &ProviderConfig,
        endpoints: &GithubEndpoints,
    ) -> Result<Self, Report<ProviderError>> {
        let auth_url = AuthUrl::new(endpoints.authorize_url.clone()).map_err(|e| {
            ProviderError::Configuration {
                details: format!("invalid authorize URL: {e}"),
            }
        })?;
        let token_url = TokenUrl::new(endpoints.token_url.clone()).map_err(|e| {
            ProviderError::Configuration {
                details: format!("invalid token URL: {e}"),
            }
        })?;
        let redirect_url = RedirectUrl::new(config.callback_url().to_string()).map_err(|e| {
            ProviderError::Configuration {
                details: format!("invalid callback URL: {e}"),
            }
        })?;

        let http = http_client(None).map_err(|e| ProviderError::Configuration {
            details: format!("failed to create HTTP client: {e}"),
        })?;

        Ok(Self {
            client_id: ClientId::new(config.client_id().to_string()),
            client_secret: ClientSecret::new(config.client_secret().to_string()),
            auth_url,
            token_url,
            redirect_url,
            scope: config.scope().to_string(),
            api_base: endpoints.api_base.clone(),
            http,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<GithubUser, Report<ProviderError>> {
        let response = self
            .http
            .get(format!("{}/user", self.api_base))
            .bearer_auth(access_token)
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .send()
            .await
            .map_err(|e| ProviderError::ProfileFetch {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ProfileFetch {
                details: format!("GitHub returned status {}", status.as_u16()),
            }
            .into());
        }

        let user = response
            .json::<GithubUser>()
            .await
            .map_err(|e| ProviderError::ProfileFetch {
                details: format!("invalid user payload: {e}"),
            })?;

        Ok(user)
    }
}

#[async_trait]
impl OAuthTransport for GithubOAuthClient {
    fn authorization_request(&self) -> AuthorizationRequest {
        let client = BasicClient::new(self.client_id.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let (auth_url, csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(self.scope.clone()))
            .url();

        AuthorizationRequest {
            url: auth_url.to_string(),
            csrf_state: csrf_token.secret().clone(),
        }
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, Report<ProviderError>> {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let token_response: GithubTokenResponse = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| ProviderError::CodeExchange {
                details: e.to_string(),
            })?;

        let access_token = token_response.access_token().secret().clone();
        let user = self.fetch_profile(&access_token).await?;
        debug!(login = ?user.login, "fetched GitHub profile");

        Ok(ProviderProfile {
            external_user_id: user.id.map(|id| id.to_string()),
            username: user.login,
            access_token,
        })
    }
}
