//! The login half: turning a provider callback into a verified principal.
//!
//! Runs once per login. The provider profile is checked for identity fields,
//! the membership oracle is asked exactly once, and a principal is produced
//! only on a confirmed membership. Any oracle failure ends the attempt.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::AuthenticationError;
use crate::membership::{MembershipOracle, MembershipQuery, MembershipVerdict, check_with_timeout};
use crate::principal::Principal;
use crate::provider::{OAuthTransport, ProviderProfile};

/// Builds principals for completed OAuth logins.
#[derive(Clone)]
pub struct CallbackHandler {
    config: Arc<ProviderConfig>,
    oracle: Arc<dyn MembershipOracle>,
}

impl CallbackHandler {
    /// Creates a handler enforcing `config.organization()`.
    #[must_use]
    pub fn new(config: Arc<ProviderConfig>, oracle: Arc<dyn MembershipOracle>) -> Self {
        Self { config, oracle }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Exchanges `code` through `transport` and authenticates the resulting profile.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::ProviderExchange`] if the transport fails,
    /// otherwise whatever [`CallbackHandler::authenticate`] returns.
    #[instrument(skip_all, fields(organization = %self.config.organization()))]
    pub async fn complete(
        &self,
        transport: &dyn OAuthTransport,
        code: &str,
    ) -> Result<Principal, AuthenticationError> {
        let profile = transport.exchange_code(code).await.map_err(|e| {
            warn!(error = %e, "OAuth code exchange failed");
            AuthenticationError::ProviderExchange {
                reason: e.to_string(),
            }
        })?;

        self.authenticate(profile).await
    }

    /// Verifies membership for a provider profile and builds the principal.
    ///
    /// The principal's `expires_at` is set to now plus the configured TTL; all
    /// other fields are taken from the profile unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::MissingProfileField`] if the profile lacks
    /// an identity field and [`AuthenticationError::NotAMember`] if the oracle
    /// denies membership or cannot be reached.
    #[instrument(skip_all, fields(username = ?profile.username))]
    pub async fn authenticate(
        &self,
        profile: ProviderProfile,
    ) -> Result<Principal, AuthenticationError> {
        let ProviderProfile {
            external_user_id,
            username,
            access_token,
        } = profile;

        let username = username.ok_or(AuthenticationError::MissingProfileField {
            field: "username",
        })?;
        let external_user_id = external_user_id.ok_or(AuthenticationError::MissingProfileField {
            field: "external_user_id",
        })?;

        let organization = self.config.organization();
        let query = MembershipQuery {
            username: &username,
            organization,
            access_token: &access_token,
        };

        match check_with_timeout(self.oracle.as_ref(), &query, self.config.oracle_timeout()).await
        {
            Ok(MembershipVerdict::Member) => {}
            Ok(MembershipVerdict::NotMember) => {
                info!(%username, %organization, "login denied: not a member");
                return Err(self.not_a_member());
            }
            Err(e) => {
                warn!(%username, %organization, error = %e, "login denied: membership check failed");
                return Err(self.not_a_member());
            }
        }

        let principal = Principal::new(username, external_user_id, access_token)
            .verified_at(Utc::now(), self.config.ttl());

        info!(
            username = %principal.username(),
            %organization,
            "login succeeded"
        );

        Ok(principal)
    }

    fn not_a_member(&self) -> AuthenticationError {
        AuthenticationError::NotAMember {
            organization: self.config.organization().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OracleError, ProviderError};
    use crate::provider::AuthorizationRequest;
    use async_trait::async_trait;
    use chrono::Duration;
    use rootcause::prelude::Report;
    use std::sync::Mutex;

    /// Oracle returning a fixed answer and recording every query.
    struct ScriptedOracle {
        answer: Result<MembershipVerdict, OracleError>,
        queries: Mutex<Vec<(String, String, String)>>,
    }

    impl ScriptedOracle {
        fn new(answer: Result<MembershipVerdict, OracleError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                queries: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> Vec<(String, String, String)> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MembershipOracle for ScriptedOracle {
        async fn check_membership(
            &self,
            query: &MembershipQuery<'_>,
        ) -> Result<MembershipVerdict, Report<OracleError>> {
            self.queries.lock().unwrap().push((
                query.username.to_string(),
                query.organization.to_string(),
                query.access_token.to_string(),
            ));
            self.answer.clone().map_err(Report::from)
        }
    }

    struct FixedTransport(Result<ProviderProfile, ProviderError>);

    #[async_trait]
    impl OAuthTransport for FixedTransport {
        fn authorization_request(&self) -> AuthorizationRequest {
            AuthorizationRequest {
                url: "https://provider.example/authorize".to_string(),
                csrf_state: "state".to_string(),
            }
        }

        async fn exchange_code(
            &self,
            _code: &str,
        ) -> Result<ProviderProfile, Report<ProviderError>> {
            self.0.clone().map_err(Report::from)
        }
    }

    fn config() -> Arc<ProviderConfig> {
        Arc::new(
            ProviderConfig::builder()
                .client_id("client-id")
                .client_secret("client-secret")
                .callback_url("https://app.example.com/auth/callback")
                .organization("acme")
                .ttl_seconds(3600)
                .build()
                .unwrap(),
        )
    }

    fn profile() -> ProviderProfile {
        ProviderProfile::new("583231", "octocat", "gho_token")
    }

    #[tokio::test]
    async fn member_gets_fresh_principal() {
        let oracle = ScriptedOracle::new(Ok(MembershipVerdict::Member));
        let handler = CallbackHandler::new(config(), oracle.clone());

        let before = Utc::now();
        let principal = handler.authenticate(profile()).await.unwrap();
        let after = Utc::now();

        assert_eq!(principal.username(), "octocat");
        assert_eq!(principal.external_user_id(), "583231");
        assert_eq!(principal.access_token(), "gho_token");

        let expires_at = principal.expires_at().unwrap();
        assert!(expires_at >= before + Duration::hours(1));
        assert!(expires_at <= after + Duration::hours(1));

        assert_eq!(
            oracle.queries(),
            vec![(
                "octocat".to_string(),
                "acme".to_string(),
                "gho_token".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn non_member_is_rejected_with_organization() {
        let oracle = ScriptedOracle::new(Ok(MembershipVerdict::NotMember));
        let handler = CallbackHandler::new(config(), oracle.clone());

        let err = handler.authenticate(profile()).await.unwrap_err();

        assert_eq!(
            err,
            AuthenticationError::NotAMember {
                organization: "acme".to_string()
            }
        );
        assert!(err.to_string().contains("acme"));
        assert_eq!(oracle.queries().len(), 1);
    }

    #[tokio::test]
    async fn oracle_failure_is_treated_as_denial() {
        let oracle = ScriptedOracle::new(Err(OracleError::UnexpectedStatus { status: 502 }));
        let handler = CallbackHandler::new(config(), oracle.clone());

        let err = handler.authenticate(profile()).await.unwrap_err();

        assert!(matches!(err, AuthenticationError::NotAMember { .. }));
        // No retry.
        assert_eq!(oracle.queries().len(), 1);
    }

    #[tokio::test]
    async fn missing_username_skips_oracle() {
        let oracle = ScriptedOracle::new(Ok(MembershipVerdict::Member));
        let handler = CallbackHandler::new(config(), oracle.clone());
        let mut profile = profile();
        profile.username = None;

        let err = handler.authenticate(profile).await.unwrap_err();

        assert_eq!(
            err,
            AuthenticationError::MissingProfileField { field: "username" }
        );
        assert!(oracle.queries().is_empty());
    }

    #[tokio::test]
    async fn missing_external_id_skips_oracle() {
        let oracle = ScriptedOracle::new(Ok(MembershipVerdict::Member));
        let handler = CallbackHandler::new(config(), oracle.clone());
        let mut profile = profile();
        profile.external_user_id = None;

        let err = handler.authenticate(profile).await.unwrap_err();

        assert_eq!(
            err,
            AuthenticationError::MissingProfileField {
                field: "external_user_id"
            }
        );
        assert!(oracle.queries().is_empty());
    }

    #[tokio::test]
    async fn complete_runs_exchange_then_check() {
        let oracle = ScriptedOracle::new(Ok(MembershipVerdict::Member));
        let handler = CallbackHandler::new(config(), oracle.clone());
        let transport = FixedTransport(Ok(profile()));

        let principal = handler.complete(&transport, "code-123").await.unwrap();

        assert_eq!(principal.username(), "octocat");
        assert_eq!(oracle.queries().len(), 1);
    }

    #[tokio::test]
    async fn exchange_failure_never_reaches_oracle() {
        let oracle = ScriptedOracle::new(Ok(MembershipVerdict::Member));
        let handler = CallbackHandler::new(config(), oracle.clone());
        let transport = FixedTransport(Err(ProviderError::CodeExchange {
            details: "bad_verification_code".to_string(),
        }));

        let err = handler.complete(&transport, "stale").await.unwrap_err();

        match err {
            AuthenticationError::ProviderExchange { reason } => {
                assert!(reason.contains("bad_verification_code"));
            }
            other => panic!("expected ProviderExchange, got {other:?}"),
        }
        assert!(oracle.queries().is_empty());
    }
}
