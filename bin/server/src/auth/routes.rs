//! Authentication routes for login, callback, and logout.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use orgwarden_access::AuthenticationError;
use orgwarden_core::SessionId;
use serde::Deserialize;
use time::Duration as TimeDuration;
use tracing::{error, info, instrument, warn};

use super::{AUTH_STATE_COOKIE, SESSION_COOKIE, SecurityProvider};

/// Query parameters for the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: String,
    state: String,
}

/// Starts the OAuth flow by redirecting to the provider.
pub async fn login(State(provider): State<SecurityProvider>, jar: CookieJar) -> impl IntoResponse {
    let request = provider.transport.authorization_request();

    let cookie = Cookie::build((AUTH_STATE_COOKIE, request.csrf_state))
        .path("/")
        .http_only(true)
        .secure(provider.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    (jar.add(cookie), Redirect::to(&request.url))
}

/// Handles the provider's redirect back after the user authorizes the app.
///
/// A new session ID is issued on every successful login so a session ID
/// planted before login is never promoted, and the principal of the
/// incoming session is cleared.
#[instrument(skip_all)]
pub async fn callback(
    State(provider): State<SecurityProvider>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let expected_state = jar
        .get(AUTH_STATE_COOKIE)
        .ok_or(AuthError::MissingAuthState)?;

    if query.state != expected_state.value() {
        return Err(AuthError::CsrfMismatch);
    }

    // Any login attempt ends the session the browser arrived with.
    if let Some(previous) = session_id_from(&jar) {
        if let Err(e) = provider.store.clear(&previous).await {
            warn!(error = %e, session_id = %previous, "failed to clear previous session");
        }
    }

    let principal = provider
        .callback
        .complete(provider.transport.as_ref(), &query.code)
        .await?;

    let session_id = SessionId::new();
    provider
        .store
        .save(&session_id, &principal)
        .await
        .map_err(|e| AuthError::SessionStore(e.to_string()))?;

    info!(
        username = %principal.username(),
        session_id = %session_id,
        "login complete"
    );

    let session_cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(provider.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(provider.session_config.cookie_max_age());

    let remove_auth_state = Cookie::build((AUTH_STATE_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    let jar = jar.add(session_cookie).add(remove_auth_state);

    Ok((jar, Redirect::to("/")))
}

/// Clears the session's principal and its cookie.
pub async fn logout(State(provider): State<SecurityProvider>, jar: CookieJar) -> impl IntoResponse {
    if let Some(session_id) = session_id_from(&jar) {
        if let Err(e) = provider.store.clear(&session_id).await {
            warn!(error = %e, session_id = %session_id, "failed to clear session on logout");
        }
    }

    (jar.add(removal_cookie(SESSION_COOKIE)), Redirect::to("/"))
}

/// Reads the session ID cookie. A malformed value counts as no session.
pub(super) fn session_id_from(jar: &CookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
}

/// A cookie that tells the browser to drop `name`.
pub(super) fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Login failures. None of them establish a session.
#[derive(Debug)]
pub enum AuthError {
    /// The callback arrived without the state cookie set at login.
    MissingAuthState,
    /// The returned state does not match the state cookie.
    CsrfMismatch,
    /// Code exchange, profile or membership check failed.
    Authentication(AuthenticationError),
    /// The new principal could not be stored.
    SessionStore(String),
}

impl From<AuthenticationError> for AuthError {
    fn from(e: AuthenticationError) -> Self {
        Self::Authentication(e)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingAuthState => (StatusCode::BAD_REQUEST, "Missing auth state".to_string()),
            Self::CsrfMismatch => (StatusCode::BAD_REQUEST, "CSRF token mismatch".to_string()),
            Self::Authentication(e @ AuthenticationError::NotAMember { .. }) => {
                warn!(error = %e, "login denied");
                (StatusCode::FORBIDDEN, format!("Access denied - {e}"))
            }
            Self::Authentication(e) => {
                error!(error = %e, "login failed");
                (StatusCode::BAD_GATEWAY, "Authentication failed".to_string())
            }
            Self::SessionStore(details) => {
                error!(error = %details, "failed to store session");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_member_is_forbidden() {
        let response = AuthError::from(AuthenticationError::NotAMember {
            organization: "acme".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn provider_failures_are_bad_gateway() {
        let exchange = AuthError::from(AuthenticationError::ProviderExchange {
            reason: "boom".to_string(),
        });
        let missing = AuthError::from(AuthenticationError::MissingProfileField { field: "login" });

        assert_eq!(exchange.into_response().status(), StatusCode::BAD_GATEWAY);
        assert_eq!(missing.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn state_problems_are_bad_requests() {
        assert_eq!(
            AuthError::MissingAuthState.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::CsrfMismatch.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
