//! Authorization middleware and extractors for Axum.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use orgwarden_access::{GateDecision, Principal};
use tracing::debug;

use super::{
    SESSION_COOKIE, SecurityProvider,
    routes::{removal_cookie, session_id_from},
};

/// Runs the membership gate in front of the wrapped routes.
///
/// On allow, the principal is placed in the request extensions for
/// [`CurrentPrincipal`]. On reject, the session cookie is dropped and the
/// client is sent to the authentication entry point.
pub async fn require_membership(
    State(provider): State<SecurityProvider>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let session_id = session_id_from(&jar);

    match provider.gate.authorize(session_id.as_ref()).await {
        GateDecision::Allow(principal) => {
            request.extensions_mut().insert(*principal);
            next.run(request).await
        }
        GateDecision::RejectRedirect { reason } => {
            debug!(?reason, path = %request.uri().path(), "request rejected");
            (
                jar.add(removal_cookie(SESSION_COOKIE)),
                Redirect::to(provider.config().authenticate_url()),
            )
                .into_response()
        }
    }
}

/// Extractor for the principal admitted by [`require_membership`].
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentPrincipal)
            .ok_or(AuthRejection::NotAuthorized)
    }
}

/// Rejection type for [`CurrentPrincipal`].
#[derive(Debug)]
pub enum AuthRejection {
    /// The route is not behind the membership gate.
    NotAuthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthorized => (StatusCode::UNAUTHORIZED, "Not authorized").into_response(),
        }
    }
}
