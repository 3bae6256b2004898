//! HTTP wiring for organization-membership access control.
//!
//! [`SecurityProvider`] owns the login flow and the per-request gate, and
//! hands them to axum in two pieces:
//! - [`SecurityProvider::authenticate_routes`]: `/auth/login`,
//!   `/auth/callback` and `/auth/logout`
//! - [`SecurityProvider::authorize`]: middleware that lets a request through
//!   only while its session belongs to a verified organization member
//!
//! Only an opaque session ID travels in the cookie; the principal itself
//! stays in the [`SessionStore`].

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{Router, routing::get};
use orgwarden_access::{
    AuthorizationGate, CallbackHandler, MembershipOracle, OAuthTransport, ProviderConfig,
    SessionStore,
};

use crate::config::SessionConfig;

pub use middleware::{AuthRejection, CurrentPrincipal, require_membership};
pub use routes::{AuthError, callback, login, logout};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Auth state cookie name (for CSRF protection during the OAuth flow).
pub const AUTH_STATE_COOKIE: &str = "auth_state";

/// Entry point for securing an axum application.
#[derive(Clone)]
pub struct SecurityProvider {
    callback: CallbackHandler,
    gate: AuthorizationGate,
    transport: Arc<dyn OAuthTransport>,
    store: Arc<dyn SessionStore>,
    session_config: SessionConfig,
}

impl SecurityProvider {
    /// Builds the callback handler and gate over the injected collaborators.
    #[must_use]
    pub fn new(
        config: ProviderConfig,
        transport: Arc<dyn OAuthTransport>,
        oracle: Arc<dyn MembershipOracle>,
        store: Arc<dyn SessionStore>,
        session_config: SessionConfig,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            callback: CallbackHandler::new(config.clone(), oracle.clone()),
            gate: AuthorizationGate::new(config, oracle, store.clone()),
            transport,
            store,
            session_config,
        }
    }

    /// Returns the validated provider configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        self.gate.config()
    }

    /// Routes that drive the OAuth handshake. These must stay outside
    /// [`SecurityProvider::authorize`].
    pub fn authenticate_routes(&self) -> Router {
        Router::new()
            .route("/auth/login", get(login))
            .route("/auth/callback", get(callback))
            .route("/auth/logout", get(logout))
            .with_state(self.clone())
    }

    /// Wraps every route in `router` with the membership gate.
    pub fn authorize(&self, router: Router) -> Router {
        router.layer(axum::middleware::from_fn_with_state(
            self.clone(),
            require_membership,
        ))
    }
}
