//! The per-request authorization gate.
//!
//! Every protected request runs the same small state machine:
//!
//! ```text
//! Unauthenticated ──────────────────────────────▶ RejectRedirect
//! Authenticated ── fresh ───────────────────────▶ Allow
//!               └─ stale ─▶ Revalidating ─ member ─▶ Allow (expiry refreshed)
//!                                       └─ denied/failed ─▶ RejectRedirect (principal cleared)
//! ```
//!
//! The membership cache lives in the principal's `expires_at`; a fresh
//! principal never touches the oracle. Concurrent requests in one session are
//! not coordinated: each stale request revalidates on its own and the last
//! write to the store wins.

use std::sync::Arc;

use chrono::Utc;
use orgwarden_core::SessionId;
use tracing::{Span, debug, error, info, instrument, warn};

use crate::config::ProviderConfig;
use crate::membership::{MembershipOracle, MembershipQuery, MembershipVerdict, check_with_timeout};
use crate::principal::Principal;
use crate::store::SessionStore;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No principal in the session, or the session could not be read.
    Unauthenticated,
    /// A stale principal failed revalidation and was cleared.
    Revoked,
}

/// Outcome of one pass through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Pass the request on; carries the (possibly refreshed) principal.
    Allow(Box<Principal>),
    /// Redirect to the authentication entry point.
    RejectRedirect { reason: RejectReason },
}

impl GateDecision {
    /// Returns true for [`GateDecision::Allow`].
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    /// Returns the allowed principal, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Allow(principal) => Some(principal.as_ref()),
            Self::RejectRedirect { .. } => None,
        }
    }

    /// Returns where a rejected request should be sent.
    #[must_use]
    pub fn redirect_target<'a>(&self, config: &'a ProviderConfig) -> Option<&'a str> {
        match self {
            Self::Allow(_) => None,
            Self::RejectRedirect { .. } => Some(config.authenticate_url()),
        }
    }

    fn reject(reason: RejectReason) -> Self {
        Self::RejectRedirect { reason }
    }
}

/// Decides whether a session is still entitled to proceed.
#[derive(Clone)]
pub struct AuthorizationGate {
    config: Arc<ProviderConfig>,
    oracle: Arc<dyn MembershipOracle>,
    store: Arc<dyn SessionStore>,
}

impl AuthorizationGate {
    /// Creates a gate over the given oracle and session store.
    #[must_use]
    pub fn new(
        config: Arc<ProviderConfig>,
        oracle: Arc<dyn MembershipOracle>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            oracle,
            store,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Evaluates the gate for one request.
    ///
    /// Never fails: store and oracle errors are logged and turned into a
    /// rejection, except a failed write-back after a confirmed revalidation,
    /// which still allows the request.
    #[instrument(
        skip_all,
        fields(session_id = ?session_id.map(ToString::to_string), state = "Unauthenticated")
    )]
    pub async fn authorize(&self, session_id: Option<&SessionId>) -> GateDecision {
        let Some(session_id) = session_id else {
            debug!("no session");
            return GateDecision::reject(RejectReason::Unauthenticated);
        };

        let principal = match self.store.load(session_id).await {
            Ok(Some(principal)) => principal,
            Ok(None) => {
                debug!("no principal in session");
                return GateDecision::reject(RejectReason::Unauthenticated);
            }
            Err(e) => {
                error!(error = %e, "failed to load session; rejecting");
                // An unreadable entry can never pass, so drop it.
                if let Err(e) = self.store.clear(session_id).await {
                    warn!(error = %e, "failed to clear unreadable session");
                }
                return GateDecision::reject(RejectReason::Unauthenticated);
            }
        };

        Span::current().record("state", "Authenticated");

        let now = Utc::now();
        if principal.is_fresh_at(now) {
            debug!(username = %principal.username(), "membership cache hit");
            return GateDecision::Allow(Box::new(principal));
        }

        Span::current().record("state", "Revalidating");
        self.revalidate(session_id, principal).await
    }

    async fn revalidate(&self, session_id: &SessionId, mut principal: Principal) -> GateDecision {
        let organization = self.config.organization();
        let query = MembershipQuery {
            username: principal.username(),
            organization,
            access_token: principal.access_token(),
        };

        let verdict =
            check_with_timeout(self.oracle.as_ref(), &query, self.config.oracle_timeout()).await;

        match verdict {
            Ok(MembershipVerdict::Member) => {
                principal.mark_verified_at(Utc::now(), self.config.ttl());
                if let Err(e) = self.store.save(session_id, &principal).await {
                    warn!(
                        username = %principal.username(),
                        error = %e,
                        "membership confirmed but refreshed principal was not stored"
                    );
                }
                debug!(username = %principal.username(), %organization, "membership revalidated");
                GateDecision::Allow(Box::new(principal))
            }
            Ok(MembershipVerdict::NotMember) => {
                info!(username = %principal.username(), %organization, "membership revoked");
                self.revoke(session_id).await
            }
            Err(e) => {
                warn!(
                    username = %principal.username(),
                    %organization,
                    error = %e,
                    "membership revalidation failed; revoking"
                );
                self.revoke(session_id).await
            }
        }
    }

    async fn revoke(&self, session_id: &SessionId) -> GateDecision {
        if let Err(e) = self.store.clear(session_id).await {
            error!(error = %e, "failed to clear revoked principal");
        }
        GateDecision::reject(RejectReason::Revoked)
    }
}
