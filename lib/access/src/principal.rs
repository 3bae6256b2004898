//! The session-resident principal.
//!
//! A principal is the authenticated identity plus the instant until which its
//! organization membership is trusted. It lives only inside a session store
//! entry and is serialized there as JSON, with `expires_at` as an RFC 3339
//! timestamp.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated identity with membership-expiry bookkeeping.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Login handle at the provider.
    username: String,
    /// Immutable provider-side user ID.
    external_user_id: String,
    /// Token used to query the membership oracle on the user's behalf.
    access_token: String,
    /// The membership verdict is trusted until this instant.
    expires_at: Option<DateTime<Utc>>,
}

impl Principal {
    /// Creates a principal that has not been verified yet.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        external_user_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            external_user_id: external_user_id.into(),
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Returns the provider login handle.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the provider-side user ID.
    #[must_use]
    pub fn external_user_id(&self) -> &str {
        &self.external_user_id
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns when the membership verdict stops being trusted, if ever verified.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns true if the membership verdict is still trusted at `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now < expires_at)
    }

    /// Records a confirmed membership check made at `now`.
    pub fn mark_verified_at(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.expires_at = Some(now + ttl);
    }

    /// Consumes the principal, marking it verified at `now`.
    #[must_use]
    pub fn verified_at(mut self, now: DateTime<Utc>, ttl: Duration) -> Self {
        self.mark_verified_at(now, ttl);
        self
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("username", &self.username)
            .field("external_user_id", &self.external_user_id)
            .field("access_token", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
