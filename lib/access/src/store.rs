//! Session storage for principals.
//!
//! The store is the sole owner of a principal. The gate reads it, may write a
//! refreshed copy back, or clears it; nothing else holds one across requests.

use std::collections::{HashMap, hash_map::Entry};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use orgwarden_core::SessionId;
use rootcause::prelude::Report;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::SessionStoreError;
use crate::principal::Principal;

/// Per-session principal storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the principal stored for a session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or the entry is unreadable.
    async fn load(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<Principal>, Report<SessionStoreError>>;

    /// Stores the principal for a session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the principal could not be written.
    async fn save(
        &self,
        session_id: &SessionId,
        principal: &Principal,
    ) -> Result<(), Report<SessionStoreError>>;

    /// Removes the principal for a session. Clearing an empty session is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    async fn clear(&self, session_id: &SessionId) -> Result<(), Report<SessionStoreError>>;
}

/// Process-local session store.
///
/// Entries are kept in their serialized JSON form, the same layout an external
/// store would persist. With a lifetime set, a session ends that long after
/// its first save: later saves replace the principal but keep the start time,
/// and an ended session loads as empty until [`delete_expired`] drops it.
///
/// [`delete_expired`]: InMemorySessionStore::delete_expired
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<SessionId, StoredSession>>,
    lifetime: Option<Duration>,
}

#[derive(Debug)]
struct StoredSession {
    raw: String,
    created_at: DateTime<Utc>,
}

impl InMemorySessionStore {
    /// Creates an empty store whose sessions never end on their own.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose sessions end `lifetime` after creation.
    #[must_use]
    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            entries: RwLock::default(),
            lifetime: Some(lifetime),
        }
    }

    /// Returns the number of sessions holding a principal.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if no session holds a principal.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Returns the raw serialized entry for a session.
    pub async fn raw_entry(&self, session_id: &SessionId) -> Option<String> {
        self.entries
            .read()
            .await
            .get(session_id)
            .map(|entry| entry.raw.clone())
    }

    /// Stores a raw serialized entry, bypassing encoding.
    pub async fn insert_raw(&self, session_id: SessionId, raw: String) {
        self.entries.write().await.insert(
            session_id,
            StoredSession {
                raw,
                created_at: Utc::now(),
            },
        );
    }

    /// Removes every session that has ended, returning how many were removed.
    pub async fn delete_expired(&self) -> usize {
        self.delete_expired_at(Utc::now()).await
    }

    /// Removes every session that has ended by `now`.
    pub async fn delete_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !self.has_ended(entry, now));
        before - entries.len()
    }

    fn has_ended(&self, entry: &StoredSession, now: DateTime<Utc>) -> bool {
        self.lifetime
            .is_some_and(|lifetime| entry.created_at + lifetime <= now)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<Principal>, Report<SessionStoreError>> {
        let entries = self.entries.read().await;
        let Some(entry) = entries.get(session_id) else {
            return Ok(None);
        };
        if self.has_ended(entry, Utc::now()) {
            debug!(%session_id, "session has ended");
            return Ok(None);
        }

        let principal = serde_json::from_str(&entry.raw).map_err(|e| SessionStoreError::Corrupt {
            session_id: session_id.to_string(),
            details: e.to_string(),
        })?;

        Ok(Some(principal))
    }

    async fn save(
        &self,
        session_id: &SessionId,
        principal: &Principal,
    ) -> Result<(), Report<SessionStoreError>> {
        let raw = serde_json::to_string(principal).map_err(|e| SessionStoreError::Corrupt {
            session_id: session_id.to_string(),
            details: e.to_string(),
        })?;

        match self.entries.write().await.entry(*session_id) {
            Entry::Occupied(mut entry) => entry.get_mut().raw = raw,
            Entry::Vacant(entry) => {
                entry.insert(StoredSession {
                    raw,
                    created_at: Utc::now(),
                });
            }
        }
        debug!(%session_id, "stored principal");
        Ok(())
    }

    async fn clear(&self, session_id: &SessionId) -> Result<(), Report<SessionStoreError>> {
        if self.entries.write().await.remove(session_id).is_some() {
            debug!(%session_id, "cleared principal");
        }
        Ok(())
    }
}
