//! Organization-membership access control for orgwarden.
//!
//! This crate provides:
//! - Validated provider configuration (`ProviderConfig`)
//! - The session-resident identity (`Principal`)
//! - The login flow (`CallbackHandler`): profile → membership check → principal
//! - The per-request gate (`AuthorizationGate`) with its TTL-bounded membership cache
//! - The collaborator seams (`OAuthTransport`, `MembershipOracle`, `SessionStore`)
//!
//! # Access Control Model
//!
//! A user may enter only while they are a member of the configured
//! organization. Membership is checked at login and then trusted for
//! `ttl_seconds`; after that the next request re-asks the oracle. Any failure
//! to confirm membership clears the session (fail closed).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use orgwarden_access::{InMemorySessionStore, Principal, ProviderConfig, SessionStore};
//! use orgwarden_core::SessionId;
//! use chrono::Utc;
//!
//! let config = ProviderConfig::builder()
//!     .client_id("client-id")
//!     .client_secret("client-secret")
//!     .callback_url("https://app.example.com/auth/callback")
//!     .organization("acme")
//!     .build()
//!     .expect("complete configuration");
//!
//! // A principal as produced by a successful login.
//! let principal = Principal::new("octocat", "583231", "gho_token")
//!     .verified_at(Utc::now(), config.ttl());
//! assert!(principal.is_fresh_at(Utc::now()));
//!
//! # tokio_test_block(async {
//! let store = Arc::new(InMemorySessionStore::new());
//! let session_id = SessionId::new();
//! store.save(&session_id, &principal).await.expect("save");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod gate;
pub mod membership;
pub mod principal;
pub mod provider;
pub mod store;

// Re-export main types at crate root
pub use callback::CallbackHandler;
pub use config::{ProviderConfig, ProviderSettings};
pub use error::{
    AuthenticationError, ConfigurationError, OracleError, ProviderError, SessionStoreError,
};
pub use gate::{AuthorizationGate, GateDecision, RejectReason};
pub use membership::{MembershipOracle, MembershipQuery, MembershipVerdict};
pub use principal::Principal;
pub use provider::{AuthorizationRequest, OAuthTransport, ProviderProfile};
pub use store::{InMemorySessionStore, SessionStore};
