//! orgwarden web server.
//!
//! Wires the organization-membership gate from `orgwarden-access` and the
//! GitHub adapters from `orgwarden-github` into an axum application.

pub mod auth;
pub mod config;

pub use auth::{CurrentPrincipal, SecurityProvider};
pub use config::{ServerConfig, SessionConfig};
