//! Core types and utilities for orgwarden.
//!
//! This crate provides the error handling foundation and the identifiers
//! shared between the access-control core and its adapters.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, SessionId};
