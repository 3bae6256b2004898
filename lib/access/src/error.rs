//! Error types for the access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ConfigurationError`: Invalid provider configuration (fatal at startup)
//! - `ProviderError`, `OracleError`, `SessionStoreError`: Collaborator failures,
//!   wrapped in a `Report` at the trait boundary
//! - `AuthenticationError`: Login failures surfaced to the callback route

use std::fmt;

/// Errors from building a [`ProviderConfig`](crate::ProviderConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A required setting was absent or blank.
    MissingField { field: &'static str },
    /// The membership cache window is zero or unreasonably large.
    InvalidTtl,
    /// The membership oracle timeout is zero.
    InvalidOracleTimeout,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing required setting: {field}"),
            Self::InvalidTtl => write!(
                f,
                "ttl_seconds must be between 1 and {}",
                crate::config::MAX_TTL_SECONDS
            ),
            Self::InvalidOracleTimeout => write!(f, "oracle timeout must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Errors from the OAuth transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The transport could not be set up (bad endpoint URLs, HTTP client).
    Configuration { details: String },
    /// Exchanging the authorization code for an access token failed.
    CodeExchange { details: String },
    /// Fetching the user profile with the new token failed.
    ProfileFetch { details: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => {
                write!(f, "OAuth provider configuration error: {details}")
            }
            Self::CodeExchange { details } => {
                write!(f, "authorization code exchange failed: {details}")
            }
            Self::ProfileFetch { details } => {
                write!(f, "profile fetch failed: {details}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Errors from the membership oracle.
///
/// None of these distinguish "not a member" from "could not tell"; callers
/// fail closed on every variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The request could not be sent or the connection failed.
    RequestFailed { details: String },
    /// The oracle answered with a status that is neither yes nor no.
    UnexpectedStatus { status: u16 },
    /// The oracle did not answer in time.
    Timeout,
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { details } => {
                write!(f, "membership request failed: {details}")
            }
            Self::UnexpectedStatus { status } => {
                write!(f, "membership oracle returned unexpected status {status}")
            }
            Self::Timeout => write!(f, "membership oracle timed out"),
        }
    }
}

impl std::error::Error for OracleError {}

/// Errors from the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    /// The backing store could not be reached.
    Unavailable { details: String },
    /// A stored principal could not be encoded or decoded.
    Corrupt { session_id: String, details: String },
}

impl fmt::Display for SessionStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => write!(f, "session store unavailable: {details}"),
            Self::Corrupt {
                session_id,
                details,
            } => write!(f, "corrupt principal in session {session_id}: {details}"),
        }
    }
}

impl std::error::Error for SessionStoreError {}

/// Errors from a login attempt.
///
/// These are terminal for the attempt; the user has to start the login again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// Code exchange or profile fetch failed.
    ProviderExchange { reason: String },
    /// The provider profile lacked an identity field.
    MissingProfileField { field: &'static str },
    /// Membership was denied, or could not be confirmed.
    NotAMember { organization: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderExchange { reason } => {
                write!(f, "OAuth provider exchange failed: {reason}")
            }
            Self::MissingProfileField { field } => {
                write!(f, "provider profile is missing {field}")
            }
            Self::NotAMember { organization } => {
                write!(
                    f,
                    "user is not a member of the required organization: {organization}"
                )
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}
