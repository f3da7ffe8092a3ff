//! Error types for the rider sync client.
//!
//! # Design
//! `DispatchError` classifies every way a `call` can fail so callers can pick
//! a presentation without string matching. `Configuration` is raised before
//! any network attempt; `Protocol` and `Application` both come from a
//! response body but mean different things: the first says the server (or
//! something in front of it) did not speak the envelope protocol, the second
//! says the server understood the request and refused it.

use thiserror::Error;

/// Message used when the server reports failure without an `error` field.
pub const GENERIC_APPLICATION_ERROR: &str = "sync request failed";

/// Errors returned by `Dispatcher::call` and its build/parse halves.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No sync endpoint URL is stored. Nothing was sent.
    #[error("missing sync endpoint: configure the sync URL and API key before syncing")]
    Configuration,

    /// The HTTP round-trip itself failed (DNS, refused connection, aborted read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body is not a JSON response envelope.
    #[error("invalid response body: {0}")]
    Protocol(String),

    /// The server answered with `ok: false`.
    #[error("{0}")]
    Application(String),

    /// The request envelope could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Errors raised by `KeyValueStore` implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but is not a JSON object of slot → text.
    #[error("store file is corrupt: {0}")]
    Corrupt(String),
}

/// Login failures reported by `SessionProvider::login`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email is not authorized: {0}")]
    UnknownIdentity(String),

    #[error("wrong passphrase")]
    WrongPassphrase,

    #[error("could not persist session: {0}")]
    Store(#[from] StoreError),
}

/// Role-gate failures reported by `SessionProvider::require_role`.
///
/// Callers map these to their own navigation (login view, dashboard).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("not signed in")]
    NotSignedIn,

    #[error("role {role} may not access this view")]
    Forbidden { role: String },
}

/// Failures loading an `AuthorizationTable`.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot read authorization table: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed authorization table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for dispatcher operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
