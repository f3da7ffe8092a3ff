//! Session provider: login, logout and role gating.
//!
//! # Design
//! Identity policy lives in an `AuthorizationTable` loaded by the host and
//! handed to `SessionProvider::new`. The dispatcher never sees the table; it
//! reads the resolved session through the `SessionSource` trait.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AccessError, AuthError, StoreError, TableError};
use crate::store::{KeyValueStore, SESSION_SLOT};
use crate::types::{Role, Session};

/// Read-only view of the current session.
pub trait SessionSource: Send + Sync {
    /// The signed-in session, if any. Must not fail or mutate state.
    fn current_session(&self) -> Option<Session>;
}

/// A session source with nobody signed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSession;

impl SessionSource for NoSession {
    fn current_session(&self) -> Option<Session> {
        None
    }
}

/// One operator allowed to sign in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrustedIdentity {
    pub email: String,
    pub role: Role,
}

/// Trusted identities and the shared passphrase.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationTable {
    passphrase: String,
    users: Vec<TrustedIdentity>,
}

impl AuthorizationTable {
    pub fn new(passphrase: impl Into<String>, users: Vec<TrustedIdentity>) -> Self {
        let mut table = Self {
            passphrase: passphrase.into(),
            users,
        };
        table.normalize();
        table
    }

    /// Parse `{"passphrase": "...", "users": [{"email": "...", "role": "admin"}]}`.
    pub fn from_json(raw: &str) -> Result<Self, TableError> {
        let mut table: Self = serde_json::from_str(raw)?;
        table.normalize();
        Ok(table)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn normalize(&mut self) {
        for user in &mut self.users {
            user.email = user.email.trim().to_lowercase();
        }
    }

    /// Look up an identity by email, ignoring case and surrounding space.
    pub fn find(&self, email: &str) -> Option<&TrustedIdentity> {
        let email = email.trim().to_lowercase();
        self.users.iter().find(|u| u.email == email)
    }

    pub fn users(&self) -> &[TrustedIdentity] {
        &self.users
    }
}

/// Login state backed by the session slot of a `KeyValueStore`.
pub struct SessionProvider {
    store: Arc<dyn KeyValueStore>,
    table: AuthorizationTable,
}

impl SessionProvider {
    pub fn new(store: Arc<dyn KeyValueStore>, table: AuthorizationTable) -> Self {
        Self { store, table }
    }

    /// Check credentials and persist a new session.
    pub fn login(&self, email: &str, passphrase: &str) -> Result<Session, AuthError> {
        let email = email.trim().to_lowercase();
        let identity = self
            .table
            .find(&email)
            .ok_or_else(|| AuthError::UnknownIdentity(email.clone()))?;
        if passphrase != self.table.passphrase {
            return Err(AuthError::WrongPassphrase);
        }

        let session = Session {
            email: identity.email.clone(),
            role: identity.role,
            issued_at: now_millis(),
        };
        let text = serde_json::to_string(&session).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.store.set(SESSION_SLOT, &text)?;
        debug!(email = %session.email, role = %session.role, "signed in");
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.remove(SESSION_SLOT)
    }

    /// The stored session, or `None` if it is missing, malformed, or names
    /// an identity no longer in the table. The role always comes from the
    /// table, never from the stored record.
    pub fn current(&self) -> Option<Session> {
        let raw = match self.store.get(SESSION_SLOT) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "session slot unreadable, treating as signed out");
                return None;
            }
        };
        let mut session = Session::from_stored(&raw)?;
        let Some(identity) = self.table.find(&session.email) else {
            debug!(email = %session.email, "stored session names an untrusted identity");
            return None;
        };
        if identity.role != session.role {
            debug!(
                email = %session.email,
                stored = %session.role,
                table = %identity.role,
                "stored role differs from authorization table"
            );
            session.role = identity.role;
        }
        Some(session)
    }

    /// The current session if its role is in `allowed`. An empty `allowed`
    /// admits any signed-in role.
    pub fn require_role(&self, allowed: &[Role]) -> Result<Session, AccessError> {
        let session = self.current().ok_or(AccessError::NotSignedIn)?;
        if !allowed.is_empty() && !allowed.contains(&session.role) {
            return Err(AccessError::Forbidden {
                role: session.role.to_string(),
            });
        }
        Ok(session)
    }
}

impl SessionSource for SessionProvider {
    fn current_session(&self) -> Option<Session> {
        self.current()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(saturating_millis)
        .unwrap_or_default()
}

fn saturating_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
