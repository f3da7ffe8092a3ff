//! Domain records persisted in the local store.
//!
//! # Design
//! Both records are stored as JSON text under a named slot. They are read on
//! every dispatch, so decoding never fails outward: a record that cannot be
//! decoded degrades to "not configured" / "not signed in".

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sync endpoint credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub url: String,
    pub key: String,
}

impl SyncConfig {
    /// Build a config, trimming both fields.
    pub fn new(url: &str, key: &str) -> Self {
        Self {
            url: url.trim().to_string(),
            key: key.trim().to_string(),
        }
    }

    /// Decode stored text. Missing or non-string fields read as empty; text
    /// that is not a JSON object yields the empty config.
    pub fn from_stored(raw: &str) -> Option<Self> {
        let Value::Object(map) = serde_json::from_str::<Value>(raw).ok()? else {
            return None;
        };
        let field = |name: &str| map.get(name).and_then(Value::as_str).unwrap_or_default();
        Some(Self::new(field("url"), field("key")))
    }

    pub fn has_endpoint(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Access level of a signed-in operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Data entry: may look up and edit riders.
    Digitador,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Digitador => write!(f, "digitador"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// The locally cached identity established at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub role: Role,
    /// Milliseconds since the Unix epoch. Older records call this `ts`.
    #[serde(rename = "issuedAt", alias = "ts")]
    pub issued_at: u64,
}

impl Session {
    /// Decode stored text; `None` when malformed or the email is empty.
    pub fn from_stored(raw: &str) -> Option<Self> {
        let session: Session = serde_json::from_str(raw).ok()?;
        if session.email.trim().is_empty() {
            return None;
        }
        Some(session)
    }
}
