//! Request dispatcher for the sync endpoint.
//!
//! # Design
//! `Dispatcher` holds no per-call state. A call is split the same way the
//! host-does-IO client splits CRUD operations: `build_request` produces an
//! `HttpRequest` from the stored config, the current session and the caller's
//! action/payload; `parse_response` turns an `HttpResponse` into the inner
//! `data` value or a classified error. `call` joins the two halves with a
//! single `Transport::send`. There is no retry: every failure is terminal
//! for that call and the caller decides whether to try again.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::alias::resolve;
use crate::config::{get_config, set_config};
use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::error::{DispatchError, Result, StoreError};
use crate::http::{HttpRequest, HttpResponse};
use crate::session::SessionSource;
use crate::store::KeyValueStore;
use crate::transport::Transport;
use crate::types::SyncConfig;

/// Client for the spreadsheet-backed sync API.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn KeyValueStore>,
    sessions: Arc<dyn SessionSource>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        sessions: Arc<dyn SessionSource>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            store,
            sessions,
            transport,
        }
    }

    /// The stored sync config (empty when unset or unreadable).
    pub fn config(&self) -> SyncConfig {
        get_config(self.store.as_ref())
    }

    /// Store a new endpoint URL and API key.
    pub fn configure(&self, url: &str, key: &str) -> std::result::Result<SyncConfig, StoreError> {
        set_config(self.store.as_ref(), url, key)
    }

    /// Perform one round trip and return the response's `data` value.
    pub async fn call(&self, action: &str, payload: Option<Value>) -> Result<Value> {
        let request = self.build_request(action, payload.as_ref())?;
        let response = self.transport.send(request).await?;
        Self::parse_response(response)
    }

    /// Build the POST for `action` without sending it.
    ///
    /// Fails with `Configuration` when no endpoint URL is stored.
    pub fn build_request(&self, action: &str, payload: Option<&Value>) -> Result<HttpRequest> {
        let config = self.config();
        if !config.has_endpoint() {
            return Err(DispatchError::Configuration);
        }

        let resolved = resolve(action, payload);
        if resolved.action != action {
            debug!(legacy = action, canonical = %resolved.action, "resolved action alias");
        }

        let email = self.effective_email(&resolved.flat_payload);
        let envelope = RequestEnvelope::new(&resolved.action, &config.key, &email, resolved.flat_payload);
        debug!(
            action = %envelope.action,
            url = %config.url,
            api_key = %mask_credential(&envelope.api_key),
            email = %envelope.email,
            "dispatching sync request"
        );
        Ok(HttpRequest::post(&config.url, envelope.to_body()?))
    }

    /// Decode a response into its `data` value.
    ///
    /// The HTTP status is not consulted; only the envelope decides.
    pub fn parse_response(response: HttpResponse) -> Result<Value> {
        let envelope = ResponseEnvelope::parse(&response.body).inspect_err(|e| {
            debug!(status = response.status, error = %e, "response is not a sync envelope");
        })?;
        envelope.into_result()
    }

    /// Payload `email` if it is a non-empty string, else the session's email,
    /// else empty.
    fn effective_email(&self, params: &serde_json::Map<String, Value>) -> String {
        let explicit = params
            .get("email")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|e| !e.is_empty());
        match explicit {
            Some(email) => email.to_string(),
            None => self
                .sessions
                .current_session()
                .map(|s| s.email.trim().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Mask a secret for logging.
fn mask_credential(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}
