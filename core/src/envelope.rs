//! Wire envelopes for the sync endpoint.
//!
//! # Design
//! The outbound envelope carries the canonical action, the API key and the
//! effective identity next to the flattened parameters. The three envelope
//! fields always win: same-named parameters are dropped before the parameters
//! are flattened into the body, so the serialized object never has duplicate
//! keys.
//!
//! The inbound envelope is decoded by hand from a `Value` rather than derived
//! because the backend is loosely typed: `ok` is judged by truthiness and
//! `error` may be any JSON value.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{DispatchError, Result, GENERIC_APPLICATION_ERROR};

/// Outbound request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEnvelope {
    pub action: String,
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub email: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl RequestEnvelope {
    pub fn new(action: &str, api_key: &str, email: &str, mut params: Map<String, Value>) -> Self {
        for reserved in ["action", "apiKey", "email"] {
            params.remove(reserved);
        }
        Self {
            action: action.to_string(),
            api_key: api_key.trim().to_string(),
            email: email.trim().to_string(),
            params,
        }
    }

    pub fn to_body(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| DispatchError::Serialization(e.to_string()))
    }
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub ok: bool,
    pub data: Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Decode a response body. Anything other than a JSON object with an `ok`
    /// field is a protocol error.
    pub fn parse(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| DispatchError::Protocol(format!("not JSON ({e})")))?;
        let Value::Object(mut map) = value else {
            return Err(DispatchError::Protocol("not a JSON object".to_string()));
        };
        let ok = map
            .get("ok")
            .map(is_truthy)
            .ok_or_else(|| DispatchError::Protocol("missing `ok` field".to_string()))?;
        let error = match map.remove("error") {
            None | Some(Value::Null) => None,
            Some(Value::String(message)) => Some(message),
            Some(other) => Some(other.to_string()),
        };
        Ok(Self {
            ok,
            data: map.remove("data").unwrap_or(Value::Null),
            error,
        })
    }

    /// The `data` payload, or the server's failure as `Application`.
    pub fn into_result(self) -> Result<Value> {
        if self.ok {
            return Ok(self.data);
        }
        let message = self
            .error
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_APPLICATION_ERROR.to_string());
        Err(DispatchError::Application(message))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
