//! Transport abstraction for the sync endpoint.
//!
//! A transport executes exactly one `HttpRequest` and returns the response
//! as data. It does not interpret status codes, retry, impose timeouts, or
//! cap the response body size of its own.

use async_trait::async_trait;

use crate::error::DispatchError;
use crate::http::{HttpRequest, HttpResponse};

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Executes a single HTTP round trip.
///
/// Failures must be reported as `DispatchError::Transport`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Transport backed by a blocking `ureq` agent.
///
/// Each request runs on tokio's blocking pool so the calling task only
/// suspends while the request is in flight. Must be used inside a tokio
/// runtime.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        // Non-2xx responses are returned as data; the envelope decides.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute(&agent, request))
            .await
            .map_err(|e| DispatchError::Transport(format!("request task failed: {e}")))?
    }
}

fn execute(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse> {
    let mut builder = agent.post(request.url.as_str());
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let mut response = builder
        .send(request.body.as_bytes())
        .map_err(|e| DispatchError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    // ureq caps bodies at 10 MB by default; envelopes are read in full.
    let body = response
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .read_to_string()
        .map_err(|e| DispatchError::Transport(format!("reading response body: {e}")))?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

/// A scripted in-memory transport for testing.
///
/// Replies are consumed in order; every request is recorded.
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// One scripted outcome.
    #[derive(Debug, Clone)]
    pub enum Reply {
        Response(HttpResponse),
        Fail(String),
    }

    #[derive(Debug, Default)]
    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a 200 response with `body`.
        pub fn respond(self, body: &str) -> Self {
            self.push(Reply::Response(HttpResponse::ok(body)))
        }

        /// Queue a transport failure.
        pub fn fail(self, message: &str) -> Self {
            self.push(Reply::Fail(message.to_string()))
        }

        pub fn push(self, reply: Reply) -> Self {
            self.replies
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push_back(reply);
            self
        }

        /// Requests received so far, in order.
        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.requests
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(request);
            let reply = self
                .replies
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front();
            match reply {
                Some(Reply::Response(response)) => Ok(response),
                Some(Reply::Fail(message)) => Err(DispatchError::Transport(message)),
                None => Err(DispatchError::Transport("no scripted reply".to_string())),
            }
        }
    }
}
