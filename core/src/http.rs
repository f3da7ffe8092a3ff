//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The dispatcher builds an
//! `HttpRequest` and parses an `HttpResponse`; whoever executes the round
//! trip (a `Transport`, or a host with its own HTTP stack) sits in between.
//! The sync protocol only ever POSTs, so there is no method field.

/// Content type of every request body.
///
/// A `text/plain` body keeps the request "simple" for browsers and avoids a
/// CORS preflight that the spreadsheet backend cannot answer.
pub const CONTENT_TYPE: &str = "text/plain;charset=utf-8";

/// An HTTP POST described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// Build a sync POST carrying `body` as its only payload.
    pub fn post(url: &str, body: String) -> Self {
        Self {
            url: url.to_string(),
            headers: vec![("content-type".to_string(), CONTENT_TYPE.to_string())],
            body,
        }
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// A 200 response with the given body and no headers.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}
