//! HTTP transport seam.
//!
//! Probes depend only on [`ProbeTransport`]; [`ReqwestTransport`] is the real
//! implementation and tests substitute their own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::TransportError;

/// A single outbound GET request.
#[derive(Debug, Clone, Copy)]
pub struct HttpRequest<'a> {
    /// Absolute URL without query string.
    pub url: &'a str,
    /// Query parameters appended to `url`.
    pub query: &'a [(&'a str, &'a str)],
    /// Proxy applied to this request only.
    pub proxy: Option<&'a str>,
    /// Bound on the whole round-trip (connect, send, receive).
    pub timeout: Duration,
    /// `User-Agent` header; `None` keeps the client default.
    pub user_agent: Option<&'a str>,
}

impl<'a> HttpRequest<'a> {
    /// Plain GET with no query, proxy or custom agent.
    pub const fn new(url: &'a str, timeout: Duration) -> Self {
        Self {
            url,
            query: &[],
            proxy: None,
            timeout,
            user_agent: None,
        }
    }
}

/// Status and body of a completed request. The body is decoded as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Performs one outbound HTTP request.
///
/// Implementations must be safe to call from many tasks concurrently and must
/// not share per-request state between calls.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    async fn get(&self, request: HttpRequest<'_>) -> Result<HttpResponse, TransportError>;
}

/// [`ProbeTransport`] backed by `reqwest`.
///
/// A fresh client is built per request so that each call carries its own proxy
/// and timeout; nothing is pooled across probes.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProbeTransport for ReqwestTransport {
    async fn get(&self, request: HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        let client = build_client(request.proxy, Some(request.timeout), request.user_agent)?;

        log::debug!("GET {} {:?}", request.url, request.query);

        let response = client
            .get(request.url)
            .query(request.query)
            .send()
            .await
            .map_err(|e| classify_error(&e))?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| classify_error(&e))?;

        Ok(HttpResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

/// Build a one-off client with an optional proxy, timeout and `User-Agent`.
pub(crate) fn build_client(
    proxy: Option<&str>,
    timeout: Option<Duration>,
    user_agent: Option<&str>,
) -> Result<Client, TransportError> {
    let mut builder = Client::builder();

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(user_agent) = user_agent {
        builder = builder.user_agent(user_agent);
    }
    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|_| TransportError::Other(format!("invalid proxy: {proxy}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))
}

/// Map a `reqwest` error to a short, table-friendly [`TransportError`].
pub(crate) fn classify_error(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    if err.is_connect() {
        let host = err
            .url()
            .and_then(|u| u.host_str())
            .unwrap_or("unknown host");
        return TransportError::Connect(host.to_string());
    }
    if let Some(status) = err.status() {
        return TransportError::Status(status.as_u16());
    }
    if err.is_body() || err.is_decode() {
        return TransportError::Other("failed to read response body".to_string());
    }
    if err.is_redirect() {
        return TransportError::Other("too many redirects".to_string());
    }
    TransportError::Other("request failed".to_string())
}
