//! Single-endpoint probe.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::TransportError;
use crate::logging::LogSink;
use crate::transport::{HttpRequest, HttpResponse, ProbeTransport};
use crate::types::{ProbeEndpoint, ProbeOutcome, ProbeResult};

/// Query parameter the probe services read the target from.
pub const QUERY_PARAM: &str = "domain";

/// Collaborators shared by every probe of one fan-out.
#[derive(Clone)]
pub struct ProbeContext {
    pub transport: Arc<dyn ProbeTransport>,
    pub sink: Arc<dyn LogSink>,
}

/// Probe one endpoint for `target` and classify the outcome.
///
/// Never fails: transport errors, timeouts and bad statuses all become a
/// [`ProbeOutcome`]. `timeout` bounds the whole round-trip even if the
/// transport ignores it.
pub async fn probe(
    ctx: &ProbeContext,
    index: usize,
    endpoint: &ProbeEndpoint,
    target: &str,
    proxy: Option<&str>,
    request_timeout: Duration,
) -> ProbeResult {
    let proxy_info = proxy.map_or_else(|| "无代理".to_string(), |p| format!("代理: {p}"));
    ctx.sink.info(&format!(
        "正在请求: {:<52} | 目标: {target} | {proxy_info}",
        endpoint.url
    ));

    let query = [(QUERY_PARAM, target)];
    let request = HttpRequest {
        url: &endpoint.url,
        query: &query,
        proxy,
        timeout: request_timeout,
        user_agent: None,
    };

    let outcome = match timeout(request_timeout, ctx.transport.get(request)).await {
        Err(_) | Ok(Err(TransportError::Timeout)) => ProbeOutcome::Timeout,
        Ok(Err(err)) => ProbeOutcome::Failure {
            detail: err.to_string(),
        },
        Ok(Ok(response)) => classify_response(&response),
    };

    if let ProbeOutcome::Failure { detail } = &outcome {
        ctx.sink
            .error(&format!("请求失败: {} | {detail}", endpoint.url));
    }

    ProbeResult {
        index,
        endpoint: endpoint.clone(),
        outcome,
    }
}

/// Classify a completed HTTP response.
///
/// The outcome depends on the raw body: an empty body is
/// [`ProbeOutcome::EmptyResponse`], anything else is a success even if no IP
/// survives parsing.
pub fn classify_response(response: &HttpResponse) -> ProbeOutcome {
    if !response.is_success() {
        return ProbeOutcome::Failure {
            detail: TransportError::Status(response.status).to_string(),
        };
    }
    if response.body.is_empty() {
        return ProbeOutcome::EmptyResponse;
    }
    ProbeOutcome::success(parse_ip_list(&response.body))
}

/// Split a comma-separated body into trimmed, non-empty tokens.
pub fn parse_ip_list(body: &str) -> Vec<String> {
    body.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .collect()
}
