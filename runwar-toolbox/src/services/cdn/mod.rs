//! Multi-region CDN detection.
//!
//! One target is sent to every probe endpoint on a bounded worker pool; each
//! endpoint reports the IPs the target resolves to from its region. The
//! complete set is then rendered as a single report.

mod nodes;
mod probe;
mod report;
#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::logging::LogSink;
use crate::transport::ProbeTransport;
use crate::types::{ProbeEndpoint, ProbeOutcome, ProbeResult, ProbeResultSet, QueryOptions};

pub use nodes::cdn_nodes;
pub use probe::{ProbeContext, QUERY_PARAM, classify_response, parse_ip_list, probe};
pub use report::{IP_LIST_WIDTH, NO_CDN_WARNING, render};

/// Fans a target out to a set of probe endpoints and aggregates the outcomes.
#[derive(Clone)]
pub struct CdnDetector {
    ctx: ProbeContext,
    endpoints: Vec<ProbeEndpoint>,
    timeout: Duration,
}

impl CdnDetector {
    /// Detector over the built-in endpoint table with the default timeout.
    pub fn new(transport: Arc<dyn ProbeTransport>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            ctx: ProbeContext { transport, sink },
            endpoints: cdn_nodes().to_vec(),
            timeout: QueryOptions::DEFAULT_TIMEOUT,
        }
    }

    /// Replace the endpoint table.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Vec<ProbeEndpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the per-probe timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoints(&self) -> &[ProbeEndpoint] {
        &self.endpoints
    }

    /// Probe every endpoint, at most `concurrency_limit` at a time.
    ///
    /// Returns once every probe has a terminal outcome. The set holds exactly
    /// one result per endpoint, in completion order. A limit of zero is
    /// treated as one.
    pub async fn probe_all(
        &self,
        target: &str,
        proxy: Option<&str>,
        concurrency_limit: usize,
    ) -> ProbeResultSet {
        let limit = concurrency_limit.max(1);
        let started = Instant::now();

        self.ctx.sink.debug(&format!(
            "Probing {target} via {} endpoints, concurrency {limit}",
            self.endpoints.len()
        ));

        let semaphore = Arc::new(Semaphore::new(limit));
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(self.endpoints.len());

        for (index, endpoint) in self.endpoints.iter().enumerate() {
            let ctx = self.ctx.clone();
            let semaphore = Arc::clone(&semaphore);
            let endpoint = endpoint.clone();
            let target = target.to_string();
            let proxy = proxy.map(ToString::to_string);
            let timeout = self.timeout;

            let handle = tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return ProbeResult {
                        index,
                        endpoint,
                        outcome: ProbeOutcome::Failure {
                            detail: "worker pool closed".to_string(),
                        },
                    };
                };
                probe(&ctx, index, &endpoint, &target, proxy.as_deref(), timeout).await
            });
            pending.insert(handle.id(), index);
        }

        let mut results = Vec::with_capacity(self.endpoints.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    pending.remove(&id);
                    results.push(result);
                }
                Err(err) => {
                    // A probe task died (panic or abort); keep its row.
                    let Some(index) = pending.remove(&err.id()) else {
                        continue;
                    };
                    let Some(endpoint) = self.endpoints.get(index).cloned() else {
                        continue;
                    };
                    self.ctx
                        .sink
                        .error(&format!("检测任务异常终止: {} | {err}", endpoint.url));
                    results.push(ProbeResult {
                        index,
                        endpoint,
                        outcome: ProbeOutcome::Failure {
                            detail: "probe task aborted".to_string(),
                        },
                    });
                }
            }
        }

        // u128 -> u64: elapsed millis of one fan-out never exceed u64::MAX
        #[allow(clippy::cast_possible_truncation)]
        let total_time_ms = started.elapsed().as_millis() as u64;

        ProbeResultSet {
            target: target.to_string(),
            results,
            total_time_ms,
        }
    }

    /// Render `results` through this detector's sink.
    pub fn render(&self, results: &ProbeResultSet) -> String {
        render(results, &results.target, self.ctx.sink.as_ref())
    }
}
