//! Scripted transport for probe and coordinator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, ProbeTransport};

#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    Respond {
        status: u16,
        body: String,
        delay: Duration,
    },
    Fail(TransportError),
    Hang,
    Panic,
}

impl Behavior {
    pub(crate) fn respond(status: u16, body: &str) -> Self {
        Self::delayed(status, body, Duration::ZERO)
    }

    pub(crate) fn delayed(status: u16, body: &str, delay: Duration) -> Self {
        Self::Respond {
            status,
            body: body.to_string(),
            delay,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SeenRequest {
    pub(crate) url: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) proxy: Option<String>,
    pub(crate) user_agent: Option<String>,
}

pub(crate) struct ScriptedTransport {
    default: Behavior,
    per_url: HashMap<String, Behavior>,
    requests: Arc<Mutex<Vec<SeenRequest>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub(crate) fn uniform(default: Behavior) -> Self {
        Self {
            default,
            per_url: HashMap::new(),
            requests: Arc::default(),
            in_flight: Arc::default(),
            max_in_flight: Arc::default(),
        }
    }

    pub(crate) fn with(mut self, url: &str, behavior: Behavior) -> Self {
        self.per_url.insert(url.to_string(), behavior);
        self
    }

    pub(crate) fn requests(&self) -> Arc<Mutex<Vec<SeenRequest>>> {
        Arc::clone(&self.requests)
    }

    /// Highest number of requests observed in flight at once.
    pub(crate) fn max_in_flight(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.max_in_flight)
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProbeTransport for ScriptedTransport {
    async fn get(&self, request: HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(SeenRequest {
                url: request.url.to_string(),
                query: request
                    .query
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                proxy: request.proxy.map(ToString::to_string),
                user_agent: request.user_agent.map(ToString::to_string),
            });
        }

        let behavior = self
            .per_url
            .get(request.url)
            .unwrap_or(&self.default)
            .clone();

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(Arc::clone(&self.in_flight));

        match behavior {
            Behavior::Respond {
                status,
                body,
                delay,
            } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(HttpResponse { status, body })
            }
            Behavior::Fail(err) => Err(err),
            Behavior::Hang => std::future::pending().await,
            #[allow(clippy::panic)]
            Behavior::Panic => panic!("scripted transport panic"),
        }
    }
}
