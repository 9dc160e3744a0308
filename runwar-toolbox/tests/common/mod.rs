//! 共享测试工具：可编排的 HTTP 传输与内存日志

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use log::Level;
use runwar_toolbox::{HttpRequest, HttpResponse, LogSink, ProbeTransport, TransportError};

/// Canned reply for one endpoint.
#[derive(Debug, Clone)]
pub enum Reply {
    Body(u16, &'static str, Duration),
    Error(TransportError),
    Hang,
}

/// Transport answering from a per-URL table, falling back to a default.
pub struct CannedTransport {
    default: Reply,
    replies: HashMap<String, Reply>,
}

impl CannedTransport {
    pub fn new(default: Reply) -> Self {
        Self {
            default,
            replies: HashMap::new(),
        }
    }

    pub fn reply(mut self, url: &str, reply: Reply) -> Self {
        self.replies.insert(url.to_string(), reply);
        self
    }
}

#[async_trait]
impl ProbeTransport for CannedTransport {
    async fn get(&self, request: HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        let reply = self.replies.get(request.url).unwrap_or(&self.default).clone();
        match reply {
            Reply::Body(status, body, delay) => {
                tokio::time::sleep(delay).await;
                Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                })
            }
            Reply::Error(err) => Err(err),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// Sink collecting every record in order.
#[derive(Default)]
pub struct CapturingSink {
    records: Mutex<Vec<(Level, String)>>,
}

impl CapturingSink {
    pub fn at(&self, level: Level) -> Vec<String> {
        self.records
            .lock()
            .map(|records| {
                records
                    .iter()
                    .filter(|(l, _)| *l == level)
                    .map(|(_, m)| m.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or_default()
    }
}

impl LogSink for CapturingSink {
    fn log(&self, level: Level, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push((level, message.to_string()));
        }
    }
}
