//! Public types returned by toolbox operations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A third-party probe service nominally located in one network region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeEndpoint {
    /// Probe URL; the target is passed as the `domain` query parameter.
    pub url: String,
    /// Human-readable region label (e.g. `"中国-青岛"`). Not unique.
    pub region: String,
}

impl ProbeEndpoint {
    pub fn new(url: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            region: region.into(),
        }
    }
}

/// Classified outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ProbeOutcome {
    /// The endpoint returned a non-empty body. `ip_list` may still be empty if
    /// the body held only separators and whitespace.
    #[serde(rename_all = "camelCase")]
    Success { ip_list: Vec<String>, ip_count: usize },
    /// 2xx with an empty body.
    EmptyResponse,
    /// The round-trip exceeded the configured timeout.
    Timeout,
    /// Any other transport or HTTP error.
    Failure { detail: String },
}

impl ProbeOutcome {
    /// Build a `Success` from an already parsed list, keeping `ip_count` in sync.
    pub fn success(ip_list: Vec<String>) -> Self {
        let ip_count = ip_list.len();
        Self::Success { ip_list, ip_count }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Stable status label shown in the report.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "检测成功",
            Self::Timeout => "超时",
            Self::EmptyResponse => "无响应",
            Self::Failure { .. } => "检测失败",
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of probing one endpoint for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    /// Position of the endpoint in the probed registry.
    pub index: usize,
    /// The endpoint that was probed.
    pub endpoint: ProbeEndpoint,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn region(&self) -> &str {
        &self.endpoint.region
    }
}

/// Every probe result for one target, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResultSet {
    /// The probed target.
    pub target: String,
    pub results: Vec<ProbeResult>,
    /// Wall-clock time of the whole fan-out in milliseconds.
    pub total_time_ms: u64,
}

impl ProbeResultSet {
    pub const fn len(&self) -> usize {
        self.results.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProbeResult> {
        self.results.iter()
    }

    /// Results sorted by registry position, independent of completion order.
    pub fn in_registry_order(&self) -> Vec<&ProbeResult> {
        let mut ordered: Vec<&ProbeResult> = self.results.iter().collect();
        ordered.sort_by_key(|r| r.index);
        ordered
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    /// Distinct IPs seen across all successful probes, in first-seen registry order.
    pub fn distinct_ips(&self) -> Vec<String> {
        let mut ips: Vec<String> = Vec::new();
        for result in self.in_registry_order() {
            if let ProbeOutcome::Success { ip_list, .. } = &result.outcome {
                for ip in ip_list {
                    if !ips.contains(ip) {
                        ips.push(ip.clone());
                    }
                }
            }
        }
        ips
    }
}

impl<'a> IntoIterator for &'a ProbeResultSet {
    type Item = &'a ProbeResult;
    type IntoIter = std::slice::Iter<'a, ProbeResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// One site historically bound to an IP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpBinding {
    /// Domain that resolved to the IP.
    pub site: String,
    /// Date range reported for the binding.
    pub date: String,
}

/// IP location and binding history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpBindingResult {
    /// Queried IP.
    pub ip: String,
    /// Location / carrier line.
    pub address: String,
    pub bindings: Vec<IpBinding>,
}

/// One ICP filing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IcpRecord {
    /// Sponsoring organisation (主办单位名称).
    pub company: String,
    /// Filing number (ICP备案号).
    pub icp_number: String,
    /// Site home page (网站首页地址).
    pub domain: String,
    /// Approval date (审核通过日期).
    pub audit_date: String,
}

/// ICP lookup result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IcpLookupResult {
    pub keyword: String,
    /// Whether the upstream cache refresh reported success.
    pub cache_refreshed: bool,
    pub records: Vec<IcpRecord>,
}

/// WHOIS query result with parsed registration fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoisResult {
    /// The queried domain name.
    pub domain: String,
    /// Domain registrar (e.g. "Cloudflare, Inc.").
    pub registrar: Option<String>,
    /// WHOIS server of the registrar.
    pub whois_server: Option<String>,
    /// Registration creation date.
    pub creation_date: Option<String>,
    /// Registration expiration date.
    pub expiration_date: Option<String>,
    /// Last updated date.
    pub updated_date: Option<String>,
    /// Authoritative name servers.
    pub name_servers: Vec<String>,
    /// EPP status codes.
    pub status: Vec<String>,
    /// Contact e-mail addresses.
    pub emails: Vec<String>,
    /// Registrant organisation.
    pub org: Option<String>,
    /// Registrant country.
    pub country: Option<String>,
    /// DNSSEC state (`signedDelegation`, `unsigned`, ...).
    pub dnssec: Option<String>,
    /// Raw WHOIS response text.
    pub raw: String,
}

/// Shared options for lookups that make HTTP requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Proxy URL applied to every outbound request.
    pub proxy: Option<String>,
    /// Per-request timeout.
    pub timeout: std::time::Duration,
    /// Maximum number of concurrent CDN probes.
    pub max_workers: usize,
}

impl QueryOptions {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);
    /// Default CDN worker pool size.
    pub const DEFAULT_MAX_WORKERS: usize = 5;

    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy.filter(|p| !p.trim().is_empty());
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Self::DEFAULT_TIMEOUT,
            max_workers: Self::DEFAULT_MAX_WORKERS,
        }
    }
}
