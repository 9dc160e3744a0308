//! Stateless service façade exposing all toolbox operations.
//!
//! Every method on [`ToolboxService`] is an async associated function; no instance needed.

pub mod cdn;
mod html;
mod icp;
mod ip;
mod layout;
mod whois;

use std::sync::Arc;

use crate::error::{ToolboxError, ToolboxResult};
use crate::logging::LogSink;
use crate::transport::ReqwestTransport;
use crate::types::{IcpLookupResult, IpBindingResult, ProbeResultSet, QueryOptions, WhoisResult};

pub use icp::format_icp_record;
pub use ip::format_ip_report;
pub use layout::truncate_to_width;
pub use whois::format_whois_report;

/// Longest target accepted, the DNS limit for a full name.
const MAX_TARGET_LEN: usize = 253;

/// Trim a domain, IP or keyword and reject empty or overlong input.
fn validate_target(target: &str) -> ToolboxResult<String> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ToolboxError::ValidationError(
            "Target is required".to_string(),
        ));
    }
    if target.len() > MAX_TARGET_LEN {
        return Err(ToolboxError::ValidationError(format!(
            "Target exceeds maximum length of {MAX_TARGET_LEN} characters (got {})",
            target.len()
        )));
    }
    Ok(target.to_string())
}

/// Entry point for all reconnaissance operations.
///
/// All methods are stateless associated functions; call them directly on the type.
/// Each one reports progress and results through the given [`LogSink`].
///
/// ```rust,no_run
/// use runwar_toolbox::{LogFacadeSink, QueryOptions, ToolboxService};
/// # async fn demo() -> runwar_toolbox::ToolboxResult<()> {
/// let whois = ToolboxService::whois_lookup("example.com", &QueryOptions::default(), &LogFacadeSink::WHOIS).await?;
/// # Ok(())
/// # }
/// ```
pub struct ToolboxService;

impl ToolboxService {
    /// Look up the location of an IP address and the domains it has served.
    pub async fn ip_lookup(
        ip: &str,
        options: &QueryOptions,
        sink: &dyn LogSink,
    ) -> ToolboxResult<IpBindingResult> {
        let ip = validate_target(ip)?;
        ip::ip_lookup(&ReqwestTransport::new(), &ip, options, sink).await
    }

    /// Query ICP filings for a domain or company keyword.
    pub async fn icp_lookup(
        keyword: &str,
        options: &QueryOptions,
        sink: &dyn LogSink,
    ) -> ToolboxResult<IcpLookupResult> {
        let keyword = validate_target(keyword)?;
        icp::icp_lookup(&keyword, options, sink).await
    }

    /// Query WHOIS information for a domain.
    ///
    /// Returns structured registration data parsed from the raw WHOIS response.
    pub async fn whois_lookup(
        domain: &str,
        options: &QueryOptions,
        sink: &dyn LogSink,
    ) -> ToolboxResult<WhoisResult> {
        let domain = validate_target(domain)?;
        whois::whois_lookup(&domain, whois::WHOIS_SERVERS, options.timeout, sink).await
    }

    /// Probe a domain from every built-in region and log the report.
    ///
    /// Individual probe failures end up in the result set; only an invalid
    /// target is an error.
    pub async fn cdn_check(
        domain: &str,
        options: &QueryOptions,
        sink: Arc<dyn LogSink>,
    ) -> ToolboxResult<ProbeResultSet> {
        let domain = validate_target(domain)?;
        let detector = cdn::CdnDetector::new(Arc::new(ReqwestTransport::new()), sink)
            .with_timeout(options.timeout);
        let results = detector
            .probe_all(&domain, options.proxy.as_deref(), options.max_workers)
            .await;
        detector.render(&results);
        Ok(results)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::testing::MemorySink;

    #[test]
    fn test_validate_target_normal() {
        assert_eq!(validate_target("example.com").unwrap(), "example.com");
    }

    #[test]
    fn test_validate_target_ip_passthrough() {
        assert_eq!(validate_target("1.2.3.4").unwrap(), "1.2.3.4");
        assert_eq!(validate_target("2606:4700::1111").unwrap(), "2606:4700::1111");
    }

    #[test]
    fn test_validate_target_keyword_passthrough() {
        assert_eq!(validate_target("腾讯").unwrap(), "腾讯");
    }

    #[test]
    fn test_validate_target_trims_whitespace() {
        assert_eq!(validate_target("  example.com  ").unwrap(), "example.com");
    }

    #[test]
    fn test_validate_target_empty() {
        assert!(matches!(
            validate_target(""),
            Err(ToolboxError::ValidationError(_))
        ));
        assert!(matches!(
            validate_target("   "),
            Err(ToolboxError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_target_too_long() {
        let long = format!("{}.com", "a".repeat(250));
        assert!(matches!(
            validate_target(&long),
            Err(ToolboxError::ValidationError(_))
        ));
        assert!(validate_target(&"a".repeat(253)).is_ok());
    }

    #[tokio::test]
    async fn test_cdn_check_rejects_empty_target_before_probing() {
        let sink = Arc::new(MemorySink::default());
        let result = ToolboxService::cdn_check(" ", &QueryOptions::default(), sink.clone()).await;
        assert!(matches!(result, Err(ToolboxError::ValidationError(_))));
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn test_whois_lookup_rejects_empty_target() {
        let sink = MemorySink::default();
        let result = ToolboxService::whois_lookup("", &QueryOptions::default(), &sink).await;
        assert!(matches!(result, Err(ToolboxError::ValidationError(_))));
    }
}
