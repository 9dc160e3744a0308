//! IP location and binding history lookup (site.ip138.com).

use crate::error::{ToolboxError, ToolboxResult, TransportError};
use crate::logging::LogSink;
use crate::services::html;
use crate::services::layout::pad_right;
use crate::transport::{HttpRequest, ProbeTransport};
use crate::types::{IpBinding, IpBindingResult, QueryOptions};

const IP138_URL: &str = "https://site.ip138.com";

/// ip138 rejects requests without a browser agent.
const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// Leading `<li>` rows of the binding list that are headers, not bindings.
const LIST_HEADER_ROWS: usize = 2;

/// Look up location and historical domain bindings for `ip`.
pub async fn ip_lookup(
    transport: &dyn ProbeTransport,
    ip: &str,
    options: &QueryOptions,
    sink: &dyn LogSink,
) -> ToolboxResult<IpBindingResult> {
    let url = format!("{IP138_URL}/{ip}/");
    let request = HttpRequest {
        proxy: options.proxy.as_deref(),
        user_agent: Some(BROWSER_UA),
        ..HttpRequest::new(&url, options.timeout)
    };

    let response = transport.get(request).await?;
    if !response.is_success() {
        return Err(TransportError::Status(response.status).into());
    }

    let result = parse_ip138(ip, &response.body)?;
    sink.info(&format_ip_report(&result));
    Ok(result)
}

/// Extract location and bindings from an ip138 result page.
fn parse_ip138(ip: &str, page: &str) -> ToolboxResult<IpBindingResult> {
    let address = html::elements(page, "h3")
        .first()
        .map(|h3| html::text(h3))
        .ok_or_else(|| ToolboxError::ParseError("ip138 page has no location header".to_string()))?;

    let bindings = html::element_with(page, "ul", r#"id\s*=\s*["']list["']"#)
        .map(|list| {
            html::elements(list, "li")
                .into_iter()
                .skip(LIST_HEADER_ROWS)
                .filter_map(parse_binding)
                .collect()
        })
        .unwrap_or_default();

    Ok(IpBindingResult {
        ip: ip.to_string(),
        address,
        bindings,
    })
}

fn parse_binding(item: &str) -> Option<IpBinding> {
    let date = html::element_with(item, "span", r#"class\s*=\s*["']date["']"#).map(html::text)?;
    let site = html::elements(item, "a").first().map(|a| html::text(a))?;
    (!date.is_empty() && !site.is_empty()).then_some(IpBinding { site, date })
}

/// Format an IP lookup as the two-part table shown to the user.
pub fn format_ip_report(result: &IpBindingResult) -> String {
    let mut lines = vec![
        String::new(),
        "+-----------------+------------------------".to_string(),
        format!("| IP地址          | {}", pad_right(&result.ip, 24)),
        format!("| 归属地          | {}", pad_right(&result.address, 24)),
        "+-----------------+------------------------".to_string(),
    ];

    if result.bindings.is_empty() {
        lines.push("未查到相关绑定信息！".to_string());
    } else {
        let border = "+--------------------------------+--------------------------------+";
        lines.push("绑定信息:".to_string());
        lines.push(border.to_string());
        for binding in &result.bindings {
            lines.push(format!(
                "| {} | {} |",
                pad_right(&binding.site, 30),
                pad_right(&binding.date, 30)
            ));
        }
        lines.push(border.to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use log::Level;

    use super::*;
    use crate::logging::testing::MemorySink;
    use crate::services::cdn::testing::{Behavior, ScriptedTransport};

    const PAGE: &str = r#"<html><body>
<div class="result result2">
  <h3>ASN归属地：美国 加利福尼亚州 圣克拉拉 谷歌公司</h3>
</div>
<ul id="list">
  <li><span class="date">绑定过的域名如下：</span></li>
  <li><span class="date">日期</span><a>域名</a></li>
  <li><span class="date">2024-01-02-----2024-06-30</span><a href="/dns.google/" target="_blank">dns.google</a></li>
  <li><span class="date">2021-03-04-----2023-12-31</span><a href="/8888.google/" target="_blank">8888.google</a></li>
  <li><span class="date"></span><a href="/broken/">broken.example</a></li>
</ul>
</body></html>"#;

    #[test]
    fn test_parse_ip138_page() {
        let result = parse_ip138("8.8.8.8", PAGE).unwrap();
        assert_eq!(result.ip, "8.8.8.8");
        assert_eq!(result.address, "ASN归属地：美国 加利福尼亚州 圣克拉拉 谷歌公司");
        assert_eq!(
            result.bindings,
            vec![
                IpBinding {
                    site: "dns.google".to_string(),
                    date: "2024-01-02-----2024-06-30".to_string(),
                },
                IpBinding {
                    site: "8888.google".to_string(),
                    date: "2021-03-04-----2023-12-31".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_ip138_without_list() {
        let result = parse_ip138("10.0.0.1", "<h3>保留地址</h3>").unwrap();
        assert_eq!(result.address, "保留地址");
        assert!(result.bindings.is_empty());
    }

    #[test]
    fn test_parse_ip138_missing_header() {
        assert!(matches!(
            parse_ip138("10.0.0.1", "<html></html>"),
            Err(ToolboxError::ParseError(_))
        ));
    }

    #[test]
    fn test_format_ip_report_with_bindings() {
        let result = parse_ip138("8.8.8.8", PAGE).unwrap();
        let report = format_ip_report(&result);
        assert!(report.contains("| IP地址          | 8.8.8.8"));
        assert!(report.contains("绑定信息:"));
        let row = format!("| {:<30} | {:<30} |", "dns.google", "2024-01-02-----2024-06-30");
        assert!(report.contains(&row), "{report}");
    }

    #[test]
    fn test_format_ip_report_without_bindings() {
        let report = format_ip_report(&IpBindingResult {
            ip: "10.0.0.1".to_string(),
            address: "局域网".to_string(),
            bindings: vec![],
        });
        assert!(report.contains("未查到相关绑定信息！"));
        assert!(!report.contains("绑定信息:"));
    }

    #[tokio::test]
    async fn test_ip_lookup_sends_browser_agent_and_logs_report() {
        let transport = ScriptedTransport::uniform(Behavior::respond(200, PAGE));
        let seen = transport.requests();
        let sink = MemorySink::default();

        let options = QueryOptions::default().with_proxy(Some("http://127.0.0.1:7890".to_string()));
        let result = ip_lookup(&transport, "8.8.8.8", &options, &sink).await.unwrap();

        assert_eq!(result.bindings.len(), 2);
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen[0].url, "https://site.ip138.com/8.8.8.8/");
        assert_eq!(seen[0].proxy.as_deref(), Some("http://127.0.0.1:7890"));
        assert_eq!(seen[0].user_agent.as_deref(), Some(BROWSER_UA));
        assert!(sink.lines_at(Level::Info)[0].contains("dns.google"));
    }

    #[tokio::test]
    async fn test_ip_lookup_bad_status() {
        let transport = ScriptedTransport::uniform(Behavior::respond(403, "denied"));
        let sink = MemorySink::default();
        let result = ip_lookup(&transport, "8.8.8.8", &QueryOptions::default(), &sink).await;
        assert!(matches!(result, Err(ToolboxError::NetworkError(msg)) if msg == "HTTP 403"));
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_ip_lookup_real() {
        let sink = MemorySink::default();
        let result = ip_lookup(
            &crate::transport::ReqwestTransport::new(),
            "114.114.114.114",
            &QueryOptions::default(),
            &sink,
        )
        .await;
        let info = result.unwrap_or_else(|e| panic!("ip138 lookup failed: {e}"));
        assert!(!info.address.is_empty());
    }
}
