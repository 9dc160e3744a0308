//! ICP filing lookup (beianx.cn).
//!
//! The site gates its search page behind two rounds of cookies and serves a
//! cached result unless asked to refresh first, so one lookup is four GETs.

use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};

use crate::error::{ToolboxResult, TransportError};
use crate::logging::LogSink;
use crate::services::html;
use crate::services::layout::pad_right;
use crate::transport::{build_client, classify_error};
use crate::types::{IcpLookupResult, IcpRecord, QueryOptions};

const BEIANX_URL: &str = "https://www.beianx.cn";
const USER_AGENT: &str = "Mozilla/5.0";
const MAC_STRING: &str = "mac_string=13d71b22a4-569a-4b7e-a6f6-6f2de6140a83";
const CACHE_REFRESHED: &str = r#""msg":"更新成功""#;

const CACHE_TIMEOUT: Duration = Duration::from_secs(20);
const PAGE_TIMEOUT: Duration = Duration::from_secs(15);

/// Cells a result row must have to carry a full record.
const MIN_CELLS: usize = 7;

/// Query ICP filings for a domain or company keyword.
///
/// Cookie and cache-refresh failures are logged and the lookup carries on;
/// only the final page request can fail the lookup.
pub async fn icp_lookup(
    keyword: &str,
    options: &QueryOptions,
    sink: &dyn LogSink,
) -> ToolboxResult<IcpLookupResult> {
    sink.info(&format!("开始查询 ICP: {keyword}"));

    let encoded = urlencoding::encode(keyword);
    let search_url = format!("{BEIANX_URL}/search/{encoded}");
    let cache_url = format!("{BEIANX_URL}/up_cache_2025/ajax_get2?type=&keyword={encoded}");
    let proxy = options.proxy.as_deref();

    let cookie = session_cookie(&search_url, proxy, options.timeout, sink).await;

    let cache_refreshed = refresh_cache(&cache_url, cookie.as_deref(), proxy, sink).await;

    let client = build_client(proxy, Some(PAGE_TIMEOUT), Some(USER_AGENT))?;
    let mut request = client.get(&search_url);
    if let Some(cookie) = &cookie {
        request = request.header(COOKIE, cookie);
    }
    let page = async {
        let response = request.send().await.map_err(|e| classify_error(&e))?;
        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }
        response.text().await.map_err(|e| classify_error(&e))
    }
    .await
    .inspect_err(|e| sink.error(&format!("ICP 页面请求失败: {e}")))?;

    let records = parse_icp_table(&page);
    for record in &records {
        sink.info(&format_icp_record(keyword, record));
    }
    sink.info(&format!("查询完成，共 {} 条记录", records.len()));

    Ok(IcpLookupResult {
        keyword: keyword.to_string(),
        cache_refreshed,
        records,
    })
}

/// Run the two cookie rounds and return the combined `Cookie` header, if the
/// site handed out an `acw_tc` cookie.
async fn session_cookie(
    search_url: &str,
    proxy: Option<&str>,
    timeout: Duration,
    sink: &dyn LogSink,
) -> Option<String> {
    let client = match build_client(proxy, Some(timeout), Some(USER_AGENT)) {
        Ok(client) => client,
        Err(e) => {
            sink.error(&format!("创建 HTTP 客户端失败: {e}"));
            return None;
        }
    };

    let first = match client.get(search_url).send().await {
        Ok(response) => response,
        Err(e) => {
            sink.error(&format!("获取初始 Cookie 失败: {}", classify_error(&e)));
            return None;
        }
    };
    let acw = acw_cookie(&set_cookies(first.headers()))?;
    sink.debug(&format!("生成 acw_tc cookie: {acw}"));

    let second = match client.get(search_url).header(COOKIE, &acw).send().await {
        Ok(response) => response,
        Err(e) => {
            sink.error(&format!("获取 ASP Cookie 失败: {}", classify_error(&e)));
            return Some(acw);
        }
    };
    let asp = aspnet_cookies(&set_cookies(second.headers()));
    Some(combine_cookies(&acw, &asp))
}

/// Ask the site to rebuild its cached result. Returns whether it confirmed.
async fn refresh_cache(
    cache_url: &str,
    cookie: Option<&str>,
    proxy: Option<&str>,
    sink: &dyn LogSink,
) -> bool {
    let client = match build_client(proxy, Some(CACHE_TIMEOUT), Some(USER_AGENT)) {
        Ok(client) => client,
        Err(e) => {
            sink.error(&format!("刷新缓存异常: {e}"));
            return false;
        }
    };
    let mut request = client.get(cache_url);
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            sink.error(&format!("刷新缓存异常: {}", classify_error(&e)));
            return false;
        }
    };
    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) if body.contains(CACHE_REFRESHED) => {
            sink.info("刷新缓存成功");
            true
        }
        Ok(_) => {
            sink.warn(&format!("刷新缓存失败: {status}"));
            false
        }
        Err(e) => {
            sink.error(&format!("刷新缓存异常: {}", classify_error(&e)));
            false
        }
    }
}

fn set_cookies(headers: &HeaderMap) -> Vec<&str> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect()
}

/// `acw_tc=...; mac_string=...` built from the first `acw_tc` cookie.
fn acw_cookie(set_cookies: &[&str]) -> Option<String> {
    set_cookies
        .iter()
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .find(|pair| pair.starts_with("acw_tc="))
        .map(|pair| format!("{pair}; {MAC_STRING}"))
}

/// `name=value` pairs of every `.AspNet*` cookie, first occurrence wins.
fn aspnet_cookies(set_cookies: &[&str]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for cookie in set_cookies {
        let Some(pair) = cookie.split(';').next() else {
            continue;
        };
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.contains(".AspNet") && !pairs.iter().any(|(n, _)| n == name) {
            pairs.push((name.to_string(), value.trim().to_string()));
        }
    }
    pairs
}

fn combine_cookies(acw: &str, asp: &[(String, String)]) -> String {
    let asp: Vec<String> = asp.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{acw};{}", asp.join(";"))
}

/// Records from the first `table.table` of a search page.
fn parse_icp_table(page: &str) -> Vec<IcpRecord> {
    let Some(table) = html::element_with(page, "table", r#"class\s*=\s*["'](?:[^"']*\s)?table(?:\s[^"']*)?["']"#) else {
        return Vec::new();
    };

    html::elements(table, "tr")
        .into_iter()
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<String> = html::elements(row, "td").into_iter().map(html::text).collect();
            (cells.len() >= MIN_CELLS).then(|| IcpRecord {
                company: cells[1].clone(),
                icp_number: cells[3].clone(),
                domain: cells[5].clone(),
                audit_date: cells[6].clone(),
            })
        })
        .collect()
}

/// Boxed block for one ICP record.
pub fn format_icp_record(keyword: &str, record: &IcpRecord) -> String {
    let border = "+------------------+------------------------";
    [
        format!("域名 {keyword} 查询结果:"),
        border.to_string(),
        format!("| 主办单位名称     | {}", pad_right(&record.company, 24)),
        format!("| ICP备案号        | {}", pad_right(&record.icp_number, 24)),
        format!("| 网站首页地址     | {}", pad_right(&record.domain, 24)),
        format!("| 审核通过日期     | {}", pad_right(&record.audit_date, 24)),
        border.to_string(),
    ]
    .join("\n")
}
