//! WHOIS lookup module.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use whois_rust::{WhoIs, WhoIsLookupOptions};

use crate::error::{ToolboxError, ToolboxResult};
use crate::logging::LogSink;
use crate::services::html::compile;
use crate::types::WhoisResult;

/// Embedded WHOIS server mapping (TLD -> server).
pub(crate) const WHOIS_SERVERS: &str = include_str!("whois_servers.json");

fn patterns(sources: &[&str]) -> Vec<Regex> {
    sources.iter().filter_map(|p| compile(p)).collect()
}

static REGISTRAR: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"(?im)^\s*Registrar:\s*(.+)$",
        r"(?im)^\s*Registrar Name:\s*(.+)$",
        r"(?im)^\s*Sponsoring Registrar:\s*(.+)$",
    ])
});

static WHOIS_SERVER: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"(?im)^\s*Registrar WHOIS Server:\s*(.+)$",
        r"(?im)^\s*Whois Server:\s*(.+)$",
        r"(?im)^\s*whois:\s*(.+)$",
    ])
});

static CREATION_DATE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"(?im)^\s*Creation Date:\s*(.+)$",
        r"(?im)^\s*Created Date:\s*(.+)$",
        r"(?im)^\s*Created:\s*(.+)$",
        r"(?im)^\s*Registration Time:\s*(.+)$",
        r"(?im)^\s*Registration Date:\s*(.+)$",
    ])
});

static EXPIRATION_DATE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"(?im)^\s*Expir(?:y|ation) Date:\s*(.+)$",
        r"(?im)^\s*Registry Expiry Date:\s*(.+)$",
        r"(?im)^\s*Registrar Registration Expiration Date:\s*(.+)$",
        r"(?im)^\s*Expiration Time:\s*(.+)$",
        r"(?im)^\s*paid-till:\s*(.+)$",
    ])
});

static UPDATED_DATE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"(?im)^\s*Updated Date:\s*(.+)$",
        r"(?im)^\s*Last Updated:\s*(.+)$",
        r"(?im)^\s*Last Modified:\s*(.+)$",
    ])
});

static ORG: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"(?im)^\s*Registrant Organi[sz]ation:\s*(.+)$",
        r"(?im)^\s*Registrant:\s*(.+)$",
        r"(?im)^\s*org:\s*(.+)$",
    ])
});

static COUNTRY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"(?im)^\s*Registrant Country:\s*(.+)$",
        r"(?im)^\s*country:\s*(.+)$",
    ])
});

static DNSSEC: LazyLock<Vec<Regex>> = LazyLock::new(|| patterns(&[r"(?im)^\s*DNSSEC:\s*(.+)$"]));

static NAME_SERVERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"(?im)^\s*Name Server:\s*(.+)$",
        r"(?im)^\s*nserver:\s*(.+)$",
        r"(?im)^\s*DNS:\s*(.+)$",
    ])
});

static STATUS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    patterns(&[
        r"(?im)^\s*Domain Status:\s*(.+)$",
        r"(?im)^\s*Status:\s*(.+)$",
        r"(?im)^\s*state:\s*(.+)$",
    ])
});

static EMAIL: LazyLock<Vec<Regex>> =
    LazyLock::new(|| patterns(&[r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+"]));

/// Perform a WHOIS lookup for a domain or IP and log the report.
pub async fn whois_lookup(
    domain: &str,
    whois_servers: &str,
    timeout: Duration,
    sink: &dyn LogSink,
) -> ToolboxResult<WhoisResult> {
    let result = query(domain, whois_servers, timeout).await;
    match &result {
        Ok(info) => sink.info(&format_whois_report(info)),
        Err(e) => sink.error(&format!("Whois查询错误: {e}")),
    }
    result
}

async fn query(domain: &str, whois_servers: &str, timeout: Duration) -> ToolboxResult<WhoisResult> {
    let whois = WhoIs::from_string(whois_servers).map_err(|e| {
        ToolboxError::NetworkError(format!("Failed to initialize WHOIS client: {e}"))
    })?;

    let mut options = WhoIsLookupOptions::from_string(domain)
        .map_err(|e| ToolboxError::ValidationError(format!("Invalid domain: {e}")))?;
    options.timeout = Some(timeout);

    let raw = whois
        .lookup_async(options)
        .await
        .map_err(|e| ToolboxError::NetworkError(format!("WHOIS query failed: {e}")))?;

    Ok(parse_whois_response(domain, &raw))
}

/// Parse structured fields from a raw WHOIS response.
fn parse_whois_response(domain: &str, raw: &str) -> WhoisResult {
    WhoisResult {
        domain: domain.to_string(),
        registrar: extract_field(raw, &REGISTRAR),
        whois_server: extract_field(raw, &WHOIS_SERVER).map(|s| s.to_lowercase()),
        creation_date: extract_field(raw, &CREATION_DATE),
        expiration_date: extract_field(raw, &EXPIRATION_DATE),
        updated_date: extract_field(raw, &UPDATED_DATE),
        name_servers: extract_all(raw, &NAME_SERVERS, |s| Some(s.to_lowercase())),
        status: extract_all(raw, &STATUS, |s| {
            s.split_whitespace().next().map(ToString::to_string)
        }),
        emails: extract_emails(raw),
        org: extract_field(raw, &ORG),
        country: extract_field(raw, &COUNTRY),
        dnssec: extract_field(raw, &DNSSEC),
        raw: raw.to_string(),
    }
}

/// Try each pattern in order and return the first non-empty capture.
fn extract_field(text: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// Every capture of every pattern, normalised and deduplicated in order.
fn extract_all(text: &str, patterns: &[Regex], normalise: impl Fn(&str) -> Option<String>) -> Vec<String> {
    let mut values = Vec::new();
    for re in patterns {
        for caps in re.captures_iter(text) {
            let Some(value) = caps.get(1).and_then(|m| normalise(m.as_str().trim())) else {
                continue;
            };
            if !value.is_empty() && !values.contains(&value) {
                values.push(value);
            }
        }
    }
    values
}

fn extract_emails(text: &str) -> Vec<String> {
    let mut emails = Vec::new();
    for re in EMAIL.iter() {
        for m in re.find_iter(text) {
            let email = m.as_str().trim_end_matches('.').to_lowercase();
            if !emails.contains(&email) {
                emails.push(email);
            }
        }
    }
    emails
}

/// `key: value` lines for every field present in `result`.
pub fn format_whois_report(result: &WhoisResult) -> String {
    let mut lines = vec!["Whois查询结果:".to_string(), format!("domain_name: {}", result.domain)];

    let scalars = [
        ("registrar", &result.registrar),
        ("whois_server", &result.whois_server),
        ("creation_date", &result.creation_date),
        ("expiration_date", &result.expiration_date),
        ("updated_date", &result.updated_date),
        ("org", &result.org),
        ("country", &result.country),
        ("dnssec", &result.dnssec),
    ];
    for (key, value) in scalars {
        if let Some(value) = value {
            lines.push(format!("{key}: {value}"));
        }
    }

    let lists = [
        ("name_servers", &result.name_servers),
        ("status", &result.status),
        ("emails", &result.emails),
    ];
    for (key, values) in lists {
        if !values.is_empty() {
            lines.push(format!("{key}: {}", values.join(", ")));
        }
    }

    lines.join("\n")
}
