//! Reconnaissance toolbox for runwar
//!
//! 提供域名与 IP 侦察工具：IP 绑定历史、ICP 备案、WHOIS、多地区 CDN 检测。
//! 所有查询无状态，日志通过注入的 [`LogSink`] 输出。

mod error;
mod logging;
mod services;
mod transport;
mod types;

pub use error::{ToolboxError, ToolboxResult, TransportError};
pub use logging::{LogFacadeSink, LogSink};
pub use services::cdn::{
    CdnDetector, IP_LIST_WIDTH, NO_CDN_WARNING, ProbeContext, QUERY_PARAM, cdn_nodes,
    classify_response, parse_ip_list, probe, render,
};
pub use services::{
    ToolboxService, format_icp_record, format_ip_report, format_whois_report, truncate_to_width,
};
pub use transport::{HttpRequest, HttpResponse, ProbeTransport, ReqwestTransport};
pub use types::{
    IcpLookupResult, IcpRecord, IpBinding, IpBindingResult, ProbeEndpoint, ProbeOutcome,
    ProbeResult, ProbeResultSet, QueryOptions, WhoisResult,
};
