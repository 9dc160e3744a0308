//! Fixed-width report for a CDN probe run.

use crate::logging::LogSink;
use crate::services::layout::{pad_center, pad_right, single_line, truncate_to_width};
use crate::types::{ProbeOutcome, ProbeResultSet};

/// Display width of the region column.
const REGION_WIDTH: usize = 18;
/// Display width of the IP count column.
const COUNT_WIDTH: usize = 8;
/// Display width of the IP list column; longer lists are cut.
pub const IP_LIST_WIDTH: usize = 37;
/// Display width of the status column.
const STATUS_WIDTH: usize = 10;

const PLACEHOLDER: &str = "-";

/// Prefix of the warning emitted when no probe succeeded.
pub const NO_CDN_WARNING: &str = "所有节点检测均失败";

/// Render `results` as a table plus verdict, emit every line through `sink`
/// and return the full report.
///
/// Rows follow registry order. The verdict is a heuristic: a target that no
/// probe could resolve, or that resolves to one IP everywhere, is only
/// *likely* not behind a CDN.
pub fn render(results: &ProbeResultSet, target: &str, sink: &dyn LogSink) -> String {
    let target = single_line(target);
    let mut lines = vec![format!("目标 {target} 检测结果如下:")];

    let border = border();
    lines.push(border.clone());
    lines.push(row("检测节点", "IP数量", "IP列表", "检测状态"));
    lines.push(border.clone());

    for result in results.in_registry_order() {
        let (count, ips) = match &result.outcome {
            ProbeOutcome::Success { ip_list, ip_count } => {
                let ips = if ip_list.is_empty() {
                    PLACEHOLDER.to_string()
                } else {
                    ip_list.join(", ")
                };
                (ip_count.to_string(), ips)
            }
            _ => (PLACEHOLDER.to_string(), PLACEHOLDER.to_string()),
        };
        let ips = single_line(&ips);
        lines.push(row(
            &single_line(result.region()),
            &count,
            &truncate_to_width(&ips, IP_LIST_WIDTH),
            result.outcome.label(),
        ));
    }
    lines.push(border);

    for line in &lines {
        sink.info(line);
    }

    let total = results.len();
    let succeeded = results.success_count();
    let distinct = results.distinct_ips();

    let verdict = if succeeded == 0 {
        let line = format!(
            "{NO_CDN_WARNING}，目标 {target} 可能没有使用CDN（启发式判断：未能从多个节点观测到边缘 IP，仅供参考）"
        );
        sink.warn(&line);
        line
    } else {
        let line = match distinct.len() {
            0 => format!("{succeeded}/{total} 个节点检测成功，但均未返回 IP，无法判断目标 {target} 是否使用CDN"),
            1 => format!(
                "{succeeded}/{total} 个节点检测成功，各节点观测到的 IP 一致（{}），未发现多节点分发迹象（启发式判断，仅供参考）",
                single_line(&distinct[0])
            ),
            n => format!(
                "{succeeded}/{total} 个节点检测成功，共观测到 {n} 个不同 IP，目标 {target} 可能使用了CDN（启发式判断，仅供参考）"
            ),
        };
        sink.info(&line);
        line
    };
    lines.push(verdict);

    lines.join("\n")
}

fn border() -> String {
    format!(
        "+{}+{}+{}+{}+",
        "-".repeat(REGION_WIDTH + 2),
        "-".repeat(COUNT_WIDTH + 2),
        "-".repeat(IP_LIST_WIDTH + 2),
        "-".repeat(STATUS_WIDTH + 2),
    )
}

fn row(region: &str, count: &str, ips: &str, status: &str) -> String {
    format!(
        "| {} | {} | {} | {} |",
        pad_right(region, REGION_WIDTH),
        pad_center(count, COUNT_WIDTH),
        pad_right(ips, IP_LIST_WIDTH),
        pad_right(status, STATUS_WIDTH),
    )
}
