//! 日志初始化
//!
//! 控制台输出到 stdout；启用 `log` 时另写入 `main.log`、`err.log`、`config.log`
//! 以及单次查询的 `<kind>/<target>.<kind>.log`。文件写入经由 `tracing-appender`
//! 的非阻塞 worker，返回的 [`LogGuards`] 需持有到进程退出。

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry, fmt};

use crate::config::Config;

const MAIN_LOG: &str = "main.log";
const ERR_LOG: &str = "err.log";
const CONFIG_LOG: &str = "config.log";

/// Per-kind sub-directories created under the log root.
pub const QUERY_KINDS: &[&str] = &["ip", "icp", "whois", "cdn"];

/// Target of configuration change records.
pub const CONFIG_TARGET: &str = "runwar::config";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Flush guards of the non-blocking file writers.
#[must_use]
pub struct LogGuards(#[allow(dead_code)] Vec<WorkerGuard>);

/// One lookup whose records also go to a dedicated file.
#[derive(Debug, Clone, Copy)]
pub struct QueryLog<'a> {
    pub kind: &'static str,
    pub target: &'a str,
}

impl QueryLog<'_> {
    /// `runwar::<kind>`, the target the toolbox logs this kind under.
    pub fn log_target(&self) -> String {
        format!("runwar::{}", self.kind)
    }

    /// `<root>/<kind>/<target>.<kind>.log`
    pub fn path(&self, root: &Path) -> PathBuf {
        root.join(self.kind)
            .join(format!("{}.{}.log", file_stem(self.target), self.kind))
    }
}

/// Map a configured level name to a filter. Accepts the Python-style
/// `WARNING` and `CRITICAL` names.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some(LevelFilter::TRACE),
        "DEBUG" => Some(LevelFilter::DEBUG),
        "INFO" => Some(LevelFilter::INFO),
        "WARN" | "WARNING" => Some(LevelFilter::WARN),
        "ERROR" | "CRITICAL" => Some(LevelFilter::ERROR),
        "OFF" => Some(LevelFilter::OFF),
        _ => None,
    }
}

/// Keep HTTP stack internals out of the output below WARN.
fn quiet_dependencies(level: LevelFilter) -> Targets {
    Targets::new()
        .with_default(level)
        .with_target("hyper", LevelFilter::WARN)
        .with_target("hyper_util", LevelFilter::WARN)
        .with_target("reqwest", LevelFilter::WARN)
        .with_target("rustls", LevelFilter::WARN)
        .with_target("h2", LevelFilter::WARN)
}

/// Install the process-wide subscriber.
pub fn init(config: &Config, query: Option<QueryLog<'_>>) -> anyhow::Result<LogGuards> {
    let level = parse_level(&config.level).unwrap_or(LevelFilter::DEBUG);
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guards = Vec::new();

    let console = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(config.use_color);
    layers.push(if config.output_json {
        console.json().with_filter(quiet_dependencies(level)).boxed()
    } else {
        console.with_filter(quiet_dependencies(level)).boxed()
    });

    if config.log {
        let root = Path::new(&config.log_path);
        create_log_dirs(root)?;

        let (main, guard) = tracing_appender::non_blocking(open_append(&root.join(MAIN_LOG))?);
        guards.push(guard);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(main)
                .with_filter(quiet_dependencies(level))
                .boxed(),
        );

        let (err, guard) = tracing_appender::non_blocking(open_append(&root.join(ERR_LOG))?);
        guards.push(guard);
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_writer(err)
                .with_filter(LevelFilter::ERROR)
                .boxed(),
        );

        let (changes, guard) = tracing_appender::non_blocking(open_append(&root.join(CONFIG_LOG))?);
        guards.push(guard);
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_writer(changes)
                .with_filter(Targets::new().with_target(CONFIG_TARGET, LevelFilter::INFO))
                .boxed(),
        );

        if let Some(query) = query {
            let path = query.path(root);
            let file = File::create(&path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            guards.push(guard);
            layers.push(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(Targets::new().with_target(query.log_target(), level))
                    .boxed(),
            );
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("failed to install log subscriber")?;

    Ok(LogGuards(guards))
}

fn create_log_dirs(root: &Path) -> anyhow::Result<()> {
    for kind in QUERY_KINDS {
        let dir = root.join(kind);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    }
    Ok(())
}

fn open_append(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Replace characters that are unsafe in file names (`/`, `:` of IPv6, ...).
fn file_stem(target: &str) -> String {
    target
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_names() {
        assert_eq!(parse_level("DEBUG"), Some(LevelFilter::DEBUG));
        assert_eq!(parse_level("info"), Some(LevelFilter::INFO));
        assert_eq!(parse_level("WARNING"), Some(LevelFilter::WARN));
        assert_eq!(parse_level("warn"), Some(LevelFilter::WARN));
        assert_eq!(parse_level("CRITICAL"), Some(LevelFilter::ERROR));
        assert_eq!(parse_level("ERROR"), Some(LevelFilter::ERROR));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_query_log_path() {
        let query = QueryLog {
            kind: "cdn",
            target: "example.com",
        };
        assert_eq!(
            query.path(Path::new("./log")),
            Path::new("./log/cdn/example.com.cdn.log")
        );
        assert_eq!(query.log_target(), "runwar::cdn");
    }

    #[test]
    fn test_query_log_path_sanitises_target() {
        let query = QueryLog {
            kind: "whois",
            target: "2606:4700::1111",
        };
        assert_eq!(
            query.path(Path::new("log")),
            Path::new("log/whois/2606_4700__1111.whois.log")
        );
        assert_eq!(file_stem("../etc"), ".._etc");
        assert_eq!(file_stem("腾讯"), "腾讯");
    }

    #[test]
    fn test_create_log_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("log");
        create_log_dirs(&root).unwrap();
        for kind in QUERY_KINDS {
            assert!(root.join(kind).is_dir());
        }
    }

    #[test]
    fn test_open_append_keeps_content() {
        use std::io::Write;

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(MAIN_LOG);
        for line in ["first\n", "second\n"] {
            let mut file = open_append(&path).unwrap();
            file.write_all(line.as_bytes()).unwrap();
        }
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }
}
