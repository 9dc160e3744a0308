//! 配置文件管理
//!
//! 配置以 JSON 存储在平台配置目录下，首次加载时写入默认值。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use runwar_toolbox::QueryOptions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::logging::parse_level;

/// 覆盖配置文件位置的环境变量
pub const CONFIG_ENV: &str = "RUNWAR_CONFIG";

const CONFIG_FILE: &str = "config.json";

/// 配置项及其说明，`config --show` 按此顺序输出
pub const CONFIG_KEYS: &[(&str, &str)] = &[
    ("level", "日志等级: DEBUG / INFO / WARNING / ERROR / CRITICAL"),
    ("use_color", "是否使用彩色输出"),
    ("output_json", "是否输出 JSON 格式日志"),
    ("name", "日志根 span 名称 (可选)"),
    ("log", "是否启用日志记录"),
    ("log_path", "日志根目录"),
    ("proxy", "默认代理地址 (可选)"),
    ("show_logo", "是否在 CLI 启动时显示 Logo"),
    ("timeout_secs", "CDN 探测单次请求超时 (秒)"),
    ("max_workers", "CDN 探测最大并发数"),
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("配置项 {key} 不存在，请使用已有配置项: {}", .known.join(", "))]
    UnknownKey { key: String, known: Vec<String> },

    #[error("配置项 {key} 的值无效: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// 运行配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub level: String,
    pub use_color: bool,
    pub output_json: bool,
    pub name: Option<String>,
    pub log: bool,
    pub log_path: String,
    pub proxy: Option<String>,
    pub show_logo: bool,
    pub timeout_secs: u64,
    pub max_workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "DEBUG".to_string(),
            use_color: true,
            output_json: false,
            name: None,
            log: true,
            log_path: "./log".to_string(),
            proxy: None,
            show_logo: true,
            timeout_secs: 10,
            max_workers: 5,
        }
    }
}

/// 配置文件路径：`$RUNWAR_CONFIG`，否则为平台配置目录下的 `runwar/config.json`
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("runwar")
        .join(CONFIG_FILE)
}

impl Config {
    /// 加载配置，文件不存在时写入并返回默认配置
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 保存配置到文件
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).map_err(io_err)
    }

    /// 更新单个配置项
    ///
    /// `true`/`false`/`none`（不区分大小写）转换为布尔值或空值，数值配置项接受整数，
    /// 其余保持字符串。类型不匹配时返回错误且不修改配置。
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), ConfigError> {
        let mut map = self.to_map();
        let Some(current) = map.get(key) else {
            return Err(ConfigError::UnknownKey {
                key: key.to_string(),
                known: CONFIG_KEYS.iter().map(|(k, _)| (*k).to_string()).collect(),
            });
        };

        let value = coerce(raw, current.is_number());
        map.insert(key.to_string(), value);

        let updated: Self =
            serde_json::from_value(Value::Object(map)).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        if parse_level(&updated.level).is_none() {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                reason: format!("unknown log level {}", updated.level),
            });
        }

        *self = updated;
        Ok(())
    }

    /// `(key, value, description)` for every key in display order.
    pub fn entries(&self) -> Vec<(&'static str, String, &'static str)> {
        let map = self.to_map();
        CONFIG_KEYS
            .iter()
            .map(|(key, desc)| {
                let value = match map.get(*key) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => "None".to_string(),
                    Some(other) => other.to_string(),
                };
                (*key, value, *desc)
            })
            .collect()
    }

    /// 查询参数，命令行传入的代理与超时优先
    pub fn query_options(&self, proxy: Option<&str>, timeout_secs: Option<u64>) -> QueryOptions {
        QueryOptions {
            timeout: Duration::from_secs(timeout_secs.unwrap_or(self.timeout_secs)),
            max_workers: self.max_workers,
            ..QueryOptions::default()
        }
        .with_proxy(proxy.map(ToString::to_string).or_else(|| self.proxy.clone()))
    }

    fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

fn coerce(raw: &str, numeric: bool) -> Value {
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "none" => return Value::Null,
        _ => {}
    }
    if numeric && let Ok(n) = raw.trim().parse::<u64>() {
        return Value::from(n);
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_config() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join(CONFIG_FILE);
        (tmp, path)
    }

    #[test]
    fn test_load_creates_default_file() {
        let (_tmp, path) = temp_config();
        let config = Config::load_or_create(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = Config::load_or_create(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_load_fills_missing_keys() {
        let (_tmp, path) = temp_config();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"level": "INFO", "proxy": "http://127.0.0.1:7890"}"#).unwrap();

        let config = Config::load_or_create(&path).unwrap();
        assert_eq!(config.level, "INFO");
        assert_eq!(config.proxy.as_deref(), Some("http://127.0.0.1:7890"));
        assert_eq!(config.max_workers, 5);
        assert!(config.show_logo);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let (_tmp, path) = temp_config();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::load_or_create(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_set_coerces_booleans_and_none() {
        let mut config = Config {
            proxy: Some("http://127.0.0.1:7890".to_string()),
            ..Config::default()
        };
        config.set("use_color", "FALSE").unwrap();
        config.set("proxy", "None").unwrap();
        assert!(!config.use_color);
        assert_eq!(config.proxy, None);
    }

    #[test]
    fn test_set_coerces_integers_for_numeric_keys() {
        let mut config = Config::default();
        config.set("max_workers", "16").unwrap();
        config.set("timeout_secs", "3").unwrap();
        assert_eq!(config.max_workers, 16);
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn test_set_keeps_strings() {
        let mut config = Config::default();
        config.set("proxy", "socks5://127.0.0.1:1080").unwrap();
        config.set("name", "scan-01").unwrap();
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert_eq!(config.name.as_deref(), Some("scan-01"));
    }

    #[test]
    fn test_set_unknown_key() {
        let mut config = Config::default();
        let err = config.set("colour", "true").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { ref key, .. } if key == "colour"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_set_type_mismatch_leaves_config_unchanged() {
        let mut config = Config::default();
        assert!(matches!(
            config.set("max_workers", "many"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set("use_color", "yes"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set("level", "LOUD"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_set_then_save_roundtrip() {
        let (_tmp, path) = temp_config();
        let mut config = Config::load_or_create(&path).unwrap();
        config.set("level", "warning").unwrap();
        config.save(&path).unwrap();
        assert_eq!(Config::load_or_create(&path).unwrap().level, "warning");
    }

    #[test]
    fn test_entries_follow_key_order() {
        let entries = Config::default().entries();
        let keys: Vec<&str> = entries.iter().map(|(k, _, _)| *k).collect();
        let expected: Vec<&str> = CONFIG_KEYS.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, expected);
        assert_eq!(entries[0].1, "DEBUG");
        assert_eq!(entries[3].1, "None");
        assert_eq!(entries[9].1, "5");
    }

    #[test]
    fn test_query_options_overrides() {
        let config = Config {
            proxy: Some("http://config-proxy:8080".to_string()),
            ..Config::default()
        };

        let from_config = config.query_options(None, None);
        assert_eq!(from_config.proxy.as_deref(), Some("http://config-proxy:8080"));
        assert_eq!(from_config.timeout, Duration::from_secs(10));
        assert_eq!(from_config.max_workers, 5);

        let overridden = config.query_options(Some("http://cli-proxy:1"), Some(2));
        assert_eq!(overridden.proxy.as_deref(), Some("http://cli-proxy:1"));
        assert_eq!(overridden.timeout, Duration::from_secs(2));
    }
}
