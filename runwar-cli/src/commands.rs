//! 命令行定义与各子命令实现

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use runwar_toolbox::{LogFacadeSink, QueryOptions, ToolboxService};

use crate::config::Config;
use crate::logging::{CONFIG_TARGET, QueryLog};

#[derive(Parser)]
#[command(name = "runwar", version)]
#[command(about = "多功能网络信息查询工具 (支持 IP/ICP/WHOIS/CDN 查询)")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// 本次运行使用的代理地址，覆盖配置文件
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// 单次请求超时 (秒)，覆盖配置文件
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 根据 IP 查询归属地与绑定域名, 例如: runwar ip 114.114.114.114
    Ip { target: String },
    /// 根据域名查询 ICP 备案信息, 例如: runwar icp baidu.com
    Icp { domain: String },
    /// 根据域名查询 WHOIS 信息, 例如: runwar whois qq.com
    Whois { domain: String },
    /// 多地区节点检测域名是否使用 CDN, 例如: runwar cdn baidu.com
    Cdn { domain: String },
    /// 查看或修改配置文件
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ConfigArgs {
    /// 显示当前配置
    #[arg(long)]
    pub show: bool,

    /// 要修改的配置项, 和 --set-value 配套使用
    #[arg(long, requires = "set_value")]
    pub set_key: Option<String>,

    /// 配置项的新值, 和 --set-key 配套使用
    #[arg(long, requires = "set_key")]
    pub set_value: Option<String>,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Commands {
    /// The lookup this command runs, for its dedicated log file.
    pub fn query_log(&self) -> Option<QueryLog<'_>> {
        let (kind, target) = match self {
            Self::Ip { target } => ("ip", target),
            Self::Icp { domain } => ("icp", domain),
            Self::Whois { domain } => ("whois", domain),
            Self::Cdn { domain } => ("cdn", domain),
            Self::Config(_) => return None,
        };
        Some(QueryLog {
            kind,
            target: target.trim(),
        })
    }
}

/// Run one command to completion.
pub async fn run(
    command: Commands,
    config_path: &Path,
    config: Config,
    options: &QueryOptions,
) -> anyhow::Result<()> {
    match command {
        Commands::Ip { target } => {
            tracing::info!(target: "runwar::ip", "开始 IP 查询: {target}");
            ToolboxService::ip_lookup(&target, options, &LogFacadeSink::IP)
                .await
                .with_context(|| format!("IP 查询失败: {target}"))?;
        }
        Commands::Icp { domain } => {
            tracing::info!(target: "runwar::icp", "开始 ICP 查询: {domain}");
            ToolboxService::icp_lookup(&domain, options, &LogFacadeSink::ICP)
                .await
                .with_context(|| format!("ICP 查询失败: {domain}"))?;
        }
        Commands::Whois { domain } => {
            tracing::info!(target: "runwar::whois", "开始 WHOIS 查询: {domain}");
            ToolboxService::whois_lookup(&domain, options, &LogFacadeSink::WHOIS)
                .await
                .with_context(|| format!("WHOIS 查询失败: {domain}"))?;
        }
        Commands::Cdn { domain } => {
            tracing::info!(target: "runwar::cdn", "开始 CDN 查询: {domain}");
            let results = ToolboxService::cdn_check(&domain, options, Arc::new(LogFacadeSink::CDN))
                .await
                .with_context(|| format!("CDN 查询失败: {domain}"))?;
            tracing::info!(
                target: "runwar::cdn",
                "检测完成: {}/{} 个节点成功, 耗时 {} ms",
                results.success_count(),
                results.len(),
                results.total_time_ms
            );
        }
        Commands::Config(args) => configure(&args, config_path, config)?,
    }
    Ok(())
}

fn configure(args: &ConfigArgs, config_path: &Path, mut config: Config) -> anyhow::Result<()> {
    if args.show {
        println!("当前配置内容 ({}):", config_path.display());
        for (key, value, desc) in config.entries() {
            println!("{key}: {value}  # {desc}");
        }
        return Ok(());
    }

    let (Some(key), Some(value)) = (&args.set_key, &args.set_value) else {
        println!("请使用 --set-key 和 --set-value 来修改配置，或使用 --show 查看配置");
        return Ok(());
    };

    config.set(key, value)?;
    config.save(config_path)?;
    println!("配置已更新: {key} = {value}");
    tracing::info!(target: CONFIG_TARGET, "修改配置: {key} = {value}");
    Ok(())
}
