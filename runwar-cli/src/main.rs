//! runwar: IP / ICP / WHOIS / CDN reconnaissance from the command line.

mod commands;
mod config;
mod logging;

use std::process::ExitCode;

use clap::CommandFactory;
use commands::CommandLine;
use config::Config;
use tracing::Instrument;

const LOGO: &str = r"
    _____
    |  __ \
    | |__) |   _ _ __   __      ____ _ _ __
    |  _  / | | | '_ \  \ \ /\ / / _` | '__|
    | | \ \ |_| | | | |  \ V  V / (_| | |
    |_|  \_\__,_|_| |_|   \_/\_/ \__,_|_|
    ___ __ _ _ __     ___ __ _ _ __
    / __/ _` | '_ \   / __/ _` | '_ \
    | (_| (_| | | | | | (_| (_| | | | |
    \___\__,_|_| |_|  \___\__,_|_| |_|
";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CommandLine::parse_args();

    let config_path = config::config_path();
    let config = match Config::load_or_create(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("加载配置失败: {e}");
            return ExitCode::FAILURE;
        }
    };

    if config.show_logo {
        println!("{LOGO}");
    }

    let Some(command) = cli.command else {
        if let Err(e) = CommandLine::command().print_help() {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    };

    let _guards = match logging::init(&config, command.query_log()) {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("日志初始化失败: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if logging::parse_level(&config.level).is_none() {
        tracing::warn!("未知日志等级 {}, 使用 DEBUG", config.level);
    }

    let options = config.query_options(cli.proxy.as_deref(), cli.timeout);
    tracing::debug!(
        "配置文件: {}, 代理: {:?}, 超时: {:?}, 并发: {}",
        config_path.display(),
        options.proxy,
        options.timeout,
        options.max_workers
    );

    let span = config
        .name
        .as_deref()
        .map_or_else(tracing::Span::none, |name| tracing::info_span!("runwar", name));

    match commands::run(command, &config_path, config, &options)
        .instrument(span)
        .await
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
