use std::fs::OpenOptions;

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::{Layer, fmt, registry};

use crate::args::Args;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 初始化日志记录器
///
/// 控制台输出到标准错误, 标准输出只用于识别结果
///
/// # 参数
///
/// * `args` - 命令行参数
pub fn init_log(args: &Args) -> Result<()> {
    let filter = Targets::new()
        .with_default(LevelFilter::from_level(args.log_level))
        .with_target("ort", LevelFilter::ERROR);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_timer(fmt::time::ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_filter(filter.clone());

    let file_writer = OpenOptions::new()
        .write(true)
        .append(args.append_log)
        .truncate(!args.append_log)
        .create(true)
        .open(&args.log_file)
        .with_context(|| format!("打开日志文件 {} 失败", args.log_file.display()))?;
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_timer(fmt::time::ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_filter(filter);

    let subscriber = registry().with(console_layer).with(file_layer);
    tracing::subscriber::set_global_default(subscriber).expect("设置全局日志记录器失败");

    Ok(())
}
