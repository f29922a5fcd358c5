use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

/// RUNEX 图片汉字识别: 识别图片中的中文, 给出逐字拼音, 释义和整句翻译
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// 图片路径
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// 配置文件路径
    #[arg(short, long, default_value = "runex.yaml")]
    pub config: PathBuf,

    /// 日志等级 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: Level,

    /// 日志文件路径
    #[arg(long, default_value = "runex.log")]
    pub log_file: PathBuf,

    /// 追加日志到文件
    #[arg(long, default_value_t = false)]
    pub append_log: bool,

    /// 格式化输出 JSON
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

impl Args {
    /// 创建命令行参数解析器
    pub fn new() -> Self {
        Self::parse()
    }
}
