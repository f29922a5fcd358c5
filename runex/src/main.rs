use std::path::Path;

use anyhow::{Context, Result, bail};
use ocr::Recognizer;
use pipeline::Pipeline;
use runex::{Config, RunexError, UploadConfig, read_upload};
use tracing::{error, info};

use crate::{args::Args, log::init_log};

mod args;
mod log;

/// 处理单张图片, 返回结果 JSON
fn process_image(
    path: &Path,
    upload: &UploadConfig,
    pipeline: &Pipeline,
    pretty: bool,
) -> Result<String, RunexError> {
    let bytes = read_upload(path, upload)?;
    let result = pipeline.process(&bytes)?;
    info!(
        "图片 {} 识别完成, 共 {} 个汉字",
        path.display(),
        result.characters().len()
    );
    let json = if pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .context("序列化识别结果失败")?;
    Ok(json)
}

/// 程序入口
fn application() -> Result<()> {
    let args = Args::new();

    init_log(&args)?;

    info!("欢迎使用 RUNEX 图片汉字识别");

    let config = Config::load(&args.config)?;
    // 词典同时提供释义, 读音和分词词表
    let lexicon = config.lexicon()?;
    // 文字识别
    let recognizer: Box<dyn Recognizer> = config.recognizer.build()?;
    // 翻译, 首次使用时加载模型
    let translator = config.translator();

    let pipeline = Pipeline::new(
        recognizer.as_ref(),
        &lexicon,
        &lexicon,
        &lexicon,
        &translator,
    );

    let mut failed = 0;
    for path in args.images.iter() {
        match process_image(path, &config.upload, &pipeline, args.pretty) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("处理图片 {} 失败: {:#}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("共 {} 张图片处理失败", failed);
    }
    Ok(())
}

fn main() {
    match application() {
        Ok(_) => info!("程序已执行完毕"),
        Err(e) => {
            error!("程序存在异常: {:#}", e);
            std::process::exit(1);
        }
    }
}
