use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use pipeline::RecognitionResult;
use runex::Config;
use schemars::schema_for;

/// 输出目录, 默认为当前目录
fn output_dir() -> Result<PathBuf> {
    let dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir).with_context(|| format!("创建目录 {} 失败", dir.display()))?;
    Ok(dir)
}

fn main() -> Result<()> {
    let dir = output_dir()?;

    let config_schema = serde_json::to_string_pretty(&schema_for!(Config))?;
    fs::write(dir.join("config.schema.json"), config_schema)?;

    let result_schema = serde_json::to_string_pretty(&schema_for!(RecognitionResult))?;
    fs::write(dir.join("result.schema.json"), result_schema)?;
    Ok(())
}
