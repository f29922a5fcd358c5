use std::path::PathBuf;

use pipeline::PipelineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunexError {
    #[error("不支持的图片格式: {}", .0.display())]
    UnsupportedExtension(PathBuf),
    #[error("图片 {} 大小为 {} 字节, 超过上限 {} 字节", .path.display(), .size, .max)]
    FileTooLarge { path: PathBuf, size: u64, max: u64 },
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}
