use std::{fs, path::Path};

use anyhow::Context;
use tracing::debug;

use crate::{config::UploadConfig, error::RunexError};

impl UploadConfig {
    /// 扩展名是否允许, 不区分大小写
    pub fn is_allowed(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| {
                self.allowed_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(e))
            })
    }
}

/// 校验并读取图片文件
///
/// # 参数
///
/// * `path` - 图片路径
/// * `limits` - 输入限制
pub fn read_upload(path: &Path, limits: &UploadConfig) -> Result<Vec<u8>, RunexError> {
    if !limits.is_allowed(path) {
        return Err(RunexError::UnsupportedExtension(path.to_path_buf()));
    }
    let size = fs::metadata(path)
        .with_context(|| format!("读取图片 {} 失败", path.display()))?
        .len();
    if size > limits.max_file_size {
        return Err(RunexError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            max: limits.max_file_size,
        });
    }
    let bytes = fs::read(path).with_context(|| format!("读取图片 {} 失败", path.display()))?;
    debug!("读取图片 {} ({} 字节)", path.display(), bytes.len());
    Ok(bytes)
}
