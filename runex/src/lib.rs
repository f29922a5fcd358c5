//! RUNEX 图片汉字识别: 配置与输入校验
pub mod config;
pub mod error;
pub mod upload;

pub use config::{Config, RecognizerConfig, TranslationConfig, UploadConfig};
pub use error::RunexError;
pub use upload::read_upload;
