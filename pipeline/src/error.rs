use ocr::OcrError;
use thiserror::Error;

/// 导致整张图片无法给出结果的错误
///
/// 只影响单个字段的失败 (查词, 翻译) 不会出现在这里
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("图片无法解码: {0}")]
    Decode(image::ImageError),
    #[error("识别结果格式不兼容: {0}")]
    RecognitionFormat(String),
    #[error("文字识别失败: {0:#}")]
    Recognition(anyhow::Error),
}

impl From<OcrError> for PipelineError {
    fn from(e: OcrError) -> Self {
        match e {
            OcrError::Decode(e) => Self::Decode(e),
            OcrError::RecognitionFormat(message) => Self::RecognitionFormat(message),
            OcrError::Engine(e) => Self::Recognition(e),
        }
    }
}
