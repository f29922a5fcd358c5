use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("图片解码失败: {0}")]
    Decode(#[from] image::ImageError),
    #[error("无法识别的识别结果格式: {0}")]
    RecognitionFormat(String),
    #[error(transparent)]
    Engine(#[from] anyhow::Error),
}
