use anyhow::Result;
use common::{Region, has_target_script, preview};
use tracing::{debug, info, warn};

use crate::{error::OcrError, normalize::PixelArray, raw::RawOutput};

/// 单条识别结果
///
/// 按识别引擎给出的顺序排列, 不重新排序
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub text: String,
    /// 引擎给出的原始置信度, 可能超出 `[0.0, 1.0]`
    pub confidence: f32,
    pub region: Option<Region>,
}

/// 文字识别接口
pub trait Recognizer: Send + Sync {
    /// 识别图片中的文字, 返回引擎的原始输出
    ///
    /// # 参数
    ///
    /// * `pixels` - 规范化后的像素数组
    fn recognize(&self, pixels: &PixelArray) -> Result<RawOutput>;
}

/// 调用识别引擎并将输出统一为 `Detection` 序列
///
/// # 参数
///
/// * `recognizer` - 识别引擎
/// * `pixels` - 规范化后的像素数组
pub fn detect(recognizer: &dyn Recognizer, pixels: &PixelArray) -> Result<Vec<Detection>, OcrError> {
    let raw = recognizer.recognize(pixels)?;
    let detections = raw.into_detections()?;

    if detections.is_empty() {
        debug!("识别引擎未返回任何结果");
    }
    for detection in detections.iter() {
        let text_preview = preview(&detection.text, 100);
        info!(
            "识别文本行: '{}' (置信度: {:.3}, 长度: {})",
            text_preview,
            detection.confidence,
            detection.text.chars().count()
        );
        if !has_target_script(&detection.text) {
            warn!("识别文本 '{}' 不包含中文字符", text_preview);
        }
    }
    Ok(detections)
}
