use common::is_target_script;
use ocr::Detection;

/// 字符流中的单个汉字
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamChar {
    pub character: char,
    /// 所在识别文本行的原始置信度
    pub confidence: f32,
    /// 在全文中的字符下标
    pub offset: usize,
}

/// 按识别顺序拼接全部文本, 不插入分隔符
///
/// # 参数
///
/// * `detections` - 识别结果
pub fn concat_text(detections: &[Detection]) -> String {
    detections.iter().map(|d| d.text.as_str()).collect()
}

/// 将识别结果展开为汉字流
///
/// 保持阅读顺序, 丢弃空白和非汉字; 每个字继承所在行的置信度.
/// 下标与 `concat_text` 的结果逐字对应.
///
/// # 参数
///
/// * `detections` - 识别结果
pub fn build_char_stream(detections: &[Detection]) -> Vec<StreamChar> {
    detections
        .iter()
        .flat_map(|d| d.text.chars().map(move |c| (c, d.confidence)))
        .enumerate()
        .filter(|(_, (c, _))| !c.is_whitespace() && is_target_script(*c))
        .map(|(offset, (character, confidence))| StreamChar {
            character,
            confidence,
            offset,
        })
        .collect()
}
