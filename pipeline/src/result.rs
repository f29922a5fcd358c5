use common::clamp_confidence;
use schemars::JsonSchema;
use serde::Serialize;

/// 单个汉字的识别与注释
#[derive(JsonSchema, Serialize, Debug, Clone, PartialEq)]
pub struct CharacterRecord {
    #[schemars(title = "汉字")]
    char: char,
    #[schemars(title = "拼音")]
    pinyin: String,
    #[schemars(title = "英文释义")]
    gloss: String,
    #[schemars(title = "识别置信度 (0.0 ~ 1.0)")]
    confidence: f32,
}

impl CharacterRecord {
    /// 创建记录, 置信度限制在 `[0.0, 1.0]`
    ///
    /// # 参数
    ///
    /// * `char` - 汉字
    /// * `pinyin` - 拼音, 无读音时为空
    /// * `gloss` - 释义, 无释义时为空
    /// * `confidence` - 上游给出的原始置信度
    pub fn new(char: char, pinyin: impl Into<String>, gloss: impl Into<String>, confidence: f32) -> Self {
        Self {
            char,
            pinyin: pinyin.into(),
            gloss: gloss.into(),
            confidence: clamp_confidence(confidence),
        }
    }

    pub fn char(&self) -> char {
        self.char
    }

    pub fn pinyin(&self) -> &str {
        &self.pinyin
    }

    pub fn gloss(&self) -> &str {
        &self.gloss
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// 一次流水线运行的最终结果, 构造后不可修改
#[derive(JsonSchema, Serialize, Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    #[schemars(title = "识别出的全部文本 (过滤前)")]
    full_text: String,
    #[schemars(title = "逐字注释")]
    characters: Vec<CharacterRecord>,
    #[schemars(title = "整句翻译")]
    translation: String,
}

impl RecognitionResult {
    /// 汇总各阶段结果
    ///
    /// # 参数
    ///
    /// * `full_text` - 全文
    /// * `characters` - 逐字注释
    /// * `translation` - 整句翻译或占位文本
    pub fn assemble(full_text: String, characters: Vec<CharacterRecord>, translation: String) -> Self {
        Self {
            full_text,
            characters,
            translation,
        }
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn characters(&self) -> &[CharacterRecord] {
        &self.characters
    }

    pub fn translation(&self) -> &str {
        &self.translation
    }
}
