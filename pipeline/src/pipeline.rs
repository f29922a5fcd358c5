use lexicon::{Dictionary, Pronunciation, Segmenter, WordList};
use ocr::{Detection, Recognizer, detect, normalize_image};
use tracing::{debug, info};
use translate::Translator;

use crate::{
    enrich::Enricher,
    error::PipelineError,
    result::RecognitionResult,
    stream::{build_char_stream, concat_text},
};

/// 图片识别流水线
///
/// 只持有各项能力的引用, 自身不可变, 可在多个线程间共享
pub struct Pipeline<'a> {
    recognizer: &'a dyn Recognizer,
    dictionary: &'a dyn Dictionary,
    pronunciation: &'a dyn Pronunciation,
    words: &'a dyn WordList,
    translator: &'a Translator,
}

impl<'a> Pipeline<'a> {
    /// 创建流水线
    ///
    /// # 参数
    ///
    /// * `recognizer` - 文字识别
    /// * `dictionary` - 释义查询
    /// * `pronunciation` - 读音查询
    /// * `words` - 分词词表
    /// * `translator` - 整句翻译
    pub fn new(
        recognizer: &'a dyn Recognizer,
        dictionary: &'a dyn Dictionary,
        pronunciation: &'a dyn Pronunciation,
        words: &'a dyn WordList,
        translator: &'a Translator,
    ) -> Self {
        Self {
            recognizer,
            dictionary,
            pronunciation,
            words,
            translator,
        }
    }

    /// 处理一张图片
    ///
    /// 图片无法解码或识别输出无法理解时返回错误; 查词和翻译的失败只体现在对应字段中
    ///
    /// # 参数
    ///
    /// * `bytes` - 已编码的图片数据
    pub fn process(&self, bytes: &[u8]) -> Result<RecognitionResult, PipelineError> {
        let pixels = normalize_image(bytes)?;
        let (width, height) = pixels.dimensions();
        debug!("图片解码成功: {}x{}", width, height);

        let detections = detect(self.recognizer, &pixels)?;
        Ok(self.process_detections(&detections))
    }

    /// 从识别结果开始处理, 不会失败
    ///
    /// # 参数
    ///
    /// * `detections` - 识别结果
    pub fn process_detections(&self, detections: &[Detection]) -> RecognitionResult {
        let full_text = concat_text(detections);
        let stream = build_char_stream(detections);
        info!(
            "共识别 {} 个字符, 其中汉字 {} 个",
            full_text.chars().filter(|c| !c.is_whitespace()).count(),
            stream.len()
        );

        let segments = Segmenter::new(self.words).segment(&full_text);
        let characters = Enricher::new(self.dictionary, self.pronunciation).enrich(&stream, segments);
        let translation = self.translator.translate(&full_text);

        RecognitionResult::assemble(full_text, characters, translation)
    }
}
