use anyhow::Result;

/// 翻译能力: 负责加载模型
pub trait TranslationBackend: Send + Sync {
    /// 加载模型, 可能耗时较长
    fn load(&self) -> Result<Box<dyn TranslationModel>>;
}

/// 已加载的翻译模型
pub trait TranslationModel: Send + Sync {
    /// 翻译文本
    ///
    /// # 参数
    ///
    /// * `text` - 待翻译文本
    /// * `max_length` - 输入截断长度 (词元数)
    fn translate(&self, text: &str, max_length: usize) -> Result<String>;
}
