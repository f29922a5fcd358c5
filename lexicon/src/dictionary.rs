/// 释义查询: 以字或词为键, 返回英文释义
///
/// 查不到不是错误, 返回 `None` 即可
pub trait Dictionary: Send + Sync {
    fn lookup(&self, word: &str) -> Option<&str>;
}

/// 读音查询
pub trait Pronunciation: Send + Sync {
    /// 单字读音 (带声调符号的拼音)
    fn pronounce(&self, character: char) -> Option<&str>;

    /// 整词读音, 每个音节对应一个字
    ///
    /// 默认不提供, 实现方可用于多音字消歧
    fn pronounce_word(&self, _word: &str) -> Option<Vec<&str>> {
        None
    }
}

/// 分词所用的词表
pub trait WordList: Send + Sync {
    fn contains_word(&self, word: &str) -> bool;

    /// 词表中最长词的字数
    fn max_word_len(&self) -> usize;
}
