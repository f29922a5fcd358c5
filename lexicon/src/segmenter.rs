//! 基于词表的正向最大匹配分词.
//!
//! 切分结果自左向右覆盖整段文本, 不重叠也不遗漏; 词表中找不到的字单独成段.

use crate::dictionary::WordList;

/// 分词得到的片段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// 片段首字在全文中的字符下标
    pub start: usize,
    pub text: &'a str,
}

impl Segment<'_> {
    /// 片段字数
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// 是否包含全文中第 `index` 个字
    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.start + self.len()).contains(&index)
    }
}

/// 分词器
#[derive(Clone, Copy)]
pub struct Segmenter<'a> {
    words: &'a dyn WordList,
}

impl<'a> Segmenter<'a> {
    pub fn new(words: &'a dyn WordList) -> Self {
        Self { words }
    }

    /// 切分文本, 惰性产生片段; 重新调用 (或克隆迭代器) 即可从头开始
    ///
    /// # 参数
    ///
    /// * `text` - 待切分文本
    pub fn segment<'t>(&self, text: &'t str) -> Segments<'a, 't> {
        Segments {
            words: self.words,
            text,
            byte_pos: 0,
            char_pos: 0,
        }
    }
}

/// 分词结果迭代器
#[derive(Clone)]
pub struct Segments<'a, 't> {
    words: &'a dyn WordList,
    text: &'t str,
    byte_pos: usize,
    char_pos: usize,
}

impl<'t> Iterator for Segments<'_, 't> {
    type Item = Segment<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.byte_pos..];
        let max_len = self.words.max_word_len().max(1);

        // 候选词的结束位置 (字节), 依次为 1..=max_len 个字
        let ends: Vec<usize> = rest
            .char_indices()
            .skip(1)
            .map(|(i, _)| i)
            .chain(std::iter::once(rest.len()))
            .take(max_len)
            .collect();
        let first_end = *ends.first().filter(|_| !rest.is_empty())?;

        let (end, chars) = ends
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .find(|(_, end)| self.words.contains_word(&rest[..**end]))
            .map(|(i, end)| (*end, i + 1))
            .unwrap_or((first_end, 1));

        let segment = Segment {
            start: self.char_pos,
            text: &rest[..end],
        };
        self.byte_pos += end;
        self.char_pos += chars;
        Some(segment)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct Words(HashSet<&'static str>);

    impl WordList for Words {
        fn contains_word(&self, word: &str) -> bool {
            self.0.contains(word)
        }

        fn max_word_len(&self) -> usize {
            self.0.iter().map(|w| w.chars().count()).max().unwrap_or(1)
        }
    }

    fn words(list: &[&'static str]) -> Words {
        Words(list.iter().copied().collect())
    }

    fn texts<'t>(segments: impl Iterator<Item = Segment<'t>>) -> Vec<&'t str> {
        segments.map(|s| s.text).collect()
    }

    #[test]
    fn test_longest_match() {
        let words = words(&["中文", "学习", "学习中文", "中"]);
        let segmenter = Segmenter::new(&words);
        assert_eq!(texts(segmenter.segment("学习中文很好")), vec!["学习中文", "很", "好"]);
        assert_eq!(texts(segmenter.segment("学中文")), vec!["学", "中文"]);
    }

    #[test]
    fn test_segments_cover_text() {
        let words = words(&["银行", "行长"]);
        let segmenter = Segmenter::new(&words);
        let text = "去 银行A行长！";
        let segments: Vec<_> = segmenter.segment(text).collect();
        assert_eq!(texts(segments.iter().copied()), vec!["去", " ", "银行", "A", "行长", "！"]);
        assert_eq!(segments.iter().map(|s| s.text).collect::<String>(), text);
        let starts: Vec<usize> = segments.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 1, 2, 4, 5, 7]);
        assert!(segments[2].contains(3));
        assert!(!segments[2].contains(4));
    }

    #[test]
    fn test_restartable() {
        let words = words(&["中文"]);
        let segmenter = Segmenter::new(&words);
        let segments = segmenter.segment("学中文");
        let first: Vec<_> = segments.clone().collect();
        let second: Vec<_> = segments.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_empty_text_and_empty_words() {
        let words = words(&[]);
        let segmenter = Segmenter::new(&words);
        assert_eq!(segmenter.segment("").count(), 0);
        assert_eq!(texts(segmenter.segment("学中文")), vec!["学", "中", "文"]);
    }
}
