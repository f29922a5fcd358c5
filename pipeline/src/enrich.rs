use lexicon::{Dictionary, Pronunciation, Segment};
use tracing::debug;

use crate::{result::CharacterRecord, stream::StreamChar};

/// 为汉字流补充拼音和释义
///
/// 逐字查询; 若分词给出了包含该字的多字词, 则优先使用词的读音 (用于区分多音字),
/// 单字无释义时退而使用词的释义. 查不到的字段为空字符串.
pub struct Enricher<'a> {
    dictionary: &'a dyn Dictionary,
    pronunciation: &'a dyn Pronunciation,
}

impl<'a> Enricher<'a> {
    pub fn new(dictionary: &'a dyn Dictionary, pronunciation: &'a dyn Pronunciation) -> Self {
        Self {
            dictionary,
            pronunciation,
        }
    }

    /// 补充汉字流, 输出与输入一一对应
    ///
    /// # 参数
    ///
    /// * `stream` - 汉字流
    /// * `segments` - 全文的分词结果, 按位置升序
    pub fn enrich<'t>(
        &self,
        stream: &[StreamChar],
        segments: impl IntoIterator<Item = Segment<'t>>,
    ) -> Vec<CharacterRecord> {
        let words: Vec<Segment> = segments.into_iter().filter(|s| s.len() > 1).collect();
        let mut words = words.iter().peekable();

        stream
            .iter()
            .map(|c| {
                while words.next_if(|w| w.start + w.len() <= c.offset).is_some() {}
                let word = words.peek().filter(|w| w.contains(c.offset));
                self.record(c, word.copied())
            })
            .collect()
    }

    fn record(&self, c: &StreamChar, word: Option<&Segment>) -> CharacterRecord {
        let mut buf = [0u8; 4];
        let key = &*c.character.encode_utf8(&mut buf);

        let word_pinyin = word.and_then(|w| {
            let syllables = self.pronunciation.pronounce_word(w.text)?;
            if syllables.len() != w.len() {
                debug!("词 '{}' 的读音与字数不一致, 使用单字读音", w.text);
                return None;
            }
            syllables.get(c.offset - w.start).copied()
        });
        let pinyin = word_pinyin
            .or_else(|| self.pronunciation.pronounce(c.character))
            .unwrap_or_default();

        let gloss = self
            .dictionary
            .lookup(key)
            .or_else(|| word.and_then(|w| self.dictionary.lookup(w.text)))
            .unwrap_or_default();

        CharacterRecord::new(c.character, pinyin, gloss, c.confidence)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use lexicon::{Lexicon, Segmenter};

    use super::*;

    const SAMPLE: &str = "\
中 中 [zhong1] /middle/
文 文 [wen2] /language/
學 学 [xue2] /to study/
銀 银 [yin2] /silver/
行 行 [xing2] /to walk/
銀行 银行 [yin2 hang2] /bank/
";

    fn stream(text: &str, confidence: f32) -> Vec<StreamChar> {
        text.chars()
            .enumerate()
            .map(|(offset, character)| StreamChar {
                character,
                confidence,
                offset,
            })
            .collect()
    }

    fn no_segments() -> Vec<Segment<'static>> {
        Vec::new()
    }

    struct MapDictionary(HashMap<&'static str, &'static str>);

    impl Dictionary for MapDictionary {
        fn lookup(&self, word: &str) -> Option<&str> {
            self.0.get(word).copied()
        }
    }

    impl Pronunciation for MapDictionary {
        fn pronounce(&self, _character: char) -> Option<&str> {
            None
        }
    }

    #[test]
    fn test_single_characters() {
        let lexicon = Lexicon::from_cedict_str(SAMPLE);
        let enricher = Enricher::new(&lexicon, &lexicon);
        let records = enricher.enrich(&stream("学中文", 0.9), no_segments());
        let fields: Vec<(char, &str, &str)> = records
            .iter()
            .map(|r| (r.char(), r.pinyin(), r.gloss()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ('学', "xué", "to study"),
                ('中', "zhōng", "middle"),
                ('文', "wén", "language"),
            ]
        );
        assert!(records.iter().all(|r| r.confidence() == 0.9));
    }

    #[test]
    fn test_missing_entry_is_empty() {
        let lexicon = Lexicon::from_cedict_str(SAMPLE);
        let enricher = Enricher::new(&lexicon, &lexicon);
        let records = enricher.enrich(&stream("龘", 0.5), no_segments());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pinyin(), "");
        assert_eq!(records[0].gloss(), "");
    }

    #[test]
    fn test_word_reading_resolves_heteronym() {
        let lexicon = Lexicon::from_cedict_str(SAMPLE);
        let enricher = Enricher::new(&lexicon, &lexicon);
        let text = "银行";
        let records = enricher.enrich(&stream(text, 0.9), Segmenter::new(&lexicon).segment(text));
        assert_eq!(records[1].pinyin(), "háng");
        assert_eq!(records[1].gloss(), "to walk");
        assert_eq!(records[0].pinyin(), "yín");

        let alone = enricher.enrich(&stream("行", 0.9), Segmenter::new(&lexicon).segment("行"));
        assert_eq!(alone[0].pinyin(), "xíng");
    }

    #[test]
    fn test_word_gloss_fallback() {
        let dictionary = MapDictionary([("苹果", "apple")].into_iter().collect());
        let enricher = Enricher::new(&dictionary, &dictionary);
        let segments = [Segment {
            start: 0,
            text: "苹果",
        }];
        let records = enricher.enrich(&stream("苹果", 1.0), segments);
        assert!(records.iter().all(|r| r.gloss() == "apple"));
        assert!(records.iter().all(|r| r.pinyin().is_empty()));
    }

    #[test]
    fn test_offsets_skip_filtered_characters() {
        let lexicon = Lexicon::from_cedict_str(SAMPLE);
        let enricher = Enricher::new(&lexicon, &lexicon);
        let text = "A银行";
        let stream: Vec<StreamChar> = stream(text, 0.9).into_iter().skip(1).collect();
        let records = enricher.enrich(&stream, Segmenter::new(&lexicon).segment(text));
        let pinyin: Vec<&str> = records.iter().map(|r| r.pinyin()).collect();
        assert_eq!(pinyin, vec!["yín", "háng"]);
    }

    #[test]
    fn test_confidence_clamped() {
        let lexicon = Lexicon::default();
        let enricher = Enricher::new(&lexicon, &lexicon);
        let records = enricher.enrich(&stream("学学", 1.7), no_segments());
        assert!(records.iter().all(|r| r.confidence() == 1.0));
        let records = enricher.enrich(&stream("学", f32::NAN), no_segments());
        assert_eq!(records[0].confidence(), 0.0);
    }
}
