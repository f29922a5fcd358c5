use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::{
    dictionary::{Dictionary, Pronunciation, WordList},
    pinyin::numbered_to_marked,
};

lazy_static! {
    /// `繁体 简体 [pin1 yin1] /释义1/释义2/`
    static ref CEDICT_LINE: Regex =
        Regex::new(r"^(\S+)\s+(\S+)\s+\[(.+?)\]\s+/(.+?)/").expect("CEDICT 行格式正则无效");
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    gloss: String,
    pinyin: String,
}

/// CC-CEDICT 词典
///
/// 简体和繁体均作为键; 同一个键出现多次时以第一次为准 (CEDICT 将常用读音排在前面)
#[derive(Debug, Default)]
pub struct Lexicon {
    entries: HashMap<String, Entry>,
    max_word_len: usize,
}

impl Lexicon {
    /// 加载词典文件, 文件不存在时返回空词典
    ///
    /// # 参数
    ///
    /// * `path` - CEDICT 文件路径
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("词典文件 {} 不存在, 将不提供释义和读音", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取词典文件 {} 失败", path.display()))?;
        let lexicon = Self::from_cedict_str(&content);
        info!("词典加载成功, 共 {} 个词条", lexicon.len());
        Ok(lexicon)
    }

    /// 解析 CEDICT 文本
    ///
    /// # 参数
    ///
    /// * `s` - CEDICT 文本内容
    pub fn from_cedict_str(s: &str) -> Self {
        let mut lexicon = Self::default();
        let mut skipped = 0;

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(caps) = CEDICT_LINE.captures(line) else {
                skipped += 1;
                continue;
            };
            let gloss = caps[4].split('/').next().unwrap_or("").trim();
            if gloss.is_empty() {
                skipped += 1;
                continue;
            }
            let entry = Entry {
                gloss: gloss.to_string(),
                pinyin: numbered_to_marked(&caps[3]),
            };
            lexicon.insert(&caps[1], entry.clone());
            lexicon.insert(&caps[2], entry);
        }

        if skipped > 0 {
            debug!("词典中有 {} 行格式无法解析, 已跳过", skipped);
        }
        lexicon
    }

    fn insert(&mut self, key: &str, entry: Entry) {
        if self.entries.contains_key(key) {
            return;
        }
        self.max_word_len = self.max_word_len.max(key.chars().count());
        self.entries.insert(key.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Dictionary for Lexicon {
    fn lookup(&self, word: &str) -> Option<&str> {
        self.entries.get(word).map(|e| e.gloss.as_str())
    }
}

impl Pronunciation for Lexicon {
    fn pronounce(&self, character: char) -> Option<&str> {
        let mut buf = [0u8; 4];
        self.entries
            .get(&*character.encode_utf8(&mut buf))
            .map(|e| e.pinyin.as_str())
    }

    fn pronounce_word(&self, word: &str) -> Option<Vec<&str>> {
        self.entries
            .get(word)
            .map(|e| e.pinyin.split_whitespace().collect())
    }
}

impl WordList for Lexicon {
    fn contains_word(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    fn max_word_len(&self) -> usize {
        self.max_word_len
    }
}
