//! 词典相关: CC-CEDICT 词典加载, 拼音读音, 基于词表的分词.
mod cedict;
mod dictionary;
mod pinyin;
mod segmenter;

pub use cedict::Lexicon;
pub use dictionary::{Dictionary, Pronunciation, WordList};
pub use pinyin::{numbered_to_marked, syllable_to_marked};
pub use segmenter::{Segment, Segmenter, Segments};
