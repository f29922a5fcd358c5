/// 带声调的元音, 依次为一至四声
fn toned_vowel(vowel: char, tone: usize) -> Option<char> {
    let table = match vowel {
        'a' => ['ā', 'á', 'ǎ', 'à'],
        'e' => ['ē', 'é', 'ě', 'è'],
        'i' => ['ī', 'í', 'ǐ', 'ì'],
        'o' => ['ō', 'ó', 'ǒ', 'ò'],
        'u' => ['ū', 'ú', 'ǔ', 'ù'],
        'ü' => ['ǖ', 'ǘ', 'ǚ', 'ǜ'],
        _ => return None,
    };
    table.get(tone.checked_sub(1)?).copied()
}

/// 标调位置: 有 a/e 标在 a/e 上, `ou` 标在 o 上, 否则标在最后一个元音上
fn tone_position(chars: &[char]) -> Option<usize> {
    if let Some(i) = chars.iter().position(|&c| c == 'a' || c == 'e') {
        return Some(i);
    }
    if let Some(i) = chars.windows(2).position(|w| w == ['o', 'u']) {
        return Some(i);
    }
    chars
        .iter()
        .rposition(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'ü'))
}

/// 数字标调的单个音节转换为符号标调
///
/// `xue2` -> `xué`, `lu:4` -> `lǜ`, 轻声 (5) 去掉数字;
/// 无法识别的音节原样小写返回
///
/// # 参数
///
/// * `syllable` - 数字标调音节
pub fn syllable_to_marked(syllable: &str) -> String {
    let lower = syllable
        .to_lowercase()
        .replace("u:", "ü")
        .replace('v', "ü");
    let Some(last) = lower.chars().last() else {
        return lower;
    };
    let Some(tone) = last.to_digit(10) else {
        return lower;
    };

    let mut chars: Vec<char> = lower.chars().collect();
    chars.pop();
    if (1..=4).contains(&tone) {
        if let Some(i) = tone_position(&chars) {
            if let Some(marked) = toned_vowel(chars[i], tone as usize) {
                chars[i] = marked;
            }
        }
    }
    chars.into_iter().collect()
}

/// 转换以空格分隔的整段数字标调拼音
///
/// # 参数
///
/// * `reading` - 例如 `Zhong1 wen2`
pub fn numbered_to_marked(reading: &str) -> String {
    reading
        .split_whitespace()
        .map(syllable_to_marked)
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syllable_to_marked() {
        assert_eq!(syllable_to_marked("xue2"), "xué");
        assert_eq!(syllable_to_marked("Zhong1"), "zhōng");
        assert_eq!(syllable_to_marked("wen2"), "wén");
        assert_eq!(syllable_to_marked("hao3"), "hǎo");
        assert_eq!(syllable_to_marked("dou4"), "dòu");
        assert_eq!(syllable_to_marked("gui4"), "guì");
        assert_eq!(syllable_to_marked("liu2"), "liú");
        assert_eq!(syllable_to_marked("lu:4"), "lǜ");
        assert_eq!(syllable_to_marked("nv3"), "nǚ");
        assert_eq!(syllable_to_marked("er2"), "ér");
    }

    #[test]
    fn test_neutral_and_unknown_syllables() {
        assert_eq!(syllable_to_marked("le5"), "le");
        assert_eq!(syllable_to_marked("r5"), "r");
        assert_eq!(syllable_to_marked("xx5"), "xx");
        assert_eq!(syllable_to_marked("·"), "·");
        assert_eq!(syllable_to_marked("A"), "a");
        assert_eq!(syllable_to_marked(""), "");
    }

    #[test]
    fn test_numbered_to_marked() {
        assert_eq!(numbered_to_marked("Zhong1 wen2"), "zhōng wén");
        assert_eq!(numbered_to_marked("yin2  hang2"), "yín háng");
        assert_eq!(numbered_to_marked(""), "");
    }
}
