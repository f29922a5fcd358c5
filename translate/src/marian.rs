use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result, anyhow, bail};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::Tensor,
};
use tracing::debug;

use crate::backend::{TranslationBackend, TranslationModel};

const ENCODER_FILE: &str = "encoder_model.onnx";
const DECODER_FILE: &str = "decoder_model.onnx";
const VOCAB_FILE: &str = "vocab.json";

/// SentencePiece 词首标记
const WORD_BOUNDARY: char = '▁';

/// MarianMT (ONNX 导出) 翻译能力
///
/// 模型目录需包含 `encoder_model.onnx`, `decoder_model.onnx` 和 `vocab.json`
#[derive(Debug, Clone)]
pub struct MarianBackend {
    model_dir: PathBuf,
    max_new_tokens: usize,
    intra_threads: usize,
}

impl MarianBackend {
    /// 创建翻译能力, 不加载模型
    ///
    /// # 参数
    ///
    /// * `model_dir` - 模型目录
    /// * `max_new_tokens` - 单次翻译最多生成的词元数
    /// * `intra_threads` - 推理线程数
    pub fn new(model_dir: impl Into<PathBuf>, max_new_tokens: usize, intra_threads: usize) -> Self {
        Self {
            model_dir: model_dir.into(),
            max_new_tokens,
            intra_threads,
        }
    }

    fn session(&self, file: &str) -> Result<Session> {
        let path = self.model_dir.join(file);
        if !path.exists() {
            bail!("翻译模型文件 {} 不存在", path.display());
        }
        Ok(Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.intra_threads)?
            .commit_from_file(&path)
            .with_context(|| format!("加载翻译模型 {} 失败", path.display()))?)
    }
}

impl TranslationBackend for MarianBackend {
    fn load(&self) -> Result<Box<dyn TranslationModel>> {
        let vocab = Vocab::load(&self.model_dir.join(VOCAB_FILE))?;
        let encoder = self.session(ENCODER_FILE)?;
        let decoder = self.session(DECODER_FILE)?;
        debug!("MarianMT 模型加载成功: {}", self.model_dir.display());
        Ok(Box::new(MarianModel {
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
            vocab,
            max_new_tokens: self.max_new_tokens,
        }))
    }
}

/// 词表
#[derive(Debug)]
struct Vocab {
    token_to_id: HashMap<String, i64>,
    id_to_token: HashMap<i64, String>,
    max_piece_chars: usize,
    eos_id: i64,
    pad_id: i64,
    unk_id: i64,
}

impl Vocab {
    fn load(path: &Path) -> Result<Self> {
        let data =
            fs::read(path).with_context(|| format!("读取词表文件 {} 失败", path.display()))?;
        let token_to_id: HashMap<String, i64> =
            serde_json::from_slice(&data).context("解析词表文件失败")?;
        Self::new(token_to_id)
    }

    fn new(token_to_id: HashMap<String, i64>) -> Result<Self> {
        let special = |token: &str| {
            token_to_id
                .get(token)
                .copied()
                .ok_or_else(|| anyhow!("词表缺少特殊词元 {}", token))
        };
        let eos_id = special("</s>")?;
        let pad_id = special("<pad>")?;
        let unk_id = special("<unk>")?;
        let id_to_token = token_to_id.iter().map(|(t, id)| (*id, t.clone())).collect();
        let max_piece_chars = token_to_id
            .keys()
            .map(|t| t.chars().count())
            .max()
            .unwrap_or(1);
        Ok(Self {
            token_to_id,
            id_to_token,
            max_piece_chars,
            eos_id,
            pad_id,
            unk_id,
        })
    }

    fn is_special(&self, id: i64) -> bool {
        id == self.eos_id || id == self.pad_id || id == self.unk_id
    }

    /// 按词表贪心最长匹配切分, 每个空白分隔的词前加词首标记; 截断后追加 `</s>`
    fn encode(&self, text: &str, max_length: usize) -> Vec<i64> {
        let mut ids = Vec::new();
        for word in text.split_whitespace() {
            let chars: Vec<char> = std::iter::once(WORD_BOUNDARY).chain(word.chars()).collect();
            let mut i = 0;
            while i < chars.len() {
                let longest = (1..=self.max_piece_chars.min(chars.len() - i))
                    .rev()
                    .find_map(|n| {
                        let piece: String = chars[i..i + n].iter().collect();
                        self.token_to_id.get(&piece).map(|id| (*id, n))
                    });
                match longest {
                    Some((id, n)) => {
                        ids.push(id);
                        i += n;
                    }
                    // 单独的词首标记不在词表中时直接跳过
                    None if chars[i] == WORD_BOUNDARY => i += 1,
                    None => {
                        ids.push(self.unk_id);
                        i += 1;
                    }
                }
            }
        }
        ids.truncate(max_length.saturating_sub(1));
        ids.push(self.eos_id);
        ids
    }

    fn decode(&self, ids: &[i64]) -> String {
        ids.iter()
            .filter(|id| !self.is_special(**id))
            .filter_map(|id| self.id_to_token.get(id))
            .map(String::as_str)
            .collect::<String>()
            .replace(WORD_BOUNDARY, " ")
            .trim()
            .to_string()
    }
}

/// 已加载的 MarianMT 模型
pub struct MarianModel {
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    vocab: Vocab,
    max_new_tokens: usize,
}

impl MarianModel {
    /// 编码器前向, 返回 (形状, 隐状态)
    fn encode(&self, input_ids: &[i64]) -> Result<([usize; 3], Vec<f32>)> {
        let len = input_ids.len();
        let ids = Tensor::from_array(([1usize, len], input_ids.to_vec()))?;
        let mask = Tensor::from_array(([1usize, len], vec![1i64; len]))?;

        let mut encoder = self
            .encoder
            .lock()
            .map_err(|_| anyhow!("编码器会话锁已损坏"))?;
        let outputs = encoder.run(ort::inputs![
            "input_ids" => ids,
            "attention_mask" => mask
        ])?;
        let (shape, data) = outputs["last_hidden_state"].try_extract_tensor::<f32>()?;
        if shape.len() != 3 {
            bail!("意想不到的编码器输出形状: {:?}", shape);
        }
        let shape = [shape[0] as usize, shape[1] as usize, shape[2] as usize];
        Ok((shape, data.to_vec()))
    }

    /// 解码器前向, 返回最后一个位置概率最大的词元
    fn next_token(
        &self,
        decoder_ids: &[i64],
        hidden: &([usize; 3], Vec<f32>),
        source_len: usize,
    ) -> Result<i64> {
        let ids = Tensor::from_array(([1usize, decoder_ids.len()], decoder_ids.to_vec()))?;
        let states = Tensor::from_array((hidden.0, hidden.1.clone()))?;
        let mask = Tensor::from_array(([1usize, source_len], vec![1i64; source_len]))?;

        let mut decoder = self
            .decoder
            .lock()
            .map_err(|_| anyhow!("解码器会话锁已损坏"))?;
        let outputs = decoder.run(ort::inputs![
            "input_ids" => ids,
            "encoder_hidden_states" => states,
            "encoder_attention_mask" => mask
        ])?;
        let (shape, data) = outputs["logits"].try_extract_tensor::<f32>()?;
        pick_next_token(shape, data, self.vocab.pad_id)
    }
}

/// 从解码器输出 (batch, seq, vocab) 中取最后一个位置概率最大的词元, 排除 `<pad>`
fn pick_next_token(shape: &[i64], data: &[f32], pad_id: i64) -> Result<i64> {
    if shape.len() != 3 {
        bail!("意想不到的解码器输出形状: {:?}", shape);
    }
    let logits = ndarray::ArrayView3::from_shape(
        (shape[0] as usize, shape[1] as usize, shape[2] as usize),
        data,
    )
    .map_err(|e| anyhow!("转换输出到数组视图失败: {}", e))?;
    let Some(last_position) = (shape[1] as usize).checked_sub(1) else {
        bail!("解码器输出序列为空");
    };
    if shape[0] == 0 {
        bail!("解码器输出批次为空");
    }
    let last = logits.index_axis(ndarray::Axis(1), last_position);

    last.index_axis(ndarray::Axis(0), 0)
        .iter()
        .enumerate()
        .filter(|(id, _)| *id as i64 != pad_id)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(id, _)| id as i64)
        .ok_or_else(|| anyhow!("解码器输出为空"))
}

impl TranslationModel for MarianModel {
    fn translate(&self, text: &str, max_length: usize) -> Result<String> {
        let input_ids = self.vocab.encode(text, max_length);
        let hidden = self.encode(&input_ids)?;

        // Marian 以 <pad> 作为解码起始词元
        let mut decoder_ids = vec![self.vocab.pad_id];
        for _ in 0..self.max_new_tokens {
            let token = self.next_token(&decoder_ids, &hidden, input_ids.len())?;
            if token == self.vocab.eos_id {
                break;
            }
            decoder_ids.push(token);
        }
        Ok(self.vocab.decode(&decoder_ids))
    }
}
