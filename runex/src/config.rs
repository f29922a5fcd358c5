use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use lexicon::Lexicon;
use ocr::{ExternalRecognizer, PPOcr, Recognizer};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use translate::{DEFAULT_MAX_LENGTH, MarianBackend, Translator};

/// 文字识别引擎
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecognizerConfig {
    #[schemars(title = "PP-OCR 识别模型 (ONNX)")]
    PpOcr {
        #[schemars(title = "识别模型路径")]
        model_path: PathBuf,
        #[schemars(title = "识别字典路径")]
        character_dict_path: PathBuf,
        #[schemars(title = "推理线程数")]
        #[serde(default = "default_intra_threads")]
        intra_threads: usize,
    },
    #[schemars(title = "外部识别程序 (标准输入 PNG, 标准输出 JSON)")]
    External {
        #[schemars(title = "程序路径")]
        program: String,
        #[schemars(title = "程序参数")]
        #[serde(default)]
        args: Vec<String>,
    },
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self::PpOcr {
            model_path: PathBuf::from("models/PP-OCRv4_mobile_rec_infer.onnx"),
            character_dict_path: PathBuf::from("models/character_dict.txt"),
            intra_threads: default_intra_threads(),
        }
    }
}

impl RecognizerConfig {
    /// 创建识别引擎
    pub fn build(&self) -> Result<Box<dyn Recognizer>> {
        match self {
            Self::PpOcr {
                model_path,
                character_dict_path,
                intra_threads,
            } => Ok(Box::new(PPOcr::new(
                model_path,
                character_dict_path,
                *intra_threads,
            )?)),
            Self::External { program, args } => {
                Ok(Box::new(ExternalRecognizer::new(program, args.clone())))
            }
        }
    }
}

/// 翻译模型
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TranslationConfig {
    #[schemars(title = "MarianMT 模型目录 (encoder_model.onnx, decoder_model.onnx, vocab.json)")]
    pub model_dir: PathBuf,
    #[schemars(title = "输入截断长度 (词元数)")]
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[schemars(title = "最多生成词元数")]
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: usize,
    #[schemars(title = "推理线程数")]
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
}

/// 图片输入限制
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    #[schemars(title = "图片大小上限 (字节)")]
    pub max_file_size: u64,
    #[schemars(title = "允许的扩展名")]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            allowed_extensions: ["png", "jpg", "jpeg", "bmp", "tiff", "webp"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

/// 配置文件
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    #[schemars(title = "CC-CEDICT 词典文件路径")]
    pub dictionary_path: PathBuf,
    #[schemars(title = "文字识别引擎")]
    pub recognizer: RecognizerConfig,
    #[schemars(title = "翻译模型, 不配置则不提供翻译")]
    pub translation: Option<TranslationConfig>,
    #[schemars(title = "图片输入限制")]
    pub upload: UploadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dictionary_path: PathBuf::from("data/cedict_ts.u8"),
            recognizer: RecognizerConfig::default(),
            translation: None,
            upload: UploadConfig::default(),
        }
    }
}

impl Config {
    /// 加载配置文件, 文件不存在时使用默认配置
    ///
    /// # 参数
    ///
    /// * `config_file` - 配置文件路径
    pub fn load(config_file: impl AsRef<Path>) -> Result<Config> {
        let config_file = config_file.as_ref();
        if !config_file.exists() {
            warn!("配置文件 {} 不存在, 使用默认配置", config_file.display());
            return Ok(Config::default());
        }
        let config_data = fs::read(config_file).context("读取配置文件失败")?;
        Self::from_yaml(&config_data)
    }

    /// 解析 YAML 配置
    ///
    /// # 参数
    ///
    /// * `data` - YAML 内容
    pub fn from_yaml(data: &[u8]) -> Result<Config> {
        serde_yaml::from_slice::<Config>(data).context("解析配置文件失败, 请检查格式是否正确")
    }

    /// 加载词典
    pub fn lexicon(&self) -> Result<Lexicon> {
        Lexicon::load(&self.dictionary_path)
    }

    /// 创建翻译器, 模型在首次翻译时才加载
    pub fn translator(&self) -> Translator {
        match &self.translation {
            Some(t) => {
                info!("翻译模型目录: {}", t.model_dir.display());
                let backend = MarianBackend::new(&t.model_dir, t.max_new_tokens, t.intra_threads);
                Translator::new(Some(Box::new(backend)), t.max_length)
            }
            None => Translator::unavailable(),
        }
    }
}

fn default_intra_threads() -> usize {
    4
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_max_new_tokens() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use translate::{TranslatorState, UNAVAILABLE_MARKER};

    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let config = Config::load("/nonexistent/runex.yaml")?;
        assert_eq!(config, Config::default());
        assert_eq!(config.upload.max_file_size, 10 * 1024 * 1024);
        assert!(config.translation.is_none());
        Ok(())
    }

    #[test]
    fn test_parse_external_recognizer() -> Result<()> {
        let config = Config::from_yaml(
            b"dictionary_path: dict/cedict.txt
recognizer:
  kind: external
  program: ocr-cli
  args: [--json]
translation:
  model_dir: models/opus-mt-zh-en
upload:
  max_file_size: 1024
",
        )?;
        assert_eq!(config.dictionary_path, PathBuf::from("dict/cedict.txt"));
        assert_eq!(
            config.recognizer,
            RecognizerConfig::External {
                program: "ocr-cli".to_string(),
                args: vec!["--json".to_string()],
            }
        );
        let translation = config.translation.as_ref().unwrap();
        assert_eq!(translation.max_length, 512);
        assert_eq!(translation.max_new_tokens, 256);
        assert_eq!(config.upload.max_file_size, 1024);
        assert_eq!(config.upload.allowed_extensions.len(), 6);
        assert!(config.recognizer.build().is_ok());
        Ok(())
    }

    #[test]
    fn test_parse_pp_ocr_defaults() -> Result<()> {
        let config = Config::from_yaml(
            b"recognizer:
  kind: pp_ocr
  model_path: rec.onnx
  character_dict_path: keys.txt
",
        )?;
        assert!(matches!(
            config.recognizer,
            RecognizerConfig::PpOcr { intra_threads: 4, .. }
        ));
        assert_eq!(config.dictionary_path, PathBuf::from("data/cedict_ts.u8"));
        Ok(())
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(Config::from_yaml(b"recognizer:\n  kind: tesseract\n").is_err());
        assert!(Config::from_yaml(b"upload: 5").is_err());
    }

    #[test]
    fn test_pp_ocr_missing_model_fails() {
        let recognizer = RecognizerConfig::PpOcr {
            model_path: PathBuf::from("/nonexistent/rec.onnx"),
            character_dict_path: PathBuf::from("/nonexistent/keys.txt"),
            intra_threads: 1,
        };
        assert!(recognizer.build().is_err());
    }

    #[test]
    fn test_translator_without_model() {
        let translator = Config::default().translator();
        assert_eq!(translator.state(), TranslatorState::Unavailable);
        assert_eq!(translator.translate("学中文"), UNAVAILABLE_MARKER);
    }

    #[test]
    fn test_translator_is_lazy() {
        let config = Config {
            translation: Some(TranslationConfig {
                model_dir: PathBuf::from("/nonexistent/opus-mt-zh-en"),
                max_length: 512,
                max_new_tokens: 256,
                intra_threads: 1,
            }),
            ..Config::default()
        };
        let translator = config.translator();
        assert_eq!(translator.state(), TranslatorState::Uninitialized);
        assert_eq!(translator.translate("学中文"), UNAVAILABLE_MARKER);
        assert_eq!(translator.state(), TranslatorState::Unavailable);
    }
}
