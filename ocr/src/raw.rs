use common::Region;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{error::OcrError, ocr::Detection};

/// 置信度缺失或无法解析时使用的默认值
pub const DEFAULT_CONFIDENCE: f32 = 0.9;

/// 识别引擎给出的原始置信度
#[derive(Debug, Clone, PartialEq)]
pub enum RawConfidence {
    Number(f64),
    Text(String),
    Missing,
}

impl RawConfidence {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => n.as_f64().map_or(Self::Missing, Self::Number),
            Some(Value::String(s)) => Self::Text(s.clone()),
            _ => Self::Missing,
        }
    }

    /// 解析为数值, 不做范围限制
    pub fn resolve(&self) -> f32 {
        match self {
            Self::Number(n) => *n as f32,
            Self::Text(s) => s.trim().parse::<f32>().unwrap_or_else(|_| {
                warn!("无法解析置信度 '{}', 使用默认值 {}", s, DEFAULT_CONFIDENCE);
                DEFAULT_CONFIDENCE
            }),
            Self::Missing => DEFAULT_CONFIDENCE,
        }
    }
}

/// 嵌套格式中包裹的 (文本, 置信度) 对
#[derive(Debug, Clone, PartialEq)]
pub enum RawPair {
    /// 强类型元组
    Tuple(String, RawConfidence),
    /// 列表: `[text, confidence]`
    List(Vec<Value>),
    /// 映射: `{"text": .., "confidence": ..}`
    Map(Map<String, Value>),
}

impl RawPair {
    fn from_value(value: &Value) -> Result<Self, OcrError> {
        match value {
            Value::Array(items) => Ok(Self::List(items.clone())),
            Value::Object(map) => Ok(Self::Map(map.clone())),
            other => Err(OcrError::RecognitionFormat(format!(
                "文本对既不是列表也不是映射: {}",
                other
            ))),
        }
    }

    fn into_parts(self) -> Result<(String, RawConfidence), OcrError> {
        match self {
            Self::Tuple(text, confidence) => Ok((text, confidence)),
            Self::List(items) => match items.as_slice() {
                [Value::String(text), rest @ ..] => {
                    Ok((text.clone(), RawConfidence::from_value(rest.first())))
                }
                _ => Err(OcrError::RecognitionFormat(format!(
                    "列表形式的文本对缺少文本: {:?}",
                    items
                ))),
            },
            Self::Map(map) => {
                let text = match map.get("text") {
                    Some(Value::String(text)) => text.clone(),
                    _ => {
                        return Err(OcrError::RecognitionFormat(format!(
                            "映射形式的文本对缺少 text 字段: {:?}",
                            map
                        )));
                    }
                };
                let confidence = ["confidence", "score", "conf"]
                    .iter()
                    .find_map(|key| map.get(*key));
                Ok((text, RawConfidence::from_value(confidence)))
            }
        }
    }
}

/// 单条原始识别结果
///
/// 不同的识别后端 (或版本) 会给出不同的嵌套结构:
///
/// * `Flat` - `(区域, 文本, 置信度)` 三元组
/// * `Nested` - 行元素包裹一个 (文本, 置信度) 对
#[derive(Debug, Clone, PartialEq)]
pub enum RawDetection {
    Flat {
        region: Option<Region>,
        text: String,
        confidence: RawConfidence,
    },
    Nested {
        region: Option<Region>,
        pair: RawPair,
    },
}

impl RawDetection {
    /// 按结构判断 JSON 行元素属于哪种格式
    ///
    /// # 参数
    ///
    /// * `value` - 行元素
    pub fn from_value(value: &Value) -> Result<Self, OcrError> {
        match value {
            Value::Array(items) => match items.as_slice() {
                [region, Value::String(text), confidence] => Ok(Self::Flat {
                    region: region_from_value(region),
                    text: text.clone(),
                    confidence: RawConfidence::from_value(Some(confidence)),
                }),
                [region, pair @ (Value::Array(_) | Value::Object(_))] => Ok(Self::Nested {
                    region: region_from_value(region),
                    pair: RawPair::from_value(pair)?,
                }),
                [pair @ (Value::Array(_) | Value::Object(_))] => Ok(Self::Nested {
                    region: None,
                    pair: RawPair::from_value(pair)?,
                }),
                _ => Err(OcrError::RecognitionFormat(format!(
                    "无法识别的行结构: {}",
                    value
                ))),
            },
            Value::Object(map) => {
                let region = ["bbox", "box", "region"]
                    .iter()
                    .find_map(|key| map.get(*key))
                    .and_then(region_from_value);
                Ok(Self::Nested {
                    region,
                    pair: RawPair::Map(map.clone()),
                })
            }
            other => Err(OcrError::RecognitionFormat(format!(
                "行元素既不是元组/列表也不是映射: {}",
                other
            ))),
        }
    }

    /// 统一转换为 `Detection`, 空文本返回 `None`
    pub fn normalize(self) -> Result<Option<Detection>, OcrError> {
        let (region, text, confidence) = match self {
            Self::Flat {
                region,
                text,
                confidence,
            } => (region, text, confidence),
            Self::Nested { region, pair } => {
                let (text, confidence) = pair.into_parts()?;
                (region, text, confidence)
            }
        };
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(Detection {
            text,
            confidence: confidence.resolve(),
            region,
        }))
    }
}

/// 识别引擎的原始输出
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// 已按行解析的结果
    Detections(Vec<RawDetection>),
    /// 引擎以 JSON 形式给出的结果, 结构未知
    Json(Value),
}

impl RawOutput {
    /// 解析为按识别顺序排列的 `Detection`
    pub fn into_detections(self) -> Result<Vec<Detection>, OcrError> {
        let raw = match self {
            Self::Detections(raw) => raw,
            Self::Json(value) => decode_json(&value)?,
        };
        debug!("原始识别结果共 {} 行", raw.len());

        let mut detections = Vec::with_capacity(raw.len());
        for item in raw {
            if let Some(detection) = item.normalize()? {
                detections.push(detection);
            }
        }
        Ok(detections)
    }
}

/// 解析 JSON 顶层结构
fn decode_json(value: &Value) -> Result<Vec<RawDetection>, OcrError> {
    match value {
        Value::Null => Ok(vec![]),
        Value::Object(map) => {
            let lines = ["results", "lines", "detections"]
                .iter()
                .find_map(|key| map.get(*key));
            match lines {
                Some(lines) => decode_json(lines),
                None => Ok(vec![RawDetection::from_value(value)?]),
            }
        }
        Value::Array(items) => {
            let mut result = Vec::new();
            for item in items {
                if is_empty_page(item) {
                    debug!("跳过空页");
                    continue;
                }
                if is_page(item) {
                    for line in item.as_array().into_iter().flatten() {
                        result.push(RawDetection::from_value(line)?);
                    }
                } else {
                    result.push(RawDetection::from_value(item)?);
                }
            }
            Ok(result)
        }
        other => Err(OcrError::RecognitionFormat(format!(
            "识别结果顶层既不是列表也不是映射: {}",
            other
        ))),
    }
}

/// 没有任何文本行的页: `[]` 或 `null`
fn is_empty_page(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(lines) => lines.is_empty(),
        _ => false,
    }
}

/// 部分引擎按页再包裹一层: `[[line, line, ..]]`, 其中每行都以区域开头
fn is_page(value: &Value) -> bool {
    match value {
        Value::Array(lines) if !lines.is_empty() => lines.iter().all(|line| {
            matches!(line, Value::Array(parts)
                if (2..=3).contains(&parts.len()) && parts[0].is_array())
        }),
        _ => false,
    }
}

/// 解析区域, 支持顶点列表 `[[x, y], ..]` 和 `[x1, y1, x2, y2]`
fn region_from_value(value: &Value) -> Option<Region> {
    let items = value.as_array()?;
    if items.len() == 4 && items.iter().all(Value::is_number) {
        let v: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
        return Region::bounding(&[(v[0], v[1]), (v[2], v[3])]);
    }
    let points: Option<Vec<(f64, f64)>> = items
        .iter()
        .map(|point| match point.as_array()?.as_slice() {
            [x, y] => Some((x.as_f64()?, y.as_f64()?)),
            _ => None,
        })
        .collect();
    Region::bounding(&points?)
}
