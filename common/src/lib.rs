use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

//常用结构体

/// 点坐标
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    #[schemars(title = "X 坐标")]
    pub x: i32,
    #[schemars(title = "Y 坐标")]
    pub y: i32,
}

/// 区域
///
/// 左上角坐标为 `start`，右下角坐标为 `end`
#[derive(JsonSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    #[schemars(title = "区域左上角坐标")]
    pub start: Point,
    #[schemars(title = "区域右下角坐标")]
    pub end: Point,
}

impl Region {
    /// 创建区域
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            start: Point { x: x1, y: y1 },
            end: Point { x: x2, y: y2 },
        }
    }

    /// 多边形顶点的外接矩形, 无顶点时返回 `None`
    ///
    /// # 参数
    ///
    /// * `points` - 多边形顶点 (识别引擎通常给出四个角点)
    pub fn bounding(points: &[(f64, f64)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut x1, mut y1, mut x2, mut y2) = (first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            x1 = x1.min(x);
            y1 = y1.min(y);
            x2 = x2.max(x);
            y2 = y2.max(y);
        }
        Some(Self::new(
            x1.floor() as i32,
            y1.floor() as i32,
            x2.ceil() as i32,
            y2.ceil() as i32,
        ))
    }

    pub fn width(&self) -> i32 {
        self.end.x - self.start.x
    }

    pub fn height(&self) -> i32 {
        self.end.y - self.start.y
    }
}

/// 字符是否属于目标文字 (CJK 统一表意文字基本区)
pub fn is_target_script(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// 文本是否包含目标文字
pub fn has_target_script(s: &str) -> bool {
    s.chars().any(is_target_script)
}

/// 将置信度限制在 `[0.0, 1.0]`
///
/// 非数值 (NaN) 视为 0.0
pub fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        return 0.0;
    }
    confidence.clamp(0.0, 1.0)
}

/// 截取文本前 `max_chars` 个字符用于日志输出, 超出部分以 `...` 表示
///
/// # 参数
///
/// - `s` - 字符串
/// - `max_chars` - 最大字符数
pub fn preview(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
