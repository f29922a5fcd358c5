use std::{fs, path::Path, sync::Mutex};

use anyhow::{Context, Result, anyhow};
use image::{
    RgbImage,
    imageops::{self, FilterType},
};

use ndarray::{Array, ArrayBase, Dim, OwnedRepr};
use ort::{
    session::{Session, SessionOutputs, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use tracing::debug;

use crate::{
    lines::split_lines,
    normalize::PixelArray,
    ocr::Recognizer,
    raw::{RawConfidence, RawDetection, RawOutput},
};

/// 模型输入高度
const TARGET_HEIGHT: u32 = 48;

/// 基于 PaddleOCR 识别模型的文字识别实现
pub struct PPOcr {
    session: Mutex<Session>,
    character_dict: Vec<String>,
}

impl PPOcr {
    /// 创建 PPOcr 实例
    ///
    /// # 参数
    ///
    /// * `model_path` - 识别模型 (onnx) 路径
    /// * `character_dict_path` - 字典文件路径, 每行一个字符
    /// * `intra_threads` - 推理线程数
    pub fn new(
        model_path: impl AsRef<Path>,
        character_dict_path: impl AsRef<Path>,
        intra_threads: usize,
    ) -> Result<PPOcr> {
        let model_path = model_path.as_ref();
        let character_dict = fs::read_to_string(character_dict_path.as_ref())
            .with_context(|| {
                format!(
                    "读取识别字典 {} 失败",
                    character_dict_path.as_ref().display()
                )
            })?
            .lines()
            .map(String::from)
            .collect();
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)
            .with_context(|| format!("加载识别模型 {} 失败", model_path.display()))?;

        debug!("PP-OCR 识别模型加载成功: {}", model_path.display());

        Ok(PPOcr {
            session: Mutex::new(session),
            character_dict,
        })
    }

    /// 将图像转换为张量数组数据
    ///
    /// # 参数
    ///
    /// * `image` - 输入图像
    fn image_to_tensor_array_data(image: &RgbImage) -> ArrayBase<OwnedRepr<f32>, Dim<[usize; 4]>> {
        let (width, height) = image.dimensions();

        let target_width =
            (((width as f32 / height as f32) * TARGET_HEIGHT as f32) as u32).max(1);

        let resized_image =
            imageops::resize(image, target_width, TARGET_HEIGHT, FilterType::Triangle);
        let mut input = Array::zeros((1, 3, TARGET_HEIGHT as usize, target_width as usize));

        for (x, y, pixel) in resized_image.enumerate_pixels() {
            let [r, g, b] = pixel.0;

            input[[0, 0, y as usize, x as usize]] = r as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = g as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = b as f32 / 255.0;
        }
        input
    }

    /// 处理模型输出
    ///
    /// # 参数
    ///
    /// * `outputs` - 模型输出
    fn handle_session_outputs(&self, outputs: &SessionOutputs) -> Result<(String, f32)> {
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;

        if output_shape.len() != 3 {
            return Err(anyhow!("意想不到的输出形状: {:?}", output_shape));
        }

        let batch_size_out = output_shape[0] as usize;
        let seq_len = output_shape[1] as usize;
        let num_classes = output_shape[2] as usize;
        let expected_len = batch_size_out * seq_len * num_classes;

        if output_data.len() != expected_len {
            return Err(anyhow!("意想不到的输出长度: {}", output_data.len()));
        }

        let array_view =
            ndarray::ArrayView3::from_shape((batch_size_out, seq_len, num_classes), output_data)
                .map_err(|e| anyhow!("转换输出到数组视图失败: {}", e))?;

        let preds = array_view.index_axis(ndarray::Axis(0), 0);
        let best_path: Vec<(usize, f32)> = preds
            .outer_iter()
            .filter_map(|row| {
                row.iter()
                    .copied()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.total_cmp(b))
            })
            .collect();
        let (text, confidence) = ctc_decode(&self.character_dict, &best_path);

        debug!("识别结果: {}, 置信度: {}", text, confidence);
        Ok((text, confidence))
    }

    /// 识别单行图像
    ///
    /// # 参数
    ///
    /// * `line` - 文本行图像
    fn recognize_line(&self, line: &RgbImage) -> Result<(String, f32)> {
        let tensor = PPOcr::image_to_tensor_array_data(line);
        let tensor = TensorRef::from_array_view(tensor.view())?;
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("识别模型会话锁已损坏"))?;
        let outputs = session.run(ort::inputs![tensor])?;
        self.handle_session_outputs(&outputs)
    }
}

/// CTC 解码: 去掉空白符和连续重复的类别
///
/// # 参数
///
/// * `character_dict` - 字典, 类别 `i` 对应 `character_dict[i - 1]`
/// * `best_path` - 每个时间步概率最大的 (类别, 概率)
fn ctc_decode(character_dict: &[String], best_path: &[(usize, f32)]) -> (String, f32) {
    let blank_index = 0;

    let mut text = String::new();
    let mut filtered_prob = Vec::new();

    for (i, &(idx, prob)) in best_path.iter().enumerate() {
        if (i > 0 && idx == best_path[i - 1].0) || idx == blank_index {
            continue;
        }
        // 字典之外的最后一个类别为空格
        text.push_str(character_dict.get(idx - 1).map(String::as_str).unwrap_or(" "));
        filtered_prob.push(prob);
    }

    if filtered_prob.is_empty() {
        return (String::new(), 0.0);
    }

    let confidence = filtered_prob.iter().sum::<f32>() / filtered_prob.len() as f32;
    (text.trim().to_string(), confidence)
}

impl Recognizer for PPOcr {
    /// 按行切分后逐行识别, 结果自上而下排列
    ///
    /// # 参数
    ///
    /// * `pixels` - 规范化后的像素数组
    fn recognize(&self, pixels: &PixelArray) -> Result<RawOutput> {
        let image = pixels.to_image();
        let mut detections = Vec::new();

        for region in split_lines(&image) {
            let line = imageops::crop_imm(
                &image,
                region.start.x as u32,
                region.start.y as u32,
                region.width() as u32,
                region.height() as u32,
            )
            .to_image();
            let (text, confidence) = self.recognize_line(&line)?;
            detections.push(RawDetection::Flat {
                region: Some(region),
                text,
                confidence: RawConfidence::Number(confidence as f64),
            });
        }
        Ok(RawOutput::Detections(detections))
    }
}
