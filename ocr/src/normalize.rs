use image::RgbImage;
use ndarray::{Array3, ArrayView3};
use tracing::debug;

use crate::error::OcrError;

/// 规范化后的像素数组
///
/// 固定为 RGB 三通道, 布局为 `(高, 宽, 通道)`
#[derive(Debug, Clone, PartialEq)]
pub struct PixelArray {
    data: Array3<u8>,
}

impl PixelArray {
    /// 从 RGB 图像构造像素数组
    ///
    /// # 参数
    ///
    /// * `image` - RGB 图像
    pub fn from_image(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let data = Array3::from_shape_vec(
            (height as usize, width as usize, 3),
            image.as_raw().clone(),
        )
        .unwrap_or_else(|_| Array3::zeros((0, 0, 3)));
        Self { data }
    }

    /// 转换回 RGB 图像
    pub fn to_image(&self) -> RgbImage {
        let (height, width, _) = self.data.dim();
        let raw = self.data.iter().copied().collect();
        RgbImage::from_raw(width as u32, height as u32, raw)
            .unwrap_or_else(|| RgbImage::new(0, 0))
    }

    /// 宽高
    pub fn dimensions(&self) -> (u32, u32) {
        let (height, width, _) = self.data.dim();
        (width as u32, height as u32)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }
}

/// 将上传的图片字节解码并统一转换为 RGB 像素数组
///
/// # 参数
///
/// * `bytes` - 图片原始字节
pub fn normalize_image(bytes: &[u8]) -> Result<PixelArray, OcrError> {
    let image = image::load_from_memory(bytes)?;
    debug!(
        "图片解码成功: {}x{}, 颜色模式: {:?}",
        image.width(),
        image.height(),
        image.color()
    );
    Ok(PixelArray::from_image(&image.to_rgb8()))
}
