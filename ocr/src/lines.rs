use common::Region;
use image::RgbImage;
use tracing::debug;

/// 行高下限, 更矮的行视为噪点
const MIN_LINE_HEIGHT: u32 = 4;
/// 行上下留白
const LINE_PADDING: u32 = 2;

/// 灰度值
fn luminance(pixel: &image::Rgb<u8>) -> f32 {
    let [r, g, b] = pixel.0;
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// 按水平投影把图片切分为文本行
///
/// 以平均亮度判断背景深浅, 与背景差异明显的像素视为前景.
/// 返回的区域自上而下排列; 空白图片返回空列表.
///
/// # 参数
///
/// * `image` - RGB 图像
pub fn split_lines(image: &RgbImage) -> Vec<Region> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return vec![];
    }

    let mean = image.pixels().map(luminance).sum::<f32>() / (width * height) as f32;
    let dark_background = mean < 128.0;
    let threshold = 64.0;

    let h_proj: Vec<u32> = (0..height)
        .map(|y| {
            (0..width)
                .filter(|&x| {
                    let l = luminance(image.get_pixel(x, y));
                    if dark_background {
                        l - mean > threshold
                    } else {
                        mean - l > threshold
                    }
                })
                .count() as u32
        })
        .collect();

    let row_thresh = (width / 200).max(1);
    let mut lines = Vec::new();
    let mut line_start: Option<u32> = None;

    for y in 0..=height {
        let is_text = y < height && h_proj[y as usize] >= row_thresh;
        match (is_text, line_start) {
            (true, None) => line_start = Some(y),
            (false, Some(start)) => {
                if y - start >= MIN_LINE_HEIGHT {
                    let top = start.saturating_sub(LINE_PADDING);
                    let bottom = (y + LINE_PADDING).min(height);
                    lines.push(Region::new(0, top as i32, width as i32, bottom as i32));
                }
                line_start = None;
            }
            _ => {}
        }
    }

    debug!("图片切分出 {} 个文本行", lines.len());
    lines
}
