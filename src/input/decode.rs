// 该文件是 Mingmu （明目） 项目的一部分。
// src/input/decode.rs - 图像解码与尺寸归一
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use image::{ImageFormat, imageops::FilterType};
use thiserror::Error;
use tracing::debug;

use crate::frame::{FrameError, RgbNhwcFrame};

/// 允许上传的编码格式
pub const SUPPORTED_FORMATS: [ImageFormat; 2] = [ImageFormat::Jpeg, ImageFormat::Png];

// 训练时使用的图像库默认以双三次插值缩放，这里保持一致
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("图像数据为空")]
  Empty,
  #[error("不支持的图像格式: {0}")]
  UnsupportedFormat(String),
  #[error("图像解码失败: {0}")]
  Image(#[from] image::ImageError),
  #[error("帧转换失败: {0}")]
  Frame(#[from] FrameError),
}

/// 根据文件头判断格式，只接受 JPEG 与 PNG
pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
  if bytes.is_empty() {
    return Err(DecodeError::Empty);
  }

  let format = image::guess_format(bytes)
    .map_err(|_| DecodeError::UnsupportedFormat("无法识别的文件头".to_string()))?;

  if !SUPPORTED_FORMATS.contains(&format) {
    return Err(DecodeError::UnsupportedFormat(format!("{:?}", format)));
  }

  Ok(format)
}

/// 解码任意色彩模式的图像，转换为 RGB 并拉伸到 W x H（不保持宽高比）
pub fn decode_rgb_frame<const W: u32, const H: u32>(
  bytes: &[u8],
) -> Result<RgbNhwcFrame<W, H>, DecodeError> {
  let format = sniff_format(bytes)?;
  let image = image::load_from_memory_with_format(bytes, format)?;
  debug!(
    "解码图像: {:?} {}x{} {:?}",
    format,
    image.width(),
    image.height(),
    image.color()
  );

  let rgb = image.to_rgb8();
  let resized = image::imageops::resize(&rgb, W, H, RESIZE_FILTER);

  Ok(RgbNhwcFrame::try_from(resized)?)
}

#[cfg(test)]
pub(crate) fn encode_test_image(image: image::DynamicImage, format: ImageFormat) -> Vec<u8> {
  let mut buf = std::io::Cursor::new(Vec::new());
  image.write_to(&mut buf, format).unwrap();
  buf.into_inner()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::AsNhwcFrame;
  use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

  #[test]
  fn decodes_png_and_stretches_to_square() {
    let bytes = encode_test_image(DynamicImage::new_rgb8(640, 200), ImageFormat::Png);
    let frame = decode_rgb_frame::<224, 224>(&bytes).unwrap();
    assert_eq!(frame.as_nhwc().len(), 224 * 224 * 3);
  }

  #[test]
  fn decodes_jpeg() {
    let image = RgbImage::from_pixel(32, 48, Rgb([200, 10, 10]));
    let bytes = encode_test_image(DynamicImage::ImageRgb8(image), ImageFormat::Jpeg);
    let frame = decode_rgb_frame::<16, 16>(&bytes).unwrap();
    assert_eq!(frame.as_nhwc().len(), 16 * 16 * 3);
  }

  #[test]
  fn grayscale_is_expanded_to_three_channels() {
    let image = GrayImage::from_pixel(10, 10, Luma([77]));
    let bytes = encode_test_image(DynamicImage::ImageLuma8(image), ImageFormat::Png);
    let frame = decode_rgb_frame::<4, 4>(&bytes).unwrap();
    assert!(frame.as_nhwc().iter().all(|&v| v == 77));
  }

  #[test]
  fn alpha_channel_is_dropped() {
    let image = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 0]));
    let bytes = encode_test_image(DynamicImage::ImageRgba8(image), ImageFormat::Png);
    let frame = decode_rgb_frame::<2, 2>(&bytes).unwrap();
    assert_eq!(&frame.as_nhwc()[..3], &[10, 20, 30]);
  }

  #[test]
  fn empty_buffer_is_rejected() {
    assert!(matches!(
      decode_rgb_frame::<4, 4>(&[]),
      Err(DecodeError::Empty)
    ));
  }

  #[test]
  fn non_image_is_rejected() {
    assert!(matches!(
      decode_rgb_frame::<4, 4>(b"definitely not a fundus photo"),
      Err(DecodeError::UnsupportedFormat(_))
    ));
  }

  #[test]
  fn truncated_jpeg_header_is_rejected() {
    assert!(matches!(
      decode_rgb_frame::<4, 4>(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
      Err(DecodeError::Image(_))
    ));
  }

  #[test]
  fn other_raster_formats_are_unsupported() {
    let mut bmp = b"BM".to_vec();
    bmp.extend_from_slice(&[0u8; 64]);
    match sniff_format(&bmp) {
      Err(DecodeError::UnsupportedFormat(name)) => assert_eq!(name, "Bmp"),
      other => panic!("unexpected result: {:?}", other),
    }
  }
}
