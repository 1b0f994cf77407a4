// 该文件是 Mingmu （明目） 项目的一部分。
// src/frame.rs - NHWC 帧与张量定义
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

use image::RgbImage;
use thiserror::Error;

pub const RGB_CHANNELS: usize = 3;

/// 8 位通道的最大取值，归一化时作为除数
const CHANNEL_MAX: f32 = 255.0;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error("图像尺寸不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  DimensionMismatch {
    expected: (u32, u32),
    actual: (u32, u32),
  },
}

pub trait AsNhwcFrame {
  fn as_nhwc(&self) -> &[u8];
}

/// 固定尺寸的 RGB 帧，像素按 HWC 交错排列
#[derive(Debug, Clone)]
pub struct RgbNhwcFrame<const W: u32, const H: u32> {
  data: Box<[u8]>,
}

impl<const W: u32, const H: u32> RgbNhwcFrame<W, H> {
  const LEN: usize = RGB_CHANNELS * W as usize * H as usize;
}

impl<const W: u32, const H: u32> TryFrom<Vec<u8>> for RgbNhwcFrame<W, H> {
  type Error = FrameError;

  fn try_from(data: Vec<u8>) -> Result<Self, Self::Error> {
    if data.len() != Self::LEN {
      return Err(FrameError::LengthMismatch {
        expected: Self::LEN,
        actual: data.len(),
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
    })
  }
}

impl<const W: u32, const H: u32> TryFrom<RgbImage> for RgbNhwcFrame<W, H> {
  type Error = FrameError;

  fn try_from(image: RgbImage) -> Result<Self, Self::Error> {
    if image.dimensions() != (W, H) {
      return Err(FrameError::DimensionMismatch {
        expected: (W, H),
        actual: image.dimensions(),
      });
    }

    // RgbImage 的底层缓冲本身就是 HWC 交错排列
    Self::try_from(image.into_raw())
  }
}

impl<const W: u32, const H: u32> AsNhwcFrame for RgbNhwcFrame<W, H> {
  fn as_nhwc(&self) -> &[u8] {
    &self.data
  }
}

/// 批大小为 1 的浮点 NHWC 张量，取值范围 [0.0, 1.0]
#[derive(Debug, Clone, PartialEq)]
pub struct NhwcTensor<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> NhwcTensor<W, H> {
  pub const SHAPE: [usize; 4] = [1, H as usize, W as usize, RGB_CHANNELS];

  pub fn shape(&self) -> [usize; 4] {
    Self::SHAPE
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }
}

impl<const W: u32, const H: u32> From<&RgbNhwcFrame<W, H>> for NhwcTensor<W, H> {
  fn from(frame: &RgbNhwcFrame<W, H>) -> Self {
    let data = frame
      .as_nhwc()
      .iter()
      .map(|&value| value as f32 / CHANNEL_MAX)
      .collect();
    Self { data }
  }
}
