// 该文件是 Mingmu （明目） 项目的一部分。
// src/screening.rs - 眼底图像筛查推理流水线
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

//! 图像字节到健康/患病结论的确定性映射。
//!
//! 流程：解码 -> 转 RGB -> 拉伸到 224x224 -> 除以 255 -> 模型推理 -> argmax。
//! 类别索引 1 表示健康，其余索引表示患病，这是随模型文件一同给出的约定。

use std::fmt;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
  frame::{NhwcTensor, RgbNhwcFrame},
  input::{DecodeError, decode_rgb_frame},
  model::{ClassScores, Model, ModelError},
};

pub const FUNDUS_INPUT_SIZE: u32 = 224;
pub const SCREENING_CLASS_NUM: usize = 2;
const HEALTHY_CLASS_INDEX: usize = 1;

pub type FundusFrame = RgbNhwcFrame<FUNDUS_INPUT_SIZE, FUNDUS_INPUT_SIZE>;
pub type FundusTensor = NhwcTensor<FUNDUS_INPUT_SIZE, FUNDUS_INPUT_SIZE>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
  Ill,
  Healthy,
}

impl Verdict {
  pub fn from_class_index(index: usize) -> Self {
    if index == HEALTHY_CLASS_INDEX {
      Verdict::Healthy
    } else {
      Verdict::Ill
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Verdict::Ill => "ill",
      Verdict::Healthy => "healthy",
    }
  }

  pub fn message(&self) -> &'static str {
    match self {
      Verdict::Ill => "The patient is ill",
      Verdict::Healthy => "The patient is healthy",
    }
  }
}

impl fmt::Display for Verdict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Error, Debug)]
pub enum ScreeningError {
  #[error("图像解码错误: {0}")]
  Decode(#[from] DecodeError),
  #[error("模型加载错误: {0}")]
  ModelLoad(String),
  #[error("张量形状不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  ShapeMismatch {
    expected: Vec<usize>,
    actual: Vec<usize>,
  },
  #[error("推理错误: {0}")]
  Inference(String),
}

impl ScreeningError {
  /// 输入本身不可用，拒绝该图像即可；其余错误属于内部故障
  pub fn is_rejection(&self) -> bool {
    matches!(self, ScreeningError::Decode(_))
  }
}

impl From<ModelError> for ScreeningError {
  fn from(err: ModelError) -> Self {
    match err {
      ModelError::Load(msg) | ModelError::ModelPath(msg) => ScreeningError::ModelLoad(msg),
      ModelError::ShapeMismatch { expected, actual } => {
        ScreeningError::ShapeMismatch { expected, actual }
      }
      ModelError::Inference(msg) => ScreeningError::Inference(msg),
    }
  }
}

/// 解码并归一化为模型输入，形状恒为 (1, 224, 224, 3)，取值范围 [0, 1]
pub fn preprocess(bytes: &[u8]) -> Result<FundusTensor, DecodeError> {
  let frame: FundusFrame = decode_rgb_frame(bytes)?;
  Ok(FundusTensor::from(&frame))
}

/// 持有已加载模型的筛查器，生命周期内不重新加载模型
pub struct Screening<M> {
  model: M,
}

impl<M> Screening<M>
where
  M: Model<Input = FundusTensor, Output = ClassScores, Error = ModelError>,
{
  pub fn init(model: M) -> Self {
    info!("筛查器初始化完成");
    Self { model }
  }

  pub fn classify(&self, bytes: &[u8]) -> Result<Verdict, ScreeningError> {
    let now = std::time::Instant::now();
    let tensor = preprocess(bytes)?;
    debug!("预处理完成，耗时: {:.2?}", now.elapsed());

    let scores = self.model.infer(&tensor).map_err(|e| {
      error!("模型推理失败: {}", e);
      ScreeningError::from(e)
    })?;

    if scores.len() != SCREENING_CLASS_NUM {
      error!(
        "模型输出 {} 个分数, 期望 {} 个",
        scores.len(),
        SCREENING_CLASS_NUM
      );
      return Err(ScreeningError::ShapeMismatch {
        expected: vec![1, SCREENING_CLASS_NUM],
        actual: vec![1, scores.len()],
      });
    }

    let index = scores.argmax().ok_or_else(|| {
      error!("模型输出包含 NaN: {:?}", scores.as_slice());
      ScreeningError::Inference("模型输出包含 NaN".to_string())
    })?;

    let verdict = Verdict::from_class_index(index);
    info!("筛查完成: {}，耗时: {:.2?}", verdict, now.elapsed());
    Ok(verdict)
  }

  /// 结束生命周期，交还模型句柄
  pub fn teardown(self) -> M {
    info!("筛查器已释放");
    self.model
  }
}
