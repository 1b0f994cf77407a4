// 该文件是 Mingmu （明目） 项目的一部分。
// src/model.rs - 模型
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

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

impl<M: Model + ?Sized> Model for Arc<M> {
  type Input = M::Input;
  type Output = M::Output;
  type Error = M::Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    (**self).infer(input)
  }
}

/// 推理后端不支持并发调用时，用互斥锁包裹模型句柄使调用串行化
impl<M: Model> Model for Mutex<M> {
  type Input = M::Input;
  type Output = M::Output;
  type Error = M::Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    // 模型加载后只读，锁中毒不影响其状态
    let model = self.lock().unwrap_or_else(PoisonError::into_inner);
    model.infer(input)
  }
}

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("模型加载错误: {0}")]
  Load(String),
  #[error("模型路径错误: {0}")]
  ModelPath(String),
  #[error("张量形状不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  ShapeMismatch {
    expected: Vec<usize>,
    actual: Vec<usize>,
  },
  #[error("推理错误: {0}")]
  Inference(String),
}

/// 分类模型输出的分数向量，每个类别一个分数
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores {
  scores: Box<[f32]>,
}

impl ClassScores {
  pub fn len(&self) -> usize {
    self.scores.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scores.is_empty()
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.scores
  }

  /// 最大分数对应的类别索引，并列时取最小索引。
  /// 向量为空或包含 NaN 时返回 None；与 `numpy.argmax` 不同，NaN 不会被当作最大值。
  pub fn argmax(&self) -> Option<usize> {
    if self.scores.iter().any(|score| score.is_nan()) {
      return None;
    }

    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in self.scores.iter().enumerate() {
      match best {
        Some((_, best_score)) if score <= best_score => {}
        _ => best = Some((index, score)),
      }
    }
    best.map(|(index, _)| index)
  }
}

impl From<Vec<f32>> for ClassScores {
  fn from(scores: Vec<f32>) -> Self {
    Self {
      scores: scores.into_boxed_slice(),
    }
  }
}

impl<const N: usize> From<[f32; N]> for ClassScores {
  fn from(scores: [f32; N]) -> Self {
    Self {
      scores: Box::new(scores),
    }
  }
}

#[cfg(feature = "model_onnx")]
mod onnx;
#[cfg(feature = "model_onnx")]
pub use self::onnx::{OnnxClassifier, OnnxClassifierBuilder};
