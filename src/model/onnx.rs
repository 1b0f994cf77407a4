// 该文件是 Mingmu （明目） 项目的一部分。
// src/model/onnx.rs - ONNX 二分类模型
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

use std::path::PathBuf;

use tract_onnx::prelude::*;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::NhwcTensor,
  input::url_to_path,
  model::{ClassScores, Model, ModelError},
  query_flag,
};

const ONNX_DEFAULT_CLASS_NUM: usize = 2;

/// 加载后只读的 ONNX 分类模型，输入为 NHWC 浮点张量
pub struct OnnxClassifier<const W: u32, const H: u32> {
  plan: TypedRunnableModel<TypedModel>,
  num_classes: usize,
}

pub struct OnnxClassifierBuilder {
  model_path: PathBuf,
  optimize: bool,
  num_classes: usize,
}

impl FromUrlWithScheme for OnnxClassifierBuilder {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxClassifierBuilder {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ModelError::ModelPath(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    // `?optimize=false` 跳过图优化，便于排查导出问题
    let optimize = !url
      .query_pairs()
      .any(|(k, _)| k == "optimize")
      || query_flag(url, "optimize");

    Ok(OnnxClassifierBuilder::new(url_to_path(url)).optimize(optimize))
  }
}

impl OnnxClassifierBuilder {
  pub fn new(model_path: impl Into<PathBuf>) -> Self {
    Self {
      model_path: model_path.into(),
      optimize: true,
      num_classes: ONNX_DEFAULT_CLASS_NUM,
    }
  }

  pub fn optimize(mut self, optimize: bool) -> Self {
    self.optimize = optimize;
    self
  }

  pub fn build<const W: u32, const H: u32>(self) -> Result<OnnxClassifier<W, H>, ModelError> {
    info!("加载模型文件: {}", self.model_path.display());
    let metadata = std::fs::metadata(&self.model_path)
      .map_err(|e| ModelError::Load(format!("{}: {}", self.model_path.display(), e)))?;
    debug!(
      "模型文件大小: {:.2} MB",
      metadata.len() as f64 / (1024.0 * 1024.0)
    );

    let input_shape = NhwcTensor::<W, H>::SHAPE;
    let model = tract_onnx::onnx()
      .model_for_path(&self.model_path)
      .and_then(|model| model.with_input_fact(0, f32::fact(input_shape).into()))
      .map_err(|e| ModelError::Load(format!("无法解析模型: {}", e)))?;

    info!("构建推理计算图 (优化: {})", self.optimize);
    let typed = if self.optimize {
      model.into_optimized()
    } else {
      model.into_typed().and_then(|model| model.into_decluttered())
    }
    .map_err(|e| ModelError::Load(format!("无法构建计算图: {}", e)))?;

    let output_fact = typed
      .output_fact(0)
      .map_err(|e| ModelError::Load(format!("无法获取模型输出: {}", e)))?;
    debug!("模型输出: {:?}", output_fact);

    if let Some(shape) = output_fact.shape.as_concrete() {
      let count: usize = shape.iter().product();
      if count != self.num_classes {
        error!(
          "预期模型输出 {} 个分数, 实际输出形状为 {:?}",
          self.num_classes, shape
        );
        return Err(ModelError::ShapeMismatch {
          expected: vec![1, self.num_classes],
          actual: shape.to_vec(),
        });
      }
    }

    let plan = typed
      .into_runnable()
      .map_err(|e| ModelError::Load(format!("无法创建推理计划: {}", e)))?;
    info!("模型加载完成");

    Ok(OnnxClassifier {
      plan,
      num_classes: self.num_classes,
    })
  }
}

impl<const W: u32, const H: u32> Model for OnnxClassifier<W, H> {
  type Input = NhwcTensor<W, H>;
  type Output = ClassScores;
  type Error = ModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let shape = input.shape();
    debug!("设置模型输入: {:?}", shape);
    let tensor = Tensor::from_shape(&shape, input.as_slice()).map_err(|_| {
      ModelError::ShapeMismatch {
        expected: shape.to_vec(),
        actual: vec![input.as_slice().len()],
      }
    })?;

    debug!("执行模型推理");
    let outputs = self
      .plan
      .run(tvec!(tensor.into()))
      .map_err(|e| ModelError::Inference(e.to_string()))?;

    let output = outputs
      .first()
      .ok_or_else(|| ModelError::Inference("模型没有输出".to_string()))?;
    let scores = output
      .as_slice::<f32>()
      .map_err(|e| ModelError::Inference(format!("无法读取输出分数: {}", e)))?;
    debug!("模型推理结果：{:?}", scores);

    if scores.len() != self.num_classes {
      return Err(ModelError::ShapeMismatch {
        expected: vec![1, self.num_classes],
        actual: output.shape().to_vec(),
      });
    }

    Ok(ClassScores::from(scores.to_vec()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::input::encode_test_image;
  use crate::screening::{FUNDUS_INPUT_SIZE, Screening, Verdict, preprocess};
  use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
  use prost::Message;
  use tract_onnx::pb::{
    AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
    TensorShapeProto, TypeProto, ValueInfoProto,
    attribute_proto::AttributeType,
    tensor_proto::DataType,
    tensor_shape_proto::{Dimension, dimension},
    type_proto,
  };

  /// 通道均值 -> 线性层 -> 偏置，输出 `classes` 个分数。
  /// 类别 0 恒为 0.5，类别 1 为三个通道均值之和，更亮的图像判为健康。
  fn channel_mean_graph(classes: usize) -> Vec<u8> {
    let input_dims = [1i64, 224, 224, 3];
    let input = ValueInfoProto {
      name: "x".to_string(),
      r#type: Some(TypeProto {
        value: Some(type_proto::Value::TensorType(type_proto::Tensor {
          elem_type: DataType::Float as i32,
          shape: Some(TensorShapeProto {
            dim: input_dims
              .iter()
              .map(|&d| Dimension {
                value: Some(dimension::Value::DimValue(d)),
                ..Default::default()
              })
              .collect(),
          }),
        })),
        ..Default::default()
      }),
      ..Default::default()
    };

    let mut weights = Vec::new();
    for _ in 0..3 {
      weights.extend((0..classes).map(|class| if class == 1 { 1.0f32 } else { 0.0 }));
    }
    let mut bias = vec![0.0f32; classes];
    bias[0] = 0.5;

    let reduce_mean = NodeProto {
      input: vec!["x".to_string()],
      output: vec!["mean".to_string()],
      op_type: "ReduceMean".to_string(),
      attribute: vec![
        AttributeProto {
          name: "axes".to_string(),
          r#type: AttributeType::Ints as i32,
          ints: vec![1, 2],
          ..Default::default()
        },
        AttributeProto {
          name: "keepdims".to_string(),
          r#type: AttributeType::Int as i32,
          i: 0,
          ..Default::default()
        },
      ],
      ..Default::default()
    };
    let matmul = NodeProto {
      input: vec!["mean".to_string(), "w".to_string()],
      output: vec!["logits".to_string()],
      op_type: "MatMul".to_string(),
      ..Default::default()
    };
    let add = NodeProto {
      input: vec!["logits".to_string(), "b".to_string()],
      output: vec!["scores".to_string()],
      op_type: "Add".to_string(),
      ..Default::default()
    };

    let model = ModelProto {
      ir_version: 8,
      opset_import: vec![OperatorSetIdProto {
        domain: String::new(),
        version: 13,
      }],
      graph: Some(GraphProto {
        name: "fundus-fixture".to_string(),
        node: vec![reduce_mean, matmul, add],
        initializer: vec![
          TensorProto {
            name: "w".to_string(),
            dims: vec![3, classes as i64],
            data_type: DataType::Float as i32,
            float_data: weights,
            ..Default::default()
          },
          TensorProto {
            name: "b".to_string(),
            dims: vec![classes as i64],
            data_type: DataType::Float as i32,
            float_data: bias,
            ..Default::default()
          },
        ],
        input: vec![input],
        output: vec![ValueInfoProto {
          name: "scores".to_string(),
          ..Default::default()
        }],
        ..Default::default()
      }),
      ..Default::default()
    };
    model.encode_to_vec()
  }

  fn write_graph(dir: &tempfile::TempDir, classes: usize) -> PathBuf {
    let path = dir.path().join(format!("fixture-{}.onnx", classes));
    std::fs::write(&path, channel_mean_graph(classes)).unwrap();
    path
  }

  fn png(pixel: u8) -> Vec<u8> {
    let image = RgbImage::from_pixel(64, 48, Rgb([pixel; 3]));
    encode_test_image(DynamicImage::ImageRgb8(image), ImageFormat::Png)
  }

  #[test]
  fn loaded_graph_classifies_through_screening() {
    let dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!("onnx://{}", write_graph(&dir, 2).display())).unwrap();
    let model = OnnxClassifierBuilder::from_url(&url)
      .unwrap()
      .build::<FUNDUS_INPUT_SIZE, FUNDUS_INPUT_SIZE>()
      .unwrap();
    let screening = Screening::init(model);

    assert_eq!(screening.classify(&png(230)).unwrap(), Verdict::Healthy);
    assert_eq!(screening.classify(&png(0)).unwrap(), Verdict::Ill);
    assert_eq!(screening.classify(&png(230)).unwrap(), Verdict::Healthy);
  }

  #[test]
  fn unoptimized_graph_yields_two_scores() {
    let dir = tempfile::tempdir().unwrap();
    let model = OnnxClassifierBuilder::new(write_graph(&dir, 2))
      .optimize(false)
      .build::<FUNDUS_INPUT_SIZE, FUNDUS_INPUT_SIZE>()
      .unwrap();

    let tensor = preprocess(&png(0)).unwrap();
    let scores = model.infer(&tensor).unwrap();
    assert_eq!(scores.len(), 2);
    assert!((scores.as_slice()[0] - 0.5).abs() < 1e-6);
    assert!(scores.as_slice()[1].abs() < 1e-6);
  }

  #[test]
  fn three_class_graph_is_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let result = OnnxClassifierBuilder::new(write_graph(&dir, 3))
      .build::<FUNDUS_INPUT_SIZE, FUNDUS_INPUT_SIZE>();
    match result {
      Err(ModelError::ShapeMismatch { expected, actual }) => {
        assert_eq!(expected, vec![1, 2]);
        assert_eq!(actual, vec![1, 3]);
      }
      Err(e) => panic!("unexpected error: {}", e),
      Ok(_) => panic!("three-class graph must not load"),
    }
  }

  #[test]
  fn score_count_is_checked_per_inference() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = OnnxClassifierBuilder::new(write_graph(&dir, 2))
      .build::<FUNDUS_INPUT_SIZE, FUNDUS_INPUT_SIZE>()
      .unwrap();
    model.num_classes = 3;

    let tensor = preprocess(&png(100)).unwrap();
    assert!(matches!(
      model.infer(&tensor),
      Err(ModelError::ShapeMismatch { .. })
    ));
  }

  #[test]
  fn builder_reads_path_and_options_from_url() {
    let url = Url::parse("onnx:///models/fundus%20v2.onnx?optimize=false").unwrap();
    let builder = OnnxClassifierBuilder::from_url(&url).unwrap();
    assert_eq!(builder.model_path, PathBuf::from("/models/fundus v2.onnx"));
    assert!(!builder.optimize);
    assert_eq!(builder.num_classes, 2);

    let url = Url::parse("onnx:///models/fundus.onnx").unwrap();
    assert!(OnnxClassifierBuilder::from_url(&url).unwrap().optimize);
  }

  #[test]
  fn builder_rejects_other_schemes() {
    let url = Url::parse("rknn:///models/fundus.rknn").unwrap();
    assert!(matches!(
      OnnxClassifierBuilder::from_url(&url),
      Err(ModelError::ModelPath(_))
    ));
  }

  #[test]
  fn missing_artifact_fails_to_load() {
    let result = OnnxClassifierBuilder::new("/definitely/missing/model.onnx").build::<224, 224>();
    assert!(matches!(result, Err(ModelError::Load(_))));
  }

  #[test]
  fn corrupt_artifact_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.onnx");
    std::fs::write(&path, b"this is not a protobuf graph").unwrap();

    let result = OnnxClassifierBuilder::new(&path).build::<224, 224>();
    assert!(matches!(result, Err(ModelError::Load(_))));
  }
}
