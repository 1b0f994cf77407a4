// 该文件是 Mingmu （明目） 项目的一部分。
// src/input.rs - 眼底图像输入
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

use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

mod decode;
pub use self::decode::{DecodeError, SUPPORTED_FORMATS, decode_rgb_frame, sniff_format};
#[cfg(test)]
pub(crate) use self::decode::encode_test_image;

mod read_image_file;
pub use self::read_image_file::ImageFileInput;

mod directory_input;
pub use self::directory_input::DirectoryInput;

/// 一次推理请求携带的原始图像数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
  source: String,
  bytes: Box<[u8]>,
}

impl InputImage {
  pub fn from_bytes(source: impl Into<String>, bytes: impl Into<Box<[u8]>>) -> Self {
    Self {
      source: source.into(),
      bytes: bytes.into(),
    }
  }

  /// 图像来源描述（文件路径或调用方给出的标签）
  pub fn source(&self) -> &str {
    &self.source
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  /// 根据文件头推断的扩展名，不支持的格式返回 None
  pub fn extension(&self) -> Option<&'static str> {
    sniff_format(&self.bytes)
      .ok()
      .and_then(|format| format.extensions_str().first().copied())
  }
}

#[derive(Error, Debug)]
pub enum InputError {
  #[error("I/O 错误: {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("不是目录: {0}")]
  NotADirectory(String),
}

impl InputError {
  pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
    InputError::Io {
      path: path.display().to_string(),
      source,
    }
  }
}

/// URL 路径可能经过百分号编码，例如包含空格或中文的文件名
pub(crate) fn url_to_path(url: &Url) -> PathBuf {
  match urlencoding::decode(url.path()) {
    Ok(path) => PathBuf::from(path.into_owned()),
    Err(_) => PathBuf::from(url.path()),
  }
}

pub enum InputWrapper {
  ReadImageFile(ImageFileInput),
  Directory(DirectoryInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      ImageFileInput::SCHEME => Ok(InputWrapper::ReadImageFile(ImageFileInput::from_url(url)?)),
      DirectoryInput::SCHEME => Ok(InputWrapper::Directory(DirectoryInput::from_url(url)?)),
      other => Err(InputError::SchemeMismatch(format!(
        "不支持的输入方案 '{}'",
        other
      ))),
    }
  }
}

impl Iterator for InputWrapper {
  type Item = Result<InputImage, InputError>;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      InputWrapper::ReadImageFile(input) => input.next(),
      InputWrapper::Directory(input) => input.next(),
    }
  }
}
