// 该文件是 Mingmu （明目） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use tracing::{debug, error};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{InputError, InputImage, url_to_path},
};

/// 单个图像文件，读取原始字节，解码留给推理流水线
pub struct ImageFileInput {
  image: Option<InputImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(InputError::SchemeMismatch(format!(
        "期望输入方式 '{}', 实际输入方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let path = url_to_path(url);
    let bytes = std::fs::read(&path).map_err(|e| InputError::io(&path, e))?;
    debug!("读取图像文件: {} ({} 字节)", path.display(), bytes.len());

    Ok(ImageFileInput {
      image: Some(InputImage::from_bytes(path.display().to_string(), bytes)),
    })
  }
}

impl Iterator for ImageFileInput {
  type Item = Result<InputImage, InputError>;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take().map(Ok)
  }
}
