// 该文件是 Mingmu （明目） 项目的一部分。
// src/input/directory_input.rs - 目录批量输入
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

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{InputError, InputImage, url_to_path},
};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// 目录中的全部 JPEG/PNG 文件，按文件名排序后逐个读取
pub struct DirectoryInput {
  files: std::vec::IntoIter<PathBuf>,
}

impl FromUrlWithScheme for DirectoryInput {
  const SCHEME: &'static str = "folder";
}

fn is_image_file(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| {
      IMAGE_EXTENSIONS
        .iter()
        .any(|known| ext.eq_ignore_ascii_case(known))
    })
    .unwrap_or(false)
}

impl FromUrl for DirectoryInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(InputError::SchemeMismatch(format!(
        "期望输入方式 '{}', 实际输入方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let directory = url_to_path(url);
    if !directory.is_dir() {
      return Err(InputError::NotADirectory(directory.display().to_string()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&directory).map_err(|e| InputError::io(&directory, e))? {
      let path = entry.map_err(|e| InputError::io(&directory, e))?.path();
      if path.is_file() && is_image_file(&path) {
        files.push(path);
      } else {
        debug!("跳过非图像文件: {}", path.display());
      }
    }
    files.sort();

    info!("目录 {} 中共有 {} 张图像", directory.display(), files.len());

    Ok(DirectoryInput {
      files: files.into_iter(),
    })
  }
}

impl Iterator for DirectoryInput {
  type Item = Result<InputImage, InputError>;

  fn next(&mut self) -> Option<Self::Item> {
    let path = self.files.next()?;
    let image = std::fs::read(&path)
      .map(|bytes| InputImage::from_bytes(path.display().to_string(), bytes))
      .map_err(|e| InputError::io(&path, e));
    Some(image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lists_only_images_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.PNG", "a.jpg", "c.jpeg", "notes.txt", "d.bmp"] {
      std::fs::write(dir.path().join(name), name.as_bytes()).unwrap();
    }
    std::fs::create_dir(dir.path().join("nested.png")).unwrap();

    let url = Url::parse(&format!("folder://{}", dir.path().display())).unwrap();
    let sources: Vec<String> = DirectoryInput::from_url(&url)
      .unwrap()
      .map(|image| image.unwrap().source().to_string())
      .collect();

    let expected: Vec<String> = ["a.jpg", "b.PNG", "c.jpeg"]
      .iter()
      .map(|name| dir.path().join(name).display().to_string())
      .collect();
    assert_eq!(sources, expected);
  }

  #[test]
  fn plain_file_is_not_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.jpg");
    std::fs::write(&path, b"x").unwrap();

    let url = Url::parse(&format!("folder://{}", path.display())).unwrap();
    assert!(matches!(
      DirectoryInput::from_url(&url),
      Err(InputError::NotADirectory(_))
    ));
  }
}
