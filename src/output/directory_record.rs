// 该文件是 Mingmu （明目） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU16, Ordering};

use chrono::{DateTime, Datelike, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{InputImage, url_to_path},
  output::Render,
  query_flag,
  screening::Verdict,
};

const RECORD_FILE_NAME: &str = "verdicts.jsonl";

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 按日期分目录追加筛查记录，目录结构为 `<root>/YYYY/MM/DD/verdicts.jsonl`。
///
/// - 默认只记录患病结论，`?always` 时记录全部结论
/// - `?copy` 时同时保存被筛查的原始图像
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  frame_counter: AtomicU16,
  always: bool,
  copy: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    Ok(DirectoryRecordOutput {
      directory: url_to_path(uri),
      frame_counter: AtomicU16::new(0),
      always: query_flag(uri, "always"),
      copy: query_flag(uri, "copy"),
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> u16 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
  }

  fn day_directory(&self, now: &DateTime<Utc>) -> Result<PathBuf, std::io::Error> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
      info!("创建记录目录: {}", directory.display());
    }
    Ok(directory)
  }

  fn copy_image(
    &self,
    directory: &std::path::Path,
    now: &DateTime<Utc>,
    frame: &InputImage,
  ) -> Result<PathBuf, std::io::Error> {
    let extension = frame.extension().unwrap_or("bin");
    let path = directory.join(format!(
      "{}-{:04X}.{}",
      now.format("%H-%M-%S"),
      self.frame_id(),
      extension
    ));
    std::fs::write(&path, frame.bytes())?;
    Ok(path)
  }
}

impl Render<InputImage, Verdict> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &InputImage, result: &Verdict) -> Result<(), Self::Error> {
    if !self.always && *result == Verdict::Healthy {
      debug!("跳过健康结论: {}", frame.source());
      return Ok(());
    }

    let now = Utc::now();
    let directory = self.day_directory(&now)?;

    let copy = if self.copy {
      Some(self.copy_image(&directory, &now, frame)?)
    } else {
      None
    };

    let record = json!({
      "time": now.to_rfc3339(),
      "source": frame.source(),
      "verdict": result.as_str(),
      "message": result.message(),
      "copy": copy.map(|path| path.display().to_string()),
    });

    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(directory.join(RECORD_FILE_NAME))?;
    serde_json::to_writer(&mut file, &record)?;
    file.write_all(b"\n")?;

    Ok(())
  }
}
