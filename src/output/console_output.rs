// 该文件是 Mingmu （明目） 项目的一部分。
// src/output/console_output.rs - 控制台结论输出
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

use std::io::Write;

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, input::InputImage, output::Render, query_flag, screening::Verdict,
};

#[derive(Error, Debug)]
pub enum ConsoleOutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 将结论写到标准输出，`console:?source` 时附带图像来源
pub struct ConsoleOutput {
  with_source: bool,
}

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(ConsoleOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(ConsoleOutput {
      with_source: query_flag(uri, "source"),
    })
  }
}

impl ConsoleOutput {
  fn format_line(&self, frame: &InputImage, verdict: &Verdict) -> String {
    if self.with_source {
      format!("{}: {}", frame.source(), verdict.message())
    } else {
      verdict.message().to_string()
    }
  }
}

impl Render<InputImage, Verdict> for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn render_result(&self, frame: &InputImage, result: &Verdict) -> Result<(), Self::Error> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", self.format_line(frame, result))?;
    Ok(())
  }
}
