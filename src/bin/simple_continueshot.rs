// 该文件是 Mingmu （明目） 项目的一部分。
// src/bin/simple_continueshot.rs - 批量筛查目录中的图像
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use mingmu::{
  FromUrl,
  input::InputWrapper,
  model::OnnxClassifierBuilder,
  output::OutputWrapper,
  screening::{FUNDUS_INPUT_SIZE, Screening},
  task::{ContinuousTask, Task},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Mingmu 批量筛查参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型文件路径
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT", default_value = "console:?source")]
  pub output: Url,

  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let model = OnnxClassifierBuilder::from_url(&args.model)?
    .build::<FUNDUS_INPUT_SIZE, FUNDUS_INPUT_SIZE>()?;
  let screening = Screening::init(model);
  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let summary = ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .with_ctrlc()?
    .run_task(input, &screening, output)?;

  println!(
    "共筛查 {} 张图像: 健康 {}，患病 {}，拒绝 {}",
    summary.total(),
    summary.healthy,
    summary.ill,
    summary.rejected
  );

  screening.teardown();
  Ok(())
}
