// 该文件是 Mingmu （明目） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mingmu::{
  FromUrl,
  content::{AdviceLevel, LastCheckup, Page},
  input::InputWrapper,
  model::OnnxClassifierBuilder,
  output::OutputWrapper,
  screening::{FUNDUS_INPUT_SIZE, Screening},
  task::{OneShotTask, Task},
};

use args::{Args, Command};

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  match args.command {
    Command::Screen {
      model,
      input,
      output,
    } => screen(&model, &input, &output),
    Command::Page { page } => {
      show_page(page);
      Ok(())
    }
    Command::Checkup { answer } => {
      show_checkup(answer);
      Ok(())
    }
  }
}

fn screen(model: &url::Url, input: &url::Url, output: &url::Url) -> Result<()> {
  info!("模型文件路径: {}", model);
  info!("输入来源: {}", input);
  info!("输出路径: {}", output);

  // 模型加载失败时直接退出，不处理任何图像
  let model =
    OnnxClassifierBuilder::from_url(model)?.build::<FUNDUS_INPUT_SIZE, FUNDUS_INPUT_SIZE>()?;
  let screening = Screening::init(model);

  let input = InputWrapper::from_url(input)?;
  let output = OutputWrapper::from_url(output)?;

  OneShotTask.run_task(input, &screening, output)?;

  screening.teardown();
  Ok(())
}

fn show_page(page: Page) {
  print!("{}", page);
}

fn show_checkup(answer: LastCheckup) {
  let advice = answer.advice();
  println!("{}", LastCheckup::QUESTION);
  println!("> {}", answer.label());
  println!();
  match advice.level {
    AdviceLevel::Success => println!("[OK] {}", advice.message),
    AdviceLevel::Warning => println!("[!] {}", advice.message),
  }
  if let Some(follow_up) = advice.follow_up {
    println!("{}", follow_up);
  }
}
