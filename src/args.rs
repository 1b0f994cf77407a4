// 该文件是 Mingmu （明目） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::{Parser, Subcommand};
use url::Url;

use mingmu::content::{LastCheckup, Page};

/// Mingmu 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// 对单张眼底图像进行筛查
  Screen {
    /// ONNX 模型文件路径，例如 onnx:///models/fundus.onnx
    #[arg(long, value_name = "MODEL")]
    model: Url,

    /// 输入来源
    /// 支持格式:
    /// - 图片: image:///path/to/fundus.jpg（JPEG 或 PNG）
    /// - 目录: folder:///path/to/dir（取第一张）
    #[arg(long, value_name = "SOURCE")]
    input: Url,

    /// 输出方式
    /// 支持格式:
    /// - 控制台: console: 或 console:?source
    /// - 记录目录: folder:///path/to/records?always&copy
    #[arg(long, value_name = "OUTPUT", default_value = "console:")]
    output: Url,
  },

  /// 显示科普页面
  Page {
    #[arg(value_enum)]
    page: Page,
  },

  /// 上一次眼底筛查距今多久
  Checkup {
    #[arg(value_enum)]
    answer: LastCheckup,
  },
}
