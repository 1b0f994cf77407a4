// 该文件是 Mingmu （明目） 项目的一部分。
// src/task.rs - 筛查任务
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

use std::sync::mpsc::{self, Receiver};
use std::{thread, time::Duration};

use anyhow::Context;
use tracing::{error, info, warn};

use crate::{
  input::{InputError, InputImage},
  model::{ClassScores, Model, ModelError},
  output::Render,
  screening::{FundusTensor, Screening, Verdict},
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(
    self,
    input: I,
    screening: &Screening<M>,
    output: O,
  ) -> Result<TaskSummary, Self::Error>;
}

/// 一次任务中各类结论的计数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskSummary {
  pub healthy: usize,
  pub ill: usize,
  pub rejected: usize,
}

impl TaskSummary {
  pub fn total(&self) -> usize {
    self.healthy + self.ill + self.rejected
  }

  fn count(&mut self, verdict: Verdict) {
    match verdict {
      Verdict::Healthy => self.healthy += 1,
      Verdict::Ill => self.ill += 1,
    }
  }
}

pub struct OneShotTask;

impl<
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<InputImage, InputError>>,
  M: Model<Input = FundusTensor, Output = ClassScores, Error = ModelError>,
  O: Render<InputImage, Verdict, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    mut input: I,
    screening: &Screening<M>,
    output: O,
  ) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let image = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))??;
    info!("输入图像获取成功: {}，开始推理...", image.source());

    let now = std::time::Instant::now();
    let verdict = screening
      .classify(image.bytes())
      .with_context(|| format!("无法筛查图像: {}", image.source()))?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());

    output.render_result(&image, &verdict)?;

    let mut summary = TaskSummary::default();
    summary.count(verdict);
    Ok(summary)
  }
}

pub struct RepeatShotTask {
  repeat_times: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self { repeat_times: 1000 }
  }
}

impl RepeatShotTask {
  // 前两次推理用于预热，不计入平均耗时
  const WARMUP_TIMES: usize = 2;

  pub fn with_repeat_times(mut self, repeat_times: usize) -> Self {
    self.repeat_times = repeat_times.max(1);
    self
  }
}

impl<
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<InputImage, InputError>>,
  M: Model<Input = FundusTensor, Output = ClassScores, Error = ModelError>,
  O: Render<InputImage, Verdict, Error = RE>,
> Task<I, M, O> for RepeatShotTask
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    mut input: I,
    screening: &Screening<M>,
    output: O,
  ) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let image = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))??;
    info!("输入图像获取成功，开始推理...");

    let mut summary = TaskSummary::default();
    let mut times = Vec::with_capacity(self.repeat_times);
    for i in 0..self.repeat_times {
      let now = std::time::Instant::now();
      let verdict = screening.classify(image.bytes())?;
      let elapsed = now.elapsed();
      info!("({})推理完成，耗时: {:.2?}", i, elapsed);
      output.render_result(&image, &verdict)?;
      summary.count(verdict);
      times.push(elapsed);
    }

    let measured = if times.len() > Self::WARMUP_TIMES {
      &times[Self::WARMUP_TIMES..]
    } else {
      &times[..]
    };
    warn!(
      "平均推理时间: {:.2?}",
      measured.iter().sum::<Duration>() / measured.len() as u32
    );

    Ok(summary)
  }
}

/// 逐个筛查输入源中的全部图像；单张图像不可用时记录并跳过
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  stop: Option<Receiver<()>>,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  pub fn with_stop_signal(mut self, stop: Receiver<()>) -> Self {
    self.stop = Some(stop);
    self
  }

  /// 安装 Ctrl-C 处理器，收到信号后在当前图像处理完毕时退出
  pub fn with_ctrlc(self) -> anyhow::Result<Self> {
    let (tx, rx) = mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })
    .context("无法设置 Ctrl-C 处理器")?;

    Ok(self.with_stop_signal(rx))
  }
}

impl<
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Result<InputImage, InputError>>,
  M: Model<Input = FundusTensor, Output = ClassScores, Error = ModelError>,
  O: Render<InputImage, Verdict, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    mut input: I,
    screening: &Screening<M>,
    output: O,
  ) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let mut summary = TaskSummary::default();
    let mut pulled = 0;

    // 先判断退出条件再取下一张，避免多读一个文件
    loop {
      if self.frame_number.is_some_and(|n| pulled >= n) {
        info!("达到指定图像数 {}, 退出任务循环", pulled);
        break;
      }
      if self.stop.as_ref().is_some_and(|rx| rx.try_recv().is_ok()) {
        warn!("中断信号接收，退出任务循环");
        break;
      }

      let Some(image) = input.next() else {
        break;
      };
      pulled += 1;

      let image = match image {
        Ok(image) => image,
        Err(e) => {
          warn!("无法读取第 {} 张图像: {}", pulled, e);
          summary.rejected += 1;
          continue;
        }
      };

      info!("处理第 {} 张图像: {}", pulled, image.source());
      let now = std::time::Instant::now();
      match screening.classify(image.bytes()) {
        Ok(verdict) => {
          output.render_result(&image, &verdict)?;
          summary.count(verdict);
          info!("推理完成，耗时: {:.2?}", now.elapsed());
        }
        Err(e) if e.is_rejection() => {
          warn!("拒绝图像 {}: {}", image.source(), e);
          summary.rejected += 1;
        }
        Err(e) => {
          error!("筛查内部错误，终止任务: {}", e);
          return Err(e).with_context(|| format!("无法筛查图像: {}", image.source()));
        }
      }
    }

    info!(
      "任务完成，退出: 健康 {}，患病 {}，拒绝 {}",
      summary.healthy, summary.ill, summary.rejected
    );
    Ok(summary)
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;
  use std::sync::Mutex;

  use super::*;
  use crate::input::encode_test_image;
  use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

  /// 亮图判为健康，暗图判为患病
  struct Brightness;

  impl Model for Brightness {
    type Input = FundusTensor;
    type Output = ClassScores;
    type Error = ModelError;

    fn infer(&self, input: &FundusTensor) -> Result<ClassScores, ModelError> {
      let values = input.as_slice();
      let mean = values.iter().sum::<f32>() / values.len() as f32;
      Ok(ClassScores::from([0.5, mean]))
    }
  }

  struct Broken;

  impl Model for Broken {
    type Input = FundusTensor;
    type Output = ClassScores;
    type Error = ModelError;

    fn infer(&self, _input: &FundusTensor) -> Result<ClassScores, ModelError> {
      Ok(ClassScores::from([0.1, 0.2, 0.7]))
    }
  }

  #[derive(Default)]
  struct Collect {
    rendered: Mutex<Vec<(String, Verdict)>>,
  }

  impl Render<InputImage, Verdict> for &Collect {
    type Error = std::io::Error;

    fn render_result(&self, frame: &InputImage, result: &Verdict) -> Result<(), Self::Error> {
      self
        .rendered
        .lock()
        .unwrap()
        .push((frame.source().to_string(), *result));
      Ok(())
    }
  }

  fn png(pixel: u8) -> Vec<u8> {
    let image = RgbImage::from_pixel(12, 12, Rgb([pixel; 3]));
    encode_test_image(DynamicImage::ImageRgb8(image), ImageFormat::Png)
  }

  fn source(items: Vec<(&str, Vec<u8>)>) -> impl Iterator<Item = Result<InputImage, InputError>> {
    items
      .into_iter()
      .map(|(name, bytes)| Ok(InputImage::from_bytes(name, bytes)))
  }

  /// 统计任务实际从输入源取出的图像数
  fn counted<'a>(
    items: Vec<(&'a str, Vec<u8>)>,
    pulled: &'a Cell<usize>,
  ) -> impl Iterator<Item = Result<InputImage, InputError>> + 'a {
    source(items).inspect(move |_| pulled.set(pulled.get() + 1))
  }

  #[test]
  fn one_shot_classifies_first_image() {
    let screening = Screening::init(Brightness);
    let collect = Collect::default();
    let summary = OneShotTask
      .run_task(
        source(vec![("bright", png(250)), ("dark", png(5))]),
        &screening,
        &collect,
      )
      .unwrap();

    assert_eq!(summary.healthy, 1);
    assert_eq!(summary.total(), 1);
    assert_eq!(
      *collect.rendered.lock().unwrap(),
      vec![("bright".to_string(), Verdict::Healthy)]
    );
  }

  #[test]
  fn one_shot_surfaces_rejection() {
    let screening = Screening::init(Brightness);
    let collect = Collect::default();
    let result = OneShotTask.run_task(
      source(vec![("junk", b"junk".to_vec())]),
      &screening,
      &collect,
    );
    assert!(result.is_err());
    assert!(collect.rendered.lock().unwrap().is_empty());
  }

  #[test]
  fn continuous_skips_rejected_images() {
    let screening = Screening::init(Brightness);
    let collect = Collect::default();
    let items = vec![
      ("a", png(250)),
      ("b", Vec::new()),
      ("c", png(3)),
      ("d", png(200)),
    ];

    let summary = ContinuousTask::default()
      .run_task(source(items), &screening, &collect)
      .unwrap();

    assert_eq!(
      summary,
      TaskSummary {
        healthy: 2,
        ill: 1,
        rejected: 1
      }
    );
    assert_eq!(collect.rendered.lock().unwrap().len(), 3);
  }

  #[test]
  fn continuous_honours_frame_number_and_stop_signal() {
    let screening = Screening::init(Brightness);
    let collect = Collect::default();
    let items = || vec![("a", png(250)), ("b", png(250)), ("c", png(250))];

    let pulled = Cell::new(0);
    let summary = ContinuousTask::default()
      .with_frame_number(Some(2))
      .run_task(counted(items(), &pulled), &screening, &collect)
      .unwrap();
    assert_eq!(summary.total(), 2);
    assert_eq!(pulled.get(), 2);

    pulled.set(0);
    let (tx, rx) = mpsc::channel();
    tx.send(()).unwrap();
    let summary = ContinuousTask::default()
      .with_stop_signal(rx)
      .run_task(counted(items(), &pulled), &screening, &collect)
      .unwrap();
    assert_eq!(summary.total(), 0);
    assert_eq!(pulled.get(), 0);
  }

  #[test]
  fn continuous_aborts_on_internal_failure() {
    let screening = Screening::init(Broken);
    let collect = Collect::default();
    let result =
      ContinuousTask::default().run_task(source(vec![("a", png(100))]), &screening, &collect);
    assert!(result.is_err());
  }

  #[test]
  fn repeat_shot_runs_requested_times() {
    let screening = Screening::init(Brightness);
    let collect = Collect::default();
    let summary = RepeatShotTask::default()
      .with_repeat_times(4)
      .run_task(source(vec![("dark", png(1))]), &screening, &collect)
      .unwrap();

    assert_eq!(summary.ill, 4);
    assert_eq!(collect.rendered.lock().unwrap().len(), 4);
  }
}
