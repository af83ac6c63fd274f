// 该文件是 BrainVision （脑视） 项目的一部分。
// src/task.rs - 分析任务：准入控制、预处理与推理编排
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

use std::{
  sync::atomic::{AtomicBool, Ordering},
  time::Duration,
};

use thiserror::Error;
use tracing::{info, warn};

use crate::{
  input::{InputError, Preprocessor, RawImage},
  locale::{Language, Localized},
  model::{EngineError, InferenceEngine, RankedResult, RuntimeLoader, WithLabel},
  output::Render,
};

/// 单槽准入门：同一时间只允许一个分析在进行，其余请求直接丢弃而不排队
#[derive(Debug, Default)]
pub struct AdmissionGate {
  busy: AtomicBool,
}

/// 持有期间占用准入槽，释放时归还
#[derive(Debug)]
pub struct AdmissionPermit<'a> {
  gate: &'a AdmissionGate,
}

impl AdmissionGate {
  pub fn try_admit(&self) -> Option<AdmissionPermit<'_>> {
    self
      .busy
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| AdmissionPermit { gate: self })
  }

  pub fn is_busy(&self) -> bool {
    self.busy.load(Ordering::Acquire)
  }
}

impl Drop for AdmissionPermit<'_> {
  fn drop(&mut self) {
    self.gate.busy.store(false, Ordering::Release);
  }
}

#[derive(Error, Debug)]
pub enum AnalysisError {
  #[error("输入错误: {0}")]
  Input(#[from] InputError),
  #[error("推理引擎错误: {0}")]
  Engine(#[from] EngineError),
}

impl AnalysisError {
  /// 输入错误与推理失败可以重试；模型未就绪需要重新加载
  pub fn is_recoverable(&self) -> bool {
    match self {
      AnalysisError::Input(_) => true,
      AnalysisError::Engine(e) => e.is_recoverable(),
    }
  }
}

impl Localized for AnalysisError {
  fn localized(&self, lang: Language) -> String {
    match self {
      AnalysisError::Input(InputError::NotAnImage(_)) => lang
        .pick("Please select an image file", "لطفاً یک فایل تصویری انتخاب کنید")
        .to_string(),
      AnalysisError::Input(InputError::TooLarge { .. }) => lang
        .pick("File size must be less than 5MB", "حجم فایل باید کمتر از ۵ مگابایت باشد")
        .to_string(),
      AnalysisError::Input(InputError::MissingImage) => lang
        .pick("No image to analyze", "تصویری برای تحلیل وجود ندارد")
        .to_string(),
      AnalysisError::Input(e) => match lang {
        Language::English => format!("Failed to load image: {}", e),
        Language::Persian => format!("خطا در بارگذاری تصویر: {}", e),
      },
      AnalysisError::Engine(EngineError::NotInitialized) => lang
        .pick(
          "AI system not ready. Please refresh the page.",
          "سامانه AI آماده نیست — صفحه را رفرش کنید",
        )
        .to_string(),
      AnalysisError::Engine(EngineError::NotReady(_)) => {
        lang.pick("Failed to load model", "خطا در بارگذاری مدل").to_string()
      }
      AnalysisError::Engine(EngineError::Prediction(msg)) => match lang {
        Language::English => format!("Analysis error: {}", msg),
        Language::Persian => format!("خطا در تحلیل تصویر: {}", msg),
      },
    }
  }
}

/// 一次分析：图像 -> 预处理 -> 推理，并用准入门限制并发
pub struct Analyzer<'e, L: RuntimeLoader, const S: u32> {
  engine: &'e InferenceEngine<L>,
  preprocessor: Preprocessor<S>,
  gate: AdmissionGate,
}

impl<'e, L: RuntimeLoader, const S: u32> Analyzer<'e, L, S> {
  pub fn new(engine: &'e InferenceEngine<L>) -> Self {
    Self {
      engine,
      preprocessor: Preprocessor::default(),
      gate: AdmissionGate::default(),
    }
  }

  pub fn with_preprocessor(mut self, preprocessor: Preprocessor<S>) -> Self {
    self.preprocessor = preprocessor;
    self
  }

  pub fn engine(&self) -> &InferenceEngine<L> {
    self.engine
  }

  pub fn is_busy(&self) -> bool {
    self.gate.is_busy()
  }

  /// 分析一张图像。已有分析进行中时返回 `Ok(None)`，请求被丢弃。
  pub async fn analyze<'a, T: WithLabel>(
    &self,
    image: impl Into<Option<&'a RawImage>>,
  ) -> Result<Option<RankedResult<T>>, AnalysisError> {
    let Some(_permit) = self.gate.try_admit() else {
      warn!("已有分析正在进行，忽略本次请求");
      return Ok(None);
    };

    let tensor = self.preprocessor.prepare(image)?;
    let result = self.engine.run(tensor).await?;
    Ok(Some(result))
  }
}

pub trait Task<I, L: RuntimeLoader, O>: Sized {
  type Error;
  fn run_task(
    self,
    input: I,
    engine: &InferenceEngine<L>,
    output: O,
  ) -> impl Future<Output = Result<(), Self::Error>>;
}

/// 单张图像：加载模型、分析、渲染
pub struct OneShotTask<T, const S: u32> {
  _phantom: std::marker::PhantomData<T>,
}

impl<T, const S: u32> Default for OneShotTask<T, S> {
  fn default() -> Self {
    Self {
      _phantom: std::marker::PhantomData,
    }
  }
}

impl<
  T: WithLabel,
  const S: u32,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = RawImage>,
  L: RuntimeLoader,
  O: Render<RawImage, RankedResult<T>, Error = RE>,
> Task<I, L, O> for OneShotTask<T, S>
{
  type Error = anyhow::Error;

  async fn run_task(
    self,
    mut input: I,
    engine: &InferenceEngine<L>,
    output: O,
  ) -> Result<(), Self::Error> {
    info!("开始任务...");
    engine.initialize().await?;
    let image = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功，开始推理...");

    let analyzer = Analyzer::<L, S>::new(engine);
    let result = analyzer
      .analyze::<T>(&image)
      .await?
      .ok_or_else(|| anyhow::anyhow!("分析请求被丢弃"))?;
    output.render_result(&image, &result)?;
    info!("渲染完成");

    Ok(())
  }
}

/// 同一张图像反复推理，统计耗时；模型只加载一次
pub struct RepeatShotTask<T, const S: u32> {
  repeat_times: usize,
  _phantom: std::marker::PhantomData<T>,
}

impl<T, const S: u32> RepeatShotTask<T, S> {
  pub fn new(repeat_times: usize) -> Self {
    Self {
      repeat_times,
      _phantom: std::marker::PhantomData,
    }
  }
}

impl<
  T: WithLabel,
  const S: u32,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = RawImage>,
  L: RuntimeLoader,
  O: Render<RawImage, RankedResult<T>, Error = RE>,
> Task<I, L, O> for RepeatShotTask<T, S>
{
  type Error = anyhow::Error;

  async fn run_task(
    self,
    mut input: I,
    engine: &InferenceEngine<L>,
    output: O,
  ) -> Result<(), Self::Error> {
    if self.repeat_times == 0 {
      anyhow::bail!("重复次数必须大于 0");
    }
    info!("开始任务...");
    engine.initialize().await?;
    let image = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功，开始推理...");

    let tensor = Preprocessor::<S>::default().prepare(&image)?;
    let mut times = Vec::with_capacity(self.repeat_times);
    let mut last = None;
    for i in 0..self.repeat_times {
      let now = std::time::Instant::now();
      let result: RankedResult<T> = engine.run(tensor.clone()).await?;
      let elapsed = now.elapsed();
      info!("({})推理完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);
      last = Some(result);
    }

    if let Some(result) = last {
      output.render_result(&image, &result)?;
    }

    // 前两次包含预热开销，不计入平均
    let warm: Vec<Duration> = times.iter().skip(2).copied().collect();
    if !warm.is_empty() {
      warn!(
        "平均推理时间: {:.2?}",
        warm.iter().sum::<Duration>() / warm.len() as u32
      );
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gate_admits_one_at_a_time() {
    let gate = AdmissionGate::default();
    let first = gate.try_admit();
    assert!(first.is_some());
    assert!(gate.is_busy());
    assert!(gate.try_admit().is_none());

    drop(first);
    assert!(!gate.is_busy());
    assert!(gate.try_admit().is_some());
  }

  #[test]
  fn localized_error_messages() {
    let err = AnalysisError::from(InputError::TooLarge {
      size: 6 << 20,
      limit: 5 << 20,
    });
    assert_eq!(
      err.localized(Language::English),
      "File size must be less than 5MB"
    );
    assert_eq!(
      err.localized(Language::Persian),
      "حجم فایل باید کمتر از ۵ مگابایت باشد"
    );

    let err = AnalysisError::from(EngineError::Prediction("boom".to_string()));
    assert_eq!(err.localized(Language::English), "Analysis error: boom");
    assert!(err.is_recoverable());

    let err = AnalysisError::from(EngineError::NotInitialized);
    assert!(!err.is_recoverable());
  }
}
