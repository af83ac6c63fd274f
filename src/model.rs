// 该文件是 BrainVision （脑视） 项目的一部分。
// src/model.rs - 模型
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

use std::{path::PathBuf, sync::Arc};

use thiserror::Error;

use crate::frame::InputTensor;

/// 固定、有序的类别集合。类别顺序是部署时的约定，与模型输出按下标一一对应。
pub trait WithLabel: Sized + Copy + std::fmt::Debug + Send + Sync + 'static {
  const LABELS: &'static [Self];

  fn to_label_str(&self) -> String;
  fn to_label_id(&self) -> u32;

  fn from_label_id(id: u32) -> Option<Self> {
    Self::LABELS.get(id as usize).copied()
  }
}

/// 推理后端：对一个输入张量做一次前向计算，返回原始 logits
pub trait Runtime: Send + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  fn forward<const S: u32>(&mut self, input: &InputTensor<S>) -> Result<Vec<f32>, Self::Error>;
}

/// 从模型文件内容构造推理后端
pub trait RuntimeLoader: Send + Sync + 'static {
  type Runtime: Runtime;

  /// 模型文件路径
  fn artifact(&self) -> &std::path::Path;

  /// 在阻塞线程中调用
  fn load(&self, artifact: &[u8]) -> Result<Self::Runtime, ModelLoadError>;
}

#[derive(Error, Debug, Clone)]
pub enum ModelLoadError {
  #[error("模型文件读取失败 {path:?}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: Arc<std::io::Error>,
  },
  #[error("模型无效: {0}")]
  ModelInvalid(String),
  #[error("推理运行时错误: {0}")]
  Runtime(String),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("模型输入尺寸不匹配: 期望 {expected}, 实际 {actual}")]
  SizeMismatch { expected: u32, actual: u32 },
  #[error("模型加载任务中断: {0}")]
  Interrupted(String),
}

#[derive(Error, Debug, Clone)]
pub enum EngineError {
  #[error("模型尚未初始化")]
  NotInitialized,
  #[error("模型未就绪: {0}")]
  NotReady(#[source] ModelLoadError),
  #[error("推理失败: {0}")]
  Prediction(String),
}

impl EngineError {
  /// `Prediction` 可以直接重试；未就绪需要重新加载
  pub fn is_recoverable(&self) -> bool {
    matches!(self, EngineError::Prediction(_))
  }

  pub fn is_not_ready(&self) -> bool {
    matches!(self, EngineError::NotInitialized | EngineError::NotReady(_))
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore<T> {
  pub kind: T,
  pub confidence: f32,
}

/// 按置信度降序排列的结果，每个类别恰好出现一次，置信度之和为 1
#[derive(Debug, Clone)]
pub struct RankedResult<T> {
  pub items: Box<[ClassScore<T>]>,
}

impl<T: WithLabel> RankedResult<T> {
  /// 对 logits 做 softmax，并与类别按下标配对后排序
  pub fn from_logits(logits: &[f32]) -> Result<Self, EngineError> {
    if logits.len() != T::LABELS.len() {
      return Err(EngineError::Prediction(format!(
        "模型输出数量 {} 与类别数量 {} 不一致",
        logits.len(),
        T::LABELS.len()
      )));
    }
    if let Some(bad) = logits.iter().find(|v| !v.is_finite()) {
      return Err(EngineError::Prediction(format!("模型输出包含非有限值: {}", bad)));
    }

    let mut items: Vec<_> = T::LABELS
      .iter()
      .zip(softmax(logits))
      .map(|(&kind, confidence)| ClassScore { kind, confidence })
      .collect();
    // 稳定排序：置信度相同时保持类别原有顺序
    items.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    Ok(Self {
      items: items.into_boxed_slice(),
    })
  }

  pub fn top(&self) -> Option<&ClassScore<T>> {
    self.items.first()
  }
}

impl<T> RankedResult<T> {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ClassScore<T>> {
    self.items.iter()
  }
}

/// 数值稳定的 softmax：先减去最大值再取指数
pub fn softmax(logits: &[f32]) -> Vec<f32> {
  let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
  let exps: Vec<f64> = logits.iter().map(|&v| ((v - max) as f64).exp()).collect();
  let sum: f64 = exps.iter().sum();
  exps.into_iter().map(|e| (e / sum) as f32).collect()
}

mod engine;
mod labels;
mod onnx;

pub use self::engine::{EngineState, InferenceEngine};
pub use self::labels::BrainLabel;
pub use self::onnx::{ModelConfig, OnnxLoader, OnnxRuntime};
