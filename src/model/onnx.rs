// 该文件是 BrainVision （脑视） 项目的一部分。
// src/model/onnx.rs - ONNX Runtime 推理后端
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
  borrow::Cow,
  path::{Path, PathBuf},
};

use ort::{
  execution_providers::CPUExecutionProvider,
  session::{Session, SessionInputs, builder::GraphOptimizationLevel},
  value::TensorRef,
};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{BRAIN_VISION_INPUT_SIZE, InputTensor},
  model::{ModelLoadError, Runtime, RuntimeLoader},
  url_file_path, url_host, url_query,
};

const DEFAULT_MODEL_PATH: &str = "model/BrainVision-model.onnx";
const DEFAULT_INPUT_NAME: &str = "inputs";
const DEFAULT_OUTPUT_NAME: &str = "output_0";

/// 模型部署常量，必须与模型文件完全一致
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
  pub model_path: PathBuf,
  pub input_name: String,
  pub output_name: String,
  pub input_size: u32,
}

impl Default for ModelConfig {
  fn default() -> Self {
    Self {
      model_path: PathBuf::from(DEFAULT_MODEL_PATH),
      input_name: DEFAULT_INPUT_NAME.to_string(),
      output_name: DEFAULT_OUTPUT_NAME.to_string(),
      input_size: BRAIN_VISION_INPUT_SIZE,
    }
  }
}

impl FromUrlWithScheme for ModelConfig {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for ModelConfig {
  type Error = ModelLoadError;

  /// `onnx:///path/model.onnx?input=inputs&output=output_0&size=224`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ModelLoadError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    if let Some(host) = url_host(url) {
      return Err(ModelLoadError::ModelPathError(format!(
        "模型地址不能带主机名 '{}', 请使用 {}:///绝对路径",
        host,
        Self::SCHEME
      )));
    }

    let path = url_file_path(url);
    if path.is_empty() || path == "/" {
      return Err(ModelLoadError::ModelPathError("模型路径为空".to_string()));
    }

    let defaults = ModelConfig::default();
    let input_size = match url_query(url, "size") {
      Some(size) => size
        .parse()
        .map_err(|_| ModelLoadError::ModelPathError(format!("无效的输入尺寸: {}", size)))?,
      None => defaults.input_size,
    };

    Ok(ModelConfig {
      model_path: PathBuf::from(path),
      input_name: url_query(url, "input").unwrap_or(defaults.input_name),
      output_name: url_query(url, "output").unwrap_or(defaults.output_name),
      input_size,
    })
  }
}

/// 构造 ONNX Runtime 会话：CPU 执行、全量图优化
#[derive(Debug, Clone)]
pub struct OnnxLoader<const S: u32 = BRAIN_VISION_INPUT_SIZE> {
  config: ModelConfig,
}

impl<const S: u32> OnnxLoader<S> {
  pub fn new(config: ModelConfig) -> Result<Self, ModelLoadError> {
    if config.input_size != S {
      error!(
        "模型输入尺寸配置为 {}, 但预处理尺寸为 {}",
        config.input_size, S
      );
      return Err(ModelLoadError::SizeMismatch {
        expected: S,
        actual: config.input_size,
      });
    }
    Ok(Self { config })
  }

  pub fn config(&self) -> &ModelConfig {
    &self.config
  }
}

impl<const S: u32> FromUrl for OnnxLoader<S> {
  type Error = ModelLoadError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    Self::new(ModelConfig::from_url(url)?)
  }
}

fn build_session(artifact: &[u8]) -> Result<Session, ort::Error> {
  let session = Session::builder()?
    .with_execution_providers([CPUExecutionProvider::default().build()])?
    .with_optimization_level(GraphOptimizationLevel::Level3)?
    .commit_from_memory(artifact)?;
  Ok(session)
}

impl<const S: u32> RuntimeLoader for OnnxLoader<S> {
  type Runtime = OnnxRuntime;

  fn artifact(&self) -> &Path {
    &self.config.model_path
  }

  fn load(&self, artifact: &[u8]) -> Result<Self::Runtime, ModelLoadError> {
    info!("创建 ONNX Runtime 推理会话");
    let session = build_session(artifact).map_err(|e| {
      error!("创建推理会话失败: {}", e);
      ModelLoadError::Runtime(e.to_string())
    })?;

    let inputs: Vec<&str> = session.inputs.iter().map(|i| i.name.as_str()).collect();
    let outputs: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
    debug!("模型输入: {:?}", inputs);
    debug!("模型输出: {:?}", outputs);

    if !inputs.contains(&self.config.input_name.as_str()) {
      error!("模型中没有名为 {} 的输入", self.config.input_name);
      return Err(ModelLoadError::ModelInvalid(format!(
        "模型中没有名为 {} 的输入, 实际输入: {:?}",
        self.config.input_name, inputs
      )));
    }
    if !outputs.contains(&self.config.output_name.as_str()) {
      error!("模型中没有名为 {} 的输出", self.config.output_name);
      return Err(ModelLoadError::ModelInvalid(format!(
        "模型中没有名为 {} 的输出, 实际输出: {:?}",
        self.config.output_name, outputs
      )));
    }

    Ok(OnnxRuntime {
      session,
      input_name: self.config.input_name.clone(),
      output_name: self.config.output_name.clone(),
    })
  }
}

#[derive(Error, Debug)]
pub enum OnnxRuntimeError {
  #[error("ONNX Runtime 错误: {0}")]
  Ort(#[from] ort::Error),
  #[error("模型输出缺失: {0}")]
  MissingOutput(String),
}

pub struct OnnxRuntime {
  session: Session,
  input_name: String,
  output_name: String,
}

impl Runtime for OnnxRuntime {
  type Error = OnnxRuntimeError;

  fn forward<const S: u32>(&mut self, input: &InputTensor<S>) -> Result<Vec<f32>, Self::Error> {
    let dims: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
    let tensor = TensorRef::from_array_view((dims, input.as_nhwc()))?;
    let inputs: SessionInputs<'_, '_, 0> =
      SessionInputs::ValueMap(vec![(Cow::Borrowed(self.input_name.as_str()), tensor.into())]);

    debug!("执行模型推理");
    let outputs = self.session.run(inputs)?;

    let value = outputs
      .get(self.output_name.as_str())
      .ok_or_else(|| OnnxRuntimeError::MissingOutput(self.output_name.clone()))?;
    let (shape, data) = value.try_extract_tensor::<f32>()?;
    debug!("模型输出形状: {:?}", shape);

    Ok(data.to_vec())
  }
}
