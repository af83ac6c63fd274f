// 该文件是 BrainVision （脑视） 项目的一部分。
// src/output/json_record.rs - 诊断结果 JSON 记录
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
  path::{Path, PathBuf},
  sync::atomic::{AtomicU16, Ordering},
};

use chrono::{Datelike, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::RawImage,
  locale::{Language, Localized},
  model::{RankedResult, WithLabel},
  output::Render,
  url_file_path, url_host, url_query,
};

#[derive(Error, Debug)]
pub enum JsonRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("记录地址不能带主机名: {0}")]
  UnexpectedHost(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
pub struct PredictionRecord {
  pub label: String,
  pub id: u32,
  pub name: String,
  pub confidence: f32,
}

#[derive(Debug, Serialize)]
struct DiagnosisRecord {
  timestamp: String,
  width: u32,
  height: u32,
  language: &'static str,
  diagnosis: Option<PredictionRecord>,
  predictions: Vec<PredictionRecord>,
}

/// 将诊断结果写成 JSON。
///
/// 路径以 `.json` 结尾时写入该文件；否则视为目录，按日期分目录保存。
pub struct JsonRecordOutput {
  path: PathBuf,
  lang: Language,
  counter: AtomicU16,
}

impl FromUrlWithScheme for JsonRecordOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonRecordOutputError::SchemeMismatch);
    }
    if let Some(host) = url_host(url) {
      return Err(JsonRecordOutputError::UnexpectedHost(host.to_string()));
    }

    let lang = url_query(url, "lang")
      .and_then(|code| code.parse().ok())
      .unwrap_or_default();
    Ok(JsonRecordOutput::new(url_file_path(url)).with_language(lang))
  }
}

impl JsonRecordOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      lang: Language::default(),
      counter: AtomicU16::new(0),
    }
  }

  pub fn with_language(mut self, lang: Language) -> Self {
    self.lang = lang;
    self
  }

  fn record_path(&self) -> Result<PathBuf, std::io::Error> {
    if self.path.extension().is_some_and(|ext| ext == "json") {
      if let Some(parent) = self.path.parent()
        && !parent.as_os_str().is_empty()
      {
        std::fs::create_dir_all(parent)?;
      }
      return Ok(self.path.clone());
    }

    let now = Utc::now();
    let directory = self
      .path
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    let id = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
    Ok(directory.join(format!("{}-{:04X}.json", now.format("%H-%M-%S"), id)))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

fn prediction<T: WithLabel + Localized>(
  kind: &T,
  confidence: f32,
  lang: Language,
) -> PredictionRecord {
  PredictionRecord {
    label: kind.to_label_str(),
    id: kind.to_label_id(),
    name: kind.localized(lang),
    confidence,
  }
}

impl<T: WithLabel + Localized> Render<RawImage, RankedResult<T>> for JsonRecordOutput {
  type Error = JsonRecordOutputError;

  fn render_result(&self, frame: &RawImage, result: &RankedResult<T>) -> Result<(), Self::Error> {
    let record = DiagnosisRecord {
      timestamp: Utc::now().to_rfc3339(),
      width: frame.width(),
      height: frame.height(),
      language: self.lang.code(),
      diagnosis: result
        .top()
        .map(|top| prediction(&top.kind, top.confidence, self.lang)),
      predictions: result
        .iter()
        .map(|item| prediction(&item.kind, item.confidence, self.lang))
        .collect(),
    };

    let path = self.record_path()?;
    std::fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
    info!("保存诊断记录到文件: {}", path.display());

    Ok(())
  }
}
