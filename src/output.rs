// 该文件是 BrainVision （脑视） 项目的一部分。
// src/output.rs - 输出定义
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

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::RawImage,
  locale::{Language, Localized},
  model::{RankedResult, WithLabel},
};

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

mod console;
#[cfg(feature = "json_record")]
mod json_record;

pub use self::console::{ConsoleOutput, ConsoleOutputError, format_report};
#[cfg(feature = "json_record")]
pub use self::json_record::{JsonRecordOutput, JsonRecordOutputError, PredictionRecord};

/// 百分比，保留一位小数
pub fn percent(confidence: f32) -> f32 {
  (confidence * 1000.0).round() / 10.0
}

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("控制台输出错误: {0}")]
  ConsoleOutputError(#[from] ConsoleOutputError),
  #[cfg(feature = "json_record")]
  #[error("JSON 记录输出错误: {0}")]
  JsonRecordOutputError(#[from] JsonRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  ConsoleOutput(ConsoleOutput),
  #[cfg(feature = "json_record")]
  JsonRecordOutput(JsonRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      ConsoleOutput::SCHEME => Ok(OutputWrapper::ConsoleOutput(ConsoleOutput::from_url(url)?)),
      #[cfg(feature = "json_record")]
      JsonRecordOutput::SCHEME => Ok(OutputWrapper::JsonRecordOutput(
        JsonRecordOutput::from_url(url)?,
      )),
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl OutputWrapper {
  /// 覆盖输出语言
  pub fn with_language(self, lang: Language) -> Self {
    match self {
      OutputWrapper::ConsoleOutput(output) => {
        OutputWrapper::ConsoleOutput(output.with_language(lang))
      }
      #[cfg(feature = "json_record")]
      OutputWrapper::JsonRecordOutput(output) => {
        OutputWrapper::JsonRecordOutput(output.with_language(lang))
      }
    }
  }
}

impl<T: WithLabel + Localized> Render<RawImage, RankedResult<T>> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &RawImage, result: &RankedResult<T>) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::ConsoleOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      #[cfg(feature = "json_record")]
      OutputWrapper::JsonRecordOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn percent_rounds_to_one_decimal() {
    assert_eq!(percent(0.93456), 93.5);
    assert_eq!(percent(0.0), 0.0);
    assert_eq!(percent(1.0), 100.0);
  }

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = Url::parse("rtsp://localhost/stream").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Err(OutputError::SchemeMismatch)
    ));
  }
}
