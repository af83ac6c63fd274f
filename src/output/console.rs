// 该文件是 BrainVision （脑视） 项目的一部分。
// src/output/console.rs - 控制台诊断报告
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

use std::{fmt::Write as _, io::Write as _};

use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::RawImage,
  locale::{Language, Localized, disclaimer},
  model::{RankedResult, WithLabel},
  output::{Render, percent},
  url_query,
};

#[derive(Error, Debug)]
pub enum ConsoleOutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("结果为空")]
  EmptyResult,
}

/// 把诊断结果打印到标准输出
#[derive(Debug, Clone, Default)]
pub struct ConsoleOutput {
  lang: Language,
}

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = ConsoleOutputError;

  /// `console://` 或 `console://?lang=fa`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ConsoleOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let lang = url_query(url, "lang")
      .and_then(|code| code.parse().ok())
      .unwrap_or_default();
    Ok(ConsoleOutput { lang })
  }
}

impl ConsoleOutput {
  pub fn with_language(mut self, lang: Language) -> Self {
    self.lang = lang;
    self
  }
}

/// 生成诊断报告文本：最终诊断、置信度、全部类别的概率与免责声明
pub fn format_report<T: WithLabel + Localized>(
  result: &RankedResult<T>,
  lang: Language,
) -> Option<String> {
  let primary = result.top()?;
  let mut report = String::new();

  // 写入 String 不会失败
  let _ = writeln!(
    report,
    "{} {}",
    lang.pick("Final Diagnosis:", "تشخیص نهایی:"),
    primary.kind.localized(lang)
  );
  let _ = writeln!(
    report,
    "{} {:.1}%",
    lang.pick("Confidence:", "میزان اطمینان:"),
    primary.confidence * 100.0
  );
  let _ = writeln!(report, "{}", lang.pick("All Predictions:", "همه احتمالات:"));
  for item in result.iter() {
    let _ = writeln!(
      report,
      "  {:<16} {:>5.1}%",
      item.kind.localized(lang),
      percent(item.confidence)
    );
  }
  let _ = writeln!(report, "{}", disclaimer(lang));

  Some(report)
}

impl<T: WithLabel + Localized> Render<RawImage, RankedResult<T>> for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn render_result(&self, _frame: &RawImage, result: &RankedResult<T>) -> Result<(), Self::Error> {
    let report = format_report(result, self.lang).ok_or(ConsoleOutputError::EmptyResult)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(report.as_bytes())?;
    stdout.flush()?;
    Ok(())
  }
}
