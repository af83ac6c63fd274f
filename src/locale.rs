// 该文件是 BrainVision （脑视） 项目的一部分。
// src/locale.rs - 界面语言（英语 / 波斯语）
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

use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
  #[default]
  English,
  Persian,
}

#[derive(Error, Debug)]
#[error("不支持的语言: {0}")]
pub struct UnknownLanguage(String);

impl Language {
  pub fn code(&self) -> &'static str {
    match self {
      Language::English => "en",
      Language::Persian => "fa",
    }
  }

  /// 文本方向
  pub fn dir(&self) -> &'static str {
    match self {
      Language::English => "ltr",
      Language::Persian => "rtl",
    }
  }

  pub fn toggled(&self) -> Self {
    match self {
      Language::English => Language::Persian,
      Language::Persian => Language::English,
    }
  }

  /// 按当前语言二选一
  pub fn pick<'a>(&self, en: &'a str, fa: &'a str) -> &'a str {
    match self {
      Language::English => en,
      Language::Persian => fa,
    }
  }
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

impl FromStr for Language {
  type Err = UnknownLanguage;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "en" | "english" => Ok(Language::English),
      "fa" | "persian" | "farsi" => Ok(Language::Persian),
      other => Err(UnknownLanguage(other.to_string())),
    }
  }
}

/// 面向用户的本地化文本
pub trait Localized {
  fn localized(&self, lang: Language) -> String;
}

pub fn disclaimer(lang: Language) -> &'static str {
  lang.pick(
    "Disclaimer: These results are generated by AI and should not replace medical diagnosis.",
    "توجه: این نتایج توسط هوش مصنوعی تولید شده و جایگزین تشخیص پزشک نیست.",
  )
}
