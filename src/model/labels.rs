// 该文件是 BrainVision （脑视） 项目的一部分。
// src/model/labels.rs - 诊断类别
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

use crate::{
  locale::{Language, Localized},
  model::WithLabel,
};

/// 参考模型的四个诊断类别，顺序与模型输出一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrainLabel {
  Glioma,
  Meningioma,
  NoTumor,
  Pituitary,
}

impl WithLabel for BrainLabel {
  const LABELS: &'static [Self] = &[
    BrainLabel::Glioma,
    BrainLabel::Meningioma,
    BrainLabel::NoTumor,
    BrainLabel::Pituitary,
  ];

  fn to_label_str(&self) -> String {
    match self {
      BrainLabel::Glioma => "glioma",
      BrainLabel::Meningioma => "meningioma",
      BrainLabel::NoTumor => "notumor",
      BrainLabel::Pituitary => "pituitary",
    }
    .to_string()
  }

  fn to_label_id(&self) -> u32 {
    *self as u32
  }
}

impl Localized for BrainLabel {
  fn localized(&self, lang: Language) -> String {
    let text = match (self, lang) {
      (BrainLabel::Glioma, Language::English) => "Glioma",
      (BrainLabel::Glioma, Language::Persian) => "گلیوما",
      (BrainLabel::Meningioma, Language::English) => "Meningioma",
      (BrainLabel::Meningioma, Language::Persian) => "مننژیوما",
      (BrainLabel::NoTumor, Language::English) => "No Tumor",
      (BrainLabel::NoTumor, Language::Persian) => "بدون تومور",
      (BrainLabel::Pituitary, Language::English) => "Pituitary Tumor",
      (BrainLabel::Pituitary, Language::Persian) => "تومور هیپوفیز",
    };
    text.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_follow_label_order() {
    for (i, label) in BrainLabel::LABELS.iter().enumerate() {
      assert_eq!(label.to_label_id(), i as u32);
      assert_eq!(BrainLabel::from_label_id(i as u32), Some(*label));
    }
    assert_eq!(BrainLabel::from_label_id(4), None);
  }

  #[test]
  fn label_strings_match_deployment() {
    let names: Vec<String> = BrainLabel::LABELS.iter().map(|l| l.to_label_str()).collect();
    assert_eq!(names, ["glioma", "meningioma", "notumor", "pituitary"]);
  }

  #[test]
  fn localized_names() {
    assert_eq!(BrainLabel::NoTumor.localized(Language::English), "No Tumor");
    assert_eq!(BrainLabel::Glioma.localized(Language::Persian), "گلیوما");
  }
}
