// 该文件是 BrainVision （脑视） 项目的一部分。
// src/input/preprocess.rs - 图像到模型输入张量的预处理
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

use image::imageops::{self, FilterType};
use tracing::debug;

use crate::{
  frame::{BRAIN_VISION_INPUT_SIZE, InputTensor, RGB_CHANNELS},
  input::{InputError, RawImage},
};

// ITU-R BT.601 亮度系数
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// 把任意尺寸的图像变成 `[1, S, S, 3]` 的灰度张量。
///
/// 直接拉伸到 `S×S`，不保持宽高比；忽略 alpha 通道。
#[derive(Debug, Clone)]
pub struct Preprocessor<const S: u32> {
  filter: FilterType,
}

pub type BrainVisionPreprocessor = Preprocessor<BRAIN_VISION_INPUT_SIZE>;

impl<const S: u32> Default for Preprocessor<S> {
  fn default() -> Self {
    // 双线性，与浏览器 canvas 缩放一致
    Self {
      filter: FilterType::Triangle,
    }
  }
}

impl<const S: u32> Preprocessor<S> {
  pub fn with_filter(mut self, filter: FilterType) -> Self {
    self.filter = filter;
    self
  }

  /// 预处理一张图像。`None` 表示调用方手里没有图像。
  pub fn prepare<'a>(
    &self,
    image: impl Into<Option<&'a RawImage>>,
  ) -> Result<InputTensor<S>, InputError> {
    let image = image.into().ok_or(InputError::MissingImage)?;
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
      return Err(InputError::EmptyImage { width, height });
    }

    debug!("预处理图像: {}x{} -> {}x{}", width, height, S, S);
    let resized = imageops::resize(image.as_rgba(), S, S, self.filter);

    let mut tensor = InputTensor::<S>::default();
    let slice = tensor.as_mut();
    // ImageBuffer 的像素迭代按行优先，正好对应 (row, col, channel)
    for (pixel, out) in resized.pixels().zip(slice.chunks_exact_mut(RGB_CHANNELS)) {
      let [r, g, b, _] = pixel.0;
      out.fill(luminance(r, g, b));
    }

    Ok(tensor)
  }
}

/// 归一化亮度 `Y / 255`，夹在 `[0, 1]`
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
  let y = LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32;
  (y / 255.0).clamp(0.0, 1.0)
}
