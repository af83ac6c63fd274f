// 该文件是 BrainVision （脑视） 项目的一部分。
// src/frame.rs - NHWC 输入张量定义
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

use crate::input::InputError;

pub const RGB_CHANNELS: usize = 3;

/// 参考模型的输入边长
pub const BRAIN_VISION_INPUT_SIZE: u32 = 224;

/// 模型输入张量，形状 `[1, S, S, 3]`，按 (行, 列, 通道) 排列，取值在 `[0, 1]`。
///
/// 每个像素的三个通道保存同一个亮度值。张量只服务一次推理，推理后即被丢弃。
#[derive(Debug, Clone)]
pub struct InputTensor<const S: u32> {
  data: Box<[f32]>,
}

pub type BrainVisionTensor = InputTensor<BRAIN_VISION_INPUT_SIZE>;

impl<const S: u32> InputTensor<S> {
  pub const fn len() -> usize {
    RGB_CHANNELS * S as usize * S as usize
  }

  pub fn shape(&self) -> [usize; 4] {
    [1, S as usize, S as usize, RGB_CHANNELS]
  }

  pub fn height(&self) -> usize {
    S as usize
  }

  pub fn width(&self) -> usize {
    S as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn as_nhwc(&self) -> &[f32] {
    &self.data
  }

  /// 取 (row, col) 位置的三个通道值
  pub fn pixel(&self, row: usize, col: usize) -> Option<[f32; RGB_CHANNELS]> {
    if row >= S as usize || col >= S as usize {
      return None;
    }
    let index = (row * S as usize + col) * RGB_CHANNELS;
    Some([self.data[index], self.data[index + 1], self.data[index + 2]])
  }
}

impl<const S: u32> Default for InputTensor<S> {
  fn default() -> Self {
    Self {
      data: vec![0.0f32; Self::len()].into_boxed_slice(),
    }
  }
}

impl<const S: u32> AsMut<[f32]> for InputTensor<S> {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}

impl<const S: u32> TryFrom<Vec<f32>> for InputTensor<S> {
  type Error = InputError;

  fn try_from(data: Vec<f32>) -> Result<Self, Self::Error> {
    if data.len() != Self::len() {
      return Err(InputError::TensorLength {
        expected: Self::len(),
        actual: data.len(),
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_tensor_has_model_shape() {
    let tensor = BrainVisionTensor::default();
    assert_eq!(tensor.shape(), [1, 224, 224, 3]);
    assert_eq!(tensor.as_nhwc().len(), 224 * 224 * 3);
  }

  #[test]
  fn try_from_rejects_wrong_length() {
    let err = InputTensor::<4>::try_from(vec![0.0; 10]).unwrap_err();
    assert!(matches!(
      err,
      InputError::TensorLength {
        expected: 48,
        actual: 10
      }
    ));
  }

  #[test]
  fn pixel_reads_channel_last_layout() {
    let mut data = vec![0.0; InputTensor::<2>::len()];
    // (row 1, col 0) -> 第 3 个像素
    data[6] = 0.25;
    data[7] = 0.5;
    data[8] = 0.75;
    let tensor = InputTensor::<2>::try_from(data).unwrap();
    assert_eq!(tensor.pixel(1, 0), Some([0.25, 0.5, 0.75]));
    assert_eq!(tensor.pixel(2, 0), None);
  }
}
