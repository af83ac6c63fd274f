// 该文件是 BrainVision （脑视） 项目的一部分。
// tests/common/mod.rs - 集成测试公共工具
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

#![allow(dead_code)]

use std::{
  path::{Path, PathBuf},
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use brainvision::{
  frame::InputTensor,
  model::{ModelLoadError, Runtime, RuntimeLoader},
};
use url::Url;

pub fn find_model_path() -> Option<PathBuf> {
  let candidates = vec!["model/BrainVision-model.onnx", "../model/BrainVision-model.onnx"];
  candidates
    .into_iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}

/// 写一张纯色 PNG，返回对应的 `image://` 地址
pub fn write_scan(dir: &Path, name: &str, rgba: [u8; 4], width: u32, height: u32) -> Url {
  let path = dir.join(name);
  image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
    .save(&path)
    .unwrap();
  Url::parse(&format!("image://{}", path.display())).unwrap()
}

#[derive(Debug, thiserror::Error)]
#[error("fake runtime failure")]
pub struct FakeError;

/// 用输入亮度生成 logits：越亮越偏向第一个类别
pub struct BrightnessRuntime {
  delay: Duration,
}

impl Runtime for BrightnessRuntime {
  type Error = FakeError;

  fn forward<const S: u32>(&mut self, input: &InputTensor<S>) -> Result<Vec<f32>, FakeError> {
    std::thread::sleep(self.delay);
    let data = input.as_nhwc();
    if data.is_empty() {
      return Err(FakeError);
    }
    let mean = data.iter().sum::<f32>() / data.len() as f32;
    Ok(vec![mean * 8.0, 1.0, 1.0, 1.0])
  }
}

pub struct BrightnessLoader {
  pub path: PathBuf,
  pub loads: Arc<AtomicUsize>,
  pub delay: Duration,
}

impl BrightnessLoader {
  /// 在临时目录里放一个假的模型文件
  pub fn in_dir(dir: &Path) -> Self {
    let path = dir.join("BrainVision-model.onnx");
    std::fs::write(&path, b"fake model").unwrap();
    Self {
      path,
      loads: Arc::new(AtomicUsize::new(0)),
      delay: Duration::ZERO,
    }
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  pub fn load_count(&self) -> Arc<AtomicUsize> {
    self.loads.clone()
  }
}

impl RuntimeLoader for BrightnessLoader {
  type Runtime = BrightnessRuntime;

  fn artifact(&self) -> &Path {
    &self.path
  }

  fn load(&self, _artifact: &[u8]) -> Result<BrightnessRuntime, ModelLoadError> {
    self.loads.fetch_add(1, Ordering::SeqCst);
    Ok(BrightnessRuntime { delay: self.delay })
  }
}
