// 该文件是 BrainVision （脑视） 项目的一部分。
// src/input.rs - 图像输入与预处理
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

use image::RgbaImage;
use thiserror::Error;

mod preprocess;
mod read_image_file;
mod upload;

pub use self::preprocess::{BrainVisionPreprocessor, Preprocessor};
pub use self::read_image_file::ImageFileInput;
pub use self::upload::{MAX_UPLOAD_BYTES, Upload, UploadPolicy};

/// 输入非法（图像缺失、尺寸为零、无法解码、上传不合规）
#[derive(Error, Debug)]
pub enum InputError {
  #[error("no image provided")]
  MissingImage,
  #[error("image has zero dimensions: {width}x{height}")]
  EmptyImage { width: u32, height: u32 },
  #[error("image decoding error: {0}")]
  Decode(#[from] image::ImageError),
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
  #[error("not an image file: {0}")]
  NotAnImage(String),
  #[error("file too large: {size} bytes (limit {limit} bytes)")]
  TooLarge { size: usize, limit: usize },
  #[error("tensor length mismatch: expected {expected}, found {actual}")]
  TensorLength { expected: usize, actual: usize },
  #[error("URI scheme mismatch")]
  SchemeMismatch,
  #[error("image URL must not have a host, found '{0}' (use image:///absolute/path)")]
  UnexpectedHost(String),
}

/// 解码后的位图，任意尺寸，RGBA 每通道一个字节
#[derive(Debug, Clone)]
pub struct RawImage {
  image: RgbaImage,
}

impl RawImage {
  /// 从已编码的图像字节解码
  pub fn decode(bytes: &[u8]) -> Result<Self, InputError> {
    if bytes.is_empty() {
      return Err(InputError::MissingImage);
    }
    let image = image::load_from_memory(bytes)?;
    Ok(Self {
      image: image.to_rgba8(),
    })
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn as_rgba(&self) -> &RgbaImage {
    &self.image
  }
}

impl From<RgbaImage> for RawImage {
  fn from(image: RgbaImage) -> Self {
    Self { image }
  }
}

impl From<image::DynamicImage> for RawImage {
  fn from(image: image::DynamicImage) -> Self {
    Self {
      image: image.to_rgba8(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  #[test]
  fn decode_png_bytes() {
    let source = RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(source)
      .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
      .unwrap();

    let decoded = RawImage::decode(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (3, 2));
    assert_eq!(decoded.as_rgba().get_pixel(2, 1).0, [10, 20, 30, 255]);
  }

  #[test]
  fn decode_garbage_fails() {
    let err = RawImage::decode(b"definitely not an image").unwrap_err();
    assert!(matches!(err, InputError::Decode(_)));
  }

  #[test]
  fn decode_empty_is_missing() {
    assert!(matches!(
      RawImage::decode(&[]),
      Err(InputError::MissingImage)
    ));
  }
}
