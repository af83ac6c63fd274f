// 该文件是 BrainVision （脑视） 项目的一部分。
// src/input/upload.rs - 上传文件的类型与大小检查
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

use tracing::{debug, error};

use crate::input::{InputError, RawImage};

/// 上传大小上限：5 MiB
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// 用户提交的文件：声明的 MIME 类型与原始字节
#[derive(Debug, Clone)]
pub struct Upload {
  pub mime_type: Option<String>,
  pub bytes: Vec<u8>,
}

impl Upload {
  pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
    Self {
      mime_type: Some(mime_type.into()),
      bytes,
    }
  }

  /// 根据文件内容嗅探 MIME 类型；无法识别时类型为空
  pub fn sniffed(bytes: Vec<u8>) -> Self {
    let mime_type = image::guess_format(&bytes)
      .ok()
      .map(|format| format.to_mime_type().to_string());
    Self { mime_type, bytes }
  }
}

#[derive(Debug, Clone)]
pub struct UploadPolicy {
  max_bytes: usize,
}

impl Default for UploadPolicy {
  fn default() -> Self {
    Self {
      max_bytes: MAX_UPLOAD_BYTES,
    }
  }
}

impl UploadPolicy {
  pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
    self.max_bytes = max_bytes;
    self
  }

  pub fn max_bytes(&self) -> usize {
    self.max_bytes
  }

  /// 只检查类型与大小，不解码
  pub fn check(&self, upload: &Upload) -> Result<(), InputError> {
    let mime = upload.mime_type.as_deref().unwrap_or_default();
    if !mime.starts_with("image/") {
      error!("拒绝非图像文件: {:?}", upload.mime_type);
      return Err(InputError::NotAnImage(mime.to_string()));
    }

    if upload.bytes.len() > self.max_bytes {
      error!(
        "文件过大: {} 字节，上限 {} 字节",
        upload.bytes.len(),
        self.max_bytes
      );
      return Err(InputError::TooLarge {
        size: upload.bytes.len(),
        limit: self.max_bytes,
      });
    }

    Ok(())
  }

  /// 检查通过后解码为位图
  pub fn admit(&self, upload: &Upload) -> Result<RawImage, InputError> {
    self.check(upload)?;
    let image = RawImage::decode(&upload.bytes)?;
    debug!(
      "已接收上传图像: {} 字节, {}x{}",
      upload.bytes.len(),
      image.width(),
      image.height()
    );
    Ok(image)
  }
}
