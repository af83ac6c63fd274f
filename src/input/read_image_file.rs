// 该文件是 BrainVision （脑视） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use std::path::Path;

use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{InputError, RawImage, Upload, UploadPolicy},
  url_file_path, url_host,
};

/// 从磁盘读取一张图像，按上传规则检查后解码。作为迭代器只产出一帧。
#[derive(Debug)]
pub struct ImageFileInput {
  image: Option<RawImage>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(InputError::SchemeMismatch);
    }
    if let Some(host) = url_host(url) {
      error!("图像地址带有主机名: {}", host);
      return Err(InputError::UnexpectedHost(host.to_string()));
    }

    Self::open(url_file_path(url), &UploadPolicy::default())
  }
}

impl ImageFileInput {
  pub fn open(path: impl AsRef<Path>, policy: &UploadPolicy) -> Result<Self, InputError> {
    let path = path.as_ref();
    info!("读取图像文件: {}", path.display());
    // 先按文件大小拒绝，超限文件不读入内存
    let size = std::fs::metadata(path)?.len();
    if size > policy.max_bytes() as u64 {
      error!("文件过大: {} 字节，上限 {} 字节", size, policy.max_bytes());
      return Err(InputError::TooLarge {
        size: size as usize,
        limit: policy.max_bytes(),
      });
    }
    let bytes = std::fs::read(path)?;
    let image = policy.admit(&Upload::sniffed(bytes))?;

    Ok(ImageFileInput { image: Some(image) })
  }
}

impl Iterator for ImageFileInput {
  type Item = RawImage;

  fn next(&mut self) -> Option<Self::Item> {
    self.image.take()
  }
}
