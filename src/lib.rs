// 该文件是 BrainVision （脑视） 项目的一部分。
// src/lib.rs - 库主文件
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

pub mod frame;
pub mod input;
pub mod locale;
pub mod model;
pub mod output;
pub mod task;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 从 URL 中取出文件路径（已做百分号解码）
pub(crate) fn url_file_path(url: &url::Url) -> String {
  let path = url.path();
  match urlencoding::decode(path) {
    Ok(decoded) => decoded.into_owned(),
    Err(_) => path.to_string(),
  }
}

/// 文件类 URL 不允许带主机名：`onnx://model/x.onnx` 会把 `model` 当成主机
pub(crate) fn url_host(url: &url::Url) -> Option<&str> {
  url.host_str().filter(|host| !host.is_empty())
}

/// 读取 URL 查询参数中的某个键
pub(crate) fn url_query(url: &url::Url, key: &str) -> Option<String> {
  url
    .query_pairs()
    .find(|(k, _)| k == key)
    .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_path_is_percent_decoded() {
    let url = url::Url::parse("image:///data/scan%20one.png").unwrap();
    assert_eq!(url_file_path(&url), "/data/scan one.png");
  }

  #[test]
  fn host_is_reported_only_when_present() {
    let url = url::Url::parse("image:///data/scan.png").unwrap();
    assert_eq!(url_host(&url), None);
    let url = url::Url::parse("image://data/scan.png").unwrap();
    assert_eq!(url_host(&url), Some("data"));
  }

  #[test]
  fn query_lookup_returns_first_match() {
    let url = url::Url::parse("onnx:///m.onnx?input=inputs&output=output_0").unwrap();
    assert_eq!(url_query(&url, "input").as_deref(), Some("inputs"));
    assert_eq!(url_query(&url, "output").as_deref(), Some("output_0"));
    assert_eq!(url_query(&url, "size"), None);
  }
}
