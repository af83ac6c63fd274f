// 该文件是 BrainVision （脑视） 项目的一部分。
// src/args.rs - 项目参数配置
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

use brainvision::locale::Language;
use clap::Parser;
use url::Url;

/// BrainVision 脑部 MRI 分类
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型地址，路径必须是绝对路径，例如
  /// onnx:///opt/brainvision/BrainVision-model.onnx?input=inputs&output=output_0
  /// 省略时使用默认部署配置（相对路径 model/BrainVision-model.onnx）
  #[arg(long, value_name = "MODEL")]
  pub model: Option<Url>,

  /// 输入图像，例如 image:///data/scan.png
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出方式:
  /// - 控制台: console://
  /// - JSON 记录: json:///records 或 json:///tmp/report.json
  #[arg(long, default_value = "console://", value_name = "OUTPUT")]
  pub output: Url,

  /// 报告语言 (en / fa)，覆盖输出地址中的 lang 参数
  #[arg(long, value_name = "LANG")]
  pub lang: Option<Language>,
}
