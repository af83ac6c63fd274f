// 该文件是 BrainVision （脑视） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 同一张图像反复推理，统计耗时
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use brainvision::{
  FromUrl,
  frame::BRAIN_VISION_INPUT_SIZE,
  input::ImageFileInput,
  model::{BrainLabel, InferenceEngine, OnnxLoader},
  output::OutputWrapper,
  task::{RepeatShotTask, Task},
};
use tracing::info;

/// BrainVision 推理耗时测试
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型地址
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, default_value = "console://", value_name = "OUTPUT")]
  pub output: Url,
  /// 重复次数
  #[arg(long, default_value = "100", value_name = "COUNT")]
  pub repeat: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型地址: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input_image = ImageFileInput::from_url(&args.input)?;
  let loader: OnnxLoader<BRAIN_VISION_INPUT_SIZE> = OnnxLoader::from_url(&args.model)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let engine = InferenceEngine::new(loader);
  RepeatShotTask::<BrainLabel, BRAIN_VISION_INPUT_SIZE>::new(args.repeat)
    .run_task(input_image, &engine, output)
    .await?;

  Ok(())
}
