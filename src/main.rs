// 该文件是 BrainVision （脑视） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use brainvision::{
  FromUrl,
  frame::BRAIN_VISION_INPUT_SIZE,
  input::ImageFileInput,
  model::{BrainLabel, InferenceEngine, ModelConfig, OnnxLoader},
  output::OutputWrapper,
  task::{OneShotTask, Task},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("BrainVision 脑部 MRI 分类");
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let loader: OnnxLoader<BRAIN_VISION_INPUT_SIZE> = match &args.model {
    Some(url) => {
      info!("模型地址: {}", url);
      OnnxLoader::from_url(url)?
    }
    None => OnnxLoader::new(ModelConfig::default())?,
  };
  info!("模型文件路径: {}", loader.config().model_path.display());

  let input_image = ImageFileInput::from_url(&args.input)?;
  let mut output = OutputWrapper::from_url(&args.output)?;
  if let Some(lang) = args.lang {
    output = output.with_language(lang);
  }

  let engine = InferenceEngine::new(loader);
  OneShotTask::<BrainLabel, BRAIN_VISION_INPUT_SIZE>::default()
    .run_task(input_image, &engine, output)
    .await?;

  Ok(())
}
