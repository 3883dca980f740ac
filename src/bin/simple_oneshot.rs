// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/simple_oneshot.rs - 单帧目标区域检测
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
use tracing::info;
use url::Url;

use shanan_objtrack::{
  FromUrl,
  input::InputWrapper,
  model::RegionDetectorBuilder,
  output::OutputWrapper,
  task::{OneShotTask, Task},
};

/// 单帧检测参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测器配置，例如 region:///?contrast=48&min_area=0.001
  #[arg(long, value_name = "DETECTOR", default_value = "region:///")]
  pub detector: Url,
  /// 输入来源，例如 image:///path/frame.png?orientation=up&packed
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，json:///path/result.json 或 stdout:-
  #[arg(long, value_name = "OUTPUT", default_value = "stdout:-")]
  pub output: Url,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("检测器配置: {}", args.detector);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = InputWrapper::from_url(&args.input)?;
  let detector = RegionDetectorBuilder::from_url(&args.detector)?.build();
  let output = OutputWrapper::from_url(&args.output)?;

  OneShotTask.run_task(input, detector, output)
}
