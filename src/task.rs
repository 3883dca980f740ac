// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 帧到检测结果的转换流程
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

use tracing::info;

use crate::{
  frame::FrameRequest,
  input::InputFrame,
  model::{Detector, invoke},
  output::{Render, ResponseEnvelope, assemble, map_all},
};

/// 处理一帧：解释缓冲区、解析方向、检测一次、映射坐标并封装结果。
///
/// 调用之间不共享状态；检测期间会阻塞当前线程。
pub fn convert<D: Detector + ?Sized>(request: &FrameRequest<'_>, detector: &D) -> ResponseEnvelope {
  let image = request.decoded();
  let orientation = request.orientation();

  let result = invoke(detector, &image, orientation).map(|regions| map_all(&regions, request.size));
  assemble(result, request.size)
}

pub trait Task<I, D, O>: Sized {
  type Error;
  fn run_task(self, input: I, detector: D, output: O) -> Result<(), Self::Error>;
}

pub struct OneShotTask;

impl<
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = InputFrame>,
  D: Detector,
  O: Render<InputFrame, ResponseEnvelope, Error = RE>,
> Task<I, D, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, detector: D, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!(
      "输入帧获取成功: {} 字节, {}x{}, 方向 {}",
      frame.bytes.len(),
      frame.size.width,
      frame.size.height,
      frame.orientation
    );

    let now = std::time::Instant::now();
    let envelope = convert(&frame.as_request(), &detector);
    info!("转换完成，耗时: {:.2?}", now.elapsed());

    output.render_result(&frame, &envelope)?;
    info!("输出完成");

    Ok(())
  }
}
