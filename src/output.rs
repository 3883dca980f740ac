// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output.rs - 坐标映射与输出定义
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{FromUrl, frame::ImageSize, model::DetectedRegion};

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

mod envelope;
pub use self::envelope::{ResponseEnvelope, assemble};

#[cfg(feature = "json_output")]
mod json_output;
#[cfg(feature = "json_output")]
pub use self::json_output::{JsonFileOutput, JsonOutputError, StdoutOutput};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

/// 单个目标的结果记录，坐标为归一化值，`origin` 为像素坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectResult {
  pub min_x: f64,
  pub max_x: f64,
  pub min_y: f64,
  /// 与 `max_x` 相同，沿用宿主端已有的取值
  pub max_y: f64,
  pub width: f64,
  pub height: f64,
  pub origin: Point,
}

/// 将一个区域映射为结果记录，不做裁剪
pub fn map_region(region: &DetectedRegion, size: ImageSize) -> ObjectResult {
  let rect = &region.bounding_box;
  let (width, height) = size.projection_dims();

  // 归一化空间原点在左下角，投影到像素空间时翻转纵轴
  let origin = Point {
    x: rect.min_x * width,
    y: (1.0 - (rect.min_y + rect.height)) * height,
  };

  ObjectResult {
    min_x: rect.min_x,
    max_x: rect.max_x(),
    min_y: rect.min_y,
    max_y: rect.max_x(),
    width: rect.width,
    height: rect.height,
    origin,
  }
}

/// 按检测器给出的顺序逐个映射
pub fn map_all(regions: &[DetectedRegion], size: ImageSize) -> Vec<ObjectResult> {
  regions.iter().map(|r| map_region(r, size)).collect()
}

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "json_output")]
  #[error("JSON 输出错误: {0}")]
  JsonOutputError(#[from] JsonOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  #[cfg(feature = "json_output")]
  JsonFileOutput(JsonFileOutput),
  #[cfg(feature = "json_output")]
  StdoutOutput(StdoutOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "json_output")]
    {
      use crate::FromUrlWithScheme;

      match url.scheme() {
        JsonFileOutput::SCHEME => {
          let output = JsonFileOutput::from_url(url)?;
          return Ok(OutputWrapper::JsonFileOutput(output));
        }
        StdoutOutput::SCHEME => {
          let output = StdoutOutput::from_url(url)?;
          return Ok(OutputWrapper::StdoutOutput(output));
        }
        _ => {}
      }
    }
    let _ = url;
    Err(OutputError::SchemeMismatch)
  }
}

impl<Frame> Render<Frame, ResponseEnvelope> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &Frame, result: &ResponseEnvelope) -> Result<(), Self::Error> {
    match *self {
      #[cfg(feature = "json_output")]
      OutputWrapper::JsonFileOutput(ref output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      #[cfg(feature = "json_output")]
      OutputWrapper::StdoutOutput(ref output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }
}
