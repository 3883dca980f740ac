// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model.rs - 检测器接口与调用
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

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{frame::DecodedImage, input::Orientation};

/// 单位正方形内的矩形，原点位于左下角
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedRect {
  pub min_x: f64,
  pub min_y: f64,
  pub width: f64,
  pub height: f64,
}

impl NormalizedRect {
  pub fn new(min_x: f64, min_y: f64, width: f64, height: f64) -> Self {
    Self {
      min_x,
      min_y,
      width,
      height,
    }
  }

  pub fn max_x(&self) -> f64 {
    self.min_x + self.width
  }

  pub fn max_y(&self) -> f64 {
    self.min_y + self.height
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedRegion {
  pub bounding_box: NormalizedRect,
}

impl From<NormalizedRect> for DetectedRegion {
  fn from(bounding_box: NormalizedRect) -> Self {
    Self { bounding_box }
  }
}

#[derive(Debug, Clone, Default)]
pub struct DetectResult {
  pub items: Box<[DetectedRegion]>,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

impl From<Vec<DetectedRegion>> for DetectResult {
  fn from(items: Vec<DetectedRegion>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

/// 检测失败，对本次调用是终止性的
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
  /// 检测器运行后报告失败
  #[error("{0}")]
  NoObjectDetected(String),
  /// 输入无法被检测器接受
  #[error("{0}")]
  DataCorrupted(String),
}

impl DetectorError {
  pub fn code(&self) -> &'static str {
    match self {
      DetectorError::NoObjectDetected(_) => "No Object Detected",
      DetectorError::DataCorrupted(_) => "Data Corrupted",
    }
  }

  pub fn message(&self) -> &str {
    match self {
      DetectorError::NoObjectDetected(message) | DetectorError::DataCorrupted(message) => message,
    }
  }
}

/// 目标区域检测能力，由宿主注入
pub trait Detector {
  type Error: Into<DetectorError>;

  fn detect(
    &self,
    image: &DecodedImage<'_>,
    orientation: Orientation,
  ) -> Result<DetectResult, Self::Error>;
}

impl<D: Detector + ?Sized> Detector for &D {
  type Error = D::Error;

  fn detect(
    &self,
    image: &DecodedImage<'_>,
    orientation: Orientation,
  ) -> Result<DetectResult, Self::Error> {
    (**self).detect(image, orientation)
  }
}

/// 同步执行一次检测，不重试，不缓存
pub fn invoke<D: Detector + ?Sized>(
  detector: &D,
  image: &DecodedImage<'_>,
  orientation: Orientation,
) -> Result<Vec<DetectedRegion>, DetectorError> {
  debug!("开始检测, 方向: {}, 紧密像素: {}", orientation, image.is_packed());
  let now = Instant::now();
  let result = detector.detect(image, orientation).map_err(Into::into);
  let elapsed = now.elapsed();

  match result {
    Ok(result) => {
      info!("检测完成，耗时: {:.2?}, 区域数: {}", elapsed, result.len());
      Ok(result.items.into_vec())
    }
    Err(e) => {
      warn!("检测失败 ({}): {}", e.code(), e.message());
      Err(e)
    }
  }
}

#[cfg(feature = "region_detector")]
mod region;
#[cfg(feature = "region_detector")]
pub use self::region::{RegionDetector, RegionDetectorBuilder, RegionDetectorError};
