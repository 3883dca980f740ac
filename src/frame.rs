// 该文件是 Shanan （山南西风） 项目的一部分。
// src/frame.rs - 帧请求与缓冲区解释
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
use tracing::debug;

use crate::input::Orientation;

const PACKED_CHANNELS: usize = 4;

/// 四字节像素排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
  /// iOS 相机的默认排列
  #[default]
  Bgra8,
  /// macOS 相机的默认排列
  Argb8,
  Rgba8,
}

impl PixelFormat {
  /// R, G, B, A 在单个像素内的字节偏移
  pub fn rgba_offsets(&self) -> [usize; 4] {
    match self {
      PixelFormat::Bgra8 => [2, 1, 0, 3],
      PixelFormat::Argb8 => [1, 2, 3, 0],
      PixelFormat::Rgba8 => [0, 1, 2, 3],
    }
  }

  pub fn from_name(name: &str) -> Option<Self> {
    match name.to_ascii_lowercase().as_str() {
      "bgra8" | "bgra" => Some(PixelFormat::Bgra8),
      "argb8" | "argb" => Some(PixelFormat::Argb8),
      "rgba8" | "rgba" => Some(PixelFormat::Rgba8),
      _ => None,
    }
  }
}

/// 调用方声明的图像尺寸
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageSize {
  pub width: f64,
  pub height: f64,
}

impl ImageSize {
  pub fn new(width: f64, height: f64) -> Self {
    Self { width, height }
  }

  /// 向下取整后的像素宽高；任一维度为零、负数或非有限值时返回 `None`
  pub fn pixel_dims(&self) -> Option<(usize, usize)> {
    let floor = |v: f64| {
      if v.is_finite() && v >= 1.0 {
        Some(v.floor() as usize)
      } else {
        None
      }
    };
    Some((floor(self.width)?, floor(self.height)?))
  }

  /// 坐标投影使用的整数尺寸，无效维度按 0 处理
  pub fn projection_dims(&self) -> (f64, f64) {
    let floor = |v: f64| if v.is_finite() && v > 0.0 { v.floor() } else { 0.0 };
    (floor(self.width), floor(self.height))
  }
}

/// 单次调用的输入，仅在调用期间借用
#[derive(Debug, Clone, Copy)]
pub struct FrameRequest<'a> {
  pub bytes: &'a [u8],
  pub size: ImageSize,
  pub orientation_name: &'a str,
  pub pixel_format: PixelFormat,
}

impl<'a> FrameRequest<'a> {
  pub fn new(bytes: &'a [u8], size: ImageSize, orientation_name: &'a str) -> Self {
    Self {
      bytes,
      size,
      orientation_name,
      pixel_format: PixelFormat::default(),
    }
  }

  pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
    self.pixel_format = pixel_format;
    self
  }

  pub fn orientation(&self) -> Orientation {
    Orientation::resolve(self.orientation_name)
  }

  pub fn decoded(&self) -> DecodedImage<'a> {
    interpret(self.bytes, self.size, self.pixel_format)
  }
}

/// 统一的可解码图像视图
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedImage<'a> {
  /// 紧密排列的像素，每像素四字节，无行填充
  Packed {
    bytes: &'a [u8],
    stride: usize,
    width: usize,
    height: usize,
    format: PixelFormat,
  },
  /// 自描述的编码容器（PNG、JPEG 等）
  Encoded { bytes: &'a [u8] },
}

impl<'a> DecodedImage<'a> {
  pub fn bytes(&self) -> &'a [u8] {
    match self {
      DecodedImage::Packed { bytes, .. } | DecodedImage::Encoded { bytes } => bytes,
    }
  }

  pub fn is_packed(&self) -> bool {
    matches!(self, DecodedImage::Packed { .. })
  }
}

/// 根据字节数判断缓冲区是紧密像素还是编码图像。
///
/// 这是字节数启发式判断，不检查像素排列是否真的与 `format` 一致。
pub fn interpret(bytes: &[u8], size: ImageSize, format: PixelFormat) -> DecodedImage<'_> {
  let packed = size.pixel_dims().and_then(|(width, height)| {
    let expected = width
      .checked_mul(height)?
      .checked_mul(PACKED_CHANNELS)?;
    (bytes.len() == expected).then_some((width, height))
  });

  match packed {
    Some((width, height)) => {
      debug!("缓冲区按紧密像素解释: {}x{} {:?}", width, height, format);
      DecodedImage::Packed {
        bytes,
        stride: width * PACKED_CHANNELS,
        width,
        height,
        format,
      }
    }
    None => {
      debug!(
        "缓冲区按编码图像解释: {} 字节, 声明尺寸 {}x{}",
        bytes.len(),
        size.width,
        size.height
      );
      DecodedImage::Encoded { bytes }
    }
  }
}
