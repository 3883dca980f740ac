// 该文件是 Shanan （山南西风） 项目的一部分。
// src/channel.rs - 宿主方法调用通道绑定
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

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
  frame::{FrameRequest, ImageSize, PixelFormat},
  input::Orientation,
  model::Detector,
  task::convert,
};

pub const PROCESS_METHOD: &str = "process";
pub const MISSING_IMAGE_MESSAGE: &str = "Couldn't find image data";

/// 宿主传入的一次方法调用
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
  pub method: String,
  pub arguments: Value,
}

impl MethodCall {
  pub fn new(method: impl Into<String>, arguments: Value) -> Self {
    Self {
      method: method.into(),
      arguments,
    }
  }

  /// 构造一次 `process` 调用
  pub fn process(image: &[u8], width: f64, height: f64, orientation: Option<&str>) -> Self {
    let mut arguments = serde_json::json!({
      "image": image,
      "width": width,
      "height": height,
    });
    if let Some(orientation) = orientation {
      arguments["orientation"] = Value::from(orientation);
    }
    Self::new(PROCESS_METHOD, arguments)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
  /// 结构化的响应封装
  Success(Value),
  /// 传输层拒绝，未构造响应封装
  Rejected(String),
  NotImplemented,
}

pub struct ObjectTrackingChannel<D> {
  detector: D,
  pixel_format: PixelFormat,
}

impl<D: Detector> ObjectTrackingChannel<D> {
  pub fn new(detector: D) -> Self {
    Self {
      detector,
      pixel_format: PixelFormat::default(),
    }
  }

  /// 由宿主平台决定像素排列
  pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
    self.pixel_format = pixel_format;
    self
  }

  pub fn handle(&self, call: &MethodCall) -> MethodResponse {
    match call.method.as_str() {
      PROCESS_METHOD => self.process(&call.arguments),
      other => {
        debug!("未实现的方法: {}", other);
        MethodResponse::NotImplemented
      }
    }
  }

  fn process(&self, arguments: &Value) -> MethodResponse {
    let Some(image) = image_bytes(arguments) else {
      warn!("调用缺少图像数据");
      return MethodResponse::Rejected(MISSING_IMAGE_MESSAGE.to_string());
    };

    let number = |key: &str| arguments.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    let size = ImageSize::new(number("width"), number("height"));
    let orientation = arguments
      .get("orientation")
      .and_then(Value::as_str)
      .unwrap_or(Orientation::default().name());

    let request = FrameRequest::new(&image, size, orientation).with_pixel_format(self.pixel_format);
    MethodResponse::Success(convert(&request, &self.detector).to_json())
  }
}

fn image_bytes(arguments: &Value) -> Option<Vec<u8>> {
  let image = arguments.get("image")?;
  if !image.is_array() {
    return None;
  }
  // 直接从借用的值反序列化，避免复制整个数组
  Vec::<u8>::deserialize(image).ok()
}
