// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/envelope.rs - 响应封装
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

use crate::{frame::ImageSize, model::DetectorError, output::ObjectResult};

/// 每次调用唯一的返回值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum ResponseEnvelope {
  #[serde(rename = "noData")]
  NoData,
  #[serde(rename = "object")]
  Objects {
    data: Vec<ObjectResult>,
    #[serde(rename = "imageSize")]
    image_size: ImageSize,
  },
  #[serde(rename = "error")]
  Error { code: String, message: String },
}

impl ResponseEnvelope {
  pub fn is_no_data(&self) -> bool {
    matches!(self, ResponseEnvelope::NoData)
  }

  pub fn to_json(&self) -> serde_json::Value {
    // 该类型的序列化不会失败
    serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
  }
}

impl From<DetectorError> for ResponseEnvelope {
  fn from(err: DetectorError) -> Self {
    ResponseEnvelope::Error {
      code: err.code().to_string(),
      message: err.message().to_string(),
    }
  }
}

/// 空结果与未运行检测一样返回 `NoData`
pub fn assemble(
  result: Result<Vec<ObjectResult>, DetectorError>,
  image_size: ImageSize,
) -> ResponseEnvelope {
  match result {
    Ok(data) if data.is_empty() => ResponseEnvelope::NoData,
    Ok(data) => ResponseEnvelope::Objects { data, image_size },
    Err(err) => err.into(),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::output::Point;

  fn object() -> ObjectResult {
    ObjectResult {
      min_x: 0.5,
      max_x: 0.75,
      min_y: 0.25,
      max_y: 0.75,
      width: 0.25,
      height: 0.5,
      origin: Point { x: 5.0, y: 2.5 },
    }
  }

  #[test]
  fn empty_sequence_is_no_data() {
    let envelope = assemble(Ok(vec![]), ImageSize::new(4.0, 4.0));
    assert_eq!(envelope, ResponseEnvelope::NoData);
    assert_eq!(envelope.to_json(), json!({ "name": "noData" }));
  }

  #[test]
  fn detector_error_keeps_code_and_message() {
    let envelope = assemble(
      Err(DetectorError::NoObjectDetected("X".into())),
      ImageSize::new(4.0, 4.0),
    );
    assert_eq!(
      envelope,
      ResponseEnvelope::Error {
        code: "No Object Detected".into(),
        message: "X".into(),
      }
    );
    assert_eq!(
      envelope.to_json(),
      json!({ "name": "error", "code": "No Object Detected", "message": "X" })
    );
  }

  #[test]
  fn objects_echo_image_size() {
    let envelope = assemble(Ok(vec![object()]), ImageSize::new(10.0, 5.0));
    assert_eq!(
      envelope.to_json(),
      json!({
        "name": "object",
        "data": [{
          "minX": 0.5, "maxX": 0.75, "minY": 0.25, "maxY": 0.75,
          "width": 0.25, "height": 0.5,
          "origin": { "x": 5.0, "y": 2.5 }
        }],
        "imageSize": { "width": 10.0, "height": 5.0 }
      })
    );
  }

  #[test]
  fn envelope_parses_back_from_json() {
    let text = r#"{"name":"error","code":"Data Corrupted","message":"bad"}"#;
    let envelope: ResponseEnvelope = serde_json::from_str(text).unwrap();
    assert_eq!(
      envelope,
      ResponseEnvelope::from(DetectorError::DataCorrupted("bad".into()))
    );
  }
}
