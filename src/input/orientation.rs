// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/orientation.rs - 传感器方向解析
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

use std::fmt;

/// 帧的方向变换：恒等、三种旋转以及它们的水平镜像
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
  Up,
  UpMirrored,
  Down,
  #[default]
  DownMirrored,
  Left,
  LeftMirrored,
  Right,
  RightMirrored,
}

const ORIENTATION_TABLE: [(&str, Orientation); 8] = [
  ("up", Orientation::Up),
  ("upMirrored", Orientation::UpMirrored),
  ("down", Orientation::Down),
  ("downMirrored", Orientation::DownMirrored),
  ("left", Orientation::Left),
  ("leftMirrored", Orientation::LeftMirrored),
  ("right", Orientation::Right),
  ("rightMirrored", Orientation::RightMirrored),
];

impl Orientation {
  /// 按名称查表，未识别的名称回退为 `DownMirrored`
  pub fn resolve(name: &str) -> Self {
    ORIENTATION_TABLE
      .iter()
      .find(|(literal, _)| *literal == name)
      .map(|(_, orientation)| *orientation)
      .unwrap_or_default()
  }

  pub fn name(&self) -> &'static str {
    ORIENTATION_TABLE
      .iter()
      .find(|(_, orientation)| *orientation == *self)
      .map(|(literal, _)| *literal)
      .unwrap_or("downMirrored")
  }

  /// 镜像方向需要先水平翻转再旋转
  pub fn is_mirrored(&self) -> bool {
    matches!(
      self,
      Orientation::UpMirrored
        | Orientation::DownMirrored
        | Orientation::LeftMirrored
        | Orientation::RightMirrored
    )
  }
}

impl fmt::Display for Orientation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}
