// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/region.rs - 对比度区域检测器
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

use std::collections::BTreeMap;

use image::{GrayImage, Luma, imageops};
use imageproc::region_labelling::{Connectivity, connected_components};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{DecodedImage, PixelFormat},
  input::Orientation,
  model::{DetectResult, DetectedRegion, Detector, DetectorError, NormalizedRect},
};

const REGION_DEFAULT_CONTRAST: u8 = 48;
const REGION_DEFAULT_MIN_AREA: f64 = 0.001;
const REGION_DEFAULT_MAX_REGIONS: usize = 16;

#[derive(Error, Debug)]
pub enum RegionDetectorError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("无效参数 {0}={1}")]
  InvalidOption(String, String),
  #[error("图像解码错误: {0}")]
  DecodeError(#[from] image::ImageError),
  #[error("像素缓冲区长度不足: 期望 {expected}, 实际 {actual}")]
  BufferTooShort { expected: usize, actual: usize },
  #[error("图像尺寸无效: {0}x{1}")]
  InvalidDimensions(usize, usize),
}

impl From<RegionDetectorError> for DetectorError {
  fn from(err: RegionDetectorError) -> Self {
    DetectorError::DataCorrupted(err.to_string())
  }
}

pub struct RegionDetectorBuilder {
  contrast: u8,
  min_area: f64,
  max_regions: usize,
}

impl Default for RegionDetectorBuilder {
  fn default() -> Self {
    Self {
      contrast: REGION_DEFAULT_CONTRAST,
      min_area: REGION_DEFAULT_MIN_AREA,
      max_regions: REGION_DEFAULT_MAX_REGIONS,
    }
  }
}

impl FromUrlWithScheme for RegionDetectorBuilder {
  const SCHEME: &'static str = "region";
}

impl FromUrl for RegionDetectorBuilder {
  type Error = RegionDetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RegionDetectorError::SchemeMismatch(format!(
        "检测器必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let mut builder = Self::default();
    for (k, v) in url.query_pairs() {
      let invalid = || RegionDetectorError::InvalidOption(k.to_string(), v.to_string());
      match k.as_ref() {
        "contrast" => builder.contrast = v.parse().map_err(|_| invalid())?,
        "min_area" => {
          let min_area: f64 = v.parse().map_err(|_| invalid())?;
          if !(0.0..=1.0).contains(&min_area) {
            return Err(invalid());
          }
          builder.min_area = min_area;
        }
        "max_regions" => builder.max_regions = v.parse().map_err(|_| invalid())?,
        _ => debug!("忽略未知参数: {}={}", k, v),
      }
    }

    Ok(builder)
  }
}

impl RegionDetectorBuilder {
  pub fn contrast(mut self, contrast: u8) -> Self {
    self.contrast = contrast;
    self
  }

  pub fn min_area(mut self, min_area: f64) -> Self {
    self.min_area = min_area;
    self
  }

  pub fn max_regions(mut self, max_regions: usize) -> Self {
    self.max_regions = max_regions;
    self
  }

  pub fn build(self) -> RegionDetector {
    info!(
      "创建区域检测器: 对比度 {}, 最小面积 {}, 最多区域 {}",
      self.contrast, self.min_area, self.max_regions
    );
    RegionDetector {
      contrast: self.contrast,
      min_area: self.min_area,
      max_regions: self.max_regions,
    }
  }
}

/// 以帧平均亮度为背景，检测对比度足够的连通区域
pub struct RegionDetector {
  contrast: u8,
  min_area: f64,
  max_regions: usize,
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
  x_min: u32,
  y_min: u32,
  x_max: u32,
  y_max: u32,
  pixels: u64,
}

impl Bounds {
  fn at(x: u32, y: u32) -> Self {
    Self {
      x_min: x,
      y_min: y,
      x_max: x,
      y_max: y,
      pixels: 1,
    }
  }

  fn extend(&mut self, x: u32, y: u32) {
    self.x_min = self.x_min.min(x);
    self.y_min = self.y_min.min(y);
    self.x_max = self.x_max.max(x);
    self.y_max = self.y_max.max(y);
    self.pixels += 1;
  }

  // 像素坐标原点在左上角，输出转换为左下角原点
  fn normalize(&self, width: u32, height: u32) -> NormalizedRect {
    let (w, h) = (width as f64, height as f64);
    let box_w = (self.x_max - self.x_min + 1) as f64;
    let box_h = (self.y_max - self.y_min + 1) as f64;
    NormalizedRect::new(
      self.x_min as f64 / w,
      1.0 - (self.y_max + 1) as f64 / h,
      box_w / w,
      box_h / h,
    )
  }
}

fn luma_of(format: PixelFormat, pixel: &[u8]) -> u8 {
  let [r, g, b, _] = format.rgba_offsets();
  let sum = 299 * pixel[r] as u32 + 587 * pixel[g] as u32 + 114 * pixel[b] as u32;
  (sum / 1000) as u8
}

fn materialize(image: &DecodedImage<'_>) -> Result<GrayImage, RegionDetectorError> {
  let luma = match *image {
    DecodedImage::Packed {
      bytes,
      stride,
      width,
      height,
      format,
    } => {
      let expected = stride.saturating_mul(height);
      if stride < width.saturating_mul(4) || bytes.len() < expected {
        return Err(RegionDetectorError::BufferTooShort {
          expected,
          actual: bytes.len(),
        });
      }
      let (w, h) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(RegionDetectorError::InvalidDimensions(width, height)),
      };
      GrayImage::from_fn(w, h, |x, y| {
        let offset = y as usize * stride + x as usize * 4;
        Luma([luma_of(format, &bytes[offset..offset + 4])])
      })
    }
    DecodedImage::Encoded { bytes } => image::load_from_memory(bytes)?.to_luma8(),
  };

  let (w, h) = luma.dimensions();
  if w == 0 || h == 0 {
    return Err(RegionDetectorError::InvalidDimensions(
      w as usize, h as usize,
    ));
  }
  Ok(luma)
}

/// 将传感器方向的图像校正为正向
///
/// 镜像方向先水平翻转，再按基础方向旋转。
fn orient(image: GrayImage, orientation: Orientation) -> GrayImage {
  let image = if orientation.is_mirrored() {
    imageops::flip_horizontal(&image)
  } else {
    image
  };

  match orientation {
    Orientation::Up | Orientation::UpMirrored => image,
    Orientation::Down | Orientation::DownMirrored => imageops::rotate180(&image),
    Orientation::Right | Orientation::RightMirrored => imageops::rotate90(&image),
    Orientation::Left | Orientation::LeftMirrored => imageops::rotate270(&image),
  }
}

impl RegionDetector {
  fn foreground(&self, image: &GrayImage) -> GrayImage {
    let total = image.pixels().map(|p| p[0] as u64).sum::<u64>();
    let mean = (total / (image.width() as u64 * image.height() as u64)) as i32;
    let contrast = self.contrast as i32;
    debug!("平均亮度: {}, 对比度阈值: {}", mean, contrast);

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
      let value = image.get_pixel(x, y)[0] as i32;
      if (value - mean).abs() > contrast {
        Luma([255])
      } else {
        Luma([0])
      }
    })
  }

  fn regions(&self, image: &GrayImage) -> Vec<DetectedRegion> {
    let (width, height) = image.dimensions();
    let mask = self.foreground(image);
    let labels = connected_components(&mask, Connectivity::Four, Luma([0u8]));

    let mut components: BTreeMap<u32, Bounds> = BTreeMap::new();
    for (x, y, label) in labels.enumerate_pixels() {
      let label = label[0];
      if label == 0 {
        continue;
      }
      components
        .entry(label)
        .and_modify(|b| b.extend(x, y))
        .or_insert_with(|| Bounds::at(x, y));
    }
    debug!("连通区域数: {}", components.len());

    let total = width as f64 * height as f64;
    components
      .values()
      .filter(|b| b.pixels as f64 / total >= self.min_area)
      .take(self.max_regions)
      .map(|b| DetectedRegion::from(b.normalize(width, height)))
      .collect()
  }
}

impl Detector for RegionDetector {
  type Error = RegionDetectorError;

  fn detect(
    &self,
    image: &DecodedImage<'_>,
    orientation: Orientation,
  ) -> Result<DetectResult, Self::Error> {
    let luma = materialize(image).inspect_err(|e| error!("无法读取图像: {}", e))?;
    let upright = orient(luma, orientation);
    let regions = self.regions(&upright);
    debug!("检测到 {} 个区域", regions.len());
    Ok(DetectResult::from(regions))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::{ImageSize, interpret};

  fn bgra_frame(width: usize, height: usize, square: (usize, usize, usize)) -> Vec<u8> {
    let (sx, sy, side) = square;
    let mut bytes = vec![0u8; width * height * 4];
    for y in sy..sy + side {
      for x in sx..sx + side {
        let offset = (y * width + x) * 4;
        bytes[offset..offset + 4].copy_from_slice(&[255, 255, 255, 255]);
      }
    }
    bytes
  }

  fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
  }

  #[test]
  fn finds_bright_square_on_dark_background() {
    let bytes = bgra_frame(10, 10, (2, 1, 3));
    let image = interpret(&bytes, ImageSize::new(10.0, 10.0), PixelFormat::Bgra8);
    let result = RegionDetectorBuilder::default()
      .build()
      .detect(&image, Orientation::Up)
      .unwrap();

    assert_eq!(result.len(), 1);
    let rect = result.items[0].bounding_box;
    assert!(close(rect.min_x, 0.2));
    assert!(close(rect.width, 0.3));
    assert!(close(rect.height, 0.3));
    // 行 1..=3，左下角原点下 min_y = 1 - 4/10
    assert!(close(rect.min_y, 0.6));
  }

  #[test]
  fn every_orientation_places_the_region() {
    // 10x6 帧，左上角 2x2 方块
    let bytes = bgra_frame(10, 6, (0, 0, 2));
    let image = interpret(&bytes, ImageSize::new(10.0, 6.0), PixelFormat::Bgra8);
    let detector = RegionDetectorBuilder::default().build();

    let third = 1.0 / 3.0;
    let cases = [
      (Orientation::Up, (0.0, 2.0 * third), (0.2, third)),
      (Orientation::UpMirrored, (0.8, 2.0 * third), (0.2, third)),
      (Orientation::Down, (0.8, 0.0), (0.2, third)),
      (Orientation::DownMirrored, (0.0, 0.0), (0.2, third)),
      (Orientation::Right, (2.0 * third, 0.8), (third, 0.2)),
      (Orientation::RightMirrored, (2.0 * third, 0.0), (third, 0.2)),
      (Orientation::Left, (0.0, 0.0), (third, 0.2)),
      (Orientation::LeftMirrored, (0.0, 0.8), (third, 0.2)),
    ];

    for (orientation, (min_x, min_y), (width, height)) in cases {
      let result = detector.detect(&image, orientation).unwrap();
      assert_eq!(result.len(), 1, "{}", orientation);
      let rect = result.items[0].bounding_box;
      assert!(close(rect.min_x, min_x), "{}: min_x {}", orientation, rect.min_x);
      assert!(close(rect.min_y, min_y), "{}: min_y {}", orientation, rect.min_y);
      assert!(close(rect.width, width), "{}: width {}", orientation, rect.width);
      assert!(close(rect.height, height), "{}: height {}", orientation, rect.height);
    }
  }

  #[test]
  fn uniform_frame_has_no_regions() {
    let bytes = vec![0u8; 8 * 8 * 4];
    let image = interpret(&bytes, ImageSize::new(8.0, 8.0), PixelFormat::Bgra8);
    let result = RegionDetectorBuilder::default()
      .build()
      .detect(&image, Orientation::DownMirrored)
      .unwrap();
    assert!(result.is_empty());
  }

  #[test]
  fn small_components_are_filtered_and_capped() {
    let mut bytes = bgra_frame(20, 20, (0, 0, 4));
    // 单像素噪点
    let offset = (19 * 20 + 19) * 4;
    bytes[offset..offset + 4].copy_from_slice(&[255, 255, 255, 255]);
    let image = interpret(&bytes, ImageSize::new(20.0, 20.0), PixelFormat::Bgra8);

    let detector = RegionDetectorBuilder::default().min_area(0.01).build();
    assert_eq!(detector.detect(&image, Orientation::Up).unwrap().len(), 1);

    let detector = RegionDetectorBuilder::default()
      .min_area(0.0)
      .max_regions(1)
      .build();
    assert_eq!(detector.detect(&image, Orientation::Up).unwrap().len(), 1);

    let detector = RegionDetectorBuilder::default().min_area(0.0).build();
    assert_eq!(detector.detect(&image, Orientation::Up).unwrap().len(), 2);
  }

  #[test]
  fn undecodable_blob_is_data_corrupted() {
    let image = DecodedImage::Encoded {
      bytes: b"definitely not an image",
    };
    let err = RegionDetectorBuilder::default()
      .build()
      .detect(&image, Orientation::Up)
      .unwrap_err();
    assert_eq!(DetectorError::from(err).code(), "Data Corrupted");
  }

  #[test]
  fn short_packed_buffer_is_rejected() {
    let bytes = [0u8; 8];
    let image = DecodedImage::Packed {
      bytes: &bytes,
      stride: 16,
      width: 4,
      height: 4,
      format: PixelFormat::Rgba8,
    };
    let err = RegionDetectorBuilder::default()
      .build()
      .detect(&image, Orientation::Up)
      .unwrap_err();
    assert!(matches!(err, RegionDetectorError::BufferTooShort { expected: 64, actual: 8 }));
  }

  #[test]
  fn builder_reads_url_options() {
    let url = Url::parse("region:///?contrast=10&min_area=0.5&max_regions=3").unwrap();
    let builder = RegionDetectorBuilder::from_url(&url).unwrap();
    assert_eq!(builder.contrast, 10);
    assert_eq!(builder.min_area, 0.5);
    assert_eq!(builder.max_regions, 3);

    let url = Url::parse("region:///?min_area=2").unwrap();
    assert!(matches!(
      RegionDetectorBuilder::from_url(&url),
      Err(RegionDetectorError::InvalidOption(..))
    ));

    let url = Url::parse("yolo26:///model.rknn").unwrap();
    assert!(matches!(
      RegionDetectorBuilder::from_url(&url),
      Err(RegionDetectorError::SchemeMismatch(_))
    ));
  }
}
