// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::ImageReader;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{ImageSize, PixelFormat},
  input::{InputFrame, Orientation},
};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("Invalid path encoding: {0}")]
  InvalidPath(#[from] std::string::FromUtf8Error),
  #[error("Unknown pixel format: {0}")]
  UnknownPixelFormat(String),
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 从图像文件读取单帧。
///
/// 默认直接传递文件的编码字节；
/// 带 `packed` 查询参数时先解码为紧密像素。
pub struct ImageFileInput {
  frame: Option<InputFrame>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let mut orientation = Orientation::default().name().to_string();
    let mut packed = false;
    let mut pixel_format = PixelFormat::default();
    for (k, v) in url.query_pairs() {
      match k.as_ref() {
        "orientation" => orientation = v.into_owned(),
        "packed" => packed = true,
        "format" => {
          pixel_format = PixelFormat::from_name(&v)
            .ok_or_else(|| ImageFileInputError::UnknownPixelFormat(v.to_string()))?
        }
        _ => {}
      }
    }

    // URL 中的路径是百分号编码的
    let path = urlencoding::decode(url.path())?;
    info!("读取图像文件: {}", path);
    let frame = if packed {
      read_packed(&path, pixel_format, orientation)?
    } else {
      read_encoded(&path, pixel_format, orientation)?
    };

    Ok(ImageFileInput { frame: Some(frame) })
  }
}

fn read_encoded(
  path: &str,
  pixel_format: PixelFormat,
  orientation: String,
) -> Result<InputFrame, ImageFileInputError> {
  let bytes = std::fs::read(path)?;
  let (width, height) = ImageReader::open(path)?
    .with_guessed_format()?
    .into_dimensions()?;

  Ok(InputFrame {
    bytes,
    size: ImageSize::new(width as f64, height as f64),
    orientation,
    pixel_format,
  })
}

fn read_packed(
  path: &str,
  pixel_format: PixelFormat,
  orientation: String,
) -> Result<InputFrame, ImageFileInputError> {
  let image = ImageReader::open(path)?
    .with_guessed_format()?
    .decode()?
    .to_rgba8();
  let (width, height) = image.dimensions();
  let offsets = pixel_format.rgba_offsets();

  let mut bytes = vec![0u8; image.as_raw().len()];
  for (dst, src) in bytes.chunks_exact_mut(4).zip(image.pixels()) {
    for (c, offset) in offsets.iter().enumerate() {
      dst[*offset] = src[c];
    }
  }

  Ok(InputFrame {
    bytes,
    size: ImageSize::new(width as f64, height as f64),
    orientation,
    pixel_format,
  })
}

impl Iterator for ImageFileInput {
  type Item = InputFrame;

  fn next(&mut self) -> Option<Self::Item> {
    self.frame.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgba, RgbaImage};

  fn write_png(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("frame.png");
    let mut image = RgbaImage::new(3, 2);
    image.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
    image.save(&path).unwrap();
    path
  }

  #[test]
  fn encoded_input_passes_file_bytes_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path());
    let url = Url::parse(&format!("image://{}?orientation=up", path.display())).unwrap();

    let mut input = ImageFileInput::from_url(&url).unwrap();
    let frame = input.next().unwrap();
    assert_eq!(frame.bytes, std::fs::read(&path).unwrap());
    assert_eq!(frame.size, ImageSize::new(3.0, 2.0));
    assert_eq!(frame.orientation, "up");
    assert!(!frame.as_request().decoded().is_packed());
    assert!(input.next().is_none());
  }

  #[test]
  fn packed_input_reorders_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path());
    let url = Url::parse(&format!("image://{}?packed&format=bgra8", path.display())).unwrap();

    let frame = ImageFileInput::from_url(&url).unwrap().next().unwrap();
    assert_eq!(frame.bytes.len(), 3 * 2 * 4);
    assert_eq!(&frame.bytes[..4], &[30, 20, 10, 255]);
    assert_eq!(frame.orientation, "downMirrored");
    assert!(frame.as_request().decoded().is_packed());
  }

  #[test]
  fn percent_encoded_path_is_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("camera roll");
    std::fs::create_dir(&nested).unwrap();
    let path = write_png(&nested);

    let url = Url::from_file_path(&path).unwrap();
    let url = Url::parse(&format!("image://{}?orientation=left", url.path())).unwrap();
    assert!(url.path().contains("camera%20roll"));

    let frame = ImageFileInput::from_url(&url).unwrap().next().unwrap();
    assert_eq!(frame.bytes, std::fs::read(&path).unwrap());
    assert_eq!(frame.size, ImageSize::new(3.0, 2.0));
    assert_eq!(frame.orientation, "left");
  }

  #[test]
  fn rejects_foreign_scheme_and_unknown_format() {
    let url = Url::parse("video:///tmp/a.mp4").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemaMismatch)
    ));

    let url = Url::parse("image:///tmp/a.png?format=nv12").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::UnknownPixelFormat(_))
    ));
  }
}
