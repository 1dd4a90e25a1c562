use std::borrow::Cow;

use image::{DynamicImage, RgbImage};

use crate::error::{Error, Result};

/// 来源屏幕图像
///
/// 匹配器只接受 RGB8 像素网格，其它形式在匹配前先转换通道顺序。
#[derive(Debug, Clone, Copy)]
pub enum ScreenImage<'a> {
    /// 已经是匹配器使用的 RGB8 格式
    Native(&'a RgbImage),
    /// 任意颜色类型的解码帧
    Frame(&'a DynamicImage),
    /// 屏幕捕获常见的 BGRA 原始字节，行优先、无行填充
    Bgra {
        width: u32,
        height: u32,
        data: &'a [u8],
    },
}

impl<'a> ScreenImage<'a> {
    pub fn dimensions(&self) -> (u32, u32) {
        match *self {
            ScreenImage::Native(image) => image.dimensions(),
            ScreenImage::Frame(frame) => (frame.width(), frame.height()),
            ScreenImage::Bgra { width, height, .. } => (width, height),
        }
    }

    /// 转换为 RGB8，原生格式不复制
    pub fn to_native(&self) -> Result<Cow<'a, RgbImage>> {
        match *self {
            ScreenImage::Native(image) => Ok(Cow::Borrowed(image)),
            ScreenImage::Frame(frame) => Ok(Cow::Owned(frame.to_rgb8())),
            ScreenImage::Bgra { width, height, data } => {
                let expected = width as usize * height as usize * 4;
                let invalid = || Error::InvalidFrame {
                    width,
                    height,
                    expected,
                    actual: data.len(),
                };

                if data.len() != expected {
                    return Err(invalid());
                }

                let rgb: Vec<u8> = data
                    .chunks_exact(4)
                    .flat_map(|bgra| [bgra[2], bgra[1], bgra[0]])
                    .collect();

                RgbImage::from_raw(width, height, rgb).map(Cow::Owned).ok_or_else(invalid)
            }
        }
    }
}

impl<'a> From<&'a RgbImage> for ScreenImage<'a> {
    fn from(image: &'a RgbImage) -> Self {
        ScreenImage::Native(image)
    }
}

impl<'a> From<&'a DynamicImage> for ScreenImage<'a> {
    fn from(frame: &'a DynamicImage) -> Self {
        ScreenImage::Frame(frame)
    }
}
