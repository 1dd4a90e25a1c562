use image::RgbImage;
use num_complex::Complex;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::fft::Fft2d;
use crate::screen::ScreenImage;
use crate::template_data::CHANNELS;

/// 单个颜色通道的屏幕数据
pub(crate) struct ScreenChannel {
    /// 屏幕在频域的数据（转置布局）
    pub spectrum: Vec<Complex<f64>>,
    /// 积分图像，`(width + 1) x (height + 1)`，行优先
    pub integral: Vec<u64>,
    /// 平方积分图像
    pub squared_integral: Vec<u64>,
}

/// 预处理过的屏幕
///
/// 与模板无关，同一帧只需准备一次，可供所有特征共享。
/// 频域数据与屏幕等大，不做二次幂填充。
pub struct ScreenData {
    width: u32,
    height: u32,
    pub(crate) fft: Fft2d,
    pub(crate) channels: Vec<ScreenChannel>,
}

impl ScreenData {
    pub fn new<'a>(screen: impl Into<ScreenImage<'a>>) -> Result<Self> {
        let screen = screen.into().to_native()?;
        let (width, height) = screen.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::EmptyScreen);
        }

        let fft = Fft2d::new(width, height);
        let channels = (0..CHANNELS)
            .into_par_iter()
            .map(|channel| ScreenChannel::new(&screen, channel, &fft))
            .collect();

        Ok(Self {
            width,
            height,
            fft,
            channels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 频域数据的长度
    pub(crate) fn spectrum_len(&self) -> usize {
        self.fft.len()
    }

    /// 窗口内像素和与平方和
    pub(crate) fn window_sums(&self, channel: usize, x: u32, y: u32, width: u32, height: u32) -> (u64, u64) {
        let data = &self.channels[channel];
        let stride = self.width as usize + 1;
        (
            sum_region(&data.integral, stride, x, y, width, height),
            sum_region(&data.squared_integral, stride, x, y, width, height),
        )
    }
}

impl ScreenChannel {
    fn new(screen: &RgbImage, channel: usize, fft: &Fft2d) -> Self {
        let (width, height) = screen.dimensions();
        let stride = width as usize + 1;
        let mut integral = vec![0u64; stride * (height as usize + 1)];
        let mut squared_integral = vec![0u64; stride * (height as usize + 1)];
        let mut buffer = Vec::with_capacity(fft.len());

        for (x, y, pixel) in screen.enumerate_pixels() {
            let value = pixel[channel] as u64;
            buffer.push(Complex::new(value as f64, 0.0));

            let (x, y) = (x as usize, y as usize);
            let here = (y + 1) * stride + x + 1;
            let above = y * stride + x + 1;
            let left = (y + 1) * stride + x;
            let diagonal = y * stride + x;

            integral[here] = value + integral[above] + integral[left] - integral[diagonal];
            squared_integral[here] = value * value + squared_integral[above] + squared_integral[left]
                - squared_integral[diagonal];
        }

        Self {
            spectrum: fft.forward(buffer),
            integral,
            squared_integral,
        }
    }
}

/// 使用积分图像计算区域和
fn sum_region(integral: &[u64], stride: usize, x: u32, y: u32, width: u32, height: u32) -> u64 {
    let x1 = x as usize;
    let y1 = y as usize;
    let x2 = (x + width) as usize;
    let y2 = (y + height) as usize;

    integral[y2 * stride + x2] + integral[y1 * stride + x1]
        - integral[y1 * stride + x2]
        - integral[y2 * stride + x1]
}

impl std::fmt::Debug for ScreenData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenData")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
