use image::RgbImage;
use num_complex::Complex;

use crate::fft::Fft2d;

/// 颜色通道数 (RGB)
pub(crate) const CHANNELS: usize = 3;

/// 单个颜色通道的模板统计量
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChannelSums {
    /// 模板像素和
    pub template_sum: u64,
    /// 模板像素平方和
    pub template_sum_squared: u64,
}

/// 模板数据
///
/// 只保存与屏幕无关的统计量，大小与模板相当。
/// 频域数据在匹配时按屏幕尺寸临时生成，用完即丢弃。
#[derive(Debug, Clone)]
pub(crate) struct TemplateData {
    pub channels: [ChannelSums; CHANNELS],
    /// 模板各通道的 `N * Σt² - (Σt)²` 之和
    pub template_variance: i128,
    pub template_width: u32,
    pub template_height: u32,
}

impl TemplateData {
    pub fn new(template: &RgbImage) -> Self {
        let (template_width, template_height) = template.dimensions();
        let mut channels = [ChannelSums {
            template_sum: 0,
            template_sum_squared: 0,
        }; CHANNELS];

        for pixel in template.pixels() {
            for (sums, &value) in channels.iter_mut().zip(pixel.0.iter()) {
                let value = value as u64;
                sums.template_sum += value;
                sums.template_sum_squared += value * value;
            }
        }

        let template_size = template_width as i128 * template_height as i128;
        let template_variance = channels
            .iter()
            .map(|sums| {
                let sum = sums.template_sum as i128;
                template_size * sums.template_sum_squared as i128 - sum * sum
            })
            .sum();

        TemplateData {
            channels,
            template_variance,
            template_width,
            template_height,
        }
    }

    /// 单通道模板补零到屏幕尺寸后的频域共轭
    pub fn conj_spectrum(template: &RgbImage, channel: usize, fft: &Fft2d, screen_width: u32) -> Vec<Complex<f64>> {
        let screen_width = screen_width as usize;
        let mut template_padded = vec![Complex::new(0.0, 0.0); fft.len()];
        for (x, y, pixel) in template.enumerate_pixels() {
            template_padded[y as usize * screen_width + x as usize] = Complex::new(pixel[channel] as f64, 0.0);
        }

        let mut spectrum = fft.forward(template_padded);
        spectrum.iter_mut().for_each(|value| *value = value.conj());
        spectrum
    }
}
