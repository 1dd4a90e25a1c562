/*!
 * 模板匹配器
 *
 * 多通道归一化互相关 (TM_CCOEFF_NORMED)：
 * 分子中的互相关项 Σ(t·i) 由FFT在频域一次性求出，
 * 窗口内的 Σi 与 Σi² 由积分图像求出。
 * 基于J.P. Lewis的快速归一化互相关算法
 * 论文: "Fast Normalized Cross-Correlation"
 * http://scribblethink.org/Work/nvisionInterface/vi95_lewis.pdf
 *
 * 像素均为整数，FFT结果取整后整个系数按整数计算，
 * 因此完全相同的区域相关系数精确为 1.0。
 */

use std::sync::Arc;

use image::RgbImage;
use num_complex::Complex;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::result::CorrelationSurface;
use crate::screen_data::ScreenData;
use crate::template_data::{TemplateData, CHANNELS};

/// 图像匹配器
///
/// 只持有模板及其统计量，与屏幕尺寸无关。
/// 屏幕侧的频域数据和积分图像由 [`ScreenData`] 提供，可被多个匹配器共享。
#[derive(Clone)]
pub struct ImageMatcher {
    template: Arc<RgbImage>,
    template_data: TemplateData,
}

impl ImageMatcher {
    /// 准备模板用于匹配
    ///
    /// # 参数
    /// * `template` - 模板图像
    pub fn new(template: impl Into<Arc<RgbImage>>) -> Result<Self> {
        let template = template.into();
        if template.width() == 0 || template.height() == 0 {
            return Err(Error::EmptyTemplate);
        }

        let template_data = TemplateData::new(&template);
        Ok(Self { template, template_data })
    }

    /// 模板尺寸
    pub fn template_dimensions(&self) -> (u32, u32) {
        (self.template_data.template_width, self.template_data.template_height)
    }

    /// 计算整张屏幕的相关系数曲面
    pub fn matching(&self, screen: &ScreenData) -> Result<CorrelationSurface> {
        let (screen_width, screen_height) = screen.dimensions();
        let (template_width, template_height) = self.template_dimensions();
        if template_width > screen_width || template_height > screen_height {
            return Err(Error::ScreenTooSmall {
                template_width,
                template_height,
                screen_width,
                screen_height,
            });
        }

        let surface_width = screen_width - template_width + 1;
        let surface_height = screen_height - template_height + 1;
        let surface_len = surface_width as usize * surface_height as usize;

        // 纯色模板没有方差，整个曲面为 1.0（与 OpenCV 一致）
        if self.template_data.template_variance == 0 {
            return Ok(CorrelationSurface::new(surface_width, surface_height, vec![1.0; surface_len]));
        }

        let cross = self.perform_fft_correlation(screen);

        let coords: Vec<(u32, u32)> = (0..surface_height)
            .flat_map(|y| (0..surface_width).map(move |x| (x, y)))
            .collect();

        let values: Vec<f64> = coords
            .par_iter()
            .map(|&(x, y)| self.calculate_correlation(screen, &cross, x, y))
            .collect();

        Ok(CorrelationSurface::new(surface_width, surface_height, values))
    }

    /// 各通道互相关 Σ(t·i) 之和，结果未归一化
    ///
    /// 通道在频域中累加，只做一次逆变换。模板频域数据逐通道生成，不保留。
    fn perform_fft_correlation(&self, screen: &ScreenData) -> Vec<Complex<f64>> {
        let mut accumulated = vec![Complex::new(0.0, 0.0); screen.spectrum_len()];

        for channel in 0..CHANNELS {
            let template_conj = TemplateData::conj_spectrum(&self.template, channel, &screen.fft, screen.width());
            accumulated
                .par_iter_mut()
                .zip(screen.channels[channel].spectrum.par_iter())
                .zip(template_conj.par_iter())
                .for_each(|((acc, &img_val), &tmpl_val)| *acc += img_val * tmpl_val);
        }

        screen.fft.inverse(accumulated)
    }

    /// 计算单个位置的相关系数
    fn calculate_correlation(&self, screen: &ScreenData, cross: &[Complex<f64>], x: u32, y: u32) -> f64 {
        let data = &self.template_data;
        let template_size = data.template_width as i128 * data.template_height as i128;
        let index = y as usize * screen.width() as usize + x as usize;
        let cross = (cross[index].re / screen.spectrum_len() as f64).round() as i128;

        let mut numerator = template_size * cross;
        let mut image_variance = 0i128;

        for (channel, sums) in data.channels.iter().enumerate() {
            let (sum_image_region, sum_squared_image_region) =
                screen.window_sums(channel, x, y, data.template_width, data.template_height);
            let (sum_image_region, sum_squared_image_region) =
                (sum_image_region as i128, sum_squared_image_region as i128);

            numerator -= sums.template_sum as i128 * sum_image_region;
            image_variance += template_size * sum_squared_image_region - sum_image_region * sum_image_region;
        }

        // 纯色窗口没有方差
        if image_variance <= 0 {
            return 0.0;
        }

        let denominator = (data.template_variance as f64 * image_variance as f64).sqrt();
        (numerator as f64 / denominator).clamp(-1.0, 1.0)
    }
}

impl std::fmt::Debug for ImageMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageMatcher")
            .field("template", &self.template_dimensions())
            .field("template_variance", &self.template_data.template_variance)
            .finish()
    }
}

/// 一次性匹配：准备屏幕和模板后立即计算相关系数曲面
pub fn match_template(template: &RgbImage, screen: &RgbImage) -> Result<CorrelationSurface> {
    let screen = ScreenData::new(screen)?;
    ImageMatcher::new(template.clone())?.matching(&screen)
}
