use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// 二维FFT
///
/// 先对每行做FFT，转置后再对每列做FFT，长度就是图像的宽和高，不做任何填充。
/// 频域数据保持转置后的布局，`inverse` 会把它还原为行优先的空间域数据。
/// 逆变换结果未归一化，需除以 `len()`。
pub(crate) struct Fft2d {
    width: usize,
    height: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    column_forward: Arc<dyn Fft<f64>>,
    column_inverse: Arc<dyn Fft<f64>>,
}

impl Fft2d {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width as usize, height as usize);
        let mut planner = FftPlanner::<f64>::new();

        Self {
            width,
            height,
            row_forward: planner.plan_fft_forward(width),
            row_inverse: planner.plan_fft_inverse(width),
            column_forward: planner.plan_fft_forward(height),
            column_inverse: planner.plan_fft_inverse(height),
        }
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// 行优先、尺寸为 `width x height` 的数据 → 转置布局的频域数据
    pub fn forward(&self, mut buffer: Vec<Complex<f64>>) -> Vec<Complex<f64>> {
        debug_assert_eq!(buffer.len(), self.len());
        self.row_forward.process(&mut buffer);
        let mut spectrum = transpose(&buffer, self.width, self.height);
        drop(buffer);
        self.column_forward.process(&mut spectrum);
        spectrum
    }

    /// `forward` 的逆变换
    pub fn inverse(&self, mut spectrum: Vec<Complex<f64>>) -> Vec<Complex<f64>> {
        debug_assert_eq!(spectrum.len(), self.len());
        self.column_inverse.process(&mut spectrum);
        let mut buffer = transpose(&spectrum, self.height, self.width);
        drop(spectrum);
        self.row_inverse.process(&mut buffer);
        buffer
    }
}

/// 行优先的 `width x height` 矩阵转置为 `height x width`
fn transpose(input: &[Complex<f64>], width: usize, height: usize) -> Vec<Complex<f64>> {
    let mut output = vec![Complex::new(0.0, 0.0); input.len()];
    for (y, row) in input.chunks_exact(width).enumerate() {
        for (x, &value) in row.iter().enumerate() {
            output[x * height + y] = value;
        }
    }
    output
}
