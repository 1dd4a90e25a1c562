/// 屏幕坐标（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Location {
    /// X坐标
    pub x: u32,
    /// Y坐标
    pub y: u32,
}

impl Location {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// 平移坐标
    pub const fn offset(self, dx: u32, dy: u32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<(u32, u32)> for Location {
    fn from((x, y): (u32, u32)) -> Self {
        Self::new(x, y)
    }
}

impl From<Location> for (u32, u32) {
    fn from(location: Location) -> Self {
        (location.x, location.y)
    }
}

/// 单个匹配位置及其相关系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// 模板左上角位置
    pub location: Location,
    /// 相关系数 (-1.0-1.0)
    pub correlation: f64,
}

/// 相关系数曲面
///
/// 尺寸为 `(屏幕宽 - 模板宽 + 1) x (屏幕高 - 模板高 + 1)`，
/// 每个值是模板左上角放在该位置时的归一化互相关系数。
#[derive(Debug, Clone)]
pub struct CorrelationSurface {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl CorrelationSurface {
    pub(crate) fn new(width: u32, height: u32, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), width as usize * height as usize);
        Self { width, height, values }
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

    /// 按行优先顺序排列的全部相关系数
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// 全局最大值及其位置
    ///
    /// 多个位置取得相同最大值时返回行优先顺序中的第一个。
    pub fn max_loc(&self) -> Option<Peak> {
        let mut best: Option<(usize, f64)> = None;
        for (index, &value) in self.values.iter().enumerate() {
            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((index, value));
            }
        }

        best.map(|(index, correlation)| Peak {
            location: Location::new(
                (index % self.width as usize) as u32,
                (index / self.width as usize) as u32,
            ),
            correlation,
        })
    }
}
