use std::sync::Arc;

use image::RgbImage;

use crate::cache::ImageCache;
use crate::error::Result;
use crate::matcher::ImageMatcher;
use crate::result::{Location, Peak};
use crate::screen::ScreenImage;
use crate::screen_data::ScreenData;

/// 一次匹配的完整结果
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchOutcome {
    /// 相关系数最大的位置，模板为空时为 `None`
    pub peak: Option<Peak>,
    /// 达到阈值时的左上角位置
    pub top_left: Option<Location>,
    /// 达到阈值时模板中心在屏幕上的位置
    pub center: Option<Location>,
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        self.center.is_some()
    }

    pub fn correlation(&self) -> Option<f64> {
        self.peak.map(|peak| peak.correlation)
    }
}

/// 场景特征
///
/// 一张特征图加上匹配阈值。特征图由 [`ImageCache`] 持有，特征只保存引用，
/// 匹配过程中的中间数据不会留在特征里。
#[derive(Clone)]
pub struct FeatureRule {
    key: String,
    image: Arc<RgbImage>,
    threshold: f64,
    debug: bool,
    last_match: Option<Location>,
}

impl FeatureRule {
    /// 载入特征图，首次载入失败的错误在此返回
    pub fn new(cache: &ImageCache, key: impl Into<String>, threshold: f64) -> Result<Self> {
        let key = key.into();
        let image = cache.load(&key)?;

        Ok(Self {
            key,
            image,
            threshold,
            debug: false,
            last_match: None,
        })
    }

    /// 使用缓存配置的默认阈值
    pub fn load(cache: &ImageCache, key: impl Into<String>) -> Result<Self> {
        Self::new(cache, key, cache.default_threshold())
    }

    /// 开启后每次匹配都会以 info 级别记录最大相关系数及其位置
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn image(&self) -> &Arc<RgbImage> {
        &self.image
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// 最近一次 `find_*` / `is_match` 的结果，仅供参考
    pub fn last_match(&self) -> Option<Location> {
        self.last_match
    }

    fn is_degenerate(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// 计算匹配结果，不修改 `last_match`
    pub fn evaluate<'a>(&self, screen: impl Into<ScreenImage<'a>>) -> Result<MatchOutcome> {
        if self.is_degenerate() {
            return Ok(MatchOutcome::default());
        }
        self.evaluate_prepared(&ScreenData::new(screen)?)
    }

    /// 在已准备好的屏幕上计算匹配结果，同一帧的多个特征可共享 [`ScreenData`]
    pub fn evaluate_prepared(&self, screen: &ScreenData) -> Result<MatchOutcome> {
        if self.is_degenerate() {
            return Ok(MatchOutcome::default());
        }

        let surface = ImageMatcher::new(Arc::clone(&self.image))?.matching(screen)?;
        let peak = surface.max_loc();

        if self.debug {
            log::info!(
                "{}: max_val {:?} max_loc {:?}",
                self.key,
                peak.map(|peak| peak.correlation),
                peak.map(|peak| peak.location)
            );
        }

        let top_left = peak
            .filter(|peak| peak.correlation >= self.threshold)
            .map(|peak| peak.location);
        let center = top_left.map(|location| location.offset(self.image.width() / 2, self.image.height() / 2));

        log::trace!("{}: top_left {:?} center {:?}", self.key, top_left, center);

        Ok(MatchOutcome { peak, top_left, center })
    }

    /// 取得符合特征的位置（左上角），没符合则返回 `None`
    pub fn find_top_left<'a>(&mut self, screen: impl Into<ScreenImage<'a>>) -> Result<Option<Location>> {
        let top_left = self.evaluate(screen)?.top_left;
        self.last_match = top_left;
        Ok(top_left)
    }

    /// 取得符合特征的位置（中心点），没符合则返回 `None`
    pub fn find_center<'a>(&mut self, screen: impl Into<ScreenImage<'a>>) -> Result<Option<Location>> {
        let center = self.evaluate(screen)?.center;
        self.last_match = center;
        Ok(center)
    }

    /// 是否符合特征，同时更新 `last_match` 为中心点
    pub fn is_match<'a>(&mut self, screen: impl Into<ScreenImage<'a>>) -> Result<bool> {
        Ok(self.find_center(screen)?.is_some())
    }
}

impl std::fmt::Debug for FeatureRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureRule")
            .field("key", &self.key)
            .field("size", &self.image.dimensions())
            .field("threshold", &self.threshold)
            .field("debug", &self.debug)
            .field("last_match", &self.last_match)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use image::{DynamicImage, Rgb};

    /// 按线程记录 info 级别的日志
    mod capture {
        use std::sync::Once;
        use std::thread::{self, ThreadId};

        use log::{Level, Log, Metadata, Record};
        use parking_lot::Mutex;

        struct CaptureLogger;

        static LOGGER: CaptureLogger = CaptureLogger;
        static RECORDS: Mutex<Vec<(ThreadId, String)>> = Mutex::new(Vec::new());
        static INSTALL: Once = Once::new();

        impl Log for CaptureLogger {
            fn enabled(&self, metadata: &Metadata) -> bool {
                metadata.level() <= Level::Info
            }

            fn log(&self, record: &Record) {
                if self.enabled(record.metadata()) {
                    RECORDS.lock().push((thread::current().id(), record.args().to_string()));
                }
            }

            fn flush(&self) {}
        }

        pub fn install() {
            INSTALL.call_once(|| {
                log::set_logger(&LOGGER).expect("logger already installed");
                log::set_max_level(log::LevelFilter::Info);
            });
        }

        /// 取出当前线程中以 `key` 开头的记录
        pub fn take(key: &str) -> Vec<String> {
            let current = thread::current().id();
            let mut records = RECORDS.lock();
            let (mine, others): (Vec<_>, Vec<_>) = records
                .drain(..)
                .partition(|(thread, message)| *thread == current && message.starts_with(key));
            *records = others;
            mine.into_iter().map(|(_, message)| message).collect()
        }
    }

    const OFFSET: (u32, u32) = (37, 52);

    fn pattern() -> RgbImage {
        RgbImage::from_fn(24, 16, |x, y| {
            Rgb([(x * 10) as u8, (y * 15) as u8, ((x * y * 7) % 251) as u8])
        })
    }

    fn canvas_with(template: &RgbImage) -> RgbImage {
        let mut canvas = RgbImage::new(200, 200);
        for (x, y, pixel) in template.enumerate_pixels() {
            canvas.put_pixel(OFFSET.0 + x, OFFSET.1 + y, *pixel);
        }
        canvas
    }

    fn cache() -> ImageCache {
        let cache = ImageCache::new("unused");
        cache.insert("pattern.png", pattern());
        cache.insert("empty.png", RgbImage::new(0, 0));
        cache
    }

    #[test]
    fn finds_top_left_of_exact_copy() {
        let cache = cache();
        let screen = canvas_with(&pattern());
        let mut rule = FeatureRule::new(&cache, "pattern.png", 1.0).unwrap();

        assert_eq!(rule.find_top_left(&screen).unwrap(), Some(Location::new(37, 52)));
        assert_eq!(rule.last_match(), Some(Location::new(37, 52)));
    }

    #[test]
    fn finds_center_of_exact_copy() {
        let cache = cache();
        let screen = canvas_with(&pattern());
        let mut rule = FeatureRule::new(&cache, "pattern.png", 0.95).unwrap();

        let center = Location::new(37 + 24 / 2, 52 + 16 / 2);
        assert_eq!(rule.find_center(&screen).unwrap(), Some(center));
        assert_eq!(rule.last_match(), Some(center));
        assert!(rule.is_match(&screen).unwrap());
        assert_eq!(rule.last_match(), Some(center));
    }

    #[test]
    fn accepts_decoded_frames() {
        let cache = cache();
        let frame = DynamicImage::ImageRgb8(canvas_with(&pattern()));
        let mut rule = FeatureRule::load(&cache, "pattern.png").unwrap();

        assert_eq!(rule.threshold(), crate::config::DEFAULT_THRESHOLD);
        assert_eq!(rule.find_top_left(&frame).unwrap(), Some(Location::new(37, 52)));
    }

    #[test]
    fn empty_template_never_matches() {
        let cache = cache();
        let mut rule = FeatureRule::new(&cache, "empty.png", 0.0).unwrap();

        let screen = canvas_with(&pattern());
        assert_eq!(rule.find_center(&screen).unwrap(), None);
        assert_eq!(rule.find_top_left(&screen).unwrap(), None);
        assert!(!rule.is_match(&RgbImage::new(0, 0)).unwrap());
        assert_eq!(rule.last_match(), None);
    }

    #[test]
    fn solid_screen_does_not_match() {
        let cache = cache();
        let mut rule = FeatureRule::new(&cache, "pattern.png", 0.1).unwrap();
        let screen = RgbImage::from_pixel(200, 200, Rgb([30, 200, 90]));

        let outcome = rule.evaluate(&screen).unwrap();
        assert_eq!(outcome.correlation(), Some(0.0));
        assert!(!rule.is_match(&screen).unwrap());
        assert_eq!(rule.last_match(), None);
    }

    #[test]
    fn threshold_is_inclusive() {
        let cache = cache();
        let mut screen = canvas_with(&pattern());
        // 破坏几个像素，使最大相关系数小于 1
        screen.put_pixel(40, 55, Rgb([255, 0, 255]));
        screen.put_pixel(50, 60, Rgb([0, 255, 0]));

        let baseline = FeatureRule::new(&cache, "pattern.png", 0.0).unwrap();
        let best = baseline.evaluate(&screen).unwrap().correlation().unwrap();
        assert!(best < 1.0 && best > 0.5, "best {best}");

        let mut rule = FeatureRule::new(&cache, "pattern.png", best).unwrap();
        assert_eq!(rule.find_top_left(&screen).unwrap(), Some(Location::new(37, 52)));

        let mut strict = FeatureRule::new(&cache, "pattern.png", best + 1e-9).unwrap();
        assert_eq!(strict.find_top_left(&screen).unwrap(), None);
    }

    #[test]
    fn miss_clears_last_match() {
        let cache = cache();
        let hit = canvas_with(&pattern());
        let miss = RgbImage::from_pixel(200, 200, Rgb([0, 0, 0]));
        let mut rule = FeatureRule::new(&cache, "pattern.png", 0.9).unwrap();

        assert!(rule.is_match(&hit).unwrap());
        assert!(rule.last_match().is_some());
        assert!(!rule.is_match(&miss).unwrap());
        assert_eq!(rule.last_match(), None);
    }

    #[test]
    fn evaluate_does_not_touch_last_match() {
        let cache = cache();
        let screen = canvas_with(&pattern());
        let rule = FeatureRule::new(&cache, "pattern.png", 0.9).unwrap().with_debug(true);

        let outcome = rule.evaluate(&screen).unwrap();
        assert!(outcome.is_match());
        assert_eq!(outcome.top_left, Some(Location::new(37, 52)));
        assert_eq!(rule.last_match(), None);
        assert!(rule.debug());
    }

    #[test]
    fn debug_flag_logs_peak_on_hit_and_miss() {
        capture::install();
        let cache = cache();
        cache.insert("debugged.png", pattern());
        let hit = canvas_with(&pattern());
        let miss = RgbImage::from_pixel(200, 200, Rgb([0, 0, 0]));

        let mut rule = FeatureRule::new(&cache, "debugged.png", 0.9).unwrap().with_debug(true);
        assert!(rule.is_match(&hit).unwrap());
        assert!(!rule.is_match(&miss).unwrap());

        let records = capture::take("debugged.png");
        assert_eq!(records.len(), 2, "{records:?}");
        assert_eq!(
            records[0],
            "debugged.png: max_val Some(1.0) max_loc Some(Location { x: 37, y: 52 })"
        );
        assert_eq!(
            records[1],
            "debugged.png: max_val Some(0.0) max_loc Some(Location { x: 0, y: 0 })"
        );

        let mut quiet = FeatureRule::new(&cache, "debugged.png", 0.9).unwrap();
        assert!(quiet.is_match(&hit).unwrap());
        assert!(capture::take("debugged.png").is_empty());
    }

    #[test]
    fn solid_template_matches_at_origin() {
        let cache = cache();
        cache.insert("solid.png", RgbImage::from_pixel(10, 10, Rgb([200, 30, 30])));
        cache.insert("dot.png", RgbImage::from_pixel(1, 1, Rgb([255, 0, 0])));

        let mut screen = RgbImage::from_fn(120, 90, |x, y| Rgb([(x * 2) as u8, (y * 2) as u8, 60]));
        for (x, y, pixel) in RgbImage::from_pixel(10, 10, Rgb([200, 30, 30])).enumerate_pixels() {
            screen.put_pixel(40 + x, 50 + y, *pixel);
        }
        screen.put_pixel(7, 9, Rgb([255, 0, 0]));

        let mut solid = FeatureRule::new(&cache, "solid.png", 0.9).unwrap();
        assert_eq!(solid.evaluate(&screen).unwrap().correlation(), Some(1.0));
        assert_eq!(solid.find_top_left(&screen).unwrap(), Some(Location::new(0, 0)));

        let mut dot = FeatureRule::new(&cache, "dot.png", 1.0).unwrap();
        assert_eq!(dot.find_top_left(&screen).unwrap(), Some(Location::new(0, 0)));
        assert_eq!(dot.find_center(&screen).unwrap(), Some(Location::new(0, 0)));
    }

    #[test]
    fn rule_keeps_no_matching_state_between_calls() {
        let cache = cache();
        let mut rule = FeatureRule::new(&cache, "pattern.png", 0.9).unwrap();
        let before = std::mem::size_of_val(&rule);

        let screen = RgbImage::from_pixel(640, 480, Rgb([90, 90, 90]));
        for _ in 0..3 {
            assert!(!rule.is_match(&screen).unwrap());
        }

        // 只剩缓存和特征本身持有特征图
        assert_eq!(Arc::strong_count(rule.image()), 2);
        assert_eq!(std::mem::size_of_val(&rule), before);
    }

    #[test]
    fn prepared_screen_is_shared_between_rules() {
        let cache = cache();
        let screen = ScreenData::new(&canvas_with(&pattern())).unwrap();
        let first = FeatureRule::new(&cache, "pattern.png", 0.9).unwrap();
        let second = FeatureRule::new(&cache, "pattern.png", 1.0).unwrap();

        assert_eq!(first.evaluate_prepared(&screen).unwrap().top_left, Some(Location::new(37, 52)));
        assert_eq!(second.evaluate_prepared(&screen).unwrap().top_left, Some(Location::new(37, 52)));
    }

    #[test]
    fn matcher_follows_screen_size() {
        let cache = cache();
        let mut rule = FeatureRule::new(&cache, "pattern.png", 0.9).unwrap();

        assert!(rule.is_match(&canvas_with(&pattern())).unwrap());

        let mut small = RgbImage::new(60, 40);
        for (x, y, pixel) in pattern().enumerate_pixels() {
            small.put_pixel(5 + x, 7 + y, *pixel);
        }
        assert_eq!(rule.find_top_left(&small).unwrap(), Some(Location::new(5, 7)));
    }

    #[test]
    fn screen_smaller_than_template_is_an_error() {
        let cache = cache();
        let mut rule = FeatureRule::new(&cache, "pattern.png", 0.9).unwrap();
        let tiny = RgbImage::new(10, 10);
        assert!(matches!(rule.is_match(&tiny), Err(Error::ScreenTooSmall { .. })));
    }

    #[test]
    fn shares_cached_image() {
        let cache = cache();
        let a = FeatureRule::load(&cache, "pattern.png").unwrap();
        let b = a.clone();
        let c = FeatureRule::new(&cache, "pattern.png", 0.5).unwrap();

        assert!(Arc::ptr_eq(a.image(), b.image()));
        assert!(Arc::ptr_eq(a.image(), c.image()));
        assert_eq!(c.key(), "pattern.png");
    }
}
