//! Scene Matching in Rust
//!
//! 通过特征图判断屏幕当前处于哪个场景。
//! 特征匹配使用基于 FFT 的多通道归一化互相关（NCC）模板匹配，
//! 核心算法来源于 J.P. Lewis 的论文：
//! "Fast Normalized Cross-Correlation" (http://scribblethink.org/Work/nvisionInterface/vi95_lewis.pdf)
//!
//! ## 使用方法
//!
//! ```rust,no_run
//! use scene_matching_rs::{FeatureRule, ImageCache};
//!
//! let cache = ImageCache::new("inst/scene/img");
//! let mut rule = FeatureRule::new(&cache, "title/start.png", 0.9)?;
//!
//! let screen = image::open("screen.png")?;
//! if let Some(center) = rule.find_center(&screen)? {
//!     println!("开始按钮位于 ({}, {})", center.x, center.y);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## 模块概览
//! - `cache`：特征图缓存，每个 key 只解码一次
//! - `matcher`：归一化互相关模板匹配
//! - `screen_data`：按帧准备一次的屏幕数据，供所有特征共享
//! - `feature`：场景特征（特征图 + 阈值）
//! - `scene`：场景、场景注册表与场景识别

pub mod cache;
pub mod config;
pub mod error;
pub mod feature;
pub mod matcher;
pub mod result;
pub mod scene;
pub mod screen;
pub mod screen_data;

mod fft;
mod template_data;

pub use cache::ImageCache;
pub use config::Config;
pub use error::{Error, Result};
pub use feature::{FeatureRule, MatchOutcome};
pub use matcher::{match_template, ImageMatcher};
pub use result::{CorrelationSurface, Location, Peak};
pub use scene::{
    MatchPolicy, Scene, SceneClass, SceneDetector, SceneId, ScenePath, SceneRegistry, SceneVariant,
};
pub use screen::ScreenImage;
pub use screen_data::ScreenData;
