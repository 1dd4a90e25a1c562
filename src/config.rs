use std::path::PathBuf;

/// 特征图默认目录
pub const DEFAULT_ASSET_DIR: &str = "inst/scene/img";
/// 特征默认匹配阈值
pub const DEFAULT_THRESHOLD: f64 = 0.8;

pub const ASSET_DIR_ENV: &str = "SCENE_ASSET_DIR";
pub const THRESHOLD_ENV: &str = "SCENE_MATCH_THRESHOLD";

/// 运行配置
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// 特征图根目录，特征的 key 是相对此目录的文件名
    pub asset_dir: PathBuf,
    /// 未显式指定阈值的特征使用此值
    pub default_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from(DEFAULT_ASSET_DIR),
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Config {
    /// 从环境变量读取，未设置或无效的项使用默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup(ASSET_DIR_ENV).filter(|dir| !dir.is_empty()) {
            config.asset_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(THRESHOLD_ENV) {
            match raw.trim().parse::<f64>() {
                Ok(threshold) if (0.0..=1.0).contains(&threshold) => {
                    config.default_threshold = threshold;
                }
                _ => log::warn!(
                    "{THRESHOLD_ENV}={raw:?} 无效，使用默认阈值 {DEFAULT_THRESHOLD}"
                ),
            }
        }

        config
    }
}
