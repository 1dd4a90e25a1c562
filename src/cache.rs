use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{Error, Result};

/// 特征图缓存
///
/// 以特征的 key（相对文件名）为键，每个 key 只解码一次，之后所有引用该 key
/// 的特征共享同一份像素数据。缓存只增不减。
#[derive(Debug)]
pub struct ImageCache {
    asset_root: PathBuf,
    default_threshold: f64,
    images: RwLock<HashMap<String, Arc<RgbImage>>>,
}

impl ImageCache {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self::from_config(&Config {
            asset_dir: asset_root.into(),
            ..Config::default()
        })
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            asset_root: config.asset_dir.clone(),
            default_threshold: config.default_threshold,
            images: RwLock::new(HashMap::new()),
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    pub fn default_threshold(&self) -> f64 {
        self.default_threshold
    }

    /// key 对应的绝对路径
    pub fn resolve(&self, key: &str) -> PathBuf {
        let path = self.asset_root.join(key);
        std::path::absolute(&path).unwrap_or(path)
    }

    /// 取得特征图，首次请求时从磁盘解码
    pub fn load(&self, key: &str) -> Result<Arc<RgbImage>> {
        if let Some(image) = self.images.read().get(key) {
            log::trace!("特征图缓存命中: {key}");
            return Ok(Arc::clone(image));
        }

        // 持有写锁解码，同一 key 不会被重复解码
        let mut images = self.images.write();
        if let Some(image) = images.get(key) {
            return Ok(Arc::clone(image));
        }

        let image = Arc::new(self.decode(key)?);
        images.insert(key.to_owned(), Arc::clone(&image));
        Ok(image)
    }

    /// 直接放入已解码的图像；key 已存在时保留原图像
    pub fn insert(&self, key: impl Into<String>, image: RgbImage) -> Arc<RgbImage> {
        let key = key.into();
        let mut images = self.images.write();
        Arc::clone(images.entry(key).or_insert_with(|| Arc::new(image)))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.images.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.read().is_empty()
    }

    fn decode(&self, key: &str) -> Result<RgbImage> {
        let path = self.resolve(key);
        if !path.is_file() {
            return Err(Error::AssetNotFound { key: key.to_owned(), path });
        }

        let image = image::open(&path).map_err(|source| Error::Decode {
            key: key.to_owned(),
            source,
        })?;

        log::debug!("载入特征图 {key} ({}x{}) 自 {}", image.width(), image.height(), path.display());
        Ok(image.to_rgb8())
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
