//! 错误类型

use std::path::PathBuf;

use crate::scene::SceneId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// 特征图文件不存在
    #[error("特征图 `{key}` 不存在: {}", path.display())]
    AssetNotFound { key: String, path: PathBuf },

    /// 特征图无法解码
    #[error("特征图 `{key}` 解码失败: {source}")]
    Decode {
        key: String,
        #[source]
        source: image::ImageError,
    },

    #[error("屏幕图像为空")]
    EmptyScreen,

    #[error("模板图像为空")]
    EmptyTemplate,

    #[error("模板尺寸 {template_width}x{template_height} 大于屏幕尺寸 {screen_width}x{screen_height}")]
    ScreenTooSmall {
        template_width: u32,
        template_height: u32,
        screen_width: u32,
        screen_height: u32,
    },

    /// BGRA 帧的字节数与尺寸不符
    #[error("BGRA 帧 {width}x{height} 需要 {expected} 字节, 实际 {actual} 字节")]
    InvalidFrame { width: u32, height: u32, expected: usize, actual: usize },

    /// 叶子场景没有注册构造函数
    #[error("场景 `{0}` 没有可用的构造函数")]
    NotInstantiable(SceneId),
}
