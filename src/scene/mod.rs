//! 场景
//!
//! 场景由一组特征（指纹）描述。具体场景类型通过 [`SceneRegistry`] 在启动时登记，
//! 分组节点只用于组织，不参与匹配。

mod detector;
mod registry;

pub use detector::SceneDetector;
pub use registry::{SceneClass, SceneFactory, SceneRegistry};

use crate::cache::ImageCache;
use crate::error::Result;
use crate::feature::FeatureRule;
use crate::screen_data::ScreenData;

/// 场景类型标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(&'static str);

impl SceneId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// 前往目标场景途中依次要确认的特征，惰性产生
pub type ScenePath<'a> = Box<dyn Iterator<Item = FeatureRule> + 'a>;

/// 场景特征的组合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// 所有特征都符合
    #[default]
    All,
    /// 任一特征符合
    Any,
}

pub trait Scene: Send + Sync {
    fn id(&self) -> SceneId;

    /// 场景的指纹特征，按顺序匹配
    fn feature_rules(&self) -> &[FeatureRule];

    fn match_policy(&self) -> MatchPolicy {
        MatchPolicy::All
    }

    /// 定义前往目标场景可走的路径
    ///
    /// 每个元素是一个检查点特征，由调用方逐个等待并处理。默认没有路径。
    fn scene_path_to(&self, _target: SceneId) -> ScenePath<'_> {
        Box::new(std::iter::empty())
    }

    /// 屏幕是否呈现此场景；没有特征的场景永远不符合
    fn matches(&self, screen: &ScreenData) -> Result<bool> {
        let rules = self.feature_rules();
        if rules.is_empty() {
            return Ok(false);
        }

        match self.match_policy() {
            MatchPolicy::All => {
                for rule in rules {
                    if !rule.evaluate_prepared(screen)?.is_match() {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            MatchPolicy::Any => {
                for rule in rules {
                    if rule.evaluate_prepared(screen)?.is_match() {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

/// 可由注册表实例化的具体场景
pub trait SceneVariant: Scene + Sized + 'static {
    const ID: SceneId;

    fn load(cache: &ImageCache) -> Result<Self>;
}
