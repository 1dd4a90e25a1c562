use std::collections::HashSet;

use crate::cache::ImageCache;
use crate::error::{Error, Result};

use super::{Scene, SceneDetector, SceneId, SceneVariant};

/// 场景构造函数
pub type SceneFactory = fn(&ImageCache) -> Result<Box<dyn Scene>>;

fn build<S: SceneVariant>(cache: &ImageCache) -> Result<Box<dyn Scene>> {
    Ok(Box::new(S::load(cache)?))
}

/// 场景类型树的节点
///
/// 没有子节点的是具体场景（叶子），有子节点的只作为分组。
/// 树由所有权构成，不可能出现环。
#[derive(Debug, Clone)]
pub struct SceneClass {
    id: SceneId,
    factory: Option<SceneFactory>,
    subclasses: Vec<SceneClass>,
}

impl SceneClass {
    /// 分组节点，没有构造函数
    pub fn group(id: SceneId) -> Self {
        Self {
            id,
            factory: None,
            subclasses: Vec::new(),
        }
    }

    pub fn of<S: SceneVariant>() -> Self {
        Self {
            id: S::ID,
            factory: Some(build::<S>),
            subclasses: Vec::new(),
        }
    }

    pub fn with(mut self, subclass: SceneClass) -> Self {
        self.subclasses.push(subclass);
        self
    }

    pub fn with_scene<S: SceneVariant>(self) -> Self {
        self.with(Self::of::<S>())
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn factory(&self) -> Option<SceneFactory> {
        self.factory
    }

    /// 直接子节点
    pub fn subclasses(&self) -> &[SceneClass] {
        &self.subclasses
    }

    pub fn is_leaf(&self) -> bool {
        self.subclasses.is_empty()
    }

    /// 递归展开所有子孙中的叶子节点，分组节点本身不包含在内
    pub fn all_subclasses(&self) -> Vec<&SceneClass> {
        let mut leaves = Vec::new();
        for class in &self.subclasses {
            if class.is_leaf() {
                leaves.push(class);
            } else {
                leaves.extend(class.all_subclasses());
            }
        }
        leaves
    }

    /// 所有具体场景的标识，无顺序
    pub fn all_concrete_variants(&self) -> HashSet<SceneId> {
        self.all_subclasses().into_iter().map(SceneClass::id).collect()
    }
}

/// 场景注册表
///
/// 启动时把所有场景类型登记到一棵以 `scene` 为根的树上。
#[derive(Debug, Clone)]
pub struct SceneRegistry {
    root: SceneClass,
}

impl SceneRegistry {
    pub const ROOT: SceneId = SceneId::new("scene");

    pub fn new() -> Self {
        Self {
            root: SceneClass::group(Self::ROOT),
        }
    }

    pub fn with(mut self, class: SceneClass) -> Self {
        self.root = self.root.with(class);
        self
    }

    pub fn with_scene<S: SceneVariant>(self) -> Self {
        self.with(SceneClass::of::<S>())
    }

    pub fn root(&self) -> &SceneClass {
        &self.root
    }

    pub fn all_concrete_variants(&self) -> HashSet<SceneId> {
        self.root.all_concrete_variants()
    }

    /// 所有叶子节点，同一标识只保留第一次出现
    pub fn concrete_classes(&self) -> Vec<&SceneClass> {
        let mut seen = HashSet::new();
        self.root
            .all_subclasses()
            .into_iter()
            .filter(|class| seen.insert(class.id))
            .collect()
    }

    /// 实例化所有具体场景
    pub fn instantiate(&self, cache: &ImageCache) -> Result<SceneDetector> {
        let scenes = self
            .concrete_classes()
            .into_iter()
            .map(|class| {
                let factory = class.factory.ok_or(Error::NotInstantiable(class.id))?;
                log::debug!("实例化场景 {}", class.id);
                factory(cache)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SceneDetector::new(scenes))
    }
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self::new()
    }
}
