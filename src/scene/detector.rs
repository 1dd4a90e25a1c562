use rayon::prelude::*;

use crate::error::Result;
use crate::screen::ScreenImage;
use crate::screen_data::ScreenData;

use super::{Scene, SceneId, ScenePath};

/// 场景识别器
///
/// 持有所有已实例化的具体场景，对一张屏幕图像给出当前可能所处的场景。
pub struct SceneDetector {
    scenes: Vec<Box<dyn Scene>>,
}

impl SceneDetector {
    pub fn new(scenes: Vec<Box<dyn Scene>>) -> Self {
        Self { scenes }
    }

    pub fn scenes(&self) -> impl Iterator<Item = &dyn Scene> {
        self.scenes.iter().map(|scene| scene.as_ref())
    }

    pub fn ids(&self) -> Vec<SceneId> {
        self.scenes.iter().map(|scene| scene.id()).collect()
    }

    pub fn scene(&self, id: SceneId) -> Option<&dyn Scene> {
        self.scenes().find(|scene| scene.id() == id)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// 屏幕当前符合的所有场景，按登记顺序排列
    pub fn candidates<'a>(&self, screen: impl Into<ScreenImage<'a>>) -> Result<Vec<SceneId>> {
        // 每帧只准备一次，各场景的特征共享
        let screen = ScreenData::new(screen)?;

        let matched = self
            .scenes
            .par_iter()
            .map(|scene| Ok(scene.matches(&screen)?.then(|| scene.id())))
            .collect::<Result<Vec<Option<SceneId>>>>()?;

        let candidates: Vec<SceneId> = matched.into_iter().flatten().collect();
        log::debug!("场景候选: {candidates:?}");
        Ok(candidates)
    }

    /// 从 `from` 前往 `to` 的检查点特征；`from` 未登记时返回 `None`
    pub fn path(&self, from: SceneId, to: SceneId) -> Option<ScenePath<'_>> {
        self.scene(from).map(|scene| scene.scene_path_to(to))
    }
}

impl std::fmt::Debug for SceneDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneDetector").field("scenes", &self.ids()).finish()
    }
}
