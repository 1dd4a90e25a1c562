use image::{Rgb, RgbImage};
use scene_matching_rs::{
    FeatureRule, ImageCache, Scene, SceneClass, SceneId, ScenePath, SceneRegistry, SceneVariant,
};

/// 标题画面：标志 + 开始按钮
struct Title {
    rules: Vec<FeatureRule>,
    start: FeatureRule,
}

impl Scene for Title {
    fn id(&self) -> SceneId {
        Self::ID
    }

    fn feature_rules(&self) -> &[FeatureRule] {
        &self.rules
    }

    fn scene_path_to(&self, target: SceneId) -> ScenePath<'_> {
        if target == Lobby::ID {
            Box::new(std::iter::once(self.start.clone()))
        } else {
            Box::new(std::iter::empty())
        }
    }
}

impl SceneVariant for Title {
    const ID: SceneId = SceneId::new("title");

    fn load(cache: &ImageCache) -> scene_matching_rs::Result<Self> {
        Ok(Self {
            rules: vec![FeatureRule::new(cache, "logo", 0.9)?],
            start: FeatureRule::new(cache, "start", 0.9)?,
        })
    }
}

struct Lobby {
    rules: Vec<FeatureRule>,
}

impl Scene for Lobby {
    fn id(&self) -> SceneId {
        Self::ID
    }

    fn feature_rules(&self) -> &[FeatureRule] {
        &self.rules
    }
}

impl SceneVariant for Lobby {
    const ID: SceneId = SceneId::new("lobby");

    fn load(cache: &ImageCache) -> scene_matching_rs::Result<Self> {
        Ok(Self {
            rules: vec![FeatureRule::load(cache, "lobby")?.with_debug(true)],
        })
    }
}

fn generate_template(width: u32, height: u32, seed: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 7 + seed) % 256) as u8,
            ((y * 11 + seed * 3) % 256) as u8,
            ((x * y + seed) % 256) as u8,
        ])
    })
}

fn paste(screen: &mut RgbImage, template: &RgbImage, left: u32, top: u32) {
    for (x, y, pixel) in template.enumerate_pixels() {
        screen.put_pixel(left + x, top + y, *pixel);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== 场景识别示例 (合成的 1024x768 屏幕) ===");

    let logo = generate_template(120, 40, 5);
    let start = generate_template(60, 24, 90);
    let lobby = generate_template(50, 50, 170);

    // 用内存中的图像代替特征图目录
    let cache = ImageCache::new("inst/scene/img");
    cache.insert("logo", logo.clone());
    cache.insert("start", start.clone());
    cache.insert("lobby", lobby);

    let registry = SceneRegistry::new()
        .with_scene::<Title>()
        .with(SceneClass::group(SceneId::new("menu")).with_scene::<Lobby>());
    println!("具体场景: {:?}", registry.all_concrete_variants());

    let detector = registry.instantiate(&cache)?;

    let mut screen = RgbImage::from_pixel(1024, 768, Rgb([24, 24, 32]));
    paste(&mut screen, &logo, 452, 120);
    paste(&mut screen, &start, 482, 560);

    println!("执行场景识别...");
    let start_time = std::time::Instant::now();
    let candidates = detector.candidates(&screen)?;
    println!("识别完成，耗时: {}ms", start_time.elapsed().as_millis());
    println!("当前场景: {:?}", candidates);

    let Some(path) = detector.path(Title::ID, Lobby::ID) else {
        return Ok(());
    };

    for mut checkpoint in path {
        match checkpoint.find_center(&screen)? {
            Some(center) => println!("检查点 {} 位于 ({}, {})", checkpoint.key(), center.x, center.y),
            None => println!("检查点 {} 未出现", checkpoint.key()),
        }
    }

    Ok(())
}
