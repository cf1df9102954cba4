use std::time::Duration;

use instant::Instant;

use crate::{
    config::{AssetDescriptor, BackgroundDescriptor, Settings},
    data_structures::scene_graph::{NodeKeys, SceneAsset, SceneGraph},
    resources::{AssetCache, Loader, texture::CubeTexture},
};

pub type ModelCache = AssetCache<AssetDescriptor, SceneAsset>;
pub type BackgroundCache = AssetCache<BackgroundDescriptor, CubeTexture>;

/// Runtime state shared by the world and everything it owns.
///
/// Constructed once by the host and handed to [`crate::world::World::new`].
pub struct Context {
    pub assets: ModelCache,
    pub backgrounds: BackgroundCache,
    pub scene: Box<dyn SceneGraph>,
    pub settings: Settings,
    pub keys: NodeKeys,
}

impl Context {
    pub fn new(
        models: impl Loader<Source = AssetDescriptor, Output = SceneAsset> + 'static,
        backgrounds: impl Loader<Source = BackgroundDescriptor, Output = CubeTexture> + 'static,
        scene: impl SceneGraph + 'static,
    ) -> Self {
        Self {
            assets: AssetCache::new("model", models),
            backgrounds: AssetCache::new("background", backgrounds),
            scene: Box::new(scene),
            settings: Settings::default(),
            keys: NodeKeys::default(),
        }
    }

    /// Loads still in flight in either cache.
    pub fn pending_loads(&self) -> usize {
        self.assets.pending() + self.backgrounds.pending()
    }
}

/// Measures the wall-clock time between frames.
#[derive(Debug)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    pub fn tick(&mut self) -> Duration {
        let dt = self.last.elapsed();
        self.last = Instant::now();
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
