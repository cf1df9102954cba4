//! Static world configuration.
//!
//! A world is described by a RON manifest: the asset and background catalogs, the
//! World-owned player and checkpoint entities, every environment with its entity
//! lists and lights, the controller bindings and a few runtime settings. The core
//! only ever reads it; it is validated once before the world is built.

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};
use winit::{event::MouseButton, keyboard::KeyCode};

use crate::{error::ConfigError, resources::AssetId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Character,
    Building,
    Floor,
    Item,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetFormat {
    #[default]
    Gltf,
    Draco,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub id: AssetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub format: AssetFormat,
    pub category: Category,
}

/// A cube texture background: six faces below `base_path`, ordered px, nx, py, ny, pz, nz.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackgroundDescriptor {
    pub id: AssetId,
    pub name: String,
    pub base_path: String,
    pub faces: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    /// Target height in centimetres; zero keeps the height of the source asset.
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub asset: Option<AssetId>,
    #[serde(default)]
    pub position: [f32; 3],
    /// Euler angles in radians, applied in x, y, z order.
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default)]
    pub speed: f32,
    #[serde(default)]
    pub can_move: bool,
    #[serde(default)]
    pub interactable: bool,
    #[serde(default)]
    pub checkpoint: Option<Box<EntityDescriptor>>,
    #[serde(default)]
    pub go_to_environment: Option<u32>,
    #[serde(default)]
    pub go_to_panel: Option<u32>,
    /// Carries the render viewpoint once instanced.
    #[serde(default)]
    pub camera: bool,
}

impl EntityDescriptor {
    pub fn new(id: u32, name: impl Into<String>, category: Category) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            category,
            height: 0.0,
            asset: None,
            position: [0.0; 3],
            rotation: [0.0; 3],
            speed: 0.0,
            can_move: false,
            interactable: false,
            checkpoint: None,
            go_to_environment: None,
            go_to_panel: None,
            camera: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Ambient,
    Directional,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightDescriptor {
    pub kind: LightKind,
    #[serde(default = "white")]
    pub colour: [f32; 3],
    #[serde(default = "one")]
    pub intensity: f32,
    #[serde(default)]
    pub position: [f32; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDescriptor {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub spawn_position: [f32; 3],
    #[serde(default)]
    pub spawn_yaw: f32,
    #[serde(default)]
    pub background: Option<AssetId>,
    #[serde(default)]
    pub floor: Option<EntityDescriptor>,
    #[serde(default)]
    pub characters: Vec<EntityDescriptor>,
    #[serde(default)]
    pub buildings: Vec<EntityDescriptor>,
    #[serde(default)]
    pub items: Vec<EntityDescriptor>,
    #[serde(default)]
    pub lights: Vec<LightDescriptor>,
}

impl EnvironmentDescriptor {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            default: false,
            spawn_position: [0.0; 3],
            spawn_yaw: 0.0,
            background: None,
            floor: None,
            characters: Vec::new(),
            buildings: Vec::new(),
            items: Vec::new(),
            lights: Vec::new(),
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.floor
            .iter()
            .chain(&self.characters)
            .chain(&self.buildings)
            .chain(&self.items)
    }
}

/// A normalized input code: a physical key or a mouse button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputCode {
    Key(KeyCode),
    Mouse(MouseButton),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub forward: Vec<InputCode>,
    pub backward: Vec<InputCode>,
    pub left: Vec<InputCode>,
    pub right: Vec<InputCode>,
    pub explore: Vec<InputCode>,
    pub interact: Vec<InputCode>,
    /// Yaw applied per tick while turning, in radians.
    pub rotation_step: f32,
    /// Distance per tick is `speed * delta_ms / translation_divisor`.
    pub translation_divisor: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            forward: vec![InputCode::Key(KeyCode::ArrowUp), InputCode::Key(KeyCode::KeyW)],
            backward: vec![InputCode::Key(KeyCode::ArrowDown), InputCode::Key(KeyCode::KeyS)],
            left: vec![InputCode::Key(KeyCode::ArrowLeft), InputCode::Key(KeyCode::KeyA)],
            right: vec![InputCode::Key(KeyCode::ArrowRight), InputCode::Key(KeyCode::KeyD)],
            explore: vec![InputCode::Mouse(MouseButton::Left)],
            interact: vec![InputCode::Key(KeyCode::Space)],
            rotation_step: 0.05,
            translation_divisor: 80.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub debug: bool,
    /// Offset of the render viewpoint relative to the camera-bearing entity (up and behind).
    pub camera_offset: [f32; 3],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            camera_offset: [0.0, 3.0, 6.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub assets: Vec<AssetDescriptor>,
    #[serde(default)]
    pub backgrounds: Vec<BackgroundDescriptor>,
    pub player: EntityDescriptor,
    pub checkpoint: EntityDescriptor,
    pub environments: Vec<EnvironmentDescriptor>,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub settings: Settings,
}

impl Manifest {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let manifest: Manifest = ron::from_str(text)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::info!("reading world manifest {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Rejects manifests whose ids are ambiguous.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environments.is_empty() {
            log::error!("No environment available");
            return Err(ConfigError::NoEnvironments);
        }
        unique("asset", self.assets.iter().map(|asset| asset.id.0))?;
        unique("background", self.backgrounds.iter().map(|bg| bg.id.0))?;
        unique("environment", self.environments.iter().map(|env| env.id))?;
        // the player and the checkpoint template live in every environment
        let world_owned = [self.player.id, self.checkpoint.id];
        for environment in &self.environments {
            let linked = environment
                .entities()
                .filter_map(|entity| entity.checkpoint.as_deref())
                .map(|checkpoint| checkpoint.id);
            let ids = environment
                .entities()
                .map(|entity| entity.id)
                .chain(linked)
                .chain(world_owned);
            unique("entity", ids)?;
        }
        Ok(())
    }

    pub fn environment(&self, id: u32) -> Option<&EnvironmentDescriptor> {
        self.environments.iter().find(|env| env.id == id)
    }

    pub fn default_environment(&self) -> Result<&EnvironmentDescriptor, ConfigError> {
        let mut defaults = self.environments.iter().filter(|env| env.default);
        let first = defaults.next().ok_or_else(|| {
            log::error!("No default environments found.");
            ConfigError::NoDefaultEnvironment
        })?;
        if defaults.next().is_some() {
            log::warn!("More default environments found. Got the first one.");
        }
        Ok(first)
    }

    /// Looks an environment up by name; an empty name yields the default one.
    pub fn named_environment(&self, name: &str) -> Result<&EnvironmentDescriptor, ConfigError> {
        if name.is_empty() {
            return self.default_environment();
        }
        let mut matches = self.environments.iter().filter(|env| env.name == name);
        let first = matches.next().ok_or_else(|| {
            log::error!("No environments with name '{}' found.", name);
            ConfigError::UnknownEnvironmentName(name.to_string())
        })?;
        if matches.next().is_some() {
            log::warn!("More environments with name '{}' found. Got the first one.", name);
        }
        Ok(first)
    }
}

fn unique(kind: &'static str, ids: impl Iterator<Item = u32>) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            log::error!("There are {}s with duplicate id {}", kind, id);
            return Err(ConfigError::DuplicateId { kind, id });
        }
    }
    Ok(())
}

fn white() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn one() -> f32 {
    1.0
}
