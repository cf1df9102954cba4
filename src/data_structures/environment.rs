//! One explorable scene: its entities, lights and background.
//!
//! An environment is built from its manifest entry, becomes the instancing target
//! on [`Environment::activate`] and is consumed by [`Environment::teardown`], which
//! disposes everything it owns. The player and the global checkpoint belong to
//! the world and are only placed here.

use std::{sync::Arc, time::Duration};

use crate::{
    config::{Category, EnvironmentDescriptor, LightDescriptor, LightKind},
    context::Context,
    data_structures::{
        entity::Entity,
        scene_graph::{NodeKey, SceneGraph},
    },
    error::{AssetError, EntityError},
    resources::{AssetId, AssetTicket, texture::CubeTexture},
};

#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub key: NodeKey,
    pub kind: LightKind,
    pub colour: cgmath::Vector3<f32>,
    pub intensity: f32,
    pub position: cgmath::Vector3<f32>,
}

/// What a teardown released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub entities: usize,
    pub meshes: usize,
    pub lights: usize,
}

pub struct Environment {
    id: u32,
    name: String,
    description: String,
    default: bool,
    spawn_position: cgmath::Vector3<f32>,
    spawn_yaw: f32,
    background_id: Option<AssetId>,
    background_ticket: Option<AssetTicket>,
    background: Option<Arc<CubeTexture>>,
    entities: Vec<Entity>,
    light_descriptors: Vec<LightDescriptor>,
    lights: Vec<Light>,
    active: bool,
}

impl Environment {
    pub fn from_descriptor(desc: &EnvironmentDescriptor, checkpoint_asset: Option<AssetId>) -> Self {
        let entities = desc
            .entities()
            .map(|entity| Entity::from_descriptor(entity, checkpoint_asset))
            .collect::<Vec<_>>();
        log::info!("environment '{}' ({}) built with {} entities", desc.name, desc.id, entities.len());
        Self {
            id: desc.id,
            name: desc.name.clone(),
            description: desc.description.clone(),
            default: desc.default,
            spawn_position: desc.spawn_position.into(),
            spawn_yaw: desc.spawn_yaw,
            background_id: desc.background,
            background_ticket: None,
            background: None,
            entities,
            light_descriptors: desc.lights.clone(),
            lights: Vec::new(),
            active: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_default(&self) -> bool {
        self.default
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn background(&self) -> Option<&Arc<CubeTexture>> {
        self.background.as_ref()
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn entity(&self, id: u32) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    pub fn entity_mut(&mut self, id: u32) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id() == id)
    }

    pub fn floor(&self) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|entity| entity.category() == Category::Floor)
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |entity| entity.category() == category)
    }

    /// Makes this environment the instancing target: attaches the lights and
    /// requests the background and every entity asset. A second call is a no-op.
    ///
    /// Returns the number of entity asset requests that were made.
    pub fn activate(&mut self, ctx: &mut Context) -> usize {
        if self.active {
            log::warn!("environment '{}' is already active", self.name);
            return 0;
        }
        self.active = true;

        if let Some(id) = self.background_id {
            match ctx.backgrounds.request(id) {
                Ok(ticket) => self.background_ticket = Some(ticket),
                Err(e) => log::error!("environment '{}' can't load its background: {}", self.name, e),
            }
        }

        self.lights = self
            .light_descriptors
            .iter()
            .map(|light| {
                let key = ctx.keys.next();
                ctx.scene.add(key);
                Light {
                    key,
                    kind: light.kind,
                    colour: light.colour.into(),
                    intensity: light.intensity,
                    position: light.position.into(),
                }
            })
            .collect();

        let requested = self
            .entities
            .iter_mut()
            .map(|entity| entity.request_asset(&mut ctx.assets))
            .filter(|requested| *requested)
            .count();
        log::info!(
            "environment '{}' activated: {} asset requests, {} lights",
            self.name,
            requested,
            self.lights.len()
        );
        requested
    }

    /// Binds `id` to every owned entity still waiting for it.
    pub fn on_asset_loaded(&mut self, id: AssetId, ctx: &mut Context) -> usize {
        self.entities
            .iter_mut()
            .map(|entity| entity.on_asset_loaded(id, ctx))
            .sum()
    }

    pub fn on_asset_failed(&mut self, id: AssetId) {
        self.entities
            .iter_mut()
            .for_each(|entity| entity.on_asset_failed(id));
    }

    /// Takes the background once its load finished. Returns whether it was ours.
    pub fn on_background_loaded(&mut self, id: AssetId, ctx: &Context) -> bool {
        if self.background_id != Some(id) || self.background_ticket.take().is_none() {
            return false;
        }
        self.background = ctx.backgrounds.get(id);
        log::info!("environment '{}' - background {} set", self.name, id);
        self.background.is_some()
    }

    pub fn on_background_failed(&mut self, id: AssetId, error: &AssetError) {
        if self.background_id == Some(id) && self.background_ticket.take().is_some() {
            log::warn!("environment '{}' stays without background: {}", self.name, error);
        }
    }

    /// Moves the player to this environment's spawn point.
    pub fn attach_player(&self, player: &mut Entity) -> Result<(), EntityError> {
        player.set_placement(self.spawn_position, self.spawn_yaw)?;
        log::info!("player placed in environment '{}'", self.name);
        Ok(())
    }

    pub fn tick(&mut self, dt: Duration) {
        self.entities.iter_mut().for_each(|entity| entity.tick(dt));
    }

    /// Disposes every owned entity and detaches the lights.
    pub fn teardown(mut self, scene: &mut dyn SceneGraph) -> TeardownReport {
        let mut report = TeardownReport::default();
        for entity in self.entities.iter_mut() {
            if entity.is_instanced() {
                report.entities += 1;
            }
            report.meshes += entity.dispose(scene);
        }
        for light in self.lights.drain(..) {
            scene.remove(light.key);
            report.lights += 1;
        }
        log::info!(
            "environment '{}' torn down: {} entities, {} meshes, {} lights",
            self.name,
            report.entities,
            report.meshes,
            report.lights
        );
        report
    }
}
