//! Scene entities: floors, buildings, characters, items and the player.
//!
//! There is a single [`Entity`] type for all of them. The category tags what it is,
//! [`Capabilities`] decide what it may do, and the lifecycle is the same for every
//! entity:
//!
//! 1. `request_asset` subscribes to the asset cache
//! 2. `bind_asset` clones the loaded template, scales, places and attaches it
//! 3. `tick` advances the animation mixer every frame
//! 4. `dispose` detaches and releases the instance before the entity is dropped

use std::time::Duration;

use bitflags::bitflags;
use cgmath::{Rad, Rotation3};

use crate::{
    config::{Category, EntityDescriptor},
    context::{Context, ModelCache},
    data_structures::{
        animation::{AnimationEvent, AnimationMixer, AnimationName, transition},
        scene_graph::{Aabb, ModelInstance, NodeKey, SceneGraph},
    },
    error::{EntityError, ScaleError},
    resources::{AssetId, AssetTicket},
};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const MOVABLE = 1;
        const INTERACTABLE = 1 << 1;
        const ANIMATABLE = 1 << 2;
    }
}

impl Category {
    pub fn default_capabilities(&self) -> Capabilities {
        match self {
            Category::Character => Capabilities::ANIMATABLE,
            Category::Building | Category::Floor | Category::Item => Capabilities::empty(),
        }
    }
}

/// Colour of the debug box drawn around an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Indicator {
    #[default]
    Default,
    Colliding,
}

/// Where an interaction with an entity leads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Destination {
    pub environment: Option<u32>,
    pub panel: Option<u32>,
}

/// Computes the uniform scale that gives a model `target_height_cm`.
///
/// A zero target keeps the source scale (`Ok(None)`). Anything that does not yield
/// a finite positive factor is rejected so it never reaches a transform.
pub fn normalize_scale(target_height_cm: f32, source_height_m: f32) -> Result<Option<f32>, ScaleError> {
    if target_height_cm == 0.0 {
        return Ok(None);
    }
    let target_height = target_height_cm / 100.0;
    let factor = target_height / source_height_m;
    if factor.is_finite() && factor > 0.0 {
        Ok(Some(factor))
    } else {
        Err(ScaleError::Invalid {
            factor,
            target_height,
            source_height: source_height_m,
        })
    }
}

pub struct Entity {
    id: u32,
    name: String,
    description: String,
    category: Category,
    capabilities: Capabilities,
    height: f32,
    measured_height: f32,
    speed: f32,
    asset_id: Option<AssetId>,
    ticket: Option<AssetTicket>,
    position: cgmath::Vector3<f32>,
    rotation: cgmath::Vector3<f32>,
    instance: Option<ModelInstance>,
    attached: bool,
    // bounding box helper shown in debug mode
    helper: Option<NodeKey>,
    bounds: Option<Aabb>,
    bounds_revision: u64,
    animation: AnimationName,
    mixer: Option<AnimationMixer>,
    checkpoint: Option<Box<Entity>>,
    destination: Option<Destination>,
    checkpoint_colliding: bool,
    indicator: Indicator,
    camera: bool,
    viewpoint: Option<cgmath::Vector3<f32>>,
}

impl Entity {
    /// Builds an entity from its manifest entry.
    ///
    /// `checkpoint_asset` is used for a linked checkpoint that has no asset of its own.
    /// Inconsistent interaction metadata is reported and leaves the entity
    /// non-interactable.
    pub fn from_descriptor(desc: &EntityDescriptor, checkpoint_asset: Option<AssetId>) -> Self {
        let mut capabilities = desc.category.default_capabilities();
        if desc.can_move {
            capabilities |= Capabilities::MOVABLE;
        }
        let wants_destination = desc.go_to_environment.is_some() || desc.go_to_panel.is_some();

        let mut checkpoint = None;
        let mut destination = None;
        if desc.interactable {
            if desc.checkpoint.is_none() {
                log::warn!("entity '{}' ({}) is interactable, but 'checkpoint' was not provided", desc.name, desc.id);
            }
            if !wants_destination {
                log::warn!(
                    "entity '{}' ({}) is interactable, but neither 'go_to_environment' nor 'go_to_panel' were set",
                    desc.name,
                    desc.id
                );
            }
            checkpoint = desc.checkpoint.as_deref().map(|cp| {
                let mut cp = cp.clone();
                cp.asset = cp.asset.or(checkpoint_asset);
                Box::new(Entity::from_descriptor(&cp, None))
            });
            if checkpoint.is_some() && wants_destination {
                capabilities |= Capabilities::INTERACTABLE;
                destination = Some(Destination {
                    environment: desc.go_to_environment,
                    panel: desc.go_to_panel,
                });
            }
        } else {
            if desc.checkpoint.is_some() {
                log::warn!("entity '{}' ({}) has a 'checkpoint', but is not interactable", desc.name, desc.id);
            }
            if wants_destination {
                log::warn!("entity '{}' ({}) has a destination, but is not interactable", desc.name, desc.id);
            }
        }

        log::debug!("entity '{}' ({}) created as {:?}", desc.name, desc.id, desc.category);
        Self {
            id: desc.id,
            name: desc.name.clone(),
            description: desc.description.clone(),
            category: desc.category,
            capabilities,
            height: desc.height,
            measured_height: 0.0,
            speed: desc.speed,
            asset_id: desc.asset,
            ticket: None,
            position: desc.position.into(),
            rotation: desc.rotation.into(),
            instance: None,
            attached: false,
            helper: None,
            bounds: None,
            bounds_revision: 0,
            animation: AnimationName::None,
            mixer: None,
            checkpoint,
            destination,
            checkpoint_colliding: false,
            indicator: Indicator::Default,
            camera: desc.camera,
            viewpoint: None,
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

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn asset_id(&self) -> Option<AssetId> {
        self.asset_id
    }

    pub fn instance(&self) -> Option<&ModelInstance> {
        self.instance.as_ref()
    }

    pub fn is_instanced(&self) -> bool {
        self.instance.is_some()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Increments every time the bounding volume is recomputed.
    pub fn bounds_revision(&self) -> u64 {
        self.bounds_revision
    }

    /// Height of the instanced model as measured from its bounding volume.
    pub fn measured_height(&self) -> f32 {
        self.measured_height
    }

    pub fn animation(&self) -> AnimationName {
        self.animation
    }

    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.mixer.as_ref()
    }

    pub fn checkpoint(&self) -> Option<&Entity> {
        self.checkpoint.as_deref()
    }

    pub fn destination(&self) -> Option<Destination> {
        self.destination
    }

    pub fn is_interactable(&self) -> bool {
        self.capabilities.contains(Capabilities::INTERACTABLE)
    }

    pub fn is_checkpoint_colliding(&self) -> bool {
        self.checkpoint_colliding
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn debug_helper(&self) -> Option<NodeKey> {
        self.helper
    }

    pub fn viewpoint_position(&self) -> Option<cgmath::Vector3<f32>> {
        let offset = self.viewpoint?;
        self.instance
            .as_ref()
            .map(|instance| instance.transform.transform_point(offset))
    }

    /// True while this entity holds an unresolved subscription for `id` and has no instance.
    pub fn awaits(&self, id: AssetId) -> bool {
        self.instance.is_none() && self.asset_id == Some(id) && self.ticket.is_some()
    }

    /// Subscribes this entity (and its checkpoint) to its asset.
    ///
    /// Returns `false` if nothing could be requested; the reason is logged.
    pub fn request_asset(&mut self, assets: &mut ModelCache) -> bool {
        if let Some(checkpoint) = self.checkpoint.as_mut() {
            checkpoint.request_asset(assets);
        }
        let Some(id) = self.asset_id else {
            log::error!("{}", EntityError::NoAsset(self.id));
            return false;
        };
        if self.instance.is_some() {
            log::warn!("entity '{}' is already instanced, asset {} not requested", self.name, id);
            return false;
        }
        match assets.request(id) {
            Ok(ticket) => {
                self.ticket = Some(ticket);
                true
            }
            Err(e) => {
                log::error!("entity '{}' can't request its asset: {}", self.name, e);
                false
            }
        }
    }

    /// Binds `id` to this entity and to its checkpoint where they wait for it.
    /// Returns how many instances were created.
    pub fn on_asset_loaded(&mut self, id: AssetId, ctx: &mut Context) -> usize {
        let mut bound = 0;
        if self.awaits(id) && self.bind_asset(id, ctx).is_ok() {
            bound += 1;
        }
        if let Some(checkpoint) = self.checkpoint.as_mut() {
            if checkpoint.awaits(id) && checkpoint.bind_asset(id, ctx).is_ok() {
                bound += 1;
            }
        }
        bound
    }

    /// Drops the subscription for a load that failed; the entity stays uninstanced.
    pub fn on_asset_failed(&mut self, id: AssetId) {
        if self.awaits(id) {
            if let Some(Err(e)) = self.ticket.as_mut().and_then(AssetTicket::try_resolve) {
                log::warn!("entity '{}' stays without instance: {}", self.name, e);
            }
            self.ticket = None;
        }
        if let Some(checkpoint) = self.checkpoint.as_mut() {
            checkpoint.on_asset_failed(id);
        }
    }

    /// Clones the cached asset into this entity, normalizes its scale, applies the
    /// configured placement and attaches it to the scene graph.
    pub fn bind_asset(&mut self, id: AssetId, ctx: &mut Context) -> Result<(), EntityError> {
        if !self.awaits(id) {
            return Err(EntityError::NotAwaiting {
                entity: self.id,
                asset: id,
            });
        }
        let template = ctx.assets.get(id).ok_or(EntityError::AssetUnavailable(id))?;
        let mut instance = ModelInstance::instantiate(ctx.keys.next(), template);
        log::info!("entity '{}' - asset with id '{}' cloned", self.name, id);

        let source_height = instance.world_bounds().map_or(0.0, |bounds| bounds.height());
        match normalize_scale(self.height, source_height) {
            Ok(Some(factor)) => instance.transform.scale = cgmath::Vector3::new(factor, factor, factor),
            Ok(None) => log::debug!("entity '{}' has no height set. Preserve asset height.", self.name),
            Err(e) => log::error!("entity '{}' keeps its source scale: {}", self.name, e),
        }

        // never below the ground plane
        instance.transform.position += cgmath::Vector3::new(
            self.position.x,
            self.position.y.max(0.0),
            self.position.z,
        );
        instance
            .transform
            .rotate_local(cgmath::Vector3::unit_x(), Rad(self.rotation.x));
        instance
            .transform
            .rotate_local(cgmath::Vector3::unit_y(), Rad(self.rotation.y));
        instance
            .transform
            .rotate_local(cgmath::Vector3::unit_z(), Rad(self.rotation.z));

        // any model that ships clips can animate, whatever its category
        if !instance.template().clips.is_empty() {
            self.capabilities |= Capabilities::ANIMATABLE;
        }
        if self.capabilities.contains(Capabilities::ANIMATABLE) {
            self.mixer = Some(AnimationMixer::new(&instance));
        }
        let key = instance.key();
        self.instance = Some(instance);
        self.ticket = None;

        self.animation = AnimationName::None;
        self.set_animation(AnimationName::Idle);
        self.update_bounds();

        if self.camera {
            self.viewpoint = Some(ctx.settings.camera_offset.into());
        }
        ctx.scene.add(key);
        self.attached = true;
        if ctx.settings.debug {
            let helper = ctx.keys.next();
            ctx.scene.add(helper);
            self.helper = Some(helper);
            log::info!("entity '{}' bounds {:?}", self.name, self.bounds);
        }
        log::info!("entity '{}' bound to asset {}", self.name, id);
        Ok(())
    }

    /// Recomputes the bounding volume and the measured height from the instance.
    pub fn update_bounds(&mut self) {
        let Some(instance) = self.instance.as_ref() else {
            return;
        };
        self.bounds = instance.world_bounds();
        self.measured_height = self.bounds.map_or(0.0, |bounds| bounds.height());
        self.bounds_revision += 1;
    }

    /// Switches to `name`, stopping whatever played before. Returns whether the state changed.
    pub fn set_animation(&mut self, name: AnimationName) -> bool {
        self.apply(AnimationEvent::Play(name))
    }

    fn apply(&mut self, event: AnimationEvent) -> bool {
        let next = transition(self.animation, event);
        if next == self.animation {
            return false;
        }
        self.animation = next;
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.stop_all();
            if next != AnimationName::None && !mixer.play(next) {
                log::debug!("entity '{}' has no '{}' clip", self.name, next);
            }
        }
        true
    }

    /// Marks this entity and its checkpoint as (not) overlapping the player and
    /// derives the matching animation. Returns whether anything changed.
    pub fn set_checkpoint_colliding(&mut self, colliding: bool) -> bool {
        if self.checkpoint_colliding == colliding {
            return false;
        }
        let indicator = if colliding {
            Indicator::Colliding
        } else {
            Indicator::Default
        };
        self.checkpoint_colliding = colliding;
        self.indicator = indicator;
        if let Some(checkpoint) = self.checkpoint.as_mut() {
            checkpoint.checkpoint_colliding = colliding;
            checkpoint.indicator = indicator;
        }
        self.apply(if colliding {
            AnimationEvent::CheckpointEntered
        } else {
            AnimationEvent::CheckpointLeft
        });
        true
    }

    /// Sets an absolute placement: position plus a yaw around the vertical axis.
    pub fn set_placement(&mut self, position: cgmath::Vector3<f32>, yaw: f32) -> Result<(), EntityError> {
        let instance = self.instance.as_mut().ok_or(EntityError::NotInstanced(self.id))?;
        instance.transform.position = position;
        instance.transform.rotation = cgmath::Quaternion::from_angle_y(Rad(yaw));
        self.update_bounds();
        Ok(())
    }

    pub fn rotate_y(&mut self, angle: f32) -> Result<(), EntityError> {
        let instance = self.instance.as_mut().ok_or(EntityError::NotInstanced(self.id))?;
        instance
            .transform
            .rotate_local(cgmath::Vector3::unit_y(), Rad(angle));
        Ok(())
    }

    /// Moves along the local z axis. The bounding volume is left stale on purpose;
    /// callers batch the recompute with [`Entity::update_bounds`].
    pub fn translate_z(&mut self, distance: f32) -> Result<(), EntityError> {
        let instance = self.instance.as_mut().ok_or(EntityError::NotInstanced(self.id))?;
        instance.transform.translate_local_z(distance);
        Ok(())
    }

    /// Detaches the instance from the scene graph without releasing it.
    pub fn detach(&mut self, scene: &mut dyn SceneGraph) {
        if let Some(instance) = self.instance.as_ref() {
            if self.attached {
                scene.remove(instance.key());
                self.attached = false;
            }
        }
        if let Some(helper) = self.helper.take() {
            scene.remove(helper);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Releases the instance of this entity and of its checkpoint.
    /// Returns the number of released meshes.
    pub fn dispose(&mut self, scene: &mut dyn SceneGraph) -> usize {
        self.ticket = None;
        let mut released = self
            .checkpoint
            .as_mut()
            .map_or(0, |checkpoint| checkpoint.dispose(scene));
        if let Some(instance) = self.instance.take() {
            log::debug!("disposing '{}' ({})", self.name, self.id);
            if self.attached {
                scene.remove(instance.key());
                self.attached = false;
            }
            released += instance.release();
        }
        if let Some(helper) = self.helper.take() {
            scene.remove(helper);
        }
        self.mixer = None;
        self.bounds = None;
        self.viewpoint = None;
        released
    }

    pub fn tick(&mut self, dt: Duration) {
        if let (Some(mixer), Some(instance)) = (self.mixer.as_mut(), self.instance.as_mut()) {
            mixer.update(dt.as_secs_f32(), instance);
        }
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        if self.instance.is_some() {
            log::warn!("entity '{}' ({}) dropped without dispose", self.name, self.id);
        }
    }
}
