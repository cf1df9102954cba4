//! The runtime root: the active environment, the player and the global checkpoint.
//!
//! All asset completions enter through [`World::pump_assets`]. The player and the
//! checkpoint template are served first, then the active environment. Switching
//! environments tears the previous one down before the next one requests
//! anything, so a late completion can only ever bind into the active environment.

use std::time::Duration;

use crate::{
    config::{InputCode, Manifest},
    context::Context,
    controller::{Controller, InputResponse},
    data_structures::{
        animation::AnimationName,
        entity::{Destination, Entity},
        environment::{Environment, TeardownReport},
    },
    error::{AssetError, WorldError},
    resources::{AssetEvent, AssetId},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvironmentChange {
    /// The requested environment was already active.
    Unchanged,
    Switched {
        from: Option<u32>,
        to: u32,
        teardown: Option<TeardownReport>,
    },
}

/// The player interacted with an entity while standing in its checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interaction {
    pub entity: u32,
    pub destination: Destination,
}

pub struct World {
    ctx: Context,
    manifest: Manifest,
    environment: Option<Environment>,
    player: Entity,
    checkpoint: Entity,
    controller: Option<Controller>,
}

impl World {
    /// Registers the asset catalogs and requests the player and checkpoint assets.
    /// No environment is active until [`World::start`] or [`World::change_environment`].
    pub fn new(mut ctx: Context, manifest: Manifest) -> Result<Self, WorldError> {
        manifest.validate()?;
        for asset in &manifest.assets {
            ctx.assets.register(asset.id, asset.clone())?;
        }
        for background in &manifest.backgrounds {
            ctx.backgrounds.register(background.id, background.clone())?;
        }
        ctx.settings = manifest.settings.clone();

        let mut player = Entity::from_descriptor(&manifest.player, None);
        let mut checkpoint = Entity::from_descriptor(&manifest.checkpoint, None);
        player.request_asset(&mut ctx.assets);
        checkpoint.request_asset(&mut ctx.assets);
        log::info!(
            "world created: {} assets, {} backgrounds, {} environments",
            manifest.assets.len(),
            manifest.backgrounds.len(),
            manifest.environments.len()
        );

        Ok(Self {
            ctx,
            manifest,
            environment: None,
            player,
            checkpoint,
            controller: None,
        })
    }

    /// Activates the default environment.
    pub fn start(&mut self) -> Result<EnvironmentChange, WorldError> {
        let id = self.manifest.default_environment()?.id;
        self.change_environment(id)
    }

    /// Replaces the active environment with environment `id`.
    ///
    /// An unknown id fails before anything is torn down.
    pub fn change_environment(&mut self, id: u32) -> Result<EnvironmentChange, WorldError> {
        let current = self.environment.as_ref().map(Environment::id);
        if current == Some(id) {
            log::warn!("environment {} is already active", id);
            return Ok(EnvironmentChange::Unchanged);
        }
        let Some(desc) = self.manifest.environment(id) else {
            log::error!("No environments with id '{}' found.", id);
            return Err(WorldError::UnknownEnvironment(id));
        };
        let mut next = Environment::from_descriptor(desc, self.checkpoint.asset_id());

        let teardown = self
            .environment
            .take()
            .map(|previous| previous.teardown(self.ctx.scene.as_mut()));

        next.activate(&mut self.ctx);
        if self.player.is_instanced() {
            if let Err(e) = next.attach_player(&mut self.player) {
                log::error!("can't place the player: {}", e);
            }
        }
        log::info!("environment changed from {:?} to {}", current, id);
        self.environment = Some(next);

        Ok(EnvironmentChange::Switched {
            from: current,
            to: id,
            teardown,
        })
    }

    /// Drains both asset caches and routes every completion. Returns the number of
    /// instances bound.
    pub fn pump_assets(&mut self) -> usize {
        let mut bound = 0;
        for event in self.ctx.assets.poll() {
            match event {
                AssetEvent::Loaded(id) => bound += self.on_asset_loaded(id),
                AssetEvent::Failed(id, e) => self.on_asset_failed(id, &e),
            }
        }
        for event in self.ctx.backgrounds.poll() {
            let Some(environment) = self.environment.as_mut() else {
                continue;
            };
            match event {
                AssetEvent::Loaded(id) => {
                    environment.on_background_loaded(id, &self.ctx);
                }
                AssetEvent::Failed(id, e) => environment.on_background_failed(id, &e),
            }
        }
        bound
    }

    /// Offers a loaded model to the player, the checkpoint template and the
    /// active environment, in that order.
    pub fn on_asset_loaded(&mut self, id: AssetId) -> usize {
        let mut bound = 0;
        if self.player.awaits(id) {
            match self.player.bind_asset(id, &mut self.ctx) {
                Ok(()) => {
                    bound += 1;
                    self.on_player_bound();
                }
                Err(e) => log::error!("can't bind the player: {}", e),
            }
        }
        if self.checkpoint.awaits(id) {
            match self.checkpoint.bind_asset(id, &mut self.ctx) {
                Ok(()) => {
                    bound += 1;
                    // only a template for the linked checkpoints
                    self.checkpoint.detach(self.ctx.scene.as_mut());
                }
                Err(e) => log::error!("can't bind the checkpoint template: {}", e),
            }
        }
        if let Some(environment) = self.environment.as_mut() {
            bound += environment.on_asset_loaded(id, &mut self.ctx);
        }
        bound
    }

    fn on_asset_failed(&mut self, id: AssetId, error: &AssetError) {
        log::warn!("{}", error);
        self.player.on_asset_failed(id);
        self.checkpoint.on_asset_failed(id);
        if let Some(environment) = self.environment.as_mut() {
            environment.on_asset_failed(id);
        }
    }

    fn on_player_bound(&mut self) {
        if let Some(environment) = self.environment.as_ref() {
            if let Err(e) = environment.attach_player(&mut self.player) {
                log::error!("can't place the player: {}", e);
            }
        }
        if self.controller.is_none() {
            log::info!("player ready, controller created");
            self.controller = Some(Controller::new(self.manifest.controller.clone()));
        }
    }

    /// Routes an input event to the controller. Inputs are ignored until the
    /// player is bound.
    pub fn handle_input(&mut self, code: InputCode, pressed: bool) -> Result<Option<Interaction>, WorldError> {
        let Some(controller) = self.controller.as_mut() else {
            return Ok(None);
        };
        match controller.on_input(code, pressed) {
            InputResponse::Interact => self.interact(),
            InputResponse::Handled | InputResponse::Ignored => Ok(None),
        }
    }

    /// Overlap test between the player and every linked checkpoint of the active
    /// environment. Returns how many entities changed their collision state.
    pub fn detect_checkpoint_collisions(&mut self) -> usize {
        let (Some(player_bounds), Some(environment)) = (self.player.bounds(), self.environment.as_mut()) else {
            return 0;
        };
        environment
            .entities_mut()
            .filter(|entity| entity.checkpoint().is_some())
            .map(|entity| {
                let overlapping = entity
                    .checkpoint()
                    .and_then(Entity::bounds)
                    .is_some_and(|bounds| bounds.intersects(&player_bounds));
                entity.set_checkpoint_colliding(overlapping)
            })
            .filter(|changed| *changed)
            .count()
    }

    /// Talks to the interactable entity whose checkpoint the player stands in and
    /// follows its environment destination.
    pub fn interact(&mut self) -> Result<Option<Interaction>, WorldError> {
        let interaction = self.environment.as_mut().and_then(|environment| {
            let entity = environment
                .entities_mut()
                .find(|entity| entity.is_interactable() && entity.is_checkpoint_colliding())?;
            entity.set_animation(AnimationName::Talk);
            Some(Interaction {
                entity: entity.id(),
                destination: entity.destination()?,
            })
        });
        let Some(interaction) = interaction else {
            log::debug!("nothing to interact with");
            return Ok(None);
        };
        log::info!("interaction with entity {}", interaction.entity);
        if let Some(target) = interaction.destination.environment {
            self.change_environment(target)?;
        }
        Ok(Some(interaction))
    }

    /// Advances the controller, the player and the active environment.
    pub fn tick(&mut self, dt: Duration) {
        if let Some(controller) = self.controller.as_mut() {
            controller.tick(&mut self.player, dt);
        }
        self.player.tick(dt);
        if let Some(environment) = self.environment.as_mut() {
            environment.tick(dt);
        }
    }

    /// Disposes the environment, the player and the checkpoint template.
    pub fn shutdown(mut self) -> TeardownReport {
        let scene = self.ctx.scene.as_mut();
        let mut report = self
            .environment
            .take()
            .map(|environment| environment.teardown(scene))
            .unwrap_or_default();
        for entity in [&mut self.player, &mut self.checkpoint] {
            if entity.is_instanced() {
                report.entities += 1;
            }
            report.meshes += entity.dispose(scene);
        }
        report
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn player(&self) -> &Entity {
        &self.player
    }

    pub fn checkpoint(&self) -> &Entity {
        &self.checkpoint
    }

    pub fn controller(&self) -> Option<&Controller> {
        self.controller.as_ref()
    }
}
