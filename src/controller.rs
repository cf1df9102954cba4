//! Turns held inputs into player motion.
//!
//! Four independent intents are set on input down and cleared on input up. While
//! the explore input is held the player may still turn but does not walk.

use std::time::Duration;

use crate::{
    config::{ControllerConfig, InputCode},
    data_structures::{animation::AnimationName, entity::Entity},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Forward,
    Backward,
    Left,
    Right,
}

/// How an input event was consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputResponse {
    Ignored,
    Handled,
    /// The interact input went down.
    Interact,
}

#[derive(Debug)]
pub struct Controller {
    config: ControllerConfig,
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    exploring: bool,
    walking: bool,
}

impl Controller {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            forward: false,
            backward: false,
            left: false,
            right: false,
            exploring: false,
            walking: false,
        }
    }

    pub fn is_active(&self, intent: Intent) -> bool {
        match intent {
            Intent::Forward => self.forward,
            Intent::Backward => self.backward,
            Intent::Left => self.left,
            Intent::Right => self.right,
        }
    }

    pub fn is_exploring(&self) -> bool {
        self.exploring
    }

    pub fn on_input(&mut self, code: InputCode, pressed: bool) -> InputResponse {
        let mut response = InputResponse::Ignored;
        let bound = |codes: &[InputCode]| codes.contains(&code);

        if bound(&self.config.forward) {
            self.forward = pressed;
            response = InputResponse::Handled;
        }
        if bound(&self.config.backward) {
            self.backward = pressed;
            response = InputResponse::Handled;
        }
        if bound(&self.config.left) {
            self.left = pressed;
            response = InputResponse::Handled;
        }
        if bound(&self.config.right) {
            self.right = pressed;
            response = InputResponse::Handled;
        }
        if bound(&self.config.explore) {
            self.exploring = pressed;
            response = InputResponse::Handled;
        }
        if pressed && bound(&self.config.interact) {
            response = InputResponse::Interact;
        }
        if response == InputResponse::Ignored {
            log::trace!("input {:?} is not bound", code);
        }
        response
    }

    /// Applies the held intents to `player` for a frame of length `dt`.
    pub fn tick(&mut self, player: &mut Entity, dt: Duration) {
        let step = self.config.rotation_step;
        // right wins over left, forward over backward
        if self.left || self.right {
            let turn = if self.right { -step } else { step };
            if let Err(e) = player.rotate_y(turn) {
                log::warn!("controller can't turn the player: {}", e);
                return;
            }
        }

        let translating = !self.exploring && (self.forward || self.backward);
        if translating {
            let dt_ms = dt.as_micros() as f32 / 1000.0;
            let distance = player.speed() * dt_ms / self.config.translation_divisor;
            // forward is -z in local space
            let direction = if self.forward { -1.0 } else { 1.0 };
            if let Err(e) = player.translate_z(direction * distance) {
                log::warn!("controller can't move the player: {}", e);
                return;
            }
            player.update_bounds();
        }
        self.animate(player, translating);
    }

    fn animate(&mut self, player: &mut Entity, translating: bool) {
        let walk = match (translating, self.forward) {
            (true, true) => Some(AnimationName::WalkForward),
            (true, false) => Some(AnimationName::WalkBackward),
            (false, _) => None,
        };
        match walk {
            Some(name) => {
                player.set_animation(name);
                self.walking = true;
            }
            None if self.walking => {
                player.set_animation(AnimationName::Idle);
                self.walking = false;
            }
            None => (),
        }
    }
}
