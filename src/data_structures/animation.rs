//! Entity animation state and playback.
//!
//! The state machine is deliberately flat: seven mutually exclusive states and a
//! single rule, "stop everything, start one". [`transition`] is the pure part of it,
//! [`AnimationMixer`] does the playback side effects on an instanced model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data_structures::scene_graph::ModelInstance;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationName {
    #[default]
    None,
    Idle,
    Greet,
    Talk,
    Run,
    WalkForward,
    WalkBackward,
}

impl AnimationName {
    pub const PLAYABLE: [AnimationName; 6] = [
        AnimationName::Idle,
        AnimationName::Greet,
        AnimationName::Talk,
        AnimationName::Run,
        AnimationName::WalkForward,
        AnimationName::WalkBackward,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationName::None => "none",
            AnimationName::Idle => "idle",
            AnimationName::Greet => "greet",
            AnimationName::Talk => "talk",
            AnimationName::Run => "run",
            AnimationName::WalkForward => "walkForward",
            AnimationName::WalkBackward => "walkBackward",
        }
    }

    /// Matches clip names regardless of case and `_`/`-`/space separators,
    /// so `walk_forward`, `WalkForward` and `walkForward` all resolve.
    pub fn matches_clip(&self, clip_name: &str) -> bool {
        let normalize = |name: &str| {
            name.chars()
                .filter(|c| !matches!(c, '_' | '-' | ' '))
                .flat_map(char::to_lowercase)
                .collect::<String>()
        };
        *self != AnimationName::None && normalize(clip_name) == normalize(self.as_str())
    }
}

impl fmt::Display for AnimationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that can change an entity's animation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationEvent {
    Play(AnimationName),
    CheckpointEntered,
    CheckpointLeft,
}

/// Computes the state that follows `current` after `event`.
///
/// Entering a checkpoint greets unless the entity is already talking; leaving one
/// always falls back to idle.
pub fn transition(current: AnimationName, event: AnimationEvent) -> AnimationName {
    match event {
        AnimationEvent::Play(name) => name,
        AnimationEvent::CheckpointEntered if current == AnimationName::Talk => AnimationName::Talk,
        AnimationEvent::CheckpointEntered => AnimationName::Greet,
        AnimationEvent::CheckpointLeft => AnimationName::Idle,
    }
}

#[derive(Debug)]
struct Action {
    name: AnimationName,
    clip: usize,
    time: f32,
    playing: bool,
}

/// Plays the clips of one model instance.
#[derive(Debug, Default)]
pub struct AnimationMixer {
    actions: Vec<Action>,
    starts: u32,
}

impl AnimationMixer {
    /// Builds one action per animation state the instance has a clip for.
    pub fn new(instance: &ModelInstance) -> Self {
        let template = instance.template();
        let actions = AnimationName::PLAYABLE
            .into_iter()
            .filter_map(|name| {
                template.clip(name).map(|(clip, _)| Action {
                    name,
                    clip,
                    time: 0.0,
                    playing: false,
                })
            })
            .collect();
        Self { actions, starts: 0 }
    }

    pub fn has_action(&self, name: AnimationName) -> bool {
        self.actions.iter().any(|action| action.name == name)
    }

    pub fn playing(&self) -> Option<AnimationName> {
        self.actions
            .iter()
            .find(|action| action.playing)
            .map(|action| action.name)
    }

    /// Number of actions started over the mixer's lifetime.
    pub fn starts(&self) -> u32 {
        self.starts
    }

    pub fn stop_all(&mut self) {
        self.actions.iter_mut().for_each(|action| {
            action.playing = false;
            action.time = 0.0;
        });
    }

    /// Starts the action for `name`. Returns `false` if the model has no such clip.
    pub fn play(&mut self, name: AnimationName) -> bool {
        match self.actions.iter_mut().find(|action| action.name == name) {
            Some(action) => {
                action.playing = true;
                action.time = 0.0;
                self.starts += 1;
                true
            }
            None => false,
        }
    }

    /// Advances every playing action by `dt` seconds and poses the instance.
    pub fn update(&mut self, dt: f32, instance: &mut ModelInstance) {
        let template = instance.template().clone();
        for action in self.actions.iter_mut().filter(|action| action.playing) {
            let Some(clip) = template.clips.get(action.clip) else {
                continue;
            };
            action.time += dt;
            if clip.duration > 0.0 {
                action.time %= clip.duration;
            }
            clip.sample(action.time, &mut instance.locals);
        }
    }
}
