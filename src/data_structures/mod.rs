//! Scene data: transforms, model templates and instances, animation state,
//! entities and the environments that own them.
//!
//! - `instance` holds the per-node [`instance::Transform`]
//! - `scene_graph` has bounding boxes, model templates/instances and the scene graph contract
//! - `animation` is the entity animation state machine and mixer
//! - `entity` is the single entity type for every kind of scene object
//! - `environment` groups entities, lights and a background into one explorable scene

pub mod animation;
pub mod entity;
pub mod environment;
pub mod instance;
pub mod scene_graph;
