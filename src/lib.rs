//! explore-ngin
//!
//! The scene side of an explorable 3D world: streaming model assets, instancing
//! them into entities, switching between environments and walking an avatar
//! through them. Rendering stays behind the small [`data_structures::scene_graph::SceneGraph`]
//! contract, so the crate runs the same natively, on the web and headless in tests.
//!
//! High-level modules
//! - `config`: the RON world manifest (assets, environments, entities, bindings)
//! - `context`: asset caches, scene graph handle and settings owned by the host
//! - `controller`: input intents to player motion
//! - `data_structures`: transforms, model instances, animation, entities and environments
//! - `error`: typed outcomes of the operations above
//! - `flow`: frame driver and winit integration
//! - `resources`: asset cache and loaders for glTF models and cube textures
//! - `world`: the runtime root tying everything together
//!

pub mod config;
pub mod context;
pub mod controller;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod resources;
pub mod world;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::{ElementState, MouseButton, WindowEvent};
pub use winit::keyboard::KeyCode;
