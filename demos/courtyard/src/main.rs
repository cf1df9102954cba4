use std::{path::PathBuf, time::Duration};

use explore_ngin::{
    config::Manifest,
    context::Context,
    data_structures::scene_graph::SceneRegistry,
    flow::{self, Flow},
    resources::{binary::AssetRoot, gltf::GltfLoader, texture::CubeTextureLoader},
    world::World,
};

const HEADLESS_FRAMES: u32 = 600;

fn main() -> anyhow::Result<()> {
    flow::init_logging();

    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let manifest = Manifest::load(dir.join("courtyard.ron"))?;
    // models and backgrounds live in assets/ next to the manifest
    let runtime = tokio::runtime::Runtime::new()?;
    let root = AssetRoot::new(dir.join("assets"), runtime.handle().clone());

    let ctx = Context::new(
        GltfLoader::new(root.clone()),
        CubeTextureLoader::new(root),
        SceneRegistry::new(),
    );
    let mut world = World::new(ctx, manifest)?;
    world.start()?;
    let mut flow = Flow::new(world);

    if std::env::args().any(|arg| arg == "--headless") {
        for _ in 0..HEADLESS_FRAMES {
            flow.step_by(Duration::from_millis(16));
            std::thread::sleep(Duration::from_millis(1));
        }
        log::info!(
            "{} frames, {} loads still pending",
            flow.frames(),
            flow.world().context().pending_loads()
        );
        let report = flow.shutdown();
        log::info!("released {} entities and {} meshes", report.entities, report.meshes);
        return Ok(());
    }

    flow::run(flow)
}
