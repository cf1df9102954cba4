#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use explore_ngin::{
    config::{AssetDescriptor, BackgroundDescriptor, Manifest},
    context::Context,
    data_structures::{
        instance::Transform,
        scene_graph::{Aabb, NodeKey, SceneAsset, SceneGraph, TemplateNode},
    },
    resources::{AssetId, LoadFuture, Loader, animation::AnimationClip, texture::CubeTexture},
    world::World,
};
use futures::channel::oneshot;

/// Shared view on the loads a [`ManualLoader`] was asked for.
pub(crate) struct Pending<T> {
    inner: Rc<RefCell<PendingInner<T>>>,
}

struct PendingInner<T> {
    calls: Vec<AssetId>,
    senders: HashMap<AssetId, Vec<oneshot::Sender<anyhow::Result<T>>>>,
}

impl<T> Clone for Pending<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Pending<T> {
    fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(PendingInner {
                calls: Vec::new(),
                senders: HashMap::new(),
            })),
        }
    }

    pub fn calls(&self) -> Vec<AssetId> {
        self.inner.borrow().calls.clone()
    }

    pub fn load_count(&self, id: u32) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|call| **call == AssetId(id))
            .count()
    }

    /// Loads of `id` that were started but not finished yet.
    pub fn in_flight(&self, id: u32) -> usize {
        self.inner
            .borrow()
            .senders
            .get(&AssetId(id))
            .map_or(0, Vec::len)
    }

    fn take(&self, id: u32) -> oneshot::Sender<anyhow::Result<T>> {
        let mut inner = self.inner.borrow_mut();
        let senders = inner
            .senders
            .get_mut(&AssetId(id))
            .filter(|senders| !senders.is_empty())
            .unwrap_or_else(|| panic!("no load in flight for asset {}", id));
        senders.remove(0)
    }

    /// Finishes the oldest load of `id` with `value`.
    pub fn complete(&self, id: u32, value: T) {
        let _ = self.take(id).send(Ok(value));
    }

    pub fn fail(&self, id: u32, reason: &str) {
        let _ = self.take(id).send(Err(anyhow::anyhow!(reason.to_string())));
    }
}

/// A loader whose loads only finish when the test says so.
pub(crate) struct ManualLoader<S, T> {
    pending: Pending<T>,
    key: fn(&S) -> AssetId,
}

impl<S, T> ManualLoader<S, T> {
    pub fn new(key: fn(&S) -> AssetId) -> (Self, Pending<T>) {
        let pending = Pending::new();
        (
            Self {
                pending: pending.clone(),
                key,
            },
            pending,
        )
    }
}

impl<S: 'static, T: 'static> Loader for ManualLoader<S, T> {
    type Source = S;
    type Output = T;

    fn load(&self, source: &S) -> LoadFuture<T> {
        let id = (self.key)(source);
        let (sender, receiver) = oneshot::channel();
        {
            let mut inner = self.pending.inner.borrow_mut();
            inner.calls.push(id);
            inner.senders.entry(id).or_default().push(sender);
        }
        Box::pin(async move {
            match receiver.await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!("test loader dropped asset {}", id)),
            }
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SceneOp {
    Add(NodeKey),
    Remove(NodeKey),
}

/// Scene graph that records every call, shared with the test through `Rc`.
#[derive(Clone, Default)]
pub(crate) struct RecordingScene {
    ops: Rc<RefCell<Vec<SceneOp>>>,
    attached: Rc<RefCell<HashSet<NodeKey>>>,
}

impl RecordingScene {
    pub fn ops(&self) -> Vec<SceneOp> {
        self.ops.borrow().clone()
    }

    pub fn attached(&self) -> usize {
        self.attached.borrow().len()
    }

    pub fn is_attached(&self, key: NodeKey) -> bool {
        self.attached.borrow().contains(&key)
    }
}

impl SceneGraph for RecordingScene {
    fn add(&mut self, node: NodeKey) {
        self.ops.borrow_mut().push(SceneOp::Add(node));
        self.attached.borrow_mut().insert(node);
    }

    fn remove(&mut self, node: NodeKey) {
        self.ops.borrow_mut().push(SceneOp::Remove(node));
        self.attached.borrow_mut().remove(&node);
    }
}

pub(crate) struct Harness {
    pub models: Pending<SceneAsset>,
    pub backgrounds: Pending<CubeTexture>,
    pub scene: RecordingScene,
}

pub(crate) fn context() -> (Context, Harness) {
    let (models, model_loads) = ManualLoader::new(|asset: &AssetDescriptor| asset.id);
    let (backgrounds, background_loads) = ManualLoader::new(|background: &BackgroundDescriptor| background.id);
    let scene = RecordingScene::default();
    let ctx = Context::new(models, backgrounds, scene.clone());
    (
        ctx,
        Harness {
            models: model_loads,
            backgrounds: background_loads,
            scene,
        },
    )
}

/// A single box-shaped node of `height` metres standing on the origin.
pub(crate) fn box_model(height: f32, clips: &[&str]) -> SceneAsset {
    SceneAsset::new(
        vec![TemplateNode {
            name: "body".to_string(),
            parent: None,
            local: Transform::new(),
            mesh: Some(Aabb::new([-0.5, 0.0, -0.5], [0.5, height, 0.5])),
        }],
        clips
            .iter()
            .map(|name| AnimationClip::new(*name, Vec::new()))
            .collect(),
    )
}

pub(crate) fn sky() -> CubeTexture {
    CubeTexture {
        name: "sky".to_string(),
        faces: vec![image::RgbaImage::new(2, 2); 6],
    }
}

pub(crate) fn manifest() -> Manifest {
    Manifest::load("tests/fixtures/world.ron").expect("fixture manifest")
}

/// Pumps until no more instances get bound.
pub(crate) fn settle(world: &mut World) -> usize {
    let mut total = 0;
    for _ in 0..4 {
        total += world.pump_assets();
    }
    total
}

/// Completes every asset the fixture world uses with box models.
pub(crate) fn complete_all(harness: &Harness, world: &mut World) {
    let heights = [(1, 0.1), (2, 4.0), (3, 1.7), (4, 1.8), (5, 1.0), (6, 3.0)];
    let clips = ["idle", "greet", "talk", "walk_forward", "walk_backward"];
    for (id, height) in heights {
        while harness.models.in_flight(id) > 0 {
            harness.models.complete(id, box_model(height, &clips));
        }
    }
    if harness.backgrounds.in_flight(1) > 0 {
        harness.backgrounds.complete(1, sky());
    }
    settle(world);
}
