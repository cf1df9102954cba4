//! Scene graph and hierarchical scene organization.
//!
//! A loaded asset is kept as an immutable [`SceneAsset`] template: a flattened
//! node hierarchy (parents always come before their children), optional mesh
//! bounds per node and the animation clips shipped with the file. Entities never
//! touch the template directly, they clone it into an owned [`ModelInstance`].
//!
//! The renderer is only reached through the [`SceneGraph`] contract.

use std::{collections::HashSet, sync::Arc};

use crate::{
    data_structures::{animation::AnimationName, instance::Transform},
    resources::animation::AnimationClip,
};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: cgmath::Vector3<f32>,
    pub max: cgmath::Vector3<f32>,
}

impl Aabb {
    pub fn new(min: impl Into<cgmath::Vector3<f32>>, max: impl Into<cgmath::Vector3<f32>>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = cgmath::Vector3<f32>>) -> Option<Self> {
        points.into_iter().fold(None, |bounds, point| {
            Some(match bounds {
                None => Aabb::new(point, point),
                Some(bounds) => bounds.expand(point),
            })
        })
    }

    pub fn expand(self, point: cgmath::Vector3<f32>) -> Self {
        Self {
            min: cgmath::Vector3::new(
                self.min.x.min(point.x),
                self.min.y.min(point.y),
                self.min.z.min(point.z),
            ),
            max: cgmath::Vector3::new(
                self.max.x.max(point.x),
                self.max.y.max(point.y),
                self.max.z.max(point.z),
            ),
        }
    }

    pub fn union(self, other: Aabb) -> Self {
        self.expand(other.min).expand(other.max)
    }

    pub fn corners(&self) -> [cgmath::Vector3<f32>; 8] {
        let (a, b) = (self.min, self.max);
        [
            cgmath::Vector3::new(a.x, a.y, a.z),
            cgmath::Vector3::new(b.x, a.y, a.z),
            cgmath::Vector3::new(a.x, b.y, a.z),
            cgmath::Vector3::new(b.x, b.y, a.z),
            cgmath::Vector3::new(a.x, a.y, b.z),
            cgmath::Vector3::new(b.x, a.y, b.z),
            cgmath::Vector3::new(a.x, b.y, b.z),
            cgmath::Vector3::new(b.x, b.y, b.z),
        ]
    }

    pub fn transformed(&self, transform: &Transform) -> Self {
        let corners = self.corners().map(|corner| transform.transform_point(corner));
        // eight corners, never empty
        Aabb::from_points(corners).unwrap_or(*self)
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// One node of a model template.
#[derive(Clone, Debug)]
pub struct TemplateNode {
    pub name: String,
    pub parent: Option<usize>,
    pub local: Transform,
    /// Local-space bounds of the node's mesh, `None` for pure container nodes.
    pub mesh: Option<Aabb>,
}

/// Immutable model template produced by a loader and shared through the asset cache.
#[derive(Clone, Debug, Default)]
pub struct SceneAsset {
    pub nodes: Vec<TemplateNode>,
    pub clips: Vec<AnimationClip>,
}

impl SceneAsset {
    pub fn new(nodes: Vec<TemplateNode>, clips: Vec<AnimationClip>) -> Self {
        Self { nodes, clips }
    }

    /// The first clip playing the animation state `name`.
    pub fn clip(&self, name: AnimationName) -> Option<(usize, &AnimationClip)> {
        self.clips
            .iter()
            .enumerate()
            .find(|(_, clip)| name.matches_clip(&clip.name))
    }

    pub fn geometry_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.mesh.is_some()).count()
    }
}

/// Handle under which a model instance or light is known to the scene graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

/// Hands out scene node keys. Owned by the runtime context.
#[derive(Debug, Default)]
pub struct NodeKeys {
    next: u64,
}

impl NodeKeys {
    pub fn next(&mut self) -> NodeKey {
        self.next += 1;
        NodeKey(self.next)
    }
}

/// Renderer-side scene graph: the only coupling is attaching and detaching nodes.
pub trait SceneGraph {
    fn add(&mut self, node: NodeKey);

    fn remove(&mut self, node: NodeKey);
}

/// In-memory scene graph that only tracks which nodes are attached.
#[derive(Debug, Default)]
pub struct SceneRegistry {
    attached: HashSet<NodeKey>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, node: NodeKey) -> bool {
        self.attached.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}

impl SceneGraph for SceneRegistry {
    fn add(&mut self, node: NodeKey) {
        if !self.attached.insert(node) {
            log::warn!("scene node {:?} was already attached", node);
        }
    }

    fn remove(&mut self, node: NodeKey) {
        if !self.attached.remove(&node) {
            log::warn!("scene node {:?} was not attached", node);
        }
    }
}

/// An entity-owned clone of a [`SceneAsset`].
///
/// `transform` is the placement of the whole model, `locals` mirror the template
/// nodes and are what the animation mixer writes into.
#[derive(Debug)]
pub struct ModelInstance {
    key: NodeKey,
    template: Arc<SceneAsset>,
    pub transform: Transform,
    pub locals: Vec<Transform>,
    geometry: usize,
}

impl ModelInstance {
    pub fn instantiate(key: NodeKey, template: Arc<SceneAsset>) -> Self {
        let locals = template.nodes.iter().map(|node| node.local).collect();
        let geometry = template.geometry_count();
        Self {
            key,
            template,
            transform: Transform::new(),
            locals,
            geometry,
        }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn template(&self) -> &Arc<SceneAsset> {
        &self.template
    }

    /// World transforms of every node, indexed like the template.
    pub fn world_transforms(&self) -> Vec<Transform> {
        let mut worlds: Vec<Transform> = Vec::with_capacity(self.locals.len());
        for (node, local) in self.template.nodes.iter().zip(&self.locals) {
            let parent = node
                .parent
                .and_then(|parent| worlds.get(parent))
                .unwrap_or(&self.transform);
            let world = parent * local;
            worlds.push(world);
        }
        worlds
    }

    /// Bounds of every mesh in world space, `None` if the model has no geometry.
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.world_transforms()
            .iter()
            .zip(&self.template.nodes)
            .filter_map(|(world, node)| node.mesh.map(|mesh| mesh.transformed(world)))
            .reduce(Aabb::union)
    }

    /// Drops the geometry held by this instance and returns how many meshes were released.
    pub fn release(mut self) -> usize {
        let released = self.geometry;
        self.geometry = 0;
        self.locals.clear();
        released
    }
}
