use std::{collections::HashMap, path::PathBuf};

use gltf::animation::util::ReadOutputs;

use crate::{
    config::{AssetDescriptor, AssetFormat},
    data_structures::{
        instance::Transform,
        scene_graph::{Aabb, SceneAsset, TemplateNode},
    },
    resources::{
        LoadFuture, Loader,
        animation::{AnimationClip, Channel, Keyframes},
        binary::{AssetRoot, load_binary, sibling},
    },
};

/// Loads `.gltf`/`.glb` files into [`SceneAsset`] templates.
#[derive(Clone, Debug)]
pub struct GltfLoader {
    assets: AssetRoot,
}

impl GltfLoader {
    pub fn new(assets: AssetRoot) -> Self {
        Self { assets }
    }
}

impl Loader for GltfLoader {
    type Source = AssetDescriptor;
    type Output = SceneAsset;

    fn load(&self, source: &AssetDescriptor) -> LoadFuture<SceneAsset> {
        if source.format == AssetFormat::Draco {
            log::warn!(
                "asset '{}' is Draco compressed, only the node hierarchy and accessor bounds are read",
                source.name
            );
        }
        let root = self.assets.path().to_path_buf();
        self.assets.spawn(load_model_gltf(root, source.url.clone()))
    }
}

pub async fn load_model_gltf(root: PathBuf, file_name: String) -> anyhow::Result<SceneAsset> {
    let gltf_bytes = load_binary(&root, &file_name).await?;
    let gltf = gltf::Gltf::from_slice(&gltf_bytes)?;

    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("{} references a binary chunk it doesn't have", file_name))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(&root, &sibling(&file_name, uri)).await?;
                buffer_data.push(bin);
            }
        }
    }

    let scene = read_scene(&gltf.document, &buffer_data);
    log::info!(
        "{}: {} nodes, {} meshes, {} clips",
        file_name,
        scene.nodes.len(),
        scene.geometry_count(),
        scene.clips.len()
    );
    Ok(scene)
}

/// Builds a template from a parsed document and its buffers.
///
/// Only the default scene (or the first one) is read. Animation channels that
/// target nodes outside of it are skipped.
pub fn read_scene(document: &gltf::Document, buffers: &[Vec<u8>]) -> SceneAsset {
    let mut nodes = Vec::new();
    let mut flat_index = HashMap::new();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene
            .nodes()
            .for_each(|node| flatten(node, None, &mut nodes, &mut flat_index)),
        None => log::warn!("glTF document has no scene"),
    }

    let clips = document
        .animations()
        .map(|animation| {
            let name = animation.name().unwrap_or("Default").to_string();
            let channels = animation
                .channels()
                .filter_map(|channel| {
                    let node = *flat_index.get(&channel.target().node().index())?;
                    let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
                    let timestamps: Vec<f32> = match reader.read_inputs() {
                        Some(times) => times.collect(),
                        None => {
                            log::warn!("No animation found in channel {}", channel.index());
                            Vec::new()
                        }
                    };
                    let keyframes = match reader.read_outputs() {
                        Some(ReadOutputs::Translations(translations)) => {
                            Keyframes::Translation(translations.map(Into::into).collect())
                        }
                        Some(ReadOutputs::Rotations(rotations)) => Keyframes::Rotation(
                            rotations
                                .into_f32()
                                .map(|[x, y, z, w]| cgmath::Quaternion::new(w, x, y, z))
                                .collect(),
                        ),
                        Some(ReadOutputs::Scales(scales)) => Keyframes::Scale(scales.map(Into::into).collect()),
                        Some(ReadOutputs::MorphTargetWeights(_)) => Keyframes::Other,
                        None => {
                            log::warn!("No Keyframes found in channel {}", channel.index());
                            Keyframes::Other
                        }
                    };
                    Some(Channel {
                        node,
                        timestamps,
                        keyframes,
                    })
                })
                .collect();
            AnimationClip::new(name, channels)
        })
        .collect();

    SceneAsset::new(nodes, clips)
}

fn flatten(
    node: gltf::Node,
    parent: Option<usize>,
    nodes: &mut Vec<TemplateNode>,
    flat_index: &mut HashMap<usize, usize>,
) {
    let (translation, [x, y, z, w], scale) = node.transform().decomposed();
    let local = Transform {
        position: translation.into(),
        rotation: cgmath::Quaternion::new(w, x, y, z),
        scale: scale.into(),
    };
    let mesh = node.mesh().and_then(|mesh| {
        mesh.primitives()
            .map(|primitive| {
                let bounds = primitive.bounding_box();
                Aabb::new(bounds.min, bounds.max)
            })
            .reduce(Aabb::union)
    });
    let index = nodes.len();
    flat_index.insert(node.index(), index);
    nodes.push(TemplateNode {
        name: node.name().unwrap_or("node").to_string(),
        parent,
        local,
        mesh,
    });
    for child in node.children() {
        flatten(child, Some(index), nodes, flat_index);
    }
}
