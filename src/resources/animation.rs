use cgmath::{InnerSpace, VectorSpace};

use crate::data_structures::instance::Transform;

#[derive(Clone, Debug)]
pub enum Keyframes {
    Translation(Vec<cgmath::Vector3<f32>>),
    Rotation(Vec<cgmath::Quaternion<f32>>),
    Scale(Vec<cgmath::Vector3<f32>>),
    Other,
}

/// One animated property of one template node.
#[derive(Clone, Debug)]
pub struct Channel {
    pub node: usize,
    pub timestamps: Vec<f32>,
    pub keyframes: Keyframes,
}

/// An animation clip: a named set of channels with a shared duration.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<Channel>,
    pub duration: f32,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .filter_map(|channel| channel.timestamps.last().copied())
            .fold(0.0, f32::max);
        Self {
            name: name.into(),
            channels,
            duration,
        }
    }

    /// Writes the pose at `time` into `locals`, which is indexed like the template nodes.
    pub fn sample(&self, time: f32, locals: &mut [Transform]) {
        for channel in &self.channels {
            let Some(local) = locals.get_mut(channel.node) else {
                log::warn!(
                    "clip '{}' animates node {}, but the instance only has {} nodes",
                    self.name,
                    channel.node,
                    locals.len()
                );
                continue;
            };
            let Some((from, to, amount)) = segment(&channel.timestamps, time) else {
                continue;
            };
            match &channel.keyframes {
                Keyframes::Translation(frames) => {
                    if let (Some(a), Some(b)) = (frames.get(from), frames.get(to)) {
                        local.position = a.lerp(*b, amount);
                    }
                }
                Keyframes::Rotation(frames) => {
                    if let (Some(a), Some(b)) = (frames.get(from), frames.get(to)) {
                        local.rotation = a.slerp(*b, amount).normalize();
                    }
                }
                Keyframes::Scale(frames) => {
                    if let (Some(a), Some(b)) = (frames.get(from), frames.get(to)) {
                        local.scale = a.lerp(*b, amount);
                    }
                }
                // TODO: morph target weights once meshes carry them
                Keyframes::Other => (),
            }
        }
    }
}

/// Finds the keyframe pair around `time` and the interpolation amount between them.
fn segment(timestamps: &[f32], time: f32) -> Option<(usize, usize, f32)> {
    let last = timestamps.len().checked_sub(1)?;
    if time <= timestamps[0] {
        return Some((0, 0, 0.0));
    }
    if time >= timestamps[last] {
        return Some((last, last, 0.0));
    }
    let to = timestamps.iter().position(|&t| t > time)?;
    let from = to - 1;
    let span = timestamps[to] - timestamps[from];
    let amount = if span > 0.0 {
        (time - timestamps[from]) / span
    } else {
        0.0
    };
    Some((from, to, amount))
}
