//! Placement data for scene nodes.
//!
//! Every node of an instanced model carries a local [`Transform`]; world transforms
//! are obtained by composing the chain of parents with `*`.

use std::ops::Mul;

use cgmath::{One, Rad, Rotation3};

/// Position, rotation (as quaternion) and scale of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    /// Create a new transform with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Maps a point from this transform's local space into its parent space.
    pub fn transform_point(&self, point: cgmath::Vector3<f32>) -> cgmath::Vector3<f32> {
        let scaled = cgmath::Vector3::new(
            self.scale.x * point.x,
            self.scale.y * point.y,
            self.scale.z * point.z,
        );
        self.position + self.rotation * scaled
    }

    /// Rotates around one of the local axes, like a `rotateOnAxis` on a scene node.
    pub fn rotate_local(&mut self, axis: cgmath::Vector3<f32>, angle: Rad<f32>) {
        self.rotation = self.rotation * cgmath::Quaternion::from_axis_angle(axis, angle);
    }

    /// Moves along the local z axis; negative distances move forward.
    pub fn translate_local_z(&mut self, distance: f32) {
        self.position += self.rotation * cgmath::Vector3::new(0.0, 0.0, distance);
    }
}

impl Mul<Transform> for Transform {
    type Output = Self;

    fn mul(self, rhs: Transform) -> Self::Output {
        &self * &rhs
    }
}

impl<'a, 'b> Mul<&'b Transform> for &'a Transform {
    type Output = Transform;

    fn mul(self, rhs: &'b Transform) -> Self::Output {
        let new_rotation = self.rotation * rhs.rotation;

        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let new_position = self.transform_point(rhs.position);

        Transform {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl From<cgmath::Vector3<f32>> for Transform {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
