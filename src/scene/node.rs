//! Scene node types
//!
//! Transforms for blocks and the fixed stack parents they hang under.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::stack::layout::BlockPose;
use crate::stack::record::Grade;

/// Local transform relative to the parent node.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }
}

impl LocalTransform {
    /// Identity transform (no translation, rotation, or scaling).
    pub fn identity() -> Self {
        Self::default()
    }

    /// Transform for a block pose in a stack.
    pub fn from_pose(pose: &BlockPose) -> Self {
        Self {
            position: pose.position,
            rotation: pose.rotation_quat(),
            scale: 1.0,
        }
    }

    /// Convert to a 4x4 matrix.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.rotation,
            self.position,
        )
    }
}

/// Placement of one stack in the scene
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackParent {
    /// World position of the stack base
    pub origin: Vec3,
    /// Camera anchor, relative to `origin`
    pub look_at_offset: Vec3,
}

impl StackParent {
    /// Stack at `origin` with the camera anchor a little above the base
    pub fn at(origin: Vec3) -> Self {
        Self {
            origin,
            look_at_offset: Vec3::new(0.0, 4.0, 0.0),
        }
    }

    /// World position the camera should look at when this stack is selected
    pub fn look_at(&self) -> Vec3 {
        self.origin + self.look_at_offset
    }

    /// World matrix of a block transform under this parent
    pub fn world_transform(&self, local: &LocalTransform) -> Mat4 {
        Mat4::from_translation(self.origin) * local.to_mat4()
    }
}

/// What the camera should frame after a selection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LookAtTarget {
    pub grade: Grade,
    pub position: Vec3,
}
