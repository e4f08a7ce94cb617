//! Jenga-style tower layout
//!
//! Maps a block's position in its stack to a local pose under the stack parent.
//! Blocks go in rows of three. Even rows lie along X, with the outer blocks at
//! `z = ±offset`. Odd rows are turned a quarter turn and put the outer blocks
//! at `x = ±offset`. The middle block of every row sits on the axis.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Blocks per row
pub const BLOCKS_PER_ROW: usize = 3;

/// Which of the three places in a row a block occupies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowSlot {
    First,
    Middle,
    Last,
}

impl RowSlot {
    /// Slot for a linear block index
    pub fn of(index: usize) -> Self {
        // Row-major: the first block of each row of three is at index % 3 == 0
        match index % BLOCKS_PER_ROW {
            0 => RowSlot::First,
            1 => RowSlot::Middle,
            _ => RowSlot::Last,
        }
    }
}

/// Local position and Euler rotation (degrees) of one block
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockPose {
    pub position: Vec3,
    /// Euler angles in degrees; only Y is ever non-zero
    pub rotation: Vec3,
}

impl BlockPose {
    /// Rotation as a quaternion
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_rotation_y(self.rotation.y.to_radians())
    }
}

/// Tower dimensions in world units
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackLayout {
    /// Height of the first row's center
    pub base_height: f32,
    /// Vertical distance between rows
    pub row_spacing: f32,
    /// Distance of the outer blocks from the tower axis
    pub offset: f32,
}

impl Default for StackLayout {
    fn default() -> Self {
        Self {
            base_height: 0.6,
            row_spacing: 0.65,
            offset: 1.375,
        }
    }
}

impl StackLayout {
    /// Pose of the block at `index` within its stack.
    ///
    /// Total and deterministic: defined for every index, no hidden state.
    pub fn pose(&self, index: usize) -> BlockPose {
        let row = index / BLOCKS_PER_ROW;
        let y = self.base_height + row as f32 * self.row_spacing;
        let even_row = row % 2 == 0;

        let (position, yaw) = match (RowSlot::of(index), even_row) {
            (RowSlot::First, true) => (Vec3::new(0.0, y, self.offset), 0.0),
            (RowSlot::Last, true) => (Vec3::new(0.0, y, -self.offset), 180.0),
            (RowSlot::First, false) => (Vec3::new(self.offset, y, 0.0), 90.0),
            (RowSlot::Last, false) => (Vec3::new(-self.offset, y, 0.0), -90.0),
            // 90 * row, or 0 when that is a multiple of 180
            (RowSlot::Middle, true) => (Vec3::new(0.0, y, 0.0), 0.0),
            (RowSlot::Middle, false) => (Vec3::new(0.0, y, 0.0), 90.0 * row as f32),
        };

        BlockPose {
            position,
            rotation: Vec3::new(0.0, yaw, 0.0),
        }
    }

    /// Number of rows a stack of `blocks` occupies
    pub fn row_count(&self, blocks: usize) -> usize {
        blocks.div_ceil(BLOCKS_PER_ROW)
    }

    /// Height of the top row's center, `None` for an empty stack
    pub fn top_height(&self, blocks: usize) -> Option<f32> {
        blocks.checked_sub(1).map(|last| self.pose(last).position.y)
    }
}

/// Pose of the block at `index` using the standard tower dimensions
pub fn compute_pose(index: usize) -> BlockPose {
    StackLayout::default().pose(index)
}
