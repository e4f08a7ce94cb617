//! Pooled block instances

use serde::{Deserialize, Serialize};

use crate::scene::node::LocalTransform;
use super::layout::BlockPose;
use super::record::{Grade, Mastery, StackRecord};

/// Physics state of a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PhysicsMode {
    /// Held in place, no gravity
    #[default]
    Kinematic,
    /// Simulated with gravity, used while the stack is being tested
    Dynamic,
}

impl PhysicsMode {
    pub fn uses_gravity(self) -> bool {
        self == PhysicsMode::Dynamic
    }

    pub fn is_kinematic(self) -> bool {
        self == PhysicsMode::Kinematic
    }
}

/// Material name per mastery level, indexed by [`Mastery::index`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialTable(pub [String; 3]);

impl Default for MaterialTable {
    fn default() -> Self {
        Self(["Glass".to_string(), "Wood".to_string(), "Stone".to_string()])
    }
}

impl MaterialTable {
    /// Material for a mastery level
    pub fn for_mastery(&self, mastery: Mastery) -> &str {
        &self.0[mastery.index()]
    }
}

/// One block of a stack.
///
/// Blocks are created by the stack pools, configured from a record when
/// acquired, and hidden again when released.
#[derive(Clone, Debug)]
pub struct BlockInstance {
    serial: u64,
    pub material: String,
    pub label: String,
    pub label_visible: bool,
    pub mastery: Mastery,
    pub standard_id: String,
    pub physics: PhysicsMode,
    pub visible: bool,
    /// Stack the block is parented under while active
    pub parent: Option<Grade>,
    /// Pose relative to the stack parent
    pub transform: LocalTransform,
}

impl BlockInstance {
    /// Fresh hidden block
    pub fn new(serial: u64) -> Self {
        Self {
            serial,
            material: String::new(),
            label: String::new(),
            label_visible: false,
            mastery: Mastery::NotStarted,
            standard_id: String::new(),
            physics: PhysicsMode::Kinematic,
            visible: false,
            parent: None,
            transform: LocalTransform::identity(),
        }
    }

    /// Factory-assigned id, stable across reuse
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Take material and label from a record
    pub fn assign(&mut self, record: &StackRecord, materials: &MaterialTable) {
        self.mastery = record.mastery;
        self.material = materials.for_mastery(record.mastery).to_string();
        self.label = record.mastery.label().to_string();
        self.label_visible = record.mastery.shows_label();
        self.standard_id = record.standard_id.clone();

        log::debug!(
            "Assigned data to block {}: mastery={}, material={}",
            self.serial,
            record.mastery.index(),
            self.material
        );
    }

    /// Parent under `grade`'s stack at `pose`, held kinematic
    pub fn place(&mut self, grade: Grade, pose: &BlockPose) {
        self.parent = Some(grade);
        self.transform = LocalTransform::from_pose(pose);
        self.reset_physics();
    }

    /// Let the block fall
    pub fn enable_physics(&mut self) {
        self.physics = PhysicsMode::Dynamic;
    }

    /// Hold the block in place
    pub fn reset_physics(&mut self) {
        self.physics = PhysicsMode::Kinematic;
    }

    /// Pool acquire hook
    pub fn activate(&mut self) {
        self.visible = true;
    }

    /// Pool release hook
    pub fn deactivate(&mut self) {
        self.visible = false;
        self.label_visible = false;
        self.parent = None;
        self.reset_physics();
    }
}
