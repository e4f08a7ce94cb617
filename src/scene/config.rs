//! Stack scene configuration

use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::{Error, Result};
use crate::pool::PoolConfig;
use crate::stack::block::MaterialTable;
use crate::stack::layout::StackLayout;
use crate::stack::record::Grade;
use super::node::StackParent;

/// Configuration for the stack scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Sizing of each grade's block pool
    pub pool: PoolConfig,
    /// Placement of the 6th, 7th and 8th grade stacks
    pub stack_parents: [StackParent; 3],
    /// Block material per mastery level
    pub materials: MaterialTable,
    /// Tower dimensions
    pub layout: StackLayout,
    /// Seconds before stack picking is re-enabled after a selection change
    #[serde(deserialize_with = "deserialize_debounce_secs")]
    pub debounce_secs: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            stack_parents: [
                StackParent::at(Vec3::new(-8.0, 0.0, 0.0)),
                StackParent::at(Vec3::ZERO),
                StackParent::at(Vec3::new(8.0, 0.0, 0.0)),
            ],
            materials: MaterialTable::default(),
            layout: StackLayout::default(),
            debounce_secs: 2.0,
        }
    }
}

impl SceneConfig {
    /// Parse from JSON; omitted fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::Config)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Debounce window as a duration.
    ///
    /// Negative or NaN values mean no delay; values past `Duration::MAX` saturate.
    pub fn debounce(&self) -> Duration {
        Duration::try_from_secs_f32(self.debounce_secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    /// Parent placement of a grade's stack
    pub fn parent(&self, grade: Grade) -> &StackParent {
        &self.stack_parents[grade.index()]
    }
}

/// Accept only a non-negative number of seconds that fits in a `Duration`
fn deserialize_debounce_secs<'de, D>(deserializer: D) -> std::result::Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f32::deserialize(deserializer)?;
    if secs < 0.0 || Duration::try_from_secs_f32(secs).is_err() {
        return Err(serde::de::Error::custom(format!(
            "debounce_secs must be a non-negative duration, got {}",
            secs
        )));
    }
    Ok(secs)
}
