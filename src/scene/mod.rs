//! Stack scene: configuration, notifications and the scene manager

pub mod config;
pub mod events;
pub mod manager;
pub mod node;
pub mod source;

pub use config::SceneConfig;
pub use events::{EventBus, InitReport, StackEvent, SubscriptionId, TestReport};
pub use manager::{SceneState, StackSceneManager};
pub use node::{LocalTransform, LookAtTarget, StackParent};
pub use source::{InlineJson, JsonFile, StackDataSource};
