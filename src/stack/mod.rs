//! Mastery stacks: records, ordering, tower layout and block instances

pub mod block;
pub mod layout;
pub mod record;
pub mod sort;

pub use block::{BlockInstance, MaterialTable, PhysicsMode};
pub use layout::{compute_pose, BlockPose, RowSlot, StackLayout};
pub use record::{parse_records, Grade, Mastery, StackRecord};
pub use sort::{partition_by_grade, sort_records, DroppedRecord, GradeQueues, Partition};
