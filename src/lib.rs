//! Stackedu - mastery stacks for curriculum standards
//!
//! Turns a flat list of per-standard mastery records into three Jenga-style
//! towers (6th, 7th and 8th grade) built from pooled blocks, and drives the
//! select / deselect / test lifecycle of the scene.

pub mod core;
pub mod pool;
pub mod stack;
pub mod scene;
