//! Reusable instance pooling

pub mod object_pool;

pub use object_pool::{ObjectPool, PoolConfig, PoolError, PoolHandle, PoolHooks};
