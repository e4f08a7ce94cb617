//! Object Pool - reusable instances with lifecycle hooks
//!
//! Instances live in slots owned by the pool and are addressed by
//! generation-checked [`PoolHandle`]s:
//! - Released instances are kept for reuse (most recently released first)
//! - New instances are constructed on demand up to `max_capacity`
//! - The active list preserves acquisition order
//! - A handle goes stale when its instance is released, so a second release
//!   through it is rejected rather than hitting whoever reacquired the slot

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pool sizing and warm-up policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Instances constructed eagerly at creation when `prewarm_on_create` is set
    pub pre_warm_count: usize,
    /// Upper bound on live instances (active + inactive)
    pub max_capacity: usize,
    /// Construct `pre_warm_count` inactive instances when the pool is created
    pub prewarm_on_create: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pre_warm_count: 50,
            max_capacity: 120,
            prewarm_on_create: false,
        }
    }
}

/// Errors from pool operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Every instance up to `max_capacity` is active
    #[error("Pool exhausted: all {max_capacity} instances are active")]
    Exhausted { max_capacity: usize },

    /// The handle does not refer to a currently active instance
    #[error("Instance {0:?} is not active in this pool")]
    NotActive(PoolHandle),
}

/// Handle to an instance owned by an [`ObjectPool`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    /// Slot index inside the owning pool
    pub fn index(&self) -> u32 {
        self.index
    }
}

type CreateFn<T> = Box<dyn FnMut() -> T>;
type ItemFn<T> = Box<dyn FnMut(&mut T)>;
type DestroyFn<T> = Box<dyn FnMut(T)>;

/// Lifecycle callbacks for pooled instances.
pub struct PoolHooks<T> {
    create: CreateFn<T>,
    on_acquire: Option<ItemFn<T>>,
    on_release: Option<ItemFn<T>>,
    on_destroy: Option<DestroyFn<T>>,
}

impl<T> PoolHooks<T> {
    /// Hooks with only a factory
    pub fn new(create: impl FnMut() -> T + 'static) -> Self {
        Self {
            create: Box::new(create),
            on_acquire: None,
            on_release: None,
            on_destroy: None,
        }
    }

    /// Run on an instance each time it becomes active
    pub fn on_acquire(mut self, f: impl FnMut(&mut T) + 'static) -> Self {
        self.on_acquire = Some(Box::new(f));
        self
    }

    /// Run on an instance each time it becomes inactive
    pub fn on_release(mut self, f: impl FnMut(&mut T) + 'static) -> Self {
        self.on_release = Some(Box::new(f));
        self
    }

    /// Run exactly once per instance when it is destroyed
    pub fn on_destroy(mut self, f: impl FnMut(T) + 'static) -> Self {
        self.on_destroy = Some(Box::new(f));
        self
    }
}

#[derive(Debug)]
struct Slot<T> {
    item: Option<T>,
    generation: u32,
    active: bool,
}

/// Generic pool of reusable instances
pub struct ObjectPool<T> {
    config: PoolConfig,
    hooks: PoolHooks<T>,
    slots: Vec<Slot<T>>,
    /// Inactive live instances, reused LIFO
    free: Vec<u32>,
    /// Slots whose instance was destroyed
    vacant: Vec<u32>,
    /// Active instances in acquisition order
    active: Vec<u32>,
    created_total: usize,
    destroyed_total: usize,
}

impl<T> ObjectPool<T> {
    /// Create a pool, pre-warming it if the config asks for it
    pub fn new(config: PoolConfig, hooks: PoolHooks<T>) -> Self {
        let mut pool = Self {
            config,
            hooks,
            slots: Vec::new(),
            free: Vec::new(),
            vacant: Vec::new(),
            active: Vec::new(),
            created_total: 0,
            destroyed_total: 0,
        };

        if config.prewarm_on_create {
            pool.prewarm();
        }

        pool
    }

    /// Construct inactive instances until `pre_warm_count` are live.
    ///
    /// Never exceeds `max_capacity`. Returns the number constructed.
    pub fn prewarm(&mut self) -> usize {
        let target = self.config.pre_warm_count.min(self.config.max_capacity);
        let mut constructed = 0;

        while self.live_count() < target {
            let index = self.construct();
            self.free.push(index);
            constructed += 1;
        }

        log::trace!("Pre-warmed {} pool instances", constructed);
        constructed
    }

    /// Activate an instance: reuse an inactive one, else construct a new one.
    ///
    /// Fails with [`PoolError::Exhausted`] once `max_capacity` instances are
    /// all active; an active instance is never handed out twice.
    pub fn acquire(&mut self) -> Result<PoolHandle, PoolError> {
        let index = match self.free.pop() {
            Some(index) => index,
            None if self.live_count() >= self.config.max_capacity => {
                log::error!(
                    "Pool exhausted: {} active of max {}",
                    self.active.len(),
                    self.config.max_capacity
                );
                return Err(PoolError::Exhausted {
                    max_capacity: self.config.max_capacity,
                });
            }
            None => self.construct(),
        };

        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.active = true;
        if let (Some(hook), Some(item)) = (self.hooks.on_acquire.as_mut(), slot.item.as_mut()) {
            hook(item);
        }
        self.active.push(index);

        Ok(PoolHandle {
            index,
            generation: slot.generation,
        })
    }

    /// Acquire and then configure the instance with `init`.
    pub fn acquire_with(&mut self, init: impl FnOnce(&mut T)) -> Result<PoolHandle, PoolError> {
        let handle = self.acquire()?;
        if let Some(item) = self.slots[handle.index as usize].item.as_mut() {
            init(item);
        }
        Ok(handle)
    }

    /// Deactivate an instance and return it to the reusable set.
    ///
    /// Releasing a handle that is not active leaves the pool untouched and
    /// returns [`PoolError::NotActive`].
    pub fn release(&mut self, handle: PoolHandle) -> Result<(), PoolError> {
        if !self.is_active(handle) {
            log::warn!("Ignoring release of inactive pool instance {:?}", handle);
            return Err(PoolError::NotActive(handle));
        }

        let index = handle.index;
        let slot = &mut self.slots[index as usize];
        slot.active = false;
        // Bump so the released handle goes stale
        slot.generation = slot.generation.wrapping_add(1);
        if let (Some(hook), Some(item)) = (self.hooks.on_release.as_mut(), slot.item.as_mut()) {
            hook(item);
        }

        if let Some(pos) = self.active.iter().position(|&i| i == index) {
            self.active.remove(pos);
        }

        if self.live_count() > self.config.max_capacity {
            self.destroy(index);
        } else {
            self.free.push(index);
        }

        Ok(())
    }

    /// Release every active instance exactly once. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let snapshot = self.active_items();
        let mut released = 0;

        for handle in snapshot {
            if self.release(handle).is_ok() {
                released += 1;
            }
        }

        released
    }

    /// Snapshot of the active instances in acquisition order.
    ///
    /// The returned list is a copy, so releasing while walking it is safe.
    pub fn active_items(&self) -> Vec<PoolHandle> {
        self.active
            .iter()
            .map(|&index| PoolHandle {
                index,
                generation: self.slots[index as usize].generation,
            })
            .collect()
    }

    /// Whether `handle` refers to a currently active instance
    pub fn is_active(&self, handle: PoolHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|s| s.active && s.generation == handle.generation && s.item.is_some())
    }

    /// Borrow an active instance
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        if !self.is_active(handle) {
            return None;
        }
        self.slots[handle.index as usize].item.as_ref()
    }

    /// Mutably borrow an active instance
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        if !self.is_active(handle) {
            return None;
        }
        self.slots[handle.index as usize].item.as_mut()
    }

    /// Iterate active instances in acquisition order
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> + '_ {
        self.active.iter().filter_map(move |&index| {
            let slot = &self.slots[index as usize];
            slot.item.as_ref().map(|item| {
                (
                    PoolHandle {
                        index,
                        generation: slot.generation,
                    },
                    item,
                )
            })
        })
    }

    /// Lower or raise the capacity; inactive instances above it are destroyed now,
    /// active ones as they are released.
    pub fn set_max_capacity(&mut self, max_capacity: usize) {
        self.config.max_capacity = max_capacity;
        self.prune();
    }

    /// Destroy inactive instances until the live count fits `max_capacity`.
    /// Returns the number destroyed.
    pub fn prune(&mut self) -> usize {
        let mut destroyed = 0;
        while self.live_count() > self.config.max_capacity {
            match self.free.pop() {
                Some(index) => {
                    self.destroy(index);
                    destroyed += 1;
                }
                None => break,
            }
        }
        destroyed
    }

    /// Get the pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of active instances
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of inactive instances ready for reuse
    pub fn inactive_count(&self) -> usize {
        self.free.len()
    }

    /// Number of instances currently alive
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    /// Total instances ever constructed by the factory
    pub fn created_total(&self) -> usize {
        self.created_total
    }

    /// Total instances ever destroyed
    pub fn destroyed_total(&self) -> usize {
        self.destroyed_total
    }

    fn construct(&mut self) -> u32 {
        let item = (self.hooks.create)();
        self.created_total += 1;

        match self.vacant.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.item = Some(item);
                slot.active = false;
                index
            }
            None => {
                self.slots.push(Slot {
                    item: Some(item),
                    generation: 0,
                    active: false,
                });
                (self.slots.len() - 1) as u32
            }
        }
    }

    fn destroy(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        slot.active = false;
        slot.generation = slot.generation.wrapping_add(1);
        if let Some(item) = slot.item.take() {
            if let Some(hook) = self.hooks.on_destroy.as_mut() {
                hook(item);
            }
            self.vacant.push(index);
            self.destroyed_total += 1;
            log::trace!("Destroyed pool instance in slot {}", index);
        }
    }
}

impl<T> Drop for ObjectPool<T> {
    fn drop(&mut self) {
        self.active.clear();
        self.free.clear();
        for index in 0..self.slots.len() as u32 {
            self.destroy(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Item {
        id: usize,
        visible: bool,
        acquired: u32,
    }

    fn counting_pool(config: PoolConfig) -> (ObjectPool<Item>, Rc<RefCell<Vec<usize>>>) {
        let destroyed = Rc::new(RefCell::new(Vec::new()));
        let sink = destroyed.clone();
        let mut next_id = 0;

        let hooks = PoolHooks::new(move || {
            next_id += 1;
            Item { id: next_id, ..Default::default() }
        })
        .on_acquire(|item: &mut Item| {
            item.visible = true;
            item.acquired += 1;
        })
        .on_release(|item: &mut Item| item.visible = false)
        .on_destroy(move |item: Item| sink.borrow_mut().push(item.id));

        (ObjectPool::new(config, hooks), destroyed)
    }

    fn config(pre_warm_count: usize, max_capacity: usize, prewarm_on_create: bool) -> PoolConfig {
        PoolConfig { pre_warm_count, max_capacity, prewarm_on_create }
    }

    #[test]
    fn test_default_config() {
        let cfg = PoolConfig::default();
        assert_eq!(cfg.pre_warm_count, 50);
        assert_eq!(cfg.max_capacity, 120);
        assert!(!cfg.prewarm_on_create);
    }

    #[test]
    fn test_prewarm_on_create() {
        let (pool, _) = counting_pool(config(3, 10, true));
        assert_eq!(pool.inactive_count(), 3);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.created_total(), 3);
    }

    #[test]
    fn test_no_prewarm_when_disabled() {
        let (pool, _) = counting_pool(config(3, 10, false));
        assert_eq!(pool.live_count(), 0);
    }

    #[test]
    fn test_grows_after_prewarmed_instances_used() {
        let (mut pool, _) = counting_pool(config(3, 10, true));

        for _ in 0..3 {
            pool.acquire().unwrap();
        }
        assert_eq!(pool.created_total(), 3);

        pool.acquire().unwrap();
        assert_eq!(pool.created_total(), 4);
        assert_eq!(pool.active_count(), 4);
    }

    #[test]
    fn test_acquire_runs_hook() {
        let (mut pool, _) = counting_pool(config(0, 10, false));
        let h = pool.acquire().unwrap();
        let item = pool.get(h).unwrap();
        assert!(item.visible);
        assert_eq!(item.acquired, 1);
    }

    #[test]
    fn test_acquire_with_runs_after_hook() {
        let (mut pool, _) = counting_pool(config(0, 10, false));
        let h = pool.acquire_with(|item| item.visible = false).unwrap();
        assert!(!pool.get(h).unwrap().visible);
    }

    #[test]
    fn test_release_reuses_instance() {
        let (mut pool, _) = counting_pool(config(0, 10, false));
        let h = pool.acquire().unwrap();
        let id = pool.get(h).unwrap().id;

        pool.release(h).unwrap();
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.inactive_count(), 1);

        let h2 = pool.acquire().unwrap();
        assert_eq!(pool.get(h2).unwrap().id, id);
        assert_eq!(pool.get(h2).unwrap().acquired, 2);
        assert_eq!(pool.created_total(), 1);
    }

    #[test]
    fn test_double_release_is_noop() {
        let (mut pool, _) = counting_pool(config(0, 10, false));
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();

        pool.release(a).unwrap();
        assert_eq!(pool.release(a), Err(PoolError::NotActive(a)));

        assert_eq!(pool.active_items(), vec![b]);
        assert_eq!(pool.inactive_count(), 1);
    }

    #[test]
    fn test_stale_handle_does_not_release_reacquired_instance() {
        let (mut pool, _) = counting_pool(config(0, 10, false));
        let old = pool.acquire().unwrap();
        pool.release(old).unwrap();

        let fresh = pool.acquire().unwrap();
        assert_eq!(old.index(), fresh.index());

        assert!(pool.release(old).is_err());
        assert!(pool.is_active(fresh));
        assert_eq!(pool.active_items(), vec![fresh]);
    }

    #[test]
    fn test_active_items_in_acquisition_order() {
        let (mut pool, _) = counting_pool(config(0, 10, false));
        let handles: Vec<_> = (0..4).map(|_| pool.acquire().unwrap()).collect();
        pool.release(handles[1]).unwrap();

        assert_eq!(pool.active_items(), vec![handles[0], handles[2], handles[3]]);
    }

    #[test]
    fn test_release_while_walking_snapshot() {
        let (mut pool, _) = counting_pool(config(0, 10, false));
        for _ in 0..5 {
            pool.acquire().unwrap();
        }

        let mut visited = 0;
        for handle in pool.active_items() {
            visited += 1;
            pool.release(handle).unwrap();
        }

        assert_eq!(visited, 5);
        assert!(pool.active_items().is_empty());
    }

    #[test]
    fn test_release_all() {
        let (mut pool, _) = counting_pool(config(0, 10, false));
        for _ in 0..6 {
            pool.acquire().unwrap();
        }

        assert_eq!(pool.release_all(), 6);
        assert!(pool.active_items().is_empty());
        assert_eq!(pool.inactive_count(), 6);
        assert_eq!(pool.iter_active().count(), 0);
    }

    #[test]
    fn test_exhausted_at_max_capacity() {
        let (mut pool, _) = counting_pool(config(0, 2, false));
        let a = pool.acquire().unwrap();
        pool.acquire().unwrap();

        assert_eq!(pool.acquire(), Err(PoolError::Exhausted { max_capacity: 2 }));
        assert_eq!(pool.active_count(), 2);

        pool.release(a).unwrap();
        assert!(pool.acquire().is_ok());
    }

    #[test]
    fn test_prewarm_capped_by_max_capacity() {
        let (pool, _) = counting_pool(config(8, 5, true));
        assert_eq!(pool.live_count(), 5);
    }

    #[test]
    fn test_lowering_capacity_prunes() {
        let (mut pool, destroyed) = counting_pool(config(0, 10, false));
        let handles: Vec<_> = (0..4).map(|_| pool.acquire().unwrap()).collect();
        pool.release(handles[0]).unwrap();
        pool.release(handles[1]).unwrap();

        // Two inactive pruned immediately
        pool.set_max_capacity(2);
        assert_eq!(pool.live_count(), 2);
        assert_eq!(destroyed.borrow().len(), 2);

        // Still at max: releasing keeps the instance
        pool.release(handles[2]).unwrap();
        assert_eq!(pool.live_count(), 2);

        pool.set_max_capacity(1);
        assert_eq!(pool.live_count(), 1);
        assert_eq!(pool.destroyed_total(), 3);

        // Over max while active: destroyed on release
        pool.set_max_capacity(0);
        pool.release(handles[3]).unwrap();
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.destroyed_total(), 4);
    }

    #[test]
    fn test_destroy_once_on_drop() {
        let (mut pool, destroyed) = counting_pool(config(2, 10, true));
        let h = pool.acquire().unwrap();
        pool.acquire().unwrap();
        pool.acquire().unwrap();
        pool.release(h).unwrap();
        drop(pool);

        let mut ids = destroyed.borrow().clone();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_config_serde() {
        let cfg: PoolConfig = serde_json::from_str(r#"{"max_capacity": 8}"#).unwrap();
        assert_eq!(cfg.max_capacity, 8);
        assert_eq!(cfg.pre_warm_count, 50);
    }
}
