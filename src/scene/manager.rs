//! Stack scene manager
//!
//! Owns one block pool per grade and drives the scene through
//! initialization, stack selection and the physical stack test. Collaborators
//! (UI, camera, raycast input) call the trigger methods and subscribe to
//! [`StackEvent`]s; nothing here is global, so independent scenes can coexist.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::core::time::{Debouncer, SceneClock};
use crate::core::{Error, Result};
use crate::pool::{ObjectPool, PoolConfig, PoolHandle, PoolHooks};
use crate::stack::block::BlockInstance;
use crate::stack::record::Grade;
use crate::stack::sort::{partition_by_grade, sort_records, GradeQueues};
use super::config::SceneConfig;
use super::events::{EventBus, InitReport, StackEvent, SubscriptionId, TestReport};
use super::node::LookAtTarget;
use super::source::StackDataSource;

/// Lifecycle state of the scene
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SceneState {
    #[default]
    Uninitialized,
    /// Stacks built, none selected
    Idle,
    StackSelected,
    /// Stacks released to physics; only a new initialization leaves this state
    Testing,
}

impl SceneState {
    pub fn name(self) -> &'static str {
        match self {
            SceneState::Uninitialized => "uninitialized",
            SceneState::Idle => "idle",
            SceneState::StackSelected => "a stack is selected",
            SceneState::Testing => "testing",
        }
    }
}

/// Builds and manages the three grade stacks
pub struct StackSceneManager {
    config: SceneConfig,
    state: SceneState,
    /// Indexed by grade index; created on first initialization
    pools: Option<[ObjectPool<BlockInstance>; 3]>,
    selected: Option<LookAtTarget>,
    picking_enabled: bool,
    can_test: bool,
    clock: SceneClock,
    /// Payload: whether a stack was selected when the timer was scheduled
    picking_timer: Debouncer<bool>,
    events: EventBus,
    last_report: Option<InitReport>,
}

impl StackSceneManager {
    /// Create an uninitialized scene
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            state: SceneState::Uninitialized,
            pools: None,
            selected: None,
            picking_enabled: false,
            can_test: false,
            clock: SceneClock::new(),
            picking_timer: Debouncer::new(),
            events: EventBus::new(),
            last_report: None,
        }
    }

    // --- Triggers ---

    /// Load, sort and partition the dataset, then rebuild every stack.
    ///
    /// Valid in any state. Blocks from a previous build are released back to
    /// their pools first. A selected stack is dropped, with
    /// [`StackEvent::StackDeselected`] published ahead of `Initialized`. A load or parse failure leaves the scene untouched
    /// and publishes [`StackEvent::InitializationFailed`].
    pub fn initialize(&mut self, source: &dyn StackDataSource) -> Result<InitReport> {
        log::info!("Initializing stacks from {}", source.describe());

        let records = match source.load() {
            Ok(records) => records,
            Err(e) => {
                log::error!("Stack initialization failed: {}", e);
                self.events.publish(&StackEvent::InitializationFailed {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        let partition = partition_by_grade(sort_records(records));
        let mut queues = partition.queues;

        self.refill_pools();

        let mut report = InitReport {
            dropped: partition.dropped.len(),
            ..Default::default()
        };
        for grade in Grade::ALL {
            let (placed, shortfall) = self.build_stack(grade, &mut queues);
            report.placed[grade.index()] = placed;
            report.shortfall[grade.index()] = shortfall;
        }

        let was_selected = self.selected.take().is_some();
        self.state = SceneState::Idle;
        self.can_test = true;
        self.set_picking(false);
        self.schedule_picking_update();

        log::info!(
            "Stacks ready: {:?} blocks per grade, {} records dropped",
            report.placed, report.dropped
        );

        self.last_report = Some(report.clone());
        if was_selected {
            self.events.publish(&StackEvent::StackDeselected);
        }
        self.events.publish(&StackEvent::Initialized(report.clone()));
        Ok(report)
    }

    /// Select the stack at `index` (0 = 6th grade) as the camera target.
    pub fn select_stack(&mut self, index: usize) -> Result<LookAtTarget> {
        let grade = Grade::from_index(index).ok_or(Error::UnknownStack(index))?;
        self.expect_state(&[SceneState::Idle, SceneState::StackSelected], "select a stack")?;

        let target = LookAtTarget {
            grade,
            position: self.config.parent(grade).look_at(),
        };
        self.selected = Some(target);
        self.state = SceneState::StackSelected;
        self.set_picking(false);
        self.schedule_picking_update();

        log::info!("Selected {} stack", grade);
        self.events.publish(&StackEvent::StackSelected(target));
        Ok(target)
    }

    /// Select the stack whose picking collider was hit.
    ///
    /// Returns `Ok(false)` without changing anything while picking is
    /// unavailable (a stack is selected, or the debounce has not elapsed).
    pub fn pick_stack(&mut self, index: usize) -> Result<bool> {
        if !self.can_pick_stack() {
            log::trace!("Ignoring pick of stack {} while picking is disabled", index);
            return Ok(false);
        }
        self.select_stack(index)?;
        Ok(true)
    }

    /// Return from a selected stack to the overview.
    pub fn deselect(&mut self) -> Result<()> {
        self.expect_state(&[SceneState::StackSelected], "deselect")?;

        self.selected = None;
        self.state = SceneState::Idle;
        self.schedule_picking_update();

        log::info!("Stack deselected");
        self.events.publish(&StackEvent::StackDeselected);
        Ok(())
    }

    /// Pull out every not-started block and let the rest fall.
    ///
    /// A block whose label is hidden has nothing to test and is released to
    /// its pool; every other active block switches to dynamic physics.
    pub fn test_my_stack(&mut self) -> Result<TestReport> {
        self.expect_state(&[SceneState::Idle, SceneState::StackSelected], "test the stacks")?;

        let mut report = TestReport::default();
        if let Some(pools) = self.pools.as_mut() {
            for (grade, pool) in Grade::ALL.iter().zip(pools.iter_mut()) {
                let mut to_release = Vec::new();
                for handle in pool.active_items() {
                    match pool.get_mut(handle) {
                        Some(block) if !block.label_visible => to_release.push(handle),
                        Some(block) => {
                            block.enable_physics();
                            report.dynamic += 1;
                        }
                        None => {}
                    }
                }

                let pulled = to_release.len();
                for handle in to_release {
                    match pool.release(handle) {
                        Ok(()) => report.released += 1,
                        Err(e) => log::warn!("{} stack: {}", grade, e),
                    }
                }
                log::debug!("{} stack: {} blocks pulled before test", grade, pulled);
            }
        }

        self.state = SceneState::Testing;
        self.selected = None;
        self.can_test = false;
        self.picking_timer.cancel();
        self.set_picking(false);

        log::info!(
            "Testing stacks: {} blocks falling, {} pulled",
            report.dynamic, report.released
        );
        self.events.publish(&StackEvent::TestCompleted(report));
        Ok(report)
    }

    /// Advance the scene clock by one tick.
    ///
    /// Returns the new picking state if the debounce fired during this tick.
    pub fn update(&mut self, dt: Duration) -> Option<bool> {
        self.clock.advance(dt);

        let selected = self.picking_timer.poll(self.clock.now())?;
        let enabled = !selected;
        log::debug!(
            "Debounce elapsed, stack picking {}",
            if enabled { "enabled" } else { "stays disabled" }
        );
        self.set_picking(enabled);
        Some(enabled)
    }

    // --- Subscriptions ---

    /// Subscribe a collaborator to scene notifications
    pub fn subscribe(&mut self, listener: impl FnMut(&StackEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    /// Remove a subscription
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // --- Queries ---

    /// Current lifecycle state
    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Whether a stack is currently selected
    pub fn is_any_stack_selected(&self) -> bool {
        self.state == SceneState::StackSelected
    }

    /// Camera target of the selected stack
    pub fn selected_look_at(&self) -> Option<LookAtTarget> {
        self.selected
    }

    /// Whether a click on a stack should select it
    pub fn can_pick_stack(&self) -> bool {
        self.state == SceneState::Idle && self.picking_enabled
    }

    /// Whether the stack picking colliders are on
    pub fn picking_enabled(&self) -> bool {
        self.picking_enabled
    }

    /// Whether the stacks can be tested
    pub fn can_test(&self) -> bool {
        self.can_test
    }

    /// Whether a picking re-enable is waiting on the debounce
    pub fn debounce_pending(&self) -> bool {
        self.picking_timer.is_pending()
    }

    /// Active blocks of `grade`'s stack in placement order
    pub fn active_blocks(&self, grade: Grade) -> Vec<&BlockInstance> {
        self.pool(grade)
            .map(|pool| pool.iter_active().map(|(_, block)| block).collect())
            .unwrap_or_default()
    }

    /// Handles of `grade`'s active blocks in placement order
    pub fn active_handles(&self, grade: Grade) -> Vec<PoolHandle> {
        self.pool(grade).map(ObjectPool::active_items).unwrap_or_default()
    }

    /// Active blocks across all stacks
    pub fn active_count(&self) -> usize {
        Grade::ALL
            .iter()
            .filter_map(|&g| self.pool(g))
            .map(ObjectPool::active_count)
            .sum()
    }

    /// Block pool of `grade`, once created
    pub fn pool(&self, grade: Grade) -> Option<&ObjectPool<BlockInstance>> {
        self.pools.as_ref().map(|pools| &pools[grade.index()])
    }

    /// Report of the last successful initialization
    pub fn last_report(&self) -> Option<&InitReport> {
        self.last_report.as_ref()
    }

    /// Get the scene configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    // --- Helpers ---

    fn expect_state(&self, allowed: &[SceneState], trigger: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            log::warn!("Cannot {} while {}", trigger, self.state.name());
            Err(Error::InvalidTransition {
                state: self.state.name(),
                trigger,
            })
        }
    }

    /// Release every block of the previous build, or create the pools on first use
    fn refill_pools(&mut self) {
        if let Some(pools) = self.pools.as_mut() {
            for (grade, pool) in Grade::ALL.iter().zip(pools.iter_mut()) {
                let released = pool.release_all();
                log::debug!("Released {} blocks back to the {} pool", released, grade);
            }
            return;
        }

        let pool_config = self.config.pool;
        let serials = Rc::new(Cell::new(0u64));
        self.pools = Some(Grade::ALL.map(|grade| create_pool(pool_config, grade, serials.clone())));
        log::debug!("Created block pools for grades 6, 7 and 8");
    }

    /// Drain `grade`'s queue into positioned blocks.
    ///
    /// Returns (placed, unplaced). Stops at the first pool exhaustion.
    fn build_stack(&mut self, grade: Grade, queues: &mut GradeQueues) -> (usize, usize) {
        let Some(pools) = self.pools.as_mut() else {
            return (0, queues.len(grade));
        };
        let pool = &mut pools[grade.index()];
        let materials = &self.config.materials;
        let layout = &self.config.layout;

        let mut placed = 0;
        while let Some(record) = queues.pop_front(grade) {
            let pose = layout.pose(placed);
            let acquired = pool.acquire_with(|block| {
                block.assign(&record, materials);
                block.place(grade, &pose);
            });

            if let Err(e) = acquired {
                let unplaced = queues.len(grade) + 1;
                log::error!(
                    "{} stack stopped at {} blocks, {} records unplaced: {}",
                    grade, placed, unplaced, e
                );
                return (placed, unplaced);
            }
            placed += 1;
        }

        (placed, 0)
    }

    fn set_picking(&mut self, enabled: bool) {
        if self.picking_enabled != enabled {
            self.picking_enabled = enabled;
            self.events.publish(&StackEvent::PickingChanged { enabled });
        }
    }

    fn schedule_picking_update(&mut self) {
        let selected = self.is_any_stack_selected();
        self.picking_timer
            .schedule(self.clock.now(), self.config.debounce(), selected);
    }
}

fn create_pool(
    config: PoolConfig,
    grade: Grade,
    serials: Rc<Cell<u64>>,
) -> ObjectPool<BlockInstance> {
    let hooks = PoolHooks::new(move || {
        let serial = serials.get();
        serials.set(serial + 1);
        BlockInstance::new(serial)
    })
    .on_acquire(BlockInstance::activate)
    .on_release(BlockInstance::deactivate)
    .on_destroy(move |block: BlockInstance| {
        log::trace!("Destroyed block {} of the {} pool", block.serial(), grade);
    });

    ObjectPool::new(config, hooks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::record::{Mastery, StackRecord};
    use std::cell::RefCell;

    fn records(per_grade: usize, mastery: Mastery) -> Vec<StackRecord> {
        let mut out = Vec::new();
        for grade in Grade::ALL {
            for i in 0..per_grade {
                out.push(StackRecord::new(
                    "Domain",
                    "Cluster",
                    format!("{}.{}", grade.number(), i),
                    grade.label(),
                    mastery,
                ));
            }
        }
        out
    }

    fn ready_manager() -> StackSceneManager {
        let mut manager = StackSceneManager::new(SceneConfig::default());
        manager.initialize(&records(3, Mastery::Learned)).unwrap();
        manager
    }

    fn recorded_events(manager: &mut StackSceneManager) -> Rc<RefCell<Vec<StackEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        manager.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        log
    }

    #[test]
    fn test_new_manager_uninitialized() {
        let manager = StackSceneManager::new(SceneConfig::default());
        assert_eq!(manager.state(), SceneState::Uninitialized);
        assert!(manager.pool(Grade::Sixth).is_none());
        assert!(manager.active_blocks(Grade::Sixth).is_empty());
        assert!(!manager.can_test());
        assert!(!manager.can_pick_stack());
    }

    #[test]
    fn test_initialize_builds_stacks() {
        let manager = ready_manager();
        assert_eq!(manager.state(), SceneState::Idle);
        assert_eq!(manager.active_count(), 9);
        assert!(manager.can_test());

        for grade in Grade::ALL {
            let blocks = manager.active_blocks(grade);
            assert_eq!(blocks.len(), 3);
            assert!(blocks.iter().all(|b| b.parent == Some(grade) && b.visible));
        }
    }

    #[test]
    fn test_blocks_follow_sorted_order() {
        let mut manager = StackSceneManager::new(SceneConfig::default());
        let data = vec![
            StackRecord::new("B", "x", "b", "6th Grade", Mastery::Learned),
            StackRecord::new("A", "x", "a", "6th Grade", Mastery::Mastered),
        ];
        manager.initialize(&data).unwrap();

        let ids: Vec<_> = manager
            .active_blocks(Grade::Sixth)
            .iter()
            .map(|b| b.standard_id.clone())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_initialize_failure_publishes_and_keeps_state() {
        let mut manager = ready_manager();
        let events = recorded_events(&mut manager);

        let bad = crate::scene::source::InlineJson("not json".to_string());
        assert!(matches!(manager.initialize(&bad), Err(Error::DataParse(_))));

        assert_eq!(manager.active_count(), 9);
        assert_eq!(manager.state(), SceneState::Idle);
        assert!(matches!(
            events.borrow().as_slice(),
            [StackEvent::InitializationFailed { .. }]
        ));
    }

    #[test]
    fn test_select_and_deselect() {
        let mut manager = ready_manager();
        let events = recorded_events(&mut manager);

        let target = manager.select_stack(2).unwrap();
        assert_eq!(target.grade, Grade::Eighth);
        assert_eq!(target.position, manager.config().stack_parents[2].look_at());
        assert!(manager.is_any_stack_selected());
        assert_eq!(manager.selected_look_at(), Some(target));

        manager.deselect().unwrap();
        assert!(!manager.is_any_stack_selected());
        assert_eq!(manager.selected_look_at(), None);

        assert_eq!(
            *events.borrow(),
            vec![StackEvent::StackSelected(target), StackEvent::StackDeselected]
        );
    }

    #[test]
    fn test_reinitialize_while_selected_deselects_first() {
        let mut manager = ready_manager();
        manager.select_stack(1).unwrap();
        let events = recorded_events(&mut manager);

        let report = manager.initialize(&records(3, Mastery::Learned)).unwrap();
        assert!(!manager.is_any_stack_selected());
        assert_eq!(
            *events.borrow(),
            vec![StackEvent::StackDeselected, StackEvent::Initialized(report)]
        );
    }

    #[test]
    fn test_reinitialize_while_idle_sends_no_deselect() {
        let mut manager = ready_manager();
        let events = recorded_events(&mut manager);

        manager.initialize(&records(3, Mastery::Learned)).unwrap();
        assert!(!events.borrow().contains(&StackEvent::StackDeselected));
    }

    #[test]
    fn test_huge_debounce_never_fires() {
        let mut config = SceneConfig::default();
        config.debounce_secs = 1e30;
        let mut manager = StackSceneManager::new(config);

        manager.initialize(&records(3, Mastery::Learned)).unwrap();
        manager.select_stack(0).unwrap();
        manager.deselect().unwrap();

        assert_eq!(manager.update(Duration::from_secs(3600)), None);
        assert!(manager.debounce_pending());
        assert!(!manager.can_pick_stack());
    }

    #[test]
    fn test_select_unknown_stack() {
        let mut manager = ready_manager();
        assert!(matches!(manager.select_stack(3), Err(Error::UnknownStack(3))));
        assert_eq!(manager.state(), SceneState::Idle);
    }

    #[test]
    fn test_triggers_before_initialize_rejected() {
        let mut manager = StackSceneManager::new(SceneConfig::default());
        assert!(matches!(
            manager.select_stack(0),
            Err(Error::InvalidTransition { state: "uninitialized", .. })
        ));
        assert!(manager.deselect().is_err());
        assert!(manager.test_my_stack().is_err());
    }

    #[test]
    fn test_deselect_while_idle_rejected() {
        let mut manager = ready_manager();
        assert!(matches!(manager.deselect(), Err(Error::InvalidTransition { .. })));
    }

    #[test]
    fn test_picking_enabled_after_debounce() {
        let mut manager = ready_manager();
        assert!(!manager.can_pick_stack());

        assert_eq!(manager.update(Duration::from_secs(1)), None);
        assert_eq!(manager.update(Duration::from_secs(1)), Some(true));
        assert!(manager.can_pick_stack());
    }

    #[test]
    fn test_pick_gated() {
        let mut manager = ready_manager();
        assert!(!manager.pick_stack(0).unwrap());
        assert_eq!(manager.state(), SceneState::Idle);

        manager.update(Duration::from_secs(2));
        assert!(manager.pick_stack(0).unwrap());
        assert!(!manager.picking_enabled());

        // Selected: further picks ignored
        assert!(!manager.pick_stack(1).unwrap());
        assert_eq!(manager.selected_look_at().map(|t| t.grade), Some(Grade::Sixth));
    }

    #[test]
    fn test_selection_keeps_picking_off_after_debounce() {
        let mut manager = ready_manager();
        manager.update(Duration::from_secs(2));
        manager.select_stack(1).unwrap();

        assert_eq!(manager.update(Duration::from_secs(3)), Some(false));
        assert!(!manager.picking_enabled());
    }

    #[test]
    fn test_test_my_stack_enables_physics() {
        let mut manager = ready_manager();
        manager.select_stack(0).unwrap();

        let report = manager.test_my_stack().unwrap();
        assert_eq!(report, TestReport { released: 0, dynamic: 9 });
        assert_eq!(manager.state(), SceneState::Testing);
        assert!(manager.selected_look_at().is_none());
        assert!(!manager.can_test());
        assert!(!manager.debounce_pending());

        for grade in Grade::ALL {
            assert!(manager.active_blocks(grade).iter().all(|b| b.physics.uses_gravity()));
        }
    }

    #[test]
    fn test_testing_rejects_selection_and_retest() {
        let mut manager = ready_manager();
        manager.test_my_stack().unwrap();

        assert!(manager.select_stack(0).is_err());
        assert!(manager.deselect().is_err());
        assert!(manager.test_my_stack().is_err());
    }

    #[test]
    fn test_exhausted_pool_reports_shortfall() {
        let mut config = SceneConfig::default();
        config.pool.max_capacity = 2;
        let mut manager = StackSceneManager::new(config);

        let report = manager.initialize(&records(3, Mastery::Learned)).unwrap();
        assert_eq!(report.placed, [2, 2, 2]);
        assert_eq!(report.shortfall, [1, 1, 1]);
        assert!(!report.is_complete());
        assert_eq!(manager.state(), SceneState::Idle);
    }

    #[test]
    fn test_prewarmed_pools_reused_across_builds() {
        let mut config = SceneConfig::default();
        config.pool.pre_warm_count = 5;
        config.pool.prewarm_on_create = true;
        let mut manager = StackSceneManager::new(config);

        manager.initialize(&records(3, Mastery::Learned)).unwrap();
        manager.initialize(&records(4, Mastery::Learned)).unwrap();

        let pool = manager.pool(Grade::Seventh).unwrap();
        assert_eq!(pool.created_total(), 5);
        assert_eq!(pool.active_count(), 4);
    }
}
