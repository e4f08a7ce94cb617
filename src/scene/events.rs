//! Notifications the stack scene publishes to its collaborators (UI, camera)

use super::node::LookAtTarget;

/// Per-grade outcome of an initialization
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Blocks materialized per stack, indexed by grade index
    pub placed: [usize; 3],
    /// Records left unplaced per stack because the pool was exhausted
    pub shortfall: [usize; 3],
    /// Records dropped for an unknown grade
    pub dropped: usize,
}

impl InitReport {
    /// Blocks placed across all stacks
    pub fn total_placed(&self) -> usize {
        self.placed.iter().sum()
    }

    /// Whether every known-grade record got a block
    pub fn is_complete(&self) -> bool {
        self.shortfall.iter().all(|&n| n == 0)
    }
}

/// Outcome of testing the stacks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestReport {
    /// Not-started blocks pulled out of the stacks
    pub released: usize,
    /// Blocks switched to simulated physics
    pub dynamic: usize,
}

/// Scene notification
#[derive(Clone, Debug, PartialEq)]
pub enum StackEvent {
    Initialized(InitReport),
    InitializationFailed { reason: String },
    StackSelected(LookAtTarget),
    StackDeselected,
    TestCompleted(TestReport),
    /// Stack picking colliders switched on or off
    PickingChanged { enabled: bool },
}

/// Identifies one subscription for later removal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StackEvent)>;

/// Ordered list of subscribers, notified synchronously on publish
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners run in subscription order.
    pub fn subscribe(&mut self, listener: impl FnMut(&StackEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to every listener
    pub fn publish(&mut self, event: &StackEvent) {
        log::trace!("Publishing {:?} to {} listeners", event, self.listeners.len());
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
