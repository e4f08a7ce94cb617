//! Scene timing: a tick-driven monotonic clock and a last-write-wins debouncer

use std::time::Duration;

/// Monotonic scene clock advanced by the driving update loop.
///
/// Time only moves forward through [`SceneClock::advance`], so deadlines
/// computed from it never run backwards.
#[derive(Clone, Copy, Debug, Default)]
pub struct SceneClock {
    elapsed: Duration,
}

impl SceneClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one tick of `dt`
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    /// Time since the clock was created
    pub fn now(&self) -> Duration {
        self.elapsed
    }
}

/// A scheduled-but-not-yet-fired action.
#[derive(Clone, Debug)]
struct PendingTask<T> {
    due: Duration,
    generation: u64,
    payload: T,
}

/// Cancellable deferred action where the latest schedule wins.
///
/// At most one task is pending. Scheduling replaces (and thereby cancels)
/// whatever was pending in the same call, so a replaced task can never fire.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    pending: Option<PendingTask<T>>,
    next_generation: u64,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debouncer<T> {
    /// Create an idle debouncer
    pub fn new() -> Self {
        Self {
            pending: None,
            next_generation: 1,
        }
    }

    /// Schedule `payload` to fire `delay` after `now`, replacing any pending task.
    ///
    /// Returns the generation of the new task.
    pub fn schedule(&mut self, now: Duration, delay: Duration, payload: T) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;

        if let Some(prev) = self.pending.replace(PendingTask {
            due: now.saturating_add(delay),
            generation,
            payload,
        }) {
            log::trace!(
                "Debounce task {} superseded by {}",
                prev.generation, generation
            );
        }

        generation
    }

    /// Drop the pending task, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Whether a task is waiting to fire
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Generation of the pending task
    pub fn pending_generation(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.generation)
    }

    /// Fire the pending task if its deadline has passed.
    ///
    /// A task fires at most once; afterwards the debouncer is idle.
    pub fn poll(&mut self, now: Duration) -> Option<T> {
        match &self.pending {
            Some(task) if task.due <= now => self.pending.take().map(|t| t.payload),
            _ => None,
        }
    }
}
