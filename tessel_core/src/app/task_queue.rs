// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::app::{App, Clock, SystemClock};

/// A unit of deferred work, run on the UI thread with access to the [`App`].
pub type Task = Box<dyn FnOnce(&mut App) + Send>;

type Waker = Arc<dyn Fn() + Send + Sync>;

struct Delayed {
    deadline: Instant,
    order: u64,
    task: Task,
}

// Reversed so that `BinaryHeap` pops the earliest deadline first,
// and tasks with the same deadline in the order they were scheduled.
impl Ord for Delayed {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for Delayed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Delayed {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Delayed {}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<Task>,
    delayed: BinaryHeap<Delayed>,
    next_order: u64,
}

struct Shared {
    clock: Arc<dyn Clock>,
    state: Mutex<QueueState>,
    waker: Mutex<Option<Waker>>,
}

/// The queue of work waiting to run on the UI thread.
///
/// This is the only part of Tessel that may be used from other threads:
/// clone it and call [`invoke`](Self::invoke) or [`invoke_after`](Self::invoke_after)
/// from anywhere. Tasks run in the order they became due, exactly one per
/// [`App::tick`].
///
/// A scheduled task can't be cancelled. Tasks that refer to a window or panel
/// must check that it still exists when they run.
#[derive(Clone)]
pub struct TaskQueue {
    shared: Arc<Shared>,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TaskQueue")
            .field("ready", &state.ready.len())
            .field("delayed", &state.delayed.len())
            .field("clock", &self.shared.clock)
            .finish_non_exhaustive()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    /// An empty queue using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// An empty queue using `clock` to schedule delayed tasks.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                clock,
                state: Mutex::new(QueueState::default()),
                waker: Mutex::new(None),
            }),
        }
    }

    // A panicking task never holds the lock, but recover from poisoning regardless.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current time according to the queue's clock.
    pub fn now(&self) -> Instant {
        self.shared.clock.now()
    }

    /// Call `waker` whenever a task is added, e.g. to wake a sleeping event loop.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self.shared.waker.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    fn wake(&self) {
        let waker = self
            .shared
            .waker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }

    /// Append `task` to the queue.
    pub fn invoke(&self, task: impl FnOnce(&mut App) + Send + 'static) {
        self.lock().ready.push_back(Box::new(task));
        self.wake();
    }

    /// Append `task` to the queue once `delay` has elapsed.
    ///
    /// The task still only runs during a tick, never directly when the delay expires.
    pub fn invoke_after(&self, task: impl FnOnce(&mut App) + Send + 'static, delay: Duration) {
        if delay.is_zero() {
            self.invoke(task);
            return;
        }
        let deadline = self.now() + delay;
        {
            let mut state = self.lock();
            let order = state.next_order;
            state.next_order += 1;
            state.delayed.push(Delayed {
                deadline,
                order,
                task: Box::new(task),
            });
        }
        self.wake();
    }

    /// Number of tasks waiting, due or not.
    pub fn len(&self) -> usize {
        let state = self.lock();
        state.ready.len() + state.delayed.len()
    }

    /// `true` if no tasks are waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of tasks that are due.
    pub fn ready_len(&self) -> usize {
        self.lock().ready.len()
    }

    /// When the earliest delayed task becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.lock().delayed.peek().map(|delayed| delayed.deadline)
    }

    /// Move delayed tasks whose deadline has passed to the end of the queue.
    ///
    /// Returns the number of tasks moved.
    pub fn promote_due(&self) -> usize {
        let now = self.now();
        let mut state = self.lock();
        let mut promoted = 0;
        while state
            .delayed
            .peek()
            .is_some_and(|delayed| delayed.deadline <= now)
        {
            if let Some(delayed) = state.delayed.pop() {
                state.ready.push_back(delayed.task);
                promoted += 1;
            }
        }
        promoted
    }

    /// Take the next due task.
    pub(crate) fn pop(&self) -> Option<Task> {
        self.lock().ready.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    use super::*;

    #[derive(Debug)]
    struct FixedClock(Instant);

    impl Clock for FixedClock {
        fn now(&self) -> Instant {
            self.0
        }
    }

    #[test]
    fn delayed_tasks_wait_for_their_deadline() {
        let start = Instant::now();
        let queue = TaskQueue::with_clock(Arc::new(FixedClock(start)));
        queue.invoke_after(|_| {}, Duration::from_millis(20));
        queue.invoke_after(|_| {}, Duration::from_millis(10));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.ready_len(), 0);
        assert_eq!(queue.next_deadline(), Some(start + Duration::from_millis(10)));
        assert_eq!(queue.promote_due(), 0);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn zero_delay_is_immediate() {
        let queue = TaskQueue::new();
        queue.invoke_after(|_| {}, Duration::ZERO);
        assert_eq!(queue.ready_len(), 1);
        assert_eq!(queue.next_deadline(), None);
    }

    #[test]
    fn waker_runs_on_every_enqueue() {
        let queue = TaskQueue::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        queue.set_waker(move || {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
        });

        let remote = queue.clone();
        std::thread::spawn(move || remote.invoke(|_| {}))
            .join()
            .unwrap();
        queue.invoke_after(|_| {}, Duration::from_secs(1));

        assert_eq!(wakes.load(AtomicOrdering::SeqCst), 2);
        assert_eq!(queue.len(), 2);
    }
}
