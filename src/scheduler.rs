//! Cooperative scheduler over a fixed-capacity ring of periodic tasks.
//!
//! # Overview
//! - Tasks live in `N` slots and are chained by slot index into a circular list.
//! - `last` is the tail; its successor is the head. `current` is the next task `step` looks at.
//! - `step` runs at most one callback, then lets the [`Policy`] move `current`.
//! - Callbacks receive `&mut Scheduler` and may add, remove or re-period any task, including
//!   their own. The cursor is re-read after the callback returns.
//!
//! # Notes
//! - A callback that never returns blocks the whole loop. There is no preemption.
//! - Callback identity is its function address; a callback can be registered once.

use core::fmt;
use core::marker::PhantomData;

use crate::clock::Clock;
use crate::policy::{Policy, RoundRobin};
use crate::task::Task;

/// Callback signature for a scheduler with clock `C`, capacity `N` and policy `P`.
pub type TaskFn<C, const N: usize, P> = fn(&mut Scheduler<C, N, P>);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Every slot is occupied.
    Full,
    /// The callback is already registered.
    Duplicate,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Full => write!(f, "task ring full"),
            Error::Duplicate => write!(f, "callback already scheduled"),
        }
    }
}

impl core::error::Error for Error {}

/// What a single [`Scheduler::step`] did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// No task is registered.
    Empty,
    /// The current task was not due.
    Idle,
    /// The current task's callback ran.
    Ran,
}

#[derive(Copy, Clone, Debug)]
struct Cursors {
    current: usize,
    last: usize,
}

/// Ring of at most `N` periodic tasks driven by clock `C` and cursor policy `P`.
pub struct Scheduler<C, const N: usize, P = RoundRobin> {
    clock: C,
    slots: [Option<Task<Self>>; N],
    cursors: Option<Cursors>,
    len: usize,
    _policy: PhantomData<P>,
}

impl<C: Clock, const N: usize, P: Policy> Scheduler<C, N, P> {
    pub const fn new(clock: C) -> Self {
        assert!(N > 0);
        Self {
            clock,
            slots: [const { None }; N],
            cursors: None,
            len: 0,
            _policy: PhantomData,
        }
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline]
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cursors.is_none()
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    fn slot(&self, idx: usize) -> Option<&Task<Self>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    #[inline]
    fn slot_mut(&mut self, idx: usize) -> Option<&mut Task<Self>> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    /// Slot of the task registered with `callback` and the slot of its predecessor,
    /// scanning from the head.
    fn find_with_prev(&self, callback: TaskFn<C, N, P>) -> Option<(usize, usize)> {
        let mut prev = self.cursors?.last;
        for idx in self.iter_slots() {
            if self.slot(idx).is_some_and(|task| task.matches(callback)) {
                return Some((idx, prev));
            }
            prev = idx;
        }
        None
    }

    fn find(&self, callback: TaskFn<C, N, P>) -> Option<usize> {
        self.find_with_prev(callback).map(|(idx, _)| idx)
    }

    fn iter_slots(&self) -> SlotIter<'_, C, N, P> {
        let head = self
            .cursors
            .and_then(|c| self.slot(c.last))
            .map(Task::next);
        SlotIter {
            sched: self,
            head,
            next: head,
        }
    }

    /// Tasks in ring order, starting at the head.
    pub fn iter(&self) -> impl Iterator<Item = &Task<Self>> + '_ {
        self.iter_slots().filter_map(|idx| self.slot(idx))
    }

    pub fn contains(&self, callback: TaskFn<C, N, P>) -> bool {
        self.find(callback).is_some()
    }

    pub fn task(&self, callback: TaskFn<C, N, P>) -> Option<&Task<Self>> {
        self.find(callback).and_then(|idx| self.slot(idx))
    }

    /// The task the next `step` will evaluate.
    pub fn current(&self) -> Option<&Task<Self>> {
        self.cursors.and_then(|c| self.slot(c.current))
    }

    /// Append `callback` at the tail of the ring, due `period_us` from now.
    /// A zero period runs it whenever it is current.
    pub fn add(&mut self, callback: TaskFn<C, N, P>, period_us: u64) -> Result<(), Error> {
        if self.contains(callback) {
            return Err(Error::Duplicate);
        }
        let Some(idx) = self.slots.iter().position(Option::is_none) else {
            return Err(Error::Full);
        };
        let now = self.clock.now_us();

        match self.cursors {
            None => {
                self.slots[idx] = Some(Task::new(callback, idx, period_us, now));
                self.cursors = Some(Cursors {
                    current: idx,
                    last: idx,
                });
            }
            Some(cursors) => {
                let head = self.slot(cursors.last).map_or(idx, Task::next);
                if let Some(tail) = self.slot_mut(cursors.last) {
                    tail.set_next(idx);
                }
                self.slots[idx] = Some(Task::new(callback, head, period_us, now));
                self.cursors = Some(Cursors {
                    last: idx,
                    ..cursors
                });
            }
        }
        self.len += 1;
        log::debug!("task added in slot {} (period {}us)", idx, period_us);
        Ok(())
    }

    /// Unlink the task registered with `callback`. Returns false if there is none.
    pub fn remove(&mut self, callback: TaskFn<C, N, P>) -> bool {
        let (Some(cursors), Some((idx, prev))) = (self.cursors, self.find_with_prev(callback))
        else {
            return false;
        };
        self.unlink(idx, prev, cursors);
        true
    }

    /// Unlink whichever task is `current`. Returns false on an empty ring.
    pub fn remove_current(&mut self) -> bool {
        let Some(callback) = self.current().map(Task::callback) else {
            return false;
        };
        self.remove(callback)
    }

    fn unlink(&mut self, idx: usize, prev: usize, cursors: Cursors) {
        let Some(removed) = self.slots[idx].take() else {
            return;
        };
        self.len -= 1;
        let next = removed.next();

        if next == idx {
            self.cursors = None;
            log::debug!("task removed from slot {}, ring empty", idx);
            return;
        }

        if let Some(pred) = self.slot_mut(prev) {
            pred.set_next(next);
        }
        let current = if cursors.current == idx {
            prev
        } else {
            cursors.current
        };
        let last = if cursors.last == idx {
            next
        } else {
            cursors.last
        };
        self.cursors = Some(Cursors { current, last });
        log::debug!("task removed from slot {}", idx);
    }

    /// Change the period of the task registered with `callback` and re-arm it from now.
    /// Returns false if there is none. Ring position is unchanged.
    pub fn set_period(&mut self, callback: TaskFn<C, N, P>, period_us: u64) -> bool {
        let Some(idx) = self.find(callback) else {
            return false;
        };
        let now = self.clock.now_us();
        if let Some(task) = self.slot_mut(idx) {
            task.set_period(period_us, now);
        }
        log::debug!("slot {} period set to {}us", idx, period_us);
        true
    }

    /// Run the current task if it is due, then move `current` according to `P`.
    pub fn step(&mut self) -> Step {
        let Some(cursors) = self.cursors else {
            return Step::Empty;
        };
        let now = self.clock.now_us();

        let due = match self.slot_mut(cursors.current) {
            Some(task) if task.is_due(now) => Some(task.trigger(now)),
            _ => None,
        };
        let outcome = match due {
            Some(callback) => {
                log::trace!("running slot {}", cursors.current);
                callback(self);
                Step::Ran
            }
            None => Step::Idle,
        };

        // The callback may have rewired the ring and taken time.
        let now = match outcome {
            Step::Ran => self.clock.now_us(),
            _ => now,
        };
        if let Some(cursors) = self.cursors {
            let current = P::next_current(&mut self.slots, cursors.current, now);
            self.cursors = Some(Cursors {
                current,
                ..cursors
            });
        }
        outcome
    }
}

impl<C, const N: usize, P> fmt::Debug for Scheduler<C, N, P>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("clock", &self.clock)
            .field("len", &self.len)
            .field("cursors", &self.cursors)
            .finish_non_exhaustive()
    }
}

struct SlotIter<'a, C, const N: usize, P> {
    sched: &'a Scheduler<C, N, P>,
    head: Option<usize>,
    next: Option<usize>,
}

impl<C: Clock, const N: usize, P: Policy> Iterator for SlotIter<'_, C, N, P> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let idx = self.next?;
        self.next = self
            .sched
            .slot(idx)
            .map(Task::next)
            .filter(|&n| Some(n) != self.head);
        Some(idx)
    }
}
