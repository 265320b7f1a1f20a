//! Periodic task record stored in the scheduler ring.
//!
//! # Overview
//! - A task is keyed by its callback: two tasks are the same task iff their callbacks have the
//!   same function address.
//! - `due_at` is always `last trigger + period`. A zero period pins `due_at` to `0`, so the task is
//!   eligible on every step it is current.
//! - The overdue flag is only touched by [`LoopPrevention`](crate::LoopPrevention); it is set when
//!   a due task is seen but not picked, and cleared when the task runs.
//!
//! # Notes
//! - `next` is a slot index into the owning scheduler, not a pointer. The record never follows it.
//! - `S` is the context the callback receives (the owning scheduler).

use core::fmt;

/// One periodic entry of the ring.
pub struct Task<S> {
    callback: fn(&mut S),
    next: usize,
    period: u64,
    due_at: u64,
    overdue: bool,
}

impl<S> Task<S> {
    pub(crate) fn new(callback: fn(&mut S), next: usize, period: u64, now: u64) -> Self {
        let mut task = Self {
            callback,
            next,
            period: 0,
            due_at: 0,
            overdue: false,
        };
        task.set_period(period, now);
        task
    }

    #[inline]
    pub fn callback(&self) -> fn(&mut S) {
        self.callback
    }

    /// Slot index of the successor in the ring.
    #[inline]
    pub fn next(&self) -> usize {
        self.next
    }

    #[inline]
    pub(crate) fn set_next(&mut self, next: usize) {
        self.next = next;
    }

    /// Microseconds between two runs.
    #[inline]
    pub fn period(&self) -> u64 {
        self.period
    }

    /// Clock value at or after which the task may run.
    #[inline]
    pub fn due_at(&self) -> u64 {
        self.due_at
    }

    #[inline]
    pub fn is_overdue(&self) -> bool {
        self.overdue
    }

    #[inline]
    pub(crate) fn mark_overdue(&mut self) {
        self.overdue = true;
    }

    /// Change the period and re-arm from `now`. A zero period makes the task due immediately.
    pub(crate) fn set_period(&mut self, period: u64, now: u64) {
        self.period = period;
        self.due_at = if period == 0 {
            0
        } else {
            now.saturating_add(period)
        };
    }

    #[inline]
    pub fn is_due(&self, now: u64) -> bool {
        self.due_at <= now
    }

    /// Re-arm for the next period and hand back the callback to invoke.
    ///
    /// The due time is settled before the callback runs, so a callback that removes or
    /// re-periods its own task sees consistent bookkeeping.
    #[inline]
    pub(crate) fn trigger(&mut self, now: u64) -> fn(&mut S) {
        self.due_at = now.saturating_add(self.period);
        self.overdue = false;
        self.callback
    }

    #[inline]
    pub fn matches(&self, callback: fn(&mut S)) -> bool {
        core::ptr::fn_addr_eq(self.callback, callback)
    }
}

impl<S> Clone for Task<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Task<S> {}

impl<S> fmt::Debug for Task<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("callback", &(self.callback as *const ()))
            .field("next", &self.next)
            .field("period", &self.period)
            .field("due_at", &self.due_at)
            .field("overdue", &self.overdue)
            .finish()
    }
}
