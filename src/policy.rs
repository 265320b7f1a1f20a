//! Cursor policies applied at the end of every [`Scheduler::step`](crate::Scheduler::step).
//!
//! Both policies see the same ring. They only decide which slot becomes `current` once the
//! execution phase of the step is over.

use crate::task::Task;

mod private {
    pub trait Sealed {}
}

/// Decides where the `current` cursor goes after a step.
pub trait Policy: private::Sealed {
    /// Return the slot that becomes `current`. `current` is always an occupied slot.
    fn next_current<S>(slots: &mut [Option<Task<S>>], current: usize, now: u64) -> usize;
}

#[inline]
fn successor<S>(slots: &[Option<Task<S>>], idx: usize) -> usize {
    slots
        .get(idx)
        .and_then(Option::as_ref)
        .map_or(idx, Task::next)
}

/// Strict round-robin: the cursor moves one slot per step.
#[derive(Copy, Clone, Debug, Default)]
pub struct RoundRobin;

impl private::Sealed for RoundRobin {}

impl Policy for RoundRobin {
    #[inline]
    fn next_current<S>(slots: &mut [Option<Task<S>>], current: usize, _now: u64) -> usize {
        successor(slots, current)
    }
}

/// Round-robin with starvation avoidance.
///
/// Every step walks the whole ring once from `current`. A due task seen for the first time is
/// flagged; a due task that is already flagged competes on `due_at`, and the oldest one becomes
/// `current` so the next step runs it. With no flagged candidate the cursor moves one slot.
#[derive(Copy, Clone, Debug, Default)]
pub struct LoopPrevention;

impl private::Sealed for LoopPrevention {}

impl Policy for LoopPrevention {
    fn next_current<S>(slots: &mut [Option<Task<S>>], current: usize, now: u64) -> usize {
        let Some(start) = slots.get(current).and_then(Option::as_ref) else {
            return current;
        };

        let mut longest = current;
        let mut longest_due = start.due_at();
        let mut cursor = current;
        loop {
            let Some(task) = slots.get_mut(cursor).and_then(Option::as_mut) else {
                break;
            };
            if task.is_due(now) {
                if task.is_overdue() {
                    if task.due_at() < longest_due {
                        longest = cursor;
                        longest_due = task.due_at();
                    }
                } else {
                    task.mark_overdue();
                }
            }
            cursor = task.next();
            if cursor == current {
                break;
            }
        }

        if longest != current {
            log::trace!("loop prevention moves cursor {} -> {}", current, longest);
            longest
        } else {
            successor(slots, current)
        }
    }
}
