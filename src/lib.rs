//! Cooperative periodic scheduler for single-threaded no-std targets.
//!
//! # Highlights
//! - Fixed-capacity ring of periodic callbacks; no allocation, no dynamic dispatch.
//! - One decision per [`Scheduler::step`]: run the current task if due, then move on.
//! - Optional starvation avoidance ([`LoopPrevention`]) selected as a type parameter.
//!
//! # Quick start
//! ```
//! use ph_scheduler::{AtomicClock, Scheduler, Step};
//!
//! static NOW: AtomicClock = AtomicClock::new();
//! type Sched = Scheduler<&'static AtomicClock, 4>;
//!
//! fn blink(_: &mut Sched) {}
//!
//! let mut sched = Sched::new(&NOW);
//! sched.add(blink, 500).unwrap();
//!
//! assert_eq!(sched.step(), Step::Idle);
//! NOW.advance(500);
//! assert_eq!(sched.step(), Step::Ran);
//! ```
//!
//! # No-std
//! The crate is `#![no_std]` by default. Tests require `std`.
//!
//! # Execution model
//! Everything runs in the caller's context. `step` returns only after the callback it started
//! returns, so a callback that loops forever stalls every other task. Callbacks receive the
//! scheduler and may mutate the ring, including removing themselves.
//!
//! # Semantics
//! - Times are microseconds from a [`Clock`]; a task is due when `due_at <= now`.
//! - `due_at` is re-armed to `now + period` before the callback runs.
//! - A zero period means "whenever current".
//! - A callback is keyed by its function address and may be registered once.
//! - `step` on an empty ring returns [`Step::Empty`].
#![no_std]

pub mod clock;
pub mod policy;
pub mod scheduler;
pub mod task;

#[cfg(any(feature = "portable-atomic", target_has_atomic = "64"))]
pub use clock::AtomicClock;
pub use clock::{Clock, FnClock, from_fn};
pub use policy::{LoopPrevention, Policy, RoundRobin};
pub use scheduler::{Error, Scheduler, Step, TaskFn};
pub use task::Task;

#[cfg(test)]
extern crate std;
