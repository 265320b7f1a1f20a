//! Monotonic microsecond clock sources.
//!
//! The scheduler never reads hardware directly; it asks a [`Clock`] once per operation that
//! needs the time. Targets either wrap their HAL timer with [`from_fn`] or bump an
//! [`AtomicClock`] from a timer interrupt.

#[cfg(all(not(feature = "portable-atomic"), target_has_atomic = "64"))]
use core::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "portable-atomic")]
use portable_atomic::{AtomicU64, Ordering};

/// Monotonic microsecond time source.
pub trait Clock {
    fn now_us(&self) -> u64;
}

impl<T: Clock + ?Sized> Clock for &T {
    #[inline]
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Clock backed by a function or closure, e.g. a HAL `micros()`.
#[derive(Copy, Clone, Debug)]
pub struct FnClock<F>(F);

/// Wrap `f` as a [`Clock`].
#[inline]
pub const fn from_fn<F: Fn() -> u64>(f: F) -> FnClock<F> {
    FnClock(f)
}

impl<F: Fn() -> u64> Clock for FnClock<F> {
    #[inline]
    fn now_us(&self) -> u64 {
        (self.0)()
    }
}

/// Microsecond counter shared between a timer interrupt and the main loop.
///
/// The interrupt calls [`advance`](Self::advance); the scheduler reads it through `&AtomicClock`.
/// Targets without native 64-bit atomics need the `portable-atomic` feature.
#[cfg(any(feature = "portable-atomic", target_has_atomic = "64"))]
#[derive(Debug, Default)]
pub struct AtomicClock {
    now: AtomicU64,
}

#[cfg(any(feature = "portable-atomic", target_has_atomic = "64"))]
impl AtomicClock {
    pub const fn new() -> Self {
        Self {
            now: AtomicU64::new(0),
        }
    }

    /// Add `us` microseconds. Wraps on overflow.
    #[inline]
    pub fn advance(&self, us: u64) {
        self.now.fetch_add(us, Ordering::Relaxed);
    }

    #[inline]
    pub fn set(&self, us: u64) {
        self.now.store(us, Ordering::Relaxed);
    }
}

#[cfg(any(feature = "portable-atomic", target_has_atomic = "64"))]
impl Clock for AtomicClock {
    #[inline]
    fn now_us(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, from_fn};
    use core::cell::Cell;

    #[test]
    fn fn_clock_reads_through() {
        let t = Cell::new(5u64);
        let clock = from_fn(|| t.get());
        assert_eq!(clock.now_us(), 5);
        t.set(17);
        assert_eq!(clock.now_us(), 17);
        assert_eq!((&clock).now_us(), 17);
    }

    #[cfg(any(feature = "portable-atomic", target_has_atomic = "64"))]
    #[test]
    fn atomic_clock_advances() {
        static NOW: super::AtomicClock = super::AtomicClock::new();
        assert_eq!(NOW.now_us(), 0);
        NOW.advance(250);
        NOW.advance(250);
        assert_eq!(NOW.now_us(), 500);
        NOW.set(10);
        assert_eq!((&NOW).now_us(), 10);
    }
}
