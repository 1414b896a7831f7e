//! Single-flight guard
//!
//! A process-wide binary flag. Callers that find it held are rejected
//! immediately instead of queued. The permit releases the flag on drop, so
//! every exit path of the guarded run (return, `?`, panic, cancellation of
//! the owning future) releases exactly once.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Guard counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleFlightStats {
    /// Successful acquisitions
    pub acquired: u64,
    /// Releases performed
    pub released: u64,
    /// Acquisitions refused because the flag was held
    pub rejected: u64,
}

/// At-most-one-in-flight guard
#[derive(Debug, Default)]
pub struct SingleFlight {
    held: AtomicBool,
    acquired: AtomicU64,
    released: AtomicU64,
    rejected: AtomicU64,
}

impl SingleFlight {
    /// Create released guard
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire if free
    ///
    /// Returns `None` when another invocation holds the guard.
    #[must_use = "the guard is released as soon as the permit is dropped"]
    pub fn try_acquire(&self) -> Option<SingleFlightPermit<'_>> {
        if self
            .held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.acquired.fetch_add(1, Ordering::Relaxed);
            Some(SingleFlightPermit { guard: self })
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Whether a run currently holds the guard
    #[inline]
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Counters snapshot
    #[must_use]
    pub fn stats(&self) -> SingleFlightStats {
        SingleFlightStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
        self.held.store(false, Ordering::Release);
    }
}

/// Held guard; releases on drop
#[derive(Debug)]
pub struct SingleFlightPermit<'a> {
    guard: &'a SingleFlight,
}

impl Drop for SingleFlightPermit<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected() {
        let guard = SingleFlight::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_held());
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_held());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn release_counted_once_per_permit() {
        let guard = SingleFlight::new();
        for _ in 0..3 {
            let _permit = guard.try_acquire().unwrap();
            assert!(guard.try_acquire().is_none());
        }
        let stats = guard.stats();
        assert_eq!(stats.acquired, 3);
        assert_eq!(stats.released, 3);
        assert_eq!(stats.rejected, 3);
    }

    #[test]
    fn released_on_panic() {
        let guard = SingleFlight::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = guard.try_acquire().unwrap();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!guard.is_held());
        assert_eq!(guard.stats().released, 1);
    }
}
