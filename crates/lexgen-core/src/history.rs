//! History store for uniqueness checks
//!
//! An insertion-ordered set of normalized headwords, bounded by a capacity.
//! Every operation is a single critical section, so callers outside the
//! single-flight guard may interleave freely.
//!
//! When an insert pushes the size past the capacity the default policy
//! clears the whole store. A word generated before the clear may therefore
//! be generated again afterwards; that repeat is accepted behavior.

use crate::types::normalize_word;
use indexmap::IndexSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Default capacity of the store
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// What happens when an insert exceeds the capacity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Drop every entry
    #[default]
    Clear,
    /// Drop the single oldest entry
    EvictOldest,
}

/// Outcome of a `record` / `try_commit` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Word inserted, no overflow
    Inserted,
    /// Word inserted and the overflow policy ran
    InsertedWithOverflow,
    /// Word already present, nothing changed
    AlreadyPresent,
    /// Word normalized to nothing, nothing changed
    Empty,
}

impl RecordOutcome {
    /// Whether the word was inserted
    #[inline]
    #[must_use]
    pub fn inserted(&self) -> bool {
        matches!(self, Self::Inserted | Self::InsertedWithOverflow)
    }
}

/// Store counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStats {
    /// Current entry count
    pub len: usize,
    /// Successful inserts since creation
    pub recorded_total: u64,
    /// Times the overflow policy ran
    pub overflows: u64,
}

#[derive(Debug, Default)]
struct Inner {
    words: IndexSet<String>,
    recorded_total: u64,
    overflows: u64,
}

/// Bounded, process-lifetime record of produced headwords
#[derive(Debug)]
pub struct HistoryStore {
    capacity: usize,
    policy: OverflowPolicy,
    inner: Mutex<Inner>,
}

impl HistoryStore {
    /// Create store with capacity and the default clear policy
    #[inline]
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, OverflowPolicy::default())
    }

    /// Create store with an explicit overflow policy
    #[inline]
    #[must_use]
    pub fn with_policy(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            capacity: capacity.max(1),
            policy,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Membership test on the normalized form
    #[must_use]
    pub fn contains(&self, item: &str) -> bool {
        let word = normalize_word(item);
        self.inner.lock().words.contains(&word)
    }

    /// Insert if absent, applying the overflow policy
    pub fn record(&self, item: &str) -> RecordOutcome {
        let word = normalize_word(item);
        if word.is_empty() {
            return RecordOutcome::Empty;
        }

        let mut inner = self.inner.lock();
        if !inner.words.insert(word) {
            return RecordOutcome::AlreadyPresent;
        }
        inner.recorded_total += 1;

        if inner.words.len() > self.capacity {
            inner.overflows += 1;
            match self.policy {
                OverflowPolicy::Clear => inner.words.clear(),
                OverflowPolicy::EvictOldest => {
                    inner.words.shift_remove_index(0);
                }
            }
            tracing::debug!(policy = ?self.policy, capacity = self.capacity, "history overflow");
            return RecordOutcome::InsertedWithOverflow;
        }

        RecordOutcome::Inserted
    }

    /// Dedupe gate and commit in one step
    ///
    /// Returns `true` if the word was new and is now recorded.
    #[inline]
    pub fn try_commit(&self, item: &str) -> bool {
        self.record(item).inserted()
    }

    /// Entries in insertion order
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().words.iter().cloned().collect()
    }

    /// Most recent `n` entries, oldest first
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<String> {
        let inner = self.inner.lock();
        let skip = inner.words.len().saturating_sub(n);
        inner.words.iter().skip(skip).cloned().collect()
    }

    /// Current entry count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().words.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configured overflow policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Counters snapshot
    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        let inner = self.inner.lock();
        HistoryStats {
            len: inner.words.len(),
            recorded_total: inner.recorded_total,
            overflows: inner.overflows,
        }
    }
}

impl Default for HistoryStore {
    /// Store with the default capacity (50 entries)
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
