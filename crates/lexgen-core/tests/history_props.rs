use lexgen_core::{HistoryStore, OverflowPolicy, RecordOutcome};
use proptest::prelude::*;

fn words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e]{1,3}", 0..200)
}

#[test]
fn overflow_clear_empties_store() {
    let store = HistoryStore::new(3);
    for word in ["one", "two", "three"] {
        assert_eq!(store.record(word), RecordOutcome::Inserted);
    }
    assert_eq!(store.record("four"), RecordOutcome::InsertedWithOverflow);
    assert!(store.is_empty());
    assert!(!store.contains("one"));
}

#[test]
fn overflow_evict_keeps_newest() {
    let store = HistoryStore::with_policy(3, OverflowPolicy::EvictOldest);
    for word in ["one", "two", "three", "four"] {
        store.record(word);
    }
    assert_eq!(store.snapshot(), vec!["two", "three", "four"]);
}

proptest! {
    #[test]
    fn prop_len_never_exceeds_capacity(
        capacity in 1usize..20,
        evict in any::<bool>(),
        items in words(),
    ) {
        let policy = if evict { OverflowPolicy::EvictOldest } else { OverflowPolicy::Clear };
        let store = HistoryStore::with_policy(capacity, policy);
        for item in &items {
            store.record(item);
            prop_assert!(store.len() <= capacity);
        }
    }

    #[test]
    fn prop_entries_are_unique(capacity in 1usize..20, items in words()) {
        let store = HistoryStore::with_policy(capacity, OverflowPolicy::EvictOldest);
        for item in &items {
            store.record(item);
        }
        let snapshot = store.snapshot();
        let mut deduped = snapshot.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), snapshot.len());
    }

    #[test]
    fn prop_commit_succeeds_only_when_absent(items in words()) {
        let store = HistoryStore::new(1_000);
        for item in &items {
            let present = store.contains(item);
            prop_assert_eq!(store.try_commit(item), !present);
            prop_assert!(store.contains(item));
        }
    }

    #[test]
    fn prop_recent_is_suffix_of_snapshot(n in 0usize..60, items in words()) {
        let store = HistoryStore::new(50);
        for item in &items {
            store.record(item);
        }
        let snapshot = store.snapshot();
        let recent = store.recent(n);
        prop_assert!(recent.len() <= n);
        prop_assert!(snapshot.ends_with(&recent));
    }
}
