use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use tracing_test::traced_test;

use super::*;
use crate::config::StoreConfig;
use crate::config::TombstonePolicy;
use crate::ChangeBus;
use crate::Error;
use crate::Path;
use crate::StoreError;
use crate::UpdateKind;

fn store_with_policy(policy: TombstonePolicy) -> VersionedStore {
    let config = StoreConfig {
        tombstone_versions: policy,
        ..StoreConfig::default()
    };
    VersionedStore::new(config, ChangeBus::default())
}

fn versions_seen(
    bus: &ChangeBus,
    id: crate::SubscriptionId,
) -> Vec<(UpdateKind, u64)> {
    let mut drain = bus.drain(id).unwrap();
    let mut seen = Vec::new();
    while let Some(update) = drain.try_next() {
        seen.push((update.kind, update.version));
    }
    seen
}

#[test]
#[traced_test]
fn test_sequential_writes_produce_gapless_versions() {
    let store = VersionedStore::with_bus(ChangeBus::default());

    for expected in 1..=5u64 {
        let entry = store.write("/counter", json!(expected)).unwrap();
        assert_eq!(entry.version, expected);
    }
    assert_eq!(store.read("/counter").unwrap().version, 5);
}

#[test]
fn test_write_then_read_round_trip() {
    let store = VersionedStore::with_bus(ChangeBus::default());
    store.write("/a/b", json!({"v": 1})).unwrap();

    let before = store.read("/a/b").unwrap().version;
    store.write("a/b", json!({"v": 2})).unwrap();
    let entry = store.read("/a/b").unwrap();

    assert_eq!(entry.value, json!({"v": 2}));
    assert_eq!(entry.version, before + 1);
}

#[test]
fn test_read_absent_path_is_not_found() {
    let store = VersionedStore::with_bus(ChangeBus::default());

    let err = store.read("/missing").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_invalid_path_has_no_side_effect() {
    let bus = ChangeBus::default();
    let id = bus.subscribe(["**"]).unwrap();
    let store = VersionedStore::with_bus(bus.clone());

    for raw in ["", "/", "a//b", "a/", "a/../b", "a/*"] {
        let err = store.write(raw, json!(1)).unwrap_err();
        assert!(
            matches!(err, Error::Store(StoreError::InvalidPath { .. })),
            "{raw:?}"
        );
    }

    assert!(store.is_empty());
    assert_eq!(bus.pending(id).unwrap(), 0);
}

#[test]
fn test_path_limits_from_config() {
    let config = StoreConfig {
        max_path_depth: 2,
        max_segment_len: 4,
        ..StoreConfig::default()
    };
    let store = VersionedStore::new(config, ChangeBus::default());

    assert!(store.write("/a/b", json!(1)).is_ok());
    assert!(matches!(
        store.write("/a/b/c", json!(1)),
        Err(Error::Store(StoreError::InvalidPath { .. }))
    ));
    assert!(matches!(
        store.write("/abcde", json!(1)),
        Err(Error::Store(StoreError::InvalidPath { .. }))
    ));
}

#[test]
fn test_delete_returns_removed_entry_and_hides_path() {
    let store = VersionedStore::with_bus(ChangeBus::default());
    store.write("/k", json!(1)).unwrap();

    let removed = store.delete("/k").unwrap();
    assert_eq!(removed.value, json!(1));
    assert_eq!(removed.version, 1);

    assert!(store.read("/k").unwrap_err().is_not_found());
    assert!(store.delete("/k").unwrap_err().is_not_found());
    assert!(store.delete("/never").unwrap_err().is_not_found());
    assert!(store.is_empty());
}

#[test]
fn test_continue_policy_keeps_history_gapless() {
    let store = store_with_policy(TombstonePolicy::Continue);
    let id = store.bus().subscribe(["/k"]).unwrap();

    store.write("/k", json!("a")).unwrap();
    store.write("/k", json!("b")).unwrap();
    store.delete("/k").unwrap();
    assert_eq!(store.version_of("/k").unwrap(), Some(3));

    let recreated = store.write("/k", json!("c")).unwrap();
    assert_eq!(recreated.version, 4);

    assert_eq!(
        versions_seen(store.bus(), id),
        vec![
            (UpdateKind::Put, 1),
            (UpdateKind::Put, 2),
            (UpdateKind::Delete, 3),
            (UpdateKind::Put, 4),
        ]
    );
}

#[test]
fn test_reset_policy_restarts_versions_after_delete() {
    let store = store_with_policy(TombstonePolicy::Reset);
    let id = store.bus().subscribe(["/k"]).unwrap();

    store.write("/k", json!(1)).unwrap();
    store.write("/k", json!(2)).unwrap();
    store.delete("/k").unwrap();

    let recreated = store.write("/k", json!(3)).unwrap();
    assert_eq!(recreated.version, 1);
    assert_eq!(store.write("/k", json!(4)).unwrap().version, 2);

    assert_eq!(
        versions_seen(store.bus(), id),
        vec![
            (UpdateKind::Put, 1),
            (UpdateKind::Put, 2),
            (UpdateKind::Delete, 3),
            (UpdateKind::Put, 1),
            (UpdateKind::Put, 2),
        ]
    );
}

#[test]
fn test_tombstone_update_carries_no_value() {
    let store = VersionedStore::with_bus(ChangeBus::default());
    let id = store.bus().subscribe(["k"]).unwrap();
    store.write("k", json!(1)).unwrap();
    store.delete("k").unwrap();

    let mut drain = store.bus().drain(id).unwrap();
    let put = drain.try_next().unwrap();
    assert_eq!(put.entry().unwrap().value, json!(1));

    let tombstone = drain.try_next().unwrap();
    assert!(tombstone.is_tombstone());
    assert_eq!(tombstone.value, None);
    assert_eq!(tombstone.entry(), None);
    assert_eq!(tombstone.path, Path::parse("/k").unwrap());
}

#[test]
fn test_compare_and_write() {
    let store = VersionedStore::with_bus(ChangeBus::default());
    let id = store.bus().subscribe(["/lock"]).unwrap();

    // create-only
    assert_eq!(store.compare_and_write("/lock", None, json!("owner-a")).unwrap().version, 1);
    let err = store.compare_and_write("/lock", None, json!("owner-b")).unwrap_err();
    assert!(matches!(
        err,
        Error::Store(StoreError::VersionConflict {
            expected: None,
            actual: Some(1),
            ..
        })
    ));

    // stale version
    assert!(store.compare_and_write("/lock", Some(7), json!("owner-b")).is_err());
    assert_eq!(store.read("/lock").unwrap().value, json!("owner-a"));

    assert_eq!(store.compare_and_write("/lock", Some(1), json!("owner-b")).unwrap().version, 2);

    // rejected attempts published nothing
    assert_eq!(store.bus().pending(id).unwrap(), 2);
}

#[test]
fn test_compare_and_write_after_delete_expects_absence() {
    let store = VersionedStore::with_bus(ChangeBus::default());
    store.write("/k", json!(1)).unwrap();
    store.delete("/k").unwrap();

    assert!(store.compare_and_write("/k", Some(1), json!(2)).is_err());
    assert_eq!(store.compare_and_write("/k", None, json!(2)).unwrap().version, 3);
}

#[test]
fn test_read_pointer() {
    let store = VersionedStore::with_bus(ChangeBus::default());
    store
        .write("/users/42", json!({"name": "a", "tags": ["x", "y"]}))
        .unwrap();

    let name = store.read_pointer("/users/42", "/name").unwrap();
    assert_eq!(name.value, json!("a"));
    assert_eq!(name.version, 1);

    assert_eq!(store.read_pointer("/users/42", "/tags/1").unwrap().value, json!("y"));
    assert_eq!(
        store.read_pointer("/users/42", "").unwrap().value,
        json!({"name": "a", "tags": ["x", "y"]})
    );

    assert!(store.read_pointer("/users/42", "/missing").unwrap_err().is_not_found());
    assert!(matches!(
        store.read_pointer("/users/42", "name"),
        Err(Error::Store(StoreError::InvalidPointer(_)))
    ));
}

#[test]
fn test_len_counts_live_paths_only() {
    let store = VersionedStore::with_bus(ChangeBus::default());
    store.write("/a", json!(1)).unwrap();
    store.write("/a", json!(2)).unwrap();
    store.write("/b", json!(1)).unwrap();
    assert_eq!(store.len(), 2);

    store.delete("/a").unwrap();
    assert_eq!(store.len(), 1);

    store.write("/a", json!(3)).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.version_of("/never").unwrap(), None);
}

#[test]
fn test_writer_on_other_path_is_not_blocked_by_held_slot() {
    let store = Arc::new(VersionedStore::with_bus(ChangeBus::default()));
    store.write("/busy", json!(0)).unwrap();

    let busy = store.slots.get(&Path::parse("/busy").unwrap()).unwrap().value().clone();
    let guard = busy.state.write();

    let (tx, rx) = mpsc::channel();
    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            let entry = store.write("/free", json!(1)).unwrap();
            tx.send(entry.version).unwrap();
        })
    };

    let version = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("write to an unrelated path must not wait for /busy");
    assert_eq!(version, 1);

    drop(guard);
    writer.join().unwrap();
}

#[test]
fn test_writer_on_same_path_waits_for_held_slot() {
    let store = Arc::new(VersionedStore::with_bus(ChangeBus::default()));
    store.write("/busy", json!(0)).unwrap();

    let busy = store.slots.get(&Path::parse("/busy").unwrap()).unwrap().value().clone();
    let guard = busy.state.write();

    let (tx, rx) = mpsc::channel();
    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            let entry = store.write("/busy", json!(1)).unwrap();
            tx.send(entry.version).unwrap();
        })
    };

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    drop(guard);

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 2);
    writer.join().unwrap();
}

#[test]
fn test_concurrent_same_path_writers_publish_in_version_order() {
    const WRITERS: u64 = 8;
    const WRITES_PER_WRITER: u64 = 200;

    let store = Arc::new(VersionedStore::with_bus(ChangeBus::default()));
    let id = store.bus().subscribe(["/hot"]).unwrap();

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..WRITES_PER_WRITER {
                    store.write("/hot", json!([w, i])).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let versions: Vec<u64> = versions_seen(store.bus(), id).into_iter().map(|(_, v)| v).collect();
    let expected: Vec<u64> = (1..=WRITERS * WRITES_PER_WRITER).collect();
    assert_eq!(versions, expected);
}
