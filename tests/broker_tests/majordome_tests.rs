//! Tests for the idle-database reaper
//!
//! These tests verify:
//! - reap_idle unmounts only databases idle since the cutoff
//! - Never-accessed databases are spared
//! - Reaped databases mount again on the next command
//! - The background thread reaps and cancels cleanly

use std::thread;
use std::time::{Duration, Instant};

use elevator::database::{now_millis, MountStatus};
use elevator::engine::EngineOptions;
use elevator::majordome::{reap_idle, Majordome};
use tempfile::TempDir;

use super::setup_store;

// =============================================================================
// reap_idle Tests
// =============================================================================

#[test]
fn test_reap_idle_selects_only_idle_databases() {
    let temp = TempDir::new().unwrap();
    let store = setup_store(&temp);
    let hot = store.add("hot", EngineOptions::default()).unwrap();
    store.add("never", EngineOptions::default()).unwrap();
    let default = store.uid_of("default").unwrap();

    store.touch(&default);
    thread::sleep(Duration::from_millis(5));
    let cutoff = now_millis();
    thread::sleep(Duration::from_millis(5));
    store.touch(&hot);

    assert_eq!(reap_idle(&store, cutoff), vec!["default".to_string()]);
    assert_eq!(store.status("default").unwrap(), MountStatus::Unmounted);
    assert_eq!(store.status("hot").unwrap(), MountStatus::Mounted);
    assert_eq!(store.status("never").unwrap(), MountStatus::Mounted);

    // Nothing left to reap at the same cutoff
    assert!(reap_idle(&store, cutoff).is_empty());
}

#[test]
fn test_reaped_database_mounts_on_next_use() {
    let temp = TempDir::new().unwrap();
    let store = setup_store(&temp);
    let uid = store.uid_of("default").unwrap();
    let db = store.get(&uid).unwrap();
    store.acquire(&db).unwrap().put(b"k", b"v").unwrap();
    store.touch(&uid);

    assert_eq!(reap_idle(&store, now_millis() + 1), vec!["default".to_string()]);

    assert_eq!(store.acquire(&db).unwrap().get(b"k").unwrap(), Some(b"v".to_vec()));
    assert_eq!(db.status(), MountStatus::Mounted);
}

// =============================================================================
// Background Thread Tests
// =============================================================================

#[test]
fn test_majordome_reaps_on_tick() {
    let temp = TempDir::new().unwrap();
    let store = setup_store(&temp);
    let uid = store.uid_of("default").unwrap();
    store.add("never", EngineOptions::default()).unwrap();

    let majordome = Majordome::start(store.clone(), Duration::from_millis(50)).unwrap();
    store.touch(&uid);

    let deadline = Instant::now() + Duration::from_secs(5);
    while store.status("default").unwrap() == MountStatus::Mounted && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    majordome.cancel();

    assert_eq!(store.status("default").unwrap(), MountStatus::Unmounted);
    assert_eq!(store.status("never").unwrap(), MountStatus::Mounted);
}

#[test]
fn test_majordome_cancel_returns_promptly() {
    let temp = TempDir::new().unwrap();
    let store = setup_store(&temp);

    let majordome = Majordome::start(store, Duration::from_secs(3600)).unwrap();
    let started = Instant::now();
    majordome.cancel();
    assert!(started.elapsed() < Duration::from_secs(5));
}
