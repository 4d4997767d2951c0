//! Durable per-user record of explicit like/unlike decisions.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

use super::storage::KeyValueStore;

/// Storage key the whole record lives under.
const LIKED_KEY: &str = "liked_posts";

/// username -> (post id -> explicit liked flag).
///
/// Absence of a username or post id means "unknown", never "false" - an
/// explicit entry always records a decision the user actually made.
type LikedRecord = HashMap<String, HashMap<u64, bool>>;

/// Tie-breaker source of truth for the liked *boolean* (never for counts).
///
/// The record is loaded from storage once and kept as the working copy for
/// the session; every change is written through. A storage failure degrades
/// to in-memory-only behavior for the process lifetime - liked status is a
/// UX affordance, not a correctness-critical record, so failures are
/// swallowed and logged, never propagated.
pub struct LikedStore<S: KeyValueStore> {
  store: S,
  record: Mutex<Option<LikedRecord>>,
}

impl<S: KeyValueStore> LikedStore<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      record: Mutex::new(None),
    }
  }

  /// All explicit decisions recorded for `username`.
  #[allow(dead_code)]
  pub fn for_user(&self, username: &str) -> HashMap<u64, bool> {
    self.with_record(|record| record.get(username).cloned().unwrap_or_default())
  }

  /// The explicit decision for one post, if the user ever made one.
  pub fn get(&self, username: &str, post_id: u64) -> Option<bool> {
    self.with_record(|record| record.get(username).and_then(|posts| posts.get(&post_id).copied()))
  }

  /// Record an explicit like/unlike decision.
  pub fn set(&self, username: &str, post_id: u64, liked: bool) {
    self.with_record(|record| {
      record
        .entry(username.to_string())
        .or_default()
        .insert(post_id, liked);
      self.persist(record);
    });
  }

  /// Put back a captured pre-toggle value.
  ///
  /// `None` removes the entry entirely, so a rollback on a post the user had
  /// never decided on leaves the flag unknown rather than explicitly false.
  pub fn restore(&self, username: &str, post_id: u64, prior: Option<bool>) {
    self.with_record(|record| {
      match prior {
        Some(liked) => {
          record
            .entry(username.to_string())
            .or_default()
            .insert(post_id, liked);
        }
        None => {
          if let Some(posts) = record.get_mut(username) {
            posts.remove(&post_id);
            if posts.is_empty() {
              record.remove(username);
            }
          }
        }
      }
      self.persist(record);
    });
  }

  fn with_record<T>(&self, f: impl FnOnce(&mut LikedRecord) -> T) -> T {
    let mut guard = match self.record.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    let record = guard.get_or_insert_with(|| self.load());
    f(record)
  }

  fn load(&self) -> LikedRecord {
    match self.store.read(LIKED_KEY) {
      Ok(Some(blob)) => match serde_json::from_str(&blob) {
        Ok(record) => record,
        Err(e) => {
          warn!("Discarding unparsable liked-status record: {}", e);
          LikedRecord::default()
        }
      },
      Ok(None) => LikedRecord::default(),
      Err(e) => {
        warn!("Liked-status storage unavailable, starting empty: {}", e);
        LikedRecord::default()
      }
    }
  }

  fn persist(&self, record: &LikedRecord) {
    let blob = match serde_json::to_string(record) {
      Ok(blob) => blob,
      Err(e) => {
        warn!("Failed to serialize liked-status record: {}", e);
        return;
      }
    };

    if let Err(e) = self.store.write(LIKED_KEY, &blob) {
      warn!("Failed to persist liked status, keeping in memory: {}", e);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::MemoryStore;
  use color_eyre::{eyre::eyre, Result};
  use std::sync::Arc;

  struct FailingStore;

  impl KeyValueStore for FailingStore {
    fn read(&self, _key: &str) -> Result<Option<String>> {
      Err(eyre!("storage disabled"))
    }

    fn write(&self, _key: &str, _value: &str) -> Result<()> {
      Err(eyre!("storage disabled"))
    }
  }

  #[test]
  fn test_unknown_is_distinct_from_false() {
    let store = LikedStore::new(MemoryStore::new());

    assert_eq!(store.get("alice", 7), None);

    store.set("alice", 7, false);
    assert_eq!(store.get("alice", 7), Some(false));
  }

  #[test]
  fn test_partitioned_by_username() {
    let store = LikedStore::new(MemoryStore::new());

    store.set("alice", 7, true);

    assert_eq!(store.get("alice", 7), Some(true));
    assert_eq!(store.get("bob", 7), None);
    assert!(store.for_user("bob").is_empty());
  }

  #[test]
  fn test_set_merges_at_username_level() {
    let store = LikedStore::new(MemoryStore::new());

    store.set("alice", 7, true);
    store.set("alice", 9, false);
    store.set("bob", 7, true);

    let alice = store.for_user("alice");
    assert_eq!(alice.len(), 2);
    assert_eq!(alice.get(&7), Some(&true));
    assert_eq!(alice.get(&9), Some(&false));
    assert_eq!(store.for_user("bob").len(), 1);
  }

  #[test]
  fn test_survives_reload_from_same_storage() {
    let backing = Arc::new(MemoryStore::new());

    let store = LikedStore::new(Arc::clone(&backing));
    store.set("alice", 7, true);

    // A fresh instance over the same storage sees the persisted record
    let reloaded = LikedStore::new(backing);
    assert_eq!(reloaded.get("alice", 7), Some(true));
  }

  #[test]
  fn test_corrupt_record_treated_as_empty() {
    let backing = Arc::new(MemoryStore::new());
    backing.write(LIKED_KEY, "not json {{{").unwrap();

    let store = LikedStore::new(Arc::clone(&backing));
    assert_eq!(store.get("alice", 7), None);

    // The store stays usable and the next write replaces the corrupt blob
    store.set("alice", 7, true);
    assert_eq!(store.get("alice", 7), Some(true));

    let reloaded = LikedStore::new(backing);
    assert_eq!(reloaded.get("alice", 7), Some(true));
  }

  #[test]
  fn test_storage_failure_degrades_to_memory() {
    let store = LikedStore::new(FailingStore);

    store.set("alice", 7, true);
    assert_eq!(store.get("alice", 7), Some(true));

    store.set("alice", 7, false);
    assert_eq!(store.get("alice", 7), Some(false));
  }

  #[test]
  fn test_restore_none_returns_entry_to_unknown() {
    let store = LikedStore::new(MemoryStore::new());

    store.set("alice", 7, true);
    store.restore("alice", 7, None);
    assert_eq!(store.get("alice", 7), None);

    store.restore("alice", 9, Some(true));
    assert_eq!(store.get("alice", 9), Some(true));
  }
}
