//! In-process post cache with TTL expiry and liked-status reconciliation.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::forum::types::Post;

use super::likes::LikedStore;
use super::storage::KeyValueStore;

/// A post snapshot plus its capture timestamp.
struct CacheEntry {
  post: Post,
  fetched_at: DateTime<Utc>,
}

/// Single authoritative in-process store of recently-fetched posts.
///
/// Entries are valid for a fixed TTL after capture and evicted lazily on the
/// next access that touches them - there is no background sweeper. Reads
/// re-merge the viewer's explicit liked decisions from the [`LikedStore`],
/// which is what lets a like made through one surface show up in another
/// without a re-fetch. Callers always receive copies; entries are never
/// exposed by reference.
///
/// All operations are total. A missing or expired entry is a defined absent
/// result, never an error - cache misses are normal steady state.
pub struct PostCache<S: KeyValueStore> {
  entries: Mutex<HashMap<u64, CacheEntry>>,
  liked: Arc<LikedStore<S>>,
  ttl: Duration,
}

impl<S: KeyValueStore> PostCache<S> {
  pub fn new(liked: Arc<LikedStore<S>>) -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      liked,
      ttl: Duration::minutes(5),
    }
  }

  /// Override how long cached posts stay valid.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  fn is_expired(&self, fetched_at: DateTime<Utc>) -> bool {
    Utc::now() - fetched_at >= self.ttl
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<u64, CacheEntry>> {
    match self.entries.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }

  /// Look up a post for the given viewer.
  ///
  /// An expired entry is deleted as a side effect and reported absent. On a
  /// valid hit the viewer's explicit liked decision, when it differs from the
  /// cached flag, overrides it and the entry is corrected in place; the like
  /// count is left untouched since the authoritative count belongs to the
  /// server.
  pub fn get(&self, post_id: u64, username: &str) -> Option<Post> {
    let mut entries = self.entries();

    let entry = match entries.get_mut(&post_id) {
      Some(entry) => entry,
      None => {
        debug!("Cache miss for post {}", post_id);
        return None;
      }
    };

    if self.is_expired(entry.fetched_at) {
      debug!("Evicting expired post {}", post_id);
      entries.remove(&post_id);
      return None;
    }

    if let Some(flag) = self.liked.get(username, post_id) {
      if flag != entry.post.liked {
        entry.post.liked = flag;
      }
    }

    Some(entry.post.clone())
  }

  /// Store a post snapshot for the given viewer.
  ///
  /// An explicit liked decision in the store overrides the incoming flag:
  /// the store holds the most-current viewer intent, while the server
  /// snapshot is trusted for the count only.
  pub fn put(&self, mut post: Post, username: &str) {
    if let Some(flag) = self.liked.get(username, post.id) {
      post.liked = flag;
    }

    self.entries().insert(
      post.id,
      CacheEntry {
        post,
        fetched_at: Utc::now(),
      },
    );
  }

  /// Store a batch of posts, typically a fetched feed page.
  pub fn put_many(&self, posts: Vec<Post>, username: &str) {
    for post in posts {
      self.put(post, username);
    }
  }

  /// Update the liked flag (and count, if given) of a cached post.
  ///
  /// Refreshes the capture timestamp. Returns false when the post is not
  /// cached - an expected no-op, since the entry may simply not have been
  /// fetched yet.
  pub fn update_like_status(&self, post_id: u64, liked: bool, likes: Option<u32>) -> bool {
    let mut entries = self.entries();

    match entries.get_mut(&post_id) {
      Some(entry) => {
        entry.post.liked = liked;
        if let Some(likes) = likes {
          entry.post.likes = likes;
        }
        entry.fetched_at = Utc::now();
        true
      }
      None => {
        debug!("Like update for uncached post {}", post_id);
        false
      }
    }
  }

  /// Drop a single post, e.g. when it was deleted upstream.
  #[allow(dead_code)]
  pub fn remove(&self, post_id: u64) {
    self.entries().remove(&post_id);
  }

  /// Drop everything, e.g. on a forced refresh.
  pub fn clear(&self) {
    self.entries().clear();
  }

  /// All currently valid posts, newest first.
  ///
  /// Expired entries are evicted while iterating; this is the only place
  /// bulk eviction happens, so cache size is bounded by read frequency
  /// rather than a background timer.
  pub fn all_valid(&self) -> Vec<Post> {
    let mut entries = self.entries();

    let before = entries.len();
    entries.retain(|_, entry| !self.is_expired(entry.fetched_at));
    let evicted = before - entries.len();
    if evicted > 0 {
      debug!("Evicted {} expired posts from cache", evicted);
    }

    let mut posts: Vec<Post> = entries.values().map(|entry| entry.post.clone()).collect();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    posts
  }

  /// Shift an entry's capture timestamp into the past.
  #[cfg(test)]
  pub fn backdate(&self, post_id: u64, by: Duration) {
    let mut entries = self.entries();
    if let Some(entry) = entries.get_mut(&post_id) {
      entry.fetched_at = entry.fetched_at - by;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::MemoryStore;
  use crate::testutil::sample_post;

  fn cache() -> (PostCache<MemoryStore>, Arc<LikedStore<MemoryStore>>) {
    let liked = Arc::new(LikedStore::new(MemoryStore::new()));
    (PostCache::new(Arc::clone(&liked)), liked)
  }

  #[test]
  fn test_get_returns_copy() {
    let (cache, _) = cache();
    cache.put(sample_post(1), "alice");

    let mut copy = cache.get(1, "alice").unwrap();
    copy.title = "mutated".to_string();

    assert_ne!(cache.get(1, "alice").unwrap().title, "mutated");
  }

  #[test]
  fn test_entry_valid_just_below_ttl() {
    let (cache, _) = cache();
    cache.put(sample_post(1), "alice");
    cache.backdate(1, Duration::minutes(5) - Duration::seconds(1));

    assert!(cache.get(1, "alice").is_some());
  }

  #[test]
  fn test_entry_expired_at_and_past_ttl() {
    let (cache, _) = cache();

    cache.put(sample_post(1), "alice");
    cache.backdate(1, Duration::minutes(5) + Duration::milliseconds(1));
    assert!(cache.get(1, "alice").is_none());
    // Eviction was a side effect, not just a filtered read
    assert!(!cache.update_like_status(1, true, None));

    cache.put(sample_post(2), "alice");
    cache.backdate(2, Duration::minutes(5));
    assert!(cache.get(2, "alice").is_none());
  }

  #[test]
  fn test_liked_status_precedence_on_get() {
    let (cache, liked) = cache();
    cache.put(sample_post(7), "alice");
    liked.set("alice", 7, true);

    assert!(cache.get(7, "alice").unwrap().liked);
    // Idempotent: the entry was corrected in place
    assert!(cache.get(7, "alice").unwrap().liked);
    // The count stays server-authoritative
    assert_eq!(cache.get(7, "alice").unwrap().likes, sample_post(7).likes);
    // A different viewer sees the server default
    assert!(!cache.get(7, "bob").unwrap().liked);
  }

  #[test]
  fn test_liked_status_precedence_on_put() {
    let (cache, liked) = cache();
    liked.set("alice", 7, false);

    let mut post = sample_post(7);
    post.liked = true;
    cache.put(post, "alice");

    assert!(!cache.get(7, "alice").unwrap().liked);
  }

  #[test]
  fn test_update_like_status_refreshes_entry() {
    let (cache, _) = cache();
    cache.put(sample_post(1), "alice");
    cache.backdate(1, Duration::minutes(4));

    assert!(cache.update_like_status(1, true, Some(11)));

    let post = cache.get(1, "alice").unwrap();
    assert!(post.liked);
    assert_eq!(post.likes, 11);

    // fetched_at was refreshed, so the earlier backdating no longer counts
    cache.backdate(1, Duration::minutes(4));
    assert!(cache.get(1, "alice").is_some());
  }

  #[test]
  fn test_update_like_status_without_count() {
    let (cache, _) = cache();
    cache.put(sample_post(1), "alice");

    assert!(cache.update_like_status(1, true, None));

    let post = cache.get(1, "alice").unwrap();
    assert!(post.liked);
    assert_eq!(post.likes, sample_post(1).likes);
  }

  #[test]
  fn test_put_many_is_idempotent() {
    let (cache, _) = cache();
    let posts: Vec<Post> = (1..=3).map(sample_post).collect();

    cache.put_many(posts.clone(), "alice");
    let first = cache.all_valid();

    cache.put_many(posts, "alice");
    let second = cache.all_valid();

    assert_eq!(first, second);
    assert_eq!(second.len(), 3);
  }

  #[test]
  fn test_all_valid_evicts_and_orders_newest_first() {
    let (cache, _) = cache();
    cache.put_many((1..=3).map(sample_post).collect(), "alice");
    cache.backdate(2, Duration::minutes(6));

    let posts = cache.all_valid();
    let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();

    // sample_post timestamps grow with the id, so newest first means descending
    assert_eq!(ids, vec![3, 1]);
  }

  #[test]
  fn test_remove_and_clear() {
    let (cache, _) = cache();
    cache.put_many((1..=3).map(sample_post).collect(), "alice");

    cache.remove(2);
    assert!(cache.get(2, "alice").is_none());
    assert_eq!(cache.all_valid().len(), 2);

    cache.clear();
    assert!(cache.all_valid().is_empty());
  }
}
