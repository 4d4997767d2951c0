//! Optimistic like toggling with confirm-or-rollback reconciliation.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{KeyValueStore, LikedStore, PostCache};
use crate::forum::client::ForumApi;
use crate::forum::types::Post;

/// Terminal state of one toggle invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
  /// Server confirmed; flag and count are the server's resulting values.
  Committed { liked: bool, likes: u32 },
  /// Remote call failed; local state was reverted to the pre-toggle values.
  RolledBack,
  /// Neither the cache nor the caller could supply current state.
  Skipped,
}

/// Executes the optimistic-update protocol for a single like/unlike action.
///
/// Each invocation runs the full machine to completion: resolve current
/// state, commit the flipped flag locally, call the server, then reconcile
/// or roll back. Nothing is kept across invocations - a second toggle
/// issued while the first is in flight starts an independent machine that
/// reads the first one's optimistic state as its baseline.
///
/// Failures never propagate as errors. The worst outcome is a like that
/// visibly toggles on and back off again.
pub struct LikeCoordinator<S: KeyValueStore, A: ForumApi> {
  cache: Arc<PostCache<S>>,
  liked: Arc<LikedStore<S>>,
  api: Arc<A>,
  username: String,
}

impl<S: KeyValueStore, A: ForumApi> LikeCoordinator<S, A> {
  pub fn new(
    cache: Arc<PostCache<S>>,
    liked: Arc<LikedStore<S>>,
    api: Arc<A>,
    username: impl Into<String>,
  ) -> Self {
    Self {
      cache,
      liked,
      api,
      username: username.into(),
    }
  }

  /// Toggle the viewer's like on a post.
  ///
  /// `snapshot` supplies the current state when the post is not cached,
  /// e.g. when the caller renders a post the cache has already expired.
  pub async fn toggle(&self, post_id: u64, snapshot: Option<&Post>) -> ToggleOutcome {
    // Resolve current state fresh from the cache, never from a value
    // captured at dispatch time.
    let current = self
      .cache
      .get(post_id, &self.username)
      .or_else(|| snapshot.cloned());
    let Some(current) = current else {
      debug!("Toggle skipped, no local state for post {}", post_id);
      return ToggleOutcome::Skipped;
    };
    // Captured so a rollback can put back "unknown", not just a boolean.
    let prior_stored = self.liked.get(&self.username, post_id);

    let new_liked = !current.liked;
    let optimistic = if new_liked {
      current.likes.saturating_add(1)
    } else {
      current.likes.saturating_sub(1)
    };

    // Optimistic commit: the store first, so any concurrent read merging
    // against it sees the new decision, then the cache entry. No await
    // between the resolve above and this point.
    self.liked.set(&self.username, post_id, new_liked);
    self.cache.update_like_status(post_id, new_liked, Some(optimistic));

    match self.api.toggle_like(post_id).await {
      Ok(outcome) => {
        // Server wins on both fields. The flag is only written back when it
        // disagrees; the count is never client-authoritative.
        if outcome.liked != new_liked {
          warn!(
            "Server disagrees on like flag for post {}, adopting {}",
            post_id, outcome.liked
          );
          self.liked.set(&self.username, post_id, outcome.liked);
        }
        if !self
          .cache
          .update_like_status(post_id, outcome.liked, Some(outcome.likes))
        {
          // The entry vanished across the await (e.g. a forced refresh
          // cleared the cache). A successful toggle (re)creates it.
          let mut post = current;
          post.liked = outcome.liked;
          post.likes = outcome.likes;
          self.cache.put(post, &self.username);
        }
        ToggleOutcome::Committed {
          liked: outcome.liked,
          likes: outcome.likes,
        }
      }
      Err(e) => {
        warn!("Like toggle for post {} failed, rolling back: {}", post_id, e);
        self.liked.restore(&self.username, post_id, prior_stored);
        self
          .cache
          .update_like_status(post_id, current.liked, Some(current.likes));
        ToggleOutcome::RolledBack
      }
    }
  }
}
