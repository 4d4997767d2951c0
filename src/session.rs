//! Per-user assembly of the feed engine.

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{KeyValueStore, LikedStore, PostCache};
use crate::config::Config;
use crate::forum::client::ForumApi;
use crate::forum::types::{PageRequest, Post, PostOrder};
use crate::projection::{FeedProjector, ProjectedPage, DEFAULT_PAGE_SIZE};
use crate::toggle::{LikeCoordinator, ToggleOutcome};

/// One signed-in user's view of the forum.
///
/// Owns the component graph - liked record, post cache, toggle coordinator,
/// projector - wired by injection rather than module globals. Construct one
/// per session and drop it on logout or user switch so liked status stays
/// partitioned by username.
pub struct ForumSession<S: KeyValueStore, A: ForumApi> {
  username: String,
  page_size: usize,
  api: Arc<A>,
  cache: Arc<PostCache<S>>,
  coordinator: LikeCoordinator<S, A>,
  projector: FeedProjector<S>,
}

impl<S: KeyValueStore, A: ForumApi> ForumSession<S, A> {
  pub fn new(config: &Config, store: S, api: A) -> Self {
    let username = config.username.clone();
    let page_size = config.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    let api = Arc::new(api);

    let liked = Arc::new(LikedStore::new(store));
    let mut cache = PostCache::new(Arc::clone(&liked));
    if let Some(minutes) = config.cache.ttl_minutes {
      cache = cache.with_ttl(Duration::minutes(minutes));
    }
    let cache = Arc::new(cache);

    let coordinator = LikeCoordinator::new(
      Arc::clone(&cache),
      Arc::clone(&liked),
      Arc::clone(&api),
      username.clone(),
    );
    let projector = FeedProjector::new(Arc::clone(&cache)).with_page_size(page_size);

    Self {
      username,
      page_size,
      api,
      cache,
      coordinator,
      projector,
    }
  }

  #[allow(dead_code)]
  pub fn username(&self) -> &str {
    &self.username
  }

  #[allow(dead_code)]
  pub fn cache(&self) -> &Arc<PostCache<S>> {
    &self.cache
  }

  pub fn projector_mut(&mut self) -> &mut FeedProjector<S> {
    &mut self.projector
  }

  /// Fetch one feed page into the cache.
  ///
  /// Returns false when the fetch failed; the cache keeps serving its
  /// last-known contents then.
  pub async fn load_page(&self, order: PostOrder, page: u32) -> bool {
    let request = PageRequest {
      order,
      page,
      per_page: self.page_size as u32,
    };

    match self.api.fetch_page(request).await {
      Ok(fetched) => {
        if let Some(next) = &fetched.next {
          debug!("More posts available after page {}: {}", page, next);
        }
        self.cache.put_many(fetched.posts, &self.username);
        true
      }
      Err(e) => {
        warn!("Feed fetch failed, serving cached posts: {}", e);
        false
      }
    }
  }

  /// Drop all cached posts and any search view, then re-fetch page 1.
  pub async fn refresh(&mut self, order: PostOrder) -> bool {
    self.cache.clear();
    self.projector.set_search(None);
    self.load_page(order, 1).await
  }

  /// Run a remote search and install its result set.
  ///
  /// Hits are also cached so liking them works like liking feed posts. On
  /// failure the previous view is left untouched and false is returned.
  pub async fn search(&mut self, query: &str) -> bool {
    match self.api.search(query).await {
      Ok(results) => {
        self.cache.put_many(results.posts.clone(), &self.username);
        self.projector.set_search(Some(results));
        true
      }
      Err(e) => {
        warn!("Search failed, keeping current view: {}", e);
        false
      }
    }
  }

  #[allow(dead_code)]
  pub fn clear_search(&mut self) {
    self.projector.set_search(None);
  }

  pub async fn toggle_like(&self, post_id: u64, snapshot: Option<&Post>) -> ToggleOutcome {
    self.coordinator.toggle(post_id, snapshot).await
  }

  pub fn project(&self) -> ProjectedPage {
    self.projector.project(&self.username)
  }
}
