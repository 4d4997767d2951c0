//! Shared test fixtures and scripted collaborators.

use chrono::{Duration, TimeZone, Utc};
use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::{CacheConfig, Config, ForumConfig};
use crate::forum::client::ForumApi;
use crate::forum::types::{Author, LikeOutcome, PageRequest, Post, PostPage, SearchResults, Tag};

pub fn sample_post(id: u64) -> Post {
  Post {
    id,
    title: format!("Post {}", id),
    body: "body".to_string(),
    author: Author {
      id: 1,
      name: "Maya".to_string(),
    },
    tags: Vec::new(),
    // Staggered by id so newest-first ordering is deterministic
    created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(id as i64),
    likes: 10,
    liked: false,
  }
}

pub fn tagged_post(id: u64, tag_ids: &[u64]) -> Post {
  let mut post = sample_post(id);
  post.tags = tag_ids
    .iter()
    .map(|&id| Tag {
      id,
      name: format!("tag-{}", id),
    })
    .collect();
  post
}

pub fn page_of(posts: Vec<Post>) -> PostPage {
  PostPage {
    total: posts.len() as u32,
    next: None,
    posts,
  }
}

pub fn results_of(posts: Vec<Post>, total: u32) -> SearchResults {
  SearchResults { posts, total }
}

pub fn test_config(username: &str) -> Config {
  Config {
    forum: ForumConfig {
      url: "http://localhost:8080/api/".to_string(),
    },
    username: username.to_string(),
    page_size: None,
    cache: CacheConfig::default(),
  }
}

/// Scripted [`ForumApi`] double.
///
/// Responses are queued per endpoint and consumed in call order; an empty
/// queue answers with an error. Toggle responses can carry a delay so tests
/// can observe in-flight optimistic state.
pub struct MockForumApi {
  pages: Mutex<VecDeque<Result<PostPage>>>,
  searches: Mutex<VecDeque<Result<SearchResults>>>,
  toggles: Mutex<VecDeque<(u64, Result<LikeOutcome>)>>,
  pub toggle_calls: AtomicUsize,
}

impl MockForumApi {
  pub fn new() -> Self {
    Self {
      pages: Mutex::new(VecDeque::new()),
      searches: Mutex::new(VecDeque::new()),
      toggles: Mutex::new(VecDeque::new()),
      toggle_calls: AtomicUsize::new(0),
    }
  }

  pub fn queue_page(&self, page: Result<PostPage>) {
    self.pages.lock().unwrap().push_back(page);
  }

  pub fn queue_search(&self, results: Result<SearchResults>) {
    self.searches.lock().unwrap().push_back(results);
  }

  pub fn queue_toggle(&self, outcome: Result<LikeOutcome>) {
    self.queue_toggle_delayed(0, outcome);
  }

  pub fn queue_toggle_delayed(&self, delay_ms: u64, outcome: Result<LikeOutcome>) {
    self.toggles.lock().unwrap().push_back((delay_ms, outcome));
  }
}

impl ForumApi for MockForumApi {
  fn fetch_page(&self, _request: PageRequest) -> BoxFuture<'_, Result<PostPage>> {
    let response = self.pages.lock().unwrap().pop_front();
    Box::pin(async move { response.unwrap_or_else(|| Err(eyre!("no scripted page response"))) })
  }

  fn search(&self, query: &str) -> BoxFuture<'_, Result<SearchResults>> {
    let query = query.to_string();
    let response = self.searches.lock().unwrap().pop_front();
    Box::pin(async move {
      response.unwrap_or_else(|| Err(eyre!("no scripted search response for {:?}", query)))
    })
  }

  fn toggle_like(&self, post_id: u64) -> BoxFuture<'_, Result<LikeOutcome>> {
    self.toggle_calls.fetch_add(1, Ordering::SeqCst);
    let response = self.toggles.lock().unwrap().pop_front();
    Box::pin(async move {
      match response {
        Some((delay_ms, outcome)) => {
          if delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
          }
          outcome
        }
        None => Err(eyre!("no scripted like response for post {}", post_id)),
      }
    })
  }
}
