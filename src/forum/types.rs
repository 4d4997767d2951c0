use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post author reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
  pub id: u64,
  pub name: String,
}

/// Topic tag attached to a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub id: u64,
  pub name: String,
}

/// A forum post as rendered to the viewing user.
///
/// `likes` is the server-reported count and stays server-authoritative.
/// `liked` is relative to the viewing user and must never be shared across
/// usernames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
  pub id: u64,
  pub title: String,
  pub body: String,
  pub author: Author,
  pub tags: Vec<Tag>,
  pub created_at: DateTime<Utc>,
  pub likes: u32,
  pub liked: bool,
}

impl Post {
  /// Whether the post carries the given tag.
  pub fn has_tag(&self, tag_id: u64) -> bool {
    self.tags.iter().any(|t| t.id == tag_id)
  }
}

/// Feed ordering accepted by the forum API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
  #[default]
  Newest,
  Popular,
}

impl PostOrder {
  pub fn as_query_value(&self) -> &'static str {
    match self {
      PostOrder::Newest => "new",
      PostOrder::Popular => "popular",
    }
  }
}

/// Parameters for one feed page fetch.
#[derive(Debug, Clone)]
pub struct PageRequest {
  pub order: PostOrder,
  pub page: u32,
  pub per_page: u32,
}

/// One page of the feed as returned by the forum API.
#[derive(Debug, Clone)]
pub struct PostPage {
  pub posts: Vec<Post>,
  pub total: u32,
  /// Opaque continuation for the next page, if any.
  pub next: Option<String>,
}

/// Result set from the remote search collaborator.
///
/// The server ranks; `total` may exceed `posts.len()` when the result is a
/// page of a larger set.
#[derive(Debug, Clone)]
pub struct SearchResults {
  pub posts: Vec<Post>,
  pub total: u32,
}

/// Server verdict for a toggle-like request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
  pub liked: bool,
  pub likes: u32,
}
