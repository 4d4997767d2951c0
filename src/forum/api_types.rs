//! Serde-deserializable types matching forum API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::{Author, LikeOutcome, Post, PostPage, SearchResults, Tag};

#[derive(Debug, Deserialize)]
pub struct ApiAuthor {
  pub id: u64,
  #[serde(rename = "displayName")]
  pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiTag {
  pub id: u64,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiPost {
  pub id: u64,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub body: String,
  pub author: ApiAuthor,
  #[serde(default)]
  pub tags: Vec<ApiTag>,
  #[serde(rename = "createdAt")]
  pub created_at: DateTime<Utc>,
  #[serde(rename = "likesCount", default)]
  pub likes_count: u32,
  /// Liked flag for the authenticated user making the request
  #[serde(default)]
  pub liked: bool,
}

impl ApiPost {
  pub fn into_post(self) -> Post {
    Post {
      id: self.id,
      title: self.title,
      body: self.body,
      author: Author {
        id: self.author.id,
        name: self.author.display_name,
      },
      tags: self
        .tags
        .into_iter()
        .map(|t| Tag {
          id: t.id,
          name: t.name,
        })
        .collect(),
      created_at: self.created_at,
      likes: self.likes_count,
      liked: self.liked,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiPostsResponse {
  #[serde(default)]
  pub posts: Vec<ApiPost>,
  #[serde(default)]
  pub total: u32,
  #[serde(rename = "nextPage")]
  pub next_page: Option<String>,
}

impl ApiPostsResponse {
  pub fn into_page(self) -> PostPage {
    PostPage {
      posts: self.posts.into_iter().map(ApiPost::into_post).collect(),
      total: self.total,
      next: self.next_page,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiSearchResponse {
  #[serde(default)]
  pub posts: Vec<ApiPost>,
  #[serde(default)]
  pub total: u32,
}

impl ApiSearchResponse {
  pub fn into_results(self) -> SearchResults {
    SearchResults {
      posts: self.posts.into_iter().map(ApiPost::into_post).collect(),
      total: self.total,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiLikeResponse {
  pub liked: bool,
  #[serde(rename = "likesCount")]
  pub likes_count: u32,
}

impl ApiLikeResponse {
  pub fn into_outcome(self) -> LikeOutcome {
    LikeOutcome {
      liked: self.liked,
      likes: self.likes_count,
    }
  }
}
