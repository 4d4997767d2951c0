//! Filtered, searched, paginated projection of the cached feed.

use std::sync::Arc;

use crate::cache::{KeyValueStore, PostCache};
use crate::forum::types::{Post, SearchResults};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Active tag filter: a primary tag and an optional sub-tag within it.
///
/// The sub-tag narrows one tag family (e.g. a recipe category inside the
/// recipes tag) and is only meaningful together with its family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagFilter {
  pub tag_id: u64,
  pub sub_tag_id: Option<u64>,
}

impl TagFilter {
  /// Sub-filtering is conjunctive, not a substitute: the post must carry
  /// both the family tag and the sub-tag.
  fn matches(&self, post: &Post) -> bool {
    if !post.has_tag(self.tag_id) {
      return false;
    }
    match self.sub_tag_id {
      Some(sub) => post.has_tag(sub),
      None => true,
    }
  }
}

/// One renderable window of the feed.
#[derive(Debug, Clone)]
pub struct ProjectedPage {
  pub items: Vec<Post>,
  pub total: usize,
  pub page: usize,
}

/// Derives the exact slice of posts the UI should render.
///
/// Holds the transient view parameters (page, filter, search set) and
/// recomputes the window from cache contents on every [`project`] call; the
/// cache is read, never mutated. Changing any filter or search input resets
/// the page to 1.
///
/// [`project`]: FeedProjector::project
pub struct FeedProjector<S: KeyValueStore> {
  cache: Arc<PostCache<S>>,
  page: usize,
  page_size: usize,
  filter: Option<TagFilter>,
  search: Option<SearchResults>,
}

impl<S: KeyValueStore> FeedProjector<S> {
  pub fn new(cache: Arc<PostCache<S>>) -> Self {
    Self {
      cache,
      page: 1,
      page_size: DEFAULT_PAGE_SIZE,
      filter: None,
      search: None,
    }
  }

  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  #[allow(dead_code)]
  pub fn page(&self) -> usize {
    self.page
  }

  #[allow(dead_code)]
  pub fn filter(&self) -> Option<TagFilter> {
    self.filter
  }

  /// Jump to a page. Out-of-range pages yield an empty window rather than
  /// an error.
  pub fn set_page(&mut self, page: usize) {
    self.page = page.max(1);
  }

  /// Set or clear the primary tag filter. Any sub-tag belonged to the old
  /// family and is cleared with it.
  pub fn set_filter(&mut self, tag_id: Option<u64>) {
    self.filter = tag_id.map(|tag_id| TagFilter {
      tag_id,
      sub_tag_id: None,
    });
    self.page = 1;
  }

  /// Narrow the current tag family. Without a primary filter there is no
  /// family to narrow, so this is a no-op.
  pub fn set_sub_filter(&mut self, sub_tag_id: Option<u64>) {
    if let Some(filter) = &mut self.filter {
      filter.sub_tag_id = sub_tag_id;
      self.page = 1;
    }
  }

  /// Install or clear the remote search result set.
  pub fn set_search(&mut self, results: Option<SearchResults>) {
    self.search = results;
    self.page = 1;
  }

  /// Compute the window for the current parameters.
  ///
  /// With a search active, the tag filter intersects the search set instead
  /// of the full cached feed, and search items the cache still holds are
  /// served from the cache so they carry the viewer's latest liked flag.
  /// Search order is the server's ranking; the cached feed is newest first.
  pub fn project(&self, username: &str) -> ProjectedPage {
    let base: Vec<Post> = match &self.search {
      Some(results) => results
        .posts
        .iter()
        .map(|post| {
          self
            .cache
            .get(post.id, username)
            .unwrap_or_else(|| post.clone())
        })
        .collect(),
      None => self.cache.all_valid(),
    };

    let (filtered, server_total) = match self.filter {
      Some(filter) => {
        let matching: Vec<Post> = base.into_iter().filter(|p| filter.matches(p)).collect();
        (matching, None)
      }
      None => {
        // An unfiltered search set may be one page of a larger result; the
        // server's count is the honest total then.
        let total = self.search.as_ref().map(|s| s.total as usize);
        (base, total)
      }
    };

    let total = server_total.unwrap_or(filtered.len());
    let start = (self.page - 1) * self.page_size;
    let items: Vec<Post> = filtered.into_iter().skip(start).take(self.page_size).collect();

    ProjectedPage {
      items,
      total,
      page: self.page,
    }
  }
}
