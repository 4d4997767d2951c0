use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use url::Url;

use crate::config::Config;

use super::api_types::{ApiLikeResponse, ApiPostsResponse, ApiSearchResponse};
use super::types::{LikeOutcome, PageRequest, PostPage, SearchResults};

/// Remote collaborator for the community feed.
///
/// Object-safe so engine components can hold it behind `Arc` and tests can
/// substitute a scripted implementation.
pub trait ForumApi: Send + Sync {
  /// Fetch one page of the feed.
  fn fetch_page(&self, request: PageRequest) -> BoxFuture<'_, Result<PostPage>>;

  /// Free-text search; the server ranks the results.
  fn search(&self, query: &str) -> BoxFuture<'_, Result<SearchResults>>;

  /// Toggle the viewer's like on a post, returning the server's resulting state.
  fn toggle_like(&self, post_id: u64) -> BoxFuture<'_, Result<LikeOutcome>>;
}

impl<A: ForumApi + ?Sized> ForumApi for std::sync::Arc<A> {
  fn fetch_page(&self, request: PageRequest) -> BoxFuture<'_, Result<PostPage>> {
    (**self).fetch_page(request)
  }

  fn search(&self, query: &str) -> BoxFuture<'_, Result<SearchResults>> {
    (**self).search(query)
  }

  fn toggle_like(&self, post_id: u64) -> BoxFuture<'_, Result<LikeOutcome>> {
    (**self).toggle_like(post_id)
  }
}

/// Forum API client wrapper
#[derive(Clone)]
pub struct HttpForumClient {
  http: reqwest::Client,
  base: Url,
  token: String,
}

impl HttpForumClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base = Url::parse(&config.forum.url)
      .map_err(|e| eyre!("Invalid forum URL {}: {}", config.forum.url, e))?;

    let token = Config::get_api_token()?;

    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self { http, base, token })
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .base
      .join(path)
      .map_err(|e| eyre!("Invalid endpoint {}: {}", path, e))
  }
}

impl ForumApi for HttpForumClient {
  fn fetch_page(&self, request: PageRequest) -> BoxFuture<'_, Result<PostPage>> {
    Box::pin(async move {
      let url = self.endpoint("posts")?;

      let response = self
        .http
        .get(url)
        .bearer_auth(&self.token)
        .query(&[
          ("order", request.order.as_query_value().to_string()),
          ("page", request.page.to_string()),
          ("perPage", request.per_page.to_string()),
        ])
        .send()
        .await
        .map_err(|e| eyre!("Failed to fetch posts: {}", e))?
        .error_for_status()
        .map_err(|e| eyre!("Posts request rejected: {}", e))?;

      let body: ApiPostsResponse = response
        .json()
        .await
        .map_err(|e| eyre!("Failed to parse posts response: {}", e))?;

      Ok(body.into_page())
    })
  }

  fn search(&self, query: &str) -> BoxFuture<'_, Result<SearchResults>> {
    let query = query.to_string();

    Box::pin(async move {
      let url = self.endpoint("posts/search")?;

      let response = self
        .http
        .get(url)
        .bearer_auth(&self.token)
        .query(&[("q", query.as_str())])
        .send()
        .await
        .map_err(|e| eyre!("Failed to search posts: {}", e))?
        .error_for_status()
        .map_err(|e| eyre!("Search request rejected: {}", e))?;

      let body: ApiSearchResponse = response
        .json()
        .await
        .map_err(|e| eyre!("Failed to parse search response: {}", e))?;

      Ok(body.into_results())
    })
  }

  fn toggle_like(&self, post_id: u64) -> BoxFuture<'_, Result<LikeOutcome>> {
    Box::pin(async move {
      let url = self.endpoint(&format!("posts/{}/like", post_id))?;

      let response = self
        .http
        .post(url)
        .bearer_auth(&self.token)
        .send()
        .await
        .map_err(|e| eyre!("Failed to toggle like on post {}: {}", post_id, e))?
        .error_for_status()
        .map_err(|e| eyre!("Like request for post {} rejected: {}", post_id, e))?;

      let body: ApiLikeResponse = response
        .json()
        .await
        .map_err(|e| eyre!("Failed to parse like response: {}", e))?;

      Ok(body.into_outcome())
    })
  }
}
