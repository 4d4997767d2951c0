//! Post caching and liked-status persistence.
//!
//! Two cooperating stores back every feed surface:
//! - [`PostCache`]: TTL-bounded in-process snapshots of fetched posts
//! - [`LikedStore`]: durable per-user record of explicit like decisions,
//!   merged into every cache read so the liked flag survives reloads and
//!   stays consistent across views
//!
//! Both are explicit instances handed to consumers by reference; there is no
//! ambient global cache.

mod likes;
mod posts;
mod storage;

pub use likes::LikedStore;
pub use posts::PostCache;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
