//! Post storage backends.
//!
//! Provides the trait the block updater reads and writes posts through, with
//! a PostgreSQL implementation and an in-memory one.

mod memory;
mod postgres;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Post, PostId, PostType, WriteContext};

pub use memory::MemoryPostStore;
pub use postgres::PgPostStore;

/// Post storage backend trait.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Load a post, or `None` if the ID does not resolve.
    async fn find_post(&self, id: PostId) -> Result<Option<Post>>;

    /// Overwrite a post's content. Last write wins.
    async fn update_content(&self, id: PostId, content: &str, ctx: &WriteContext) -> Result<()>;

    /// IDs of every published post of the given types.
    async fn list_published_ids(&self, types: &[PostType]) -> Result<Vec<PostId>>;

    /// Whether the backend is reachable.
    async fn is_healthy(&self) -> bool;

    /// Backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
