//! PostgreSQL post storage.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::PostStore;
use crate::db;
use crate::models::{Post, PostId, PostType, WriteContext};

/// Post storage backed by the `posts` table.
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn find_post(&self, id: PostId) -> Result<Option<Post>> {
        Post::find_by_id(&self.pool, id).await
    }

    async fn update_content(&self, id: PostId, content: &str, ctx: &WriteContext) -> Result<()> {
        Post::update_content(&self.pool, id, content, ctx).await
    }

    async fn list_published_ids(&self, types: &[PostType]) -> Result<Vec<PostId>> {
        Post::list_published_ids(&self.pool, types).await
    }

    async fn is_healthy(&self) -> bool {
        db::check_health(&self.pool).await
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
