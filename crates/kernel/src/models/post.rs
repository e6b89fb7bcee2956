//! Post model and persistence queries.
//!
//! Posts and pages share one table; this service only ever reads them and
//! overwrites their content.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Post identifier.
pub type PostId = i64;

/// Status value of published posts.
pub const STATUS_PUBLISH: &str = "publish";

/// Post record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    /// Unique identifier.
    pub id: PostId,

    /// Content type ("post" or "page").
    pub post_type: String,

    /// Publication status ("publish", "draft", ...).
    pub status: String,

    /// Post title.
    pub title: String,

    /// Stored block markup.
    pub content: String,

    /// Unix timestamp of the last change.
    pub modified: i64,
}

/// Content types whose posts can be listed for updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Post,
    Page,
}

impl PostType {
    /// The stored type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Post => "post",
            PostType::Page => "page",
        }
    }
}

/// Context threaded through content writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteContext {
    /// The write is part of a bulk rewrite rather than an interactive edit.
    pub bulk_edit: bool,
}

impl WriteContext {
    /// Context for writes issued by the block updater.
    pub fn bulk_edit() -> Self {
        Self { bulk_edit: true }
    }

    /// Revision log message recorded with the write.
    pub fn revision_log(&self) -> Option<&'static str> {
        self.bulk_edit.then_some("Bulk edit: block updater")
    }
}

impl Post {
    /// Check if this post is published.
    pub fn is_published(&self) -> bool {
        self.status == STATUS_PUBLISH
    }

    /// Find a post by ID.
    pub async fn find_by_id(pool: &PgPool, id: PostId) -> Result<Option<Self>> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, post_type, status, title, content, modified FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch post by id")?;

        Ok(post)
    }

    /// Overwrite a post's content and record a revision.
    pub async fn update_content(
        pool: &PgPool,
        id: PostId,
        content: &str,
        ctx: &WriteContext,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        let mut tx = pool.begin().await.context("failed to start transaction")?;

        let updated = sqlx::query("UPDATE posts SET content = $2, modified = $3 WHERE id = $1")
            .bind(id)
            .bind(content)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("failed to update post content")?;

        if updated.rows_affected() == 0 {
            bail!("post {id} disappeared before its content could be written");
        }

        sqlx::query(
            r#"
            INSERT INTO post_revisions (post_id, content, created, log)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(content)
        .bind(now)
        .bind(ctx.revision_log())
        .execute(&mut *tx)
        .await
        .context("failed to record post revision")?;

        tx.commit().await.context("failed to commit transaction")?;

        Ok(())
    }

    /// IDs of all published posts of the given types, oldest first. Unpaged.
    pub async fn list_published_ids(pool: &PgPool, types: &[PostType]) -> Result<Vec<PostId>> {
        let type_names: Vec<String> = types.iter().map(|t| t.as_str().to_string()).collect();

        let ids = sqlx::query_scalar::<_, PostId>(
            "SELECT id FROM posts WHERE status = $1 AND post_type = ANY($2) ORDER BY id",
        )
        .bind(STATUS_PUBLISH)
        .bind(&type_names)
        .fetch_all(pool)
        .await
        .context("failed to list published posts")?;

        Ok(ids)
    }
}
