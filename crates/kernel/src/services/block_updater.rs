//! Block updater service.
//!
//! Rewrites instances of an allow-listed block type across stored posts,
//! migrating statically saved markup into the dynamic block shape.

use std::sync::Arc;

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::content::{
    BlockRenderer, ParseError, RewriteError, UpdatableBlocks, content_has_block, rewrite_content,
};
use crate::models::{PostId, PostType, WriteContext};
use crate::store::PostStore;

/// Content types offered for updating.
pub const UPDATABLE_POST_TYPES: &[PostType] = &[PostType::Post, PostType::Page];

/// Errors from block updater operations.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The block type is not on the allow-list.
    #[error("block type {0} is not allowed")]
    Forbidden(String),

    /// The post does not exist.
    #[error("post {0} not found")]
    NotFound(PostId),

    /// The stored content is not valid block markup.
    #[error("post {post_id} has invalid block markup: {source}")]
    Parse {
        post_id: PostId,
        #[source]
        source: ParseError,
    },

    /// A transform returned a block whose placeholders do not match its children.
    #[error("transform for {block} produced an inconsistent block in post {post_id}")]
    InvalidTransform { post_id: PostId, block: String },

    /// Reading or writing storage failed.
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl UpdateError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateError::Forbidden(_) => "forbidden",
            UpdateError::NotFound(_) => "not_found",
            UpdateError::Parse { .. } => "invalid_markup",
            UpdateError::InvalidTransform { .. } => "invalid_transform",
            UpdateError::Storage(_) => "storage_error",
        }
    }
}

/// Result of updating one post.
///
/// Serializes as `true` (updated) or `false` (nothing to update).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The post contained the block and its content was rewritten.
    Updated,
    /// The post does not contain the block; nothing was written.
    Unchanged,
}

impl UpdateOutcome {
    pub fn is_updated(self) -> bool {
        self == UpdateOutcome::Updated
    }

    /// Label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOutcome::Updated => "updated",
            UpdateOutcome::Unchanged => "unchanged",
        }
    }
}

impl Serialize for UpdateOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.is_updated())
    }
}

/// A post the bulk run could not update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUpdate {
    pub post_id: PostId,
    pub error: String,
}

/// Summary of updating one block type across all published content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkUpdateReport {
    pub block: String,
    pub total: usize,
    pub updated: Vec<PostId>,
    pub unchanged: Vec<PostId>,
    pub failed: Vec<FailedUpdate>,
}

/// Service rewriting allow-listed block types in stored posts.
pub struct BlockUpdater {
    store: Arc<dyn PostStore>,
    blocks: UpdatableBlocks,
    renderer: BlockRenderer,
}

impl BlockUpdater {
    /// Create the service. The allow-list and renderer are fixed from here on.
    pub fn new(
        store: Arc<dyn PostStore>,
        blocks: UpdatableBlocks,
        renderer: BlockRenderer,
    ) -> Self {
        Self {
            store,
            blocks,
            renderer,
        }
    }

    /// Allowed block type names.
    pub fn list_updatable_block_types(&self) -> Vec<String> {
        self.blocks.type_names()
    }

    /// IDs of all published posts and pages.
    pub async fn list_published_content(&self) -> Result<Vec<PostId>, UpdateError> {
        Ok(self.store.list_published_ids(UPDATABLE_POST_TYPES).await?)
    }

    /// Rewrite every top-level instance of `block_name` in one post.
    ///
    /// The allow-list is checked before storage is touched. A post without
    /// the block is left unwritten and reported as [`UpdateOutcome::Unchanged`].
    pub async fn update_post(
        &self,
        post_id: PostId,
        block_name: &str,
    ) -> Result<UpdateOutcome, UpdateError> {
        let Some(transform) = self.blocks.get(block_name) else {
            return Err(UpdateError::Forbidden(block_name.to_string()));
        };

        let post = self
            .store
            .find_post(post_id)
            .await?
            .ok_or(UpdateError::NotFound(post_id))?;

        if !content_has_block(&post.content, block_name) {
            debug!(post_id, block = %block_name, "post does not contain block");
            return Ok(UpdateOutcome::Unchanged);
        }

        let content = {
            let apply = transform.resolve(&self.renderer);
            rewrite_content(&post.content, block_name, apply).map_err(|e| match e {
                RewriteError::Parse(source) => UpdateError::Parse { post_id, source },
                RewriteError::InconsistentBlock { block, .. } => {
                    UpdateError::InvalidTransform { post_id, block }
                }
            })?
        };

        self.store
            .update_content(post_id, &content, &WriteContext::bulk_edit())
            .await?;

        info!(post_id, block = %block_name, "post updated");
        Ok(UpdateOutcome::Updated)
    }

    /// Update `block_name` in every published post and page, one at a time.
    ///
    /// Per-post failures are collected in the report; the run continues.
    pub async fn update_all(&self, block_name: &str) -> Result<BulkUpdateReport, UpdateError> {
        if !self.blocks.contains(block_name) {
            return Err(UpdateError::Forbidden(block_name.to_string()));
        }

        let ids = self.list_published_content().await?;
        let mut report = BulkUpdateReport {
            block: block_name.to_string(),
            total: ids.len(),
            ..Default::default()
        };

        for post_id in ids {
            match self.update_post(post_id, block_name).await {
                Ok(UpdateOutcome::Updated) => report.updated.push(post_id),
                Ok(UpdateOutcome::Unchanged) => report.unchanged.push(post_id),
                Err(e) => {
                    warn!(post_id, block = %block_name, error = %e, "bulk update skipped post");
                    report.failed.push(FailedUpdate {
                        post_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            block = %block_name,
            total = report.total,
            updated = report.updated.len(),
            failed = report.failed.len(),
            "bulk update finished"
        );
        Ok(report)
    }
}
