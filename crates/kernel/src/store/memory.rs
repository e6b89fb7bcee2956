//! In-memory post storage.
//!
//! Used by tests and local demos. Counts reads and writes so callers can
//! assert which storage operations a request performed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::RwLock;

use super::PostStore;
use crate::models::{Post, PostId, PostType, WriteContext};

/// Post storage held in a map.
#[derive(Debug, Default)]
pub struct MemoryPostStore {
    posts: RwLock<BTreeMap<PostId, Post>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    last_write: RwLock<Option<WriteContext>>,
}

impl MemoryPostStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `posts`.
    pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let store = Self::new();
        for post in posts {
            store.insert(post);
        }
        store
    }

    /// Insert or replace a post without counting it as a write.
    pub fn insert(&self, post: Post) {
        self.posts.write().insert(post.id, post);
    }

    /// Current content of a post, without counting it as a read.
    pub fn content(&self, id: PostId) -> Option<String> {
        self.posts.read().get(&id).map(|p| p.content.clone())
    }

    /// Number of `find_post` calls served.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `update_content` calls served.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Context of the most recent write.
    pub fn last_write_context(&self) -> Option<WriteContext> {
        *self.last_write.read()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn find_post(&self, id: PostId) -> Result<Option<Post>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.posts.read().get(&id).cloned())
    }

    async fn update_content(&self, id: PostId, content: &str, ctx: &WriteContext) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut posts = self.posts.write();
        let Some(post) = posts.get_mut(&id) else {
            bail!("post {id} disappeared before its content could be written");
        };
        post.content = content.to_string();
        post.modified = chrono::Utc::now().timestamp();
        *self.last_write.write() = Some(*ctx);
        Ok(())
    }

    async fn list_published_ids(&self, types: &[PostType]) -> Result<Vec<PostId>> {
        let ids = self
            .posts
            .read()
            .values()
            .filter(|p| p.is_published() && types.iter().any(|t| t.as_str() == p.post_type))
            .map(|p| p.id)
            .collect();
        Ok(ids)
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
