#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Builds the REAL kernel router over an in-memory post store, so tests
//! exercise actual routing, middleware and services without a database.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use reblock_kernel::content::UpdatableBlocks;
use reblock_kernel::models::{Post, PostId, PostType, WriteContext};
use reblock_kernel::permissions::EditorTokens;
use reblock_kernel::store::{MemoryPostStore, PostStore};
use reblock_kernel::{AppState, build_router};
use reblock_test_utils::TestPost;

/// Token accepted as an editor.
pub const EDITOR_TOKEN: &str = "editor-test-token";

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryPostStore>,
    pub state: AppState,
}

impl TestApp {
    /// App allowing `acme/hero` with the default transform.
    pub fn new(posts: impl IntoIterator<Item = TestPost>) -> Self {
        Self::with_blocks(posts, UpdatableBlocks::from_names(["acme/hero"]))
    }

    /// App with a custom allow-list.
    pub fn with_blocks(posts: impl IntoIterator<Item = TestPost>, blocks: UpdatableBlocks) -> Self {
        let store = Arc::new(MemoryPostStore::with_posts(posts.into_iter().map(to_post)));
        Self::build(store.clone(), store, blocks)
    }

    /// App allowing `acme/hero` whose store rejects every write.
    ///
    /// `store` still exposes the posts, so tests can check nothing changed.
    pub fn read_only(posts: impl IntoIterator<Item = TestPost>) -> Self {
        let store = Arc::new(MemoryPostStore::with_posts(posts.into_iter().map(to_post)));
        let backend = Arc::new(ReadOnlyStore(store.clone()));
        Self::build(store, backend, UpdatableBlocks::from_names(["acme/hero"]))
    }

    fn build(
        store: Arc<MemoryPostStore>,
        backend: Arc<dyn PostStore>,
        blocks: UpdatableBlocks,
    ) -> Self {
        let state = AppState::builder(backend)
            .blocks(blocks)
            .editor_tokens(EditorTokens::from_raw_tokens(&[EDITOR_TOKEN]))
            .build();
        let router = build_router(state.clone());
        Self {
            router,
            store,
            state,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// GET `uri` as an editor.
    pub async fn get_as_editor(&self, uri: &str) -> Response {
        self.get_with_token(uri, EDITOR_TOKEN).await
    }

    /// GET `uri` with a bearer token.
    pub async fn get_with_token(&self, uri: &str, token: &str) -> Response {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        self.request(request).await
    }

    /// GET `uri` without credentials.
    pub async fn get_anonymous(&self, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.request(request).await
    }
}

/// Reads through to a memory store and fails every write.
struct ReadOnlyStore(Arc<MemoryPostStore>);

#[async_trait]
impl PostStore for ReadOnlyStore {
    async fn find_post(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        self.0.find_post(id).await
    }

    async fn update_content(
        &self,
        id: PostId,
        _content: &str,
        _ctx: &WriteContext,
    ) -> anyhow::Result<()> {
        bail!("write of post {id} rejected: storage is read-only")
    }

    async fn list_published_ids(&self, types: &[PostType]) -> anyhow::Result<Vec<PostId>> {
        self.0.list_published_ids(types).await
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "read-only"
    }
}

/// Convert a fixture into a kernel post.
pub fn to_post(post: TestPost) -> Post {
    Post {
        id: post.id,
        post_type: post.post_type,
        status: post.status,
        title: post.title,
        content: post.content,
        modified: 0,
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

/// Read a response body as text.
pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
